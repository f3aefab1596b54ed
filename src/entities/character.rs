use crate::entities::inventory::Inventory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterInfo {
    #[serde(rename = "Nickname", default)]
    pub nickname: String,
    #[serde(rename = "Experience", default)]
    pub experience: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraderRelation {
    #[serde(rename = "salesSum", default)]
    pub sales_sum: f64,
    #[serde(default)]
    pub standing: f64,
    #[serde(default)]
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "Info", default)]
    pub info: CharacterInfo,
    #[serde(rename = "Inventory")]
    pub inventory: Inventory,
    #[serde(rename = "Encyclopedia", default)]
    pub encyclopedia: BTreeMap<String, bool>,
    #[serde(rename = "TradersInfo", default)]
    pub traders_info: BTreeMap<String, TraderRelation>,
}

impl Character {
    pub fn new(id: impl Into<String>, inventory: Inventory) -> Self {
        Self {
            id: id.into(),
            info: CharacterInfo::default(),
            inventory,
            encyclopedia: BTreeMap::new(),
            traders_info: BTreeMap::new(),
        }
    }

    pub fn trader_relation_mut(&mut self, trader_id: &str) -> &mut TraderRelation {
        self.traders_info.entry(trader_id.to_string()).or_default()
    }
}
