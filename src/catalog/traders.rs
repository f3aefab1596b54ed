use crate::entities::inventory::ChildIndex;
use crate::entities::item::{InventoryItem, ItemId, TemplateId};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TraderBase {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub nickname: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BarterLine {
    #[serde(rename = "_tpl")]
    pub tpl: TemplateId,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Assort {
    #[serde(default)]
    pub items: Vec<InventoryItem>,
    #[serde(default)]
    pub barter_scheme: HashMap<String, Vec<Vec<BarterLine>>>,
}

impl Assort {
    /// The offer rooted at `item_id` followed by everything attached to it,
    /// in breadth-first order.
    pub fn offer_graph(&self, item_id: &ItemId) -> Option<Vec<InventoryItem>> {
        if !self.items.iter().any(|item| item.id == *item_id) {
            return None;
        }
        let children = ChildIndex::build(&self.items);
        let family = children.family(item_id);
        let graph = family
            .iter()
            .filter_map(|id| self.items.iter().find(|item| item.id == *id))
            .cloned()
            .collect();
        Some(graph)
    }

    /// Price lines of one payment option for a single unit of the offer.
    pub fn scheme(&self, item_id: &ItemId, scheme_id: usize) -> Option<&[BarterLine]> {
        self.barter_scheme
            .get(item_id.as_str())
            .and_then(|schemes| schemes.get(scheme_id))
            .map(Vec::as_slice)
    }

    pub fn offer_template(&self, item_id: &ItemId) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.id == *item_id)
            .map(|item| item.tpl.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trader {
    pub base: TraderBase,
    pub assort: Assort,
}

impl Trader {
    pub fn id(&self) -> &str {
        &self.base.id
    }
}
