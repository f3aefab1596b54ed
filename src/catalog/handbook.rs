use crate::entities::item::TemplateId;
use serde::Deserialize;
use std::collections::HashMap;

pub const ROUBLES: &str = "5449016a4bdc2d6f028b456f";
pub const EUROS: &str = "569668774bdc2da2298b4568";
pub const DOLLARS: &str = "5696686a4bdc2da3298b456a";

const CURRENCIES: [(&str, &str); 3] = [("RUB", ROUBLES), ("EUR", EUROS), ("USD", DOLLARS)];

pub fn currency_id(name: &str) -> Option<&'static str> {
    CURRENCIES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(name.trim()))
        .map(|(_, id)| *id)
}

pub fn is_currency(tpl: &str) -> bool {
    CURRENCIES.iter().any(|(_, id)| *id == tpl)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandbookItem {
    #[serde(rename = "Id")]
    pub id: TemplateId,
    #[serde(rename = "ParentId", default)]
    pub parent_id: String,
    #[serde(rename = "Price")]
    pub price: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Handbook {
    #[serde(rename = "Items", default)]
    pub items: Vec<HandbookItem>,
}

/// Rouble-normalized price table. Currencies are priced like items: one unit
/// of a currency costs its handbook price in roubles.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    prices: HashMap<TemplateId, u32>,
}

impl PriceTable {
    pub fn from_handbook(handbook: &Handbook) -> Self {
        let mut table = Self::default();
        for item in &handbook.items {
            table.insert(item.id.clone(), item.price);
        }
        table.prices.entry(ROUBLES.to_string()).or_insert(1);
        table
    }

    pub fn insert(&mut self, tpl: impl Into<TemplateId>, price: u32) {
        self.prices.insert(tpl.into(), price);
    }

    pub fn price(&self, tpl: &str) -> Option<u32> {
        self.prices.get(tpl).copied()
    }

    pub fn to_roubles(&self, amount: u32, currency: &str) -> Option<f64> {
        let rate = self.price(currency)?;
        Some(f64::from(amount) * f64::from(rate))
    }

    pub fn from_roubles(&self, roubles: f64, currency: &str) -> Option<f64> {
        let rate = self.price(currency).filter(|rate| *rate > 0)?;
        Some((roubles / f64::from(rate)).round())
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
