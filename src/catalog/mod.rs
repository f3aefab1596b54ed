//! Read-only template catalogs: item templates, handbook prices and traders.
//!
//! A `Catalog` is built once at startup and shared behind an `Arc`; it has no
//! mutating API after construction, so concurrent readers need no locking.

pub mod handbook;
pub mod items;
pub mod traders;

use crate::error::InventoryError;
use handbook::{Handbook, PriceTable};
use items::{ItemCatalog, ItemTemplate};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use traders::{Assort, Trader, TraderBase};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("read {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path} failed: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("trader {trader} trades in unknown currency {currency}")]
    MissingCurrency { trader: String, currency: String },
}

#[derive(Debug, Default)]
pub struct Catalog {
    items: ItemCatalog,
    prices: PriceTable,
    traders: HashMap<String, Trader>,
}

impl Catalog {
    pub fn new(items: ItemCatalog, prices: PriceTable, traders: Vec<Trader>) -> Self {
        let traders = traders
            .into_iter()
            .map(|trader| (trader.base.id.clone(), trader))
            .collect();
        Self {
            items,
            prices,
            traders,
        }
    }

    /// Loads `items.json`, `handbook.json` and every `traders/<id>/` directory
    /// below `db_root`.
    pub fn load(db_root: &Path) -> Result<Self, CatalogError> {
        let templates: HashMap<String, ItemTemplate> = read_json(&db_root.join("items.json"))?;
        let handbook: Handbook = read_json(&db_root.join("handbook.json"))?;
        let traders = load_traders(&db_root.join("traders"))?;
        let catalog = Self::new(
            ItemCatalog::from_map(templates),
            PriceTable::from_handbook(&handbook),
            traders,
        );
        log::info!(
            "catalog loaded: templates={}, prices={}, traders={}",
            catalog.items.len(),
            catalog.prices.len(),
            catalog.traders.len()
        );
        Ok(catalog)
    }

    pub fn items(&self) -> &ItemCatalog {
        &self.items
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn template(&self, tpl: &str) -> Result<&ItemTemplate, InventoryError> {
        self.items
            .get(tpl)
            .ok_or_else(|| InventoryError::TemplateNotFound(tpl.to_string()))
    }

    pub fn trader(&self, id: &str) -> Result<&Trader, InventoryError> {
        self.traders
            .get(id)
            .ok_or_else(|| InventoryError::TraderNotFound(id.to_string()))
    }

    /// Template id of the currency a trader settles in.
    pub fn trader_currency(&self, trader: &Trader) -> Result<&'static str, InventoryError> {
        handbook::currency_id(&trader.base.currency).ok_or_else(|| {
            InventoryError::InvalidAction(format!(
                "trader {} uses unknown currency {}",
                trader.id(),
                trader.base.currency
            ))
        })
    }

    /// Value of `count` units of `tpl` expressed in `currency`. Currencies
    /// convert through their rouble rate, other items through their handbook
    /// price.
    pub fn value_in(&self, tpl: &str, count: u32, currency: &str) -> f64 {
        if tpl == currency {
            return f64::from(count);
        }
        let Some(roubles) = self.prices.to_roubles(count, tpl) else {
            log::warn!("no handbook price for {}, valued at zero", tpl);
            return 0.0;
        };
        self.prices.from_roubles(roubles, currency).unwrap_or(0.0)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_traders(dir: &Path) -> Result<Vec<Trader>, CatalogError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CatalogError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    let mut traders = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let base: TraderBase = read_json(&path.join("base.json"))?;
        if handbook::currency_id(&base.currency).is_none() {
            return Err(CatalogError::MissingCurrency {
                trader: base.id,
                currency: base.currency,
            });
        }
        let assort_path = path.join("assort.json");
        let assort: Assort = if assort_path.exists() {
            read_json(&assort_path)?
        } else {
            Assort::default()
        };
        traders.push(Trader { base, assort });
    }
    traders.sort_by(|a, b| a.base.id.cmp(&b.base.id));
    Ok(traders)
}
