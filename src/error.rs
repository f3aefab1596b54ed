use crate::entities::item::ItemId;
use thiserror::Error;

/// Failures of a single inventory or trade action. None of them outlive the
/// action: the commit wrapper restores the pre-action state before returning one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InventoryError {
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("no space left for item {0}")]
    NoSpace(ItemId),

    #[error("insufficient funds: {missing} of {currency} not covered")]
    InsufficientFunds { currency: String, missing: u32 },

    #[error("stale index {position}: issued at generation {issued}, cache is at {current}")]
    StaleIndex {
        position: usize,
        issued: u64,
        current: u64,
    },

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("template {0} not found")]
    TemplateNotFound(String),

    #[error("trader {0} not found")]
    TraderNotFound(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("action payload has no \"Action\" field")]
    MissingKind,

    #[error("action {0} is not supported")]
    Unsupported(String),

    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile {0} not found")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced to the calling layer by the session registry.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("profile load failed: {0}")]
    Load(#[source] StoreError),

    #[error("profile save failed, in-memory state kept: {0}")]
    Persist(#[source] StoreError),

    #[error("character {0} lock poisoned")]
    LockPoisoned(String),
}
