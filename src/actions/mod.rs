//! Client action payloads and their dispatch.
//!
//! Every payload is a JSON object tagged by its `Action` field; trade
//! confirmations carry a second tag in `type`. Decoding checks the tag before
//! the body so that unknown actions and malformed known ones fail with
//! distinct errors.

pub mod inventory;
pub mod trade;

use crate::catalog::Catalog;
use crate::entities::item::{GridLocation, ItemId, ItemLocation};
use crate::error::{DecodeError, InventoryError};
use crate::ids::IdGenerator;
use crate::inventory::changes::ProfileChanges;
use crate::inventory::state::CharacterState;
use serde::Deserialize;

pub const ACTION_KINDS: [&str; 14] = [
    "Move",
    "Swap",
    "Split",
    "Merge",
    "Transfer",
    "Remove",
    "Fold",
    "Tag",
    "Toggle",
    "Bind",
    "Examine",
    "ReadEncyclopedia",
    "ApplyInventoryChanges",
    "TradingConfirm",
];

pub const TRADE_KINDS: [&str; 2] = ["buy_from_trader", "sell_to_trader"];

/// Destination of a relocation: parent item, container name, optional grid cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveTo {
    pub id: ItemId,
    pub container: String,
    #[serde(default)]
    pub location: Option<GridLocation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveAction {
    pub item: ItemId,
    pub to: MoveTo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwapAction {
    pub item: ItemId,
    pub to: MoveTo,
    pub item2: ItemId,
    pub to2: MoveTo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SplitAction {
    #[serde(rename = "splitItem")]
    pub split_item: ItemId,
    #[serde(rename = "newItem", default)]
    pub new_item: Option<ItemId>,
    pub container: MoveTo,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MergeAction {
    pub item: ItemId,
    pub with: ItemId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransferAction {
    pub item: ItemId,
    pub with: ItemId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoveAction {
    pub item: ItemId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FoldAction {
    pub item: ItemId,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagAction {
    pub item: ItemId,
    #[serde(rename = "TagName")]
    pub tag_name: String,
    #[serde(rename = "TagColor")]
    pub tag_color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToggleAction {
    pub item: ItemId,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BindAction {
    pub item: ItemId,
    pub index: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FromOwner {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExamineAction {
    pub item: String,
    #[serde(rename = "fromOwner", default)]
    pub from_owner: Option<FromOwner>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadEncyclopediaAction {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangedItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    #[serde(rename = "parentId")]
    pub parent_id: ItemId,
    #[serde(rename = "slotId")]
    pub slot_id: String,
    #[serde(default)]
    pub location: Option<ItemLocation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApplyInventoryChangesAction {
    #[serde(rename = "changedItems")]
    pub changed_items: Vec<ChangedItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemeItem {
    pub id: ItemId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuyOrder {
    pub tid: String,
    pub item_id: ItemId,
    pub count: u32,
    #[serde(default)]
    pub scheme_id: usize,
    #[serde(default)]
    pub scheme_items: Vec<SchemeItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoldItem {
    pub id: ItemId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SellOrder {
    pub tid: String,
    pub items: Vec<SoldItem>,
    pub price: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum TradeConfirm {
    #[serde(rename = "buy_from_trader")]
    BuyFromTrader(BuyOrder),
    #[serde(rename = "sell_to_trader")]
    SellToTrader(SellOrder),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "Action")]
pub enum Action {
    Move(MoveAction),
    Swap(SwapAction),
    Split(SplitAction),
    Merge(MergeAction),
    Transfer(TransferAction),
    Remove(RemoveAction),
    Fold(FoldAction),
    Tag(TagAction),
    Toggle(ToggleAction),
    Bind(BindAction),
    Examine(ExamineAction),
    ReadEncyclopedia(ReadEncyclopediaAction),
    ApplyInventoryChanges(ApplyInventoryChangesAction),
    TradingConfirm(TradeConfirm),
}

impl Action {
    pub fn decode(value: serde_json::Value) -> Result<Self, DecodeError> {
        let kind = value
            .get("Action")
            .and_then(|kind| kind.as_str())
            .ok_or(DecodeError::MissingKind)?
            .to_string();
        if !ACTION_KINDS.contains(&kind.as_str()) {
            return Err(DecodeError::Unsupported(kind));
        }
        if kind == "TradingConfirm" {
            let trade = value
                .get("type")
                .and_then(|kind| kind.as_str())
                .unwrap_or_default();
            if !TRADE_KINDS.contains(&trade) {
                return Err(DecodeError::Unsupported(format!("TradingConfirm/{}", trade)));
            }
        }
        serde_json::from_value(value).map_err(|source| DecodeError::Malformed { kind, source })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Move(_) => "Move",
            Action::Swap(_) => "Swap",
            Action::Split(_) => "Split",
            Action::Merge(_) => "Merge",
            Action::Transfer(_) => "Transfer",
            Action::Remove(_) => "Remove",
            Action::Fold(_) => "Fold",
            Action::Tag(_) => "Tag",
            Action::Toggle(_) => "Toggle",
            Action::Bind(_) => "Bind",
            Action::Examine(_) => "Examine",
            Action::ReadEncyclopedia(_) => "ReadEncyclopedia",
            Action::ApplyInventoryChanges(_) => "ApplyInventoryChanges",
            Action::TradingConfirm(TradeConfirm::BuyFromTrader(_)) => "TradingConfirm/buy_from_trader",
            Action::TradingConfirm(TradeConfirm::SellToTrader(_)) => "TradingConfirm/sell_to_trader",
        }
    }
}

/// Read-only collaborators an action needs.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    pub catalog: &'a Catalog,
    pub ids: &'a dyn IdGenerator,
}

/// Applies one action to one character atomically. On error the character is
/// unchanged and `changes` receives nothing.
pub fn apply(
    ctx: ActionContext<'_>,
    state: &mut CharacterState,
    action: &Action,
    changes: &mut ProfileChanges,
) -> Result<(), InventoryError> {
    log::debug!("{}: applying {}", state.character().id, action.kind());
    state.commit(changes, |state, scratch| match action {
        Action::Move(action) => inventory::move_item(ctx, state, action, scratch),
        Action::Swap(action) => inventory::swap(ctx, state, action, scratch),
        Action::Split(action) => inventory::split(ctx, state, action, scratch),
        Action::Merge(action) => inventory::merge(ctx, state, action, scratch),
        Action::Transfer(action) => inventory::transfer(ctx, state, action, scratch),
        Action::Remove(action) => inventory::remove(ctx, state, action, scratch),
        Action::Fold(action) => inventory::fold(ctx, state, action, scratch),
        Action::Tag(action) => inventory::tag(state, action, scratch),
        Action::Toggle(action) => inventory::toggle(state, action, scratch),
        Action::Bind(action) => inventory::bind(state, action),
        Action::Examine(action) => inventory::examine(ctx, state, action, scratch),
        Action::ReadEncyclopedia(action) => inventory::read_encyclopedia(state, action, scratch),
        Action::ApplyInventoryChanges(action) => {
            inventory::apply_inventory_changes(ctx, state, action, scratch)
        }
        Action::TradingConfirm(TradeConfirm::BuyFromTrader(order)) => {
            trade::buy_from_trader(ctx, state, order, scratch)
        }
        Action::TradingConfirm(TradeConfirm::SellToTrader(order)) => {
            trade::sell_to_trader(ctx, state, order, scratch)
        }
    })
}
