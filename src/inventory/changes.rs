use crate::entities::character::TraderRelation;
use crate::entities::item::{DeletedItem, InventoryItem, ItemId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ItemChanges {
    pub new: Vec<InventoryItem>,
    pub change: Vec<InventoryItem>,
    pub del: Vec<DeletedItem>,
}

/// Per-character diff returned to the client after a batch of actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfileChanges {
    #[serde(rename = "_id")]
    pub id: String,
    pub items: ItemChanges,
    #[serde(rename = "traderRelations")]
    pub trader_relations: BTreeMap<String, TraderRelation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<i64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub encyclopedia: BTreeMap<String, bool>,
    /// Removed along with a deleted ancestor and not reported on their own.
    #[serde(skip)]
    dropped: Vec<ItemId>,
}

impl ProfileChanges {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn new_item(&mut self, item: &InventoryItem) {
        match self.items.new.iter_mut().find(|entry| entry.id == item.id) {
            Some(entry) => *entry = item.clone(),
            None => self.items.new.push(item.clone()),
        }
    }

    /// Records the latest state of `item`. An item created in the same batch
    /// stays reported as new, with its latest state.
    pub fn changed_item(&mut self, item: &InventoryItem) {
        if let Some(entry) = self.items.new.iter_mut().find(|entry| entry.id == item.id) {
            *entry = item.clone();
            return;
        }
        match self.items.change.iter_mut().find(|entry| entry.id == item.id) {
            Some(entry) => *entry = item.clone(),
            None => self.items.change.push(item.clone()),
        }
    }

    /// An item created and deleted within the same batch leaves no trace.
    pub fn deleted_item(&mut self, id: &ItemId) {
        self.items.change.retain(|entry| entry.id != *id);
        let before = self.items.new.len();
        self.items.new.retain(|entry| entry.id != *id);
        if self.items.new.len() != before {
            return;
        }
        if !self.items.del.iter().any(|entry| entry.id == *id) {
            self.items.del.push(DeletedItem { id: id.clone() });
        }
    }

    /// Records the removal of a whole subtree, `family[0]` being its root.
    /// Only the root is reported; pending entries for the rest are dropped.
    pub fn deleted_family(&mut self, family: &[ItemId]) {
        let Some((root, rest)) = family.split_first() else {
            return;
        };
        for id in rest {
            self.forget(id);
        }
        self.deleted_item(root);
    }

    fn forget(&mut self, id: &ItemId) {
        self.items.change.retain(|entry| entry.id != *id);
        self.items.new.retain(|entry| entry.id != *id);
        if !self.dropped.contains(id) {
            self.dropped.push(id.clone());
        }
    }

    pub fn trader_relation(&mut self, trader_id: &str, relation: &TraderRelation) {
        self.trader_relations
            .insert(trader_id.to_string(), relation.clone());
    }

    /// Folds a later diff into this one, entry by entry.
    pub fn merge(&mut self, later: ProfileChanges) {
        for item in &later.items.new {
            self.new_item(item);
        }
        for item in &later.items.change {
            self.changed_item(item);
        }
        for id in &later.dropped {
            self.forget(id);
        }
        for deleted in &later.items.del {
            self.deleted_item(&deleted.id);
        }
        self.trader_relations.extend(later.trader_relations);
        if later.experience.is_some() {
            self.experience = later.experience;
        }
        self.encyclopedia.extend(later.encyclopedia);
    }

    pub fn is_empty(&self) -> bool {
        self.items.new.is_empty()
            && self.items.change.is_empty()
            && self.items.del.is_empty()
            && self.trader_relations.is_empty()
            && self.experience.is_none()
            && self.encyclopedia.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub index: usize,
    pub errmsg: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfileChangesEvent {
    pub warnings: Vec<Warning>,
    #[serde(rename = "profileChanges")]
    pub profile_changes: BTreeMap<String, ProfileChanges>,
}

impl ProfileChangesEvent {
    pub fn changes_for(&mut self, character_id: &str) -> &mut ProfileChanges {
        self.profile_changes
            .entry(character_id.to_string())
            .or_insert_with(|| ProfileChanges::new(character_id))
    }

    pub fn warn(&mut self, index: usize, errmsg: impl Into<String>) {
        self.warnings.push(Warning {
            index,
            errmsg: errmsg.into(),
        });
    }
}
