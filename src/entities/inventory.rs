use crate::entities::item::{InventoryItem, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

pub const STASH_GRID: &str = "hideout";

/// Persisted inventory: a flat item list forming a forest through `parentId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<InventoryItem>,
    pub stash: ItemId,
    pub equipment: ItemId,
    #[serde(rename = "fastPanel", default)]
    pub fast_panel: BTreeMap<String, ItemId>,
}

impl Inventory {
    pub fn new(stash: InventoryItem, equipment: InventoryItem) -> Self {
        let stash_id = stash.id.clone();
        let equipment_id = equipment.id.clone();
        Self {
            items: vec![stash, equipment],
            stash: stash_id,
            equipment: equipment_id,
            fast_panel: BTreeMap::new(),
        }
    }

    pub fn is_root(&self, id: &ItemId) -> bool {
        *id == self.stash || *id == self.equipment
    }

    /// Toggles a quick-slot binding: bind when empty, unbind when already bound
    /// to the same item, rebind otherwise.
    pub fn toggle_binding(&mut self, index: &str, item: &ItemId) -> Option<ItemId> {
        match self.fast_panel.get(index) {
            Some(bound) if bound == item => {
                self.fast_panel.remove(index);
                None
            }
            _ => {
                self.fast_panel.insert(index.to_string(), item.clone());
                Some(item.clone())
            }
        }
    }

    pub fn drop_bindings(&mut self, removed: &HashSet<ItemId>) {
        self.fast_panel.retain(|_, bound| !removed.contains(bound));
    }
}

/// Parent-id adjacency built from the item list, used for descendant traversal.
pub struct ChildIndex<'a> {
    items: HashMap<&'a ItemId, &'a InventoryItem>,
    children: HashMap<&'a ItemId, Vec<&'a ItemId>>,
}

impl<'a> ChildIndex<'a> {
    pub fn build(items: &'a [InventoryItem]) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut children: HashMap<&ItemId, Vec<&ItemId>> = HashMap::new();
        for item in items {
            by_id.insert(&item.id, item);
            if let Some(parent) = item.parent_id.as_ref() {
                children.entry(parent).or_default().push(&item.id);
            }
        }
        Self {
            items: by_id,
            children,
        }
    }

    pub fn get(&self, id: &ItemId) -> Option<&'a InventoryItem> {
        self.items.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn children(&self, parent: &ItemId) -> &[&'a ItemId] {
        self.children
            .get(parent)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    /// Breadth-first family of `root`, root first. Guards against malformed
    /// cycles by never visiting an id twice.
    pub fn family(&self, root: &ItemId) -> Vec<ItemId> {
        let mut seen = HashSet::new();
        let mut family = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(root.clone());
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            for child in self.children(&id) {
                queue.push_back((*child).clone());
            }
            family.push(id);
        }
        family
    }

    pub fn is_descendant(&self, root: &ItemId, candidate: &ItemId) -> bool {
        self.family(root).iter().any(|id| id == candidate)
    }
}
