use crate::catalog::items::ItemCatalog;
use crate::entities::character::Character;
use crate::entities::inventory::ChildIndex;
use crate::entities::item::{InventoryItem, ItemId, ItemLocation};
use crate::error::InventoryError;
use crate::inventory::cache::{ContainerKey, LocationCache};
use crate::inventory::changes::ProfileChanges;
use crate::inventory::footprint::{self, Footprint};
use std::collections::HashSet;

/// A live character together with its location cache. Every mutation goes
/// through `commit`.
#[derive(Debug, Clone)]
pub struct CharacterState {
    character: Character,
    cache: LocationCache,
}

impl CharacterState {
    pub fn load(character: Character, catalog: &ItemCatalog) -> Result<Self, InventoryError> {
        let cache = LocationCache::build(&character.inventory.items, catalog)?;
        Ok(Self { character, cache })
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.character.inventory.items
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.cache.contains(id)
    }

    pub fn item(&self, id: &ItemId) -> Result<&InventoryItem, InventoryError> {
        let position = self.cache.position(id)?;
        self.character
            .inventory
            .items
            .get(position)
            .filter(|item| item.id == *id)
            .ok_or_else(|| InventoryError::ItemNotFound(id.clone()))
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Result<&mut InventoryItem, InventoryError> {
        let position = self.cache.position(id)?;
        self.character
            .inventory
            .items
            .get_mut(position)
            .filter(|item| item.id == *id)
            .ok_or_else(|| InventoryError::ItemNotFound(id.clone()))
    }

    /// Appends a new item, registering the grids its template declares. The
    /// index is updated by a single insertion.
    pub fn push_item(&mut self, item: InventoryItem, catalog: &ItemCatalog) -> Result<(), InventoryError> {
        if self.cache.contains(&item.id) {
            return Err(InventoryError::InvalidAction(format!(
                "item id {} already in use",
                item.id
            )));
        }
        let template = catalog
            .get(&item.tpl)
            .ok_or_else(|| InventoryError::TemplateNotFound(item.tpl.clone()))?;
        self.cache.register_containers(&item.id, template);
        let position = self.character.inventory.items.len();
        self.cache.insert_index(&item.id, position);
        self.character.inventory.items.push(item);
        Ok(())
    }

    /// `root` followed by all transitive children.
    pub fn family(&self, root: &ItemId) -> Vec<ItemId> {
        ChildIndex::build(self.items()).family(root)
    }

    pub fn is_descendant(&self, root: &ItemId, candidate: &ItemId) -> bool {
        ChildIndex::build(self.items()).is_descendant(root, candidate)
    }

    /// Whether any item above `id` is in `set`.
    pub fn has_ancestor_in(&self, id: &ItemId, set: &HashSet<ItemId>) -> bool {
        let mut current = self.item(id).ok().and_then(|item| item.parent_id.clone());
        for _ in 0..self.items().len() {
            let Some(parent) = current else {
                return false;
            };
            if set.contains(&parent) {
                return true;
            }
            current = self.item(&parent).ok().and_then(|item| item.parent_id.clone());
        }
        false
    }

    /// The grid-placed item whose footprint covers `id`: `id` itself when it
    /// sits on a grid, otherwise the nearest such ancestor reached through
    /// slot attachments.
    fn footprint_holder(&self, id: &ItemId) -> Option<ItemId> {
        let mut current = self.item(id).ok()?;
        for _ in 0..self.items().len() {
            match current.location {
                Some(ItemLocation::Grid(_)) => return Some(current.id.clone()),
                Some(ItemLocation::Counter(_)) => return None,
                None => current = self.item(current.parent_id.as_ref()?).ok()?,
            }
        }
        None
    }

    /// Re-measures and re-places the grid item that `id` is part of, after
    /// parts were attached to or detached from it.
    pub fn refit(&mut self, id: &ItemId, catalog: &ItemCatalog) -> Result<(), InventoryError> {
        let Some(holder) = self.footprint_holder(id) else {
            return Ok(());
        };
        self.cache.clear_from_container(&holder);
        self.place_footprint(&holder, catalog)
    }

    /// Removes `root` and everything below it: footprints, owned grids, list
    /// entries and quick-slot bindings, then refits whatever `root` was
    /// attached to. Returns the removed ids, root first.
    pub fn remove_family(&mut self, root: &ItemId, catalog: &ItemCatalog) -> Result<Vec<ItemId>, InventoryError> {
        if !self.cache.contains(root) {
            return Err(InventoryError::ItemNotFound(root.clone()));
        }
        if self.character.inventory.is_root(root) {
            return Err(InventoryError::InvalidAction(format!(
                "inventory root {} cannot be removed",
                root
            )));
        }
        let parent = self.item(root)?.parent_id.clone();
        let family = self.family(root);
        let mut positions = Vec::with_capacity(family.len());
        for id in &family {
            self.cache.clear_from_container(id);
            self.cache.drop_containers_of(id);
            positions.push(self.cache.position(id)?);
        }
        positions.sort_unstable_by(|a, b| b.cmp(a));
        for position in positions {
            self.character.inventory.items.remove(position);
        }
        self.cache.rebuild_index(&self.character.inventory.items);
        let removed: HashSet<ItemId> = family.iter().cloned().collect();
        self.character.inventory.drop_bindings(&removed);
        if let Some(parent) = parent {
            self.refit(&parent, catalog)?;
        }
        Ok(family)
    }

    pub fn clear_footprint(&mut self, id: &ItemId) {
        self.cache.clear_from_container(id);
    }

    pub fn measure(&self, id: &ItemId, catalog: &ItemCatalog) -> Result<Footprint, InventoryError> {
        let index = ChildIndex::build(self.items());
        footprint::measure(catalog, &index, id)
    }

    /// Claims grid cells for `id` at its stored location when its container
    /// is a grid. Slot containers and counted children take no cells.
    pub fn place_footprint(&mut self, id: &ItemId, catalog: &ItemCatalog) -> Result<(), InventoryError> {
        let item = self.item(id)?;
        let (Some(key), Some(location)) = (ContainerKey::of(item), item.grid_location()) else {
            return Ok(());
        };
        if !self.cache.has_grid(&key) {
            return Ok(());
        }
        let size = self.measure(id, catalog)?;
        self.cache.add_to_container(id, key, size, location)
    }

    /// Clears and recomputes every footprint from stored locations.
    pub fn relayout(&mut self, catalog: &ItemCatalog) -> Result<(), InventoryError> {
        self.cache.layout_all(&self.character.inventory.items, catalog)
    }

    /// Runs one action atomically. The action writes into a scratch diff that
    /// is merged into `changes` only on success; on failure the character and
    /// cache are restored to their state before the call.
    pub fn commit<T, F>(&mut self, changes: &mut ProfileChanges, action: F) -> Result<T, InventoryError>
    where
        F: FnOnce(&mut CharacterState, &mut ProfileChanges) -> Result<T, InventoryError>,
    {
        let snapshot = self.clone();
        let mut scratch = ProfileChanges::new(changes.id.clone());
        match action(self, &mut scratch) {
            Ok(value) => {
                self.cache.ensure_index(&self.character.inventory.items);
                changes.merge(scratch);
                Ok(value)
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn remove_family_drops_children_grids_and_bindings() {
        let catalog = testing::catalog();
        let bandage = testing::BANDAGE;
        let mut inner = InventoryItem::new(ItemId::from("inner"), bandage)
            .with_parent(&ItemId::from("box"), "main")
            .with_location(crate::entities::item::ItemLocation::Grid(
                crate::entities::item::GridLocation::new(1, 1, Default::default()),
            ));
        inner.set_stack_count(1);
        let mut character = testing::character_with(vec![
            testing::stash_item("box", testing::BOX_2X2, 0, 0),
            inner,
            testing::stash_item("other", bandage, 5, 5),
        ]);
        character
            .inventory
            .toggle_binding("Item4", &ItemId::from("inner"));
        let mut state = CharacterState::load(character, catalog.items()).expect("state");

        let removed = state.remove_family(&ItemId::from("box"), catalog.items()).expect("remove");
        assert_eq!(removed, vec![ItemId::from("box"), ItemId::from("inner")]);
        assert_eq!(state.items().len(), 3);
        assert!(state.item(&ItemId::from("other")).is_ok());
        assert!(!state.cache().has_grid(&ContainerKey::new(&ItemId::from("box"), "main")));
        assert!(state.character().inventory.fast_panel.is_empty());
        assert!(state.cache().verify_index(state.items()));
        let stash_key = ContainerKey::new(&state.character().inventory.stash, "hideout");
        assert_eq!(state.cache().grid(&stash_key).expect("grid").occupied_cells(), 1);
    }

    #[test]
    fn remove_rejects_inventory_roots() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![]);
        let stash = state.character().inventory.stash.clone();
        assert!(matches!(
            state.remove_family(&stash, catalog.items()),
            Err(InventoryError::InvalidAction(_))
        ));
    }

    #[test]
    fn failed_commit_restores_everything() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::stash_item("a", testing::BANDAGE, 0, 0)]);
        let before_items = state.items().to_vec();
        let mut changes = ProfileChanges::new("pmc");

        let result: Result<(), InventoryError> = state.commit(&mut changes, |state, scratch| {
            let removed = state.remove_family(&ItemId::from("a"), catalog.items())?;
            scratch.deleted_item(&removed[0]);
            state.character_mut().info.experience += 50;
            Err(InventoryError::InvalidAction("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(state.items(), before_items.as_slice());
        assert_eq!(state.character().info.experience, 0);
        assert!(state.item(&ItemId::from("a")).is_ok());
        assert!(changes.is_empty());
    }

    #[test]
    fn successful_commit_merges_scratch_diff() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::stash_item("a", testing::BANDAGE, 0, 0)]);
        let mut changes = ProfileChanges::new("pmc");
        state
            .commit(&mut changes, |state, scratch| {
                let item = state.item_mut(&ItemId::from("a"))?;
                item.upd_mut().togglable = Some(crate::entities::item::Togglable { on: true });
                scratch.changed_item(item);
                Ok(())
            })
            .expect("commit");
        assert_eq!(changes.items.change.len(), 1);
    }

    #[test]
    fn push_item_rejects_duplicate_ids() {
        let catalog = testing::catalog();
        let mut state = testing::state_with(&catalog, vec![testing::stash_item("a", testing::BANDAGE, 0, 0)]);
        let err = state
            .push_item(InventoryItem::new(ItemId::from("a"), testing::BANDAGE), catalog.items())
            .expect_err("duplicate");
        assert!(matches!(err, InventoryError::InvalidAction(_)));
    }
}
