//! Location cache for one character: where every item sits in the item list
//! and, for items inside grid containers, which cells it covers.

use crate::catalog::items::ItemCatalog;
use crate::entities::inventory::ChildIndex;
use crate::entities::item::{GridLocation, InventoryItem, ItemId, Rotation};
use crate::error::InventoryError;
use crate::inventory::footprint::{self, Footprint};
use crate::inventory::grid::{Cell, ContainerGrid};
use std::collections::{BTreeMap, HashMap};

/// A grid is named by the item owning it and the template's grid name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerKey {
    pub parent: ItemId,
    pub grid: String,
}

impl ContainerKey {
    pub fn new(parent: &ItemId, grid: &str) -> Self {
        Self {
            parent: parent.clone(),
            grid: grid.to_string(),
        }
    }

    /// Key of the container `item` currently sits in, if it has a parent slot.
    pub fn of(item: &InventoryItem) -> Option<Self> {
        match (item.parent_id.as_ref(), item.slot_id.as_deref()) {
            (Some(parent), Some(slot)) => Some(Self::new(parent, slot)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMapEntry {
    pub container: ContainerKey,
    pub cells: Vec<Cell>,
    pub width: u16,
    pub height: u16,
    pub rotation: Rotation,
}

/// A list position valid only for the cache generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    position: usize,
    generation: u64,
}

impl Slot {
    pub fn position(self) -> usize {
        self.position
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocationCache {
    index: HashMap<ItemId, usize>,
    flat_map: HashMap<ItemId, FlatMapEntry>,
    grids: BTreeMap<ContainerKey, ContainerGrid>,
    generation: u64,
}

impl LocationCache {
    /// Builds the index, registers every grid the items' templates declare and
    /// lays out every item that sits at a grid location inside one of them.
    pub fn build(items: &[InventoryItem], catalog: &ItemCatalog) -> Result<Self, InventoryError> {
        let mut cache = Self::default();
        cache.rebuild_index(items);
        for item in items {
            match catalog.get(&item.tpl) {
                Some(template) => cache.register_containers(&item.id, template),
                None => log::warn!("item {} has unknown template {}", item.id, item.tpl),
            }
        }
        cache.layout_all(items, catalog)?;
        Ok(cache)
    }

    /// Clears every footprint and lays the grid items out again from their
    /// stored locations.
    pub fn layout_all(&mut self, items: &[InventoryItem], catalog: &ItemCatalog) -> Result<(), InventoryError> {
        self.flat_map.clear();
        for grid in self.grids.values_mut() {
            *grid = ContainerGrid::new(grid.width(), grid.height());
        }
        let index = ChildIndex::build(items);
        for item in items {
            let (Some(key), Some(location)) = (ContainerKey::of(item), item.grid_location()) else {
                continue;
            };
            if !self.has_grid(&key) {
                continue;
            }
            let size = footprint::measure(catalog, &index, &item.id)?;
            self.add_to_container(&item.id, key, size, location)?;
        }
        Ok(())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Full rebuild of id → position. Invalidates every issued `Slot`.
    pub fn rebuild_index(&mut self, items: &[InventoryItem]) {
        self.index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id.clone(), position))
            .collect();
        self.generation += 1;
    }

    /// Records an item appended at `position` without invalidating slots.
    pub fn insert_index(&mut self, id: &ItemId, position: usize) {
        self.index.insert(id.clone(), position);
    }

    pub fn slot(&self, id: &ItemId) -> Option<Slot> {
        self.index.get(id).map(|position| Slot {
            position: *position,
            generation: self.generation,
        })
    }

    pub fn resolve(&self, slot: Slot) -> Result<usize, InventoryError> {
        if slot.generation != self.generation {
            return Err(InventoryError::StaleIndex {
                position: slot.position,
                issued: slot.generation,
                current: self.generation,
            });
        }
        Ok(slot.position)
    }

    pub fn position(&self, id: &ItemId) -> Result<usize, InventoryError> {
        let slot = self
            .slot(id)
            .ok_or_else(|| InventoryError::ItemNotFound(id.clone()))?;
        self.resolve(slot)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// True when the index maps every item to its real position and nothing else.
    pub fn verify_index(&self, items: &[InventoryItem]) -> bool {
        self.index.len() == items.len()
            && items
                .iter()
                .enumerate()
                .all(|(position, item)| self.index.get(&item.id) == Some(&position))
    }

    pub fn ensure_index(&mut self, items: &[InventoryItem]) {
        if !self.verify_index(items) {
            log::debug!("location index out of step with item list, rebuilding");
            self.rebuild_index(items);
        }
    }

    pub fn entry(&self, id: &ItemId) -> Option<&FlatMapEntry> {
        self.flat_map.get(id)
    }

    pub fn grid(&self, key: &ContainerKey) -> Option<&ContainerGrid> {
        self.grids.get(key)
    }

    pub fn has_grid(&self, key: &ContainerKey) -> bool {
        self.grids.contains_key(key)
    }

    pub fn register_containers(&mut self, owner: &ItemId, template: &crate::catalog::items::ItemTemplate) {
        for grid in &template.props.grids {
            self.grids
                .entry(ContainerKey::new(owner, &grid.name))
                .or_insert_with(|| ContainerGrid::new(grid.props.cells_h, grid.props.cells_v));
        }
    }

    pub fn drop_containers_of(&mut self, owner: &ItemId) {
        self.grids.retain(|key, _| key.parent != *owner);
    }

    /// Frees the cells `id` covers; the index is untouched.
    pub fn clear_from_container(&mut self, id: &ItemId) -> Option<FlatMapEntry> {
        let entry = self.flat_map.remove(id)?;
        if let Some(grid) = self.grids.get_mut(&entry.container) {
            grid.remove_footprint(id);
        }
        Some(entry)
    }

    /// Claims the cells of `size` at `location` inside `key`. A key without a
    /// registered grid is an error; callers check `has_grid` for slots.
    pub fn add_to_container(
        &mut self,
        id: &ItemId,
        key: ContainerKey,
        size: Footprint,
        location: GridLocation,
    ) -> Result<(), InventoryError> {
        let grid = self
            .grids
            .get_mut(&key)
            .ok_or_else(|| InventoryError::InvalidAction(format!("{} has no grid {}", key.parent, key.grid)))?;
        let cells = size.cells_at(location);
        grid.add_footprint(id, &cells)?;
        let (width, height) = size.oriented(location.r);
        self.flat_map.insert(
            id.clone(),
            FlatMapEntry {
                container: key,
                cells,
                width,
                height,
                rotation: location.r,
            },
        );
        Ok(())
    }
}
