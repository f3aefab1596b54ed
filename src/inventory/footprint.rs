use crate::catalog::items::ItemCatalog;
use crate::entities::inventory::ChildIndex;
use crate::entities::item::{GridLocation, InventoryItem, ItemId, Rotation};
use crate::error::InventoryError;
use crate::inventory::grid::{rectangle, Cell};
use std::collections::VecDeque;

/// Unrotated size of an item together with everything attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub width: u16,
    pub height: u16,
}

impl Footprint {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// (width, height) as laid out on the grid.
    pub fn oriented(self, rotation: Rotation) -> (u16, u16) {
        if rotation.is_vertical() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    pub fn cells_at(self, location: GridLocation) -> Vec<Cell> {
        let (width, height) = self.oriented(location.r);
        rectangle(location.x, location.y, width, height)
    }
}

#[derive(Default)]
struct Extras {
    left: u16,
    right: u16,
    up: u16,
    down: u16,
}

/// Measures the item `root` plus its attached parts (children without a
/// location, such as mods in slots). Non-forced extra sizes contribute the
/// largest value per side; forced ones add up. A folded foldable root loses
/// `SizeReduceRight` columns.
pub fn measure(
    catalog: &ItemCatalog,
    index: &ChildIndex,
    root: &ItemId,
) -> Result<Footprint, InventoryError> {
    let root_item = index
        .get(root)
        .ok_or_else(|| InventoryError::ItemNotFound(root.clone()))?;
    let root_template = template(catalog, root_item)?;

    let mut largest = Extras::default();
    let mut forced = Extras::default();
    let mut queue: VecDeque<&ItemId> = index.children(root).iter().copied().collect();
    let mut visited = 0usize;
    while let Some(id) = queue.pop_front() {
        visited += 1;
        if visited > index.len() {
            break;
        }
        let Some(part) = index.get(id) else {
            continue;
        };
        if part.location.is_some() {
            continue;
        }
        let props = &template(catalog, part)?.props;
        if props.extra_size_force_add {
            forced.left = forced.left.saturating_add(props.extra_size_left);
            forced.right = forced.right.saturating_add(props.extra_size_right);
            forced.up = forced.up.saturating_add(props.extra_size_up);
            forced.down = forced.down.saturating_add(props.extra_size_down);
        } else {
            largest.left = largest.left.max(props.extra_size_left);
            largest.right = largest.right.max(props.extra_size_right);
            largest.up = largest.up.max(props.extra_size_up);
            largest.down = largest.down.max(props.extra_size_down);
        }
        queue.extend(index.children(id).iter().copied());
    }

    let props = &root_template.props;
    let mut base_width = props.width.max(1);
    if props.foldable && root_item.is_folded() {
        base_width = base_width.saturating_sub(props.size_reduce_right).max(1);
    }
    let width = base_width
        .saturating_add(largest.left)
        .saturating_add(largest.right)
        .saturating_add(forced.left)
        .saturating_add(forced.right);
    let height = props
        .height
        .max(1)
        .saturating_add(largest.up)
        .saturating_add(largest.down)
        .saturating_add(forced.up)
        .saturating_add(forced.down);
    Ok(Footprint::new(width, height))
}

fn template<'c>(
    catalog: &'c ItemCatalog,
    item: &InventoryItem,
) -> Result<&'c crate::catalog::items::ItemTemplate, InventoryError> {
    catalog
        .get(&item.tpl)
        .ok_or_else(|| InventoryError::TemplateNotFound(item.tpl.clone()))
}
