use crate::entities::item::ItemId;
use crate::error::InventoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
}

impl Cell {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Cells covered by a `width` x `height` rectangle anchored at (x, y), row-major.
pub fn rectangle(x: u16, y: u16, width: u16, height: u16) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(usize::from(width) * usize::from(height));
    for dy in 0..height {
        for dx in 0..width {
            cells.push(Cell::new(x.saturating_add(dx), y.saturating_add(dy)));
        }
    }
    cells
}

/// Occupancy map of one container grid: each cell holds the id of the item
/// covering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerGrid {
    width: u16,
    height: u16,
    cells: Vec<Option<ItemId>>,
}

impl ContainerGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![None; usize::from(width) * usize::from(height)],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    fn offset(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some(usize::from(cell.y) * usize::from(self.width) + usize::from(cell.x))
    }

    pub fn owner(&self, cell: Cell) -> Option<&ItemId> {
        self.offset(cell)
            .and_then(|offset| self.cells.get(offset))
            .and_then(|entry| entry.as_ref())
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.owner(cell).is_some()
    }

    /// Claims every cell for `item`. Nothing is written unless all cells are
    /// in bounds and free.
    pub fn add_footprint(&mut self, item: &ItemId, cells: &[Cell]) -> Result<(), InventoryError> {
        let mut offsets = Vec::with_capacity(cells.len());
        for cell in cells {
            let offset = self
                .offset(*cell)
                .ok_or_else(|| InventoryError::NoSpace(item.clone()))?;
            if self.cells[offset].is_some() {
                return Err(InventoryError::NoSpace(item.clone()));
            }
            offsets.push(offset);
        }
        for offset in offsets {
            self.cells[offset] = Some(item.clone());
        }
        Ok(())
    }

    /// Frees every cell owned by `item`; returns how many were freed.
    pub fn remove_footprint(&mut self, item: &ItemId) -> usize {
        let mut freed = 0;
        for entry in self.cells.iter_mut() {
            if entry.as_ref() == Some(item) {
                *entry = None;
                freed += 1;
            }
        }
        freed
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|entry| entry.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg_next(state: &mut u64) -> u32 {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (*state >> 32) as u32
    }

    #[test]
    fn add_then_remove_restores_grid() {
        let mut grid = ContainerGrid::new(10, 10);
        let before = grid.clone();
        let id = ItemId::from("rifle");

        grid.add_footprint(&id, &rectangle(2, 3, 4, 2)).expect("place");
        assert_eq!(grid.occupied_cells(), 8);
        assert!(grid.is_occupied(Cell::new(5, 4)));
        assert!(!grid.is_occupied(Cell::new(6, 4)));

        assert_eq!(grid.remove_footprint(&id), 8);
        assert_eq!(grid, before);
    }

    #[test]
    fn collision_leaves_grid_untouched() {
        let mut grid = ContainerGrid::new(4, 4);
        grid.add_footprint(&ItemId::from("a"), &rectangle(1, 1, 2, 2))
            .expect("place a");
        let before = grid.clone();

        let err = grid
            .add_footprint(&ItemId::from("b"), &rectangle(0, 0, 2, 2))
            .expect_err("overlap");
        assert_eq!(err, InventoryError::NoSpace(ItemId::from("b")));
        assert_eq!(grid, before);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut grid = ContainerGrid::new(3, 3);
        let err = grid
            .add_footprint(&ItemId::from("long"), &rectangle(2, 0, 2, 1))
            .expect_err("out of bounds");
        assert_eq!(err, InventoryError::NoSpace(ItemId::from("long")));
        assert_eq!(grid.occupied_cells(), 0);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut grid = ContainerGrid::new(2, 2);
        grid.add_footprint(&ItemId::from("a"), &[Cell::new(0, 0)])
            .expect("place");
        assert_eq!(grid.remove_footprint(&ItemId::from("ghost")), 0);
        assert_eq!(grid.occupied_cells(), 1);
    }

    #[test]
    fn random_place_remove_sequences_round_trip() {
        let mut state = 0x5eed_cafe_f00d_beef;
        for _ in 0..64 {
            let width = 1 + (lcg_next(&mut state) % 12) as u16;
            let height = 1 + (lcg_next(&mut state) % 12) as u16;
            let mut grid = ContainerGrid::new(width, height);
            let mut placed = Vec::new();
            for n in 0..8 {
                let w = 1 + (lcg_next(&mut state) % 3) as u16;
                let h = 1 + (lcg_next(&mut state) % 3) as u16;
                let x = (lcg_next(&mut state) % u32::from(width)) as u16;
                let y = (lcg_next(&mut state) % u32::from(height)) as u16;
                let before = grid.clone();
                let id = ItemId::new(format!("item-{n}"));
                if grid.add_footprint(&id, &rectangle(x, y, w, h)).is_ok() {
                    placed.push((id, before));
                } else {
                    assert_eq!(grid, before);
                }
            }
            while let Some((id, before)) = placed.pop() {
                grid.remove_footprint(&id);
                assert_eq!(grid, before);
            }
            assert_eq!(grid.occupied_cells(), 0);
        }
    }
}
