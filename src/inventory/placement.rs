use crate::inventory::grid::{rectangle, Cell, ContainerGrid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub x: u16,
    pub y: u16,
    pub cells: Vec<Cell>,
}

/// First free `height` x `width` rectangle in row-major order (top to bottom,
/// left to right). `None` is a routine outcome: the grid is simply full.
/// Rotation is the caller's business.
pub fn find_free_slot(grid: &ContainerGrid, height: u16, width: u16) -> Option<Placement> {
    if width == 0 || height == 0 || width > grid.width() || height > grid.height() {
        return None;
    }
    for y in 0..=grid.height() - height {
        let mut x = 0;
        while x <= grid.width() - width {
            match first_blocked_column(grid, x, y, width, height) {
                None => {
                    return Some(Placement {
                        x,
                        y,
                        cells: rectangle(x, y, width, height),
                    })
                }
                Some(column) => x = column + 1,
            }
        }
    }
    None
}

// Rightmost occupied column inside the candidate rectangle; any anchor left of
// it would overlap the same cell, so the scan can skip past it.
fn first_blocked_column(grid: &ContainerGrid, x: u16, y: u16, width: u16, height: u16) -> Option<u16> {
    let mut blocked = None;
    for dy in 0..height {
        for dx in 0..width {
            if grid.is_occupied(Cell::new(x + dx, y + dy)) {
                blocked = Some(blocked.map_or(x + dx, |column: u16| column.max(x + dx)));
            }
        }
    }
    blocked
}
