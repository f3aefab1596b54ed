pub mod cache;
pub mod changes;
pub mod footprint;
pub mod grid;
pub mod placement;
pub mod state;
