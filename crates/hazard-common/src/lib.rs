//! Common types shared across the wind-hazard workspace.

pub mod bbox;
pub mod grid;
pub mod tile;

pub use bbox::BoundingBox;
pub use grid::{DomainGrid, GridWindow};
pub use tile::{tile_grid, Tile};
