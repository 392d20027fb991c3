//! Core types and utilities

pub mod bounds;
pub mod index;
pub mod vecd;

pub use bounds::BoundingBox;
pub use index::{box_volume, linear_index, offsets, shifted, Index, IndexBox};
pub use vecd::{max_abs_component, Real, Vec2d, Vec3d, Vecd, TINY_REAL};
