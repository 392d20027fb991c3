//! Adaptive narrow-band level sets
//!
//! Signed distance to the boundary is stored only near the interface, in
//! fixed-size data packages attached to a coarse background grid. Cells far
//! from the interface share one of two far-field packages. A `MultiLevel`
//! stacks such levels at halved spacings and serves kernel integrals matched
//! to the particle resolution.

mod block;
mod config;
mod level;
mod maintenance;
mod mesh;
mod multilevel;
mod package;
mod pool;
mod probe;
mod refined;
mod shape;

/// Data points per package along each axis
pub const PACKAGE_SIZE: usize = 4;

pub use block::{Block, BLOCK_WIDTH};
pub use config::{
    LevelSetConfig, DEFAULT_BUFFER_WIDTH, DEFAULT_REINITIALIZATION_STEPS,
    DEFAULT_SMALL_SHIFT_FACTOR,
};
pub use level::Level;
pub use mesh::MeshGeometry;
pub use multilevel::MultiLevel;
pub use package::{
    cut_cell_volume_fraction, DataPackage, CUT, FAR_INSIDE, FAR_OUTSIDE, INNER_BAND, OUTER_BAND,
};
pub use pool::PackageId;
pub use probe::LevelSetProbe;
pub use shape::LevelSetShape;
