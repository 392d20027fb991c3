//! Level Set Core Library
//!
//! Adaptive narrow-band level sets for particle-based boundary handling.
//! The signed distance to an immersed boundary is stored only near the
//! interface, in small data packages attached to a coarse background grid,
//! and can be stacked into several levels of increasing resolution.
//!
//! ## Overview
//!
//! - `Level`: one resolution, built from exact geometry or refined from a
//!   coarser level
//! - `MultiLevel`: levels at halved spacings, queried by particle resolution
//! - Probes for signed distance, normal, gradient and the kernel integrals
//!   used by boundary particles
//! - Interface cleaning (redistancing and PDE reinitialization)
//!
//! ## Example
//!
//! ```no_run
//! use levelset_core::{Ball, BoundingBox, LevelSetConfig, MultiLevel, SphAdaptation, Vec2d};
//! use std::sync::Arc;
//!
//! let circle = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
//! let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.05)?);
//! let mut levels = MultiLevel::new(
//!     &BoundingBox::centered(1.5),
//!     0.05,
//!     2,
//!     circle,
//!     adaptation,
//!     LevelSetConfig::default(),
//! )?;
//! levels.clean_interface(1.0);
//! let phi = levels.probe_signed_distance(&Vec2d::new(1.05, 0.0));
//! # Ok::<(), levelset_core::LevelSetError>(())
//! ```

// Core types and utilities
pub mod core_types;
pub mod error;

// Inputs: exact geometry and particle resolution
pub mod adaptation;
pub mod geometry;

// Level sets
pub mod level_set;

// Re-export core types
pub use core_types::{BoundingBox, Real, Vec2d, Vec3d, Vecd};
pub use error::LevelSetError;

// Re-export inputs
pub use adaptation::{Kernel, SphAdaptation, WendlandC2};
pub use geometry::{AlignedBox, Ball, Complement, Shape};

// Re-export level set types
pub use level_set::{Level, LevelSetConfig, LevelSetProbe, LevelSetShape, MultiLevel};
