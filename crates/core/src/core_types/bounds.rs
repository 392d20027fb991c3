//! Axis-aligned bounding boxes

use super::vecd::{Real, Vecd};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in D dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<const D: usize> {
    /// Lower corner
    pub lower: Vecd<D>,
    /// Upper corner
    pub upper: Vecd<D>,
}

impl<const D: usize> BoundingBox<D> {
    /// Create a box from its two corners
    pub fn new(lower: Vecd<D>, upper: Vecd<D>) -> Self {
        Self { lower, upper }
    }

    /// Cube `[-half_extent, half_extent]^D` centered at the origin
    pub fn centered(half_extent: Real) -> Self {
        Self {
            lower: Vecd::<D>::repeat(-half_extent),
            upper: Vecd::<D>::repeat(half_extent),
        }
    }

    /// Edge lengths
    pub fn size(&self) -> Vecd<D> {
        self.upper - self.lower
    }

    /// Check whether a point lies inside the box (boundary inclusive)
    pub fn contains(&self, point: &Vecd<D>) -> bool {
        (0..D).all(|k| point[k] >= self.lower[k] && point[k] <= self.upper[k])
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: Real) -> Self {
        Self {
            lower: self.lower.add_scalar(-margin),
            upper: self.upper.add_scalar(margin),
        }
    }
}
