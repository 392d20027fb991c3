//! Exact geometry consumed by level set construction
//!
//! A `Shape` answers signed distance, outward normal, and containment queries
//! against the exact boundary. Level sets sample it while classifying cells
//! and when filling freshly created data packages. The analytic shapes here
//! cover the common immersed boundaries (discs and balls, boxes, and their
//! complements for confined flows).

mod primitives;

pub use primitives::{AlignedBox, Ball, Complement};

use crate::core_types::{BoundingBox, Real, Vecd};

/// Exact geometry queried during level set construction
///
/// Signed distance is negative inside the shape. Implementations must be
/// `Send + Sync` since construction classifies cells in parallel.
pub trait Shape<const D: usize>: Send + Sync {
    /// Whether the shape is well formed. Construction refuses invalid shapes.
    fn is_valid(&self) -> bool {
        true
    }

    /// Signed distance to the boundary (negative inside)
    fn signed_distance(&self, position: &Vecd<D>) -> Real;

    /// Unit outward normal of the closest boundary point
    fn normal_direction(&self, position: &Vecd<D>) -> Vecd<D>;

    /// Exact containment test
    fn contains(&self, position: &Vecd<D>) -> bool {
        self.signed_distance(position) < 0.0
    }

    /// Tight bounds of the boundary
    fn bounds(&self) -> BoundingBox<D>;
}
