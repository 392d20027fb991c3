//! Scalar and vector type aliases for D-dimensional positions and directions.

use nalgebra::SVector;

/// Floating point type used for every field value and coordinate.
pub type Real = f64;

/// D-dimensional vector type for positions, gradients, and normals.
///
/// This is a simple alias for `nalgebra::SVector<Real, D>`, used throughout
/// the level set for probe positions, phi gradients, and kernel gradients.
pub type Vecd<const D: usize> = SVector<Real, D>;

/// 2D vector.
pub type Vec2d = Vecd<2>;

/// 3D vector.
pub type Vec3d = Vecd<3>;

/// Largest absolute component of a vector.
#[inline]
pub fn max_abs_component<const D: usize>(v: &Vecd<D>) -> Real {
    v.iter().fold(0.0, |acc: Real, x| acc.max(x.abs()))
}

/// Guard added to denominators that may vanish.
pub const TINY_REAL: Real = 1.0e-15;
