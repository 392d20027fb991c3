//! Analytic shapes

use super::Shape;
use crate::core_types::{BoundingBox, Real, Vecd};

/// Disc (2D) or ball (3D)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball<const D: usize> {
    center: Vecd<D>,
    radius: Real,
}

impl<const D: usize> Ball<D> {
    /// Create a ball from its center and radius
    pub fn new(center: Vecd<D>, radius: Real) -> Self {
        Self { center, radius }
    }

    /// Center point
    pub fn center(&self) -> &Vecd<D> {
        &self.center
    }

    /// Radius
    pub fn radius(&self) -> Real {
        self.radius
    }
}

impl<const D: usize> Shape<D> for Ball<D> {
    fn is_valid(&self) -> bool {
        self.radius.is_finite() && self.radius > 0.0 && self.center.iter().all(|x| x.is_finite())
    }

    fn signed_distance(&self, position: &Vecd<D>) -> Real {
        (position - self.center).norm() - self.radius
    }

    fn normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        let displacement = position - self.center;
        let distance = displacement.norm();
        if distance > 0.0 {
            displacement / distance
        } else {
            // Every direction is closest from the center
            let mut axis = Vecd::<D>::zeros();
            axis[0] = 1.0;
            axis
        }
    }

    fn bounds(&self) -> BoundingBox<D> {
        BoundingBox::new(
            self.center.add_scalar(-self.radius),
            self.center.add_scalar(self.radius),
        )
    }
}

/// Axis-aligned box given by center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedBox<const D: usize> {
    center: Vecd<D>,
    half_size: Vecd<D>,
}

impl<const D: usize> AlignedBox<D> {
    /// Create a box from its center and half extents
    pub fn new(center: Vecd<D>, half_size: Vecd<D>) -> Self {
        Self { center, half_size }
    }

    /// Per-axis excess of `|p - c|` over the half extents
    fn excess(&self, position: &Vecd<D>) -> Vecd<D> {
        (position - self.center).abs() - self.half_size
    }
}

impl<const D: usize> Shape<D> for AlignedBox<D> {
    fn is_valid(&self) -> bool {
        self.half_size.iter().all(|h| h.is_finite() && *h > 0.0)
    }

    fn signed_distance(&self, position: &Vecd<D>) -> Real {
        let excess = self.excess(position);
        let outside = excess.map(|q| q.max(0.0)).norm();
        let inside = excess.max().min(0.0);
        outside + inside
    }

    fn normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        let relative = position - self.center;
        let excess = self.excess(position);
        let outside = excess.map(|q| q.max(0.0));
        let outside_norm = outside.norm();

        if outside_norm > 0.0 {
            let mut normal = outside / outside_norm;
            for k in 0..D {
                if relative[k] < 0.0 {
                    normal[k] = -normal[k];
                }
            }
            return normal;
        }

        // Inside: the closest face belongs to the axis with the largest excess
        let axis = excess.imax();
        let mut normal = Vecd::<D>::zeros();
        normal[axis] = if relative[axis] < 0.0 { -1.0 } else { 1.0 };
        normal
    }

    fn bounds(&self) -> BoundingBox<D> {
        BoundingBox::new(self.center - self.half_size, self.center + self.half_size)
    }
}

/// Inside-out view of another shape, e.g. the fluid region of a container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complement<S> {
    inner: S,
}

impl<S> Complement<S> {
    /// Wrap a shape so that its inside becomes the outside
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<const D: usize, S: Shape<D>> Shape<D> for Complement<S> {
    fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    fn signed_distance(&self, position: &Vecd<D>) -> Real {
        -self.inner.signed_distance(position)
    }

    fn normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        -self.inner.normal_direction(position)
    }

    fn contains(&self, position: &Vecd<D>) -> bool {
        !self.inner.contains(position)
    }

    fn bounds(&self) -> BoundingBox<D> {
        self.inner.bounds()
    }
}
