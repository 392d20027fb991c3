//! Level set standing in for exact geometry

use super::{LevelSetConfig, MultiLevel};
use crate::adaptation::SphAdaptation;
use crate::core_types::{BoundingBox, Real, Vecd};
use crate::error::LevelSetError;
use crate::geometry::Shape;
use std::sync::Arc;

/// Shape answered by a multi-level set instead of the exact boundary
///
/// Typical use is to clean the level set once and then build further level
/// sets, or boundary particles, from the smoothed surface.
#[derive(Debug)]
pub struct LevelSetShape<const D: usize> {
    levels: MultiLevel<D>,
    bounds: BoundingBox<D>,
}

impl<const D: usize> LevelSetShape<D> {
    /// Build a multi-level set of `exact` over its own bounds
    ///
    /// # Errors
    ///
    /// Returns any error raised while building the levels.
    pub fn new(
        exact: Arc<dyn Shape<D>>,
        reference_data_spacing: Real,
        total_levels: usize,
        adaptation: Arc<SphAdaptation>,
        config: LevelSetConfig,
    ) -> Result<Self, LevelSetError> {
        let bounds = exact.bounds();
        let levels = MultiLevel::new(
            &bounds,
            reference_data_spacing,
            total_levels,
            exact,
            adaptation,
            config,
        )?;
        Ok(Self { levels, bounds })
    }

    /// Wrap an existing multi-level set
    pub fn from_levels(levels: MultiLevel<D>) -> Self {
        let bounds = *levels.coarsest().bounds();
        Self { levels, bounds }
    }

    /// Underlying level sets
    pub fn levels(&self) -> &MultiLevel<D> {
        &self.levels
    }

    /// Clean the finest level's interface and return `self` for chaining
    pub fn clean_level_set(&mut self, small_shift_factor: Real) -> &mut Self {
        self.levels.clean_interface(small_shift_factor);
        self
    }
}

impl<const D: usize> Shape<D> for LevelSetShape<D> {
    fn signed_distance(&self, position: &Vecd<D>) -> Real {
        self.levels.probe_signed_distance(position)
    }

    fn normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        self.levels.probe_normal_direction(position)
    }

    fn bounds(&self) -> BoundingBox<D> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Vec2d;
    use crate::geometry::{Ball, Shape};
    use crate::level_set::Level;
    use approx::assert_relative_eq;

    fn circle_shape() -> LevelSetShape<2> {
        let exact: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.05).unwrap());
        LevelSetShape::new(exact, 0.05, 1, adaptation, LevelSetConfig::default()).unwrap()
    }

    #[test]
    fn test_shape_queries_follow_level_set() {
        let shape = circle_shape();
        assert!(shape.contains(&Vec2d::new(0.2, 0.1)));
        assert!(!shape.contains(&Vec2d::new(1.1, 0.0)));
        assert_relative_eq!(shape.signed_distance(&Vec2d::new(0.0, -1.03)), 0.03, epsilon = 2e-3);
        let normal = shape.normal_direction(&Vec2d::new(-1.0, 0.0));
        assert_relative_eq!(normal, Vec2d::new(-1.0, 0.0), epsilon = 1e-2);
    }

    #[test]
    fn test_cleaned_shape_feeds_another_level() {
        let mut shape = circle_shape();
        shape.clean_level_set(1.0);
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.05).unwrap());
        let bounds = shape.bounds();
        let rebuilt = Level::new(
            &bounds,
            0.05,
            Arc::new(shape),
            adaptation,
            LevelSetConfig::default(),
        )
        .unwrap();
        assert!(rebuilt.core_package_count() > 0);
        assert_relative_eq!(rebuilt.probe_signed_distance(&Vec2d::new(1.02, 0.0)), 0.02, epsilon = 0.01);
    }
}
