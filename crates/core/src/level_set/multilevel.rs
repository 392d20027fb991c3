//! Stack of level sets at successively halved spacings
//!
//! Level 0 is the coarsest. Geometric queries go to the finest level whose
//! core band covers the position; kernel integrals are matched to a particle
//! resolution ratio and blended linearly between the two bracketing levels.

use super::{Level, LevelSetConfig};
use crate::adaptation::SphAdaptation;
use crate::core_types::{BoundingBox, Real, Vecd};
use crate::error::LevelSetError;
use crate::geometry::Shape;
use std::sync::Arc;
use tracing::{error, info};

/// Level sets ordered from coarse to fine
#[derive(Debug)]
pub struct MultiLevel<const D: usize> {
    levels: Vec<Level<D>>,
    ratio_tolerance: Real,
}

impl<const D: usize> MultiLevel<D> {
    /// Build `total_levels` levels, the coarsest at `reference_data_spacing`
    ///
    /// # Errors
    ///
    /// Returns `NoLevels` when `total_levels` is zero, or any error raised
    /// while building a level.
    pub fn new(
        bounds: &BoundingBox<D>,
        reference_data_spacing: Real,
        total_levels: usize,
        shape: Arc<dyn Shape<D>>,
        adaptation: Arc<SphAdaptation>,
        config: LevelSetConfig,
    ) -> Result<Self, LevelSetError> {
        if total_levels == 0 {
            return Err(LevelSetError::NoLevels);
        }
        let mut levels = Vec::with_capacity(total_levels);
        levels.push(Level::new(
            bounds,
            reference_data_spacing,
            shape,
            adaptation,
            config,
        )?);
        for _ in 1..total_levels {
            let refined = match levels.last() {
                Some(coarse) => Level::refine_from(coarse)?,
                None => return Err(LevelSetError::NoLevels),
            };
            levels.push(refined);
        }
        info!(
            "Built multi-level set with {} levels, finest spacing {:.4}",
            levels.len(),
            levels.last().map_or(reference_data_spacing, Level::data_spacing)
        );
        Self::from_levels(levels)
    }

    /// Assemble prebuilt levels ordered from coarse to fine
    ///
    /// # Errors
    ///
    /// Returns `NoLevels` for an empty list and `UnorderedLevels` when the
    /// resolution ratios do not strictly increase.
    pub fn from_levels(levels: Vec<Level<D>>) -> Result<Self, LevelSetError> {
        let Some(first) = levels.first() else {
            return Err(LevelSetError::NoLevels);
        };
        let ratio_tolerance = first.config().ratio_tolerance;
        for (level, pair) in levels.windows(2).enumerate() {
            let previous = pair[0].resolution_ratio();
            let ratio = pair[1].resolution_ratio();
            if ratio <= previous {
                return Err(LevelSetError::UnorderedLevels {
                    level: level + 1,
                    ratio,
                    previous,
                });
            }
        }
        Ok(Self {
            levels,
            ratio_tolerance,
        })
    }

    /// All levels, coarsest first
    pub fn levels(&self) -> &[Level<D>] {
        &self.levels
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; construction rejects empty stacks
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Coarsest level
    pub fn coarsest(&self) -> &Level<D> {
        &self.levels[0]
    }

    /// Finest level
    pub fn finest(&self) -> &Level<D> {
        &self.levels[self.levels.len() - 1]
    }

    /// Finest level whose resolution ratio does not exceed `h_ratio`
    pub fn try_level_for_ratio(&self, h_ratio: Real) -> Option<usize> {
        (0..self.levels.len()).rev().find(|&level| {
            let ratio = self.levels[level].resolution_ratio();
            h_ratio - ratio > -self.ratio_tolerance * ratio.max(1.0)
        })
    }

    /// Like `try_level_for_ratio`, but a resolution coarser than every level
    /// is an invariant violation
    ///
    /// # Panics
    ///
    /// Panics if `h_ratio` is below the coarsest level's resolution ratio.
    pub fn level_for_ratio(&self, h_ratio: Real) -> usize {
        match self.try_level_for_ratio(h_ratio) {
            Some(level) => level,
            None => {
                error!(
                    "No level matches resolution ratio {} (coarsest ratio {})",
                    h_ratio,
                    self.coarsest().resolution_ratio()
                );
                panic!("resolution ratio {h_ratio} is coarser than every level");
            }
        }
    }

    /// Finest level whose core band covers `position`, else the coarsest
    pub fn probe_level(&self, position: &Vecd<D>) -> &Level<D> {
        self.levels
            .iter()
            .rev()
            .find(|level| level.is_within_core_package(position))
            .unwrap_or_else(|| self.coarsest())
    }

    /// Signed distance from the best covering level
    pub fn probe_signed_distance(&self, position: &Vecd<D>) -> Real {
        self.probe_level(position).probe_signed_distance(position)
    }

    /// Unit normal from the best covering level
    pub fn probe_normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        self.probe_level(position).probe_normal_direction(position)
    }

    /// Unnormalized gradient from the best covering level
    pub fn probe_level_set_gradient(&self, position: &Vecd<D>) -> Vecd<D> {
        self.probe_level(position).probe_level_set_gradient(position)
    }

    /// Kernel weight integral blended between the levels bracketing `h_ratio`
    pub fn probe_kernel_integral(&self, position: &Vecd<D>, h_ratio: Real) -> Real {
        self.blend(h_ratio, |level| level.probe_kernel_integral(position))
    }

    /// Kernel gradient integral blended between the levels bracketing `h_ratio`
    pub fn probe_kernel_gradient_integral(&self, position: &Vecd<D>, h_ratio: Real) -> Vecd<D> {
        self.blend(h_ratio, |level| level.probe_kernel_gradient_integral(position))
    }

    fn blend<T, F>(&self, h_ratio: Real, probe: F) -> T
    where
        T: std::ops::Add<Output = T> + std::ops::Mul<Real, Output = T>,
        F: Fn(&Level<D>) -> T,
    {
        let coarse = self.level_for_ratio(h_ratio);
        if coarse + 1 == self.levels.len() {
            return probe(&self.levels[coarse]);
        }
        let fine = coarse + 1;
        let coarse_ratio = self.levels[coarse].resolution_ratio();
        let fine_ratio = self.levels[fine].resolution_ratio();
        let alpha = (fine_ratio - h_ratio) / (fine_ratio - coarse_ratio);
        probe(&self.levels[coarse]) * alpha + probe(&self.levels[fine]) * (1.0 - alpha)
    }

    /// Whether every level keeps `position` clear of its domain edge
    pub fn probe_is_within_mesh_bound(&self, position: &Vecd<D>) -> bool {
        self.levels
            .iter()
            .all(|level| level.probe_is_within_mesh_bound(position))
    }

    /// Clean the interface of the finest level
    pub fn clean_interface(&mut self, small_shift_factor: Real) {
        let last = self.levels.len() - 1;
        self.levels[last].clean_interface(small_shift_factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Vec2d;
    use crate::geometry::Ball;
    use approx::assert_relative_eq;

    fn circle_levels(total_levels: usize) -> MultiLevel<2> {
        let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.1).unwrap());
        MultiLevel::new(
            &BoundingBox::centered(1.5),
            0.1,
            total_levels,
            shape,
            adaptation,
            LevelSetConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_levels_are_ordered_coarse_to_fine() {
        let levels = circle_levels(3);
        assert_eq!(levels.len(), 3);
        assert_relative_eq!(levels.coarsest().resolution_ratio(), 1.0);
        assert_relative_eq!(levels.levels()[1].resolution_ratio(), 2.0);
        assert_relative_eq!(levels.finest().resolution_ratio(), 4.0);
    }

    #[test]
    fn test_exact_ratio_selects_its_level() {
        let levels = circle_levels(3);
        for (index, level) in levels.levels().iter().enumerate() {
            assert_eq!(levels.level_for_ratio(level.resolution_ratio()), index);
        }
        assert_eq!(levels.level_for_ratio(1.0 - 1e-12), 0);
    }

    #[test]
    fn test_level_for_ratio_is_monotone() {
        let levels = circle_levels(3);
        let mut previous = 0;
        for step in 0..40 {
            let h_ratio = 1.0 + 0.1 * step as Real;
            let level = levels.level_for_ratio(h_ratio);
            assert!(level >= previous);
            previous = level;
        }
        assert_eq!(previous, 2);
    }

    #[test]
    fn test_ratio_below_coarsest_has_no_level() {
        let levels = circle_levels(2);
        assert_eq!(levels.try_level_for_ratio(0.5), None);
    }

    #[test]
    #[should_panic(expected = "coarser than every level")]
    fn test_level_for_ratio_panics_below_coarsest() {
        let levels = circle_levels(2);
        levels.level_for_ratio(0.5);
    }

    #[test]
    fn test_blend_at_bracketing_ratios() {
        let levels = circle_levels(2);
        let position = Vec2d::new(0.0, 1.02);
        let coarse = levels.coarsest().probe_kernel_integral(&position);
        let fine = levels.finest().probe_kernel_integral(&position);
        assert_relative_eq!(levels.probe_kernel_integral(&position, 1.0), coarse, epsilon = 1e-12);
        assert_relative_eq!(levels.probe_kernel_integral(&position, 2.0), fine, epsilon = 1e-12);
        assert_relative_eq!(
            levels.probe_kernel_integral(&position, 1.5),
            0.5 * (coarse + fine),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_probe_level_prefers_finest_core() {
        let levels = circle_levels(2);
        let near = Vec2d::new(1.0, 0.0);
        assert_eq!(levels.probe_level(&near).data_spacing(), levels.finest().data_spacing());
        // Inner halo package of the coarse level, outside every core band
        let inner = Vec2d::new(0.0, 0.0);
        assert!(!levels.coarsest().package_at(&inner).is_singular());
        assert_eq!(levels.probe_level(&inner).data_spacing(), levels.coarsest().data_spacing());
        assert_relative_eq!(levels.probe_signed_distance(&inner), -1.0, epsilon = 0.1);
    }

    #[test]
    fn test_far_inside_returns_coarse_sentinel() {
        let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 2.0));
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.1).unwrap());
        let levels = MultiLevel::new(
            &BoundingBox::centered(2.5),
            0.1,
            2,
            shape,
            adaptation,
            LevelSetConfig::default(),
        )
        .unwrap();
        let center = Vec2d::zeros();
        assert!(levels.coarsest().package_at(&center).is_singular());
        assert_eq!(levels.probe_level(&center).data_spacing(), levels.coarsest().data_spacing());
        assert_eq!(levels.probe_signed_distance(&center), -levels.coarsest().far_field_distance());
        assert_relative_eq!(levels.coarsest().far_field_distance(), 1.6, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_levels_rejected() {
        let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.1).unwrap());
        let result = MultiLevel::new(
            &BoundingBox::centered(1.5),
            0.1,
            0,
            shape,
            adaptation,
            LevelSetConfig::default(),
        );
        assert_eq!(result.unwrap_err(), LevelSetError::NoLevels);
        assert_eq!(MultiLevel::<2>::from_levels(Vec::new()).unwrap_err(), LevelSetError::NoLevels);
    }

    #[test]
    fn test_unordered_levels_rejected() {
        let levels = circle_levels(2);
        let mut reversed: Vec<Level<2>> = levels.levels.into_iter().collect();
        reversed.reverse();
        let error = MultiLevel::from_levels(reversed).unwrap_err();
        assert!(matches!(error, LevelSetError::UnorderedLevels { level: 1, .. }));
    }
}
