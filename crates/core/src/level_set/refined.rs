//! Refinement of a coarse level

use super::level::{is_near_interface, CellClass};
use super::{Level, PACKAGE_SIZE};
use crate::core_types::Real;
use crate::error::LevelSetError;
use std::sync::Arc;

impl<const D: usize> Level<D> {
    /// Build a level at half the data spacing of `coarse`
    ///
    /// The fine level shares the coarse bounds, shape, adaptation and
    /// configuration. Far-field cells take their side from the coarse signed
    /// distance, and core packages are only considered where the coarse level
    /// already has one.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Level::new`].
    pub fn refine_from(coarse: &Level<D>) -> Result<Self, LevelSetError> {
        let data_spacing = 0.5 * coarse.data_spacing();
        let band = coarse.config.core_band_factor * data_spacing * PACKAGE_SIZE as Real;
        Level::build(
            &coarse.bounds,
            data_spacing,
            Arc::clone(&coarse.shape),
            Arc::clone(&coarse.adaptation),
            coarse.config,
            |exact, center| {
                if coarse.is_within_core_package(center) && is_near_interface(exact, center, band) {
                    CellClass::Core
                } else if coarse.probe_signed_distance(center) < 0.0 {
                    CellClass::Inside
                } else {
                    CellClass::Outside
                }
            },
        )
    }
}
