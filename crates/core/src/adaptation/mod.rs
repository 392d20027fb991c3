//! Particle resolution and smoothing kernel
//!
//! The level set needs two things from the particle side: the reference
//! particle spacing, which defines each level's resolution ratio, and a
//! smoothing kernel to integrate over the fluid region next to the boundary.

mod kernel;

pub use kernel::{smoothed_heaviside, Kernel, WendlandC2};

use crate::core_types::Real;
use crate::error::LevelSetError;
use std::sync::Arc;

/// Ratio of smoothing length to particle spacing used by default
pub const DEFAULT_H_SPACING_RATIO: Real = 1.3;

/// Reference resolution and kernel of the particle discretization
#[derive(Debug, Clone)]
pub struct SphAdaptation {
    reference_spacing: Real,
    kernel: Arc<dyn Kernel>,
}

impl SphAdaptation {
    /// Create an adaptation from a reference spacing and kernel
    pub fn new(reference_spacing: Real, kernel: Arc<dyn Kernel>) -> Result<Self, LevelSetError> {
        if !(reference_spacing.is_finite() && reference_spacing > 0.0) {
            return Err(LevelSetError::InvalidSpacing(reference_spacing));
        }
        Ok(Self {
            reference_spacing,
            kernel,
        })
    }

    /// Wendland C2 kernel with smoothing length `1.3 × reference_spacing`
    pub fn wendland<const D: usize>(reference_spacing: Real) -> Result<Self, LevelSetError> {
        let kernel = WendlandC2::new::<D>(DEFAULT_H_SPACING_RATIO * reference_spacing)?;
        Self::new(reference_spacing, Arc::new(kernel))
    }

    /// Reference particle spacing
    pub fn reference_spacing(&self) -> Real {
        self.reference_spacing
    }

    /// Smoothing kernel
    pub fn kernel(&self) -> &dyn Kernel {
        self.kernel.as_ref()
    }
}
