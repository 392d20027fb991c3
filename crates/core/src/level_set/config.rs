//! Level set tuning parameters

use crate::core_types::Real;
use serde::{Deserialize, Serialize};

/// Number of explicit reinitialization sub-steps per interface cleaning
///
/// Calibrated for stability and cost rather than convergence.
pub const DEFAULT_REINITIALIZATION_STEPS: usize = 50;

/// Padding cells around the tentative bounds
pub const DEFAULT_BUFFER_WIDTH: usize = 4;

/// Default shift factor for near-interface marking, in data spacings
pub const DEFAULT_SMALL_SHIFT_FACTOR: Real = 1.0;

/// Construction and maintenance parameters shared by every level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSetConfig {
    /// Padding cells around the tentative bounds; also sets the far-field
    /// distance `grid_spacing × buffer_width`
    pub buffer_width: usize,
    /// Explicit reinitialization sub-steps run by `clean_interface`
    pub reinitialization_steps: usize,
    /// A cell becomes core when its projected distance to the interface is
    /// below this many grid spacings (calibration value)
    pub core_band_factor: Real,
    /// Gradient norm, in data spacings, below which normal probing jitters
    pub normal_jitter_threshold: Real,
    /// Jitter span per axis, in data spacings
    pub normal_jitter_amplitude: Real,
    /// Jittered retries before normal probing gives up
    pub max_normal_jitter_attempts: usize,
    /// Relative tolerance when matching resolution ratios to levels
    pub ratio_tolerance: Real,
}

impl Default for LevelSetConfig {
    fn default() -> Self {
        Self {
            buffer_width: DEFAULT_BUFFER_WIDTH,
            reinitialization_steps: DEFAULT_REINITIALIZATION_STEPS,
            core_band_factor: 1.0,
            normal_jitter_threshold: 1.0e-2,
            normal_jitter_amplitude: 0.5,
            max_normal_jitter_attempts: 64,
            ratio_tolerance: 1.0e-10,
        }
    }
}
