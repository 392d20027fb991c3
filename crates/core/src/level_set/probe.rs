//! Query surface used by particle-boundary interaction
//!
//! Both a single `Level` and a `MultiLevel` answer the same probes, so body
//! and boundary code can hold either behind `dyn LevelSetProbe<D>`.

use super::{Level, MultiLevel};
use crate::core_types::{Real, Vecd};

/// Probes of a level set, safe to call from many threads at once
pub trait LevelSetProbe<const D: usize>: Send + Sync {
    /// Interpolated signed distance (negative inside)
    fn probe_signed_distance(&self, position: &Vecd<D>) -> Real;

    /// Unit normal of the level set
    fn probe_normal_direction(&self, position: &Vecd<D>) -> Vecd<D>;

    /// Unnormalized signed distance gradient
    fn probe_level_set_gradient(&self, position: &Vecd<D>) -> Vecd<D>;

    /// Kernel weight integral over the fluid side for particles at `h_ratio`
    fn probe_kernel_integral(&self, position: &Vecd<D>, h_ratio: Real) -> Real;

    /// Kernel gradient integral over the fluid side for particles at `h_ratio`
    fn probe_kernel_gradient_integral(&self, position: &Vecd<D>, h_ratio: Real) -> Vecd<D>;

    /// Whether `position` keeps clear of the domain edges
    fn probe_is_within_mesh_bound(&self, position: &Vecd<D>) -> bool;

    /// Restore a clean signed distance field around the interface
    fn clean_interface(&mut self, small_shift_factor: Real);
}

/// A single level ignores the resolution ratio of kernel queries
impl<const D: usize> LevelSetProbe<D> for Level<D> {
    fn probe_signed_distance(&self, position: &Vecd<D>) -> Real {
        Level::probe_signed_distance(self, position)
    }

    fn probe_normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        Level::probe_normal_direction(self, position)
    }

    fn probe_level_set_gradient(&self, position: &Vecd<D>) -> Vecd<D> {
        Level::probe_level_set_gradient(self, position)
    }

    fn probe_kernel_integral(&self, position: &Vecd<D>, _h_ratio: Real) -> Real {
        Level::probe_kernel_integral(self, position)
    }

    fn probe_kernel_gradient_integral(&self, position: &Vecd<D>, _h_ratio: Real) -> Vecd<D> {
        Level::probe_kernel_gradient_integral(self, position)
    }

    fn probe_is_within_mesh_bound(&self, position: &Vecd<D>) -> bool {
        Level::probe_is_within_mesh_bound(self, position)
    }

    fn clean_interface(&mut self, small_shift_factor: Real) {
        Level::clean_interface(self, small_shift_factor);
    }
}

impl<const D: usize> LevelSetProbe<D> for MultiLevel<D> {
    fn probe_signed_distance(&self, position: &Vecd<D>) -> Real {
        MultiLevel::probe_signed_distance(self, position)
    }

    fn probe_normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        MultiLevel::probe_normal_direction(self, position)
    }

    fn probe_level_set_gradient(&self, position: &Vecd<D>) -> Vecd<D> {
        MultiLevel::probe_level_set_gradient(self, position)
    }

    fn probe_kernel_integral(&self, position: &Vecd<D>, h_ratio: Real) -> Real {
        MultiLevel::probe_kernel_integral(self, position, h_ratio)
    }

    fn probe_kernel_gradient_integral(&self, position: &Vecd<D>, h_ratio: Real) -> Vecd<D> {
        MultiLevel::probe_kernel_gradient_integral(self, position, h_ratio)
    }

    fn probe_is_within_mesh_bound(&self, position: &Vecd<D>) -> bool {
        MultiLevel::probe_is_within_mesh_bound(self, position)
    }

    fn clean_interface(&mut self, small_shift_factor: Real) {
        MultiLevel::clean_interface(self, small_shift_factor);
    }
}
