//! Smoothing kernels
//!
//! Kernels are defined for a reference smoothing length `h`; a resolution
//! ratio `h_ratio` scales it to `h / h_ratio`, so finer levels integrate with
//! proportionally narrower kernels.

use crate::core_types::Real;
use crate::error::LevelSetError;
use std::f64::consts::PI;

/// Radially symmetric smoothing kernel
pub trait Kernel: Send + Sync + std::fmt::Debug {
    /// Support radius at the given resolution ratio
    fn cutoff_radius(&self, h_ratio: Real) -> Real;

    /// Kernel value at `distance`
    fn w(&self, h_ratio: Real, distance: Real) -> Real;

    /// Radial derivative of the kernel at `distance`
    fn dw(&self, h_ratio: Real, distance: Real) -> Real;
}

/// Wendland C2 kernel with compact support `2h`
///
/// `W(q) = α_D (1 - q/2)^4 (1 + 2q)` for `q = r/h < 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WendlandC2 {
    smoothing_length: Real,
    dimensions: i32,
    /// Normalization `α_D` at the reference smoothing length
    factor_w: Real,
}

impl WendlandC2 {
    /// Kernel for `D` spatial dimensions (1, 2, or 3)
    pub fn new<const D: usize>(smoothing_length: Real) -> Result<Self, LevelSetError> {
        if !(smoothing_length.is_finite() && smoothing_length > 0.0) {
            return Err(LevelSetError::InvalidSpacing(smoothing_length));
        }
        let h = smoothing_length;
        let factor_w = match D {
            1 => 3.0 / (4.0 * h),
            2 => 7.0 / (4.0 * PI * h * h),
            3 => 21.0 / (16.0 * PI * h * h * h),
            _ => return Err(LevelSetError::UnsupportedDimension(D)),
        };
        Ok(Self {
            smoothing_length,
            dimensions: D as i32,
            factor_w,
        })
    }

    #[inline]
    fn scaled_factor(&self, h_ratio: Real) -> Real {
        self.factor_w * h_ratio.powi(self.dimensions)
    }
}

impl Kernel for WendlandC2 {
    fn cutoff_radius(&self, h_ratio: Real) -> Real {
        2.0 * self.smoothing_length / h_ratio
    }

    fn w(&self, h_ratio: Real, distance: Real) -> Real {
        let q = distance * h_ratio / self.smoothing_length;
        if q >= 2.0 {
            return 0.0;
        }
        let s = 1.0 - 0.5 * q;
        self.scaled_factor(h_ratio) * s.powi(4) * (1.0 + 2.0 * q)
    }

    fn dw(&self, h_ratio: Real, distance: Real) -> Real {
        let q = distance * h_ratio / self.smoothing_length;
        if q >= 2.0 {
            return 0.0;
        }
        let s = 1.0 - 0.5 * q;
        self.scaled_factor(h_ratio) * h_ratio / self.smoothing_length * (-5.0 * q) * s.powi(3)
    }
}

/// Smoothed step from 0 to 1 across `[-half_width, half_width]`
pub fn smoothed_heaviside(phi: Real, half_width: Real) -> Real {
    let normalized = phi / half_width;
    if normalized >= 1.0 {
        1.0
    } else if normalized <= -1.0 {
        0.0
    } else {
        0.5 + 0.5 * normalized + 0.5 * (PI * normalized).sin() / PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Midpoint-rule integral of W over the plane
    fn integrate_2d(kernel: &WendlandC2, h_ratio: Real) -> Real {
        let cutoff = kernel.cutoff_radius(h_ratio);
        let n = 400;
        let dx = 2.0 * cutoff / n as Real;
        let mut sum = 0.0;
        for i in 0..n {
            for j in 0..n {
                let x = -cutoff + (i as Real + 0.5) * dx;
                let y = -cutoff + (j as Real + 0.5) * dx;
                sum += kernel.w(h_ratio, (x * x + y * y).sqrt());
            }
        }
        sum * dx * dx
    }

    #[test]
    fn test_wendland_normalized_in_2d() {
        let kernel = WendlandC2::new::<2>(0.13).unwrap();
        assert_relative_eq!(integrate_2d(&kernel, 1.0), 1.0, epsilon = 1e-3);
        assert_relative_eq!(integrate_2d(&kernel, 2.0), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_wendland_compact_support() {
        let kernel = WendlandC2::new::<3>(1.0).unwrap();
        assert_eq!(kernel.cutoff_radius(1.0), 2.0);
        assert_eq!(kernel.cutoff_radius(2.0), 1.0);
        assert_eq!(kernel.w(1.0, 2.0), 0.0);
        assert_eq!(kernel.dw(1.0, 2.5), 0.0);
        assert!(kernel.w(1.0, 0.0) > kernel.w(1.0, 1.0));
    }

    #[test]
    fn test_wendland_derivative_matches_finite_difference() {
        let kernel = WendlandC2::new::<2>(0.5).unwrap();
        let r = 0.4;
        let eps = 1e-6;
        let numeric = (kernel.w(1.5, r + eps) - kernel.w(1.5, r - eps)) / (2.0 * eps);
        assert_relative_eq!(kernel.dw(1.5, r), numeric, epsilon = 1e-5);
    }

    #[test]
    fn test_unsupported_dimension() {
        assert_eq!(
            WendlandC2::new::<4>(1.0).unwrap_err(),
            LevelSetError::UnsupportedDimension(4)
        );
    }

    #[test]
    fn test_heaviside_limits() {
        assert_eq!(smoothed_heaviside(-1.0, 0.5), 0.0);
        assert_eq!(smoothed_heaviside(1.0, 0.5), 1.0);
        assert_relative_eq!(smoothed_heaviside(0.0, 0.5), 0.5);
        assert!(smoothed_heaviside(0.2, 0.5) > 0.5);
    }
}
