//! Level set data packages
//!
//! A data package covers one background cell with `PACKAGE_SIZE^D` data
//! points. It stores the signed distance, its gradient, both kernel integrals
//! and a near-interface tag, each in a halo-padded `Block`. The per-package
//! numerics (gradient, interface marking, one reinitialization sub-step) only
//! read the package's own blocks, so they can run for all packages in parallel
//! once the halos are refreshed.

use super::block::{self, Block, BLOCK_WIDTH};
use super::mesh::MeshGeometry;
use super::pool::PackageId;
use super::PACKAGE_SIZE;
use crate::adaptation::smoothed_heaviside;
use crate::core_types::{linear_index, Index, IndexBox, Real, Vecd, TINY_REAL};
use crate::geometry::Shape;
use std::ops::{Add, Mul};

/// Near-interface tag: far inside the shape
pub const FAR_INSIDE: i8 = -2;
/// Near-interface tag: inner band next to the interface
pub const INNER_BAND: i8 = -1;
/// Near-interface tag: cut by the interface
pub const CUT: i8 = 0;
/// Near-interface tag: outer band next to the interface
pub const OUTER_BAND: i8 = 1;
/// Near-interface tag: far outside the shape
pub const FAR_OUTSIDE: i8 = 2;

/// One block of level set data
#[derive(Debug, Clone)]
pub struct DataPackage<const D: usize> {
    /// Background cell covered by this package
    pub(crate) cell: Index<D>,
    /// Position of block index `[0; D]`, the lower halo corner
    pub(crate) lower_bound: Vecd<D>,
    pub(crate) data_spacing: Real,
    /// Far-field sentinel shared by every unrefined cell on one side
    pub(crate) is_singular: bool,
    /// Interface proximity heuristic triggered at the cell center
    pub(crate) is_core: bool,
    /// Member of the active compute set (core plus stencil halo)
    pub(crate) is_inner: bool,
    /// Packages of the `3^D` neighboring cells, `None` outside the mesh
    pub(crate) neighbors: Vec<Option<PackageId>>,
    pub(crate) phi: Block<Real, D>,
    pub(crate) phi_gradient: Block<Vecd<D>, D>,
    pub(crate) kernel_weight: Block<Real, D>,
    pub(crate) kernel_gradient: Block<Vecd<D>, D>,
    pub(crate) near_interface_id: Block<i8, D>,
}

impl<const D: usize> DataPackage<D> {
    /// Package for `cell` filled with exact signed distances from `shape`
    pub(crate) fn new(cell: Index<D>, mesh: &MeshGeometry<D>, shape: &dyn Shape<D>) -> Self {
        let data_spacing = mesh.data_spacing();
        let lower_bound = mesh.cell_lower_bound(&cell).add_scalar(-0.5 * data_spacing);

        let mut phi = Block::filled(0.0);
        let mut near_interface_id = Block::filled(FAR_OUTSIDE);
        for index in block::all_points::<D>() {
            let position = block_position(&lower_bound, data_spacing, &index);
            let distance = shape.signed_distance(&position);
            phi.set(&index, distance);
            if distance < 0.0 {
                near_interface_id.set(&index, FAR_INSIDE);
            }
        }

        Self {
            cell,
            lower_bound,
            data_spacing,
            is_singular: false,
            is_core: false,
            is_inner: false,
            neighbors: Vec::new(),
            phi,
            phi_gradient: Block::filled(Vecd::zeros()),
            kernel_weight: Block::filled(0.0),
            kernel_gradient: Block::filled(Vecd::zeros()),
            near_interface_id,
        }
    }

    /// Far-field sentinel package shared by every unrefined cell on one side
    pub(crate) fn singular(far_field_level: Real, data_spacing: Real) -> Self {
        let inside = far_field_level < 0.0;
        Self {
            cell: [0; D],
            lower_bound: Vecd::zeros(),
            data_spacing,
            is_singular: true,
            is_core: false,
            is_inner: false,
            neighbors: Vec::new(),
            phi: Block::filled(far_field_level),
            phi_gradient: Block::filled(Vecd::repeat(1.0)),
            kernel_weight: Block::filled(if inside { 0.0 } else { 1.0 }),
            kernel_gradient: Block::filled(Vecd::zeros()),
            near_interface_id: Block::filled(if inside { FAR_INSIDE } else { FAR_OUTSIDE }),
        }
    }

    /// Background cell covered by this package
    pub fn cell(&self) -> &Index<D> {
        &self.cell
    }

    /// Whether this is one of the two far-field sentinels
    pub fn is_singular(&self) -> bool {
        self.is_singular
    }

    /// Whether the package touches the interface
    pub fn is_core(&self) -> bool {
        self.is_core
    }

    /// Whether the package belongs to the active compute set
    pub fn is_inner(&self) -> bool {
        self.is_inner
    }

    /// Signed distance block
    pub fn phi(&self) -> &Block<Real, D> {
        &self.phi
    }

    /// Signed distance gradient block
    pub fn phi_gradient(&self) -> &Block<Vecd<D>, D> {
        &self.phi_gradient
    }

    /// Kernel weight integral block
    pub fn kernel_weight(&self) -> &Block<Real, D> {
        &self.kernel_weight
    }

    /// Kernel gradient integral block
    pub fn kernel_gradient(&self) -> &Block<Vecd<D>, D> {
        &self.kernel_gradient
    }

    /// Near-interface tag block
    pub fn near_interface_id(&self) -> &Block<i8, D> {
        &self.near_interface_id
    }

    pub(crate) fn phi_mut(&mut self) -> &mut Block<Real, D> {
        &mut self.phi
    }

    pub(crate) fn phi_gradient_mut(&mut self) -> &mut Block<Vecd<D>, D> {
        &mut self.phi_gradient
    }

    pub(crate) fn kernel_weight_mut(&mut self) -> &mut Block<Real, D> {
        &mut self.kernel_weight
    }

    pub(crate) fn kernel_gradient_mut(&mut self) -> &mut Block<Vecd<D>, D> {
        &mut self.kernel_gradient
    }

    pub(crate) fn near_interface_id_mut(&mut self) -> &mut Block<i8, D> {
        &mut self.near_interface_id
    }

    /// Global data index of an interior block index
    #[inline]
    pub(crate) fn global_data_index(&self, local: &Index<D>) -> Index<D> {
        let mut global = [0; D];
        for k in 0..D {
            global[k] = self.cell[k] * PACKAGE_SIZE + local[k] - 1;
        }
        global
    }

    /// Multilinear interpolation of one field at `position`
    ///
    /// The position is expected inside this package's cell; the halo supplies
    /// the corners past the first and last data points.
    pub(crate) fn probe<T>(&self, field: &Block<T, D>, position: &Vecd<D>) -> T
    where
        T: Copy + Add<Output = T> + Mul<Real, Output = T>,
    {
        if self.is_singular {
            return field.get(&[1; D]);
        }

        let mut base = [0usize; D];
        let mut alpha = [0.0; D];
        for k in 0..D {
            let t = (position[k] - self.lower_bound[k]) / self.data_spacing;
            let i = (t.floor() as isize).clamp(0, (BLOCK_WIDTH - 2) as isize) as usize;
            base[k] = i;
            alpha[k] = (t - i as Real).clamp(0.0, 1.0);
        }

        let mut value: Option<T> = None;
        for corner in IndexBox::<D>::cube(2) {
            let mut index = base;
            let mut weight = 1.0;
            for k in 0..D {
                index[k] += corner[k];
                weight *= if corner[k] == 1 { alpha[k] } else { 1.0 - alpha[k] };
            }
            let term = field.get(&index) * weight;
            value = Some(match value {
                Some(sum) => sum + term,
                None => term,
            });
        }
        // IndexBox::cube(2) always yields at least one corner
        value.unwrap_or_else(|| field.get(&base))
    }

    /// Central-difference gradient of phi at every interior point
    pub fn compute_gradient(&mut self) {
        let inv_two_dx = 0.5 / self.data_spacing;
        for index in block::interior::<D>() {
            let mut gradient = Vecd::<D>::zeros();
            for k in 0..D {
                let forward = self.phi.get(&block::step(&index, k, true));
                let backward = self.phi.get(&block::step(&index, k, false));
                gradient[k] = (forward - backward) * inv_two_dx;
            }
            self.phi_gradient.set(&index, gradient);
        }
    }

    /// Tag interior points by their position relative to the interface
    ///
    /// Points with `|phi| < shift` start as cut cells; a sign change of the
    /// shifted corner averages moves them into the inner or outer band, and a
    /// sign change of the raw corner averages pins them back to cut.
    pub fn mark_near_interface(&mut self, small_shift_factor: Real) {
        let small_shift = small_shift_factor * self.data_spacing;
        let extents = [BLOCK_WIDTH; D];

        // Entry `c` averages the 2^D points at `c - {0,1}^D`; row and column 0 stay unused
        let mut corner_averages = vec![0.0; extents.iter().product()];
        let corner_count = (1usize << D) as Real;
        for corner in IndexBox::new([1; D], extents) {
            let mut sum = 0.0;
            for shift in IndexBox::<D>::cube(2) {
                let mut index = corner;
                for k in 0..D {
                    index[k] -= shift[k];
                }
                sum += self.phi.get(&index);
            }
            corner_averages[linear_index(&corner, &extents)] = sum / corner_count;
        }

        for index in block::interior::<D>() {
            let phi_0 = self.phi.get(&index);
            let mut tag = if phi_0 > 0.0 { FAR_OUTSIDE } else { FAR_INSIDE };
            if phi_0.abs() < small_shift {
                tag = CUT;
                let average_0 = corner_averages[linear_index(&index, &extents)];
                let neighbor_averages: Vec<Real> = IndexBox::<D>::cube(2)
                    .map(|shift| {
                        let mut corner = index;
                        for k in 0..D {
                            corner[k] += shift[k];
                        }
                        corner_averages[linear_index(&corner, &extents)]
                    })
                    .collect();

                for &average in &neighbor_averages {
                    if (average_0 - small_shift) * (average - small_shift) < 0.0 {
                        tag = OUTER_BAND;
                    }
                    if (average_0 + small_shift) * (average + small_shift) < 0.0 {
                        tag = INNER_BAND;
                    }
                }
                if neighbor_averages.iter().any(|&average| average_0 * average < 0.0) {
                    tag = CUT;
                }
            }
            self.near_interface_id.set(&index, tag);
        }
    }

    /// One explicit sub-step of `phi_t + s(phi) (|∇phi| - 1) = 0`
    ///
    /// Godunov upwinding with pseudo time step `dx / 2`. Cut points keep their
    /// value so the interface itself does not move.
    pub fn step_reinitialization(&mut self) {
        let dx = self.data_spacing;
        let updates: Vec<(Index<D>, Real)> = block::interior::<D>()
            .filter(|index| self.near_interface_id.get(index) != CUT)
            .map(|index| {
                let phi_0 = self.phi.get(&index);
                let sign = phi_0 / (phi_0 * phi_0 + dx * dx).sqrt();
                let mut gradient_sq = 0.0;
                for k in 0..D {
                    let forward = self.phi.get(&block::step(&index, k, true)) - phi_0;
                    let backward = phi_0 - self.phi.get(&block::step(&index, k, false));
                    let difference = upwind_difference(sign, forward, backward);
                    gradient_sq += difference * difference;
                }
                (index, phi_0 - 0.5 * sign * (gradient_sq.sqrt() - dx))
            })
            .collect();

        for (index, value) in updates {
            self.phi.set(&index, value);
        }
    }

    /// Kernel weight and gradient integrals at every interior point
    ///
    /// Returned in `block::interior` order for `store_kernel_integrals`.
    pub(crate) fn compute_kernel_integrals(
        &self,
        level: &super::Level<D>,
    ) -> (Vec<Real>, Vec<Vecd<D>>) {
        block::interior::<D>()
            .map(|index| level.kernel_integrals_at(&self.global_data_index(&index)))
            .unzip()
    }

    pub(crate) fn store_kernel_integrals(&mut self, weights: &[Real], gradients: &[Vecd<D>]) {
        for ((index, weight), gradient) in block::interior::<D>().zip(weights).zip(gradients) {
            self.kernel_weight.set(&index, *weight);
            self.kernel_gradient.set(&index, *gradient);
        }
    }
}

/// Position of a block index
#[inline]
fn block_position<const D: usize>(lower_bound: &Vecd<D>, spacing: Real, index: &Index<D>) -> Vecd<D> {
    let mut position = *lower_bound;
    for k in 0..D {
        position[k] += index[k] as Real * spacing;
    }
    position
}

/// Godunov choice between forward and backward differences
fn upwind_difference(sign: Real, forward: Real, backward: Real) -> Real {
    let s_forward = sign * forward;
    let s_backward = sign * backward;
    if s_forward >= 0.0 && s_backward >= 0.0 {
        return backward;
    }
    if s_forward <= 0.0 && s_backward <= 0.0 {
        return forward;
    }
    if s_forward > 0.0 && s_backward < 0.0 {
        return 0.0;
    }
    // Characteristics collide: keep the side with the larger slope
    let ss = sign * (forward.abs() - backward.abs()) / (forward - backward);
    if ss > 0.0 {
        backward
    } else {
        forward
    }
}

/// Fraction of a data cell on the positive side of the interface
pub fn cut_cell_volume_fraction<const D: usize>(
    phi: Real,
    phi_gradient: &Vecd<D>,
    data_spacing: Real,
) -> Real {
    let inv_squared_norm = 1.0 / (phi_gradient.norm_squared() + TINY_REAL);
    phi_gradient
        .iter()
        .map(|g| {
            g * g
                * inv_squared_norm
                * smoothed_heaviside(phi / (g.abs() + TINY_REAL), 0.5 * data_spacing)
        })
        .sum()
}
