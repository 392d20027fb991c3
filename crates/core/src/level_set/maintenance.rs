//! Level-wide passes over the package set
//!
//! Every pass that writes a field first evaluates from an immutable view of
//! the level and then writes each package independently, so results do not
//! depend on scheduling. Fields read through stencils (phi, its gradient and
//! the kernel integrals) get their halos refreshed right after they change.

use super::block::{self, Block};
use super::config::DEFAULT_SMALL_SHIFT_FACTOR;
use super::package::{DataPackage, CUT, INNER_BAND, OUTER_BAND};
use super::pool::PackageId;
use super::{Level, PACKAGE_SIZE};
use crate::core_types::{offsets, Index, Real, Vecd, TINY_REAL};
use rayon::prelude::*;
use tracing::debug;

/// Search radius of interface redistancing, in data points
const REDISTANCE_DEPTH: usize = 4;

/// Initial distance bound of interface redistancing, in data spacings
const REDISTANCE_CAP: Real = 5.0;

impl<const D: usize> Level<D> {
    /// Copy neighbor interior values into the halo of every inner package
    pub(crate) fn refresh_halo<T, F, G>(&mut self, field: F, field_mut: G)
    where
        T: Copy + Send + Sync + 'static,
        F: Fn(&DataPackage<D>) -> &Block<T, D> + Sync,
        G: Fn(&mut DataPackage<D>) -> &mut Block<T, D> + Sync,
    {
        let halos: Vec<Vec<T>> = self
            .inner
            .par_iter()
            .map(|id| {
                let package = &self.packages[id.index()];
                self.halo_map.gather(field(package), |slot| {
                    package.neighbors[slot].map(|neighbor| field(&self.packages[neighbor.index()]))
                })
            })
            .collect();

        let halo_map = &self.halo_map;
        let packages = &mut self.packages;
        // Inner packages occupy every slot after the two singular ones, in order
        packages[2..]
            .par_iter_mut()
            .zip(halos.par_iter())
            .for_each(|(package, values)| halo_map.scatter(field_mut(package), values));
    }

    /// Package and block index of a global data point, `None` outside the mesh
    #[inline]
    pub(crate) fn locate_data(&self, global: &[isize; D]) -> Option<(&DataPackage<D>, Index<D>)> {
        let extents = self.mesh.data_extents();
        let mut cell = [0; D];
        let mut local = [0; D];
        for k in 0..D {
            if !(0..extents[k] as isize).contains(&global[k]) {
                return None;
            }
            let g = global[k] as usize;
            cell[k] = g / PACKAGE_SIZE;
            local[k] = g % PACKAGE_SIZE + 1;
        }
        let id = self.cell_packages[self.mesh.cell_linear(&cell)];
        Some((&self.packages[id.index()], local))
    }

    /// Kernel weight and gradient integrals at one global data point
    pub(crate) fn kernel_integrals_at(&self, global: &Index<D>) -> (Real, Vecd<D>) {
        let data_spacing = self.data_spacing();
        let h_ratio = self.resolution_ratio;
        let kernel = self.adaptation.kernel();
        let cutoff = kernel.cutoff_radius(h_ratio);
        let threshold = cutoff + data_spacing;
        let center = global.map(|g| g as isize);

        let phi = self
            .locate_data(&center)
            .map_or(0.0, |(package, local)| package.phi.get(&local));
        if phi.abs() >= threshold {
            let weight = if phi > threshold { 1.0 } else { 0.0 };
            return (weight, Vecd::zeros());
        }

        let depth = (cutoff / data_spacing).ceil() as usize;
        let origin = self.mesh.data_position(global);
        let mut weight = 0.0;
        let mut gradient = Vecd::<D>::zeros();
        for offset in offsets::<D>(depth) {
            let mut neighbor = center;
            for k in 0..D {
                neighbor[k] += offset[k];
            }
            let Some((package, local)) = self.locate_data(&neighbor) else {
                continue;
            };
            let displacement = origin - self.mesh.data_position(&neighbor.map(|n| n as usize));
            let phi_neighbor = package.phi.get(&local);
            if phi_neighbor <= -data_spacing {
                continue;
            }
            let distance = displacement.norm();
            if distance >= cutoff {
                continue;
            }
            let fraction = super::package::cut_cell_volume_fraction(
                phi_neighbor,
                &package.phi_gradient.get(&local),
                data_spacing,
            );
            weight += kernel.w(h_ratio, distance) * fraction;
            gradient += displacement
                * (kernel.dw(h_ratio, distance) * fraction / (distance + TINY_REAL));
        }
        let volume = data_spacing.powi(D as i32);
        (weight * volume, gradient * volume)
    }

    /// Recompute the phi gradient of every inner package
    pub fn update_level_set_gradient(&mut self) {
        self.packages[2..]
            .par_iter_mut()
            .for_each(DataPackage::compute_gradient);
        self.refresh_halo(DataPackage::phi_gradient, DataPackage::phi_gradient_mut);
    }

    /// Recompute both kernel integrals of every inner package
    pub fn update_kernel_integrals(&mut self) {
        let integrals: Vec<(Vec<Real>, Vec<Vecd<D>>)> = self
            .inner
            .par_iter()
            .map(|id| self.packages[id.index()].compute_kernel_integrals(self))
            .collect();
        self.packages[2..]
            .par_iter_mut()
            .zip(integrals.par_iter())
            .for_each(|(package, (weights, gradients))| {
                package.store_kernel_integrals(weights, gradients);
            });
        self.refresh_halo(DataPackage::kernel_weight, DataPackage::kernel_weight_mut);
        self.refresh_halo(DataPackage::kernel_gradient, DataPackage::kernel_gradient_mut);
    }

    /// Tag the interior points of core packages relative to the interface
    pub fn mark_near_interface(&mut self, small_shift_factor: Real) {
        let core_end = 2 + self.core.len();
        self.packages[2..core_end]
            .par_iter_mut()
            .for_each(|package| package.mark_near_interface(small_shift_factor));
        self.refresh_halo(DataPackage::near_interface_id, DataPackage::near_interface_id_mut);
    }

    /// Pull isolated cut points back onto a band
    ///
    /// A cut point with no positive (negative) neighbor in its `3^D`
    /// neighborhood is moved to the inner (outer) band. Its phi becomes the
    /// distance to the interface as projected from the nearest points of the
    /// missing band.
    pub fn redistance_interface(&mut self) {
        let updates: Vec<Vec<(Index<D>, Real, i8)>> = self
            .core
            .par_iter()
            .map(|id| self.redistance_package(*id))
            .collect();

        let redistanced: usize = updates.iter().map(Vec::len).sum();
        let core_end = 2 + self.core.len();
        self.packages[2..core_end]
            .par_iter_mut()
            .zip(updates.par_iter())
            .for_each(|(package, changes)| {
                for &(index, phi, tag) in changes {
                    package.phi.set(&index, phi);
                    package.near_interface_id.set(&index, tag);
                }
            });
        self.refresh_halo(DataPackage::phi, DataPackage::phi_mut);
        self.refresh_halo(DataPackage::near_interface_id, DataPackage::near_interface_id_mut);
        debug!("Redistanced {} isolated cut points", redistanced);
    }

    fn redistance_package(&self, id: PackageId) -> Vec<(Index<D>, Real, i8)> {
        let package = &self.packages[id.index()];
        let mut changes = Vec::new();

        for index in block::interior::<D>() {
            if package.near_interface_id.get(&index) != CUT {
                continue;
            }
            let global = package.global_data_index(&index).map(|g| g as isize);

            let mut positive_band = false;
            let mut negative_band = false;
            for offset in offsets::<D>(1) {
                let tag = self.neighbor_tag(&global, &offset);
                positive_band |= tag.is_some_and(|t| t >= OUTER_BAND);
                negative_band |= tag.is_some_and(|t| t <= INNER_BAND);
            }

            if !positive_band {
                let distance = self.distance_to_band(&global, |t| t >= OUTER_BAND);
                changes.push((index, -distance, INNER_BAND));
            }
            if !negative_band {
                let distance = self.distance_to_band(&global, |t| t <= INNER_BAND);
                changes.push((index, distance, OUTER_BAND));
            }
        }
        changes
    }

    fn neighbor_tag(&self, global: &[isize; D], offset: &[isize; D]) -> Option<i8> {
        let mut neighbor = *global;
        for k in 0..D {
            neighbor[k] += offset[k];
        }
        self.locate_data(&neighbor)
            .map(|(package, local)| package.near_interface_id.get(&local))
    }

    /// Shortest distance to the interface as projected from nearby band points
    ///
    /// Each band point is moved onto the interface along its own normal by
    /// `phi × n`, so both bands share the expression `|d - phi × n|`.
    fn distance_to_band<P: Fn(i8) -> bool>(&self, global: &[isize; D], in_band: P) -> Real {
        let data_spacing = self.data_spacing();
        let mut min_distance = REDISTANCE_CAP * data_spacing;
        for offset in offsets::<D>(REDISTANCE_DEPTH) {
            let mut neighbor = *global;
            let mut displacement = Vecd::<D>::zeros();
            for k in 0..D {
                neighbor[k] += offset[k];
                displacement[k] = offset[k] as Real * data_spacing;
            }
            let Some((package, local)) = self.locate_data(&neighbor) else {
                continue;
            };
            if package.is_singular || !in_band(package.near_interface_id.get(&local)) {
                continue;
            }
            let phi = package.phi.get(&local);
            let gradient = package.phi_gradient.get(&local);
            let normal = gradient / (gradient.norm() + TINY_REAL);
            min_distance = min_distance.min((displacement - normal * phi).norm());
        }
        min_distance
    }

    /// Run the configured number of reinitialization sub-steps
    pub fn reinitialize_level_set(&mut self) {
        for _ in 0..self.config.reinitialization_steps {
            self.packages[2..]
                .par_iter_mut()
                .for_each(DataPackage::step_reinitialization);
            self.refresh_halo(DataPackage::phi, DataPackage::phi_mut);
        }
        debug!(
            "Reinitialized {} inner packages over {} sub-steps",
            self.inner.len(),
            self.config.reinitialization_steps
        );
    }

    /// Restore a clean signed distance field around the interface
    ///
    /// Marks the near-interface points, redistances isolated cut points,
    /// reinitializes, then refreshes the gradient and kernel integrals.
    pub fn clean_interface(&mut self, small_shift_factor: Real) {
        self.mark_near_interface(small_shift_factor);
        self.redistance_interface();
        self.reinitialize_level_set();
        self.update_level_set_gradient();
        self.update_kernel_integrals();
        debug!(
            "Cleaned interface at spacing {:.4} ({} core packages)",
            self.data_spacing(),
            self.core.len()
        );
    }

    /// `clean_interface` with the default shift of one data spacing
    pub fn clean_interface_default(&mut self) {
        self.clean_interface(DEFAULT_SMALL_SHIFT_FACTOR);
    }
}
