//! Single-resolution level set
//!
//! A `Level` maps every background cell to a data package. Cells whose
//! center lies within the core band of the interface get their own package;
//! their neighbors are materialized too so every core stencil is complete.
//! All remaining cells alias one of two far-field packages.
//!
//! # Construction
//!
//! 1. Allocate the far-field packages at `∓ grid_spacing × buffer_width`
//! 2. Classify cells in parallel (core, far inside, far outside)
//! 3. Promote the neighbors of core cells to inner packages
//! 4. Stitch neighbor handles and refresh halos
//! 5. Compute gradients and kernel integrals over the inner packages

use super::block::{Block, HaloMap};
use super::config::LevelSetConfig;
use super::mesh::MeshGeometry;
use super::package::DataPackage;
use super::pool::{PackageId, PackagePool};
use super::PACKAGE_SIZE;
use crate::adaptation::SphAdaptation;
use crate::core_types::{max_abs_component, offsets, shifted, BoundingBox, Index, Real, Vecd};
use crate::error::LevelSetError;
use crate::geometry::Shape;
use rand::Rng;
use rayon::prelude::*;
use std::ops::{Add, Mul};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Classification of one background cell during construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellClass {
    /// Close enough to the interface to get its own package
    Core,
    /// Far inside the shape
    Inside,
    /// Far outside the shape
    Outside,
}

/// Whether the exact interface passes within `band` of `center`
///
/// The projected measure is the largest component of `normal × distance`.
pub(crate) fn is_near_interface<const D: usize>(
    shape: &dyn Shape<D>,
    center: &Vecd<D>,
    band: Real,
) -> bool {
    let distance = shape.signed_distance(center);
    let normal = shape.normal_direction(center);
    max_abs_component(&(normal * distance)) < band
}

/// Classify a cell from the exact geometry alone
fn classify_by_shape<const D: usize>(shape: &dyn Shape<D>, center: &Vecd<D>, band: Real) -> CellClass {
    if is_near_interface(shape, center, band) {
        CellClass::Core
    } else if shape.contains(center) {
        CellClass::Inside
    } else {
        CellClass::Outside
    }
}

/// Narrow-band level set at one resolution
pub struct Level<const D: usize> {
    pub(crate) bounds: BoundingBox<D>,
    pub(crate) mesh: MeshGeometry<D>,
    pub(crate) config: LevelSetConfig,
    pub(crate) shape: Arc<dyn Shape<D>>,
    pub(crate) adaptation: Arc<SphAdaptation>,
    pub(crate) resolution_ratio: Real,
    pub(crate) far_field_distance: Real,
    /// Package handle of every cell, row-major
    pub(crate) cell_packages: Vec<PackageId>,
    /// Package storage indexed by `PackageId`
    pub(crate) packages: Vec<DataPackage<D>>,
    pub(crate) core: Vec<PackageId>,
    pub(crate) inner: Vec<PackageId>,
    pub(crate) halo_map: HaloMap<D>,
}

impl<const D: usize> std::fmt::Debug for Level<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("data_spacing", &self.mesh.data_spacing())
            .field("resolution_ratio", &self.resolution_ratio)
            .field("number_of_cells", self.mesh.number_of_cells())
            .field("core_packages", &self.core.len())
            .field("inner_packages", &self.inner.len())
            .finish_non_exhaustive()
    }
}

impl<const D: usize> Level<D> {
    /// Build a level over `bounds` from the exact geometry
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is invalid, the spacing is not finite and
    /// positive, or the buffer width is zero.
    pub fn new(
        bounds: &BoundingBox<D>,
        data_spacing: Real,
        shape: Arc<dyn Shape<D>>,
        adaptation: Arc<SphAdaptation>,
        config: LevelSetConfig,
    ) -> Result<Self, LevelSetError> {
        let band = config.core_band_factor * data_spacing * PACKAGE_SIZE as Real;
        Self::build(bounds, data_spacing, shape, adaptation, config, |exact, center| {
            classify_by_shape(exact, center, band)
        })
    }

    /// Shared construction for base and refined levels
    pub(crate) fn build<F>(
        bounds: &BoundingBox<D>,
        data_spacing: Real,
        shape: Arc<dyn Shape<D>>,
        adaptation: Arc<SphAdaptation>,
        config: LevelSetConfig,
        classify: F,
    ) -> Result<Self, LevelSetError>
    where
        F: Fn(&dyn Shape<D>, &Vecd<D>) -> CellClass + Sync,
    {
        if !shape.is_valid() {
            error!("Level set construction refused: shape is invalid");
            return Err(LevelSetError::InvalidGeometry(
                "shape reported itself invalid".to_string(),
            ));
        }
        if !(data_spacing.is_finite() && data_spacing > 0.0) {
            return Err(LevelSetError::InvalidSpacing(data_spacing));
        }
        if config.buffer_width == 0 {
            return Err(LevelSetError::InvalidBufferWidth(config.buffer_width));
        }

        let mesh = MeshGeometry::new(bounds, data_spacing, config.buffer_width);
        let far_field_distance = mesh.grid_spacing() * mesh.buffer_width() as Real;
        let pool = PackagePool::with_capacity(mesh.cell_count() + 2);
        pool.create(|| DataPackage::singular(-far_field_distance, data_spacing));
        pool.create(|| DataPackage::singular(far_field_distance, data_spacing));

        let exact = shape.as_ref();

        // Classify every cell; core cells materialize their package right away
        let mut cell_packages: Vec<PackageId> = (0..mesh.cell_count())
            .into_par_iter()
            .map(|linear| {
                let cell = mesh.cell_from_linear(linear);
                match classify(exact, &mesh.cell_center(&cell)) {
                    CellClass::Core => pool.create(|| DataPackage::new(cell, &mesh, exact)),
                    CellClass::Inside => PackageId::INSIDE,
                    CellClass::Outside => PackageId::OUTSIDE,
                }
            })
            .collect();
        let core_end = pool.allocated();

        // Neighbors of core cells complete the stencils
        let is_core: Vec<bool> = cell_packages.par_iter().map(|id| !id.is_singular()).collect();
        cell_packages
            .par_iter_mut()
            .enumerate()
            .for_each(|(linear, slot)| {
                if !slot.is_singular() {
                    return;
                }
                let cell = mesh.cell_from_linear(linear);
                if mesh
                    .neighborhood(&cell)
                    .any(|neighbor| is_core[mesh.cell_linear(&neighbor)])
                {
                    *slot = pool.create(|| DataPackage::new(cell, &mesh, exact));
                }
            });

        let mut packages = pool.into_packages();
        for (index, package) in packages.iter_mut().enumerate().skip(2) {
            package.is_inner = true;
            package.is_core = index < core_end;
        }
        let core: Vec<PackageId> = (2..core_end).map(PackageId::from_index).collect();
        let inner: Vec<PackageId> = (2..packages.len()).map(PackageId::from_index).collect();

        // Stitch neighbor handles; halos and gradients read through them
        let number_of_cells = *mesh.number_of_cells();
        packages.par_iter_mut().skip(2).for_each(|package| {
            package.neighbors = offsets::<D>(1)
                .map(|offset| {
                    shifted(&package.cell, &offset, &number_of_cells)
                        .map(|neighbor| cell_packages[mesh.cell_linear(&neighbor)])
                })
                .collect();
        });

        let resolution_ratio = adaptation.reference_spacing() / data_spacing;
        let mut level = Self {
            bounds: *bounds,
            mesh,
            config,
            shape,
            adaptation,
            resolution_ratio,
            far_field_distance,
            cell_packages,
            packages,
            core,
            inner,
            halo_map: HaloMap::new(),
        };
        level.refresh_halo(DataPackage::phi, DataPackage::phi_mut);
        level.update_level_set_gradient();
        level.update_kernel_integrals();

        info!(
            "Built level set level: spacing {:.4}, ratio {:.3}, {} cells, {} core / {} inner packages",
            data_spacing,
            resolution_ratio,
            level.mesh.cell_count(),
            level.core.len(),
            level.inner.len()
        );
        Ok(level)
    }

    /// Tentative bounds the level was built over
    pub fn bounds(&self) -> &BoundingBox<D> {
        &self.bounds
    }

    /// Grid geometry
    pub fn mesh(&self) -> &MeshGeometry<D> {
        &self.mesh
    }

    /// Parameters the level was built with
    pub fn config(&self) -> &LevelSetConfig {
        &self.config
    }

    /// Distance between data points
    pub fn data_spacing(&self) -> Real {
        self.mesh.data_spacing()
    }

    /// Edge length of a background cell
    pub fn grid_spacing(&self) -> Real {
        self.mesh.grid_spacing()
    }

    /// Reference spacing over this level's data spacing
    pub fn resolution_ratio(&self) -> Real {
        self.resolution_ratio
    }

    /// Magnitude of the far-field sentinel values
    pub fn far_field_distance(&self) -> Real {
        self.far_field_distance
    }

    /// Cells per axis
    pub fn number_of_cells(&self) -> &Index<D> {
        self.mesh.number_of_cells()
    }

    /// Packages touching the interface
    pub fn core_package_count(&self) -> usize {
        self.core.len()
    }

    /// Packages in the active compute set
    pub fn inner_package_count(&self) -> usize {
        self.inner.len()
    }

    /// All packages, far-field sentinels included
    pub fn total_package_count(&self) -> usize {
        self.packages.len()
    }

    /// Package referenced by a handle
    pub fn package(&self, id: PackageId) -> &DataPackage<D> {
        &self.packages[id.index()]
    }

    /// Packages touching the interface
    pub fn core_packages(&self) -> impl Iterator<Item = &DataPackage<D>> + '_ {
        self.core.iter().map(|id| &self.packages[id.index()])
    }

    /// Packages in the active compute set
    pub fn inner_packages(&self) -> impl Iterator<Item = &DataPackage<D>> + '_ {
        self.inner.iter().map(|id| &self.packages[id.index()])
    }

    /// Package of the cell containing `position`
    #[inline]
    pub fn package_at(&self, position: &Vecd<D>) -> &DataPackage<D> {
        let cell = self.mesh.cell_index_from_position(position);
        &self.packages[self.cell_packages[self.mesh.cell_linear(&cell)].index()]
    }

    #[inline]
    fn probe_field<T, F>(&self, field: F, position: &Vecd<D>) -> T
    where
        T: Copy + Add<Output = T> + Mul<Real, Output = T>,
        F: Fn(&DataPackage<D>) -> &Block<T, D>,
    {
        let package = self.package_at(position);
        package.probe(field(package), position)
    }

    /// Interpolated signed distance
    pub fn probe_signed_distance(&self, position: &Vecd<D>) -> Real {
        self.probe_field(DataPackage::phi, position)
    }

    /// Interpolated, unnormalized signed distance gradient
    pub fn probe_level_set_gradient(&self, position: &Vecd<D>) -> Vecd<D> {
        self.probe_field(DataPackage::phi_gradient, position)
    }

    /// Interpolated kernel weight integral
    pub fn probe_kernel_integral(&self, position: &Vecd<D>) -> Real {
        self.probe_field(DataPackage::kernel_weight, position)
    }

    /// Interpolated kernel gradient integral
    pub fn probe_kernel_gradient_integral(&self, position: &Vecd<D>) -> Vecd<D> {
        self.probe_field(DataPackage::kernel_gradient, position)
    }

    /// Unit normal of the level set at `position`
    ///
    /// Where the gradient nearly vanishes the query is retried at randomly
    /// jittered positions, so the result may differ between calls there.
    pub fn probe_normal_direction(&self, position: &Vecd<D>) -> Vecd<D> {
        let data_spacing = self.data_spacing();
        let threshold = self.config.normal_jitter_threshold * data_spacing;
        let span = self.config.normal_jitter_amplitude * data_spacing;

        let mut gradient = self.probe_level_set_gradient(position);
        if gradient.norm() >= threshold {
            return gradient.normalize();
        }

        let mut rng = rand::rng();
        for _ in 0..self.config.max_normal_jitter_attempts {
            let jittered = position + Vecd::<D>::from_fn(|_, _| (rng.random::<Real>() - 0.5) * span);
            gradient = self.probe_level_set_gradient(&jittered);
            if gradient.norm() >= threshold {
                return gradient.normalize();
            }
        }

        warn!(
            "Level set gradient vanishes around {:?} after {} jittered probes",
            position.as_slice(),
            self.config.max_normal_jitter_attempts
        );
        let mut axis = Vecd::<D>::zeros();
        axis[0] = 1.0;
        axis
    }

    /// Whether `position` keeps two cells away from every domain edge
    pub fn probe_is_within_mesh_bound(&self, position: &Vecd<D>) -> bool {
        let cell = self.mesh.raw_cell_index(position);
        let number_of_cells = self.mesh.number_of_cells();
        (0..D).all(|k| (2..=number_of_cells[k] as isize - 2).contains(&cell[k]))
    }

    /// Whether the cell containing `position` has a core package
    pub fn is_within_core_package(&self, position: &Vecd<D>) -> bool {
        self.package_at(position).is_core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Vec2d;
    use crate::geometry::Ball;
    use approx::assert_relative_eq;

    fn circle_level(data_spacing: Real) -> Level<2> {
        let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(data_spacing).unwrap());
        Level::new(
            &BoundingBox::centered(1.5),
            data_spacing,
            shape,
            adaptation,
            LevelSetConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_every_cell_has_one_package() {
        let level = circle_level(0.05);
        assert_eq!(level.cell_packages.len(), level.mesh.cell_count());
        assert!(level
            .cell_packages
            .iter()
            .all(|id| id.index() < level.total_package_count()));
        assert_eq!(level.total_package_count(), level.inner_package_count() + 2);
    }

    #[test]
    fn test_core_packages_are_inner_and_near_interface() {
        let level = circle_level(0.05);
        assert!(level.core_package_count() > 0);
        assert!(level.inner_package_count() > level.core_package_count());
        for package in level.core_packages() {
            assert!(package.is_inner());
            let center = level.mesh.cell_center(package.cell());
            assert!((center.norm() - 1.0).abs() < level.grid_spacing() * 2.0_f64.sqrt());
        }
    }

    #[test]
    fn test_core_neighbors_are_materialized() {
        let level = circle_level(0.05);
        for package in level.core_packages() {
            for neighbor in package.neighbors.iter().flatten() {
                assert!(!neighbor.is_singular());
            }
        }
    }

    #[test]
    fn test_far_field_packages() {
        let level = circle_level(0.05);
        let far_field = level.far_field_distance();
        assert_relative_eq!(far_field, 0.8, epsilon = 1e-12);
        assert_eq!(level.probe_signed_distance(&Vec2d::zeros()), -far_field);
        assert_eq!(level.probe_signed_distance(&Vec2d::new(2.2, 2.2)), far_field);
        assert_eq!(level.probe_kernel_integral(&Vec2d::new(2.2, 2.2)), 1.0);
        assert_eq!(level.probe_kernel_integral(&Vec2d::zeros()), 0.0);
    }

    #[test]
    fn test_probe_signed_distance_near_interface() {
        let level = circle_level(0.05);
        for angle in [0.0, 0.4, 1.3, 2.9, 4.4] {
            let direction = Vec2d::new(f64::cos(angle), f64::sin(angle));
            for radius in [0.9, 0.97, 1.0, 1.05, 1.1] {
                let position = direction * radius;
                assert_relative_eq!(
                    level.probe_signed_distance(&position),
                    radius - 1.0,
                    epsilon = 5e-3
                );
            }
        }
    }

    #[test]
    fn test_probe_normal_is_unit_and_radial() {
        let level = circle_level(0.05);
        for angle in [0.1, 0.8, 2.0, 3.5, 5.9] {
            let direction = Vec2d::new(f64::cos(angle), f64::sin(angle));
            let normal = level.probe_normal_direction(&(direction * 1.02));
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
            assert!(normal.dot(&direction) > 0.99);
        }
    }

    #[test]
    fn test_mesh_bound_margin() {
        let level = circle_level(0.05);
        let lower = *level.mesh.lower_bound();
        let gs = level.grid_spacing();
        assert!(level.probe_is_within_mesh_bound(&Vec2d::zeros()));
        assert!(!level.probe_is_within_mesh_bound(&(lower.add_scalar(1.5 * gs))));
        assert!(level.probe_is_within_mesh_bound(&(lower.add_scalar(2.5 * gs))));
        assert!(!level.probe_is_within_mesh_bound(&Vec2d::new(100.0, 0.0)));
    }

    #[test]
    fn test_is_within_core_package() {
        let level = circle_level(0.05);
        assert!(level.is_within_core_package(&Vec2d::new(1.0, 0.0)));
        assert!(!level.is_within_core_package(&Vec2d::zeros()));
    }

    #[test]
    fn test_invalid_shape_is_rejected() {
        let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), -1.0));
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.05).unwrap());
        let result = Level::new(
            &BoundingBox::centered(1.0),
            0.05,
            shape,
            adaptation,
            LevelSetConfig::default(),
        );
        assert!(matches!(result, Err(LevelSetError::InvalidGeometry(_))));
    }

    #[test]
    fn test_invalid_spacing_and_buffer() {
        let shape: Arc<dyn Shape<2>> = Arc::new(Ball::new(Vec2d::zeros(), 1.0));
        let adaptation = Arc::new(SphAdaptation::wendland::<2>(0.05).unwrap());
        let bounds = BoundingBox::centered(1.0);
        let config = LevelSetConfig::default();
        let result = Level::new(&bounds, 0.0, Arc::clone(&shape), Arc::clone(&adaptation), config);
        assert_eq!(result.unwrap_err(), LevelSetError::InvalidSpacing(0.0));

        let config = LevelSetConfig {
            buffer_width: 0,
            ..Default::default()
        };
        let result = Level::new(&bounds, 0.05, shape, adaptation, config);
        assert_eq!(result.unwrap_err(), LevelSetError::InvalidBufferWidth(0));
    }
}
