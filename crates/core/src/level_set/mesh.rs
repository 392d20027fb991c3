//! Background grid geometry
//!
//! Cells of spacing `PACKAGE_SIZE × data_spacing` cover the tentative bounds
//! extended by `buffer_width` cells on every side. Each cell carries one data
//! package, so data points form a second, finer grid whose global index is
//! `cell × PACKAGE_SIZE + local`.

use super::PACKAGE_SIZE;
use crate::core_types::{box_volume, linear_index, Index, IndexBox, Real, Vecd};

/// Geometry of one level's background and data grids
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry<const D: usize> {
    lower_bound: Vecd<D>,
    data_spacing: Real,
    grid_spacing: Real,
    buffer_width: usize,
    number_of_cells: Index<D>,
}

impl<const D: usize> MeshGeometry<D> {
    /// Grid over `bounds` padded by `buffer_width` cells
    pub fn new(
        bounds: &crate::core_types::BoundingBox<D>,
        data_spacing: Real,
        buffer_width: usize,
    ) -> Self {
        let grid_spacing = data_spacing * PACKAGE_SIZE as Real;
        let size = bounds.size();
        let mut number_of_cells = [0; D];
        for k in 0..D {
            number_of_cells[k] = (size[k] / grid_spacing).ceil().max(1.0) as usize + 2 * buffer_width;
        }
        Self {
            lower_bound: bounds.lower.add_scalar(-(buffer_width as Real) * grid_spacing),
            data_spacing,
            grid_spacing,
            buffer_width,
            number_of_cells,
        }
    }

    /// Lower corner of cell `[0; D]`
    pub fn lower_bound(&self) -> &Vecd<D> {
        &self.lower_bound
    }

    /// Distance between data points
    pub fn data_spacing(&self) -> Real {
        self.data_spacing
    }

    /// Edge length of a cell
    pub fn grid_spacing(&self) -> Real {
        self.grid_spacing
    }

    /// Padding cells around the tentative bounds
    pub fn buffer_width(&self) -> usize {
        self.buffer_width
    }

    /// Cells per axis
    pub fn number_of_cells(&self) -> &Index<D> {
        &self.number_of_cells
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        box_volume(&self.number_of_cells)
    }

    /// Every cell index
    pub fn cells(&self) -> IndexBox<D> {
        IndexBox::new([0; D], self.number_of_cells)
    }

    /// Row-major position of a cell
    #[inline]
    pub fn cell_linear(&self, cell: &Index<D>) -> usize {
        linear_index(cell, &self.number_of_cells)
    }

    /// Inverse of `cell_linear`
    pub fn cell_from_linear(&self, mut linear: usize) -> Index<D> {
        let mut cell = [0; D];
        for k in (0..D).rev() {
            cell[k] = linear % self.number_of_cells[k];
            linear /= self.number_of_cells[k];
        }
        cell
    }

    /// Lower corner of a cell
    pub fn cell_lower_bound(&self, cell: &Index<D>) -> Vecd<D> {
        let mut position = self.lower_bound;
        for k in 0..D {
            position[k] += cell[k] as Real * self.grid_spacing;
        }
        position
    }

    /// Center of a cell
    pub fn cell_center(&self, cell: &Index<D>) -> Vecd<D> {
        self.cell_lower_bound(cell).add_scalar(0.5 * self.grid_spacing)
    }

    /// Unclamped cell coordinates of a position
    pub fn raw_cell_index(&self, position: &Vecd<D>) -> [isize; D] {
        let mut cell = [0; D];
        for k in 0..D {
            cell[k] = ((position[k] - self.lower_bound[k]) / self.grid_spacing).floor() as isize;
        }
        cell
    }

    /// Cell containing a position, clamped to the grid
    pub fn cell_index_from_position(&self, position: &Vecd<D>) -> Index<D> {
        let raw = self.raw_cell_index(position);
        let mut cell = [0; D];
        for k in 0..D {
            cell[k] = raw[k].clamp(0, self.number_of_cells[k] as isize - 1) as usize;
        }
        cell
    }

    /// Data points per axis
    pub fn data_extents(&self) -> Index<D> {
        self.number_of_cells.map(|n| n * PACKAGE_SIZE)
    }

    /// Position of a global data point
    pub fn data_position(&self, global: &Index<D>) -> Vecd<D> {
        let mut position = self.lower_bound;
        for k in 0..D {
            position[k] += (global[k] as Real + 0.5) * self.data_spacing;
        }
        position
    }

    /// Cells in the `3^D` neighborhood of `cell` that lie inside the grid
    pub fn neighborhood(&self, cell: &Index<D>) -> impl Iterator<Item = Index<D>> + '_ {
        let mut lower = [0; D];
        let mut upper = [0; D];
        for k in 0..D {
            lower[k] = cell[k].saturating_sub(1);
            upper[k] = (cell[k] + 2).min(self.number_of_cells[k]);
        }
        IndexBox::new(lower, upper)
    }
}
