//! D-dimensional integer indices and box iteration
//!
//! Cells, data points, and block-local positions are all addressed by
//! `[usize; D]` indices. `IndexBox` walks a half-open box of them in row-major
//! order (last axis fastest), which is also the storage order of `Block`.

/// D-dimensional index into a cell grid, data grid, or block
pub type Index<const D: usize> = [usize; D];

/// Iterator over every index in the half-open box `[lower, upper)`
#[derive(Debug, Clone)]
pub struct IndexBox<const D: usize> {
    lower: Index<D>,
    upper: Index<D>,
    next: Option<Index<D>>,
}

impl<const D: usize> IndexBox<D> {
    /// Box spanning `[lower, upper)` on every axis
    pub fn new(lower: Index<D>, upper: Index<D>) -> Self {
        let empty = (0..D).any(|k| lower[k] >= upper[k]);
        Self {
            lower,
            upper,
            next: if empty { None } else { Some(lower) },
        }
    }

    /// Box `[0, extent)^D`
    pub fn cube(extent: usize) -> Self {
        Self::new([0; D], [extent; D])
    }
}

impl<const D: usize> Iterator for IndexBox<D> {
    type Item = Index<D>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut advanced = current;
        let mut axis = D;
        loop {
            if axis == 0 {
                self.next = None;
                break;
            }
            axis -= 1;
            advanced[axis] += 1;
            if advanced[axis] < self.upper[axis] {
                self.next = Some(advanced);
                break;
            }
            advanced[axis] = self.lower[axis];
        }
        Some(current)
    }
}

/// Signed offsets in `[-radius, radius]^D`
pub fn offsets<const D: usize>(radius: usize) -> impl Iterator<Item = [isize; D]> {
    IndexBox::<D>::cube(2 * radius + 1).map(move |index| index.map(|v| v as isize - radius as isize))
}

/// Row-major linear position of `index` in a box with `extents`
#[inline]
pub fn linear_index<const D: usize>(index: &Index<D>, extents: &Index<D>) -> usize {
    let mut linear = 0;
    for k in 0..D {
        linear = linear * extents[k] + index[k];
    }
    linear
}

/// Product of the extents
#[inline]
pub fn box_volume<const D: usize>(extents: &Index<D>) -> usize {
    extents.iter().product()
}

/// Shift an index by a signed offset, returning `None` if any axis leaves `[0, extents)`
#[inline]
pub fn shifted<const D: usize>(
    index: &Index<D>,
    offset: &[isize; D],
    extents: &Index<D>,
) -> Option<Index<D>> {
    let mut result = [0; D];
    for k in 0..D {
        let value = index[k] as isize + offset[k];
        if !(0..extents[k] as isize).contains(&value) {
            return None;
        }
        result[k] = value as usize;
    }
    Some(result)
}
