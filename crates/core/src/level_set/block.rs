//! Fixed-size data blocks with a stencil halo
//!
//! A block stores `PACKAGE_SIZE^D` interior values surrounded by a one-point
//! halo on every side. Interior indices run over `[1, PACKAGE_SIZE]` per axis;
//! indices `0` and `PACKAGE_SIZE + 1` are the halo. Halo values mirror the
//! neighboring packages and are refreshed through the `HaloMap` after every
//! pass that writes a stencil-read field.

use super::PACKAGE_SIZE;
use crate::core_types::{box_volume, linear_index, Index, IndexBox};

/// Points per axis including the halo
pub const BLOCK_WIDTH: usize = PACKAGE_SIZE + 2;

/// D-dimensional array of `BLOCK_WIDTH^D` values
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T, const D: usize> {
    values: Box<[T]>,
}

impl<T: Copy, const D: usize> Block<T, D> {
    /// Block with every value (halo included) set to `value`
    pub fn filled(value: T) -> Self {
        Self {
            values: vec![value; box_volume(&[BLOCK_WIDTH; D])].into_boxed_slice(),
        }
    }

    /// Value at a block index
    #[inline]
    pub fn get(&self, index: &Index<D>) -> T {
        self.values[linear_index(index, &[BLOCK_WIDTH; D])]
    }

    /// Overwrite the value at a block index
    #[inline]
    pub fn set(&mut self, index: &Index<D>, value: T) {
        self.values[linear_index(index, &[BLOCK_WIDTH; D])] = value;
    }

    #[inline]
    pub(crate) fn get_linear(&self, linear: usize) -> T {
        self.values[linear]
    }

    #[inline]
    pub(crate) fn set_linear(&mut self, linear: usize, value: T) {
        self.values[linear] = value;
    }
}

/// Interior indices, `[1, PACKAGE_SIZE]^D`
pub fn interior<const D: usize>() -> IndexBox<D> {
    IndexBox::new([1; D], [PACKAGE_SIZE + 1; D])
}

/// Every block index, halo included
pub fn all_points<const D: usize>() -> IndexBox<D> {
    IndexBox::cube(BLOCK_WIDTH)
}

/// Whether an index lies in the halo margin
#[inline]
pub fn is_halo<const D: usize>(index: &Index<D>) -> bool {
    index.iter().any(|&i| i == 0 || i == BLOCK_WIDTH - 1)
}

/// Neighbor index one step along `axis`
#[inline]
pub(crate) fn step<const D: usize>(index: &Index<D>, axis: usize, forward: bool) -> Index<D> {
    let mut result = *index;
    if forward {
        result[axis] += 1;
    } else {
        result[axis] -= 1;
    }
    result
}

/// One halo point and where its value comes from
#[derive(Debug, Clone, Copy)]
struct HaloEntry {
    /// Linear block index of the halo point
    target: usize,
    /// Slot in the `3^D` neighbor table
    neighbor_slot: usize,
    /// Linear block index of the source point inside the neighbor
    source: usize,
    /// Nearest interior point of the package itself, used at the domain edge
    fallback: usize,
}

/// Static map from halo points to neighbor interior points
///
/// Computed once per level; together with each package's stitched neighbor
/// handles it resolves every ghost value without per-access index math.
#[derive(Debug, Clone)]
pub(crate) struct HaloMap<const D: usize> {
    entries: Vec<HaloEntry>,
}

impl<const D: usize> HaloMap<D> {
    pub(crate) fn new() -> Self {
        let block_extents = [BLOCK_WIDTH; D];
        let entries = all_points::<D>()
            .filter(is_halo::<D>)
            .map(|index| {
                let mut slot = [1usize; D];
                let mut source = index;
                let mut fallback = index;
                for k in 0..D {
                    if index[k] == 0 {
                        slot[k] = 0;
                        source[k] = PACKAGE_SIZE;
                    } else if index[k] == BLOCK_WIDTH - 1 {
                        slot[k] = 2;
                        source[k] = 1;
                    }
                    fallback[k] = index[k].clamp(1, PACKAGE_SIZE);
                }
                HaloEntry {
                    target: linear_index(&index, &block_extents),
                    neighbor_slot: linear_index(&slot, &[3; D]),
                    source: linear_index(&source, &block_extents),
                    fallback: linear_index(&fallback, &block_extents),
                }
            })
            .collect();
        Self { entries }
    }

    /// Gather halo values for one block
    ///
    /// `neighbor_block(slot)` returns the block stitched into a neighbor slot,
    /// or `None` when that neighbor lies outside the mesh.
    pub(crate) fn gather<'a, T, F>(&self, own: &Block<T, D>, neighbor_block: F) -> Vec<T>
    where
        T: Copy + 'a,
        F: Fn(usize) -> Option<&'a Block<T, D>>,
    {
        self.entries
            .iter()
            .map(|entry| match neighbor_block(entry.neighbor_slot) {
                Some(block) => block.get_linear(entry.source),
                None => own.get_linear(entry.fallback),
            })
            .collect()
    }

    /// Write values produced by `gather` into the halo
    pub(crate) fn scatter<T: Copy>(&self, block: &mut Block<T, D>, values: &[T]) {
        for (entry, value) in self.entries.iter().zip(values) {
            block.set_linear(entry.target, *value);
        }
    }
}
