//! Package arena with stable handles
//!
//! Packages are created concurrently while cells are classified. The pool
//! hands out `PackageId`s under a mutex that only guards the allocation
//! counter and chunk bookkeeping; the allocating task then builds and installs
//! its package without holding the lock. Slots are never moved or reclaimed,
//! so a handle stays valid for the life of the level.

use super::package::DataPackage;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Packages per arena chunk
const CHUNK_SIZE: usize = 256;

/// Stable handle of a data package inside its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(u32);

impl PackageId {
    /// Far-field package inside the shape
    pub const INSIDE: PackageId = PackageId(0);
    /// Far-field package outside the shape
    pub const OUTSIDE: PackageId = PackageId(1);

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        PackageId(index as u32)
    }

    /// Position of the package in its level's package list
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this handle refers to one of the two far-field packages
    #[inline]
    pub fn is_singular(self) -> bool {
        self.0 < 2
    }
}

type Chunk<const D: usize> = Box<[OnceLock<DataPackage<D>>]>;

/// Chunked arena of data packages
pub(crate) struct PackagePool<const D: usize> {
    allocated: Mutex<usize>,
    chunks: Box<[OnceLock<Chunk<D>>]>,
}

impl<const D: usize> PackagePool<D> {
    /// Pool able to hold up to `capacity` packages
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let chunk_count = capacity.div_ceil(CHUNK_SIZE);
        Self {
            allocated: Mutex::new(0),
            chunks: (0..chunk_count).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Reserve the next handle
    ///
    /// # Panics
    ///
    /// Panics if the pool capacity is exhausted.
    fn allocate(&self) -> PackageId {
        let mut allocated = self.allocated.lock().unwrap_or_else(PoisonError::into_inner);
        let id = *allocated;
        assert!(
            id / CHUNK_SIZE < self.chunks.len(),
            "package pool exhausted at {id} packages"
        );
        self.chunks[id / CHUNK_SIZE].get_or_init(new_chunk);
        *allocated += 1;
        PackageId(id as u32)
    }

    /// Allocate a handle and install the package produced by `build`
    ///
    /// `build` runs after the allocator lock is released.
    pub(crate) fn create<F>(&self, build: F) -> PackageId
    where
        F: FnOnce() -> DataPackage<D>,
    {
        let id = self.allocate();
        let chunk = self.chunks[id.index() / CHUNK_SIZE].get_or_init(new_chunk);
        if chunk[id.index() % CHUNK_SIZE].set(build()).is_err() {
            unreachable!("package {} installed twice", id.index());
        }
        id
    }

    /// Number of handles handed out so far
    pub(crate) fn allocated(&self) -> usize {
        *self.allocated.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move every installed package into a list indexed by `PackageId`
    pub(crate) fn into_packages(self) -> Vec<DataPackage<D>> {
        let allocated = self
            .allocated
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let packages: Vec<DataPackage<D>> = self
            .chunks
            .into_vec()
            .into_iter()
            .filter_map(OnceLock::into_inner)
            .flat_map(|chunk| chunk.into_vec().into_iter().map(OnceLock::into_inner))
            .take(allocated)
            .flatten()
            .collect();
        debug_assert_eq!(packages.len(), allocated);
        packages
    }
}

fn new_chunk<const D: usize>() -> Chunk<D> {
    (0..CHUNK_SIZE).map(|_| OnceLock::new()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_singular_handles() {
        assert!(PackageId::INSIDE.is_singular());
        assert!(PackageId::OUTSIDE.is_singular());
        assert!(!PackageId(2).is_singular());
    }

    #[test]
    fn test_sequential_allocation_is_dense() {
        let pool = PackagePool::<2>::with_capacity(600);
        let ids: Vec<PackageId> = (0..600)
            .map(|n| pool.create(|| DataPackage::singular(n as f64, 0.1)))
            .collect();
        assert_eq!(ids[0], PackageId::INSIDE);
        assert_eq!(ids[599].index(), 599);
        assert_eq!(pool.allocated(), 600);

        let packages = pool.into_packages();
        assert_eq!(packages.len(), 600);
        // Each package sits at its handle's index
        assert_eq!(packages[257].phi().get(&[1, 1]), 257.0);
    }

    #[test]
    fn test_concurrent_allocation_yields_unique_handles() {
        let pool = PackagePool::<2>::with_capacity(2000);
        let mut ids: Vec<PackageId> = (0..2000)
            .into_par_iter()
            .map(|n| pool.create(|| DataPackage::singular(n as f64, 0.1)))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 2000);

        let packages = pool.into_packages();
        assert_eq!(packages.len(), 2000);
    }
}
