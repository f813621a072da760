//! Optimized collection aliases for internal mesh bookkeeping.
//!
//! Hash-based collections use `rustc_hash`'s Fx hasher: every key in this
//! crate is a trusted internal node or element index, so a fast
//! non-cryptographic hash is the right trade-off. Small inline buffers
//! avoid heap traffic in the remesher's per-insertion hot path.

#![forbid(unsafe_code)]

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Fast `HashMap` for internal index mappings (not DoS-resistant; internal
/// keys only).
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast `HashSet` counterpart of [`FastHashMap`].
pub type FastHashSet<T> = FxHashSet<T>;

/// Build hasher instantiating the Fx hasher, for capacity-aware
/// constructors.
pub type FastBuildHasher = FxBuildHasher;

/// Inline-first buffer for small index collections.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Buffer for the triangles removed around one point insertion.
///
/// Cavities in well-conditioned triangulations contain a handful of
/// triangles; 16 covers them without spilling to the heap.
pub type CavityBuffer = SmallBuffer<usize, 16>;

/// Buffer for the directed edges bounding an insertion cavity.
pub type CavityBoundaryBuffer = SmallBuffer<[usize; 2], 16>;

/// Creates a [`FastHashMap`] with pre-allocated capacity.
#[inline]
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with pre-allocated capacity.
#[inline]
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}
