#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

use core::fmt;

/// A fixed-capacity hash map built on the Robin Hood HashTable.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers and
/// insertion-order iteration.
pub mod hash_map;

pub mod hash_table;

/// A fixed-capacity hash set built on the Robin Hood HashTable.
///
/// This module provides a `HashSet` that wraps the `HashMap` with an empty
/// value type, so a slot stores only the element.
pub mod hash_set;

pub mod slot_list;

#[cfg(test)]
mod proptests;

pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
pub use hash_table::Probe;
pub use slot_list::SlotIndex;
pub use slot_list::SlotList;

/// Default hasher builder used by [`HashMap`] and [`HashSet`].
///
/// Fast, high-quality, and usable without `std`. Any other
/// [`BuildHasher`](core::hash::BuildHasher) can be plugged in through the `S`
/// type parameter, as long as it diffuses bits across the full 64-bit range:
/// the low 8 bits become the bucket fingerprint and the remaining bits select
/// the bucket.
pub type DefaultHashBuilder = foldhash::fast::RandomState;

/// Recommended bucket count for a container of `capacity` entries.
///
/// Oversizes the bucket array by 30% to keep probe chains short. Usable in
/// const-generic position:
///
/// ```rust
/// use robin_fixed::{bucket_count, HashMap};
///
/// let map: HashMap<u32, u32, 10, { bucket_count(10) }> = HashMap::new();
/// assert_eq!(map.capacity(), 10);
/// ```
pub const fn bucket_count(capacity: usize) -> usize {
    capacity * 13 / 10
}

/// Error returned by the `try_insert` family when the container is full.
///
/// Carries the rejected element so the caller regains ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError<T>(pub T);

impl<T> fmt::Display for CapacityError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fixed-capacity container is full")
    }
}

impl<T: fmt::Debug> core::error::Error for CapacityError<T> {}
