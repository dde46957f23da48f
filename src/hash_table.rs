//! A fixed-capacity hash table using Robin Hood open addressing.
//!
//! The table couples two structures. An array of `M` buckets maps hashes to
//! slot indices, and a [`SlotList`] of `N` slots owns the entries and threads
//! them in insertion order. The bucket array never stores keys or values and
//! is never iterated; every traversal walks the slot list, which is why
//! iteration order is deterministic and unaffected by how entries shuffle
//! between buckets.
//!
//! [`HashTable<T, N, M>`] stores values of type `T` and provides insertion,
//! lookup, and removal in a fixed footprint: all storage is inline, nothing
//! is allocated, and the capacity `N` is a compile-time constant. This is a
//! fairly low-level structure that requires you to provide the hash value and
//! an equality predicate for each operation. Prefer the [`HashMap`] or
//! [`HashSet`] wrappers unless you are building your own map or set facade.
//!
//! ## Bucket encoding
//!
//! Each bucket packs a probe distance and an 8-bit hash fingerprint into one
//! `u32`, with the distance in the upper 24 bits:
//!
//! ```text
//! dist_and_fingerprint = (distance << 8) | (hash & 0xFF)
//! ```
//!
//! A packed word of zero means the bucket is empty. Real distances start at 1
//! (`DIST_INC = 0x100`), so an occupied bucket can never encode a zero word
//! and no separate occupancy map is needed: the empty test, the fingerprint
//! filter, and the Robin Hood ordering comparison are all a single integer
//! compare. Twenty-four bits of distance is headroom of over 16M probes,
//! far beyond what the bucket count permits (`M < 2^24` is enforced at
//! compile time).
//!
//! The bucket index is taken from the hash *after* shifting out the
//! fingerprint byte (`(hash >> 8) % M`). If the same low bits fed both the
//! index and the fingerprint, the fingerprint would be implied by the bucket
//! position and reject nothing.
//!
//! ## Probing
//!
//! Lookup starts at the ideal bucket with a running packed word of
//! `DIST_INC | fingerprint` and walks forward, incrementing the distance part
//! each step. At each bucket one compare decides everything: an exact word
//! match is a fingerprint hit at the right distance and is confirmed with the
//! caller's equality predicate; a running word greater than the resident's
//! means the key cannot be further along (any resident past this point sits
//! closer to its own home than the query would), so the walk ends, and the
//! current position is exactly where the key would be inserted. The returned
//! [`Probe`] records that position and word, so insert-after-lookup never
//! re-walks the chain.
//!
//! Insertion places the new bucket at the probe position and bubbles the
//! previous resident (and everything after it that is not strictly closer to
//! home) one step forward, each displaced bucket gaining one distance unit.
//! Removal reverses this: buckets after the victim that sit at distance 2 or
//! more are pulled one step back with their distance decremented, until an
//! empty bucket or one already at its home. No tombstones, so lookup cost
//! never degrades with churn.
//!
//! Because insertion requires a free slot (`len() < N`) and `M >= N`, the
//! bucket array always retains at least one empty bucket during a shift, so
//! both loops terminate.
//!
//! ## Contract checking
//!
//! Misuse is a programming error and panics loudly: inserting through a probe
//! that found an entry, reading through one that did not, inserting past
//! capacity, or touching a freed slot. Negative outcomes that are part of
//! normal operation (key absent, duplicate insert) are reported through
//! return values and never panic. A [`Probe`] is only meaningful against the
//! exact table state that produced it; using one after an intervening
//! mutation is memory-safe (every access is bounds- and occupancy-checked)
//! but yields unspecified results.
//!
//! [`HashMap`]: crate::hash_map::HashMap
//! [`HashSet`]: crate::hash_set::HashSet

use core::fmt::Debug;

use crate::slot_list::Iter;
use crate::slot_list::IterMut;
use crate::slot_list::SlotIndex;
use crate::slot_list::SlotList;

/// Bits of the packed bucket word reserved for the hash fingerprint.
const FINGERPRINT_BITS: u32 = 8;

/// Distance increment; also the encoded form of "distance 1, fingerprint 0".
const DIST_INC: u32 = 1 << FINGERPRINT_BITS;

const FINGERPRINT_MASK: u32 = DIST_INC - 1;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Bucket {
    dist_and_fingerprint: u32,
    slot: u32,
}

impl Bucket {
    const EMPTY: Bucket = Bucket {
        dist_and_fingerprint: 0,
        slot: 0,
    };

    #[inline(always)]
    fn is_empty(self) -> bool {
        self.dist_and_fingerprint == 0
    }

    #[inline(always)]
    fn plus_dist(self) -> Bucket {
        Bucket {
            dist_and_fingerprint: self.dist_and_fingerprint + DIST_INC,
            slot: self.slot,
        }
    }

    #[inline(always)]
    fn minus_dist(self) -> Bucket {
        Bucket {
            dist_and_fingerprint: self.dist_and_fingerprint - DIST_INC,
            slot: self.slot,
        }
    }
}

#[inline(always)]
fn dist_and_fingerprint_from_hash(hash: u64) -> u32 {
    DIST_INC | (hash as u32 & FINGERPRINT_MASK)
}

/// The result of [`HashTable::probe`]: an opaque position handle.
///
/// When the key was found, [`is_found`](Probe::is_found) is `true` and the
/// handle names the bucket where it lives; [`HashTable::get`],
/// [`HashTable::get_mut`], and [`HashTable::remove`] accept it. When the key
/// was absent, the handle names the bucket where it *would* be placed,
/// together with the probe word it would carry, and [`HashTable::insert`]
/// consumes it without re-probing.
///
/// A probe is a snapshot: it stays meaningful only until the table is next
/// mutated. Using a stale probe is memory-safe but yields unspecified
/// results.
#[derive(Clone, Copy, Debug)]
pub struct Probe {
    bucket: usize,
    dist_and_fingerprint: u32,
}

impl Probe {
    /// Returns `true` if the lookup that produced this handle found the key.
    #[inline]
    pub fn is_found(&self) -> bool {
        self.dist_and_fingerprint == 0
    }
}

/// A fixed-capacity Robin Hood hash table.
///
/// `N` is the entry capacity, `M >= N` the bucket count (see
/// [`bucket_count`](crate::bucket_count) for the default 1.3x policy). The
/// table is hash-agnostic: callers supply the 64-bit hash and equality
/// closures per operation.
///
/// ## Performance characteristics
///
/// - **Memory**: `M * 8` bytes of buckets plus `N * (8 + size_of::<T>())`
///   bytes of slots, all inline with the value.
/// - Lookup and insertion probe a short chain (expected O(1) at the default
///   load factor); removal is tombstone-free backward shifting.
pub struct HashTable<T, const N: usize, const M: usize> {
    buckets: [Bucket; M],
    slots: SlotList<T, N>,
}

impl<T, const N: usize, const M: usize> HashTable<T, N, M> {
    /// Creates an empty table.
    pub fn new() -> Self {
        const {
            assert!(M >= N, "need at least enough buckets to point at every slot");
            assert!(M < (1 << 24), "bucket count must leave probe-distance headroom");
        }
        HashTable {
            buckets: [Bucket::EMPTY; M],
            slots: SlotList::new(),
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the table holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns `true` if the table holds `N` entries; inserting a new entry
    /// would panic.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }

    /// Maximum number of entries (`N`).
    #[inline]
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of buckets in the index array (`M`).
    #[inline]
    pub fn bucket_capacity(&self) -> usize {
        M
    }

    #[inline(always)]
    fn ideal_bucket(hash: u64) -> usize {
        ((hash >> FINGERPRINT_BITS) % M as u64) as usize
    }

    #[inline(always)]
    fn next_bucket(at: usize) -> usize {
        if at + 1 < M {
            at + 1
        } else {
            0
        }
    }

    /// Resolves `hash` to a position handle, confirming candidates with `eq`.
    ///
    /// `eq` is only invoked on entries whose fingerprint and probe distance
    /// both match, so roughly 1 in 256 colliding buckets reach it. Lookup
    /// never fails; inspect [`Probe::is_found`] on the result.
    pub fn probe(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Probe {
        let mut dist_and_fingerprint = dist_and_fingerprint_from_hash(hash);
        if M == 0 {
            return Probe {
                bucket: 0,
                dist_and_fingerprint,
            };
        }
        let mut at = Self::ideal_bucket(hash);
        loop {
            let bucket = self.buckets[at];
            if bucket.dist_and_fingerprint == dist_and_fingerprint
                && eq(self.slots.get(SlotIndex(bucket.slot)))
            {
                return Probe {
                    bucket: at,
                    dist_and_fingerprint: 0,
                };
            }
            // A resident closer to its home than the query would be at this
            // distance means the key cannot appear further along the chain.
            // Empty buckets (word 0) satisfy this too. Either way, this is
            // the position an insertion would take.
            if dist_and_fingerprint > bucket.dist_and_fingerprint {
                return Probe {
                    bucket: at,
                    dist_and_fingerprint,
                };
            }
            dist_and_fingerprint += DIST_INC;
            at = Self::next_bucket(at);
        }
    }

    /// The slot index behind a found probe.
    ///
    /// # Panics
    ///
    /// Panics if `probe` did not find an entry.
    #[inline]
    pub fn slot_of(&self, probe: Probe) -> SlotIndex {
        assert!(probe.is_found(), "probe did not find an entry");
        SlotIndex(self.buckets[probe.bucket].slot)
    }

    /// Shared access to the entry behind a found probe.
    ///
    /// # Panics
    ///
    /// Panics if `probe` did not find an entry.
    #[inline]
    pub fn get(&self, probe: Probe) -> &T {
        self.slots.get(self.slot_of(probe))
    }

    /// Mutable access to the entry behind a found probe.
    ///
    /// Mutations must not change the hash or equality of the entry.
    ///
    /// # Panics
    ///
    /// Panics if `probe` did not find an entry.
    #[inline]
    pub fn get_mut(&mut self, probe: Probe) -> &mut T {
        let slot = self.slot_of(probe);
        self.slots.get_mut(slot)
    }

    /// Inserts `value` at the position recorded by a not-found probe,
    /// displacing richer residents as needed. Returns the found-probe for the
    /// new entry.
    ///
    /// # Panics
    ///
    /// Panics if `probe` found an entry, or if the table is full.
    pub fn insert(&mut self, probe: Probe, value: T) -> Probe {
        assert!(!probe.is_found(), "probe already names an entry");
        assert!(!self.is_full(), "hash table is full ({N} entries)");
        debug_assert!(probe.bucket < M);

        let slot = self.slots.push_back(value);
        self.place_and_shift_up(
            Bucket {
                dist_and_fingerprint: probe.dist_and_fingerprint,
                slot: slot.0,
            },
            probe.bucket,
        );
        Probe {
            bucket: probe.bucket,
            dist_and_fingerprint: 0,
        }
    }

    /// Classic Robin Hood displacement: drop `bucket` at `at` and bubble the
    /// evicted resident forward, one distance unit per step, until an empty
    /// bucket absorbs the chain.
    fn place_and_shift_up(&mut self, mut bucket: Bucket, mut at: usize) {
        while !self.buckets[at].is_empty() {
            bucket = core::mem::replace(&mut self.buckets[at], bucket).plus_dist();
            at = Self::next_bucket(at);
        }
        self.buckets[at] = bucket;
    }

    /// Removes the entry behind a found probe.
    ///
    /// Returns the payload and the slot index that *followed* the removed
    /// entry in insertion order (the end sentinel if it was the newest), i.e.
    /// the index iteration would have visited next.
    ///
    /// # Panics
    ///
    /// Panics if `probe` did not find an entry.
    pub fn remove(&mut self, probe: Probe) -> (T, SlotIndex) {
        let slot = self.slot_of(probe);
        self.erase_bucket(probe.bucket);
        self.slots.remove(slot)
    }

    /// Backward-shift deletion: pull every successor that is not at its home
    /// bucket one step back, then clear the last bucket of the run.
    fn erase_bucket(&mut self, mut at: usize) {
        let mut next = Self::next_bucket(at);
        while self.buckets[next].dist_and_fingerprint >= DIST_INC * 2 {
            self.buckets[at] = self.buckets[next].minus_dist();
            at = next;
            next = Self::next_bucket(next);
        }
        self.buckets[at] = Bucket::EMPTY;
    }

    /// Locates the bucket whose index points at `slot`, starting from the
    /// entry's ideal bucket. The entry must be present; slot indices are
    /// unique, so no equality predicate is needed.
    fn bucket_of_slot(&self, hash: u64, slot: SlotIndex) -> usize {
        let mut at = Self::ideal_bucket(hash);
        loop {
            let bucket = self.buckets[at];
            assert!(
                !bucket.is_empty(),
                "entry unreachable from its hash; rehash closure is inconsistent"
            );
            if bucket.slot == slot.0 {
                return at;
            }
            at = Self::next_bucket(at);
        }
    }

    /// Removes every entry from `from` (inclusive) to `to` (exclusive) in
    /// insertion order.
    ///
    /// `rehash` must produce the same hash the entry was inserted with; it is
    /// used to find each entry's bucket without a stored hash.
    ///
    /// # Panics
    ///
    /// Panics if the range walks off the occupied list before reaching `to`.
    pub fn remove_range(&mut self, from: SlotIndex, to: SlotIndex, rehash: impl Fn(&T) -> u64) {
        let mut cur = from;
        while cur != to {
            let hash = rehash(self.slots.get(cur));
            let at = self.bucket_of_slot(hash, cur);
            self.erase_bucket(at);
            let (_, next) = self.slots.remove(cur);
            cur = next;
        }
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.buckets = [Bucket::EMPTY; M];
        self.slots.clear();
    }

    /// Oldest entry's slot, or [`end`](Self::end) when empty.
    #[inline]
    pub fn head(&self) -> SlotIndex {
        self.slots.head()
    }

    /// Newest entry's slot, or [`end`](Self::end) when empty.
    #[inline]
    pub fn tail(&self) -> SlotIndex {
        self.slots.tail()
    }

    /// The end sentinel of the iteration sequence.
    #[inline]
    pub fn end(&self) -> SlotIndex {
        self.slots.end()
    }

    /// The slot following `at` in insertion order.
    #[inline]
    pub fn next(&self, at: SlotIndex) -> SlotIndex {
        self.slots.next(at)
    }

    /// The slot preceding `at` in insertion order.
    #[inline]
    pub fn prev(&self, at: SlotIndex) -> SlotIndex {
        self.slots.prev(at)
    }

    /// Shared access to the entry in slot `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` does not name an occupied slot.
    #[inline]
    pub fn get_at(&self, at: SlotIndex) -> &T {
        self.slots.get(at)
    }

    /// Mutable access to the entry in slot `at`.
    ///
    /// Mutations must not change the hash or equality of the entry.
    ///
    /// # Panics
    ///
    /// Panics if `at` does not name an occupied slot.
    #[inline]
    pub fn get_at_mut(&mut self, at: SlotIndex) -> &mut T {
        self.slots.get_mut(at)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> Iter<'_, T, N> {
        self.slots.iter()
    }

    /// Iterates entries mutably in insertion order.
    ///
    /// Mutations must not change the hash or equality of any entry.
    pub fn iter_mut(&mut self) -> IterMut<'_, T, N> {
        self.slots.iter_mut()
    }

    /// Returns an iterator that removes and yields entries in insertion
    /// order; dropping it empties the table.
    ///
    /// If the iterator is leaked without being dropped, the table is left in
    /// an unspecified (but safe) state.
    pub fn drain(&mut self) -> Drain<'_, T, N, M> {
        Drain { table: self }
    }

    /// Consumes the table, keeping only the slot list for by-value iteration.
    pub(crate) fn into_slots(self) -> SlotList<T, N> {
        self.slots
    }
}

impl<T, const N: usize, const M: usize> Default for HashTable<T, N, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, const M: usize> Clone for HashTable<T, N, M>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        HashTable {
            buckets: self.buckets,
            slots: self.slots.clone(),
        }
    }
}

impl<T, const N: usize, const M: usize> Debug for HashTable<T, N, M>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.len())
            .field("capacity", &N)
            .field("buckets", &M)
            .field("entries", &self.slots)
            .finish()
    }
}

/// A draining iterator over a [`HashTable`], in insertion order.
pub struct Drain<'a, T, const N: usize, const M: usize> {
    table: &'a mut HashTable<T, N, M>,
}

impl<T, const N: usize, const M: usize> Iterator for Drain<'_, T, N, M> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        // The bucket array goes stale while draining; `drop` resets it, and
        // until then nothing reads it.
        self.table.slots.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.len(), Some(self.table.len()))
    }
}

impl<T, const N: usize, const M: usize> ExactSizeIterator for Drain<'_, T, N, M> {}

impl<T, const N: usize, const M: usize> Drop for Drain<'_, T, N, M> {
    fn drop(&mut self) {
        for _ in &mut *self {}
        self.table.buckets = [Bucket::EMPTY; M];
    }
}

#[cfg(test)]
impl<T, const N: usize, const M: usize> HashTable<T, N, M> {
    /// Asserts every structural invariant of the bucket array, the slot
    /// list, and their cross-references. `rehash` must match the hashes the
    /// entries were inserted with.
    pub(crate) fn check_invariants(&self, rehash: impl Fn(&T) -> u64) {
        self.slots.check_invariants();

        let mut occupied = 0;
        for at in 0..M {
            let bucket = self.buckets[at];
            if bucket.is_empty() {
                continue;
            }
            occupied += 1;

            let slot = SlotIndex(bucket.slot);
            assert!(
                self.slots.is_occupied(slot),
                "bucket {at} references a free slot"
            );

            let hash = rehash(self.slots.get(slot));
            assert_eq!(
                bucket.dist_and_fingerprint & FINGERPRINT_MASK,
                hash as u32 & FINGERPRINT_MASK,
                "fingerprint mismatch at bucket {at}"
            );

            let ideal = Self::ideal_bucket(hash);
            let expected_dist = ((at + M - ideal) % M) as u32 + 1;
            assert_eq!(
                bucket.dist_and_fingerprint >> FINGERPRINT_BITS,
                expected_dist,
                "probe distance mismatch at bucket {at}"
            );

            // Robin Hood ordering: a displaced entry's predecessor must be
            // occupied and at most one step closer to its own home.
            if expected_dist > 1 {
                let before = self.buckets[(at + M - 1) % M];
                assert!(
                    !before.is_empty(),
                    "displaced bucket {at} follows an empty bucket"
                );
                assert!(
                    before.dist_and_fingerprint >> FINGERPRINT_BITS >= expected_dist - 1,
                    "Robin Hood ordering violated at bucket {at}"
                );
            }
        }
        assert_eq!(occupied, self.len(), "occupied bucket count out of sync");
    }
}
