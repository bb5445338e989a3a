//! ByteTable: owning open-addressed table from byte-string keys to value handles.
//!
//! Layout and probing
//! - One flat array of `Option<Slot<V>>`; `None` is the empty cell.
//! - Home index is `slot_index(hash, capacity)`; collisions probe linearly
//!   with wraparound.
//! - Lookup stops at the first empty cell: a key is always stored in the
//!   first empty cell of its own probe run, so reaching an empty cell first
//!   proves absence.
//! - Removal uses backward-shift deletion instead of tombstones, which keeps
//!   the empty-cell rule intact without ever leaving marker cells behind.
//!
//! Ownership
//! - Keys are copied into owned `Box<[u8]>` buffers on first insert and are
//!   moved, never recopied, when the table grows.
//! - Values are `Copy` handles. The table stores and returns them and never
//!   drops what they point at.

use crate::bytes::ByteStr;
use crate::error::{Error, Result};
use crate::hash::{slot_index, FnvBuildHasher};
use core::fmt;
use core::hash::{BuildHasher, Hasher};
use core::mem;

/// Smallest slot array a table ever has.
pub const MIN_CAPACITY: usize = 8;

/// Ceiling on live entries: counts stay exactly representable as `f64`.
pub const MAX_ENTRIES: u64 = (1 << 53) - 1;

const MAX_CAPACITY: u64 = 1 << 53;

#[derive(Debug)]
struct Slot<V> {
    key: Box<[u8]>,
    value: V,
    hash: u64,
}

pub struct ByteTable<V, S = FnvBuildHasher> {
    hasher: S,
    slots: Vec<Option<Slot<V>>>,
    len: usize,
    // Growth ceiling; always MAX_CAPACITY outside of tests.
    max_capacity: u64,
}

impl<V> ByteTable<V> {
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(MIN_CAPACITY, FnvBuildHasher)
    }
}

impl<V> Default for ByteTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> fmt::Debug for ByteTable<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteTable")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .finish_non_exhaustive()
    }
}

/// Iterator over live entries in unspecified order.
pub struct Iter<'a, V> {
    it: core::slice::Iter<'a, Option<Slot<V>>>,
}

impl<'a, V: Copy> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .find_map(|s| s.as_ref().map(|s| (&*s.key, s.value)))
    }
}

impl<V, S> ByteTable<V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(MIN_CAPACITY, hasher)
    }

    /// `capacity` is clamped to `MIN_CAPACITY..=2^53`. Aborts on allocation
    /// failure like any std collection; use
    /// [`ByteTable::try_with_capacity_and_hasher`] to observe it instead.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let capacity = clamp_capacity(capacity);
        Self {
            hasher,
            slots: core::iter::repeat_with(|| None).take(capacity).collect(),
            len: 0,
            max_capacity: MAX_CAPACITY,
        }
    }

    pub fn try_with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self> {
        let capacity = capacity.max(MIN_CAPACITY);
        if capacity as u64 > MAX_CAPACITY {
            return Err(Error::CapacityExceeded);
        }
        Ok(Self {
            hasher,
            slots: alloc_slots(capacity)?,
            len: 0,
            max_capacity: MAX_CAPACITY,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Frees every key; capacity is kept.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.slots.iter(),
        }
    }
}

impl<V, S> ByteTable<V, S>
where
    V: Copy,
    S: BuildHasher,
{
    fn make_hash(&self, key: &[u8]) -> u64 {
        let mut h = self.hasher.build_hasher();
        h.write(key);
        h.finish()
    }

    fn find_index(&self, key: &[u8], hash: u64) -> Option<usize> {
        let cap = self.slots.len();
        let mut idx = slot_index(hash, cap);
        loop {
            match &self.slots[idx] {
                None => return None,
                Some(s) if s.hash == hash && *s.key == *key => return Some(idx),
                Some(_) => idx = (idx + 1) % cap,
            }
        }
    }

    /// First empty cell on the probe run for `hash`.
    fn vacant_index(&self, hash: u64) -> usize {
        let cap = self.slots.len();
        let mut idx = slot_index(hash, cap);
        while self.slots[idx].is_some() {
            idx = (idx + 1) % cap;
        }
        idx
    }

    /// Returns the value handle stored under `key`. The null key is never found.
    pub fn search<'k>(&self, key: impl Into<ByteStr<'k>>) -> Option<V> {
        let key = key.into().as_bytes()?;
        let hash = self.make_hash(key);
        self.find_index(key, hash)
            .and_then(|idx| self.slots[idx].as_ref())
            .map(|s| s.value)
    }

    pub fn contains_key<'k>(&self, key: impl Into<ByteStr<'k>>) -> bool {
        self.search(key).is_some()
    }

    /// Stores `value` under `key`, returning the handle it replaced.
    ///
    /// An existing key is overwritten in place without allocating. A new key
    /// is copied into an owned buffer, growing the table first when the load
    /// factor would pass one half.
    pub fn insert<'k>(&mut self, key: impl Into<ByteStr<'k>>, value: V) -> Result<Option<V>> {
        let key = key.into().as_bytes().ok_or(Error::InvalidKey)?;
        let hash = self.make_hash(key);

        if let Some(slot) = self
            .find_index(key, hash)
            .and_then(|idx| self.slots[idx].as_mut())
        {
            return Ok(Some(mem::replace(&mut slot.value, value)));
        }

        if self.len as u64 >= MAX_ENTRIES {
            log::debug!("rejecting insert: table holds {} entries", self.len);
            return Err(Error::CapacityExceeded);
        }

        // Copy before growing so a failed copy leaves the table untouched.
        let owned = copy_key(key)?;

        if needs_to_grow(self.len, self.slots.len()) {
            let new_cap = grown_capacity(self.slots.len(), self.max_capacity)?;
            self.resize(new_cap)?;
        }

        let idx = self.vacant_index(hash);
        self.slots[idx] = Some(Slot {
            key: owned,
            value,
            hash,
        });
        self.len += 1;
        Ok(None)
    }

    /// Removes `key`, returning its value handle.
    ///
    /// Entries after the removed one in the same probe run are shifted back
    /// so that every remaining key is still reachable before the first empty
    /// cell of its run.
    pub fn remove<'k>(&mut self, key: impl Into<ByteStr<'k>>) -> Result<Option<V>> {
        let key = key.into().as_bytes().ok_or(Error::InvalidKey)?;
        let hash = self.make_hash(key);
        let Some(mut hole) = self.find_index(key, hash) else {
            return Ok(None);
        };

        let removed = self.slots[hole].take().map(|s| s.value);
        self.len -= 1;

        let cap = self.slots.len();
        let mut next = (hole + 1) % cap;
        while let Some(next_hash) = self.slots[next].as_ref().map(|s| s.hash) {
            let home = slot_index(next_hash, cap);
            // Movable iff the hole lies on the probe path home..next.
            if distance(home, next, cap) >= distance(hole, next, cap) {
                self.slots[hole] = self.slots[next].take();
                hole = next;
            }
            next = (next + 1) % cap;
        }
        Ok(removed)
    }

    /// Moves every entry into a fresh array of `new_cap` cells.
    ///
    /// The new array is allocated before anything is moved, so on failure
    /// the table is left as it was.
    fn resize(&mut self, new_cap: usize) -> Result<()> {
        let mut slots = alloc_slots(new_cap)?;
        log::trace!(
            "growing table from {} to {new_cap} slots with {} entries",
            self.slots.len(),
            self.len
        );

        for slot in mem::take(&mut self.slots).into_iter().flatten() {
            let mut idx = slot_index(slot.hash, new_cap);
            while slots[idx].is_some() {
                idx = (idx + 1) % new_cap;
            }
            slots[idx] = Some(slot);
        }
        self.slots = slots;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let live = self.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(live, self.len, "len tracks live cells");
        assert!(self.slots.len() >= MIN_CAPACITY);
        assert!(2 * self.len <= self.slots.len(), "load factor at most one half");
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(s) = slot {
                assert_eq!(s.hash, self.make_hash(&s.key));
                assert_eq!(
                    self.find_index(&s.key, s.hash),
                    Some(idx),
                    "key reachable from its home cell"
                );
            }
        }
    }
}

fn alloc_slots<V>(capacity: usize) -> Result<Vec<Option<Slot<V>>>> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize_with(capacity, || None);
    Ok(slots)
}

fn copy_key(key: &[u8]) -> Result<Box<[u8]>> {
    let mut owned = Vec::new();
    owned.try_reserve_exact(key.len())?;
    owned.extend_from_slice(key);
    Ok(owned.into_boxed_slice())
}

#[inline]
fn needs_to_grow(len: usize, capacity: usize) -> bool {
    (len as u64 + 1) * 2 > capacity as u64
}

fn clamp_capacity(capacity: usize) -> usize {
    let ceiling = usize::try_from(MAX_CAPACITY).unwrap_or(usize::MAX);
    capacity.clamp(MIN_CAPACITY, ceiling)
}

/// Next capacity after `old`: one and a half times, at least one more, at
/// least [`MIN_CAPACITY`], at most `max`.
fn grown_capacity(old: usize, max: u64) -> Result<usize> {
    let mut new = old.checked_add(old / 2).ok_or(Error::CapacityExceeded)?;
    if new == old {
        new = new.checked_add(1).ok_or(Error::CapacityExceeded)?;
    }
    let new = new.max(MIN_CAPACITY);
    if new as u64 > max {
        log::debug!("rejecting growth past {old} slots");
        return Err(Error::CapacityExceeded);
    }
    Ok(new)
}

/// Forward distance from `from` to `to` along the wrapping probe order.
#[inline]
fn distance(from: usize, to: usize, cap: usize) -> usize {
    if to >= from {
        to - from
    } else {
        cap - from + to
    }
}
