//! Tables: arena of byte tables addressed by checked handles.
//!
//! A `TableHandle` wraps a generational slotmap key. Destroying a table
//! frees its slot, bumps the slot's generation and nulls the caller's
//! handle, so a second destroy, or any use of a stale copy of the handle,
//! fails with `Error::InvalidHandle` instead of touching freed memory.

use crate::byte_table::{ByteTable, MIN_CAPACITY};
use crate::bytes::ByteStr;
use crate::error::{Error, Result};
use crate::hash::FnvBuildHasher;
use core::hash::BuildHasher;
use slotmap::{DefaultKey, Key, SlotMap};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TableHandle(DefaultKey);

impl TableHandle {
    /// The handle every destroyed table leaves behind.
    pub fn null() -> Self {
        TableHandle(DefaultKey::null())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub(crate) fn new(k: DefaultKey) -> Self {
        TableHandle(k)
    }

    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    /// Read-only view of the table, if the handle is still live.
    pub fn table<'a, V, S>(&self, tables: &'a Tables<V, S>) -> Option<&'a ByteTable<V, S>> {
        tables.get(*self)
    }
}

pub struct Tables<V, S = FnvBuildHasher> {
    hasher: S,
    tables: SlotMap<DefaultKey, ByteTable<V, S>>,
}

impl<V> Tables<V> {
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher)
    }
}

impl<V> Default for Tables<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> Tables<V, S> {
    /// Every table created by this arena hashes with a clone of `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            tables: SlotMap::with_key(),
        }
    }

    /// Number of live tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Read-only view of a live table; `None` for null or stale handles.
    pub fn get(&self, handle: TableHandle) -> Option<&ByteTable<V, S>> {
        self.tables.get(handle.raw_handle())
    }

    /// Frees every key of the table, invalidates the handle everywhere it
    /// was copied, and nulls `handle`.
    pub fn destroy(&mut self, handle: &mut TableHandle) -> Result<()> {
        let table = self
            .tables
            .remove(handle.raw_handle())
            .ok_or(Error::InvalidHandle)?;
        log::debug!(
            "destroyed table {:?} holding {} entries",
            handle.raw_handle(),
            table.len()
        );
        *handle = TableHandle::null();
        Ok(())
    }
}

impl<V, S> Tables<V, S>
where
    V: Copy,
    S: BuildHasher + Clone,
{
    /// Creates an empty table with the minimum capacity.
    pub fn create(&mut self) -> Result<TableHandle> {
        let table = ByteTable::try_with_capacity_and_hasher(MIN_CAPACITY, self.hasher.clone())?;
        let k = self.tables.insert(table);
        log::debug!("created table {k:?}");
        Ok(TableHandle::new(k))
    }

    /// Not-found, a stale handle and the null key all read as `None`.
    pub fn search<'k>(&self, handle: TableHandle, key: impl Into<ByteStr<'k>>) -> Option<V> {
        self.get(handle)?.search(key)
    }

    pub fn insert<'k>(
        &mut self,
        handle: TableHandle,
        key: impl Into<ByteStr<'k>>,
        value: V,
    ) -> Result<Option<V>> {
        self.tables
            .get_mut(handle.raw_handle())
            .ok_or(Error::InvalidHandle)?
            .insert(key, value)
    }

    pub fn remove<'k>(
        &mut self,
        handle: TableHandle,
        key: impl Into<ByteStr<'k>>,
    ) -> Result<Option<V>> {
        self.tables
            .get_mut(handle.raw_handle())
            .ok_or(Error::InvalidHandle)?
            .remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    /// Invariant: a fresh table is live, empty and at minimum capacity.
    #[test]
    fn create_returns_live_handle() {
        let mut ts: Tables<u32> = Tables::new();
        let h = ts.create().unwrap();
        assert!(!h.is_null());
        let t = h.table(&ts).expect("live table");
        assert!(t.is_empty());
        assert_eq!(t.capacity(), MIN_CAPACITY);
        assert_eq!(ts.len(), 1);
    }

    /// Invariant: destroy nulls the handle; destroying again is an error.
    #[test]
    fn double_destroy_detected() {
        let mut ts: Tables<u32> = Tables::new();
        let mut h = ts.create().unwrap();
        ts.insert(h, "k", 1).unwrap();
        assert_eq!(ts.destroy(&mut h), Ok(()));
        assert!(h.is_null());
        assert_eq!(ts.destroy(&mut h), Err(Error::InvalidHandle));
        assert!(ts.is_empty());
    }

    #[test]
    fn destroy_on_null_handle() {
        let mut ts: Tables<u32> = Tables::new();
        let mut h = TableHandle::null();
        assert_eq!(ts.destroy(&mut h), Err(Error::InvalidHandle));
        assert_eq!(TableHandle::default(), TableHandle::null());
    }

    /// Invariant: a copy of a destroyed handle does not alias a table
    /// created afterwards, even when the arena slot is reused.
    #[test]
    fn stale_copy_does_not_alias_new_table() {
        let mut ts: Tables<u32> = Tables::new();
        let mut h1 = ts.create().unwrap();
        let stale = h1;
        ts.insert(h1, "k", 1).unwrap();
        ts.destroy(&mut h1).unwrap();

        let h2 = ts.create().unwrap();
        ts.insert(h2, "k", 2).unwrap();
        assert_ne!(stale, h2);
        assert_eq!(ts.search(stale, "k"), None);
        assert_eq!(ts.insert(stale, "k", 3), Err(Error::InvalidHandle));
        assert_eq!(ts.remove(stale, "k"), Err(Error::InvalidHandle));
        assert_eq!(ts.search(h2, "k"), Some(2));
        assert!(stale.table(&ts).is_none());
        assert!(ts.get(stale).is_none());
        assert_eq!(ts.get(h2).map(|t| t.len()), Some(1));
    }

    /// Invariant: handle checks run before key checks.
    #[test]
    fn invalid_handle_reported_before_invalid_key() {
        let mut ts: Tables<u32> = Tables::new();
        let h = TableHandle::null();
        assert_eq!(ts.insert(h, ByteStr::NULL, 1), Err(Error::InvalidHandle));
        let live = ts.create().unwrap();
        assert_eq!(ts.insert(live, ByteStr::NULL, 1), Err(Error::InvalidKey));
        assert_eq!(ts.remove(live, ByteStr::NULL), Err(Error::InvalidKey));
        assert_eq!(ts.search(h, ByteStr::NULL), None);
    }

    /// Invariant: tables in one arena are independent.
    #[test]
    fn tables_do_not_share_entries() {
        let mut ts: Tables<u32> = Tables::new();
        let a = ts.create().unwrap();
        let b = ts.create().unwrap();
        ts.insert(a, "x", 1).unwrap();
        ts.insert(b, "x", 2).unwrap();
        assert_eq!(ts.remove(a, "x").unwrap(), Some(1));
        assert_eq!(ts.search(a, "x"), None);
        assert_eq!(ts.search(b, "x"), Some(2));
    }
}
