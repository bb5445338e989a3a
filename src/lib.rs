//! strtab: an open-addressed hash table keyed by byte strings, built as the
//! indexing primitive for line-oriented aggregation (millions of short keys
//! such as category names, each mapped to a small caller-owned record).
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a single-owner table that owns copies of its keys, never owns
//!   its values, and fails closed on every bad input.
//! - Layers:
//!   - `bytes`: non-owning `ByteStr` views plus `slice`, `cut`,
//!     `are_equal` and `is_valid_str`. Allocation-free.
//!   - `ByteTable<V, S>`: the structural table. FNV-1 hashing, Fibonacci
//!     slot mapping, linear probing, 1.5x growth, backward-shift removal.
//!   - `Tables<V, S>`: an arena of tables addressed by `TableHandle`s, which
//!     detects destroyed and stale handles instead of touching freed memory.
//!
//! Constraints
//! - Single-threaded: no locking, no atomics. Callers that shard work keep
//!   one table per worker and merge outside the crate.
//! - Load factor stays at or below one half after every insert; capacity
//!   never shrinks.
//! - At most 2^53 - 1 live entries per table.
//! - Values are `Copy` handles; the table never drops what they refer to.
//!
//! Error handling
//! - Invalid handle, invalid (null) key, capacity exceeded and allocation
//!   failure are all reported through `Error`. Checks run before any
//!   mutation, and growth builds the new slot array completely before the
//!   old one is released.
//!
//! Notes and non-goals
//! - No iteration order guarantees.
//! - No serialization format.
//! - The hash is unseeded and not hardened against adversarial keys.

pub mod byte_table;
mod byte_table_proptest;
pub mod bytes;
pub mod error;
pub mod hash;
pub mod tables;

// Public surface
pub use byte_table::ByteTable;
pub use bytes::{are_equal, cut, is_valid_str, slice, ByteStr, Cut};
pub use error::{Error, Result};
pub use hash::FnvBuildHasher;
pub use tables::{TableHandle, Tables};
