//! FNV-1 hashing and Fibonacci slot mapping.
//!
//! The hash is deterministic and unseeded. Tables built on it are not
//! hardened against adversarial keys.

use core::hash::{BuildHasher, Hasher};

pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 2^64 divided by the golden ratio, rounded to odd.
pub const FIBONACCI_MULTIPLIER: u64 = 0x9e37_79b9_7f4a_7c15;

/// FNV-1 over raw bytes, xor then multiply per byte.
pub const fn fnv1(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Maps a raw hash onto `0..capacity`.
///
/// The multiply spreads the weak low bits of FNV output before the modulo.
#[inline]
pub fn slot_index(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (hash.wrapping_mul(FIBONACCI_MULTIPLIER) % capacity as u64) as usize
}

/// Streaming [`Hasher`] over the same FNV-1 state as [`fnv1`].
///
/// Feeding a key through a single `write` call yields `fnv1(key)`.
#[derive(Debug, Copy, Clone)]
pub struct FnvHasher {
    hash: u64,
}

impl FnvHasher {
    pub const fn new() -> Self {
        Self {
            hash: FNV_OFFSET_BASIS,
        }
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash ^= byte as u64;
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Builder for [`FnvHasher`]; the default hasher of every table.
#[derive(Debug, Copy, Clone, Default)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> Self::Hasher {
        FnvHasher::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_input_hashes_to_offset_basis() {
        assert_eq!(fnv1(b""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn known_vectors() {
        assert_eq!(fnv1(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn hasher_matches_one_shot() {
        let mut h = FnvBuildHasher.build_hasher();
        h.write(b"Hamburg");
        assert_eq!(h.finish(), fnv1(b"Hamburg"));

        // Split writes continue the same state.
        let mut h = FnvHasher::new();
        h.write(b"Ham");
        h.write(b"burg");
        assert_eq!(h.finish(), fnv1(b"Hamburg"));
    }

    #[test]
    fn slot_index_stays_in_range() {
        for capacity in [1usize, 8, 12, 13, 256, 1_000_003] {
            for key in 0u32..200 {
                let idx = slot_index(fnv1(&key.to_le_bytes()), capacity);
                assert!(idx < capacity);
            }
        }
    }
}
