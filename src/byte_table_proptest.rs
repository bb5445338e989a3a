#![cfg(test)]

// Property tests for ByteTable kept inside the crate so they can reach
// `check_invariants`.

use crate::byte_table::ByteTable;
use crate::error::Error;
use crate::hash::FnvBuildHasher;
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

// Hashes only the first byte, so most keys collide into long runs.
#[derive(Clone, Default)]
struct FirstByteBuildHasher;
struct FirstByteHasher(u64);
impl BuildHasher for FirstByteBuildHasher {
    type Hasher = FirstByteHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FirstByteHasher(0)
    }
}
impl Hasher for FirstByteHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.0 = bytes.first().map_or(0, |&b| u64::from(b % 4));
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Pool-indexed operations so shrinking lands on earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, u32),
    Remove(usize),
    Search(usize),
    SearchRaw(Vec<u8>),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<OpI>)> {
    proptest::collection::vec(proptest::collection::vec(0u8..6, 0..5), 1..=24).prop_flat_map(
        |pool| {
            let idx = 0..pool.len();
            let op = prop_oneof![
                6 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
                3 => idx.clone().prop_map(OpI::Remove),
                3 => idx.clone().prop_map(OpI::Search),
                1 => proptest::collection::vec(0u8..6, 0..5).prop_map(OpI::SearchRaw),
                1 => Just(OpI::Clear),
            ];
            proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
        },
    )
}

fn run_against_model<S: BuildHasher>(
    mut sut: ByteTable<u32, S>,
    pool: &[Vec<u8>],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Vec<u8>, u32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let key = &pool[i];
                let prev = sut.insert(&key[..], v);
                prop_assert_eq!(prev, Ok(model.insert(key.clone(), v)));
            }
            OpI::Remove(i) => {
                let key = &pool[i];
                let removed = sut.remove(&key[..]);
                prop_assert_eq!(removed, Ok(model.remove(key)));
            }
            OpI::Search(i) => {
                let key = &pool[i];
                prop_assert_eq!(sut.search(&key[..]), model.get(key).copied());
            }
            OpI::SearchRaw(key) => {
                prop_assert_eq!(sut.search(&key[..]), model.get(&key).copied());
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap);
            }
        }

        // Post-conditions after each op
        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }

    let seen: BTreeMap<Vec<u8>, u32> = sut.iter().map(|(k, v)| (k.to_vec(), v)).collect();
    let expected: BTreeMap<Vec<u8>, u32> = model.into_iter().collect();
    prop_assert_eq!(seen, expected);
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert returns the replaced handle exactly when the model had the key.
// - remove returns the model's value and leaves every other key reachable.
// - len tracks the model; load factor stays at or below one half.
// - iter yields exactly the model's entries.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_fnv((pool, ops) in arb_scenario()) {
        run_against_model(ByteTable::with_hasher(FnvBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_colliding((pool, ops) in arb_scenario()) {
        run_against_model(ByteTable::with_hasher(FirstByteBuildHasher), &pool, ops)?;
    }

    // Property: a failed insert leaves the table unchanged.
    #[test]
    fn prop_null_key_never_mutates(keys in proptest::collection::vec("[a-z]{0,6}", 0..40)) {
        let mut sut: ByteTable<usize> = ByteTable::new();
        for (i, k) in keys.iter().enumerate() {
            sut.insert(k.as_str(), i).unwrap();
        }
        let before: BTreeMap<Vec<u8>, usize> = sut.iter().map(|(k, v)| (k.to_vec(), v)).collect();
        let cap = sut.capacity();

        prop_assert_eq!(sut.insert(crate::ByteStr::NULL, 0), Err(Error::InvalidKey));
        prop_assert_eq!(sut.remove(crate::ByteStr::NULL), Err(Error::InvalidKey));

        let after: BTreeMap<Vec<u8>, usize> = sut.iter().map(|(k, v)| (k.to_vec(), v)).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(sut.capacity(), cap);
    }
}
