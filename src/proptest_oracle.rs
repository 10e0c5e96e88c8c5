// Property tests that drive both engines and the facade against
// std::collections::BTreeMap. Kept inside the crate so that
// check_consistency is reachable without the feature flag.

use crate::{AvlTree, RbTree, TreeKind, TreeMap};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, i32),
    Remove(u8),
    Get(u8),
    Set(u8, i32),
    Iterate,
    Clear,
}

// Keys come from a small range so removals and overwrites hit live entries.
fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u8..64;
    let op = prop_oneof![
        6 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        4 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Get),
        1 => (key, any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..200)
}

fn arb_keys() -> impl Strategy<Value = Vec<i16>> {
    proptest::collection::vec(any::<i16>(), 0..300)
}

// Property: every operation sequence leaves the facade observably equal to
// the model, and the engine invariants hold after each step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_tree_map_matches_btree_map(
        kind in prop_oneof![Just(TreeKind::Avl), Just(TreeKind::RedBlack)],
        ops in arb_ops(),
    ) {
        let mut sut: TreeMap<u8, i32> = TreeMap::new(kind);
        let mut model: BTreeMap<u8, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k), model.remove(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                    prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
                    let expected = model.get(&k).map_or((false, 0), |v| (true, *v));
                    prop_assert_eq!(sut.try_get(&k), expected);
                }
                Op::Set(k, v) => {
                    let result = sut.set(&k, v);
                    match model.get_mut(&k) {
                        Some(slot) => {
                            prop_assert!(result.is_ok());
                            *slot = v;
                        }
                        None => {
                            prop_assert!(result.is_err());
                        }
                    }
                }
                Op::Iterate => {
                    let iter = sut.iter();
                    prop_assert_eq!(iter.len(), model.len());
                    prop_assert!(iter.eq(model.iter()));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            sut.check_consistency();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }

        prop_assert!(sut.iter().eq(model.iter()));
    }
}

// Property: inserting then removing arbitrary keys keeps both engines valid,
// and the surviving keys come out in ascending order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_engines_insert_remove(inserts in arb_keys(), removes in arb_keys()) {
        let mut avl = AvlTree::new();
        let mut rb = RbTree::new();
        let mut model = BTreeMap::new();

        for key in &inserts {
            avl.insert(*key, ());
            rb.insert(*key, ());
            model.insert(*key, ());
        }
        avl.check_consistency();
        rb.check_consistency();

        for key in &removes {
            let expected = model.remove(key).is_some();
            prop_assert_eq!(avl.delete(key), expected);
            prop_assert_eq!(rb.delete(key), expected);
            avl.check_consistency();
            rb.check_consistency();
        }

        let keys: Vec<i16> = model.keys().copied().collect();
        prop_assert_eq!(avl.iter().map(|(k, _)| *k).collect::<Vec<_>>(), keys.clone());
        prop_assert_eq!(rb.iter().map(|(k, _)| *k).collect::<Vec<_>>(), keys);
        prop_assert_eq!(avl.first_key_value().map(|(k, _)| *k), model.keys().next().copied());
        prop_assert_eq!(rb.last_key_value().map(|(k, _)| *k), model.keys().next_back().copied());
    }
}
