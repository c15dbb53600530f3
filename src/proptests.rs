use std::collections::BTreeMap;

use proptest::prelude::*;

use super::AvlTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i8, u32),
    Remove(i8),
    Get(i8),
}

// Small key space so sequences hit overwrites, misses and re-inserts.
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<i8>(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => any::<i8>().prop_map(Op::Remove),
        1 => any::<i8>().prop_map(Op::Get),
    ]
}

proptest! {
    #[test]
    fn matches_btree_map(ops in prop::collection::vec(op_strategy(), 0..400)) {
        let mut map = AvlTreeMap::new();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    map.insert(key, value);
                    model.insert(key, value);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(map.remove(&key).ok(), model.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(map.get(&key).ok(), model.get(&key));
                }
            }
            map.check_consistency();
        }

        prop_assert_eq!(map.len(), model.len());
        prop_assert_eq!(map.values_in_order(), model.values().collect::<Vec<_>>());
        prop_assert_eq!(map.iter().collect::<Vec<_>>(), model.iter().collect::<Vec<_>>());
    }

    #[test]
    fn insert_remove_round_trip(mut keys in prop::collection::vec(any::<i16>(), 1..200)) {
        keys.sort_unstable();
        keys.dedup();

        let mut map = AvlTreeMap::new();
        for &key in &keys {
            map.insert(key, key);
        }
        map.check_consistency();
        prop_assert_eq!(map.len(), keys.len());

        let in_order: Vec<i16> = map.iter().map(|(&k, _)| k).collect();
        prop_assert_eq!(&in_order, &keys);

        for &key in &keys {
            prop_assert_eq!(map.remove(&key), Ok(key));
            map.check_consistency();
        }
        prop_assert!(map.is_empty());
    }
}
