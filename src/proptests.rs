use super::*;

use crate::node::{bitpos, bits, mask};
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::HashSet;
use std::fmt::Debug;

/// Walks the whole trie checking layout, canonical collapse and cached aggregates.
fn validate_set<T: Hash + Eq>(set: &ChampSet<T>) {
    let (size, hash) = validate_node(&set.root, 0, true);
    assert_eq!(size, set.len(), "reachable element count must match ChampSet::len");
    assert_eq!(hash, set.hash_code(), "element hash sum must match ChampSet::hash_code");
}

fn validate_node<T: Hash + Eq>(node: &Node<T>, shift: u32, is_root: bool) -> (usize, u32) {
    let (size, hash) = match node {
        Node::Bitmap(bitmap) => {
            assert_eq!(
                bitmap.data_map() & bitmap.node_map(),
                0,
                "position marked both inline and sub-node: {node:?}"
            );
            assert_eq!(
                bitmap.slots().len(),
                bitmap.payload_arity() + bitmap.node_arity(),
                "content length must match bitmap population"
            );
            if !is_root {
                assert!(
                    node.size() >= 2,
                    "sub-node below the root must hold at least two elements: {node:?}"
                );
            }

            let mut size = 0usize;
            let mut hash = 0u32;
            for (i, bit) in bits(bitmap.data_map()).enumerate() {
                let (key, key_hash) = bitmap.key_entry(i);
                assert_eq!(key_hash, hash_of(key), "stored hash must match element");
                assert_eq!(bitpos(mask(key_hash, shift)), bit, "element stored at wrong position");
                size += 1;
                hash = hash.wrapping_add(key_hash);
            }
            for (i, bit) in bits(bitmap.node_map()).enumerate() {
                let child = bitmap.node(i);
                for key in Iter::new(child, child.size()) {
                    assert_eq!(
                        bitpos(mask(hash_of(key), shift)),
                        bit,
                        "sub-node element does not share the parent's hash slice"
                    );
                }
                let (child_size, child_hash) = validate_node(child, shift + BIT_PARTITION_SIZE, false);
                size += child_size;
                hash = hash.wrapping_add(child_hash);
            }
            (size, hash)
        }
        Node::Collision(collision) => {
            assert!(shift >= HASH_CODE_LENGTH, "collision node above the last level");
            let keys = collision.keys();
            assert!(keys.len() >= 2, "collision node must hold at least two elements");
            for (i, key) in keys.iter().enumerate() {
                assert_eq!(hash_of(key), collision.hash(), "collision element with foreign hash");
                assert!(
                    keys[i + 1..].iter().all(|other| other != key),
                    "collision node holds duplicates"
                );
            }
            (keys.len(), collision.hash().wrapping_mul(keys.len() as u32))
        }
    };

    assert_eq!(node.size(), size, "cached size must match subtree");
    assert_eq!(node.hash_code(), hash, "cached hash code must match subtree");
    (size, hash)
}

fn model_hash<T: Hash>(model: &HashSet<T>) -> u32 {
    model.iter().fold(0u32, |acc, key| acc.wrapping_add(hash_of(key)))
}

/// Hashes only `bucket`, so equal buckets collide on all 32 bits.
#[derive(Clone, Debug, PartialEq, Eq, Arbitrary)]
struct Colliding {
    #[proptest(strategy = "0u8..16")]
    bucket: u8,
    #[proptest(strategy = "0u16..8")]
    id: u16,
}

impl Hash for Colliding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bucket.hash(state);
    }
}

#[derive(Clone, Debug)]
enum Op<K> {
    Insert(K),
    Remove(K),
    Contains(K),
    TransientInsert(Vec<K>),
    TransientRemove(Vec<K>),
}

fn ops_strategy<K, S>(key: S) -> impl Strategy<Value = Vec<Op<K>>>
where
    K: Clone + Debug + 'static,
    S: Strategy<Value = K> + Clone + 'static,
{
    let op = prop_oneof![
        40 => key.clone().prop_map(Op::Insert),
        25 => key.clone().prop_map(Op::Remove),
        25 => key.clone().prop_map(Op::Contains),
        5 => prop::collection::vec(key.clone(), 0..32).prop_map(Op::TransientInsert),
        5 => prop::collection::vec(key, 0..32).prop_map(Op::TransientRemove),
    ];
    prop::collection::vec(op, 0..=1000)
}

fn set_of<K: Hash + Eq + Clone>(keys: &[K]) -> (ChampSet<K>, HashSet<K>) {
    (keys.iter().cloned().collect(), keys.iter().cloned().collect())
}

fn run_ops<K: Hash + Eq + Clone + Debug>(ops: Vec<Op<K>>) -> Result<(), TestCaseError> {
    let mut set: ChampSet<K> = ChampSet::new();
    let mut model: HashSet<K> = HashSet::new();

    for op in ops {
        match op {
            Op::Insert(key) => {
                let next = set.insert(key.clone());
                let changed = model.insert(key);
                prop_assert_eq!(next.ptr_eq(&set), !changed);
                set = next;
            }
            Op::Remove(key) => {
                let next = set.remove(&key);
                let changed = model.remove(&key);
                prop_assert_eq!(next.ptr_eq(&set), !changed);
                set = next;
            }
            Op::Contains(key) => {
                prop_assert_eq!(set.contains(&key), model.contains(&key));
            }
            Op::TransientInsert(keys) => {
                let snapshot = set.clone();
                let snapshot_len = model.len();
                let mut transient = set.as_transient();
                for key in keys {
                    prop_assert_eq!(transient.insert(key.clone()), Ok(model.insert(key)));
                }
                prop_assert_eq!(transient.hash_code(), model_hash(&model));
                set = transient.freeze().unwrap();
                prop_assert_eq!(&transient, &set);
                prop_assert_eq!(snapshot.len(), snapshot_len);
                validate_set(&snapshot);
            }
            Op::TransientRemove(keys) => {
                let snapshot = set.clone();
                let snapshot_len = model.len();
                let mut transient = set.as_transient();
                for key in keys {
                    prop_assert_eq!(transient.remove(&key), Ok(model.remove(&key)));
                }
                prop_assert_eq!(transient.hash_code(), model_hash(&model));
                set = transient.freeze().unwrap();
                prop_assert_eq!(&transient, &set);
                prop_assert_eq!(snapshot.len(), snapshot_len);
                validate_set(&snapshot);
            }
        }

        prop_assert_eq!(set.len(), model.len());
    }

    validate_set(&set);
    prop_assert_eq!(set.hash_code(), model_hash(&model));
    let got: HashSet<K> = set.iter().cloned().collect();
    prop_assert_eq!(got, model);
    Ok(())
}

fn check_algebra<K: Hash + Eq + Clone + Debug>(a: &[K], b: &[K]) -> Result<(), TestCaseError> {
    let (set_a, model_a) = set_of(a);
    let (set_b, model_b) = set_of(b);

    let union = set_a.union(&set_b);
    let meet = set_a.intersect(&set_b);
    let diff = set_a.subtract(&set_b);
    validate_set(&union);
    validate_set(&meet);
    validate_set(&diff);

    let expected_union: HashSet<K> = model_a.union(&model_b).cloned().collect();
    let expected_meet: HashSet<K> = model_a.intersection(&model_b).cloned().collect();
    let expected_diff: HashSet<K> = model_a.difference(&model_b).cloned().collect();
    prop_assert_eq!(union.iter().cloned().collect::<HashSet<K>>(), expected_union);
    prop_assert_eq!(meet.iter().cloned().collect::<HashSet<K>>(), expected_meet);
    prop_assert_eq!(diff.iter().cloned().collect::<HashSet<K>>(), expected_diff);

    prop_assert_eq!(union.len() + meet.len(), set_a.len() + set_b.len());
    prop_assert_eq!(&diff.union(&meet), &set_a);
    prop_assert_eq!(
        union.hash_code().wrapping_add(meet.hash_code()),
        set_a.hash_code().wrapping_add(set_b.hash_code())
    );

    // Results equal to an operand are that operand.
    if model_b.is_subset(&model_a) {
        prop_assert!(union.ptr_eq(&set_a));
        if model_a == model_b {
            prop_assert!(meet.ptr_eq(&set_a) || set_a.is_empty());
        } else {
            prop_assert!(meet.ptr_eq(&set_b) || set_b.is_empty());
        }
    }
    if model_a.is_disjoint(&model_b) {
        prop_assert!(diff.ptr_eq(&set_a));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_u16(ops in ops_strategy(0u16..2048)) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_equivalence_colliding(ops in ops_strategy(any::<Colliding>())) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_algebra_u16(
        a in prop::collection::vec(0u16..2048, 0..=600),
        b in prop::collection::vec(0u16..2048, 0..=600),
    ) {
        check_algebra(&a, &b)?;
    }

    #[test]
    fn prop_algebra_colliding(
        a in prop::collection::vec(any::<Colliding>(), 0..=100),
        b in prop::collection::vec(any::<Colliding>(), 0..=100),
    ) {
        check_algebra(&a, &b)?;
    }

    #[test]
    fn prop_transient_equals_persistent(ops in ops_strategy(0u16..512)) {
        let mut persistent: ChampSet<u16> = ChampSet::new();
        let mut transient = TransientSet::new();
        for op in ops {
            match op {
                Op::Insert(key) => {
                    persistent = persistent.insert(key);
                    transient.insert(key).unwrap();
                }
                Op::Remove(key) => {
                    persistent = persistent.remove(&key);
                    transient.remove(&key).unwrap();
                }
                Op::Contains(key) => {
                    prop_assert_eq!(persistent.contains(&key), transient.contains(&key));
                }
                Op::TransientInsert(keys) => {
                    persistent = persistent.insert_all(keys.iter().copied());
                    transient.insert_all(keys).unwrap();
                }
                Op::TransientRemove(keys) => {
                    persistent = persistent.remove_all(&keys);
                    transient.remove_all(&keys).unwrap();
                }
            }
            prop_assert_eq!(persistent.len(), transient.len());
        }

        let frozen = transient.freeze().unwrap();
        validate_set(&frozen);
        prop_assert_eq!(frozen.hash_code(), persistent.hash_code());
        prop_assert_eq!(frozen, persistent);
    }
}

/// Calls `f` with every ordering of `items` (Heap's algorithm, iterative).
fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(&[T])) {
    let mut order = items.to_vec();
    let mut counters = vec![0usize; order.len()];
    f(&order);
    let mut i = 1;
    while i < order.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            order.swap(j, i);
            f(&order);
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
}

/// Keys sharing low hash slices, so insertion order decides how deep the trie grows.
fn clustered_keys() -> Vec<u32> {
    let first = hash_of(&0u32);
    let mut keys = vec![0u32];
    let mut candidate = 1u32;
    while keys.len() < 6 {
        if hash_of(&candidate) & 0b11111 == first & 0b11111 {
            keys.push(candidate);
        }
        candidate += 1;
    }
    keys
}

fn colliding_keys() -> Vec<Colliding> {
    vec![
        Colliding { bucket: 0, id: 0 },
        Colliding { bucket: 0, id: 1 },
        Colliding { bucket: 0, id: 2 },
        Colliding { bucket: 1, id: 0 },
        Colliding { bucket: 1, id: 1 },
        Colliding { bucket: 2, id: 0 },
    ]
}

fn exhaustive_insert_order<K: Hash + Eq + Clone + Debug>(keys: &[K]) {
    let expected: ChampSet<K> = keys.iter().cloned().collect();
    let mut seen = 0usize;
    for_each_permutation(keys, |order| {
        seen += 1;
        let mut set = ChampSet::new();
        for key in order {
            set = set.insert(key.clone());
            validate_set(&set);
        }
        assert_eq!(set, expected);
        assert_eq!(set.hash_code(), expected.hash_code());
    });
    assert_eq!(seen, (1..=keys.len()).product::<usize>());
}

fn exhaustive_remove_order<K: Hash + Eq + Clone + Debug>(keys: &[K]) {
    // Insert in a fixed order, then remove in all permutations.
    let base: ChampSet<K> = keys.iter().cloned().collect();
    validate_set(&base);

    for_each_permutation(keys, |order| {
        let mut set = base.clone();
        let mut transient = base.as_transient();
        for key in order {
            set = set.remove(key);
            assert_eq!(transient.remove(key), Ok(true));
            assert!(!set.contains(key));
            validate_set(&set);
        }
        assert!(set.is_empty());
        assert_eq!(set.root.size(), 0);
        assert!(transient.is_empty());
        assert_eq!(base.len(), keys.len());
    });
}

#[test]
fn exhaustive_insert_order_clustered() {
    exhaustive_insert_order(&clustered_keys());
}

#[test]
fn exhaustive_remove_order_clustered() {
    exhaustive_remove_order(&clustered_keys());
}

#[test]
fn exhaustive_insert_order_colliding() {
    exhaustive_insert_order(&colliding_keys());
}

#[test]
fn exhaustive_remove_order_colliding() {
    exhaustive_remove_order(&colliding_keys());
}
