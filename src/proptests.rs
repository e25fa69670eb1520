use super::*;

use crate::bitmask::{contains, gen_mask};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;

fn validate_tree<V>(t: &Trie<V>) {
    let issues = t.verify_integrity();
    assert!(issues.is_empty(), "integrity issues: {issues:#?}");
}

fn all_keys<V>(t: &Trie<V>) -> BTreeSet<Vec<u8>> {
    t.prefix_search_bytes(b"").into_iter().map(|(k, _)| k).collect()
}

/// Paths of every node, which fully determine the tree shape up to
/// sibling order.
fn node_paths<V>(t: &Trie<V>) -> BTreeSet<Vec<u8>> {
    let mut paths = BTreeSet::new();
    t.walk_depth_first(|v| {
        paths.insert(t.node(v.id).map(|n| n.path()).unwrap_or_default());
        ControlFlow::Continue(())
    });
    paths
}

fn is_subsequence(needle: &[u8], hay: &[u8]) -> bool {
    let mut it = hay.iter();
    needle.iter().all(|b| it.any(|h| h == b))
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A tiny alphabet forces shared prefixes and therefore splits.
    prop::collection::vec(prop::sample::select(b"abcd19 ".to_vec()), 0..=12)
}

fn keys_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(key_strategy(), 0..=64)
}

/// Two symbols make long runs of one byte common.
fn run_keys_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(
        prop::collection::vec(prop::sample::select(b"ab".to_vec()), 1..=10),
        1..=16,
    )
}

fn build(keys: &[Vec<u8>]) -> (Trie<u64>, BTreeMap<Vec<u8>, u64>) {
    build_with(Config::default(), keys)
}

fn build_with(config: Config, keys: &[Vec<u8>]) -> (Trie<u64>, BTreeMap<Vec<u8>, u64>) {
    let mut t = Trie::with_config(config);
    let mut m = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        let v = i as u64;
        let placed = t.insert_bytes(k, v).unwrap().is_some();
        assert_eq!(placed, !k.is_empty());
        if !k.is_empty() {
            m.insert(k.clone(), v);
        }
    }
    (t, m)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(keys in keys_strategy()) {
        let (t, m) = build(&keys);
        validate_tree(&t);
        prop_assert_eq!(t.len(), m.len());

        let mut got: Vec<(Vec<u8>, u64)> =
            t.prefix_search_bytes(b"").into_iter().map(|(k, v)| (k, *v)).collect();
        got.sort();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);

        for (k, v) in &m {
            prop_assert_eq!(t.get_bytes(k), Some(v));
        }
    }

    #[test]
    fn prop_prefix_completeness(keys in keys_strategy(), probe in key_strategy()) {
        let (t, m) = build(&keys);
        for k in m.keys() {
            for p in 0..=k.len() {
                let found = all_of(&t.prefix_search_bytes(&k[..p]));
                prop_assert!(found.contains(k));
            }
        }

        let found = all_of(&t.prefix_search_bytes(&probe));
        let expected: BTreeSet<Vec<u8>> =
            m.keys().filter(|k| k.starts_with(&probe)).cloned().collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_fuzzy_finds_exact_key(keys in keys_strategy()) {
        let (t, m) = build(&keys);
        for k in m.keys() {
            let found = all_of(&t.fuzzy_search_bytes(k));
            prop_assert!(found.contains(k), "fuzzy search for {:?} missed itself", k);
        }
    }

    #[test]
    fn prop_fuzzy_finds_substrings(keys in run_keys_strategy(), fuzziness in 0usize..=3) {
        let (t, m) = build_with(Config { fuzziness, ..Config::default() }, &keys);
        for k in m.keys() {
            for i in 0..k.len() {
                for j in i + 1..=k.len() {
                    let found = all_of(&t.fuzzy_search_bytes(&k[i..j]));
                    prop_assert!(
                        found.contains(k),
                        "{:?} holds {:?} but was not found (fuzziness {})",
                        k, &k[i..j], fuzziness
                    );
                }
            }
        }
    }

    #[test]
    fn prop_fuzzy_results_are_subsequences(keys in keys_strategy(), query in key_strategy()) {
        let (t, m) = build(&keys);
        let found = t.fuzzy_search_bytes(&query);
        if query.is_empty() {
            prop_assert!(found.is_empty());
        }
        let mut seen = BTreeSet::new();
        for (k, v) in found {
            prop_assert!(is_subsequence(&query, &k), "{:?} is not in {:?}", query, k);
            prop_assert_eq!(m.get(&k), Some(v));
            prop_assert!(seen.insert(k), "duplicate result");
        }
    }

    #[test]
    fn prop_reinsert_is_idempotent(keys in keys_strategy()) {
        let (mut t, m) = build(&keys);
        let nodes = t.node_count();
        let paths = node_paths(&t);
        let before = all_keys(&t);

        for k in m.keys() {
            t.insert_bytes(k, 0).unwrap();
        }
        validate_tree(&t);
        prop_assert_eq!(t.len(), m.len());
        prop_assert_eq!(t.node_count(), nodes);
        prop_assert_eq!(node_paths(&t), paths);
        prop_assert_eq!(all_keys(&t), before);
    }

    #[test]
    fn prop_bitmask_covers_subtree(keys in keys_strategy()) {
        let (t, m) = build(&keys);
        for k in m.keys() {
            prop_assert!(contains(t.root().bitmask(), gen_mask(k)));
        }

        // Each node summarizes every key suffix hanging below its parent.
        let mut ok = true;
        t.walk_depth_first(|v| {
            let Some(node) = t.node(v.id) else { return ControlFlow::Break(()) };
            let parent_len = node.path().len() - node.label().len();
            for k in m.keys() {
                if k.starts_with(&node.path()) && !contains(node.bitmask(), gen_mask(&k[parent_len..])) {
                    ok = false;
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        prop_assert!(ok);
    }

    #[test]
    fn prop_longest_prefix(keys in keys_strategy(), input in key_strategy()) {
        let (t, m) = build(&keys);
        let expected = m
            .iter()
            .filter(|(k, _)| input.starts_with(k))
            .max_by_key(|(k, _)| k.len())
            .map(|(k, v)| (k.clone(), v));
        prop_assert_eq!(t.longest_prefix_bytes(&input), expected);
    }
}

fn all_of(found: &[(Vec<u8>, &u64)]) -> BTreeSet<Vec<u8>> {
    found.iter().map(|(k, _)| k.clone()).collect()
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<Vec<u8>> = vec![
        b"a".to_vec(),
        b"ab".to_vec(),
        b"abc".to_vec(),
        b"abd".to_vec(),
        b"b".to_vec(),
        b"ba".to_vec(),
    ];

    let (reference, _) = build(&keys);
    let expected_paths = node_paths(&reference);
    let expected_keys = all_keys(&reference);

    for_each_permutation(&keys, |perm| {
        let (t, m) = build(&perm);
        validate_tree(&t);
        assert_eq!(t.len(), m.len());
        assert_eq!(node_paths(&t), expected_paths);
        assert_eq!(all_keys(&t), expected_keys);
        assert_eq!(t.node_count(), expected_paths.len());
    });
}

#[test]
fn exhaustive_fuzzy_substrings_small_alphabet() {
    // Every key over {a, b, x} up to length 5.
    let mut keys: Vec<Vec<u8>> = vec![Vec::new()];
    let mut frontier = keys.clone();
    for _ in 0..5 {
        frontier = frontier
            .iter()
            .flat_map(|k| {
                b"abx".iter().map(move |&c| {
                    let mut next = k.clone();
                    next.push(c);
                    next
                })
            })
            .collect();
        keys.extend(frontier.iter().cloned());
    }

    for fuzziness in [0, 3] {
        let (t, m) = build_with(Config { fuzziness, ..Config::default() }, &keys);
        validate_tree(&t);
        let mut misses = Vec::new();
        for k in m.keys() {
            for i in 0..k.len() {
                for j in i + 1..=k.len() {
                    if !all_of(&t.fuzzy_search_bytes(&k[i..j])).contains(k) {
                        misses.push((k.clone(), k[i..j].to_vec()));
                    }
                }
            }
        }
        assert!(misses.is_empty(), "fuzziness {fuzziness}: {misses:?}");
    }
}

#[test]
fn test_randomized_large() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(1);
    let mut t: Trie<u64> = Trie::new();
    let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

    for _ in 0..20_000 {
        let len = rng.gen_range(1..24);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'h')).collect();
        let v: u64 = rng.gen();
        t.insert_bytes(&key, v).unwrap();
        m.insert(key, v);
    }

    validate_tree(&t);
    assert_eq!(t.len(), m.len());
    for (k, v) in &m {
        assert_eq!(t.get_bytes(k), Some(v));
    }

    let mut got: Vec<(Vec<u8>, u64)> = t
        .prefix_search_bytes(b"abc")
        .into_iter()
        .map(|(k, v)| (k, *v))
        .collect();
    got.sort();
    let expected: Vec<(Vec<u8>, u64)> = m
        .range(b"abc".to_vec()..b"abd".to_vec())
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    assert_eq!(got, expected);
}
