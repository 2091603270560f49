//! Model-based property tests for every keyed container.
//!
//! A random script of set/erase/get/choose actions runs against the
//! container under test and against a `BTreeMap` reference model; any
//! divergence in presence, weights, totals, or choice resolution fails
//! the test. Weights are drawn from small dyadic values so totals stay
//! exact and comparisons need no tolerance.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::core::{BucketMap, PinnedSlotMap, SlotMap, SumTrie, TreapMap, WeightTable};

/// Reference model: the naive map the containers must agree with.
#[derive(Default)]
struct Model {
    map: BTreeMap<u16, f64>,
}

impl Model {
    fn set(&mut self, key: u16, weight: f64) {
        self.map.insert(key, weight);
    }

    fn erase(&mut self, key: u16) {
        self.map.remove(&key);
    }

    fn get(&self, key: u16) -> Option<f64> {
        self.map.get(&key).copied()
    }

    fn total(&self) -> f64 {
        self.map.values().sum()
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[derive(Debug, Clone)]
enum Action {
    Set(u16, f64),
    Erase(u16),
    Get(u16),
    /// Choose at the given fraction of the current total.
    Choose(f64),
    CheckAggregates,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    // Dyadic weights (multiples of 1/8) keep floating-point sums exact
    // regardless of summation order, so the model comparison is sharp.
    let weight = (0u32..64).prop_map(|w| f64::from(w) / 8.0);
    let key = 0u16..48;
    prop_oneof![
        4 => (key.clone(), weight).prop_map(|(k, w)| Action::Set(k, w)),
        2 => key.clone().prop_map(Action::Erase),
        1 => key.prop_map(Action::Get),
        2 => (0.0f64..1.0).prop_map(Action::Choose),
        1 => Just(Action::CheckAggregates),
    ]
}

fn run_script<T: WeightTable<u16>>(table: &mut T, script: &[Action]) {
    let mut model = Model::default();
    for action in script {
        match *action {
            Action::Set(key, weight) => {
                table.set(key, weight);
                model.set(key, weight);
            }
            Action::Erase(key) => {
                table.erase(&key);
                model.erase(key);
            }
            Action::Get(key) => {
                assert_eq!(table.get(&key).ok(), model.get(key));
                assert_eq!(table.has(&key), model.get(key).is_some());
            }
            Action::Choose(fraction) => {
                let total = table.total();
                assert_eq!(total, model.total(), "total diverged from model");
                let draw = fraction * total;
                if draw >= total {
                    continue;
                }
                let (key, weight) = table
                    .choose(draw)
                    .unwrap_or_else(|err| panic!("choose({draw}) failed: {err}"));
                assert_eq!(model.get(key), Some(weight));
                assert!(weight > 0.0, "choose returned a zero-weight key");
            }
            Action::CheckAggregates => {
                assert_eq!(table.len(), model.len());
                assert_eq!(table.total(), model.total());
                let mut live: Vec<u16> = table.iter().map(|(&k, _)| k).collect();
                live.sort_unstable();
                let expected: Vec<u16> = model.map.keys().copied().collect();
                assert_eq!(live, expected);
            }
        }
    }
}

proptest! {
    #[test]
    fn slot_map_matches_model(script in prop::collection::vec(action_strategy(), 1..200)) {
        let mut table: SlotMap<u16> = SlotMap::new();
        run_script(&mut table, &script);
    }

    #[test]
    fn pinned_slot_map_matches_model(script in prop::collection::vec(action_strategy(), 1..200)) {
        let mut table: PinnedSlotMap<u16> = PinnedSlotMap::new();
        run_script(&mut table, &script);
    }

    #[test]
    fn bucket_map_matches_model(script in prop::collection::vec(action_strategy(), 1..200)) {
        let mut table: BucketMap<u16> = BucketMap::new(8, 42).unwrap();
        run_script(&mut table, &script);
    }

    #[test]
    fn treap_map_matches_model(script in prop::collection::vec(action_strategy(), 1..200)) {
        let mut table: TreapMap<u16> = TreapMap::new(42);
        run_script(&mut table, &script);
    }

    #[test]
    fn sum_trie_matches_model(script in prop::collection::vec(action_strategy(), 1..200)) {
        let mut table: SumTrie<u16> = SumTrie::with_seed(42);
        run_script(&mut table, &script);
    }
}
