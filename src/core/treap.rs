//! Order-statistics treap keyed by hashed 128-bit ordinates.
//!
//! Each key receives an ordinate `(hash(key) << 64) | stamp`, where the
//! stamp is a per-container monotone counter taken at insertion. The
//! ordinate fixes a total order on live keys that is independent of the
//! key type's natural order and stable across weight updates. Nodes are
//! BST-ordered by ordinate and min-heap-ordered by a random priority, so
//! the tree stays balanced in expectation without rotations beyond the
//! usual split and merge.
//!
//! Every node caches its subtree weight sum, recomputed from its children
//! on each structural pass; weighted choice walks the cached sums from
//! the root.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::check_weight;
use crate::core::error::{Result, WeightError};
use crate::core::table::WeightTable;
use crate::core::{hasher_state, SEED_STRIDE};

#[derive(Debug, Clone)]
struct Node<K> {
    ordinate: u128,
    key: K,
    weight: f64,
    /// `weight` plus both children's sums; maintained on every pass.
    sum: f64,
    priority: u64,
    left: Option<Box<Node<K>>>,
    right: Option<Box<Node<K>>>,
}

impl<K> Node<K> {
    fn refresh(&mut self) {
        self.sum = self.weight + subtree_sum(&self.left) + subtree_sum(&self.right);
    }
}

fn subtree_sum<K>(node: &Option<Box<Node<K>>>) -> f64 {
    node.as_ref().map_or(0.0, |n| n.sum)
}

/// Split by ordinate: left half `< at`, right half `>= at`.
fn split<K>(
    node: Option<Box<Node<K>>>,
    at: u128,
) -> (Option<Box<Node<K>>>, Option<Box<Node<K>>>) {
    let Some(mut n) = node else {
        return (None, None);
    };
    if n.ordinate < at {
        let (mid, high) = split(n.right.take(), at);
        n.right = mid;
        n.refresh();
        (Some(n), high)
    } else {
        let (low, mid) = split(n.left.take(), at);
        n.left = mid;
        n.refresh();
        (low, Some(n))
    }
}

/// Merge two treaps where every ordinate in `low` precedes every ordinate
/// in `high`.
fn merge<K>(low: Option<Box<Node<K>>>, high: Option<Box<Node<K>>>) -> Option<Box<Node<K>>> {
    match (low, high) {
        (None, high) => high,
        (low, None) => low,
        (Some(mut a), Some(mut b)) => {
            if a.priority <= b.priority {
                a.right = merge(a.right.take(), Some(b));
                a.refresh();
                Some(a)
            } else {
                b.left = merge(Some(a), b.left.take());
                b.refresh();
                Some(b)
            }
        }
    }
}

/// Insert a fresh node: split when its priority wins, else recurse by
/// ordinate.
fn insert<K>(node: Option<Box<Node<K>>>, mut new: Box<Node<K>>) -> Box<Node<K>> {
    let Some(mut n) = node else {
        new.refresh();
        return new;
    };
    if new.priority < n.priority {
        let (low, high) = split(Some(n), new.ordinate);
        new.left = low;
        new.right = high;
        new.refresh();
        new
    } else {
        if new.ordinate < n.ordinate {
            n.left = Some(insert(n.left.take(), new));
        } else {
            n.right = Some(insert(n.right.take(), new));
        }
        n.refresh();
        n
    }
}

/// Rewrite the weight of the node holding `ordinate`, refreshing sums on
/// the way back up. Returns whether the node was found.
fn reweight<K>(node: Option<&mut Box<Node<K>>>, ordinate: u128, weight: f64) -> bool {
    let Some(n) = node else {
        return false;
    };
    let found = match ordinate.cmp(&n.ordinate) {
        Ordering::Equal => {
            n.weight = weight;
            true
        }
        Ordering::Less => reweight(n.left.as_mut(), ordinate, weight),
        Ordering::Greater => reweight(n.right.as_mut(), ordinate, weight),
    };
    if found {
        n.refresh();
    }
    found
}

/// Remove the node holding `ordinate`, merging its subtrees in place.
fn unlink<K>(node: Option<Box<Node<K>>>, ordinate: u128) -> Option<Box<Node<K>>> {
    let mut n = node?;
    match ordinate.cmp(&n.ordinate) {
        Ordering::Equal => merge(n.left.take(), n.right.take()),
        Ordering::Less => {
            n.left = unlink(n.left.take(), ordinate);
            n.refresh();
            Some(n)
        }
        Ordering::Greater => {
            n.right = unlink(n.right.take(), ordinate);
            n.refresh();
            Some(n)
        }
    }
}

/// Keyed weighted container backed by a treap with subtree sums.
#[derive(Debug, Clone)]
pub struct TreapMap<K> {
    root: Option<Box<Node<K>>>,
    /// Ordinates of live keys; the lookup path into the tree.
    ordinates: HashMap<K, u128>,
    hasher: RandomState,
    priorities: ChaCha8Rng,
    /// Monotone for the container's lifetime; never reused, even by
    /// `clear`.
    next_stamp: u64,
}

impl<K> TreapMap<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty treap. The seed fixes both the key hash and the
    /// node priority stream, making runs deterministic.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_priority_rng(seed, ChaCha8Rng::seed_from_u64(seed ^ SEED_STRIDE))
    }

    /// Create an empty treap with a caller-supplied priority RNG; the
    /// seed still fixes the key hash.
    #[must_use]
    pub fn with_priority_rng(seed: u64, priorities: ChaCha8Rng) -> Self {
        Self {
            root: None,
            ordinates: HashMap::new(),
            hasher: hasher_state(seed),
            priorities,
            next_stamp: 0,
        }
    }

    /// Longest root-to-leaf path; O(log n) with high probability.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk<K>(node: &Option<Box<Node<K>>>) -> usize {
            node.as_ref()
                .map_or(0, |n| 1 + walk(&n.left).max(walk(&n.right)))
        }
        walk(&self.root)
    }
}

impl<K> Default for TreapMap<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K> WeightTable<K> for TreapMap<K>
where
    K: Eq + Hash + Clone,
{
    fn set(&mut self, key: K, weight: f64) {
        check_weight(weight);
        if let Some(&ordinate) = self.ordinates.get(&key) {
            let found = reweight(self.root.as_mut(), ordinate, weight);
            debug_assert!(found, "tracked ordinate missing from tree");
            return;
        }
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        let ordinate = (u128::from(self.hasher.hash_one(&key)) << 64) | u128::from(stamp);
        let node = Box::new(Node {
            ordinate,
            key: key.clone(),
            weight,
            sum: weight,
            priority: self.priorities.gen(),
            left: None,
            right: None,
        });
        self.root = Some(insert(self.root.take(), node));
        self.ordinates.insert(key, ordinate);
    }

    fn get(&self, key: &K) -> Result<f64> {
        let &ordinate = self.ordinates.get(key).ok_or(WeightError::NotFound)?;
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match ordinate.cmp(&node.ordinate) {
                Ordering::Equal => return Ok(node.weight),
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
            }
        }
        Err(WeightError::NotFound)
    }

    fn erase(&mut self, key: &K) {
        if let Some(ordinate) = self.ordinates.remove(key) {
            self.root = unlink(self.root.take(), ordinate);
        }
    }

    fn total(&mut self) -> f64 {
        subtree_sum(&self.root)
    }

    fn choose(&mut self, draw: f64) -> Result<(K, f64)> {
        let total = subtree_sum(&self.root);
        if !(draw >= 0.0 && draw < total) {
            return Err(WeightError::OutOfRange { draw, total });
        }
        let mut residual = draw;
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            let left_sum = subtree_sum(&node.left);
            if residual < left_sum {
                cur = node.left.as_deref();
                continue;
            }
            residual -= left_sum;
            if residual < node.weight {
                return Ok((node.key.clone(), node.weight));
            }
            residual -= node.weight;
            cur = node.right.as_deref();
        }
        Err(WeightError::Internal { residual })
    }

    fn len(&self) -> usize {
        self.ordinates.len()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, f64)> + 'a
    where
        K: 'a,
    {
        Iter::new(self.root.as_deref())
    }

    fn clear(&mut self) {
        self.root = None;
        self.ordinates.clear();
    }
}

/// In-order (ordinate-ascending) iterator over live keys.
pub struct Iter<'a, K> {
    stack: Vec<&'a Node<K>>,
}

impl<'a, K> Iter<'a, K> {
    fn new(root: Option<&'a Node<K>>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_spine(root);
        iter
    }

    fn push_spine(&mut self, mut node: Option<&'a Node<K>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (&'a K, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_spine(node.right.as_deref());
        Some((&node.key, node.weight))
    }
}
