//! Simulation-free policy: a 4-ary trie of direction orderings keyed by the
//! recent move history.
//!
//! The root holds the default ordering. A child at index `d` specializes the
//! ordering for histories whose most recent move was `d`; its own children
//! look one move further back, and so on. Lookup returns the ordering at the
//! deepest node the history reaches, so a shallow trie is a fallback for any
//! history length.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::Direction;

/// Priority order in which to try the four directions.
pub type Order = [Direction; 4];

fn random_ordering<R: Rng + ?Sized>(rng: &mut R) -> Order {
    let mut order = Direction::ALL;
    order.shuffle(rng);
    order
}

/// One trie node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceNode {
    order: Order,
    children: [Option<Box<SequenceNode>>; 4],
}

impl SequenceNode {
    pub fn leaf(order: Order) -> Self { SequenceNode { order, children: Default::default() } }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self { SequenceNode::leaf(random_ordering(rng)) }

    #[inline]
    pub fn order(&self) -> Order { self.order }

    pub fn child(&self, dir: Direction) -> Option<&SequenceNode> { self.children[dir.index()].as_deref() }

    /// Attach (or replace) the child for `dir`, returning it.
    pub fn set_child(&mut self, dir: Direction, node: SequenceNode) -> &mut SequenceNode {
        self.children[dir.index()].insert(Box::new(node))
    }

    fn children(&self) -> impl Iterator<Item = &SequenceNode> + '_ { self.children.iter().flatten().map(|c| &**c) }

    /// Swap two distinct random entries of this node's ordering.
    fn swap_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let i = rng.gen_range(0..4);
        let j = (i + rng.gen_range(1..4)) % 4;
        self.order.swap(i, j);
    }

    /// Follow `path` through existing children and attach a random leaf at
    /// the first empty slot. Returns false if every slot on the path exists.
    fn grow_along<R: Rng + ?Sized>(&mut self, path: &[usize], rng: &mut R) -> bool {
        let Some((&idx, rest)) = path.split_first() else { return false };
        match &mut self.children[idx] {
            Some(child) => child.grow_along(rest, rng),
            None => {
                self.children[idx] = Some(Box::new(SequenceNode::random(rng)));
                true
            }
        }
    }
}

/// Mutation knobs for sequence tries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieMutation {
    /// Per-node probability of swapping two entries of its ordering.
    pub swap_rate: f64,
    /// Probability that a mutate call grows one new node.
    pub grow_rate: f64,
    /// Deepest level a grown node may occupy (root is level 0).
    pub max_depth: usize,
}

impl Default for TrieMutation {
    fn default() -> Self { TrieMutation { swap_rate: 0.25, grow_rate: 1.0, max_depth: 6 } }
}

/// A trie-of-permutations policy.
///
/// `Clone` is a deep copy: every node is owned by exactly one trie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePolicy {
    root: SequenceNode,
}

impl SequencePolicy {
    pub fn new(root: SequenceNode) -> Self { SequencePolicy { root } }

    /// A single random root ordering.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self { SequencePolicy::new(SequenceNode::random(rng)) }

    #[inline]
    pub fn root(&self) -> &SequenceNode { &self.root }

    #[inline]
    pub fn root_mut(&mut self) -> &mut SequenceNode { &mut self.root }

    /// Order at the deepest node reached by walking `history` from its
    /// most recent entry backwards.
    pub fn evaluate(&self, history: &[Direction]) -> Order {
        let mut node = &self.root;
        for &dir in history.iter().rev() {
            match node.child(dir) {
                Some(child) => node = child,
                None => break,
            }
        }
        node.order
    }

    /// Mutate in place.
    ///
    /// Every node swaps two ordering entries with probability `swap_rate`.
    /// Then, with probability `grow_rate`, a random index path of length
    /// `max_depth` is drawn and one new leaf is attached at the first empty
    /// slot along it. At most one node grows per call.
    pub fn mutate<R: Rng + ?Sized>(&mut self, cfg: &TrieMutation, rng: &mut R) {
        let mut stack: Vec<&mut SequenceNode> = vec![&mut self.root];
        while let Some(node) = stack.pop() {
            if rng.gen_bool(cfg.swap_rate) {
                node.swap_random(rng);
            }
            stack.extend(node.children.iter_mut().flatten().map(|c| &mut **c));
        }
        if rng.gen_bool(cfg.grow_rate) {
            let path: Vec<usize> = (0..cfg.max_depth).map(|_| rng.gen_range(0..4)).collect();
            self.root.grow_along(&path, rng);
        }
    }

    /// Number of nodes in the trie.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }

    /// Depth of the deepest node (root alone is 0).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(&self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children().map(|c| (c, depth + 1)));
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use Direction::*;

    fn sorted(mut order: Order) -> Order {
        order.sort_by_key(|d| d.index());
        order
    }

    #[test]
    fn evaluate_follows_history_from_most_recent() {
        let mut root = SequenceNode::leaf([Down, Right, Left, Up]);
        let after_left = root.set_child(Left, SequenceNode::leaf([Up, Down, Left, Right]));
        after_left.set_child(Right, SequenceNode::leaf([Right, Up, Down, Left]));
        let policy = SequencePolicy::new(root);

        assert_eq!(policy.evaluate(&[]), [Down, Right, Left, Up]);
        assert_eq!(policy.evaluate(&[Up]), [Down, Right, Left, Up]);
        assert_eq!(policy.evaluate(&[Left]), [Up, Down, Left, Right]);
        assert_eq!(policy.evaluate(&[Right, Left]), [Right, Up, Down, Left]);
        // History beyond the trie's depth falls back to the deepest node.
        assert_eq!(policy.evaluate(&[Up, Down, Right, Left]), [Right, Up, Down, Left]);
        assert_eq!(policy.evaluate(&[Down, Left]), [Up, Down, Left, Right]);
    }

    #[test]
    fn mutation_keeps_every_ordering_a_permutation() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut policy = SequencePolicy::random(&mut rng);
        let cfg = TrieMutation { swap_rate: 0.5, grow_rate: 1.0, max_depth: 4 };
        for _ in 0..50 {
            policy.mutate(&cfg, &mut rng);
        }
        let mut stack = vec![policy.root()];
        while let Some(node) = stack.pop() {
            assert_eq!(sorted(node.order()), Direction::ALL);
            stack.extend(node.children());
        }
        assert!(policy.depth() <= 4);
    }

    #[test]
    fn mutate_grows_at_most_one_node() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut policy = SequencePolicy::random(&mut rng);
        let cfg = TrieMutation { swap_rate: 0.0, grow_rate: 1.0, max_depth: 3 };
        let mut prev = policy.node_count();
        for _ in 0..30 {
            policy.mutate(&cfg, &mut rng);
            let now = policy.node_count();
            assert!(now == prev || now == prev + 1);
            prev = now;
        }
        assert!(prev > 1);
    }

    #[test]
    fn zero_rates_leave_the_trie_unchanged() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut policy = SequencePolicy::random(&mut rng);
        policy.mutate(&TrieMutation { swap_rate: 0.0, grow_rate: 1.0, max_depth: 2 }, &mut rng);
        let before = policy.clone();
        policy.mutate(&TrieMutation { swap_rate: 0.0, grow_rate: 0.0, max_depth: 2 }, &mut rng);
        assert_eq!(policy, before);
    }

    #[test]
    fn zero_depth_never_grows() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut policy = SequencePolicy::random(&mut rng);
        for _ in 0..10 {
            policy.mutate(&TrieMutation { swap_rate: 1.0, grow_rate: 1.0, max_depth: 0 }, &mut rng);
        }
        assert_eq!(policy.node_count(), 1);
    }

    #[test]
    fn swap_always_changes_the_ordering() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut node = SequenceNode::leaf(Direction::ALL);
        for _ in 0..20 {
            let before = node.order();
            node.swap_random(&mut rng);
            assert_ne!(node.order(), before);
            assert_eq!(sorted(node.order()), Direction::ALL);
        }
    }

    #[test]
    fn mutating_a_clone_leaves_the_original_alone() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut original = SequencePolicy::random(&mut rng);
        let grow = TrieMutation { swap_rate: 0.0, grow_rate: 1.0, max_depth: 3 };
        for _ in 0..12 {
            original.mutate(&grow, &mut rng);
        }
        let frozen = original.clone();
        let mut child = original.clone();
        let heavy = TrieMutation { swap_rate: 1.0, grow_rate: 1.0, max_depth: 5 };
        for _ in 0..20 {
            child.mutate(&heavy, &mut rng);
        }
        assert_eq!(original, frozen);
        assert_ne!(child, frozen);
    }
}
