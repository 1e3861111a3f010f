//! Candidate policies for choosing moves.
//!
//! Every policy exposes one capability, [`Policy::propose`]: given a copy of
//! the current board and the recent move history, propose what to play.
//!
//! - [`SequencePolicy`]: trie of direction orderings keyed by history.
//! - [`WeightedPolicy`]: gene weights over [`features`], played through the
//!   two-ply [`Lookahead`].
//! - [`Baseline`]: fixed reference strategies that do not evolve.
//!
//! ```
//! use evo_2048::engine::Game;
//! use evo_2048::policy::{Candidate, Policy, Proposal, WeightedPolicy};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let game = Game::new(&mut rng);
//! let mut candidate = Candidate::Weighted(WeightedPolicy::hand_tuned());
//! assert!(matches!(candidate.propose(&game, &[], &mut rng), Proposal::Single(_)));
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{Direction, Game};

mod baseline;
pub mod features;
mod history;
mod lookahead;
mod sequence;
mod weighted;

pub use baseline::Baseline;
pub use features::{evaluate, feature_vector, Feature, FEATURE_COUNT};
pub use history::{MoveHistory, HISTORY_CAP, HISTORY_DROP};
pub use lookahead::{BranchEval, Lookahead, SearchStats};
pub use sequence::{Order, SequenceNode, SequencePolicy, TrieMutation};
pub use weighted::WeightedPolicy;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("gene vector has {found} weights, feature list has {expected}")]
    GeneLength { expected: usize, found: usize },
}

/// What a policy wants to play this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    /// Try these directions in order until one moves the board.
    Ordered([Direction; 4]),
    /// Play this direction; fall back to the others if it is illegal.
    Single(Direction),
    /// No direction changes the board.
    NoMove,
}

impl Proposal {
    /// Directions to attempt, in order. `Single` falls back through the
    /// remaining directions in index order.
    pub fn attempts(self) -> Vec<Direction> {
        match self {
            Proposal::Ordered(order) => order.to_vec(),
            Proposal::Single(dir) => std::iter::once(dir)
                .chain(Direction::ALL.into_iter().filter(move |&d| d != dir))
                .collect(),
            Proposal::NoMove => Vec::new(),
        }
    }
}

/// Anything that can propose a move.
pub trait Policy {
    fn propose<R: Rng + ?Sized>(&mut self, game: &Game, history: &[Direction], rng: &mut R) -> Proposal;
}

/// Which kind of candidate a population evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Sequence,
    #[default]
    Weighted,
}

/// Mutation knobs for both candidate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Per-gene probability of a +/-1 step (weighted policies).
    pub gene_rate: f64,
    /// Trie mutation (sequence policies).
    pub trie: TrieMutation,
}

impl Default for MutationConfig {
    fn default() -> Self { MutationConfig { gene_rate: 0.1, trie: TrieMutation::default() } }
}

impl MutationConfig {
    /// No-op mutation: offspring are exact copies.
    pub fn frozen() -> Self {
        MutationConfig { gene_rate: 0.0, trie: TrieMutation { swap_rate: 0.0, grow_rate: 0.0, max_depth: 0 } }
    }
}

/// An evolvable policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Candidate {
    Sequence(SequencePolicy),
    Weighted(WeightedPolicy),
}

impl Candidate {
    /// A random genesis candidate of `kind`.
    pub fn random<R: Rng + ?Sized>(kind: PolicyKind, gene_span: i32, rng: &mut R) -> Self {
        match kind {
            PolicyKind::Sequence => Candidate::Sequence(SequencePolicy::random(rng)),
            PolicyKind::Weighted => Candidate::Weighted(WeightedPolicy::random(gene_span, rng)),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Candidate::Sequence(_) => PolicyKind::Sequence,
            Candidate::Weighted(_) => PolicyKind::Weighted,
        }
    }

    /// Gene vector length, for weighted candidates.
    pub fn gene_len(&self) -> Option<usize> {
        match self {
            Candidate::Sequence(_) => None,
            Candidate::Weighted(w) => Some(w.genes().len()),
        }
    }

    /// A deep copy of `self`, mutated.
    pub fn offspring<R: Rng + ?Sized>(&self, cfg: &MutationConfig, rng: &mut R) -> Self {
        let mut child = self.clone();
        match &mut child {
            Candidate::Sequence(trie) => trie.mutate(&cfg.trie, rng),
            Candidate::Weighted(weights) => weights.mutate(cfg.gene_rate, rng),
        }
        child
    }
}

impl Policy for Candidate {
    fn propose<R: Rng + ?Sized>(&mut self, game: &Game, history: &[Direction], rng: &mut R) -> Proposal {
        match self {
            Candidate::Sequence(trie) => Proposal::Ordered(trie.evaluate(history)),
            Candidate::Weighted(weights) => match Lookahead::new(weights.genes()).best_move(game, rng) {
                Some(dir) => Proposal::Single(dir),
                None => Proposal::NoMove,
            },
        }
    }
}
