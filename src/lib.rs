//! evo-2048: a 2048 simulator and an evolutionary search over move policies.
//!
//! This crate provides:
//! - A 4x4 board simulator with tile movement history (`engine`)
//! - Candidate policies: a history-keyed direction trie, a feature-weighted
//!   two-ply lookahead, and fixed baselines (`policy`)
//! - A population manager that evolves candidates by truncation selection,
//!   tick by tick against a live game or in parallel batches (`evolution`)
//! - Postcard checkpoints of a population (`checkpoint`)
//!
//! Quick start:
//! ```
//! use evo_2048::engine::{Direction, Game};
//! use evo_2048::policy::{Lookahead, WeightedPolicy};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic play with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
//! let outcome = game.apply(Direction::Left, &mut rng);
//! assert!(outcome.moved);
//! assert_eq!(game.score(), 4);
//!
//! let policy = WeightedPolicy::hand_tuned();
//! let dir = Lookahead::new(policy.genes()).best_move(&game, &mut rng);
//! assert!(dir.is_some());
//! ```
pub mod checkpoint;
pub mod engine;
pub mod evolution;
pub mod logging;
pub mod policy;
