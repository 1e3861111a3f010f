//! Evolutionary optimizer over candidate policies.
//!
//! A [`Population`] evaluates each candidate for a fixed number of episodes,
//! then keeps the better half and refills the rest with mutated copies of
//! random survivors. It can be driven one decision at a time against a live
//! [`GameHost`](crate::engine::GameHost) via [`Population::tick`], or headless
//! and in parallel via [`Population::evaluate_parallel`].
//!
//! ```
//! use evo_2048::engine::{GameHost, LiveGame};
//! use evo_2048::evolution::{EvolutionConfig, Population, Tick};
//! use evo_2048::policy::PolicyKind;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let cfg = EvolutionConfig {
//!     population_size: 2,
//!     episodes_per_candidate: 1,
//!     policy_kind: PolicyKind::Sequence,
//!     ..EvolutionConfig::default()
//! };
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut population = Population::random(cfg, &mut rng).unwrap();
//! let mut host = LiveGame::new(StdRng::seed_from_u64(2));
//! loop {
//!     match population.tick(&mut host, &mut rng).unwrap() {
//!         Tick::GameOver { summary: Some(_), .. } => break,
//!         Tick::GameOver { .. } => host.restart(),
//!         _ => {}
//!     }
//! }
//! assert_eq!(population.generation(), 1);
//! assert_eq!(population.members().len(), 2);
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::SnapshotError;
use crate::policy::{MutationConfig, PolicyError, PolicyKind};

mod episode;
mod population;

pub use episode::{apply_proposal, play_episode, play_episode_observed, EpisodeResult};
pub use population::{GenerationSummary, Member, Phase, Population, Tick};

/// Knobs for a population run. Defaults are used for missing JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Number of candidates, constant across generations.
    pub population_size: usize,
    /// Episodes averaged into each candidate's fitness.
    pub episodes_per_candidate: u32,
    /// Candidate kind for random genesis.
    pub policy_kind: PolicyKind,
    pub mutation: MutationConfig,
    /// Genesis weights are drawn from `-span..=span`.
    pub initial_gene_span: i32,
    /// Seed for the population's random source; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            episodes_per_candidate: 3,
            policy_kind: PolicyKind::default(),
            mutation: MutationConfig::default(),
            initial_gene_span: 3,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Check the construction-time invariants.
    pub fn validate(&self) -> Result<(), PopulationError> {
        if self.population_size < 2 {
            return Err(PopulationError::TooSmall(self.population_size));
        }
        if self.episodes_per_candidate == 0 {
            return Err(PopulationError::ZeroEpisodes);
        }
        let rates = [
            ("mutation.gene_rate", self.mutation.gene_rate),
            ("mutation.trie.swap_rate", self.mutation.trie.swap_rate),
            ("mutation.trie.grow_rate", self.mutation.trie.grow_rate),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(PopulationError::Rate { name, value });
            }
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> { Ok(serde_json::from_str(s)?) }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PopulationError {
    #[error("population needs at least 2 members, got {0}")]
    TooSmall(usize),
    #[error("config expects {expected} members, got {found}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("episodes_per_candidate must be at least 1")]
    ZeroEpisodes,
    #[error("{name} = {value} is outside [0, 1]")]
    Rate { name: &'static str, value: f64 },
    #[error("candidate {index} is a {found:?} policy, config expects {expected:?}")]
    KindMismatch { index: usize, expected: PolicyKind, found: PolicyKind },
    #[error("candidate {index}: {source}")]
    Candidate {
        index: usize,
        #[source]
        source: PolicyError,
    },
    #[error("host snapshot rejected: {0}")]
    Snapshot(#[from] SnapshotError),
}
