use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{Direction, Game, GameHost};
use crate::policy::{Candidate, MoveHistory, Policy, PolicyError, FEATURE_COUNT};

use super::episode::{apply_proposal, play_episode};
use super::{EvolutionConfig, PopulationError};

/// A candidate and its fitness (mean terminal score over its episodes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub candidate: Candidate,
    pub fitness: f64,
}

impl Member {
    pub fn new(candidate: Candidate) -> Self { Member { candidate, fitness: 0.0 } }
}

/// Fitness statistics of a finished generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    /// The generation that was just evaluated.
    pub generation: u64,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub worst_fitness: f64,
    pub best: Candidate,
}

/// Observable evaluation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Playing episode `run` of candidate `agent`.
    Evaluating { agent: usize, run: u32 },
    /// An episode ended; waiting for the host to present a fresh board.
    AwaitingRestart { agent: usize, run: u32 },
}

/// Result of one [`Population::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// The active candidate played this direction.
    Moved(Direction),
    /// The episode ended with `score`. The caller should restart the host.
    /// `summary` is set when this episode completed a generation.
    GameOver { score: u64, summary: Option<GenerationSummary> },
    /// The previous episode was recorded; the host has not restarted yet.
    AwaitingRestart,
}

/// Fixed-size population evolved by truncation selection and mutation.
///
/// Per generation the state machine is
/// `Evaluating(agent, run) -> sort -> next generation -> Evaluating(0, 0)`;
/// sorting and reproduction happen synchronously inside the call that
/// records the final episode.
#[derive(Debug, Clone)]
pub struct Population {
    cfg: EvolutionConfig,
    members: Vec<Member>,
    agent: usize,
    run: u32,
    generation: u64,
    history: MoveHistory,
    awaiting_restart: bool,
}

impl Population {
    /// Build a population from explicit candidates.
    ///
    /// Rejects invalid configs, a candidate count different from
    /// `population_size`, candidates of another kind than `policy_kind`, and
    /// weighted candidates whose gene vectors do not match the feature list.
    pub fn new(cfg: EvolutionConfig, candidates: Vec<Candidate>) -> Result<Self, PopulationError> {
        Self::from_members(cfg, candidates.into_iter().map(Member::new).collect(), 0)
    }

    /// Random genesis of `cfg.population_size` candidates of `cfg.policy_kind`.
    pub fn random<R: Rng + ?Sized>(cfg: EvolutionConfig, rng: &mut R) -> Result<Self, PopulationError> {
        cfg.validate()?;
        let candidates = (0..cfg.population_size)
            .map(|_| Candidate::random(cfg.policy_kind, cfg.initial_gene_span, rng))
            .collect();
        Self::new(cfg, candidates)
    }

    /// Rebuild a population at a generation boundary (e.g. from a checkpoint).
    pub fn from_members(cfg: EvolutionConfig, mut members: Vec<Member>, generation: u64) -> Result<Self, PopulationError> {
        cfg.validate()?;
        if members.len() != cfg.population_size {
            return Err(PopulationError::SizeMismatch { expected: cfg.population_size, found: members.len() });
        }
        for (index, member) in members.iter().enumerate() {
            let kind = member.candidate.kind();
            if kind != cfg.policy_kind {
                return Err(PopulationError::KindMismatch { index, expected: cfg.policy_kind, found: kind });
            }
            if let Some(found) = member.candidate.gene_len().filter(|&len| len != FEATURE_COUNT) {
                return Err(PopulationError::Candidate {
                    index,
                    source: PolicyError::GeneLength { expected: FEATURE_COUNT, found },
                });
            }
        }
        members[0].fitness = 0.0;
        Ok(Population {
            cfg,
            members,
            agent: 0,
            run: 0,
            generation,
            history: MoveHistory::new(),
            awaiting_restart: false,
        })
    }

    #[inline]
    pub fn config(&self) -> &EvolutionConfig { &self.cfg }

    #[inline]
    pub fn members(&self) -> &[Member] { &self.members }

    /// Number of completed generations.
    #[inline]
    pub fn generation(&self) -> u64 { self.generation }

    /// The candidate currently being evaluated.
    #[inline]
    pub fn active(&self) -> &Candidate { &self.members[self.agent].candidate }

    #[inline]
    pub fn history(&self) -> &[Direction] { self.history.as_slice() }

    pub fn phase(&self) -> Phase {
        let (agent, run) = (self.agent, self.run);
        if self.awaiting_restart {
            Phase::AwaitingRestart { agent, run }
        } else {
            Phase::Evaluating { agent, run }
        }
    }

    /// Advance by one decision against the live game.
    ///
    /// A finished game is recorded once; later ticks report
    /// [`Tick::AwaitingRestart`] until the host offers a playable board. If
    /// no direction moves the board the episode is treated as over.
    pub fn tick<H, R>(&mut self, host: &mut H, rng: &mut R) -> Result<Tick, PopulationError>
    where
        H: GameHost + ?Sized,
        R: Rng + ?Sized,
    {
        if self.awaiting_restart {
            if host.is_over() || !host.moves_available() {
                return Ok(Tick::AwaitingRestart);
            }
            self.awaiting_restart = false;
        }
        if host.is_over() {
            return Ok(self.finish_episode(host.score(), rng));
        }
        let view = Game::from_snapshot(&host.snapshot())?;
        let proposal = self.members[self.agent].candidate.propose(&view, self.history.as_slice(), rng);
        match apply_proposal(host, proposal) {
            Some(dir) => {
                self.history.push(dir);
                Ok(Tick::Moved(dir))
            }
            None => {
                log::warn!("candidate {} found no legal move on a board not flagged over", self.agent);
                Ok(self.finish_episode(host.score(), rng))
            }
        }
    }

    fn finish_episode<R: Rng + ?Sized>(&mut self, score: u64, rng: &mut R) -> Tick {
        self.awaiting_restart = true;
        let summary = self.record_episode(score, rng);
        Tick::GameOver { score, summary }
    }

    /// Record a terminal score for the active candidate.
    ///
    /// Adds `score / episodes` to its fitness. After its last episode the
    /// next candidate becomes active with fitness reset to zero; after the
    /// last candidate the generation advances and its summary is returned.
    pub fn record_episode<R: Rng + ?Sized>(&mut self, score: u64, rng: &mut R) -> Option<GenerationSummary> {
        let episodes = self.cfg.episodes_per_candidate;
        self.members[self.agent].fitness += score as f64 / episodes as f64;
        self.run += 1;
        self.history.clear();
        log::debug!("generation {} candidate {} episode {}/{}: score {}", self.generation, self.agent, self.run, episodes, score);
        if self.run < episodes {
            return None;
        }
        log::debug!("candidate {} fitness {:.1}", self.agent, self.members[self.agent].fitness);
        self.run = 0;
        self.agent += 1;
        if self.agent < self.members.len() {
            self.members[self.agent].fitness = 0.0;
            return None;
        }
        Some(self.advance_generation(rng))
    }

    /// Evaluate every candidate headless, in parallel, then advance.
    ///
    /// Each candidate plays its episodes on its own board seeded from `rng`,
    /// so a seeded `rng` gives reproducible generations. Any partially
    /// recorded tick-driven progress in this generation is discarded.
    pub fn evaluate_parallel<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GenerationSummary {
        let episodes = self.cfg.episodes_per_candidate;
        let seeds: Vec<u64> = (0..self.members.len()).map(|_| rng.gen()).collect();
        self.members.par_iter_mut().zip(seeds).for_each(|(member, seed)| {
            let mut rng = StdRng::seed_from_u64(seed);
            member.fitness = (0..episodes)
                .map(|_| play_episode(&mut member.candidate, &mut rng, None).score as f64 / episodes as f64)
                .sum();
        });
        self.history.clear();
        self.awaiting_restart = false;
        self.advance_generation(rng)
    }

    /// Sort ascending by fitness (stable), drop the lower half, and refill it
    /// with mutated copies of uniformly chosen survivors.
    fn advance_generation<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GenerationSummary {
        let size = self.members.len();
        self.members.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
        let summary = summarize(self.generation, &self.members);

        let mut next = self.members.split_off(size / 2);
        let survivors = next.len();
        while next.len() < size {
            let parent = rng.gen_range(0..survivors);
            let child = next[parent].candidate.offspring(&self.cfg.mutation, rng);
            next.push(Member::new(child));
        }
        self.members = next;
        self.members[0].fitness = 0.0;
        self.agent = 0;
        self.run = 0;
        self.generation += 1;
        log::info!(
            "generation {}: best {:.1} mean {:.1} worst {:.1}",
            summary.generation,
            summary.best_fitness,
            summary.mean_fitness,
            summary.worst_fitness
        );
        summary
    }
}

/// Summary over members sorted ascending by fitness.
fn summarize(generation: u64, sorted: &[Member]) -> GenerationSummary {
    let best = &sorted[sorted.len() - 1];
    GenerationSummary {
        generation,
        best_fitness: best.fitness,
        mean_fitness: sorted.iter().map(|m| m.fitness).sum::<f64>() / sorted.len() as f64,
        worst_fitness: sorted[0].fitness,
        best: best.candidate.clone(),
    }
}
