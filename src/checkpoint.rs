//! Population checkpoints.
//!
//! A checkpoint is the state of a [`Population`] at a generation boundary,
//! encoded with postcard. Restoring it re-runs the construction checks, so a
//! checkpoint written against a different feature list is rejected.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::evolution::{EvolutionConfig, Member, Population, PopulationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Completed generations.
    pub generation: u64,
    pub config: EvolutionConfig,
    pub members: Vec<Member>,
}

#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("checkpoint does not describe a valid population: {0}")]
    Population(#[from] PopulationError),
}

impl Checkpoint {
    pub fn to_postcard_bytes(&self) -> Result<Vec<u8>, CheckpointError> { Ok(postcard::to_allocvec(self)?) }

    pub fn from_postcard_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> { Ok(postcard::from_bytes(bytes)?) }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        fs::write(path, self.to_postcard_bytes()?)?;
        Ok(())
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let bytes = fs::read(path)?;
        Self::from_postcard_bytes(&bytes)
    }

    /// Rebuild the population, ready to evaluate the next generation.
    pub fn into_population(self) -> Result<Population, CheckpointError> {
        Ok(Population::from_members(self.config, self.members, self.generation)?)
    }
}

impl Population {
    /// Capture the members, config and generation counter.
    ///
    /// Fitness of members is carried along for inspection; it is reset when
    /// the population is evaluated again.
    pub fn to_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            generation: self.generation(),
            config: self.config().clone(),
            members: self.members().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::Tick;
    use crate::engine::{GameHost, LiveGame};
    use crate::policy::{Candidate, PolicyKind, WeightedPolicy};
    use rand::{rngs::StdRng, SeedableRng};

    fn evolved(kind: PolicyKind) -> Population {
        let cfg = EvolutionConfig { population_size: 4, episodes_per_candidate: 1, policy_kind: kind, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(21);
        let mut pop = Population::random(cfg, &mut rng).unwrap();
        let mut host = LiveGame::new(StdRng::seed_from_u64(22));
        while pop.generation() == 0 {
            if let Tick::GameOver { .. } = pop.tick(&mut host, &mut rng).unwrap() {
                host.restart();
            }
        }
        pop
    }

    #[test]
    fn file_roundtrip_restores_population() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.ckpt");
        for kind in [PolicyKind::Sequence, PolicyKind::Weighted] {
            let pop = evolved(kind);
            let ckpt = pop.to_checkpoint();
            ckpt.write_to_path(&path).unwrap();
            let back = Checkpoint::read_from_path(&path).unwrap();
            assert_eq!(back, ckpt);

            let restored = back.into_population().unwrap();
            assert_eq!(restored.generation(), 1);
            assert_eq!(restored.config(), pop.config());
            let candidates = |p: &Population| p.members().iter().map(|m| m.candidate.clone()).collect::<Vec<_>>();
            assert_eq!(candidates(&restored), candidates(&pop));
        }
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let bytes = evolved(PolicyKind::Sequence).to_checkpoint().to_postcard_bytes().unwrap();
        let err = Checkpoint::from_postcard_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, CheckpointError::Postcard(_)));
    }

    #[test]
    fn inconsistent_checkpoint_fails_validation() {
        let mut ckpt = evolved(PolicyKind::Weighted).to_checkpoint();
        ckpt.members.push(Member::new(Candidate::Weighted(WeightedPolicy::hand_tuned())));
        let err = ckpt.into_population().unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::Population(PopulationError::SizeMismatch { expected: 4, found: 5 })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checkpoint::read_from_path(dir.path().join("absent.ckpt")).unwrap_err();
        assert!(matches!(err, CheckpointError::Io(_)));
    }
}
