use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Direction, Game};

use super::{Policy, Proposal};

/// Non-evolving reference strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// Try the four directions in a fresh random order every tick.
    Random,
    /// Always try the same order.
    Priority([Direction; 4]),
    /// Alternate Down-first and Right-first, falling back to Left then Up.
    Alternating { down_first: bool },
}

impl Baseline {
    /// Down, Right, Left, Up.
    pub fn corner() -> Self {
        Baseline::Priority([Direction::Down, Direction::Right, Direction::Left, Direction::Up])
    }

    pub fn alternating() -> Self { Baseline::Alternating { down_first: true } }

    pub fn name(&self) -> &'static str {
        match self {
            Baseline::Random => "random",
            Baseline::Priority(_) => "priority",
            Baseline::Alternating { .. } => "alternating",
        }
    }
}

impl Policy for Baseline {
    fn propose<R: Rng + ?Sized>(&mut self, _game: &Game, _history: &[Direction], rng: &mut R) -> Proposal {
        use Direction::*;
        match self {
            Baseline::Random => {
                let mut order = Direction::ALL;
                order.shuffle(rng);
                Proposal::Ordered(order)
            }
            Baseline::Priority(order) => Proposal::Ordered(*order),
            Baseline::Alternating { down_first } => {
                let order = if *down_first { [Down, Right, Left, Up] } else { [Right, Down, Left, Up] };
                *down_first = !*down_first;
                Proposal::Ordered(order)
            }
        }
    }
}
