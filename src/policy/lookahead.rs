use rand::Rng;

use crate::engine::{Direction, Game, GameSnapshot, SnapshotError};

use super::features::evaluate;

/// Score of one first-ply direction.
///
/// `score` is the best feature score over the four second-ply responses;
/// `legal` is false when the first move does not change the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Direction,
    pub score: f64,
    pub legal: bool,
}

/// Basic search stats for a single decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Boards scored by the feature evaluator.
    pub nodes: u64,
}

/// Two-ply lookahead driven by a gene vector over the fixed feature list.
///
/// Search runs on a private copy of the board; the caller's game is never
/// touched. Simulated moves spawn random tiles exactly like the live game.
pub struct Lookahead<'g> {
    genes: &'g [i32],
    stats: SearchStats,
}

impl<'g> Lookahead<'g> {
    pub fn new(genes: &'g [i32]) -> Self { Lookahead { genes, stats: SearchStats::default() } }

    /// Evaluate every first direction, in [`Direction::ALL`] order.
    ///
    /// The board after the first move is kept once; each second direction is
    /// scored after restoring that board. Illegal second moves score the
    /// post-first board unchanged.
    pub fn branch_evals<R: Rng + ?Sized>(&mut self, game: &Game, rng: &mut R) -> [BranchEval; 4] {
        let mut out = Direction::ALL.map(|dir| BranchEval { dir, score: 0.0, legal: false });
        let mut sim = game.clone();
        let mut after_first = game.clone();
        let mut nodes = 0u64;
        for (slot, first) in out.iter_mut().zip(Direction::ALL) {
            sim.reset(game);
            if !sim.move_dir(first, rng) {
                continue;
            }
            after_first.reset(&sim);
            let mut best: Option<f64> = None;
            for second in Direction::ALL {
                sim.reset(&after_first);
                sim.move_dir(second, rng);
                let score = evaluate(self.genes, &sim);
                nodes += 1;
                if best.map_or(true, |b| score > b) {
                    best = Some(score);
                }
            }
            *slot = BranchEval { dir: first, score: best.unwrap_or(0.0), legal: true };
        }
        self.stats.nodes = nodes;
        out
    }

    /// The legal first direction with the highest branch score.
    ///
    /// Exact ties keep the earlier direction. `None` means no direction
    /// changes the board.
    pub fn best_move<R: Rng + ?Sized>(&mut self, game: &Game, rng: &mut R) -> Option<Direction> {
        pick_best(&self.branch_evals(game, rng))
    }

    /// [`Lookahead::best_move`] on a snapshot of the live game.
    pub fn select_move<R: Rng + ?Sized>(
        &mut self,
        snapshot: &GameSnapshot,
        rng: &mut R,
    ) -> Result<Option<Direction>, SnapshotError> {
        let game = Game::from_snapshot(snapshot)?;
        Ok(self.best_move(&game, rng))
    }

    /// Statistics from the last call to [`Lookahead::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }
}

fn pick_best(branches: &[BranchEval; 4]) -> Option<Direction> {
    let mut best: Option<&BranchEval> = None;
    for branch in branches.iter().filter(|b| b.legal) {
        if best.map_or(true, |b| branch.score > b.score) {
            best = Some(branch);
        }
    }
    best.map(|b| b.dir)
}
