use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Grid, GridSnapshot, SnapshotError, Tile};
use super::{Direction, Position};

/// Number of random tiles placed on a fresh board.
pub const START_TILES: usize = 2;

/// Reaching this tile sets `won`; play continues regardless.
pub const WINNING_TILE: u32 = 2048;

/// Result of sliding the board once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOutcome {
    /// True if any tile changed position or was absorbed by a merge.
    pub moved: bool,
    /// Sum of the values of the tiles created by merges.
    pub score_delta: u64,
}

/// Value copy of a game: grid plus cumulative score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub grid: GridSnapshot,
    pub score: u64,
}

/// A board, its score, and the terminal flags.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Game {
    grid: Grid,
    score: u64,
    over: bool,
    won: bool,
}

impl Game {
    /// A fresh game with [`START_TILES`] random tiles.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut game = Game::default();
        for _ in 0..START_TILES {
            game.add_random_tile(rng);
        }
        game
    }

    /// A game over an explicit grid with zero score.
    pub fn with_grid(grid: Grid) -> Self {
        let mut game = Game { grid, ..Game::default() };
        game.refresh_flags();
        game
    }

    /// Row-major values (`rows[y][x]`), 0 meaning empty.
    /// Game over a literal board; panics on values that are not tiles, see
    /// [`Grid::from_rows`].
    pub fn from_rows(rows: [[u32; 4]; 4]) -> Self { Game::with_grid(Grid::from_rows(rows)) }

    pub fn try_from_rows(rows: [[u32; 4]; 4]) -> Result<Self, SnapshotError> {
        Ok(Game::with_grid(Grid::try_from_rows(rows)?))
    }

    pub fn from_snapshot(snapshot: &GameSnapshot) -> Result<Self, SnapshotError> {
        let mut game = Game { grid: Grid::from_snapshot(&snapshot.grid)?, score: snapshot.score, ..Game::default() };
        game.refresh_flags();
        Ok(game)
    }

    pub fn snapshot(&self) -> GameSnapshot { GameSnapshot { grid: self.grid.snapshot(), score: self.score } }

    /// Replace this game's state with a copy of `other`, reusing the allocation.
    #[inline]
    pub fn reset(&mut self, other: &Game) { self.clone_from(other); }

    /// Start over with a fresh random board.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) { *self = Game::new(rng); }

    #[inline]
    pub fn grid(&self) -> &Grid { &self.grid }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    #[inline]
    pub fn is_over(&self) -> bool { self.over }

    #[inline]
    pub fn won(&self) -> bool { self.won }

    pub fn highest_tile(&self) -> u32 { self.grid.highest_tile() }

    /// True while an empty cell or an adjacent equal pair exists.
    pub fn moves_available(&self) -> bool { self.grid.cells_available() || self.grid.tile_matches_available() }

    /// Slide and merge tiles toward `dir` without spawning a tile.
    ///
    /// Tiles are visited farthest-first. A tile produced by a merge cannot
    /// merge again in the same call. An illegal direction leaves the grid and
    /// score untouched and reports `moved = false`.
    pub fn shift(&mut self, dir: Direction) -> MoveOutcome {
        let mut outcome = MoveOutcome::default();
        let (xs, ys) = dir.traversals();
        for &x in &xs {
            for &y in &ys {
                let cell = Position::new(x, y);
                let Some(tile) = self.grid.cell(cell).copied() else { continue };
                let (farthest, next) = self.grid.find_farthest_position(cell, dir);
                let mergeable = next.filter(|&p| {
                    self.grid
                        .cell(p)
                        .is_some_and(|other| other.value == tile.value && other.merged_from.is_none())
                });
                if let Some(target) = mergeable {
                    let merged = Tile::merged(target, tile.value * 2, [cell, target]);
                    self.grid.remove_tile(cell);
                    self.grid.insert_tile(merged);
                    outcome.score_delta += merged.value as u64;
                    outcome.moved = true;
                } else if farthest != cell {
                    self.grid.move_tile(cell, farthest);
                    outcome.moved = true;
                }
            }
        }
        self.grid.clear_merges();
        self.score += outcome.score_delta;
        if self.grid.highest_tile() >= WINNING_TILE {
            self.won = true;
        }
        outcome
    }

    /// Slide toward `dir`; if anything moved, spawn one random tile and
    /// update the `over` flag. Does nothing once the game is over.
    pub fn apply<R: Rng + ?Sized>(&mut self, dir: Direction, rng: &mut R) -> MoveOutcome {
        if self.over {
            return MoveOutcome::default();
        }
        let outcome = self.shift(dir);
        if outcome.moved {
            self.add_random_tile(rng);
            if !self.moves_available() {
                self.over = true;
            }
        }
        outcome
    }

    /// Like [`Game::apply`], returning only whether the board changed.
    #[inline]
    pub fn move_dir<R: Rng + ?Sized>(&mut self, dir: Direction, rng: &mut R) -> bool { self.apply(dir, rng).moved }

    /// Insert a 2 (90%) or 4 (10%) at a uniformly chosen empty cell.
    /// No-op on a full grid.
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Tile> {
        let position = self.grid.random_available_cell(rng)?;
        let value = if rng.gen_bool(0.9) { 2 } else { 4 };
        let tile = Tile::new(position, value);
        self.grid.insert_tile(tile);
        Some(tile)
    }

    fn refresh_flags(&mut self) {
        self.over = !self.moves_available();
        self.won = self.grid.highest_tile() >= WINNING_TILE;
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("rows", &self.grid.to_rows())
            .field("score", &self.score)
            .field("over", &self.over)
            .finish()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}score: {}", self.grid, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn random_board(rng: &mut StdRng, moves: usize) -> Game {
        let mut game = Game::new(rng);
        for i in 0..moves {
            let dir = Direction::ALL[(i * 7 + 3) % 4];
            game.move_dir(dir, rng);
        }
        game
    }

    #[test]
    fn row_of_four_merges_pairwise_only() {
        let mut game = Game::from_rows([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        let out = game.shift(Direction::Left);
        assert!(out.moved);
        assert_eq!(out.score_delta, 8);
        assert_eq!(game.grid().to_rows()[0], [4, 4, 0, 0]);

        let mut game = Game::from_rows([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        game.shift(Direction::Right);
        assert_eq!(game.grid().to_rows()[0], [0, 0, 4, 4]);
    }

    #[test]
    fn three_equal_tiles_merge_the_far_pair() {
        let mut game = Game::from_rows([[0, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        game.shift(Direction::Right);
        assert_eq!(game.grid().to_rows()[0], [0, 0, 2, 4]);

        let mut game = Game::from_rows([[4, 4, 8, 0], [0; 4], [0; 4], [0; 4]]);
        game.shift(Direction::Left);
        assert_eq!(game.grid().to_rows()[0], [8, 8, 0, 0]);
    }

    #[test]
    fn columns_shift_up_and_down() {
        let mut game = Game::from_rows([[2, 0, 0, 0], [2, 0, 0, 0], [4, 0, 0, 0], [0, 0, 0, 0]]);
        let out = game.shift(Direction::Down);
        assert_eq!(out.score_delta, 4);
        let col: Vec<u32> = game.grid().to_rows().iter().map(|r| r[0]).collect();
        assert_eq!(col, vec![0, 0, 4, 4]);

        game.shift(Direction::Up);
        let col: Vec<u32> = game.grid().to_rows().iter().map(|r| r[0]).collect();
        assert_eq!(col, vec![8, 0, 0, 0]);
    }

    #[test]
    fn flush_tile_against_wall_does_not_move() {
        let mut game = Game::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let before = game.clone();
        let out = game.shift(Direction::Left);
        assert!(!out.moved);
        assert_eq!(out.score_delta, 0);
        assert_eq!(game.grid(), before.grid());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn illegal_move_does_not_spawn() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = Game::from_rows([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(!game.move_dir(Direction::Left, &mut rng));
        assert_eq!(game.grid().tile_count(), 2);
        assert!(!game.move_dir(Direction::Up, &mut rng));
        assert_eq!(game.grid().tile_count(), 2);
    }

    #[test]
    fn second_shift_in_same_direction_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(11);
        for trial in 0..40 {
            let base = random_board(&mut rng, trial);
            for dir in Direction::ALL {
                let mut game = base.clone();
                game.shift(dir);
                let after_first = game.clone();
                let out = game.shift(dir);
                assert!(!out.moved, "trial {trial} dir {dir}");
                assert_eq!(game.grid(), after_first.grid());
            }
        }
    }

    #[test]
    fn moved_spawns_exactly_one_tile_and_conserves_value() {
        let mut rng = StdRng::seed_from_u64(99);
        for trial in 0..40 {
            let base = random_board(&mut rng, trial);
            for dir in Direction::ALL {
                let mut shifted = base.clone();
                let out = shifted.shift(dir);
                if !out.moved {
                    continue;
                }
                // Merging conserves the tile sum; the spawn adds 2 or 4.
                assert_eq!(shifted.grid().tile_sum(), base.grid().tile_sum());
                let mut game = base.clone();
                let applied = game.apply(dir, &mut rng);
                assert_eq!(applied, out);
                let spawned = game.grid().tile_sum() - base.grid().tile_sum();
                assert!(spawned == 2 || spawned == 4, "spawned {spawned}");
                assert_eq!(game.grid().tile_count(), shifted.grid().tile_count() + 1);
                assert_eq!(game.score(), base.score() + out.score_delta);
            }
        }
    }

    #[test]
    fn left_merge_end_to_end() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = Game::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(game.move_dir(Direction::Left, &mut rng));
        assert_eq!(game.score(), 4);
        assert_eq!(game.grid().value_at(Position::new(0, 0)), 4);
        let others: Vec<_> = game.grid().tiles().filter(|t| t.position != Position::new(0, 0)).collect();
        assert_eq!(others.len(), 1);
        assert!(others[0].value == 2 || others[0].value == 4);
    }

    #[test]
    fn merge_markers_do_not_outlive_the_move() {
        let mut game = Game::from_rows([[0, 0, 2, 2], [0; 4], [0; 4], [0; 4]]);
        game.shift(Direction::Right);
        let tile = game.grid().cell(Position::new(3, 0)).copied().unwrap();
        assert_eq!(tile.value, 4);
        assert_eq!(tile.merged_from, None);
        assert!(game.grid().tiles().all(|t| t.merged_from.is_none()));
        // The fresh 4 merges normally on the next move.
        let mut game = Game::from_rows([[0, 0, 2, 2], [0, 0, 0, 4], [0; 4], [0; 4]]);
        game.shift(Direction::Right);
        let out = game.shift(Direction::Down);
        assert_eq!(out.score_delta, 8);
        assert_eq!(game.grid().value_at(Position::new(3, 3)), 8);
    }

    #[test]
    fn illegal_move_leaves_game_equal() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut game = Game::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let before = game.clone();
        assert!(!game.shift(Direction::Left).moved);
        assert_eq!(game, before);

        let mut game = Game::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(game.move_dir(Direction::Left, &mut rng));
        let restored = Game::from_snapshot(&game.snapshot()).unwrap();
        assert_eq!(restored, game);
    }

    #[test]
    fn full_board_without_pairs_is_over() {
        let game = Game::from_rows([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(game.is_over());
        let mut rng = StdRng::seed_from_u64(0);
        let mut game = game;
        for dir in Direction::ALL {
            assert!(!game.move_dir(dir, &mut rng));
        }
    }

    #[test]
    fn new_game_has_start_tiles() {
        let mut rng = StdRng::seed_from_u64(8);
        let game = Game::new(&mut rng);
        assert_eq!(game.grid().tile_count(), START_TILES);
        assert_eq!(game.score(), 0);
        assert!(!game.is_over());
    }

    #[test]
    fn snapshot_round_trip_keeps_score() {
        let mut rng = StdRng::seed_from_u64(21);
        let game = random_board(&mut rng, 30);
        let restored = Game::from_snapshot(&game.snapshot()).unwrap();
        assert_eq!(restored.grid(), game.grid());
        assert_eq!(restored.score(), game.score());
    }

    #[test]
    fn reaching_2048_sets_won() {
        let mut game = Game::from_rows([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(!game.won());
        game.shift(Direction::Left);
        assert!(game.won());
    }
}
