//! Board simulator for the 4x4 tile-merging game.
//!
//! The engine models the board the way the live game does: a grid of
//! individually positioned tiles that slide farthest-first and merge at most
//! once per move. Lookahead search relies on [`Game::shift`] reproducing the
//! live rules exactly.
//!
//! ```
//! use evo_2048::engine::{Direction, Game};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
//! assert!(game.move_dir(Direction::Left, &mut rng));
//! assert_eq!(game.score(), 4);
//! assert_eq!(game.grid().tile_count(), 2);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

mod game;
mod grid;
mod host;

pub use game::{Game, GameSnapshot, MoveOutcome, START_TILES, WINNING_TILE};
pub use grid::{Grid, GridSnapshot, SnapshotError, Tile, TileState};
pub use host::{GameHost, LiveGame};

/// Side length of the board. Other sizes are not supported.
pub const SIZE: usize = 4;

/// Number of cells on the board.
pub const CELLS: usize = SIZE * SIZE;

/// A direction to slide/merge tiles, encoded 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    /// All directions in index order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    #[inline]
    pub fn index(self) -> usize { self as usize }

    /// Decode a direction from its 0..=3 index.
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Direction::Up),
            1 => Some(Direction::Right),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            _ => None,
        }
    }

    /// Unit vector `(dx, dy)`; `y` grows downward.
    #[inline]
    pub fn vector(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Column and row visiting order for a move, farthest-first.
    pub(crate) fn traversals(self) -> ([usize; SIZE], [usize; SIZE]) {
        let mut xs = [0, 1, 2, 3];
        let mut ys = [0, 1, 2, 3];
        let (dx, dy) = self.vector();
        if dx == 1 { xs.reverse(); }
        if dy == 1 { ys.reverse(); }
        (xs, ys)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// A cell coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[inline]
    pub const fn new(x: usize, y: usize) -> Self { Position { x, y } }

    #[inline]
    pub fn within_bounds(self) -> bool { self.x < SIZE && self.y < SIZE }

    /// The neighbouring cell in `dir`, or `None` past the edge.
    #[inline]
    pub fn step(self, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.vector();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        let next = Position { x, y };
        next.within_bounds().then_some(next)
    }

    /// Row-major index (`y * 4 + x`).
    #[inline]
    pub fn index(self) -> usize { self.y * SIZE + self.x }

    #[inline]
    pub fn from_index(idx: usize) -> Self { Position { x: idx % SIZE, y: idx / SIZE } }
}

pub(crate) fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => {
            let mut x = x.to_string();
            while x.len() < 7 {
                match x.len() {
                    6 => x = format!(" {}", x),
                    _ => x = format!(" {} ", x),
                }
            }
            x
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_index() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_index(dir.index()), Some(dir));
        }
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn traversals_start_from_the_far_side() {
        assert_eq!(Direction::Right.traversals().0, [3, 2, 1, 0]);
        assert_eq!(Direction::Left.traversals().0, [0, 1, 2, 3]);
        assert_eq!(Direction::Down.traversals().1, [3, 2, 1, 0]);
        assert_eq!(Direction::Up.traversals().1, [0, 1, 2, 3]);
    }

    #[test]
    fn step_stops_at_edges() {
        assert_eq!(Position::new(0, 0).step(Direction::Left), None);
        assert_eq!(Position::new(0, 0).step(Direction::Up), None);
        assert_eq!(Position::new(3, 3).step(Direction::Right), None);
        assert_eq!(Position::new(3, 3).step(Direction::Down), None);
        assert_eq!(Position::new(1, 2).step(Direction::Up), Some(Position::new(1, 1)));
    }

    #[test]
    fn position_index_is_row_major() {
        assert_eq!(Position::new(3, 0).index(), 3);
        assert_eq!(Position::new(0, 1).index(), 4);
        assert_eq!(Position::from_index(14), Position::new(2, 3));
    }
}
