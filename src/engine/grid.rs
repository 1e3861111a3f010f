use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{format_val, Direction, Position, SIZE};

/// A single tile on the grid.
///
/// `merged_from` holds the two source positions while a move pass is
/// running, and blocks a merged tile from merging again in that pass. Every
/// tile on a grid at rest has `merged_from == None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub value: u32,
    pub position: Position,
    pub merged_from: Option<[Position; 2]>,
}

impl Tile {
    pub fn new(position: Position, value: u32) -> Self { Tile { value, position, merged_from: None } }

    pub(crate) fn merged(position: Position, value: u32, sources: [Position; 2]) -> Self {
        Tile { value, position, merged_from: Some(sources) }
    }

    /// Base-2 logarithm of the value (tile values are powers of two).
    #[inline]
    pub fn log2(&self) -> u32 { self.value.trailing_zeros() }
}

/// Plain-data tile record used in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileState {
    pub position: Position,
    pub value: u32,
}

/// Value-semantics copy of a grid: its size plus every occupied cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: usize,
    pub tiles: Vec<TileState>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot size {found} does not match board size {expected}")]
    Size { expected: usize, found: usize },
    #[error("tile position ({}, {}) is outside the board", .0.x, .0.y)]
    OutOfBounds(Position),
    #[error("two tiles occupy ({}, {})", .0.x, .0.y)]
    Duplicate(Position),
    #[error("tile value {value} at ({}, {}) is not a power of two >= 2", .position.x, .position.y)]
    InvalidValue { position: Position, value: u32 },
}

/// A 4x4 array of optional tiles, indexed `cells[x][y]`.
///
/// At most one tile occupies a cell, and a stored tile's `position` always
/// equals the cell holding it.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Grid {
    cells: [[Option<Tile>; SIZE]; SIZE],
}

impl Grid {
    pub fn empty() -> Self { Grid::default() }

    /// Build a grid from row-major values (`rows[y][x]`), 0 meaning empty.
    ///
    /// Non-zero values go through the same checks as [`Grid::from_snapshot`].
    pub fn try_from_rows(rows: [[u32; SIZE]; SIZE]) -> Result<Self, SnapshotError> {
        let tiles = rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| row.iter().enumerate().map(move |(x, &value)| (Position::new(x, y), value)))
            .filter(|&(_, value)| value != 0)
            .map(|(position, value)| TileState { position, value })
            .collect();
        Grid::from_snapshot(&GridSnapshot { size: SIZE, tiles })
    }

    /// [`Grid::try_from_rows`] for literal boards.
    ///
    /// # Panics
    ///
    /// If a non-zero value is not a power of two >= 2.
    pub fn from_rows(rows: [[u32; SIZE]; SIZE]) -> Self {
        match Grid::try_from_rows(rows) {
            Ok(grid) => grid,
            Err(err) => panic!("invalid board literal: {err}"),
        }
    }

    /// Row-major values (`rows[y][x]`), 0 meaning empty.
    pub fn to_rows(&self) -> [[u32; SIZE]; SIZE] {
        let mut rows = [[0; SIZE]; SIZE];
        for tile in self.tiles() {
            rows[tile.position.y][tile.position.x] = tile.value;
        }
        rows
    }

    #[inline]
    pub fn size(&self) -> usize { SIZE }

    #[inline]
    pub fn cell(&self, pos: Position) -> Option<&Tile> {
        if !pos.within_bounds() { return None; }
        self.cells[pos.x][pos.y].as_ref()
    }

    /// Value at `pos`, 0 if empty.
    #[inline]
    pub fn value_at(&self, pos: Position) -> u32 { self.cell(pos).map_or(0, |t| t.value) }

    #[inline]
    pub fn is_available(&self, pos: Position) -> bool { pos.within_bounds() && self.cells[pos.x][pos.y].is_none() }

    /// Empty cells in row-major order.
    pub fn available_cells(&self) -> Vec<Position> {
        (0..SIZE * SIZE)
            .map(Position::from_index)
            .filter(|&p| self.is_available(p))
            .collect()
    }

    pub fn cells_available(&self) -> bool { self.tile_count() < SIZE * SIZE }

    /// A uniformly chosen empty cell, or `None` when the grid is full.
    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        self.available_cells().choose(rng).copied()
    }

    /// Place `tile` at its own position, replacing any occupant.
    pub fn insert_tile(&mut self, tile: Tile) {
        let Position { x, y } = tile.position;
        self.cells[x][y] = Some(tile);
    }

    pub fn remove_tile(&mut self, pos: Position) -> Option<Tile> {
        if !pos.within_bounds() { return None; }
        self.cells[pos.x][pos.y].take()
    }

    /// Occupied tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        (0..SIZE * SIZE).filter_map(move |idx| self.cell(Position::from_index(idx)))
    }

    pub fn tile_count(&self) -> usize { self.tiles().count() }

    pub fn tile_sum(&self) -> u64 { self.tiles().map(|t| t.value as u64).sum() }

    pub fn highest_tile(&self) -> u32 { self.tiles().map(|t| t.value).max().unwrap_or(0) }

    /// Scan from `cell` along `dir` while the next cell is on the board and
    /// empty. Returns the farthest empty cell reached and the blocking cell
    /// (`None` when the scan stopped at the edge).
    pub fn find_farthest_position(&self, cell: Position, dir: Direction) -> (Position, Option<Position>) {
        let mut farthest = cell;
        loop {
            match farthest.step(dir) {
                Some(next) if self.is_available(next) => farthest = next,
                next => return (farthest, next),
            }
        }
    }

    /// True if any two orthogonally adjacent tiles share a value.
    pub fn tile_matches_available(&self) -> bool {
        self.tiles().any(|tile| {
            [Direction::Right, Direction::Down]
                .into_iter()
                .filter_map(|dir| tile.position.step(dir))
                .any(|p| self.value_at(p) == tile.value)
        })
    }

    /// End a move pass: merged tiles may merge again on the next move.
    pub(crate) fn clear_merges(&mut self) {
        for tile in self.cells.iter_mut().flatten().flatten() {
            tile.merged_from = None;
        }
    }

    pub(crate) fn move_tile(&mut self, from: Position, to: Position) {
        if let Some(mut tile) = self.remove_tile(from) {
            tile.position = to;
            self.insert_tile(tile);
        }
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            size: SIZE,
            tiles: self.tiles().map(|t| TileState { position: t.position, value: t.value }).collect(),
        }
    }

    /// Rebuild a grid from a snapshot, rejecting anything the live board
    /// could not contain.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.size != SIZE {
            return Err(SnapshotError::Size { expected: SIZE, found: snapshot.size });
        }
        let mut grid = Grid::empty();
        for state in &snapshot.tiles {
            let TileState { position, value } = *state;
            if !position.within_bounds() {
                return Err(SnapshotError::OutOfBounds(position));
            }
            if value < 2 || !value.is_power_of_two() {
                return Err(SnapshotError::InvalidValue { position, value });
            }
            if !grid.is_available(position) {
                return Err(SnapshotError::Duplicate(position));
            }
            grid.insert_tile(Tile::new(position, value));
        }
        Ok(grid)
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid").field("rows", &self.to_rows()).finish()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.to_rows();
        writeln!(f)?;
        for (i, row) in rows.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
            if i + 1 < rows.len() {
                writeln!(f, "-------------------------------")?;
            }
        }
        Ok(())
    }
}
