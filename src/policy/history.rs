use crate::engine::Direction;

/// Length past which the history is trimmed.
pub const HISTORY_CAP: usize = 200;

/// Oldest entries dropped by one trim.
pub const HISTORY_DROP: usize = 100;

/// Directions that actually moved the board, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    moves: Vec<Direction>,
}

impl MoveHistory {
    pub fn new() -> Self { MoveHistory { moves: Vec::with_capacity(HISTORY_CAP + 1) } }

    /// Record a successful move; keeps only recent context once the
    /// history grows past [`HISTORY_CAP`].
    pub fn push(&mut self, dir: Direction) {
        self.moves.push(dir);
        if self.moves.len() > HISTORY_CAP {
            self.moves.drain(..HISTORY_DROP);
        }
    }

    pub fn clear(&mut self) { self.moves.clear(); }

    #[inline]
    pub fn as_slice(&self) -> &[Direction] { &self.moves }

    #[inline]
    pub fn len(&self) -> usize { self.moves.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.moves.is_empty() }

    pub fn last(&self) -> Option<Direction> { self.moves.last().copied() }
}
