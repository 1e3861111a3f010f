use std::sync::OnceLock;

use crate::engine::{Game, Position, CELLS};

/// One scalar feature of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Number of empty cells.
    EmptyCount,
    /// 1 if the cell at this row-major index is empty, else 0.
    CellEmpty(usize),
    /// log2 of the tile value at this row-major index, 0 if empty.
    CellLog2(usize),
    /// Cumulative merge score.
    Score,
}

impl Feature {
    pub fn value(self, game: &Game) -> f64 {
        let grid = game.grid();
        match self {
            Feature::EmptyCount => (CELLS - grid.tile_count()) as f64,
            Feature::CellEmpty(idx) => {
                if grid.is_available(Position::from_index(idx)) { 1.0 } else { 0.0 }
            }
            Feature::CellLog2(idx) => grid.cell(Position::from_index(idx)).map_or(0.0, |t| t.log2() as f64),
            Feature::Score => game.score() as f64,
        }
    }
}

/// Length of the feature list, and therefore of every gene vector.
pub const FEATURE_COUNT: usize = 2 + 2 * CELLS;

static FEATURES: OnceLock<Box<[Feature]>> = OnceLock::new();

/// The fixed, ordered feature list.
pub fn features() -> &'static [Feature] {
    FEATURES
        .get_or_init(|| {
            let mut v = Vec::with_capacity(FEATURE_COUNT);
            v.push(Feature::EmptyCount);
            v.extend((0..CELLS).map(Feature::CellEmpty));
            v.extend((0..CELLS).map(Feature::CellLog2));
            v.push(Feature::Score);
            v.into_boxed_slice()
        })
        .as_ref()
}

/// Feature values for `game`, in [`features`] order.
pub fn feature_vector(game: &Game) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    for (slot, feature) in out.iter_mut().zip(features()) {
        *slot = feature.value(game);
    }
    out
}

/// Dot product of `genes` with the feature vector of `game`.
///
/// Callers guarantee `genes.len() == FEATURE_COUNT`; gene vectors are
/// length-checked when a weighted policy is built.
#[inline]
pub fn evaluate(genes: &[i32], game: &Game) -> f64 {
    debug_assert_eq!(genes.len(), FEATURE_COUNT);
    genes
        .iter()
        .zip(features())
        .map(|(&g, feature)| if g == 0 { 0.0 } else { g as f64 * feature.value(game) })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_list_layout() {
        let f = features();
        assert_eq!(f.len(), FEATURE_COUNT);
        assert_eq!(f[0], Feature::EmptyCount);
        assert_eq!(f[1], Feature::CellEmpty(0));
        assert_eq!(f[16], Feature::CellEmpty(15));
        assert_eq!(f[17], Feature::CellLog2(0));
        assert_eq!(f[32], Feature::CellLog2(15));
        assert_eq!(f[33], Feature::Score);
    }

    #[test]
    fn feature_vector_reads_cells_row_major() {
        let game = Game::from_rows([[2, 0, 0, 0], [0, 0, 0, 8], [0; 4], [0, 0, 0, 1024]]);
        let v = feature_vector(&game);
        assert_eq!(v[0], 13.0);
        assert_eq!(v[1], 0.0);
        assert_eq!(v[2], 1.0);
        assert_eq!(v[1 + 7], 0.0);
        assert_eq!(v[17], 1.0);
        assert_eq!(v[17 + 7], 3.0);
        assert_eq!(v[17 + 15], 10.0);
        assert_eq!(v[33], 0.0);
    }

    #[test]
    fn evaluate_is_a_dot_product() {
        let game = Game::from_rows([[4, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut genes = vec![0; FEATURE_COUNT];
        genes[0] = 2;
        genes[17] = 3;
        genes[18] = -1;
        // 2 * 14 empties + 3 * log2(4) - 1 * log2(4)
        assert_eq!(evaluate(&genes, &game), 28.0 + 6.0 - 2.0);
        let v = feature_vector(&game);
        let dot: f64 = genes.iter().zip(v.iter()).map(|(&g, &x)| g as f64 * x).sum();
        assert_eq!(evaluate(&genes, &game), dot);
    }
}
