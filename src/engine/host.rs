use rand::Rng;

use super::{Direction, Game, GameSnapshot};

/// The live game as seen by the decision subsystem.
///
/// Policies never receive a reference to the host's board; they work on a
/// [`GameSnapshot`] copy.
pub trait GameHost {
    /// Attempt a move; true if the board changed.
    fn try_move(&mut self, dir: Direction) -> bool;
    fn is_over(&self) -> bool;
    fn score(&self) -> u64;
    fn snapshot(&self) -> GameSnapshot;
    /// True while at least one direction would change the board.
    fn moves_available(&self) -> bool;
    fn restart(&mut self);
}

/// In-process host: a [`Game`] driven by its own random source.
#[derive(Debug, Clone)]
pub struct LiveGame<R> {
    game: Game,
    rng: R,
}

impl<R: Rng> LiveGame<R> {
    pub fn new(mut rng: R) -> Self {
        let game = Game::new(&mut rng);
        LiveGame { game, rng }
    }

    /// Host an existing game (e.g. a hand-built position).
    pub fn with_game(game: Game, rng: R) -> Self { LiveGame { game, rng } }

    #[inline]
    pub fn game(&self) -> &Game { &self.game }
}

impl<R: Rng> GameHost for LiveGame<R> {
    fn try_move(&mut self, dir: Direction) -> bool { self.game.move_dir(dir, &mut self.rng) }

    fn is_over(&self) -> bool { self.game.is_over() }

    fn score(&self) -> u64 { self.game.score() }

    fn snapshot(&self) -> GameSnapshot { self.game.snapshot() }

    fn moves_available(&self) -> bool { self.game.moves_available() }

    fn restart(&mut self) { self.game.restart(&mut self.rng); }
}
