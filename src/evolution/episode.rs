use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::engine::{Direction, Game, GameHost, LiveGame};
use crate::policy::{MoveHistory, Policy, Proposal};

/// Outcome of one complete game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpisodeResult {
    pub score: u64,
    pub moves: u64,
    pub highest_tile: u32,
}

/// Submit `proposal` to the host, falling through its attempts until one
/// moves the board. Returns the direction that moved, or `None` if none did.
pub fn apply_proposal<H: GameHost + ?Sized>(host: &mut H, proposal: Proposal) -> Option<Direction> {
    proposal.attempts().into_iter().find(|&dir| host.try_move(dir))
}

/// Play one fresh game to the end with `policy`.
///
/// The board's spawns and the policy's own randomness both derive from
/// `rng`. `max_moves` caps the episode length.
pub fn play_episode<P, R>(policy: &mut P, rng: &mut R, max_moves: Option<u64>) -> EpisodeResult
where
    P: Policy,
    R: Rng + ?Sized,
{
    play_episode_observed(policy, rng, max_moves, |_, _| {})
}

/// [`play_episode`], calling `observe` after every successful move.
pub fn play_episode_observed<P, R, F>(policy: &mut P, rng: &mut R, max_moves: Option<u64>, mut observe: F) -> EpisodeResult
where
    P: Policy,
    R: Rng + ?Sized,
    F: FnMut(Direction, &Game),
{
    let mut host = LiveGame::new(StdRng::seed_from_u64(rng.gen()));
    let mut history = MoveHistory::new();
    let mut moves = 0u64;
    while !host.is_over() {
        if max_moves.is_some_and(|cap| moves >= cap) {
            break;
        }
        let proposal = policy.propose(host.game(), history.as_slice(), rng);
        let Some(dir) = apply_proposal(&mut host, proposal) else { break };
        history.push(dir);
        moves += 1;
        observe(dir, host.game());
    }
    let result = EpisodeResult { score: host.score(), moves, highest_tile: host.game().highest_tile() };
    log::trace!("episode finished: {result:?}");
    result
}
