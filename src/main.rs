use evo_2048::engine::Game;
use evo_2048::policy::{Lookahead, WeightedPolicy};

fn main() {
    let policy = WeightedPolicy::hand_tuned();
    let mut lookahead = Lookahead::new(policy.genes());
    let mut rng = rand::thread_rng();
    let mut game = Game::new(&mut rng);
    println!("{}", game.grid());
    let mut move_count = 0u64;
    let mut nodes = 0u64;
    while !game.is_over() {
        let Some(direction) = lookahead.best_move(&game, &mut rng) else { break };
        nodes += lookahead.last_stats().nodes;
        move_count += 1;
        game.apply(direction, &mut rng);
        println!("{direction}\n{}", game.grid());
    }
    println!(
        "Moves made: {}, Score: {}, Highest tile: {}, Won: {}, Boards evaluated: {}",
        move_count,
        game.score(),
        game.highest_tile(),
        game.won(),
        nodes
    );
}
