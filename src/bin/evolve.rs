use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use evo_2048::checkpoint::Checkpoint;
use evo_2048::engine::{GameHost, LiveGame};
use evo_2048::evolution::{play_episode_observed, EvolutionConfig, GenerationSummary, Population, Tick};
use evo_2048::logging;
use evo_2048::policy::{Baseline, Candidate, Policy, PolicyKind};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = logging::init(logging::default_spec(args.quiet))?;
    match args.cmd {
        Cmd::Train(train) => run_train(train, args.quiet),
        Cmd::Play(play) => run_play(play),
    }
}

#[derive(Debug, Parser)]
#[command(name = "evolve", about = "Evolve and replay 2048 move policies")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
    /// Only log warnings and hide the progress bar
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Run the evolutionary search
    Train(TrainArgs),
    /// Play games with an evolved candidate or a baseline
    Play(PlayArgs),
}

#[derive(Debug, clap::Args)]
struct TrainArgs {
    /// JSON config file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Generations to run
    #[arg(long, default_value_t = 10)]
    generations: u64,
    #[arg(long)]
    population: Option<usize>,
    /// Episodes averaged into each candidate's fitness
    #[arg(long)]
    episodes: Option<u32>,
    #[arg(long, value_enum)]
    kind: Option<PolicyKind>,
    #[arg(long)]
    seed: Option<u64>,
    /// Write a checkpoint here after every generation
    #[arg(long)]
    out: Option<PathBuf>,
    /// Continue from a checkpoint instead of a random genesis; the
    /// checkpoint's own config is used
    #[arg(long, conflicts_with_all = ["config", "population", "episodes", "kind"])]
    resume: Option<PathBuf>,
    /// Evaluate candidates in parallel instead of tick by tick on one board
    #[arg(long)]
    parallel: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BaselineArg {
    Random,
    Priority,
    Alternating,
}

#[derive(Debug, clap::Args)]
struct PlayArgs {
    /// Play the fittest member of this checkpoint
    #[arg(long, conflicts_with = "baseline")]
    checkpoint: Option<PathBuf>,
    /// Play a fixed reference strategy
    #[arg(long, value_enum, default_value = "priority")]
    baseline: BaselineArg,
    #[arg(long, default_value_t = 1)]
    games: u32,
    #[arg(long)]
    seed: Option<u64>,
    /// Print the board after every move
    #[arg(long)]
    show: bool,
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn load_config(args: &TrainArgs) -> anyhow::Result<EvolutionConfig> {
    let mut cfg = match &args.config {
        Some(path) => EvolutionConfig::from_json_path(path).with_context(|| format!("reading {}", path.display()))?,
        None => EvolutionConfig::default(),
    };
    if let Some(n) = args.population {
        cfg.population_size = n;
    }
    if let Some(n) = args.episodes {
        cfg.episodes_per_candidate = n;
    }
    if let Some(kind) = args.kind {
        cfg.policy_kind = kind;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run_train(args: TrainArgs, quiet: bool) -> anyhow::Result<()> {
    let (mut population, mut rng) = match &args.resume {
        Some(path) => {
            let ckpt = Checkpoint::read_from_path(path).with_context(|| format!("reading {}", path.display()))?;
            let rng = seeded(args.seed.or(ckpt.config.seed));
            (ckpt.into_population()?, rng)
        }
        None => {
            let cfg = load_config(&args)?;
            let mut rng = seeded(cfg.seed);
            (Population::random(cfg, &mut rng)?, rng)
        }
    };
    log::info!(
        "training {} {:?} candidates from generation {}",
        population.members().len(),
        population.config().policy_kind,
        population.generation()
    );

    let pb = if quiet { ProgressBar::hidden() } else { ProgressBar::new(args.generations) };
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} gen | {elapsed_precise} | {msg}")?);
    let mut host = LiveGame::new(StdRng::seed_from_u64(rng.gen()));
    for _ in 0..args.generations {
        let summary = if args.parallel {
            population.evaluate_parallel(&mut rng)
        } else {
            run_generation(&mut population, &mut host, &mut rng)?
        };
        pb.set_message(format!("best {:.0} | mean {:.0}", summary.best_fitness, summary.mean_fitness));
        pb.inc(1);
        if let Some(out) = &args.out {
            save(&population, out)?;
        }
    }
    pb.finish_and_clear();
    if let Some(best) = population.members().iter().max_by(|a, b| a.fitness.total_cmp(&b.fitness)) {
        println!("Generation {} | best fitness {:.1}", population.generation(), best.fitness);
    }
    Ok(())
}

/// Drive one generation tick by tick on a single live board.
fn run_generation<H: GameHost, R: Rng>(population: &mut Population, host: &mut H, rng: &mut R) -> anyhow::Result<GenerationSummary> {
    loop {
        match population.tick(host, rng)? {
            Tick::GameOver { summary: Some(summary), .. } => {
                host.restart();
                return Ok(summary);
            }
            Tick::GameOver { .. } | Tick::AwaitingRestart => host.restart(),
            Tick::Moved(_) => {}
        }
    }
}

fn save(population: &Population, out: &Path) -> anyhow::Result<()> {
    population
        .to_checkpoint()
        .write_to_path(out)
        .with_context(|| format!("writing {}", out.display()))
}

fn run_play(args: PlayArgs) -> anyhow::Result<()> {
    let mut rng = seeded(args.seed);
    match &args.checkpoint {
        Some(path) => {
            let ckpt = Checkpoint::read_from_path(path).with_context(|| format!("reading {}", path.display()))?;
            let best = ckpt
                .members
                .iter()
                .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
                .context("checkpoint has no members")?;
            log::info!("playing fittest member of generation {} (fitness {:.1})", ckpt.generation, best.fitness);
            let mut candidate: Candidate = best.candidate.clone();
            play_games(&mut candidate, &args, &mut rng);
        }
        None => {
            let mut baseline = match args.baseline {
                BaselineArg::Random => Baseline::Random,
                BaselineArg::Priority => Baseline::corner(),
                BaselineArg::Alternating => Baseline::alternating(),
            };
            log::info!("playing baseline {}", baseline.name());
            play_games(&mut baseline, &args, &mut rng);
        }
    }
    Ok(())
}

fn play_games<P: Policy>(policy: &mut P, args: &PlayArgs, rng: &mut StdRng) {
    let mut total = 0u64;
    for game in 0..args.games {
        let result = play_episode_observed(policy, rng, None, |dir, board| {
            if args.show {
                println!("{dir}\n{}", board.grid());
            }
        });
        total += result.score;
        println!(
            "Game {}: score {} | moves {} | highest tile {}",
            game + 1,
            result.score,
            result.moves,
            result.highest_tile
        );
    }
    if args.games > 0 {
        println!("Mean score: {:.1}", total as f64 / args.games as f64);
    }
}
