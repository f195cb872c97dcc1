//! zero-go: small-board Go with oracle-guided tree search.
//!
//! ## Usage
//!
//! - `zero-go` - Show a demo
//! - `zero-go selfplay` - Play one self-play game and print it as SGF
//! - `zero-go arena` - Play two searchers against each other
//! - `zero-go score 24 49 49` - Replay actions and print the score
//!
//! No trained network ships with this binary; the search uses uniform priors.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use zero_go::board::{Color, Move, RowOrigin, format_coord};
use zero_go::config::{EngineConfig, load_config};
use zero_go::game::{GameMode, GameResult, GoGame};
use zero_go::mcts::{Mcts, sample_action};
use zero_go::oracle::UniformOracle;
use zero_go::position::Position;
use zero_go::record::GameRecord;
use zero_go::symmetry::Symmetry;

/// zero-go: a small-board Go engine for self-play experiments
#[derive(Parser)]
#[command(name = "zero-go")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file (defaults to $ZERO_GO_CONFIG, then built-in values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for all randomness
    #[arg(long, global = true, default_value_t = 0)]
    seed: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one self-play game and print it as SGF
    Selfplay {
        /// Moves played with temperature 1 before switching to greedy play
        #[arg(long, default_value_t = 8)]
        temp_threshold: usize,
    },
    /// Play two independently seeded searchers against each other
    Arena,
    /// Replay a list of actions (row * N + col, N * N for pass) and score it
    Score {
        actions: Vec<usize>,
    },
    /// Run a short demo of the engine
    Demo,
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = load_config(cli.config.as_deref())?;
    info!(seed = cli.seed, "configuration loaded");

    match cli.command {
        Some(Commands::Selfplay { temp_threshold }) => {
            run_selfplay(&config, cli.seed, temp_threshold)
        }
        Some(Commands::Arena) => run_arena(&config, cli.seed),
        Some(Commands::Score { actions }) => run_score(&config, &actions),
        Some(Commands::Demo) | None => run_demo(&config, cli.seed),
    }
}

fn print_result(result: &GameResult) {
    let winner = match result.winner {
        Some(Color::Black) => "Black",
        Some(Color::White) => "White",
        None => "nobody",
    };
    println!(
        "Black {:.1}, White {:.1}: {winner} wins",
        result.score.black, result.score.white
    );
}

fn run_selfplay(config: &EngineConfig, seed: u64, temp_threshold: usize) -> Result<()> {
    let game = GoGame::new(GameMode::SelfPlay, config);
    let mut pos = game.init_position();
    let mut mcts = Mcts::with_seed(game.clone(), UniformOracle, config.search.clone(), seed);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut examples = Vec::new();

    let result = loop {
        if let Some(result) = game.game_ended(&pos) {
            break result;
        }
        let temp = if pos.history().len() < temp_threshold { 1.0 } else { 0.0 };
        let probs = mcts.get_action_prob(&pos, temp, true)?;
        examples.extend(Symmetry::augment(&pos.encode_input(), &probs));
        let action = sample_action(&probs, &mut rng).context("search returned no move")?;
        pos = game.next_state(&pos, action)?;
    };
    info!(
        moves = pos.history().len(),
        examples = examples.len(),
        "self-play game finished"
    );

    println!("{}", GameRecord::from_position(&pos).to_sgf());
    println!("{pos}");
    print_result(&result);
    Ok(())
}

fn run_arena(config: &EngineConfig, seed: u64) -> Result<()> {
    let game = GoGame::new(GameMode::Arena, config);
    let mut black = Mcts::with_seed(game.clone(), UniformOracle, config.search.clone(), seed);
    let mut white = Mcts::with_seed(
        game.clone(),
        UniformOracle,
        config.search.clone(),
        seed.wrapping_add(1),
    );
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(2));
    let mut pos = game.init_position();

    let result = loop {
        if let Some(result) = game.game_ended(&pos) {
            break result;
        }
        let mcts = match pos.to_play() {
            Color::Black => &mut black,
            Color::White => &mut white,
        };
        let probs = mcts.get_action_prob(&pos, 0.0, true)?;
        let action = sample_action(&probs, &mut rng).context("search returned no move")?;
        pos = game.next_state(&pos, action)?;
    };

    let record = GameRecord::from_position(&pos).with_players("seed", "seed+1");
    println!("{}", record.to_sgf());
    println!("{pos}");
    print_result(&result);
    Ok(())
}

fn run_score(config: &EngineConfig, actions: &[usize]) -> Result<()> {
    let game = GoGame::new(GameMode::Arena, config);
    let mut pos = game.init_position();
    for &action in actions {
        if action >= game.action_size() {
            bail!("action {action} is out of range 0..{}", game.action_size());
        }
        pos = game.next_state(&pos, action)?;
    }
    println!("{pos}");
    let score = game.score(&pos);
    println!("Black {:.1}, White {:.1}", score.black, score.white);
    Ok(())
}

fn run_demo(config: &EngineConfig, seed: u64) -> Result<()> {
    println!("zero-go: small-board Go with tree search\n");

    println!("=== Board Demo ===");
    let mut pos = Position::new();
    let center = Move::from_action(zero_go::constants::AREA / 2).context("center action")?;
    pos.execute_move(center, Color::Black)?;
    println!("Black plays {}", format_coord(center, RowOrigin::Bottom));
    println!("{pos}");

    println!("=== Search Demo ===");
    let game = GoGame::new(GameMode::Arena, config);
    let mut mcts = Mcts::with_seed(game.clone(), UniformOracle, config.search.clone(), seed);
    let probs = mcts.get_action_prob(&pos, 0.0, true)?;
    let action = probs
        .iter()
        .position(|&p| p > 0.0)
        .context("search returned no move")?;
    let reply = Move::from_action(action).context("action out of range")?;
    println!(
        "White replies {} after {} simulations",
        format_coord(reply, RowOrigin::Bottom),
        mcts.node_visits(&pos)
    );
    let score = game.score(&pos);
    println!("Score now: Black {:.1}, White {:.1}", score.black, score.white);
    Ok(())
}
