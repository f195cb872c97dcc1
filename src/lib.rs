//! zero-go: a small-board Go engine for oracle-guided self-play.
//!
//! The crate holds the rules side of an AlphaZero-style training loop: a board
//! state machine with captures, ko and area scoring, and a PUCT tree search
//! that asks an external oracle (a trained network) for move priors and
//! values. The oracle itself, training, and distribution of games live
//! elsewhere.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, action layout and rule constants
//! - [`board`] - Colors, stones, coordinates, moves and their text form
//! - [`groups`] - Stone groups and liberties with copy-on-write sharing
//! - [`position`] - Board state, legality, move execution, oracle input
//! - [`scoring`] - Area scoring and the dead-stone heuristic
//! - [`game`] - Valid actions, transitions and game-end detection
//! - [`symmetry`] - The eight board symmetries
//! - [`oracle`] - The evaluation interface used by the search
//! - [`mcts`] - Monte Carlo Tree Search (PUCT)
//! - [`record`] - SGF game records
//! - [`config`] - TOML configuration
//!
//! ## Example
//!
//! ```
//! use zero_go::config::EngineConfig;
//! use zero_go::game::{GameMode, GoGame};
//! use zero_go::mcts::Mcts;
//! use zero_go::oracle::UniformOracle;
//!
//! let config = EngineConfig::for_testing();
//! let game = GoGame::new(GameMode::SelfPlay, &config);
//! let pos = game.init_position();
//!
//! let mut mcts = Mcts::with_seed(game, UniformOracle, config.search, 7);
//! let probs = mcts.get_action_prob(&pos, 1.0, true).unwrap();
//! assert_eq!(probs.len(), mcts.game().action_size());
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod game;
pub mod groups;
pub mod mcts;
pub mod oracle;
pub mod position;
pub mod record;
pub mod scoring;
pub mod symmetry;
