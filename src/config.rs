//! Engine configuration.
//!
//! Every section has defaults, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [search]
//! num_full_search_sims = 200
//!
//! [game]
//! enforce_superko = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::constants::MAX_MOVES;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "ZERO_GO_CONFIG";

// =============================================================================
// Search
// =============================================================================

/// Parameters of the tree search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Exploration constant in the PUCT formula.
    pub c_puct: f32,

    /// Simulations per move in a full search.
    pub num_full_search_sims: u32,

    /// Simulations per move in a fast search.
    pub num_fast_search_sims: u32,

    /// Dirichlet noise concentration at the self-play root.
    /// Small values put most of the noise on a few moves.
    pub dirichlet_alpha: f32,

    /// Fraction of the root prior replaced by noise.
    pub dirichlet_epsilon: f32,

    /// Evaluate leaves under a random board symmetry.
    pub random_symmetry: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            c_puct: 1.0,
            num_full_search_sims: 100,
            num_fast_search_sims: 25,
            dirichlet_alpha: 0.03,
            dirichlet_epsilon: 0.25,
            random_symmetry: true,
        }
    }
}

impl SearchConfig {
    /// Small, noise-free config for tests.
    pub fn for_testing() -> Self {
        Self {
            num_full_search_sims: 32,
            num_fast_search_sims: 8,
            dirichlet_epsilon: 0.0,
            random_symmetry: false,
            ..Self::default()
        }
    }

    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Set both simulation counts.
    pub fn with_simulations(mut self, full: u32, fast: u32) -> Self {
        self.num_full_search_sims = full;
        self.num_fast_search_sims = fast;
        self
    }

    pub fn with_noise(mut self, alpha: f32, epsilon: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.dirichlet_epsilon = epsilon;
        self
    }

    pub fn with_random_symmetry(mut self, on: bool) -> Self {
        self.random_symmetry = on;
        self
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Parameters of the dead-stone pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Run the dead-stone pass at all.
    pub dead_stones: bool,

    /// Moves that must have been played before the pass runs.
    pub dead_stone_min_moves: usize,

    /// A region is dead when the invader survives in at most this fraction
    /// of the fill orderings.
    pub stay_alive_threshold: f32,

    /// Regions with more contested points are left alone.
    pub max_contested: usize,

    /// Regions with at most this many contested points are dead outright.
    pub immediately_dead: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            dead_stones: true,
            dead_stone_min_moves: 20,
            stay_alive_threshold: 0.4,
            max_contested: 5,
            immediately_dead: 2,
        }
    }
}

impl ScoringConfig {
    pub fn with_dead_stones(mut self, on: bool) -> Self {
        self.dead_stones = on;
        self
    }

    pub fn with_dead_stone_min_moves(mut self, moves: usize) -> Self {
        self.dead_stone_min_moves = moves;
        self
    }

    pub fn with_stay_alive_threshold(mut self, threshold: f32) -> Self {
        self.stay_alive_threshold = threshold;
        self
    }
}

// =============================================================================
// Game
// =============================================================================

/// When games end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Hard cap on the number of moves.
    pub move_cap: usize,

    /// Self-play games never end before this many moves.
    pub selfplay_min_moves: usize,

    /// Self-play ends once a lead exceeds `margin_factor * (N*N + komi)`.
    pub margin_factor: f32,

    /// Arena games forbid passing before this many moves.
    pub arena_min_moves_before_pass: usize,

    /// Reject moves that recreate an earlier board.
    pub enforce_superko: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_cap: MAX_MOVES,
            selfplay_min_moves: 4,
            margin_factor: 0.5,
            arena_min_moves_before_pass: 5,
            enforce_superko: false,
        }
    }
}

impl GameConfig {
    pub fn with_move_cap(mut self, cap: usize) -> Self {
        self.move_cap = cap;
        self
    }

    pub fn with_superko(mut self, on: bool) -> Self {
        self.enforce_superko = on;
        self
    }
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub scoring: ScoringConfig,
    pub game: GameConfig,
}

impl EngineConfig {
    pub fn for_testing() -> Self {
        Self {
            search: SearchConfig::for_testing(),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }
}

/// Parse a config from TOML text.
pub fn from_toml_str(text: &str) -> Result<EngineConfig> {
    toml::from_str(text).context("invalid engine config")
}

/// Load a config file. Unlike a missing optional file, a broken one is an error.
pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    from_toml_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

/// Load the config from `explicit`, else from `$ZERO_GO_CONFIG`, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            load_from_path(&path)
        }
        None => {
            debug!("No config file given, using built-in defaults");
            Ok(EngineConfig::default())
        }
    }
}
