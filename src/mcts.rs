//! Monte Carlo Tree Search guided by an oracle (PUCT).
//!
//! Statistics are not kept in a tree of nodes but in a flat map keyed by the
//! board [`Signature`], with one slot per player to move. Transpositions
//! therefore share statistics. Everything a signature cannot see is checked
//! against the live position when a node is visited:
//! - the cached terminal value is only reused when the history facts that
//!   decide game end (move count, trailing passes) match, and
//! - the cached legality holds only what the board decides (occupied points
//!   and suicide); ko, superko and the pass rule are applied live, and priors
//!   are renormalized over the live valid moves.
//!
//! One simulation walks down from the root choosing the action with the
//! highest upper confidence bound until it reaches a terminal or unexpanded
//! position, then backs the value up the visited path, flipping its sign at
//! every ply.

use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Gamma};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::board::{Color, Coord, Move};
use crate::config::SearchConfig;
use crate::constants::{ACTION_SIZE, AREA, EPS, PASS_ACTION};
use crate::game::{GameMode, GameResult, GoGame};
use crate::oracle::{Oracle, OracleError};
use crate::position::{IllegalMove, Position, Signature};
use crate::symmetry::Symmetry;

/// Errors that abort a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),

    #[error("no legal moves available")]
    NoLegalMoves,
}

/// Statistics of one action from one node.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Edge {
    /// Mean backed-up value for the player choosing this action
    pub q: f32,
    /// Visit count
    pub n: u32,
}

/// The parts of the history that game end depends on besides the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct EndKey {
    moves: usize,
    last_pass: bool,
    two_passes: bool,
}

impl EndKey {
    fn of(pos: &Position) -> Self {
        EndKey {
            moves: pos.history().len(),
            last_pass: matches!(pos.last_move(), Some(Move::Pass)),
            two_passes: pos.ended_by_passes(),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct PlayerStats {
    /// Last terminal check: the history it was made for and the result for
    /// the player to move, `None` while the game goes on.
    outcome: Option<(EndKey, Option<f32>)>,
    /// Priors masked by `legal` and normalized. `None` until the oracle has
    /// been asked.
    priors: Option<Vec<f32>>,
    /// Moves the board alone allows: empty points that are not suicide, and pass.
    legal: Vec<bool>,
    visits: u32,
    edges: Vec<Edge>,
}

/// Per-signature statistics, one slot per player to move.
#[derive(Clone, Debug, Default)]
struct NodeStats {
    slots: [Option<PlayerStats>; 2],
}

/// One step of a simulation path.
struct Step {
    signature: Signature,
    player: Color,
    action: usize,
}

pub struct Mcts<O: Oracle, R: Rng = StdRng> {
    game: GoGame,
    oracle: O,
    config: SearchConfig,
    rng: R,
    stats: HashMap<Signature, NodeStats>,
}

impl<O: Oracle> Mcts<O, StdRng> {
    /// Search with a seeded standard RNG.
    pub fn with_seed(game: GoGame, oracle: O, config: SearchConfig, seed: u64) -> Self {
        Self::new(game, oracle, config, StdRng::seed_from_u64(seed))
    }
}

impl<O: Oracle, R: Rng> Mcts<O, R> {
    pub fn new(game: GoGame, oracle: O, config: SearchConfig, rng: R) -> Self {
        Mcts {
            game,
            oracle,
            config,
            rng,
            stats: HashMap::new(),
        }
    }

    pub fn game(&self) -> &GoGame {
        &self.game
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Drop all statistics.
    pub fn clear(&mut self) {
        self.stats.clear();
    }

    /// Number of distinct signatures seen.
    pub fn num_signatures(&self) -> usize {
        self.stats.len()
    }

    /// Visit counts of every action from `pos`, zero if never searched.
    pub fn visit_counts(&self, pos: &Position) -> Vec<u32> {
        match self.slot(&pos.signature(), pos.to_play()) {
            Some(stats) if stats.priors.is_some() => stats.edges.iter().map(|e| e.n).collect(),
            _ => vec![0; ACTION_SIZE],
        }
    }

    /// Total visits of `pos` as a search node.
    pub fn node_visits(&self, pos: &Position) -> u32 {
        self.slot(&pos.signature(), pos.to_play())
            .map_or(0, |s| s.visits)
    }

    /// Run simulations from `pos` and return the move distribution.
    ///
    /// `temp == 0` puts all mass on the most visited action (ties broken at
    /// random); otherwise visit counts are raised to `1 / temp` and normalized.
    pub fn get_action_prob(
        &mut self,
        pos: &Position,
        temp: f32,
        is_full_search: bool,
    ) -> Result<Vec<f32>, SearchError> {
        let sims = if is_full_search {
            self.config.num_full_search_sims
        } else {
            self.config.num_fast_search_sims
        };

        let player = pos.to_play();
        let signature = pos.signature();
        if self.outcome(signature, player, pos).is_some() {
            debug!(moves = pos.history().len(), "search root is terminal");
            return uniform_over(&self.game.valid_moves(pos));
        }
        if !self.is_expanded(&signature, player) {
            self.expand(pos, signature, player)?;
        }
        let noise = self.root_noise(pos);

        for sim in 0..sims {
            let value = self.simulate(pos, noise.as_deref())?;
            trace!(sim, value, "simulation done");
        }

        // Statistics shared through the signature may include actions that
        // are not valid in this exact position.
        let valid = self.game.valid_moves(pos);
        let counts: Vec<u32> = self
            .visit_counts(pos)
            .iter()
            .zip(&valid)
            .map(|(&n, &v)| if v { n } else { 0 })
            .collect();
        let total: u32 = counts.iter().sum();
        debug!(
            moves = pos.history().len(),
            sims,
            visits = total,
            signatures = self.stats.len(),
            "search finished"
        );

        if total == 0 {
            return uniform_over(&valid);
        }

        if temp == 0.0 {
            let max = counts.iter().copied().max().unwrap_or(0);
            let best: Vec<usize> = (0..ACTION_SIZE).filter(|&a| counts[a] == max).collect();
            let pick = *best.choose(&mut self.rng).ok_or(SearchError::NoLegalMoves)?;
            let mut probs = vec![0.0; ACTION_SIZE];
            probs[pick] = 1.0;
            return Ok(probs);
        }

        // Scale by the largest count first so large exponents stay finite.
        let max = counts.iter().copied().max().unwrap_or(1) as f64;
        let exponent = 1.0 / temp as f64;
        let weights: Vec<f64> = counts
            .iter()
            .map(|&n| (n as f64 / max).powf(exponent))
            .collect();
        let sum: f64 = weights.iter().sum();
        Ok(weights.iter().map(|&w| (w / sum) as f32).collect())
    }

    fn slot(&self, signature: &Signature, player: Color) -> Option<&PlayerStats> {
        self.stats.get(signature)?.slots[player.index()].as_ref()
    }

    fn slot_mut(&mut self, signature: &Signature, player: Color) -> Option<&mut PlayerStats> {
        self.stats.get_mut(signature)?.slots[player.index()].as_mut()
    }

    fn is_expanded(&self, signature: &Signature, player: Color) -> bool {
        self.slot(signature, player)
            .is_some_and(|s| s.priors.is_some())
    }

    /// Terminal value for the player to move, cached per signature and player.
    fn outcome(&mut self, signature: Signature, player: Color, pos: &Position) -> Option<f32> {
        let key = EndKey::of(pos);
        let game = &self.game;
        let stats = self.stats.entry(signature).or_default().slots[player.index()]
            .get_or_insert_with(PlayerStats::default);
        match stats.outcome {
            Some((cached, value)) if cached == key => value,
            _ => {
                let value = game.game_ended(pos).map(|r| r.value_for(player));
                stats.outcome = Some((key, value));
                value
            }
        }
    }

    /// Ask the oracle about a new leaf and store its priors.
    /// Returns the oracle's value for the player to move.
    fn expand(
        &mut self,
        pos: &Position,
        signature: Signature,
        player: Color,
    ) -> Result<f32, SearchError> {
        let symmetry = if self.config.random_symmetry {
            Symmetry::random(&mut self.rng)
        } else {
            Symmetry::identity()
        };
        let planes: Vec<_> = pos
            .encode_input()
            .iter()
            .map(|p| symmetry.apply_plane(p))
            .collect();
        let eval = self.oracle.evaluate(&planes)?.validate()?;
        let raw = symmetry.unmap_policy(&eval.priors);

        let legal = board_legal(pos);
        if masked_priors(&raw, &self.live_valid(pos, &legal)).is_none() {
            warn!(
                moves = pos.history().len(),
                "all valid moves were masked, using uniform priors"
            );
        }
        let priors = masked_priors(&raw, &legal)
            .or_else(|| uniform_over(&legal).ok())
            .ok_or(SearchError::NoLegalMoves)?;

        let slot = &mut self.stats.entry(signature).or_default().slots[player.index()];
        let outcome = slot.as_ref().and_then(|s| s.outcome);
        *slot = Some(PlayerStats {
            outcome,
            priors: Some(priors),
            legal,
            visits: 0,
            edges: vec![Edge::default(); ACTION_SIZE],
        });
        Ok(eval.value)
    }

    /// Dirichlet noise over the root's valid actions, self-play only.
    fn root_noise(&mut self, pos: &Position) -> Option<Vec<f32>> {
        if self.game.mode() != GameMode::SelfPlay || self.config.dirichlet_epsilon <= 0.0 {
            return None;
        }
        let valid = self.valid_at(pos)?;
        let indices: Vec<usize> = (0..ACTION_SIZE).filter(|&a| valid[a]).collect();
        let sample = dirichlet(indices.len(), self.config.dirichlet_alpha, &mut self.rng)?;
        let mut noise = vec![0.0; ACTION_SIZE];
        for (&a, &x) in indices.iter().zip(&sample) {
            noise[a] = x;
        }
        Some(noise)
    }

    /// Valid moves of an expanded node in the live position.
    fn valid_at(&self, pos: &Position) -> Option<Vec<bool>> {
        let stats = self.slot(&pos.signature(), pos.to_play())?;
        if stats.priors.is_none() {
            return None;
        }
        Some(self.live_valid(pos, &stats.legal))
    }

    /// Narrow the board-only legality of `pos` to what is valid right now.
    fn live_valid(&self, pos: &Position, legal: &[bool]) -> Vec<bool> {
        let color = pos.to_play();
        let mut valid = legal.to_vec();
        if let Some(ko) = pos.ko() {
            valid[ko.index()] = false;
        }
        if self.game.config().enforce_superko {
            for (idx, v) in valid.iter_mut().enumerate().take(AREA) {
                if *v {
                    *v = pos.is_legal(Move::Play(Coord::from_index(idx)), color);
                }
            }
        }
        valid[PASS_ACTION] = self.game.pass_allowed(pos);
        valid
    }

    /// Pick the action with the highest upper confidence bound.
    fn select(&self, pos: &Position, noise: Option<&[f32]>) -> Result<usize, SearchError> {
        let valid = self.valid_at(pos).ok_or(SearchError::NoLegalMoves)?;
        let stats = self
            .slot(&pos.signature(), pos.to_play())
            .ok_or(SearchError::NoLegalMoves)?;
        let Some(stored) = stats.priors.as_ref() else {
            return Err(SearchError::NoLegalMoves);
        };
        let priors = masked_priors(stored, &valid)
            .or_else(|| uniform_over(&valid).ok())
            .ok_or(SearchError::NoLegalMoves)?;

        let eps = self.config.dirichlet_epsilon;
        let c_puct = self.config.c_puct;
        let ns = stats.visits as f32;
        let mut best = f32::NEG_INFINITY;
        let mut best_action = None;
        for a in (0..ACTION_SIZE).filter(|&a| valid[a]) {
            let prior = match noise {
                Some(noise) => (1.0 - eps) * priors[a] + eps * noise[a],
                None => priors[a],
            };
            let edge = stats.edges[a];
            let u = if edge.n > 0 {
                edge.q + c_puct * prior * ns.sqrt() / (1.0 + edge.n as f32)
            } else {
                c_puct * prior * (ns + EPS).sqrt()
            };
            if u > best {
                best = u;
                best_action = Some(a);
            }
        }
        best_action.ok_or(SearchError::NoLegalMoves)
    }

    /// One simulation from `root`. Returns the value backed up into the root's
    /// chosen edge (for the root player), or the leaf value if the root is a leaf.
    fn simulate(&mut self, root: &Position, noise: Option<&[f32]>) -> Result<f32, SearchError> {
        let mut pos = root.clone();
        let mut path: Vec<Step> = Vec::new();
        let max_depth = self.game.config().move_cap;

        // Value for the player who made the last move on the path.
        let mut value = loop {
            let player = pos.to_play();
            let signature = pos.signature();
            if let Some(outcome) = self.outcome(signature, player, &pos) {
                break -outcome;
            }
            if path.len() >= max_depth {
                let result = GameResult::from_score(self.game.score(&pos));
                break -result.value_for(player);
            }
            if !self.is_expanded(&signature, player) {
                break -self.expand(&pos, signature, player)?;
            }
            let action = self.select(&pos, if path.is_empty() { noise } else { None })?;
            path.push(Step {
                signature,
                player,
                action,
            });
            pos = self.game.next_state(&pos, action)?;
        };

        let mut root_value = -value;
        for step in path.iter().rev() {
            if let Some(stats) = self.slot_mut(&step.signature, step.player) {
                let edge = &mut stats.edges[step.action];
                edge.q = (edge.n as f32 * edge.q + value) / (edge.n as f32 + 1.0);
                edge.n += 1;
                stats.visits += 1;
            }
            root_value = value;
            value = -value;
        }
        Ok(root_value)
    }
}

/// Moves the board alone allows for the side to move. Pass is always set.
fn board_legal(pos: &Position) -> Vec<bool> {
    let color = pos.to_play();
    let mut legal: Vec<bool> = (0..AREA)
        .map(Coord::from_index)
        .map(|c| pos.stone_at(c).is_empty() && !pos.is_suicide(c, color))
        .collect();
    legal.push(true);
    legal
}

/// `priors` restricted to `valid` and renormalized, `None` if no mass is left.
fn masked_priors(priors: &[f32], valid: &[bool]) -> Option<Vec<f32>> {
    let mut out: Vec<f32> = priors
        .iter()
        .zip(valid)
        .map(|(&p, &v)| if v { p.max(0.0) } else { 0.0 })
        .collect();
    let sum: f32 = out.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    out.iter_mut().for_each(|p| *p /= sum);
    Some(out)
}

/// Equal mass on every valid action.
fn uniform_over(valid: &[bool]) -> Result<Vec<f32>, SearchError> {
    let count = valid.iter().filter(|&&v| v).count();
    if count == 0 {
        return Err(SearchError::NoLegalMoves);
    }
    Ok(valid
        .iter()
        .map(|&v| if v { 1.0 / count as f32 } else { 0.0 })
        .collect())
}

/// Draw an action from a move distribution.
///
/// Falls back to the last action with positive mass when rounding leaves the
/// cumulative sum short of the draw. `None` if no action has any mass.
pub fn sample_action<R: Rng + ?Sized>(probs: &[f32], rng: &mut R) -> Option<usize> {
    let r: f32 = rng.gen_range(0.0..1.0);
    let mut cumsum = 0.0;
    for (a, &p) in probs.iter().enumerate() {
        cumsum += p;
        if p > 0.0 && r < cumsum {
            return Some(a);
        }
    }
    probs.iter().rposition(|&p| p > 0.0)
}

/// Sample a symmetric Dirichlet distribution of `n` components.
///
/// With a tiny alpha every Gamma draw can underflow to zero; the sample then
/// degrades to a one-hot vector at a random component.
fn dirichlet<R: Rng + ?Sized>(n: usize, alpha: f32, rng: &mut R) -> Option<Vec<f32>> {
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(vec![1.0]);
    }
    let gamma = match Gamma::new(alpha as f64, 1.0) {
        Ok(gamma) => gamma,
        Err(err) => {
            warn!(alpha, %err, "invalid dirichlet alpha, skipping root noise");
            return None;
        }
    };
    let mut samples: Vec<f64> = (0..n).map(|_| gamma.sample(rng)).collect();
    let sum: f64 = samples.iter().sum();
    if sum > f64::MIN_POSITIVE {
        samples.iter_mut().for_each(|s| *s /= sum);
    } else {
        samples.fill(0.0);
        samples[rng.gen_range(0..n)] = 1.0;
    }
    Some(samples.into_iter().map(|s| s as f32).collect())
}
