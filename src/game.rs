//! Game rules around the board: valid actions, transitions and game end.

use crate::board::{Color, Coord, Move};
use crate::config::{EngineConfig, GameConfig};
use crate::constants::{ACTION_SIZE, AREA, PASS_ACTION, TIE_VALUE};
use crate::position::{IllegalMove, MoveError, Position};
use crate::scoring::{Score, Scorer};

/// How games are played, which decides when they end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameMode {
    /// Training games: also end on a decisive score margin.
    SelfPlay,
    /// Evaluation games: end only on two passes or the move cap.
    Arena,
}

/// Outcome of a finished game.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GameResult {
    pub score: Score,
    /// `None` for an exact tie.
    pub winner: Option<Color>,
}

impl GameResult {
    pub fn from_score(score: Score) -> Self {
        let winner = if score.black > score.white {
            Some(Color::Black)
        } else if score.white > score.black {
            Some(Color::White)
        } else {
            None
        };
        GameResult { score, winner }
    }

    /// +1 if `color` won, -1 if it lost, a small positive value for a tie.
    pub fn value_for(&self, color: Color) -> f32 {
        match self.winner {
            Some(w) if w == color => 1.0,
            Some(_) => -1.0,
            None => TIE_VALUE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GoGame {
    mode: GameMode,
    scorer: Scorer,
    config: GameConfig,
}

impl GoGame {
    pub fn new(mode: GameMode, config: &EngineConfig) -> Self {
        GoGame {
            mode,
            scorer: Scorer::new(config.scoring.clone()),
            config: config.game.clone(),
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// A fresh empty board, Black to move.
    pub fn init_position(&self) -> Position {
        let mut pos = Position::new();
        pos.set_enforce_superko(self.config.enforce_superko);
        pos
    }

    pub fn action_size(&self) -> usize {
        ACTION_SIZE
    }

    /// Copy `pos` and play `action` for the side to move.
    pub fn next_state(&self, pos: &Position, action: usize) -> Result<Position, IllegalMove> {
        let color = pos.to_play();
        let Some(mv) = Move::from_action(action) else {
            return Err(IllegalMove {
                mv: Move::Play(Coord::from_index(action)),
                color,
                reason: MoveError::OffBoard,
            });
        };
        let mut next = pos.clone();
        next.execute_move(mv, color)?;
        Ok(next)
    }

    /// Valid-action mask for the side to move, pass last.
    pub fn valid_moves(&self, pos: &Position) -> Vec<bool> {
        let color = pos.to_play();
        let mut valid: Vec<bool> = (0..AREA)
            .map(|idx| pos.is_legal(Move::Play(Coord::from_index(idx)), color))
            .collect();
        valid.push(self.pass_allowed(pos));
        debug_assert_eq!(valid.len(), ACTION_SIZE);
        debug_assert_eq!(valid.len() - 1, PASS_ACTION);
        valid
    }

    /// Arena games may not pass during the first few moves.
    pub fn pass_allowed(&self, pos: &Position) -> bool {
        match self.mode {
            GameMode::SelfPlay => true,
            GameMode::Arena => pos.history().len() >= self.config.arena_min_moves_before_pass,
        }
    }

    pub fn score(&self, pos: &Position) -> Score {
        self.scorer.score(pos)
    }

    /// The result if the game is over, `None` while it goes on.
    pub fn game_ended(&self, pos: &Position) -> Option<GameResult> {
        let moves = pos.history().len();
        let by_rule = pos.ended_by_passes() || moves >= self.config.move_cap;
        match self.mode {
            GameMode::SelfPlay => {
                if moves < self.config.selfplay_min_moves {
                    return None;
                }
                let score = self.score(pos);
                (by_rule || self.margin_decided(pos, &score)).then(|| GameResult::from_score(score))
            }
            GameMode::Arena => by_rule.then(|| GameResult::from_score(self.score(pos))),
        }
    }

    fn margin_decided(&self, pos: &Position, score: &Score) -> bool {
        let margin = self.config.margin_factor * (AREA as f32 + pos.komi());
        score.lead(Color::Black).abs() > margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(mode: GameMode) -> GoGame {
        GoGame::new(mode, &EngineConfig::default())
    }

    #[test]
    fn test_init_and_action_size() {
        let g = game(GameMode::SelfPlay);
        let pos = g.init_position();
        assert_eq!(g.action_size(), AREA + 1);
        assert!(g.valid_moves(&pos).iter().all(|&v| v));
        assert!(g.game_ended(&pos).is_none());
    }

    #[test]
    fn test_arena_forbids_early_pass() {
        let g = game(GameMode::Arena);
        let mut pos = g.init_position();
        assert!(!g.valid_moves(&pos)[PASS_ACTION]);
        assert!(!g.pass_allowed(&pos));
        for action in [0, 6, 42, 48, 24] {
            pos = g.next_state(&pos, action).unwrap();
        }
        assert!(g.valid_moves(&pos)[PASS_ACTION]);
        assert!(g.pass_allowed(&pos));
    }

    #[test]
    fn test_next_state_leaves_input_untouched() {
        let g = game(GameMode::SelfPlay);
        let pos = g.init_position();
        let next = g.next_state(&pos, 10).unwrap();
        assert!(pos.history().is_empty());
        assert_eq!(next.history().len(), 1);
        assert_eq!(next.to_play(), Color::White);

        let err = next.clone();
        assert_eq!(
            g.next_state(&err, 10).unwrap_err().reason,
            MoveError::Occupied
        );
        assert_eq!(
            g.next_state(&err, ACTION_SIZE + 3).unwrap_err().reason,
            MoveError::OffBoard
        );
    }

    #[test]
    fn test_arena_ends_on_two_passes() {
        let g = game(GameMode::Arena);
        let center = Coord::new(3, 3).index();
        let mut pos = g.init_position();
        pos = g.next_state(&pos, center).unwrap();
        pos.execute_move(Move::Pass, Color::White).unwrap();
        assert!(g.game_ended(&pos).is_none());
        pos.execute_move(Move::Pass, Color::Black).unwrap();

        let result = g.game_ended(&pos).unwrap();
        assert_eq!(result.winner, Some(Color::Black));
        assert_eq!(result.value_for(Color::Black), 1.0);
        assert_eq!(result.value_for(Color::White), -1.0);
    }

    #[test]
    fn test_selfplay_waits_then_ends_on_margin() {
        let g = game(GameMode::SelfPlay);
        let mut pos = g.init_position();
        pos = g.next_state(&pos, Coord::new(3, 3).index()).unwrap();
        pos = g.next_state(&pos, PASS_ACTION).unwrap();
        pos = g.next_state(&pos, Coord::new(3, 4).index()).unwrap();
        // Black leads by a wide margin, but three moves are too few.
        assert!(g.game_ended(&pos).is_none());
        pos = g.next_state(&pos, PASS_ACTION).unwrap();
        assert!(!pos.ended_by_passes());
        let result = g.game_ended(&pos).unwrap();
        assert_eq!(result.winner, Some(Color::Black));
        assert_eq!(result.score, g.score(&pos));
        assert!(result.score.lead(Color::Black) > 0.5 * (AREA as f32 + pos.komi()));
    }

    #[test]
    fn test_move_cap() {
        let config = EngineConfig::default().with_game(GameConfig::default().with_move_cap(6));
        let g = GoGame::new(GameMode::Arena, &config);
        let mut pos = g.init_position();
        for action in [0, 6, 42, 48, 10] {
            pos = g.next_state(&pos, action).unwrap();
        }
        assert!(g.game_ended(&pos).is_none());
        pos = g.next_state(&pos, 12).unwrap();
        assert!(g.game_ended(&pos).is_some());
    }

    #[test]
    fn test_tie_value() {
        let result = GameResult::from_score(Score {
            black: 10.0,
            white: 10.0,
        });
        assert_eq!(result.winner, None);
        assert_eq!(result.value_for(Color::Black), TIE_VALUE);
        assert_eq!(result.value_for(Color::White), TIE_VALUE);
    }
}
