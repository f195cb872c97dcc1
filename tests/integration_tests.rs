//! Integration tests for zero-go
//!
//! Whole games and multi-module scenarios: rules invariants over random
//! games, ko and superko, scoring with the dead-stone pass, and searches
//! driving complete games.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use zero_go::board::{Color, Coord, Move, RowOrigin, neighbors, parse_coord};
use zero_go::config::{EngineConfig, GameConfig, ScoringConfig, SearchConfig};
use zero_go::constants::{AREA, PASS_ACTION};
use zero_go::game::{GameMode, GoGame};
use zero_go::mcts::{Mcts, sample_action};
use zero_go::oracle::UniformOracle;
use zero_go::position::{MoveError, Position};
use zero_go::record::{GameRecord, moves_from_sgf};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

/// Play a sequence of moves, alternating colors starting with Black.
/// Coordinates count rows from the top ("A1" is the top-left corner).
fn setup_position(moves: &[&str]) -> Position {
    let mut pos = Position::new();
    for text in moves {
        let mv = parse_coord(text, RowOrigin::Top).unwrap();
        let color = pos.to_play();
        pos.execute_move(mv, color).unwrap();
    }
    pos
}

/// White's lone stone at B2 has just been captured by Black at C2.
const KO_SEQUENCE: [&str; 9] = ["B1", "C1", "A2", "D2", "B3", "C3", "F6", "B2", "C2"];

/// Liberties of the group at `c`, found by flood fill over the raw stones.
fn flood_liberties(pos: &Position, c: Coord) -> HashSet<usize> {
    let color = pos.stone_at(c);
    let mut seen = HashSet::from([c.index()]);
    let mut stack = vec![c.index()];
    let mut liberties = HashSet::new();
    while let Some(idx) = stack.pop() {
        for &n in neighbors(idx) {
            let s = pos.stone_at(Coord::from_index(n));
            if s.is_empty() {
                liberties.insert(n);
            } else if s == color && seen.insert(n) {
                stack.push(n);
            }
        }
    }
    liberties
}

fn assert_groups_consistent(pos: &Position) {
    for idx in 0..AREA {
        let c = Coord::from_index(idx);
        if pos.stone_at(c).is_empty() {
            assert_eq!(pos.liberty_count(c), None);
            continue;
        }
        let expected = flood_liberties(pos, c);
        assert!(!expected.is_empty(), "group at {c:?} has no liberties\n{pos}");
        let reported: HashSet<usize> = pos.liberties(c).iter().map(|l| l.index()).collect();
        assert_eq!(reported, expected, "liberties of {c:?}\n{pos}");
        for member in pos.group_members(c) {
            assert_eq!(pos.liberty_count(member), pos.liberty_count(c));
        }
    }
}

// =============================================================================
// Board rules
// =============================================================================

#[test]
fn test_random_games_keep_groups_consistent() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..8 {
        let mut pos = Position::new();
        for _ in 0..80 {
            let color = pos.to_play();
            let legal = pos.legal_moves(color);
            let mv = match legal.choose(&mut rng) {
                Some(&c) => Move::Play(c),
                None => Move::Pass,
            };
            pos.execute_move(mv, color).unwrap();
            assert_groups_consistent(&pos);
        }
    }
}

#[test]
fn test_ko_forbids_immediate_recapture() {
    let mut pos = setup_position(&KO_SEQUENCE);
    let ko = Coord::new(1, 1);
    assert_eq!(pos.ko(), Some(ko));
    assert_eq!(pos.prisoners(Color::White), 1);
    assert_eq!(
        pos.check_move(Move::Play(ko), Color::White),
        Err(MoveError::Ko)
    );

    // After an exchange elsewhere the recapture is allowed.
    pos.execute_move(parse_coord("G7", RowOrigin::Top).unwrap(), Color::White)
        .unwrap();
    assert_eq!(pos.ko(), None);
    pos.execute_move(parse_coord("G6", RowOrigin::Top).unwrap(), Color::Black)
        .unwrap();
    assert!(pos.is_legal(Move::Play(ko), Color::White));
    pos.execute_move(Move::Play(ko), Color::White).unwrap();
    assert_eq!(pos.prisoners(Color::Black), 1);
    assert_eq!(pos.ko(), Some(Coord::new(1, 2)));
}

#[test]
fn test_superko_forbids_board_repetition() {
    let mut pos = setup_position(&KO_SEQUENCE);
    pos.execute_move(Move::Pass, Color::White).unwrap();
    pos.execute_move(Move::Pass, Color::Black).unwrap();
    let retake = Move::Play(Coord::new(1, 1));

    // Without superko the passes lift the ko and the retake is legal.
    assert!(pos.is_legal(retake, Color::White));

    // The retake would recreate the board right after White's first B2.
    pos.set_enforce_superko(true);
    assert_eq!(
        pos.check_move(retake, Color::White),
        Err(MoveError::Superko)
    );
}

#[test]
fn test_copy_is_independent() {
    let pos = setup_position(&["B1", "A1", "G7"]);
    let mut copy = pos.clone();
    let corner = Coord::new(0, 0);
    assert!(copy.shares_group_storage(&pos, corner));

    // Black captures the corner stone on the copy only.
    copy.execute_move(parse_coord("A2", RowOrigin::Top).unwrap(), Color::Black)
        .unwrap();
    assert!(copy.stone_at(corner).is_empty());
    assert_eq!(pos.stone_at(corner), Color::White.stone());
    assert_eq!(pos.liberty_count(corner), Some(1));
    assert_eq!(pos.history().len(), 3);
    assert!(copy.shares_group_storage(&pos, Coord::new(6, 6)));
    assert_groups_consistent(&pos);
    assert_groups_consistent(&copy);
}

// =============================================================================
// Scoring and game end
// =============================================================================

#[test]
fn test_center_pass_pass_arena() {
    let game = GoGame::new(GameMode::Arena, &EngineConfig::default());
    let mut pos = game.init_position();
    for action in [AREA / 2, PASS_ACTION, PASS_ACTION] {
        assert!(game.game_ended(&pos).is_none());
        pos = game.next_state(&pos, action).unwrap();
    }

    let result = game.game_ended(&pos).unwrap();
    assert_eq!(result.winner, Some(Color::Black));
    assert_eq!(result.score.black, AREA as f32);
    assert_eq!(result.score.white, pos.komi());
}

#[test]
fn test_dead_corner_stone_counts_for_enclosure() {
    let pos = setup_position(&["C1", "A1", "C2", "pass", "C3", "pass", "B3", "pass", "A3"]);
    let eager = EngineConfig::default()
        .with_scoring(ScoringConfig::default().with_dead_stone_min_moves(0));
    let raw = GoGame::new(
        GameMode::Arena,
        &EngineConfig::default().with_scoring(ScoringConfig::default().with_dead_stones(false)),
    )
    .score(&pos);
    let corrected = GoGame::new(GameMode::Arena, &eager).score(&pos);

    // Three neutral points and the dead white stone go to Black.
    assert_eq!(corrected.black - raw.black, 4.0);
    assert_eq!(raw.white - corrected.white, 1.0);
    assert_eq!(corrected.black, AREA as f32);
}

#[test]
fn test_score_is_stable_over_random_game() {
    let game = GoGame::new(GameMode::SelfPlay, &EngineConfig::default());
    let mut rng = StdRng::seed_from_u64(5);
    let mut pos = game.init_position();
    for _ in 0..30 {
        let legal = pos.legal_moves(pos.to_play());
        let Some(&c) = legal.choose(&mut rng) else {
            break;
        };
        pos = game.next_state(&pos, c.index()).unwrap();
        let first = game.score(&pos);
        assert_eq!(first, game.score(&pos));
        // Every point is counted at most once.
        assert!(first.black + first.white <= AREA as f32 + pos.komi());
    }
}

// =============================================================================
// Search driving whole games
// =============================================================================

fn play_selfplay_game(seed: u64) -> Position {
    let config = EngineConfig::for_testing()
        .with_search(SearchConfig::for_testing().with_noise(0.03, 0.25))
        .with_game(GameConfig::default().with_move_cap(24));
    let game = GoGame::new(GameMode::SelfPlay, &config);
    let mut mcts = Mcts::with_seed(game.clone(), UniformOracle, config.search.clone(), seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos = game.init_position();

    while game.game_ended(&pos).is_none() {
        let probs = mcts.get_action_prob(&pos, 1.0, false).unwrap();
        let valid = game.valid_moves(&pos);
        for (a, &p) in probs.iter().enumerate() {
            assert!(p == 0.0 || valid[a], "mass on invalid action {a}");
        }
        let action = sample_action(&probs, &mut rng).unwrap();
        pos = game.next_state(&pos, action).unwrap();
    }
    pos
}

#[test]
fn test_selfplay_game_terminates() {
    let pos = play_selfplay_game(17);
    assert!(pos.history().len() <= 24);
    assert_groups_consistent(&pos);
}

#[test]
fn test_selfplay_is_reproducible() {
    let a = play_selfplay_game(99);
    let b = play_selfplay_game(99);
    assert_eq!(a.history(), b.history());
}

#[test]
fn test_arena_search_agrees_across_instances() {
    let config = EngineConfig::for_testing();
    let game = GoGame::new(GameMode::Arena, &config);
    let pos = setup_position(&["D4", "C3"]);

    let pick = |seed| {
        let mut mcts = Mcts::with_seed(game.clone(), UniformOracle, config.search.clone(), seed);
        let probs = mcts.get_action_prob(&pos, 0.0, true).unwrap();
        let total: u32 = mcts.visit_counts(&pos).iter().sum();
        assert_eq!(total, config.search.num_full_search_sims);
        probs.iter().position(|&p| p == 1.0).unwrap()
    };
    assert_eq!(pick(3), pick(3));
}

#[test]
fn test_sgf_roundtrip_of_played_game() {
    let pos = play_selfplay_game(5);
    let sgf = GameRecord::from_position(&pos).to_sgf();
    let moves = moves_from_sgf(&sgf).unwrap();
    assert_eq!(moves, pos.history());

    let replayed = GameRecord {
        moves,
        ..GameRecord::default()
    }
    .replay()
    .unwrap();
    assert_eq!(replayed.signature(), pos.signature());
    assert_eq!(replayed.to_play(), pos.to_play());
}
