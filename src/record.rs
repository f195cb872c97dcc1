//! Game records in SGF.
//!
//! Moves are written as `;B[cr]` with the column letter first and the row
//! letter second (`a` is the top row). A pass is written with empty brackets.

use thiserror::Error;

use crate::board::{Color, Coord, Move};
use crate::constants::{KOMI, N};
use crate::position::{IllegalMove, Position};

/// Name written as both players when nothing else is known.
pub const DEFAULT_PLAYER: &str = "zero-go";

/// Ruleset written to the `RU` property.
pub const RULESET: &str = "Tromp Taylor";

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid SGF coordinate '{0}'")]
    Coordinate(String),

    #[error("SGF board size {0} does not match the {n}x{n} board", n = N)]
    BoardSize(usize),

    #[error(transparent)]
    Illegal(#[from] IllegalMove),
}

/// A finished or ongoing game, ready to be written as SGF.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub board_size: usize,
    pub komi: f32,
    pub ruleset: String,
    pub player_black: String,
    pub player_white: String,
    pub moves: Vec<(Color, Move)>,
}

impl Default for GameRecord {
    fn default() -> Self {
        GameRecord {
            board_size: N,
            komi: KOMI,
            ruleset: RULESET.to_string(),
            player_black: DEFAULT_PLAYER.to_string(),
            player_white: DEFAULT_PLAYER.to_string(),
            moves: Vec::new(),
        }
    }
}

fn sgf_letter(i: usize) -> char {
    (b'a' + i as u8) as char
}

fn sgf_index(ch: char) -> Option<usize> {
    ch.is_ascii_lowercase()
        .then(|| (ch as u8 - b'a') as usize)
        .filter(|&i| i < N)
}

/// The bracket contents for a move: column letter, then row letter.
pub fn sgf_coord(mv: Move) -> String {
    match mv {
        Move::Pass => String::new(),
        Move::Play(c) => format!("{}{}", sgf_letter(c.col), sgf_letter(c.row)),
    }
}

/// Parse bracket contents. Empty text and `pass` are passes; `tt` is accepted
/// as a pass on boards smaller than 20.
pub fn parse_sgf_coord(text: &str) -> Result<Move, RecordError> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("pass") || (N < 20 && text == "tt") {
        return Ok(Move::Pass);
    }
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) => match (sgf_index(a), sgf_index(b)) {
            (Some(col), Some(row)) => Ok(Move::Play(Coord::new(row, col))),
            _ => Err(RecordError::Coordinate(text.to_string())),
        },
        _ => Err(RecordError::Coordinate(text.to_string())),
    }
}

impl GameRecord {
    /// Record of the moves played in `pos`.
    pub fn from_position(pos: &Position) -> Self {
        GameRecord {
            komi: pos.komi(),
            moves: pos.history().to_vec(),
            ..Self::default()
        }
    }

    pub fn with_players(mut self, black: &str, white: &str) -> Self {
        self.player_black = black.to_string();
        self.player_white = white.to_string();
        self
    }

    pub fn to_sgf(&self) -> String {
        let mut out = format!(
            "(;FF[4]GM[1]\nEV[zero-go game record]\nGN[]\nPB[{}]\nPW[{}]\nSZ[{}]\nKM[{}]\nRU[{}]\n\n",
            self.player_black, self.player_white, self.board_size, self.komi, self.ruleset
        );
        for &(color, mv) in &self.moves {
            out.push_str(&format!(";{color}[{}]", sgf_coord(mv)));
        }
        out.push_str("\n)");
        out
    }

    /// Rebuild the position by replaying every move.
    pub fn replay(&self) -> Result<Position, RecordError> {
        if self.board_size != N {
            return Err(RecordError::BoardSize(self.board_size));
        }
        let mut pos = Position::with_komi(self.komi);
        for &(color, mv) in &self.moves {
            pos.execute_move(mv, color)?;
        }
        Ok(pos)
    }
}

/// Extract the `;B[..]` and `;W[..]` moves of an SGF text, in order.
///
/// Only the main line is read and every other property is ignored, so the
/// header of a record written by [`GameRecord::to_sgf`] is skipped.
pub fn moves_from_sgf(text: &str) -> Result<Vec<(Color, Move)>, RecordError> {
    let mut moves = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(';') {
        rest = &rest[pos + 1..];
        let color = match rest.chars().next() {
            Some('B') => Color::Black,
            Some('W') => Color::White,
            _ => continue,
        };
        let Some(body) = rest[1..].strip_prefix('[') else {
            continue;
        };
        let Some(end) = body.find(']') else {
            break;
        };
        moves.push((color, parse_sgf_coord(&body[..end])?));
        rest = &body[end + 1..];
    }
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sgf_coords() {
        assert_eq!(sgf_coord(Move::Play(Coord::new(1, 2))), "cb");
        assert_eq!(sgf_coord(Move::Pass), "");
        assert_eq!(parse_sgf_coord("cb").unwrap(), Move::Play(Coord::new(1, 2)));
        assert_eq!(parse_sgf_coord("").unwrap(), Move::Pass);
        assert_eq!(parse_sgf_coord("tt").unwrap(), Move::Pass);
        assert!(parse_sgf_coord("zz").is_err());
        assert!(parse_sgf_coord("abc").is_err());
    }

    #[test]
    fn test_sgf_header_and_moves() {
        let mut pos = Position::new();
        pos.execute_move(Move::Play(Coord::new(3, 3)), Color::Black)
            .unwrap();
        pos.execute_move(Move::Pass, Color::White).unwrap();

        let sgf = GameRecord::from_position(&pos)
            .with_players("current", "previous")
            .to_sgf();
        assert!(sgf.starts_with("(;FF[4]"));
        assert!(sgf.contains(&format!("SZ[{N}]")));
        assert!(sgf.contains("PB[current]"));
        assert!(sgf.contains("RU[Tromp Taylor]"));
        assert!(sgf.contains(";B[dd];W[]"));
        assert!(sgf.ends_with(")"));
    }

    #[test]
    fn test_sgf_import_roundtrip() {
        let mut pos = Position::new();
        for (r, c) in [(0, 1), (0, 0), (1, 0)] {
            let color = pos.to_play();
            pos.execute_move(Move::Play(Coord::new(r, c)), color)
                .unwrap();
        }
        let color = pos.to_play();
        pos.execute_move(Move::Pass, color).unwrap();

        let record = GameRecord::from_position(&pos);
        let moves = moves_from_sgf(&record.to_sgf()).unwrap();
        assert_eq!(moves, record.moves);

        let replayed = GameRecord {
            moves,
            ..record.clone()
        }
        .replay()
        .unwrap();
        assert_eq!(replayed.signature(), pos.signature());
        assert_eq!(replayed.prisoners(Color::White), 1);
    }

    #[test]
    fn test_import_ignores_other_nodes() {
        let moves = moves_from_sgf("(;GM[1]SZ[7];AB[aa];B[bb]C[hi];W[cc])").unwrap();
        assert_eq!(
            moves,
            vec![
                (Color::Black, Move::Play(Coord::new(1, 1))),
                (Color::White, Move::Play(Coord::new(2, 2))),
            ]
        );
    }

    #[test]
    fn test_replay_rejects_illegal() {
        let record = GameRecord {
            moves: vec![
                (Color::Black, Move::Play(Coord::new(0, 0))),
                (Color::White, Move::Play(Coord::new(0, 0))),
            ],
            ..GameRecord::default()
        };
        assert!(matches!(record.replay(), Err(RecordError::Illegal(_))));
    }
}
