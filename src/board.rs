//! Colors, stones, coordinates and the action encoding.
//!
//! Row 0 is the top row of the board and the flat index of a point is
//! `row * N + col`, which is also its action number. Action `N * N` is pass.

use std::fmt;
use std::sync::OnceLock;

use thiserror::Error;

use crate::constants::{AREA, N, PASS_ACTION};

/// A player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// Both colors, Black first.
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Slot index used by per-color tables (Black = 0, White = 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    #[inline]
    pub fn stone(self) -> Stone {
        match self {
            Color::Black => Stone::Black,
            Color::White => Stone::White,
        }
    }

    /// +1 for Black, -1 for White.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Color::Black => 1.0,
            Color::White => -1.0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "B"),
            Color::White => write!(f, "W"),
        }
    }
}

/// Content of an intersection, as a signed tri-state value.
#[repr(i8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stone {
    White = -1,
    Empty = 0,
    Black = 1,
}

impl Stone {
    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Stone::Black => Some(Color::Black),
            Stone::White => Some(Color::White),
            Stone::Empty => None,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Stone::Empty
    }

    #[inline]
    pub fn value(self) -> i8 {
        self as i8
    }
}

/// An intersection on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

/// The four orthogonal directions as (row, col) steps: up, down, left, right.
pub const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl Coord {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Build a coordinate from a flat index in `0..AREA`.
    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Coord {
            row: idx / N,
            col: idx % N,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.row * N + self.col
    }

    #[inline]
    pub fn on_board(self) -> bool {
        self.row < N && self.col < N
    }

    /// The neighbor one step in `dir`, if it is on the board.
    #[inline]
    pub fn step(self, (dr, dc): (isize, isize)) -> Option<Coord> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        let c = Coord { row, col };
        c.on_board().then_some(c)
    }

    /// On-board diagonal neighbors.
    pub fn diagonals(self) -> impl Iterator<Item = Coord> {
        [(-1, -1), (-1, 1), (1, -1), (1, 1)]
            .into_iter()
            .filter_map(move |d| self.step(d))
    }
}

/// Orthogonal neighbors of each flat index, computed once.
static NEIGHBORS: OnceLock<Vec<Vec<usize>>> = OnceLock::new();

/// Flat indices of the on-board orthogonal neighbors of `idx`.
#[inline]
pub fn neighbors(idx: usize) -> &'static [usize] {
    let table = NEIGHBORS.get_or_init(|| {
        (0..AREA)
            .map(|i| {
                let c = Coord::from_index(i);
                DIRECTIONS
                    .iter()
                    .filter_map(|&d| c.step(d))
                    .map(Coord::index)
                    .collect()
            })
            .collect()
    });
    &table[idx]
}

/// A move: a stone placement or a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Play(Coord),
    Pass,
}

impl Move {
    /// Decode an action number. Returns `None` when out of range.
    pub fn from_action(action: usize) -> Option<Move> {
        match action {
            PASS_ACTION => Some(Move::Pass),
            a if a < AREA => Some(Move::Play(Coord::from_index(a))),
            _ => None,
        }
    }

    pub fn to_action(self) -> usize {
        match self {
            Move::Play(c) => c.index(),
            Move::Pass => PASS_ACTION,
        }
    }

    #[inline]
    pub fn is_pass(self) -> bool {
        self == Move::Pass
    }
}

// =============================================================================
// Coordinate Text Form
// =============================================================================

/// Which edge row numbers count from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowOrigin {
    /// Row 1 is the top row (matches the action layout).
    Top,
    /// Row 1 is the bottom row (GTP convention).
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    #[error("empty coordinate")]
    Empty,
    #[error("invalid column letter '{0}'")]
    Column(char),
    #[error("invalid row in '{0}'")]
    Row(String),
}

/// Column letter for a column index. `I` is skipped.
fn column_letter(col: usize) -> char {
    let offset = if col >= 8 { col + 1 } else { col };
    (b'A' + offset as u8) as char
}

/// Format a move as text, e.g. `"D4"` or `"pass"`.
pub fn format_coord(mv: Move, origin: RowOrigin) -> String {
    match mv {
        Move::Pass => "pass".into(),
        Move::Play(c) => {
            let row = match origin {
                RowOrigin::Top => c.row + 1,
                RowOrigin::Bottom => N - c.row,
            };
            format!("{}{row}", column_letter(c.col))
        }
    }
}

/// Parse text produced by [`format_coord`] (case-insensitive).
pub fn parse_coord(s: &str, origin: RowOrigin) -> Result<Move, CoordError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("pass") {
        return Ok(Move::Pass);
    }

    let mut chars = s.chars();
    let letter = chars.next().ok_or(CoordError::Empty)?.to_ascii_uppercase();
    if !letter.is_ascii_uppercase() || letter == 'I' {
        return Err(CoordError::Column(letter));
    }
    let mut col = (letter as u8 - b'A') as usize;
    if letter > 'I' {
        col -= 1;
    }
    if col >= N {
        return Err(CoordError::Column(letter));
    }

    let number: usize = chars
        .as_str()
        .parse()
        .map_err(|_| CoordError::Row(s.to_string()))?;
    if number == 0 || number > N {
        return Err(CoordError::Row(s.to_string()));
    }
    let row = match origin {
        RowOrigin::Top => number - 1,
        RowOrigin::Bottom => N - number,
    };

    Ok(Move::Play(Coord::new(row, col)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_roundtrip() {
        for action in 0..=PASS_ACTION {
            let mv = Move::from_action(action).unwrap();
            assert_eq!(mv.to_action(), action);
        }
        assert_eq!(Move::from_action(PASS_ACTION + 1), None);
        assert_eq!(Move::from_action(PASS_ACTION), Some(Move::Pass));
    }

    #[test]
    fn test_action_layout() {
        let mv = Move::from_action(N + 2).unwrap();
        assert_eq!(mv, Move::Play(Coord::new(1, 2)));
    }

    #[test]
    fn test_neighbors_corner_and_center() {
        assert_eq!(neighbors(0).len(), 2);
        assert_eq!(neighbors(1).len(), 3);
        let center = Coord::new(N / 2, N / 2).index();
        assert_eq!(neighbors(center).len(), 4);
    }

    #[test]
    fn test_column_letters_skip_i() {
        assert_eq!(column_letter(7), 'H');
        if N > 8 {
            assert_eq!(column_letter(8), 'J');
        }
        assert!(parse_coord("I1", RowOrigin::Bottom).is_err());
    }

    #[test]
    fn test_coord_text_both_origins() {
        let mv = Move::Play(Coord::new(0, 0));
        assert_eq!(format_coord(mv, RowOrigin::Top), "A1");
        assert_eq!(format_coord(mv, RowOrigin::Bottom), format!("A{N}"));

        for idx in 0..AREA {
            let mv = Move::Play(Coord::from_index(idx));
            for origin in [RowOrigin::Top, RowOrigin::Bottom] {
                let text = format_coord(mv, origin);
                assert_eq!(parse_coord(&text, origin), Ok(mv), "roundtrip of {text}");
            }
        }
    }

    #[test]
    fn test_parse_pass_and_errors() {
        assert_eq!(parse_coord("PASS", RowOrigin::Top), Ok(Move::Pass));
        assert_eq!(parse_coord("", RowOrigin::Top), Err(CoordError::Empty));
        assert!(parse_coord("A0", RowOrigin::Top).is_err());
        assert!(parse_coord("Z1", RowOrigin::Top).is_err());
        assert_eq!(
            parse_coord("c2", RowOrigin::Top),
            Ok(Move::Play(Coord::new(1, 2)))
        );
    }
}
