//! Go position representation and move execution.
//!
//! This module provides the board state machine:
//! - Stone placement, group merging and capture
//! - Ko and suicide checks, with optional positional superko
//! - Eye detection used for the oracle's sensibility plane
//! - The history buffer and its encoding as oracle input planes
//!
//! Stones are stored in absolute colors. Whose turn it is lives in
//! `to_play`, which every move hands to the opponent of the mover.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::board::{Color, Coord, Move, Stone, neighbors};
use crate::constants::{AREA, HISTORY_LEN, KOMI, N, NUM_PLANES};
use crate::groups::{CellSet, GroupTable, bit, cells};

/// One oracle input plane, row-major.
pub type Plane = [f32; AREA];

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Coordinate lies outside the board
    #[error("point is off the board")]
    OffBoard,
    /// Point is not empty
    #[error("point is not empty")]
    Occupied,
    /// Move retakes the ko
    #[error("retakes ko")]
    Ko,
    /// Move would leave its own group without liberties
    #[error("suicide")]
    Suicide,
    /// Move recreates an earlier board
    #[error("repeats an earlier position")]
    Superko,
}

/// An attempt to execute an illegal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal move {mv:?} by {color}: {reason}")]
pub struct IllegalMove {
    pub mv: Move,
    pub color: Color,
    pub reason: MoveError,
}

/// Board contents as a hashable key. Ignores history, ko and turn.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Signature([u8; AREA]);

impl Signature {
    /// One byte per cell: the stone's signed value.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self
            .0
            .iter()
            .map(|&b| match b as i8 {
                1 => 'X',
                -1 => 'O',
                _ => '.',
            })
            .collect();
        write!(f, "Signature({text})")
    }
}

/// Signatures of every board reached by a stone placement, newest first.
/// Copies of a position share the tail.
#[derive(Debug)]
struct SignatureLink {
    signature: Signature,
    prev: Option<Arc<SignatureLink>>,
}

/// A Go position (board state).
#[derive(Clone, Debug)]
pub struct Position {
    stones: [Stone; AREA],
    groups: GroupTable,
    ko: Option<Coord>,
    history: Vec<(Color, Move)>,
    passes: [u32; 2],
    /// Stones of each color that were captured
    prisoners: [u32; 2],
    komi: f32,
    to_play: Color,
    /// Last board snapshots, newest first
    snapshots: [[Stone; AREA]; HISTORY_LEN],
    seen: Option<Arc<SignatureLink>>,
    enforce_superko: bool,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// Empty board, Black to move.
    pub fn new() -> Self {
        Self::with_komi(KOMI)
    }

    pub fn with_komi(komi: f32) -> Self {
        Position {
            stones: [Stone::Empty; AREA],
            groups: GroupTable::new(),
            ko: None,
            history: Vec::new(),
            passes: [0; 2],
            prisoners: [0; 2],
            komi,
            to_play: Color::Black,
            snapshots: [[Stone::Empty; AREA]; HISTORY_LEN],
            seen: None,
            enforce_superko: false,
        }
    }

    /// Reject moves that recreate an earlier board.
    pub fn set_enforce_superko(&mut self, on: bool) {
        self.enforce_superko = on;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[inline]
    pub fn stone_at(&self, c: Coord) -> Stone {
        self.stones[c.index()]
    }

    pub fn stones(&self) -> &[Stone; AREA] {
        &self.stones
    }

    #[inline]
    pub fn to_play(&self) -> Color {
        self.to_play
    }

    #[inline]
    pub fn ko(&self) -> Option<Coord> {
        self.ko
    }

    #[inline]
    pub fn komi(&self) -> f32 {
        self.komi
    }

    pub fn history(&self) -> &[(Color, Move)] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|&(_, mv)| mv)
    }

    /// The last two moves were both passes.
    pub fn ended_by_passes(&self) -> bool {
        let n = self.history.len();
        n >= 2 && self.history[n - 1].1.is_pass() && self.history[n - 2].1.is_pass()
    }

    pub fn passes(&self, color: Color) -> u32 {
        self.passes[color.index()]
    }

    /// Number of `color` stones captured so far.
    pub fn prisoners(&self, color: Color) -> u32 {
        self.prisoners[color.index()]
    }

    /// Liberties of the group at `c`, or `None` for an empty point.
    pub fn liberty_count(&self, c: Coord) -> Option<u32> {
        self.groups.group(c.index()).map(|g| g.liberty_count())
    }

    pub fn liberties(&self, c: Coord) -> Vec<Coord> {
        self.groups
            .group(c.index())
            .map(|g| cells(g.liberties).map(Coord::from_index).collect())
            .unwrap_or_default()
    }

    /// All stones of the group at `c`, empty for an empty point.
    pub fn group_members(&self, c: Coord) -> Vec<Coord> {
        self.groups
            .group(c.index())
            .map(|g| cells(g.stones).map(Coord::from_index).collect())
            .unwrap_or_default()
    }

    /// Whether the group at `c` is still the same allocation as in `other`.
    pub fn shares_group_storage(&self, other: &Position, c: Coord) -> bool {
        self.groups.shares_storage(&other.groups, c.index())
    }

    pub fn signature(&self) -> Signature {
        let mut bytes = [0u8; AREA];
        for (b, s) in bytes.iter_mut().zip(self.stones.iter()) {
            *b = s.value() as u8;
        }
        Signature(bytes)
    }

    /// Number of stones of `color` on the board.
    pub fn stone_count(&self, color: Color) -> usize {
        self.stones.iter().filter(|&&s| s == color.stone()).count()
    }

    // -------------------------------------------------------------------------
    // Legality
    // -------------------------------------------------------------------------

    pub fn is_legal(&self, mv: Move, color: Color) -> bool {
        self.check_move(mv, color).is_ok()
    }

    /// Check a move without playing it. Pass is always legal.
    pub fn check_move(&self, mv: Move, color: Color) -> Result<(), MoveError> {
        let c = match mv {
            Move::Pass => return Ok(()),
            Move::Play(c) => c,
        };
        if !c.on_board() {
            return Err(MoveError::OffBoard);
        }
        if !self.stone_at(c).is_empty() {
            return Err(MoveError::Occupied);
        }
        if self.ko == Some(c) {
            return Err(MoveError::Ko);
        }
        if self.is_suicide(c, color) {
            return Err(MoveError::Suicide);
        }
        if self.enforce_superko && self.repeats_position(c, color) {
            return Err(MoveError::Superko);
        }
        Ok(())
    }

    /// A stone at the empty point `c` would have no liberties and capture nothing.
    pub fn is_suicide(&self, c: Coord, color: Color) -> bool {
        let idx = c.index();
        for &n in neighbors(idx) {
            let Some(g) = self.groups.group(n) else {
                return false;
            };
            let others = g.liberties & !bit(idx);
            if g.color == color && others != 0 {
                return false;
            }
            if g.color != color && others == 0 {
                return false;
            }
        }
        true
    }

    /// Playing `c` would recreate a board from the superko record.
    /// Only checked when `color` has played this point before.
    fn repeats_position(&self, c: Coord, color: Color) -> bool {
        if !self.history.contains(&(color, Move::Play(c))) {
            return false;
        }
        let mut scratch = self.clone();
        scratch.enforce_superko = false;
        if scratch.execute_move(Move::Play(c), color).is_err() {
            return false;
        }
        let target = scratch.signature();
        let mut link = self.seen.as_deref();
        while let Some(l) = link {
            if l.signature == target {
                return true;
            }
            link = l.prev.as_deref();
        }
        false
    }

    /// All legal stone placements for `color`.
    pub fn legal_moves(&self, color: Color) -> Vec<Coord> {
        (0..AREA)
            .map(Coord::from_index)
            .filter(|&c| self.is_legal(Move::Play(c), color))
            .collect()
    }

    /// An empty point whose every neighbor is a `color` stone.
    pub fn is_eyeish(&self, c: Coord, color: Color) -> bool {
        if !self.stone_at(c).is_empty() {
            return false;
        }
        neighbors(c.index())
            .iter()
            .all(|&n| self.stones[n] == color.stone())
    }

    /// An eyeish point that cannot be broken from the diagonals.
    ///
    /// At most one diagonal may be bad in the interior and none on the edge.
    /// An empty diagonal is bad unless it is itself an eye.
    pub fn is_eye(&self, c: Coord, color: Color) -> bool {
        let mut stack = Vec::new();
        self.is_eye_inner(c, color, &mut stack)
    }

    fn is_eye_inner(&self, c: Coord, color: Color, stack: &mut Vec<Coord>) -> bool {
        if !self.is_eyeish(c, color) {
            return false;
        }
        let allowed = if neighbors(c.index()).len() == 4 { 1 } else { 0 };
        let mut bad = 0;
        for d in c.diagonals() {
            let s = self.stone_at(d);
            if s == color.opponent().stone() {
                bad += 1;
            } else if s.is_empty() && !stack.contains(&d) {
                stack.push(c);
                if !self.is_eye_inner(d, color, stack) {
                    bad += 1;
                }
                stack.pop();
            }
            if bad > allowed {
                return false;
            }
        }
        true
    }

    // -------------------------------------------------------------------------
    // Move execution
    // -------------------------------------------------------------------------

    /// Play `mv` for `color`. An illegal move leaves the position untouched.
    pub fn execute_move(&mut self, mv: Move, color: Color) -> Result<(), IllegalMove> {
        self.check_move(mv, color)
            .map_err(|reason| IllegalMove { mv, color, reason })?;

        self.ko = None;
        match mv {
            Move::Pass => self.passes[color.index()] += 1,
            Move::Play(c) => self.place_stone(c, color),
        }

        self.history.push((color, mv));
        self.to_play = color.opponent();
        self.snapshots.rotate_right(1);
        self.snapshots[0] = self.stones;
        Ok(())
    }

    fn place_stone(&mut self, c: Coord, color: Color) {
        let idx = c.index();
        self.stones[idx] = color.stone();
        let empty: CellSet = neighbors(idx)
            .iter()
            .filter(|&&n| self.stones[n].is_empty())
            .fold(0, |acc, &n| acc | bit(n));

        let mut captured: CellSet = 0;
        for rep in self.groups.place(idx, color, empty) {
            captured |= self.groups.remove(rep);
        }
        for s in cells(captured) {
            self.stones[s] = Stone::Empty;
        }
        let count = captured.count_ones();
        self.prisoners[color.opponent().index()] += count;

        if count == 1 {
            if let Some(g) = self.groups.group(idx) {
                if g.size() == 1 && g.liberty_count() == 1 {
                    self.ko = Some(Coord::from_index(captured.trailing_zeros() as usize));
                }
            }
        }

        self.seen = Some(Arc::new(SignatureLink {
            signature: self.signature(),
            prev: self.seen.take(),
        }));
    }

    /// Change the side to move without playing. The oracle input is built
    /// relative to this player.
    pub fn set_current_player(&mut self, color: Color) {
        self.to_play = color;
    }

    // -------------------------------------------------------------------------
    // Oracle input
    // -------------------------------------------------------------------------

    /// Build the oracle input for the player to move.
    ///
    /// Layout: own and opponent stones for each of the last `HISTORY_LEN`
    /// boards (newest first, empty before the game started), then a plane of
    /// points that are legal and not the mover's own true eye, then a plane of
    /// ones when Black is to move.
    pub fn encode_input(&self) -> Vec<Plane> {
        let me = self.to_play;
        let mut planes = Vec::with_capacity(NUM_PLANES);
        for snap in &self.snapshots {
            let mut own = [0.0; AREA];
            let mut opp = [0.0; AREA];
            for (i, s) in snap.iter().enumerate() {
                match s.color() {
                    Some(col) if col == me => own[i] = 1.0,
                    Some(_) => opp[i] = 1.0,
                    None => {}
                }
            }
            planes.push(own);
            planes.push(opp);
        }

        let mut sensible = [0.0; AREA];
        for (i, cell) in sensible.iter_mut().enumerate() {
            let c = Coord::from_index(i);
            if self.is_legal(Move::Play(c), me) && !self.is_eye(c, me) {
                *cell = 1.0;
            }
        }
        planes.push(sensible);

        let fill = if me == Color::Black { 1.0 } else { 0.0 };
        planes.push([fill; AREA]);
        planes
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..N {
            for col in 0..N {
                let ch = match self.stones[row * N + col] {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    Stone::Empty => '.',
                };
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
