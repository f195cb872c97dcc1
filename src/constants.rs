//! Board geometry, action layout and engine parameters.
//!
//! # Board Size Configuration
//!
//! The board size is controlled by Cargo features:
//! - `board7x7` (default): 7x7 board
//! - `board9x9`: 9x9 board
//!
//! The scoring heuristics were tuned on 7x7; other sizes compile but are not
//! expected to score as well.
//!
//! ```sh
//! cargo build                                             # 7x7 (default)
//! cargo build --no-default-features --features board9x9   # 9x9
//! ```

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN).
#[cfg(feature = "board7x7")]
pub const N: usize = 7;

#[cfg(feature = "board9x9")]
pub const N: usize = 9;

#[cfg(all(feature = "board7x7", feature = "board9x9"))]
compile_error!("Cannot enable both 'board7x7' and 'board9x9' features at the same time");

#[cfg(not(any(feature = "board7x7", feature = "board9x9")))]
compile_error!("Must enable exactly one board size feature: 'board7x7' or 'board9x9'");

/// Number of intersections on the board.
pub const AREA: usize = N * N;

// Group member and liberty sets are stored as `u128` bitsets.
const _: () = assert!(AREA <= 128);

// =============================================================================
// Actions
// =============================================================================

/// Number of actions: one per intersection plus pass.
pub const ACTION_SIZE: usize = AREA + 1;

/// The pass action (the last entry of every policy vector).
pub const PASS_ACTION: usize = AREA;

// =============================================================================
// Game Rules
// =============================================================================

/// Komi (compensation for White). Fractional so that games cannot tie.
pub const KOMI: f32 = if N <= 7 { 6.5 } else { 7.5 };

/// Hard cap on game length (7 x 7 x 2 = 98 on the default board).
pub const MAX_MOVES: usize = 2 * N * N;

// =============================================================================
// Oracle Input
// =============================================================================

/// Number of past board snapshots kept for the oracle input.
pub const HISTORY_LEN: usize = 8;

/// Number of input planes: own and opponent stones for each snapshot,
/// the sensibility plane and the color-to-move plane.
pub const NUM_PLANES: usize = 2 * HISTORY_LEN + 2;

// =============================================================================
// Search
// =============================================================================

/// Padding added to N(s) for unvisited edges so the prior still counts.
pub const EPS: f32 = 1e-8;

/// Value reported for an exact tie (non-zero so that it reads as "ended").
pub const TIE_VALUE: f32 = 1e-4;
