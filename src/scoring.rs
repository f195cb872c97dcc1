//! Area scoring with a heuristic dead-stone pass.
//!
//! A point counts for a color when it holds that color's stone, or when it is
//! empty and only that color's stones can reach it through empty points.
//! White also receives komi.
//!
//! Small invasions in a corner are often dead but still "reach" territory, so
//! late in the game the scorer looks for walled-off corner regions and plays
//! out the contested points to decide whether the invader can live.

use itertools::Itertools;
use tracing::{debug, trace};

use crate::board::{Color, Coord, DIRECTIONS, Move};
use crate::config::ScoringConfig;
use crate::constants::{AREA, N};
use crate::position::Position;

/// Which colors reach each point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reach([[bool; 2]; AREA]);

impl Reach {
    #[inline]
    pub fn reaches(&self, c: Coord, color: Color) -> bool {
        self.0[c.index()][color.index()]
    }

    /// The only color reaching `c`, if exactly one does.
    pub fn exclusive(&self, c: Coord) -> Option<Color> {
        match self.0[c.index()] {
            [true, false] => Some(Color::Black),
            [false, true] => Some(Color::White),
            _ => None,
        }
    }
}

/// Compute which empty points each color reaches.
///
/// Every stone seeds straight runs of empty points in the four directions,
/// stopping at the first occupied point. Each newly reached point then seeds
/// its own runs until nothing changes.
pub fn reachability(pos: &Position) -> Reach {
    let mut reach = [[false; 2]; AREA];
    for color in Color::ALL {
        let slot = color.index();
        let mut work: Vec<Coord> = (0..AREA)
            .map(Coord::from_index)
            .filter(|&c| pos.stone_at(c) == color.stone())
            .collect();
        while let Some(from) = work.pop() {
            for dir in DIRECTIONS {
                let mut cur = from;
                while let Some(next) = cur.step(dir) {
                    if !pos.stone_at(next).is_empty() {
                        break;
                    }
                    if !reach[next.index()][slot] {
                        reach[next.index()][slot] = true;
                        work.push(next);
                    }
                    cur = next;
                }
            }
        }
    }
    Reach(reach)
}

/// Points for each color, komi included.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Score {
    pub black: f32,
    pub white: f32,
}

impl Score {
    pub fn get(&self, color: Color) -> f32 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    fn get_mut(&mut self, color: Color) -> &mut f32 {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }

    /// Points by which `color` leads (negative when behind).
    pub fn lead(&self, color: Color) -> f32 {
        self.get(color) - self.get(color.opponent())
    }
}

/// Stones plus exclusively reached points, komi for White. No dead-stone pass.
pub fn area_score(pos: &Position, reach: &Reach) -> Score {
    let mut score = Score {
        black: 0.0,
        white: pos.komi(),
    };
    for idx in 0..AREA {
        let c = Coord::from_index(idx);
        let owner = pos.stone_at(c).color().or_else(|| reach.exclusive(c));
        if let Some(color) = owner {
            *score.get_mut(color) += 1.0;
        }
    }
    score
}

/// A corner region judged dead for the invading color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadRegion {
    /// The color whose walls enclose the region
    pub owner: Color,
    pub cells: Vec<Coord>,
}

/// The four corners, as maps from corner-local to board coordinates.
const CORNERS: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

#[inline]
fn to_board((flip_row, flip_col): (bool, bool), row: usize, col: usize) -> Coord {
    Coord::new(
        if flip_row { N - 1 - row } else { row },
        if flip_col { N - 1 - col } else { col },
    )
}

#[derive(Clone, Debug, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Scorer { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Area score with the dead-stone correction applied when it is due.
    pub fn score(&self, pos: &Position) -> Score {
        let reach = reachability(pos);
        let mut score = area_score(pos, &reach);
        if !self.correction_due(pos) {
            return score;
        }

        for region in self.dead_regions(pos, &reach) {
            let owner = region.owner;
            let before = score;
            for &c in &region.cells {
                let counted = pos.stone_at(c).color().or_else(|| reach.exclusive(c));
                match counted {
                    Some(color) if color == owner => {}
                    Some(color) => {
                        *score.get_mut(owner) += 1.0;
                        *score.get_mut(color) -= 1.0;
                    }
                    None => *score.get_mut(owner) += 1.0,
                }
            }
            debug!(
                owner = %owner,
                cells = region.cells.len(),
                gained = score.get(owner) - before.get(owner),
                "dead corner region resolved"
            );
        }
        score
    }

    fn correction_due(&self, pos: &Position) -> bool {
        self.config.dead_stones
            && pos.history().len() >= self.config.dead_stone_min_moves
            && !matches!(pos.last_move(), Some(Move::Pass))
    }

    /// Find walled corner regions whose invaders are judged dead.
    pub fn dead_regions(&self, pos: &Position, reach: &Reach) -> Vec<DeadRegion> {
        let mut dead = Vec::new();
        for corner in CORNERS {
            for owner in Color::ALL {
                let Some(cells) = enclosure(pos, corner, owner) else {
                    continue;
                };
                let invader = owner.opponent();
                let has_invader = cells.iter().any(|&c| pos.stone_at(c) == invader.stone());
                let contested: Vec<Coord> = cells
                    .iter()
                    .copied()
                    .filter(|&c| pos.stone_at(c).is_empty() && reach.reaches(c, invader))
                    .collect();
                if !has_invader && contested.is_empty() {
                    continue;
                }

                let is_dead = if contested.len() <= self.config.immediately_dead {
                    true
                } else if contested.len() <= self.config.max_contested {
                    self.invader_dies(pos, &cells, &contested, owner)
                } else {
                    trace!(
                        owner = %owner,
                        contested = contested.len(),
                        "corner region too open to judge"
                    );
                    false
                };

                if is_dead {
                    dead.push(DeadRegion { owner, cells });
                }
            }
        }
        dead
    }

    /// Play out every ordering of the contested points and decide whether the
    /// invader keeps two exclusive points often enough to count as alive.
    fn invader_dies(
        &self,
        pos: &Position,
        cells: &[Coord],
        contested: &[Coord],
        owner: Color,
    ) -> bool {
        let invader = owner.opponent();
        let total: usize = (1..=contested.len()).product();
        let limit = self.config.stay_alive_threshold * total as f32;
        let mut alive = 0usize;
        let mut tried = 0usize;

        for order in contested.iter().copied().permutations(contested.len()) {
            let mut scratch = pos.clone();
            let mut mover = owner;
            for c in order {
                // A point the mover cannot take stays empty and the same
                // side tries the next one.
                if scratch.execute_move(Move::Play(c), mover).is_ok() {
                    mover = mover.opponent();
                }
            }
            let after = reachability(&scratch);
            let kept = cells
                .iter()
                .filter(|&&c| {
                    scratch.stone_at(c).is_empty() && after.exclusive(c) == Some(invader)
                })
                .count();
            if kept >= 2 {
                alive += 1;
            }
            tried += 1;

            if alive as f32 > limit {
                return false;
            }
            if (alive + (total - tried)) as f32 <= limit {
                return true;
            }
        }
        alive as f32 <= limit
    }
}

/// The largest walled rectangle of `owner` in a corner, as board cells.
///
/// In corner-local coordinates the region is rows `0..r` by cols `0..c`. It is
/// closed by a wall along row `r` (cols `0..=c`) and a wall along col `c`
/// (rows `0..=r`), both made only of `owner` stones.
fn enclosure(pos: &Position, corner: (bool, bool), owner: Color) -> Option<Vec<Coord>> {
    let stone = owner.stone();
    let max = N / 2;
    let walled = |r: usize, c: usize| {
        (0..=c).all(|j| pos.stone_at(to_board(corner, r, j)) == stone)
            && (0..=r).all(|i| pos.stone_at(to_board(corner, i, c)) == stone)
    };

    let (r, c) = (2..=max)
        .cartesian_product(2..=max)
        .filter(|&(r, c)| walled(r, c))
        .max_by_key(|&(r, c)| r * c)?;

    Some(
        (0..r)
            .cartesian_product(0..c)
            .map(|(i, j)| to_board(corner, i, j))
            .collect(),
    )
}
