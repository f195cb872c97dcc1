//! Stone groups and their liberties.
//!
//! Groups live in a disjoint-set layout over the flat cell indices: every
//! occupied cell stores the index of its group's representative, and only the
//! representative owns the group data (color, member set, liberty set). All
//! members of a group therefore see the same liberties by construction.
//!
//! Group data is held in an [`Arc`]. Cloning a table shares every group;
//! writes go through [`Arc::make_mut`], so a clone that mutates a group gets a
//! private copy and never disturbs the table it was cloned from.

use std::sync::Arc;

use crate::board::{Color, neighbors};
use crate::constants::AREA;

/// A set of cells, one bit per flat index.
pub type CellSet = u128;

/// Marker for "no group" in the representative table.
const NO_GROUP: u8 = u8::MAX;

/// The singleton set containing `idx`.
#[inline]
pub fn bit(idx: usize) -> CellSet {
    1u128 << idx
}

/// Iterate over the indices contained in `set`, lowest first.
pub fn cells(mut set: CellSet) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if set == 0 {
            return None;
        }
        let idx = set.trailing_zeros() as usize;
        set &= set - 1;
        Some(idx)
    })
}

/// A maximal set of connected same-color stones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub color: Color,
    pub stones: CellSet,
    pub liberties: CellSet,
}

impl Group {
    #[inline]
    pub fn size(&self) -> u32 {
        self.stones.count_ones()
    }

    #[inline]
    pub fn liberty_count(&self) -> u32 {
        self.liberties.count_ones()
    }
}

/// Group membership and liberties for every cell of a board.
#[derive(Clone, Debug)]
pub struct GroupTable {
    rep: [u8; AREA],
    groups: Vec<Option<Arc<Group>>>,
}

impl Default for GroupTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTable {
    pub fn new() -> Self {
        GroupTable {
            rep: [NO_GROUP; AREA],
            groups: vec![None; AREA],
        }
    }

    /// Representative index of the group occupying `idx`, if any.
    #[inline]
    pub fn representative(&self, idx: usize) -> Option<usize> {
        match self.rep[idx] {
            NO_GROUP => None,
            r => Some(r as usize),
        }
    }

    /// The group occupying `idx`, if any.
    #[inline]
    pub fn group(&self, idx: usize) -> Option<&Group> {
        let r = self.representative(idx)?;
        self.groups[r].as_deref()
    }

    /// Whether the group at `idx` is the same allocation in both tables.
    pub fn shares_storage(&self, other: &GroupTable, idx: usize) -> bool {
        match (self.representative(idx), other.representative(idx)) {
            (Some(a), Some(b)) => match (&self.groups[a], &other.groups[b]) {
                (Some(x), Some(y)) => Arc::ptr_eq(x, y),
                _ => false,
            },
            _ => false,
        }
    }

    /// Writable access to a group, copying it first if it is shared.
    fn group_mut(&mut self, rep: usize) -> Option<&mut Group> {
        self.groups[rep].as_mut().map(Arc::make_mut)
    }

    /// Add a stone of `color` at `idx`.
    ///
    /// `empty_neighbors` is the set of empty cells adjacent to `idx`. Friendly
    /// neighbor groups are merged into the new stone's group, and `idx` is
    /// removed from the liberties of every adjacent group.
    ///
    /// Returns the representatives of the enemy groups left without liberties.
    pub fn place(&mut self, idx: usize, color: Color, empty_neighbors: CellSet) -> Vec<usize> {
        let mut friendly: Vec<usize> = Vec::with_capacity(4);
        let mut enemy: Vec<usize> = Vec::with_capacity(4);
        for &n in neighbors(idx) {
            let Some(r) = self.representative(n) else {
                continue;
            };
            if friendly.contains(&r) || enemy.contains(&r) {
                continue;
            }
            match self.groups[r].as_deref() {
                Some(g) if g.color == color => friendly.push(r),
                Some(_) => enemy.push(r),
                None => {}
            }
        }

        let mut merged = Group {
            color,
            stones: bit(idx),
            liberties: empty_neighbors,
        };
        for r in friendly {
            if let Some(g) = self.groups[r].take() {
                merged.stones |= g.stones;
                merged.liberties |= g.liberties;
            }
        }
        merged.liberties &= !bit(idx);

        for s in cells(merged.stones) {
            self.rep[s] = idx as u8;
        }
        self.groups[idx] = Some(Arc::new(merged));

        let mut dead = Vec::new();
        for r in enemy {
            if let Some(g) = self.group_mut(r) {
                g.liberties &= !bit(idx);
                if g.liberties == 0 {
                    dead.push(r);
                }
            }
        }
        dead
    }

    /// Take the group represented by `rep` off the board.
    ///
    /// The freed cells become liberties of every group adjacent to them.
    /// Returns the removed stones.
    pub fn remove(&mut self, rep: usize) -> CellSet {
        let Some(group) = self.groups[rep].take() else {
            return 0;
        };
        for s in cells(group.stones) {
            self.rep[s] = NO_GROUP;
        }
        for s in cells(group.stones) {
            for &n in neighbors(s) {
                if let Some(r) = self.representative(n) {
                    if let Some(g) = self.group_mut(r) {
                        g.liberties |= bit(s);
                    }
                }
            }
        }
        group.stones
    }
}
