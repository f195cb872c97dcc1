//! The eight symmetries of the square board.
//!
//! Leaves are evaluated under a random symmetry so the oracle sees every
//! orientation; the returned policy is mapped back before use. Training
//! examples are multiplied by all eight with [`Symmetry::augment`].

use rand::Rng;
use rand::seq::SliceRandom;

use crate::board::Coord;
use crate::constants::{AREA, N};
use crate::position::Plane;

/// An element of the dihedral group D4.
///
/// The mapping first optionally transposes, then optionally flips each axis.
/// `Default` is the identity.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Symmetry {
    pub transpose: bool,
    pub flip_rows: bool,
    pub flip_cols: bool,
}

impl Symmetry {
    pub const fn new(transpose: bool, flip_rows: bool, flip_cols: bool) -> Self {
        Symmetry {
            transpose,
            flip_rows,
            flip_cols,
        }
    }

    pub const ALL: [Symmetry; 8] = [
        Symmetry::new(false, false, false),
        Symmetry::new(false, false, true),
        Symmetry::new(false, true, false),
        Symmetry::new(false, true, true),
        Symmetry::new(true, false, false),
        Symmetry::new(true, false, true),
        Symmetry::new(true, true, false),
        Symmetry::new(true, true, true),
    ];

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL
            .choose(rng)
            .copied()
            .unwrap_or_default()
    }

    pub fn inverse(self) -> Self {
        if self.transpose {
            Symmetry::new(true, self.flip_cols, self.flip_rows)
        } else {
            self
        }
    }

    pub fn map(self, c: Coord) -> Coord {
        let (mut row, mut col) = (c.row, c.col);
        if self.transpose {
            std::mem::swap(&mut row, &mut col);
        }
        if self.flip_rows {
            row = N - 1 - row;
        }
        if self.flip_cols {
            col = N - 1 - col;
        }
        Coord::new(row, col)
    }

    /// Transform a plane: the value at `c` moves to `map(c)`.
    pub fn apply_plane(self, plane: &Plane) -> Plane {
        let mut out = [0.0; AREA];
        for (idx, &v) in plane.iter().enumerate() {
            out[self.map(Coord::from_index(idx)).index()] = v;
        }
        out
    }

    /// Transform a policy the same way as a plane. Pass stays last.
    pub fn apply_policy(self, policy: &[f32]) -> Vec<f32> {
        let mut out = policy.to_vec();
        for (idx, &p) in policy.iter().enumerate().take(AREA) {
            out[self.map(Coord::from_index(idx)).index()] = p;
        }
        out
    }

    /// The eight symmetric copies of a training example, identity first.
    pub fn augment(planes: &[Plane], policy: &[f32]) -> Vec<(Vec<Plane>, Vec<f32>)> {
        Self::ALL
            .iter()
            .map(|sym| {
                let planes = planes.iter().map(|p| sym.apply_plane(p)).collect();
                (planes, sym.apply_policy(policy))
            })
            .collect()
    }

    /// Bring a policy produced for the transformed board back to the
    /// original board. Entries past the board (pass) are kept in place.
    pub fn unmap_policy(self, policy: &[f32]) -> Vec<f32> {
        let mut out = policy.to_vec();
        for (idx, slot) in out.iter_mut().enumerate().take(AREA) {
            *slot = policy[self.map(Coord::from_index(idx)).index()];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ACTION_SIZE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ramp() -> Plane {
        let mut plane = [0.0; AREA];
        for (i, v) in plane.iter_mut().enumerate() {
            *v = i as f32;
        }
        plane
    }

    #[test]
    fn test_all_distinct() {
        let plane = ramp();
        let images: Vec<Plane> = Symmetry::ALL.iter().map(|s| s.apply_plane(&plane)).collect();
        for i in 0..images.len() {
            for j in i + 1..images.len() {
                assert_ne!(images[i], images[j], "symmetries {i} and {j} coincide");
            }
        }
    }

    #[test]
    fn test_inverse_roundtrip() {
        let plane = ramp();
        for sym in Symmetry::ALL {
            let back = sym.inverse().apply_plane(&sym.apply_plane(&plane));
            assert_eq!(back, plane, "{sym:?}");
            for idx in 0..AREA {
                let c = Coord::from_index(idx);
                assert_eq!(sym.inverse().map(sym.map(c)), c);
            }
        }
    }

    #[test]
    fn test_unmap_policy() {
        let mut policy = vec![0.0; ACTION_SIZE];
        let target = Coord::new(0, 1);
        policy[target.index()] = 0.7;
        policy[AREA] = 0.3;

        for sym in Symmetry::ALL {
            // The oracle answers on the transformed board.
            let mut seen = vec![0.0; ACTION_SIZE];
            seen[sym.map(target).index()] = 0.7;
            seen[AREA] = 0.3;
            assert_eq!(sym.unmap_policy(&seen), policy, "{sym:?}");
        }
    }

    #[test]
    fn test_random_is_seeded() {
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..16).map(|_| Symmetry::random(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..16).map(|_| Symmetry::random(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_augment_keeps_policy_on_its_planes() {
        let target = Coord::new(1, 4);
        let mut plane = [0.0; AREA];
        plane[target.index()] = 1.0;
        let planes = vec![plane, ramp()];
        let mut policy = vec![0.0; ACTION_SIZE];
        policy[target.index()] = 0.6;
        policy[AREA] = 0.4;

        let examples = Symmetry::augment(&planes, &policy);
        assert_eq!(examples.len(), 8);
        assert_eq!(examples[0], (planes.clone(), policy.clone()));

        for ((sym_planes, sym_policy), sym) in examples.iter().zip(Symmetry::ALL) {
            let hot = sym_planes[0].iter().position(|&v| v == 1.0).unwrap();
            assert_eq!(hot, sym.map(target).index());
            assert_eq!(sym_policy[hot], 0.6);
            assert_eq!(sym_policy[AREA], 0.4);
            assert!((sym_policy.iter().sum::<f32>() - 1.0).abs() < 1e-6);
            assert_eq!(sym_planes[1], sym.apply_plane(&planes[1]));
            assert_eq!(sym.unmap_policy(sym_policy), policy);
        }
    }
}
