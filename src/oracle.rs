//! Position evaluation.
//!
//! The search asks an [`Oracle`] for move priors and a value for every new
//! leaf. In training this is a neural network living outside this crate; the
//! [`UniformOracle`] stands in for it in tests and demos.

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::{ACTION_SIZE, NUM_PLANES};
use crate::position::Plane;

/// Errors from evaluation. All of them abort the search.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("model not found at {0}")]
    ModelMissing(PathBuf),

    #[error("model is corrupt: {0}")]
    ModelCorrupt(String),

    #[error("oracle returned {got} policy entries, expected {expected}")]
    InvalidOutput { expected: usize, got: usize },
}

/// Result of evaluating a position.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// One entry per action, pass last. Need not be normalized.
    pub priors: Vec<f32>,

    /// Expected outcome for the player to move, in `[-1, 1]`.
    pub value: f32,
}

impl Evaluation {
    /// Reject outputs of the wrong shape.
    pub fn validate(self) -> Result<Self, OracleError> {
        if self.priors.len() != ACTION_SIZE {
            return Err(OracleError::InvalidOutput {
                expected: ACTION_SIZE,
                got: self.priors.len(),
            });
        }
        Ok(self)
    }
}

/// A move-evaluation oracle.
///
/// `planes` holds `NUM_PLANES` planes built by
/// [`Position::encode_input`](crate::position::Position::encode_input),
/// already transformed by whatever symmetry the caller chose.
pub trait Oracle {
    fn evaluate(&mut self, planes: &[Plane]) -> Result<Evaluation, OracleError>;
}

impl<F> Oracle for F
where
    F: FnMut(&[Plane]) -> Result<Evaluation, OracleError>,
{
    fn evaluate(&mut self, planes: &[Plane]) -> Result<Evaluation, OracleError> {
        self(planes)
    }
}

/// Equal priors for every action and a neutral value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformOracle;

impl Oracle for UniformOracle {
    fn evaluate(&mut self, planes: &[Plane]) -> Result<Evaluation, OracleError> {
        debug_assert_eq!(planes.len(), NUM_PLANES);
        Ok(Evaluation {
            priors: vec![1.0 / ACTION_SIZE as f32; ACTION_SIZE],
            value: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn test_uniform_oracle() {
        let planes = Position::new().encode_input();
        let eval = UniformOracle.evaluate(&planes).unwrap();
        assert_eq!(eval.priors.len(), ACTION_SIZE);
        assert_eq!(eval.value, 0.0);
        let sum: f32 = eval.priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_closure_oracle() {
        let mut calls = 0;
        let mut oracle = |_: &[Plane]| {
            calls += 1;
            Ok::<_, OracleError>(Evaluation {
                priors: vec![0.0; ACTION_SIZE],
                value: 0.5,
            })
        };
        let planes = Position::new().encode_input();
        assert_eq!(oracle.evaluate(&planes).unwrap().value, 0.5);
        assert_eq!(oracle.evaluate(&planes).unwrap().value, 0.5);
        drop(oracle);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let eval = Evaluation {
            priors: vec![1.0; 3],
            value: 0.0,
        };
        assert!(matches!(
            eval.validate(),
            Err(OracleError::InvalidOutput { got: 3, .. })
        ));
    }
}
