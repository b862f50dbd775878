//! Six-objective fitness vector with Pareto semantics.
//!
//! All objectives are **maximized** and conceptually lie in `[0, 1]`.

use crate::error::RepresentationError;
use serde::{Deserialize, Serialize};

/// Number of objectives in a [`FitnessVector`].
pub const NUM_OBJECTIVES: usize = 6;

/// Objective names in array order.
pub const OBJECTIVE_NAMES: [&str; NUM_OBJECTIVES] = [
    "coverage",
    "fairness",
    "preferences",
    "learning_goals",
    "acgme_compliance",
    "continuity",
];

/// Uniform default weights used by [`FitnessVector::weighted_sum`].
pub const DEFAULT_WEIGHTS: [f64; NUM_OBJECTIVES] = [1.0 / NUM_OBJECTIVES as f64; NUM_OBJECTIVES];

/// Scores of one candidate roster across the six objectives.
///
/// Field order matches [`OBJECTIVE_NAMES`] and the layout of
/// [`to_array`](Self::to_array).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessVector {
    /// Fraction of required slots that are staffed.
    #[serde(with = "crate::serde_float")]
    pub coverage: f64,
    /// Evenness of workload across residents.
    #[serde(with = "crate::serde_float")]
    pub fairness: f64,
    /// Satisfaction of stated rotation preferences.
    #[serde(with = "crate::serde_float")]
    pub preferences: f64,
    /// Progress toward required educational rotations.
    #[serde(with = "crate::serde_float")]
    pub learning_goals: f64,
    /// Duty-hour rule compliance signal.
    #[serde(with = "crate::serde_float")]
    pub acgme_compliance: f64,
    /// Stability of consecutive block assignments.
    #[serde(with = "crate::serde_float")]
    pub continuity: f64,
}

impl FitnessVector {
    /// Creates a vector from the six scores in canonical order.
    pub fn new(
        coverage: f64,
        fairness: f64,
        preferences: f64,
        learning_goals: f64,
        acgme_compliance: f64,
        continuity: f64,
    ) -> Self {
        Self {
            coverage,
            fairness,
            preferences,
            learning_goals,
            acgme_compliance,
            continuity,
        }
    }

    /// Scores in canonical order.
    pub fn to_array(&self) -> [f64; NUM_OBJECTIVES] {
        [
            self.coverage,
            self.fairness,
            self.preferences,
            self.learning_goals,
            self.acgme_compliance,
            self.continuity,
        ]
    }

    /// Rebuilds a vector from [`to_array`](Self::to_array) output.
    ///
    /// Fails when `values` does not have exactly six entries.
    pub fn from_array(values: &[f64]) -> Result<Self, RepresentationError> {
        match *values {
            [coverage, fairness, preferences, learning_goals, acgme_compliance, continuity] => Ok(Self {
                coverage,
                fairness,
                preferences,
                learning_goals,
                acgme_compliance,
                continuity,
            }),
            _ => Err(RepresentationError::ArrayLength {
                expected: NUM_OBJECTIVES,
                actual: values.len(),
            }),
        }
    }

    /// Pareto dominance under maximization.
    ///
    /// True iff every objective is `>=` the other's and at least one is
    /// strictly greater. A vector never dominates itself, and mutually
    /// incomparable vectors dominate in neither direction.
    ///
    /// ```
    /// use u_roster::ga::FitnessVector;
    ///
    /// let a = FitnessVector::new(0.9, 0.5, 0.5, 0.5, 0.5, 0.5);
    /// let b = FitnessVector::new(0.8, 0.5, 0.5, 0.5, 0.5, 0.5);
    /// assert!(a.dominates(&b));
    /// assert!(!b.dominates(&a));
    /// assert!(!a.dominates(&a));
    /// ```
    pub fn dominates(&self, other: &Self) -> bool {
        let mut strictly_better = false;
        for (a, b) in self.to_array().iter().zip(other.to_array().iter()) {
            if a < b {
                return false;
            }
            if a > b {
                strictly_better = true;
            }
        }
        strictly_better
    }

    /// Dot product with `weights`, or with [`DEFAULT_WEIGHTS`] when `None`.
    pub fn weighted_sum(&self, weights: Option<&[f64; NUM_OBJECTIVES]>) -> f64 {
        let weights = weights.unwrap_or(&DEFAULT_WEIGHTS);
        self.to_array()
            .iter()
            .zip(weights.iter())
            .map(|(v, w)| v * w)
            .sum()
    }

}

impl From<[f64; NUM_OBJECTIVES]> for FitnessVector {
    fn from(values: [f64; NUM_OBJECTIVES]) -> Self {
        let [coverage, fairness, preferences, learning_goals, acgme_compliance, continuity] = values;
        Self {
            coverage,
            fairness,
            preferences,
            learning_goals,
            acgme_compliance,
            continuity,
        }
    }
}
