//! # Similarity Measures
//!
//! A similarity measure maps the same attribute of two records to a
//! [`SimilarityScore`]: a value in `[0, 1]`, or `Undefined` when the
//! comparison is not meaningful (missing data). Measures are pure and
//! `Send + Sync` so a candidate batch can be scored from any number of
//! worker threads.
//!
//! Built-in families live in [`measures`], with one-to-one collection
//! matching in [`matching`]; composition (weighted
//! combination, max/min selection, exact-match override, missing-value
//! policy, cutoff, value transformation) lives in [`combinators`].

pub mod combinators;
pub mod matching;
pub mod measures;

pub use combinators::{
    normalize_text, Cutoff, ExactMatchOverride, Inverted, MissingPolicy, MissingValue, Select,
    Transformed, WeightedCombination, WeightedMeasure,
};
pub use matching::{stable_marriage, MatchingSimilarity, ScoreTable};
pub use measures::{
    DateProximity, Equality, JaroWinkler, Levenshtein, MongeElkan, NumericCloseness, TokenMetric,
    TokenOverlap,
};

use crate::model::{Record, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of one comparison.
///
/// `Undefined` means "could not be measured" and is distinct from a measured
/// `0.0`. A measured score is always finite and clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityScore {
    Measured(f64),
    Undefined,
}

impl SimilarityScore {
    pub const ONE: SimilarityScore = SimilarityScore::Measured(1.0);
    pub const ZERO: SimilarityScore = SimilarityScore::Measured(0.0);

    /// Build a measured score. NaN becomes `Undefined`; everything else is
    /// clamped into `[0, 1]`.
    pub fn measured(value: f64) -> Self {
        if value.is_nan() {
            SimilarityScore::Undefined
        } else {
            SimilarityScore::Measured(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            SimilarityScore::Measured(value) => Some(value),
            SimilarityScore::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, SimilarityScore::Undefined)
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            SimilarityScore::Measured(value) => SimilarityScore::measured(f(value)),
            SimilarityScore::Undefined => SimilarityScore::Undefined,
        }
    }
}

impl fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityScore::Measured(value) => write!(f, "{:.4}", value),
            SimilarityScore::Undefined => f.write_str("undefined"),
        }
    }
}

/// Why a measure did not produce a score.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// The value lies outside the measure's declared domain. This is a
    /// configuration bug and aborts the run.
    #[error("expected one of {expected:?}, found {found}")]
    TypeMismatch {
        expected: Vec<ValueKind>,
        found: ValueKind,
    },
    /// In-domain values that still cannot be compared. Recovered as an
    /// undefined score.
    #[error("{0}")]
    Incomparable(String),
}

/// The same attribute viewed on two records.
#[derive(Debug, Clone, Copy)]
pub struct AttributePair<'a> {
    pub attribute: &'a str,
    pub left: Option<&'a Value>,
    pub right: Option<&'a Value>,
}

impl<'a> AttributePair<'a> {
    pub fn new(attribute: &'a str, left: Option<&'a Value>, right: Option<&'a Value>) -> Self {
        Self {
            attribute,
            left,
            right,
        }
    }

    /// View `attribute` on two records.
    pub fn of(attribute: &'a str, left: &'a Record, right: &'a Record) -> Self {
        Self::new(attribute, left.get(attribute), right.get(attribute))
    }

    /// Both values, if neither side is missing.
    pub fn values(&self) -> Option<(&'a Value, &'a Value)> {
        self.left.zip(self.right)
    }

    pub fn has_missing(&self) -> bool {
        self.left.is_none() || self.right.is_none()
    }

    /// Both present and raw-equal.
    pub fn is_identical(&self) -> bool {
        matches!(self.values(), Some((left, right)) if left == right)
    }
}

/// A pure comparison of two attribute values.
pub trait SimilarityMeasure: Send + Sync + fmt::Debug {
    /// Short name used in observations and error messages
    fn name(&self) -> &str;

    /// Kinds this measure accepts; `None` accepts every kind.
    fn domain(&self) -> Option<&[ValueKind]> {
        None
    }

    /// Eagerly check that `kind` is comparable by this measure (and by every
    /// measure it wraps).
    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        match self.domain() {
            Some(domain) if !domain.contains(&kind) => Err(MeasureError::TypeMismatch {
                expected: domain.to_vec(),
                found: kind,
            }),
            _ => Ok(()),
        }
    }

    /// Compare the pair. Missing values yield `Undefined` unless a
    /// [`MissingValue`] wrapper says otherwise.
    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError>;
}

/// Shared handle to a measure
pub type MeasureRef = Arc<dyn SimilarityMeasure>;

/// Check both values of a pair against a domain.
pub(crate) fn check_values(
    domain: &[ValueKind],
    left: &Value,
    right: &Value,
) -> Result<(), MeasureError> {
    for value in [left, right] {
        if !domain.contains(&value.kind()) {
            return Err(MeasureError::TypeMismatch {
                expected: domain.to_vec(),
                found: value.kind(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measured_is_clamped_and_never_nan() {
        assert_eq!(SimilarityScore::measured(1.7), SimilarityScore::ONE);
        assert_eq!(SimilarityScore::measured(-0.2), SimilarityScore::ZERO);
        assert!(SimilarityScore::measured(f64::NAN).is_undefined());
        assert_eq!(SimilarityScore::Undefined.map(|v| v * 2.0).value(), None);
    }

    #[test]
    fn test_attribute_pair_views() {
        let left = Record::new(crate::model::RecordId(1), "a").with("name", "x");
        let right = Record::new(crate::model::RecordId(2), "b").with("name", "x");
        let pair = AttributePair::of("name", &left, &right);
        assert!(pair.is_identical());
        assert!(!pair.has_missing());

        let missing = AttributePair::of("email", &left, &right);
        assert!(missing.has_missing());
        assert!(!missing.is_identical());
    }

    #[test]
    fn test_check_kind_uses_domain() {
        let measure = Levenshtein::new();
        assert!(measure.check_kind(ValueKind::Text).is_ok());
        assert!(matches!(
            measure.check_kind(ValueKind::Integer),
            Err(MeasureError::TypeMismatch { .. })
        ));
        assert!(Equality.check_kind(ValueKind::Set).is_ok());
    }
}
