//! # Conflicts Module
//!
//! Structured, non-fatal observations raised while resolving a batch:
//! measurement failures, negative-constraint conflicts during clustering,
//! and unresolved field conflicts during fusion. They are attached to the
//! run's result so merge decisions can be audited after the fact.

use crate::model::{ClusterId, PairKey, RecordId, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A similarity measure could not compare two in-domain values; the
/// attribute's score was treated as undefined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasurementIssue {
    pub pair: PairKey,
    pub attribute: String,
    pub measure: String,
    pub reason: String,
}

/// A Duplicate edge that would have merged two clusters separated by at
/// least one NonDuplicate verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintConflict {
    /// The rejected (and downgraded) Duplicate edge
    pub edge: PairKey,
    /// Confidence of the rejected edge
    pub confidence: f64,
    /// NonDuplicate pairs that block the merge
    pub blocking: Vec<PairKey>,
    /// The clustering policy in effect
    pub policy: String,
}

impl ConstraintConflict {
    pub fn new(edge: PairKey, confidence: f64, blocking: Vec<PairKey>, policy: &str) -> Self {
        Self {
            edge,
            confidence,
            blocking,
            policy: policy.to_string(),
        }
    }
}

/// A conflicting value with its participants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictValue {
    /// The conflicting value
    pub value: Value,
    /// The records that have this value
    pub participants: Vec<RecordId>,
}

impl ConflictValue {
    pub fn new(value: Value, participants: Vec<RecordId>) -> Self {
        Self {
            value,
            participants,
        }
    }
}

/// No strategy settled a field; the first value by record id was kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FusionConflict {
    pub cluster: ClusterId,
    pub attribute: String,
    /// Distinct values still in contention, in record id order
    pub values: Vec<ConflictValue>,
    /// Record whose value was kept
    pub chosen: RecordId,
}

/// An observation raised during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Observation {
    /// A measure failed on one attribute of one pair
    Measurement(MeasurementIssue),
    /// A candidate pair named the same record twice and was skipped
    SelfPair { record: RecordId },
    /// A merge was rejected by a negative constraint
    ConstraintConflict(ConstraintConflict),
    /// Fusion fell back to first-value-wins
    UnresolvedFusion(FusionConflict),
}

impl Observation {
    pub fn measurement(
        pair: PairKey,
        attribute: &str,
        measure: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Measurement(MeasurementIssue {
            pair,
            attribute: attribute.to_string(),
            measure: measure.to_string(),
            reason: reason.into(),
        })
    }

    pub fn constraint_conflict(conflict: ConstraintConflict) -> Self {
        Self::ConstraintConflict(conflict)
    }

    pub fn unresolved_fusion(conflict: FusionConflict) -> Self {
        Self::UnresolvedFusion(conflict)
    }

    pub fn is_constraint_conflict(&self) -> bool {
        matches!(self, Self::ConstraintConflict(_))
    }

    pub fn is_unresolved_fusion(&self) -> bool {
        matches!(self, Self::UnresolvedFusion(_))
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Measurement(issue) => write!(
                f,
                "measure `{}` failed on `{}` for {}: {}",
                issue.measure, issue.attribute, issue.pair, issue.reason
            ),
            Observation::SelfPair { record } => write!(f, "self pair skipped for {}", record),
            Observation::ConstraintConflict(conflict) => write!(
                f,
                "{} edge {} ({:.3}) downgraded, blocked by {} negative pair(s)",
                conflict.policy,
                conflict.edge,
                conflict.confidence,
                conflict.blocking.len()
            ),
            Observation::UnresolvedFusion(conflict) => write!(
                f,
                "{}: `{}` has {} competing values, kept {}",
                conflict.cluster,
                conflict.attribute,
                conflict.values.len(),
                conflict.chosen
            ),
        }
    }
}

/// Keep only constraint conflicts.
pub fn constraint_conflicts(observations: &[Observation]) -> Vec<&ConstraintConflict> {
    observations
        .iter()
        .filter_map(|observation| match observation {
            Observation::ConstraintConflict(conflict) => Some(conflict),
            _ => None,
        })
        .collect()
}

/// Keep only unresolved fusion conflicts.
pub fn fusion_conflicts(observations: &[Observation]) -> Vec<&FusionConflict> {
    observations
        .iter()
        .filter_map(|observation| match observation {
            Observation::UnresolvedFusion(conflict) => Some(conflict),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters() {
        let observations = vec![
            Observation::SelfPair {
                record: RecordId(1),
            },
            Observation::constraint_conflict(ConstraintConflict::new(
                PairKey::new(RecordId(2), RecordId(3)),
                0.9,
                vec![PairKey::new(RecordId(1), RecordId(3))],
                "strict-transitive",
            )),
        ];

        assert_eq!(constraint_conflicts(&observations).len(), 1);
        assert!(fusion_conflicts(&observations).is_empty());
        assert!(observations[1].is_constraint_conflict());
    }

    #[test]
    fn test_display() {
        let observation = Observation::measurement(
            PairKey::new(RecordId(1), RecordId(2)),
            "tags",
            "jaccard",
            "no tokens on either side",
        );
        assert_eq!(
            observation.to_string(),
            "measure `jaccard` failed on `tags` for R1~R2: no tokens on either side"
        );
    }

    #[test]
    fn test_serialization_is_tagged() {
        let observation = Observation::SelfPair {
            record: RecordId(4),
        };
        let json = serde_json::to_value(&observation).unwrap();
        assert_eq!(json["type"], "self_pair");
    }
}
