//! Error types.
//!
//! Only configuration and input errors abort a run. Everything recoverable
//! (measurement failures, constraint conflicts, unresolved fusion conflicts)
//! is reported as an [`Observation`](crate::conflicts::Observation) instead.

use crate::model::{RecordId, ValueKind};
use thiserror::Error;

/// Invalid configuration, detected before any record is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weight {weight} for `{name}` must be finite and non-negative")]
    InvalidWeight { name: String, weight: f64 },

    #[error("weights of `{name}` must sum to 1.0, got {sum}")]
    WeightSum { name: String, sum: f64 },

    #[error("`{0}` needs at least one entry")]
    Empty(String),

    #[error("threshold `{name}` must lie in [0, 1], got {value}")]
    ThresholdRange { name: &'static str, value: f64 },

    #[error("duplicate threshold {duplicate} is below non-duplicate threshold {non_duplicate}")]
    ThresholdOrder { duplicate: f64, non_duplicate: f64 },

    #[error(
        "measure `{measure}` on attribute `{attribute}` cannot compare {found} values (accepts {expected:?})"
    )]
    TypeMismatch {
        attribute: String,
        measure: String,
        expected: Vec<ValueKind>,
        found: ValueKind,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("strategy `{strategy}` requires {requirement}")]
    MissingRequirement {
        strategy: String,
        requirement: &'static str,
    },

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Load(Box::new(error))
    }
}

/// Fatal pipeline error.
#[derive(Debug, Error)]
pub enum DedupeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("record id {0} appears more than once in the input")]
    DuplicateRecord(RecordId),

    #[error("record {0} is referenced but was not supplied")]
    UnknownRecord(RecordId),
}

pub type Result<T, E = DedupeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = ConfigError::ThresholdOrder {
            duplicate: 0.4,
            non_duplicate: 0.6,
        };
        assert!(err.to_string().contains("0.4"));

        let err: DedupeError = ConfigError::Empty("matching.attributes".to_string()).into();
        assert_eq!(
            err.to_string(),
            "configuration error: `matching.attributes` needs at least one entry"
        );
    }

    #[test]
    fn type_mismatch_lists_accepted_kinds() {
        let err = ConfigError::TypeMismatch {
            attribute: "name".to_string(),
            measure: "levenshtein".to_string(),
            expected: vec![ValueKind::Text],
            found: ValueKind::Integer,
        };
        let message = err.to_string();
        assert!(message.contains("levenshtein"));
        assert!(message.contains("integer"));
    }
}
