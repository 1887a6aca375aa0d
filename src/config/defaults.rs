//! Default constants for dedupe configuration.
//!
//! All magic numbers are centralized here with documentation.

// =============================================================================
// Matching Defaults
// =============================================================================

/// Aggregate score at or above which a pair is a Duplicate
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.85;

/// Aggregate score below which a pair is a NonDuplicate
pub const DEFAULT_NON_DUPLICATE_THRESHOLD: f64 = 0.5;

/// Identical values (or identical records) score 1.0 without measuring
pub const DEFAULT_EXACT_MATCH_OVERRIDE: bool = true;

/// Default reach of numeric closeness: values this far apart score 0
pub const DEFAULT_NUMERIC_MAX_DIFFERENCE: f64 = 10.0;

/// Default reach of date proximity in days
pub const DEFAULT_DATE_MAX_DAYS: f64 = 365.0;

// =============================================================================
// Clustering Defaults
// =============================================================================

/// Share of cross-cluster verdicts that must be Duplicate for a
/// majority-link merge
pub const DEFAULT_MIN_MAJORITY_FRACTION: f64 = 0.5;

/// Clusters up to this size are refined by exhaustive partition search
pub const DEFAULT_MAX_EXHAUSTIVE_SIZE: usize = 8;

/// Hard ceiling for exhaustive refinement.
/// The number of set partitions grows as the Bell numbers (115 975 at 10).
pub const MAX_EXHAUSTIVE_SIZE_LIMIT: usize = 10;

// =============================================================================
// Environment
// =============================================================================

/// Prefix for environment overrides, e.g. `DEDUPE_MATCHING__DUPLICATE_THRESHOLD`
pub const ENV_PREFIX: &str = "DEDUPE_";

/// Separator for nested keys in environment overrides
pub const ENV_SEPARATOR: &str = "__";

pub(crate) fn default_min_majority_fraction() -> f64 {
    DEFAULT_MIN_MAJORITY_FRACTION
}

pub(crate) fn default_max_exhaustive_size() -> usize {
    DEFAULT_MAX_EXHAUSTIVE_SIZE
}

pub(crate) fn default_numeric_max_difference() -> f64 {
    DEFAULT_NUMERIC_MAX_DIFFERENCE
}

pub(crate) fn default_date_max_days() -> f64 {
    DEFAULT_DATE_MAX_DAYS
}
