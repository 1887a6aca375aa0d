//! Measure composition.

use super::{AttributePair, MeasureError, MeasureRef, SimilarityMeasure, SimilarityScore};
use crate::error::ConfigError;
use crate::model::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Tolerance when checking that weights sum to one
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// A measure with its weight inside a [`WeightedCombination`].
#[derive(Debug, Clone)]
pub struct WeightedMeasure {
    pub weight: f64,
    pub measure: MeasureRef,
}

impl WeightedMeasure {
    pub fn new(weight: f64, measure: MeasureRef) -> Self {
        Self { weight, measure }
    }
}

/// Weighted average of sub-measures over the same attribute pair.
///
/// Undefined sub-scores are dropped and the remaining weights re-normalized;
/// the combination is undefined when nothing was measurable.
#[derive(Debug, Clone)]
pub struct WeightedCombination {
    parts: Vec<WeightedMeasure>,
}

impl WeightedCombination {
    pub fn new(parts: Vec<WeightedMeasure>) -> Result<Self, ConfigError> {
        validate_weights(
            "weighted_combination",
            parts
                .iter()
                .map(|part| (part.measure.name().to_string(), part.weight)),
        )?;
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[WeightedMeasure] {
        &self.parts
    }
}

impl SimilarityMeasure for WeightedCombination {
    fn name(&self) -> &str {
        "weighted_combination"
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        self.parts
            .iter()
            .try_for_each(|part| part.measure.check_kind(kind))
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let mut scores = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            scores.push((part.weight, part.measure.similarity(pair)?));
        }
        Ok(weighted_mean(scores))
    }
}

/// Check a weight table: every weight finite and non-negative, at least one
/// entry, sum equal to one within [`WEIGHT_TOLERANCE`].
pub(crate) fn validate_weights<I>(name: &str, weights: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for (label, weight) in weights {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(ConfigError::InvalidWeight {
                name: label,
                weight,
            });
        }
        sum += weight;
        count += 1;
    }
    if count == 0 {
        return Err(ConfigError::Empty(name.to_string()));
    }
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ConfigError::WeightSum {
            name: name.to_string(),
            sum,
        });
    }
    Ok(())
}

/// `Σ wᵢ·sᵢ / Σ wᵢ` over defined scores; undefined when none is defined or
/// the defined weights sum to zero.
pub(crate) fn weighted_mean<I>(scores: I) -> SimilarityScore
where
    I: IntoIterator<Item = (f64, SimilarityScore)>,
{
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (weight, score) in scores {
        if let Some(value) = score.value() {
            total += weight * value;
            weight_sum += weight;
        }
    }
    if weight_sum > 0.0 {
        SimilarityScore::measured(total / weight_sum)
    } else {
        SimilarityScore::Undefined
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Max,
    Min,
}

/// Best (or worst) defined score among sub-measures.
#[derive(Debug, Clone)]
pub struct Select {
    extremum: Extremum,
    measures: Vec<MeasureRef>,
}

impl Select {
    pub fn max(measures: Vec<MeasureRef>) -> Result<Self, ConfigError> {
        Self::new(Extremum::Max, measures)
    }

    pub fn min(measures: Vec<MeasureRef>) -> Result<Self, ConfigError> {
        Self::new(Extremum::Min, measures)
    }

    fn new(extremum: Extremum, measures: Vec<MeasureRef>) -> Result<Self, ConfigError> {
        if measures.is_empty() {
            return Err(ConfigError::Empty("select".to_string()));
        }
        Ok(Self { extremum, measures })
    }
}

impl SimilarityMeasure for Select {
    fn name(&self) -> &str {
        match self.extremum {
            Extremum::Max => "max",
            Extremum::Min => "min",
        }
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        self.measures
            .iter()
            .try_for_each(|measure| measure.check_kind(kind))
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let mut best: Option<f64> = None;
        for measure in &self.measures {
            if let Some(value) = measure.similarity(pair)?.value() {
                best = Some(match (best, self.extremum) {
                    (None, _) => value,
                    (Some(current), Extremum::Max) => current.max(value),
                    (Some(current), Extremum::Min) => current.min(value),
                });
            }
        }
        Ok(best.map_or(SimilarityScore::Undefined, SimilarityScore::measured))
    }
}

/// Forces 1.0 when both raw values are identical.
#[derive(Debug, Clone)]
pub struct ExactMatchOverride {
    inner: MeasureRef,
}

impl ExactMatchOverride {
    pub fn new(inner: MeasureRef) -> Self {
        Self { inner }
    }
}

impl SimilarityMeasure for ExactMatchOverride {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        self.inner.check_kind(kind)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        if pair.is_identical() {
            return Ok(SimilarityScore::ONE);
        }
        self.inner.similarity(pair)
    }
}

/// What a missing attribute scores as.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", content = "score", rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Excluded from aggregation
    #[default]
    Undefined,
    /// A fixed score, clamped to `[0, 1]`
    Penalty(f64),
}

impl MissingPolicy {
    pub fn score(self) -> SimilarityScore {
        match self {
            MissingPolicy::Undefined => SimilarityScore::Undefined,
            MissingPolicy::Penalty(score) => SimilarityScore::measured(score),
        }
    }
}

/// Applies a [`MissingPolicy`] before delegating.
#[derive(Debug, Clone)]
pub struct MissingValue {
    inner: MeasureRef,
    policy: MissingPolicy,
}

impl MissingValue {
    pub fn new(inner: MeasureRef, policy: MissingPolicy) -> Self {
        Self { inner, policy }
    }
}

impl SimilarityMeasure for MissingValue {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        self.inner.check_kind(kind)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        if pair.has_missing() {
            return Ok(self.policy.score());
        }
        self.inner.similarity(pair)
    }
}

/// Scores below `threshold` become 0.0.
#[derive(Debug, Clone)]
pub struct Cutoff {
    inner: MeasureRef,
    threshold: f64,
}

impl Cutoff {
    pub fn new(inner: MeasureRef, threshold: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ThresholdRange {
                name: "cutoff",
                value: threshold,
            });
        }
        Ok(Self { inner, threshold })
    }
}

impl SimilarityMeasure for Cutoff {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        self.inner.check_kind(kind)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let threshold = self.threshold;
        Ok(self
            .inner
            .similarity(pair)?
            .map(|score| if score < threshold { 0.0 } else { score }))
    }
}

/// `1 - score`
#[derive(Debug, Clone)]
pub struct Inverted {
    inner: MeasureRef,
}

impl Inverted {
    pub fn new(inner: MeasureRef) -> Self {
        Self { inner }
    }
}

impl SimilarityMeasure for Inverted {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        self.inner.check_kind(kind)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        Ok(self.inner.similarity(pair)?.map(|score| 1.0 - score))
    }
}

type TransformFn = dyn Fn(&Value) -> Value + Send + Sync;

/// Applies a pure value transformation to both sides, then delegates.
#[derive(Clone)]
pub struct Transformed {
    inner: MeasureRef,
    transform: Arc<TransformFn>,
    label: String,
}

impl Transformed {
    pub fn new<F>(inner: MeasureRef, label: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self {
            inner,
            transform: Arc::new(transform),
            label: label.into(),
        }
    }

    /// Compare after [`normalize_text`].
    pub fn normalized(inner: MeasureRef) -> Self {
        Self::new(inner, "normalized", |value| match value {
            Value::Text(text) => Value::Text(normalize_text(text)),
            other => other.clone(),
        })
    }
}

impl fmt::Debug for Transformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformed")
            .field("inner", &self.inner)
            .field("label", &self.label)
            .finish()
    }
}

impl SimilarityMeasure for Transformed {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        self.inner.check_kind(kind)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let left = pair.left.map(|value| (self.transform)(value));
        let right = pair.right.map(|value| (self.transform)(value));
        let transformed = AttributePair::new(pair.attribute, left.as_ref(), right.as_ref());
        self.inner.similarity(&transformed)
    }
}

/// Lowercase, drop punctuation and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
