//! Built-in measure families: equality, edit distance, token overlap,
//! token-level best match, numeric closeness and date proximity.

use super::{check_values, AttributePair, MeasureError, MeasureRef, SimilarityMeasure, SimilarityScore};
use crate::error::ConfigError;
use crate::model::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TEXT: &[ValueKind] = &[ValueKind::Text];
const TOKENS: &[ValueKind] = &[ValueKind::Text, ValueKind::Set];
const NUMERIC: &[ValueKind] = &[ValueKind::Number, ValueKind::Integer];
const TEMPORAL: &[ValueKind] = &[ValueKind::Date, ValueKind::Timestamp];

const SECONDS_PER_DAY: f64 = 86_400.0;

/// 1.0 when raw values are equal, else 0.0. Accepts every kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Equality;

impl SimilarityMeasure for Equality {
    fn name(&self) -> &str {
        "equality"
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        Ok(match pair.values() {
            Some((left, right)) if left == right => SimilarityScore::ONE,
            Some(_) => SimilarityScore::ZERO,
            None => SimilarityScore::Undefined,
        })
    }
}

/// Normalized Levenshtein similarity: `1 - distance / max(len)` over chars.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Levenshtein {
    pub fn new() -> Self {
        Self
    }
}

impl SimilarityMeasure for Levenshtein {
    fn name(&self) -> &str {
        "levenshtein"
    }

    fn domain(&self) -> Option<&[ValueKind]> {
        Some(TEXT)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let Some((left, right)) = pair.values() else {
            return Ok(SimilarityScore::Undefined);
        };
        check_values(TEXT, left, right)?;
        let (left, right) = (text_of(left), text_of(right));
        Ok(SimilarityScore::measured(strsim::normalized_levenshtein(
            left, right,
        )))
    }
}

/// Jaro-Winkler similarity, favouring shared prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl SimilarityMeasure for JaroWinkler {
    fn name(&self) -> &str {
        "jaro_winkler"
    }

    fn domain(&self) -> Option<&[ValueKind]> {
        Some(TEXT)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let Some((left, right)) = pair.values() else {
            return Ok(SimilarityScore::Undefined);
        };
        check_values(TEXT, left, right)?;
        Ok(SimilarityScore::measured(strsim::jaro_winkler(
            text_of(left),
            text_of(right),
        )))
    }
}

/// Set-overlap metric used by [`TokenOverlap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMetric {
    /// `|A ∩ B| / |A ∪ B|` over distinct tokens
    Jaccard,
    /// Cosine of the term-frequency vectors
    Cosine,
}

/// Token overlap over whitespace-tokenized, lowercased text or over set
/// elements.
#[derive(Debug, Clone, Copy)]
pub struct TokenOverlap {
    metric: TokenMetric,
}

impl TokenOverlap {
    pub fn jaccard() -> Self {
        Self {
            metric: TokenMetric::Jaccard,
        }
    }

    pub fn cosine() -> Self {
        Self {
            metric: TokenMetric::Cosine,
        }
    }

    pub fn metric(&self) -> TokenMetric {
        self.metric
    }
}

impl SimilarityMeasure for TokenOverlap {
    fn name(&self) -> &str {
        match self.metric {
            TokenMetric::Jaccard => "jaccard",
            TokenMetric::Cosine => "cosine",
        }
    }

    fn domain(&self) -> Option<&[ValueKind]> {
        Some(TOKENS)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let Some((left, right)) = pair.values() else {
            return Ok(SimilarityScore::Undefined);
        };
        check_values(TOKENS, left, right)?;
        let left = term_frequencies(left);
        let right = term_frequencies(right);
        if left.is_empty() && right.is_empty() {
            return Err(MeasureError::Incomparable(
                "no tokens on either side".to_string(),
            ));
        }
        if left.is_empty() || right.is_empty() {
            return Ok(SimilarityScore::ZERO);
        }

        let score = match self.metric {
            TokenMetric::Jaccard => {
                let shared = left.keys().filter(|token| right.contains_key(*token)).count();
                let union = left.len() + right.len() - shared;
                shared as f64 / union as f64
            }
            TokenMetric::Cosine => {
                let dot: usize = left
                    .iter()
                    .filter_map(|(token, count)| right.get(token).map(|other| count * other))
                    .sum();
                let norm = |tf: &BTreeMap<String, usize>| {
                    (tf.values().map(|count| count * count).sum::<usize>() as f64).sqrt()
                };
                dot as f64 / (norm(&left) * norm(&right))
            }
        };
        Ok(SimilarityScore::measured(score))
    }
}

/// Monge-Elkan: for every token, the best inner-measure match among the other
/// side's tokens, averaged. Computed in both directions and averaged so the
/// score does not depend on pair orientation.
#[derive(Debug, Clone)]
pub struct MongeElkan {
    inner: MeasureRef,
}

impl MongeElkan {
    /// `inner` compares single tokens and must accept text.
    pub fn new(inner: MeasureRef) -> Self {
        Self { inner }
    }

    fn directed(&self, attribute: &str, from: &[Value], to: &[Value]) -> Result<f64, MeasureError> {
        let mut total = 0.0;
        for token in from {
            let mut best: f64 = 0.0;
            for candidate in to {
                let pair = AttributePair::new(attribute, Some(token), Some(candidate));
                if let Some(score) = self.inner.similarity(&pair)?.value() {
                    best = best.max(score);
                }
                if best >= 1.0 {
                    break;
                }
            }
            total += best;
        }
        Ok(total / from.len() as f64)
    }
}

impl SimilarityMeasure for MongeElkan {
    fn name(&self) -> &str {
        "monge_elkan"
    }

    fn domain(&self) -> Option<&[ValueKind]> {
        Some(TOKENS)
    }

    fn check_kind(&self, kind: ValueKind) -> Result<(), MeasureError> {
        if !TOKENS.contains(&kind) {
            return Err(MeasureError::TypeMismatch {
                expected: TOKENS.to_vec(),
                found: kind,
            });
        }
        self.inner.check_kind(ValueKind::Text)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let Some((left, right)) = pair.values() else {
            return Ok(SimilarityScore::Undefined);
        };
        check_values(TOKENS, left, right)?;
        let left: Vec<Value> = tokens(left).into_iter().map(Value::Text).collect();
        let right: Vec<Value> = tokens(right).into_iter().map(Value::Text).collect();
        if left.is_empty() && right.is_empty() {
            return Err(MeasureError::Incomparable(
                "no tokens on either side".to_string(),
            ));
        }
        if left.is_empty() || right.is_empty() {
            return Ok(SimilarityScore::ZERO);
        }
        let forward = self.directed(pair.attribute, &left, &right)?;
        let backward = self.directed(pair.attribute, &right, &left)?;
        Ok(SimilarityScore::measured((forward + backward) / 2.0))
    }
}

/// Linear closeness of two numbers: `max(0, 1 - |a - b| / max_difference)`.
#[derive(Debug, Clone, Copy)]
pub struct NumericCloseness {
    max_difference: f64,
}

impl NumericCloseness {
    pub fn new(max_difference: f64) -> Result<Self, ConfigError> {
        if !(max_difference.is_finite() && max_difference > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_difference".to_string(),
                reason: format!("must be finite and positive, got {}", max_difference),
            });
        }
        Ok(Self { max_difference })
    }
}

impl SimilarityMeasure for NumericCloseness {
    fn name(&self) -> &str {
        "numeric"
    }

    fn domain(&self) -> Option<&[ValueKind]> {
        Some(NUMERIC)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let Some((left, right)) = pair.values() else {
            return Ok(SimilarityScore::Undefined);
        };
        check_values(NUMERIC, left, right)?;
        match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Ok(SimilarityScore::measured(
                1.0 - (a - b).abs() / self.max_difference,
            )),
            _ => Err(MeasureError::Incomparable(
                "non-finite number".to_string(),
            )),
        }
    }
}

/// Linear proximity of two dates or timestamps within `max_days`.
#[derive(Debug, Clone, Copy)]
pub struct DateProximity {
    max_days: f64,
}

impl DateProximity {
    pub fn new(max_days: f64) -> Result<Self, ConfigError> {
        if !(max_days.is_finite() && max_days > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_days".to_string(),
                reason: format!("must be finite and positive, got {}", max_days),
            });
        }
        Ok(Self { max_days })
    }
}

impl SimilarityMeasure for DateProximity {
    fn name(&self) -> &str {
        "date_proximity"
    }

    fn domain(&self) -> Option<&[ValueKind]> {
        Some(TEMPORAL)
    }

    fn similarity(&self, pair: &AttributePair<'_>) -> Result<SimilarityScore, MeasureError> {
        let Some((left, right)) = pair.values() else {
            return Ok(SimilarityScore::Undefined);
        };
        check_values(TEMPORAL, left, right)?;
        let (Some(a), Some(b)) = (left.as_unix_seconds(), right.as_unix_seconds()) else {
            return Err(MeasureError::Incomparable(
                "value has no point in time".to_string(),
            ));
        };
        let days = (a as f64 - b as f64).abs() / SECONDS_PER_DAY;
        Ok(SimilarityScore::measured(1.0 - days / self.max_days))
    }
}

fn text_of(value: &Value) -> &str {
    value.as_text().unwrap_or_default()
}

/// Lowercased whitespace tokens of text, or the elements of a set.
pub(crate) fn tokens(value: &Value) -> Vec<String> {
    match value {
        Value::Text(text) => text
            .split_whitespace()
            .map(|token| {
                token
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|token| !token.is_empty())
            .collect(),
        Value::Set(items) => items.iter().cloned().collect(),
        _ => Vec::new(),
    }
}

fn term_frequencies(value: &Value) -> BTreeMap<String, usize> {
    let mut frequencies = BTreeMap::new();
    for token in tokens(value) {
        *frequencies.entry(token).or_insert(0) += 1;
    }
    frequencies
}
