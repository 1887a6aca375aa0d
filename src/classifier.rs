//! # Pairwise Classifier
//!
//! Turns a record pair into a [`Verdict`]. Classifiers are stateless, so a
//! candidate batch is evaluated in parallel by [`classify_candidates`] and
//! the verdicts come back in candidate order.

use crate::conflicts::Observation;
use crate::error::{ConfigError, Result};
use crate::model::{PairKey, Record, RecordId};
use crate::similarity::combinators::{validate_weights, weighted_mean};
use crate::similarity::{AttributePair, MeasureError, MeasureRef, SimilarityScore};
use crate::store::RecordStore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, instrument, warn};

/// Classification outcome for one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Duplicate,
    NonDuplicate,
    /// Needs human review
    Unknown,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Duplicate => "duplicate",
            Outcome::NonDuplicate => "non-duplicate",
            Outcome::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// The decision about one pair. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub left: RecordId,
    pub right: RecordId,
    pub outcome: Outcome,
    /// Always within `[0, 1]`
    pub confidence: f64,
}

impl Verdict {
    pub fn new(left: RecordId, right: RecordId, outcome: Outcome, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            left,
            right,
            outcome,
            confidence,
        }
    }

    pub fn duplicate(left: RecordId, right: RecordId, confidence: f64) -> Self {
        Self::new(left, right, Outcome::Duplicate, confidence)
    }

    pub fn non_duplicate(left: RecordId, right: RecordId, confidence: f64) -> Self {
        Self::new(left, right, Outcome::NonDuplicate, confidence)
    }

    pub fn unknown(left: RecordId, right: RecordId, confidence: f64) -> Self {
        Self::new(left, right, Outcome::Unknown, confidence)
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(self.left, self.right)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({:.3})", self.pair(), self.outcome, self.confidence)
    }
}

/// A verdict together with how it was reached.
#[derive(Debug, Clone)]
pub struct Classification {
    pub verdict: Verdict,
    /// Aggregate score the outcome was derived from
    pub score: SimilarityScore,
    /// Name of the rule that decided, for rule-based classifiers
    pub rule: Option<String>,
    pub observations: Vec<Observation>,
}

impl Classification {
    fn new(verdict: Verdict, score: SimilarityScore) -> Self {
        Self {
            verdict,
            score,
            rule: None,
            observations: Vec::new(),
        }
    }
}

/// Decides whether two records describe the same entity.
pub trait Classifier: Send + Sync {
    fn classify(&self, left: &Record, right: &Record) -> Result<Classification>;

    /// Check every record against the classifier's configuration before any
    /// pair is classified.
    fn validate(&self, _records: &dyn RecordStore) -> Result<()> {
        Ok(())
    }
}

/// Duplicate / non-duplicate score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub duplicate: f64,
    pub non_duplicate: f64,
}

impl Thresholds {
    pub fn new(duplicate: f64, non_duplicate: f64) -> Result<Self, ConfigError> {
        let thresholds = Self {
            duplicate,
            non_duplicate,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("duplicate_threshold", self.duplicate)?;
        check_unit("non_duplicate_threshold", self.non_duplicate)?;
        if self.duplicate < self.non_duplicate {
            return Err(ConfigError::ThresholdOrder {
                duplicate: self.duplicate,
                non_duplicate: self.non_duplicate,
            });
        }
        Ok(())
    }

    /// Map an aggregate score to an outcome and its confidence.
    pub fn decide(&self, score: SimilarityScore) -> (Outcome, f64) {
        match score.value() {
            None => (Outcome::Unknown, 0.0),
            Some(score) if score >= self.duplicate => (Outcome::Duplicate, score),
            Some(score) if score < self.non_duplicate => (Outcome::NonDuplicate, 1.0 - score),
            Some(score) => (Outcome::Unknown, score),
        }
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdRange { name, value });
    }
    Ok(())
}

/// One attribute's measure and weight.
#[derive(Debug, Clone)]
pub struct AttributeRule {
    pub attribute: String,
    pub measure: MeasureRef,
    pub weight: f64,
}

impl AttributeRule {
    pub fn new(attribute: impl Into<String>, measure: MeasureRef, weight: f64) -> Self {
        Self {
            attribute: attribute.into(),
            measure,
            weight,
        }
    }
}

/// Weighted aggregation of per-attribute similarities, thresholded into a
/// verdict.
#[derive(Debug, Clone)]
pub struct WeightedClassifier {
    rules: Vec<AttributeRule>,
    thresholds: Thresholds,
    exact_match_override: bool,
}

impl WeightedClassifier {
    pub fn new(rules: Vec<AttributeRule>, thresholds: Thresholds) -> Result<Self, ConfigError> {
        validate_weights(
            "matching.attributes",
            rules
                .iter()
                .map(|rule| (rule.attribute.clone(), rule.weight)),
        )?;
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.attribute.as_str()) {
                return Err(ConfigError::InvalidParameter {
                    name: rule.attribute.clone(),
                    reason: "attribute configured more than once".to_string(),
                });
            }
        }
        thresholds.validate()?;
        Ok(Self {
            rules,
            thresholds,
            exact_match_override: true,
        })
    }

    /// Toggle the identical-value shortcut (on by default).
    pub fn with_exact_match_override(mut self, enabled: bool) -> Self {
        self.exact_match_override = enabled;
        self
    }

    pub fn rules(&self) -> &[AttributeRule] {
        &self.rules
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Aggregate score of a pair, recording recoverable measurement issues.
    pub fn score(
        &self,
        left: &Record,
        right: &Record,
        observations: &mut Vec<Observation>,
    ) -> Result<SimilarityScore> {
        if self.exact_match_override
            && !left.attributes.is_empty()
            && left.same_attributes(right)
        {
            return Ok(SimilarityScore::ONE);
        }

        let key = PairKey::new(left.id, right.id);
        let mut scores = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let view = AttributePair::of(&rule.attribute, left, right);
            let score = if self.exact_match_override && view.is_identical() {
                SimilarityScore::ONE
            } else {
                measure_attribute(key, &rule.attribute, &rule.measure, &view, observations)?
            };
            scores.push((rule.weight, score));
        }
        Ok(weighted_mean(scores))
    }
}

impl Classifier for WeightedClassifier {
    fn classify(&self, left: &Record, right: &Record) -> Result<Classification> {
        let mut observations = Vec::new();
        let score = self.score(left, right, &mut observations)?;
        let (outcome, confidence) = self.thresholds.decide(score);
        let mut classification =
            Classification::new(Verdict::new(left.id, right.id, outcome, confidence), score);
        classification.observations = observations;
        Ok(classification)
    }

    fn validate(&self, records: &dyn RecordStore) -> Result<()> {
        check_domains(
            records,
            self.rules
                .iter()
                .map(|rule| (rule.attribute.as_str(), &rule.measure)),
        )
    }
}

/// Evaluate one measure. Type mismatches are fatal; incomparable values are
/// recorded and scored as undefined.
fn measure_attribute(
    key: PairKey,
    attribute: &str,
    measure: &MeasureRef,
    view: &AttributePair<'_>,
    observations: &mut Vec<Observation>,
) -> Result<SimilarityScore> {
    match measure.similarity(view) {
        Ok(score) => Ok(score),
        Err(MeasureError::TypeMismatch { expected, found }) => Err(ConfigError::TypeMismatch {
            attribute: attribute.to_string(),
            measure: measure.name().to_string(),
            expected,
            found,
        }
        .into()),
        Err(MeasureError::Incomparable(reason)) => {
            warn!(
                "Measure {} could not compare {} on {}: {}",
                measure.name(),
                attribute,
                key,
                reason
            );
            observations.push(Observation::measurement(
                key,
                attribute,
                measure.name(),
                reason,
            ));
            Ok(SimilarityScore::Undefined)
        }
    }
}

fn check_domains<'a, I>(records: &dyn RecordStore, measures: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a MeasureRef)>,
{
    let measures: Vec<_> = measures.into_iter().collect();
    for id in records.record_ids() {
        let record = records.require(id)?;
        for (attribute, measure) in &measures {
            let Some(value) = record.get(attribute) else {
                continue;
            };
            if let Err(MeasureError::TypeMismatch { expected, found }) =
                measure.check_kind(value.kind())
            {
                return Err(ConfigError::TypeMismatch {
                    attribute: attribute.to_string(),
                    measure: measure.name().to_string(),
                    expected,
                    found,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Whether a matching rule asserts or denies duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Positive,
    Negative,
}

/// Fires when its measure reaches `threshold` on `attribute`.
#[derive(Debug, Clone)]
pub struct MatchRule {
    pub name: String,
    pub kind: RuleKind,
    pub attribute: String,
    pub measure: MeasureRef,
    pub threshold: f64,
}

impl MatchRule {
    pub fn positive(
        name: impl Into<String>,
        attribute: impl Into<String>,
        measure: MeasureRef,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RuleKind::Positive,
            attribute: attribute.into(),
            measure,
            threshold,
        }
    }

    pub fn negative(
        name: impl Into<String>,
        attribute: impl Into<String>,
        measure: MeasureRef,
        threshold: f64,
    ) -> Self {
        Self {
            kind: RuleKind::Negative,
            ..Self::positive(name, attribute, measure, threshold)
        }
    }
}

/// Ordered rules; the first rule that fires decides. No rule firing yields
/// Unknown with confidence 0.
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    rules: Vec<MatchRule>,
}

impl RuleClassifier {
    pub fn new(rules: Vec<MatchRule>) -> Result<Self, ConfigError> {
        if rules.is_empty() {
            return Err(ConfigError::Empty("rules".to_string()));
        }
        for rule in &rules {
            check_unit("rule threshold", rule.threshold)?;
        }
        Ok(Self { rules })
    }
}

impl Classifier for RuleClassifier {
    fn classify(&self, left: &Record, right: &Record) -> Result<Classification> {
        let key = PairKey::new(left.id, right.id);
        let mut observations = Vec::new();
        for rule in &self.rules {
            let view = AttributePair::of(&rule.attribute, left, right);
            let score =
                measure_attribute(key, &rule.attribute, &rule.measure, &view, &mut observations)?;
            let Some(value) = score.value() else {
                continue;
            };
            if value < rule.threshold {
                continue;
            }
            let outcome = match rule.kind {
                RuleKind::Positive => Outcome::Duplicate,
                RuleKind::Negative => Outcome::NonDuplicate,
            };
            let mut classification =
                Classification::new(Verdict::new(left.id, right.id, outcome, value), score);
            classification.rule = Some(rule.name.clone());
            classification.observations = observations;
            return Ok(classification);
        }
        let mut classification = Classification::new(
            Verdict::unknown(left.id, right.id, 0.0),
            SimilarityScore::Undefined,
        );
        classification.observations = observations;
        Ok(classification)
    }

    fn validate(&self, records: &dyn RecordStore) -> Result<()> {
        check_domains(
            records,
            self.rules
                .iter()
                .map(|rule| (rule.attribute.as_str(), &rule.measure)),
        )
    }
}

/// Looks pairs up in a known set of true duplicates. Useful for evaluating
/// clustering and fusion against a gold standard.
#[derive(Debug, Clone, Default)]
pub struct OracleClassifier {
    duplicates: BTreeSet<PairKey>,
}

impl OracleClassifier {
    pub fn new<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (RecordId, RecordId)>,
    {
        Self {
            duplicates: pairs
                .into_iter()
                .map(|(left, right)| PairKey::new(left, right))
                .collect(),
        }
    }
}

impl Classifier for OracleClassifier {
    fn classify(&self, left: &Record, right: &Record) -> Result<Classification> {
        let verdict = if self.duplicates.contains(&PairKey::new(left.id, right.id)) {
            Verdict::duplicate(left.id, right.id, 1.0)
        } else {
            Verdict::non_duplicate(left.id, right.id, 1.0)
        };
        let score = match verdict.outcome {
            Outcome::Duplicate => SimilarityScore::ONE,
            _ => SimilarityScore::ZERO,
        };
        Ok(Classification::new(verdict, score))
    }
}

/// Verdicts for a candidate batch, in candidate order.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedBatch {
    pub verdicts: Vec<Verdict>,
    pub observations: Vec<Observation>,
}

/// Classify every candidate pair in parallel.
///
/// Unknown identifiers fail the whole batch before any pair is classified.
/// Self pairs are skipped with an observation.
#[instrument(skip(classifier, records, candidates), level = "debug")]
pub fn classify_candidates<C>(
    classifier: &C,
    records: &dyn RecordStore,
    candidates: &[(RecordId, RecordId)],
) -> Result<ClassifiedBatch>
where
    C: Classifier + ?Sized,
{
    for &(left, right) in candidates {
        records.require(left)?;
        records.require(right)?;
    }

    let results = candidates
        .par_iter()
        .map(|&(left, right)| -> Result<(Option<Verdict>, Vec<Observation>)> {
            if left == right {
                return Ok((None, vec![Observation::SelfPair { record: left }]));
            }
            let classification =
                classifier.classify(records.require(left)?, records.require(right)?)?;
            Ok((Some(classification.verdict), classification.observations))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut batch = ClassifiedBatch::default();
    for (verdict, observations) in results {
        for observation in &observations {
            if let Observation::SelfPair { record } = observation {
                warn!("Skipping self pair for record {}", record);
            }
        }
        batch.verdicts.extend(verdict);
        batch.observations.extend(observations);
    }

    debug!(
        "Classified {} candidates into {} verdicts ({} observations)",
        candidates.len(),
        batch.verdicts.len(),
        batch.observations.len()
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DedupeError;
    use crate::model::Value;
    use crate::similarity::{Equality, Levenshtein, NumericCloseness, TokenOverlap};
    use crate::store::RecordSet;
    use std::sync::Arc;

    fn person(id: u32, name: &str, email: &str) -> Record {
        Record::new(RecordId(id), "crm")
            .with("name", name)
            .with("email", email)
    }

    fn name_email_classifier() -> WeightedClassifier {
        WeightedClassifier::new(
            vec![
                AttributeRule::new("name", Arc::new(Levenshtein), 0.5),
                AttributeRule::new("email", Arc::new(Equality), 0.5),
            ],
            Thresholds::new(0.85, 0.5).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_typo_with_identical_email_is_duplicate() {
        let classifier = name_email_classifier();
        let left = person(1, "Jonathan Smith", "jon@example.com");
        let right = person(2, "Jonathon Smith", "jon@example.com");
        let classification = classifier.classify(&left, &right).unwrap();
        assert_eq!(classification.verdict.outcome, Outcome::Duplicate);
        assert!(classification.verdict.confidence > 0.95);
    }

    #[test]
    fn test_identical_records_are_duplicates_regardless_of_weights() {
        let classifier = WeightedClassifier::new(
            vec![
                AttributeRule::new("name", Arc::new(TokenOverlap::jaccard()), 0.9),
                AttributeRule::new("email", Arc::new(Equality), 0.1),
            ],
            Thresholds::new(0.99, 0.99).unwrap(),
        )
        .unwrap();
        let left = person(1, "A B", "x@y");
        let right = person(2, "A B", "x@y");
        let verdict = classifier.classify(&left, &right).unwrap().verdict;
        assert_eq!(verdict.outcome, Outcome::Duplicate);
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_non_duplicate_confidence_is_complement() {
        let classifier = name_email_classifier();
        let left = person(1, "abcd", "a@x");
        let right = person(2, "wxyz", "b@x");
        let verdict = classifier.classify(&left, &right).unwrap().verdict;
        assert_eq!(verdict.outcome, Outcome::NonDuplicate);
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_unmeasurable_pair_is_unknown_with_zero_confidence() {
        let classifier = name_email_classifier();
        let left = Record::new(RecordId(1), "crm").with("phone", "1");
        let right = Record::new(RecordId(2), "crm").with("phone", "2");
        let classification = classifier.classify(&left, &right).unwrap();
        assert!(classification.score.is_undefined());
        assert_eq!(classification.verdict.outcome, Outcome::Unknown);
        assert_eq!(classification.verdict.confidence, 0.0);
    }

    #[test]
    fn test_incomparable_values_are_observed() {
        let classifier = WeightedClassifier::new(
            vec![
                AttributeRule::new("tags", Arc::new(TokenOverlap::jaccard()), 0.5),
                AttributeRule::new("email", Arc::new(Equality), 0.5),
            ],
            Thresholds::new(0.8, 0.2).unwrap(),
        )
        .unwrap();
        let left = Record::new(RecordId(1), "crm")
            .with("tags", Value::set(Vec::<String>::new()))
            .with("email", "a");
        let right = Record::new(RecordId(2), "crm")
            .with("tags", Value::text("  "))
            .with("email", "a");
        let classification = classifier.classify(&left, &right).unwrap();
        assert_eq!(classification.observations.len(), 1);
        assert_eq!(classification.verdict.outcome, Outcome::Duplicate);
    }

    #[test]
    fn test_threshold_configuration_is_checked() {
        assert!(matches!(
            Thresholds::new(0.4, 0.6),
            Err(ConfigError::ThresholdOrder { .. })
        ));
        assert!(matches!(
            Thresholds::new(1.2, 0.6),
            Err(ConfigError::ThresholdRange { .. })
        ));
        let duplicated = WeightedClassifier::new(
            vec![
                AttributeRule::new("name", Arc::new(Equality), 0.5),
                AttributeRule::new("name", Arc::new(Levenshtein), 0.5),
            ],
            Thresholds::new(0.8, 0.2).unwrap(),
        );
        assert!(duplicated.is_err());
    }

    #[test]
    fn test_validate_fails_fast_on_type_mismatch() {
        let classifier = WeightedClassifier::new(
            vec![AttributeRule::new(
                "age",
                Arc::new(NumericCloseness::new(5.0).unwrap()),
                1.0,
            )],
            Thresholds::new(0.9, 0.1).unwrap(),
        )
        .unwrap();
        let records = RecordSet::from_records(vec![
            Record::new(RecordId(1), "crm").with("age", 30_i64),
            Record::new(RecordId(2), "crm").with("age", "thirty"),
        ])
        .unwrap();
        let err = classifier.validate(&records).unwrap_err();
        assert!(matches!(
            err,
            DedupeError::Config(ConfigError::TypeMismatch { .. })
        ));

        let err = classifier
            .classify(
                records.get_record(RecordId(1)).unwrap(),
                records.get_record(RecordId(2)).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DedupeError::Config(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_rule_classifier_first_rule_wins() {
        let classifier = RuleClassifier::new(vec![
            MatchRule::negative(
                "different-birthyear",
                "birthyear",
                Arc::new(crate::similarity::Inverted::new(Arc::new(Equality))),
                1.0,
            ),
            MatchRule::positive("same-email", "email", Arc::new(Equality), 1.0),
        ])
        .unwrap();

        let left = person(1, "a", "x@y").with("birthyear", 1980_i64);
        let same = person(2, "b", "x@y").with("birthyear", 1980_i64);
        let other = person(3, "c", "x@y").with("birthyear", 1990_i64);
        let stranger = person(4, "d", "z@y");

        let first = classifier.classify(&left, &same).unwrap();
        assert_eq!(first.verdict.outcome, Outcome::Duplicate);
        assert_eq!(first.rule.as_deref(), Some("same-email"));

        let second = classifier.classify(&left, &other).unwrap();
        assert_eq!(second.verdict.outcome, Outcome::NonDuplicate);

        let third = classifier.classify(&left, &stranger).unwrap();
        assert_eq!(third.verdict.outcome, Outcome::Unknown);
        assert_eq!(third.verdict.confidence, 0.0);
    }

    #[test]
    fn test_oracle_classifier() {
        let oracle = OracleClassifier::new([(RecordId(2), RecordId(1))]);
        let a = person(1, "a", "a");
        let b = person(2, "b", "b");
        let c = person(3, "c", "c");
        assert_eq!(oracle.classify(&a, &b).unwrap().verdict.outcome, Outcome::Duplicate);
        assert_eq!(
            oracle.classify(&a, &c).unwrap().verdict.outcome,
            Outcome::NonDuplicate
        );
    }

    #[test]
    fn test_batch_preserves_candidate_order_and_skips_self_pairs() {
        let records = RecordSet::from_records((1..=4).map(|i| person(i, "n", "e"))).unwrap();
        let candidates = vec![
            (RecordId(3), RecordId(4)),
            (RecordId(2), RecordId(2)),
            (RecordId(1), RecordId(2)),
        ];
        let batch =
            classify_candidates(&name_email_classifier(), &records, &candidates).unwrap();
        let pairs: Vec<_> = batch.verdicts.iter().map(Verdict::pair).collect();
        assert_eq!(
            pairs,
            vec![
                PairKey::new(RecordId(3), RecordId(4)),
                PairKey::new(RecordId(1), RecordId(2)),
            ]
        );
        assert_eq!(
            batch.observations,
            vec![Observation::SelfPair {
                record: RecordId(2)
            }]
        );
    }

    #[test]
    fn test_batch_rejects_unknown_records() {
        let records = RecordSet::from_records(vec![person(1, "n", "e")]).unwrap();
        let err = classify_candidates(
            &name_email_classifier(),
            &records,
            &[(RecordId(1), RecordId(9))],
        )
        .unwrap_err();
        assert!(matches!(err, DedupeError::UnknownRecord(RecordId(9))));
    }

    #[test]
    fn test_batch_classifies_repeated_candidates_each_time() {
        let records = RecordSet::from_records((1..=2).map(|i| person(i, "n", "e"))).unwrap();
        let candidates = vec![(RecordId(1), RecordId(2)), (RecordId(2), RecordId(1))];
        let batch =
            classify_candidates(&name_email_classifier(), &records, &candidates).unwrap();
        assert_eq!(batch.verdicts.len(), 2);
        assert_eq!(batch.verdicts[0].pair(), batch.verdicts[1].pair());
        assert_eq!(batch.verdicts[1].left, RecordId(2));
    }

    #[test]
    fn test_identical_records_outside_configured_attributes_are_duplicates() {
        let left = Record::new(RecordId(1), "crm").with("city", "Oslo");
        let right = Record::new(RecordId(2), "erp").with("city", "Oslo");
        let verdict = name_email_classifier().classify(&left, &right).unwrap().verdict;
        assert_eq!(verdict.outcome, Outcome::Duplicate);
        assert_eq!(verdict.confidence, 1.0);

        let empty = Record::new(RecordId(3), "crm");
        let other = Record::new(RecordId(4), "crm");
        let verdict = name_email_classifier().classify(&empty, &other).unwrap().verdict;
        assert_eq!(verdict.outcome, Outcome::Unknown);
    }
}
