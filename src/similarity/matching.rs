//! Collection similarity through one-to-one element matching.
//!
//! Elements of the two collections are paired by a weakly stable marriage
//! over their inner-measure scores, and the matched scores are summed and
//! divided by the larger collection size. Unlike Monge-Elkan, an element is
//! used at most once, so repeated tokens on one side cannot all claim the
//! same partner.

use super::measures::tokens;
use super::{check_values, AttributePair, MeasureError, MeasureRef, SimilarityMeasure, SimilarityScore};
use crate::model::{Value, ValueKind};
use std::collections::VecDeque;

const TOKENS: &[ValueKind] = &[ValueKind::Text, ValueKind::Set];

/// Dense pairwise scores between `rows` proposers and `cols` acceptors;
/// `None` marks an unmeasurable pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    rows: usize,
    cols: usize,
    scores: Vec<Option<f64>>,
}

impl ScoreTable {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            scores: vec![None; rows * cols],
        }
    }

    pub fn set(&mut self, row: usize, col: usize, score: Option<f64>) {
        self.scores[row * self.cols + col] = score;
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.scores[row * self.cols + col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The same scores seen from the other side.
    pub fn transposed(&self) -> Self {
        let mut table = Self::new(self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                table.set(col, row, self.get(row, col));
            }
        }
        table
    }
}

/// Weakly stable marriage with ties (Gale-Shapley, proposers on the rows).
///
/// `proposers` holds each row's scores of the columns and `acceptors` each
/// column's scores of the rows. Only pairs scored on both sides may match.
/// Proposers try columns by descending score, lower index first on ties; an
/// acceptor trades up only for a strictly better score. Returns
/// `(row, col)` pairs in row order.
pub fn stable_marriage(proposers: &ScoreTable, acceptors: &ScoreTable) -> Vec<(usize, usize)> {
    let (rows, cols) = (proposers.rows(), proposers.cols());
    debug_assert_eq!((acceptors.rows(), acceptors.cols()), (cols, rows));

    let preferences: Vec<Vec<usize>> = (0..rows)
        .map(|row| {
            let mut ranked: Vec<(usize, f64)> = (0..cols)
                .filter(|&col| acceptors.get(col, row).is_some())
                .filter_map(|col| proposers.get(row, col).map(|score| (col, score)))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            ranked.into_iter().map(|(col, _)| col).collect()
        })
        .collect();

    let mut next = vec![0usize; rows];
    let mut engaged: Vec<Option<usize>> = vec![None; cols];
    let mut free: VecDeque<usize> = (0..rows).collect();

    while let Some(row) = free.pop_front() {
        let Some(&col) = preferences[row].get(next[row]) else {
            continue;
        };
        next[row] += 1;
        match engaged[col] {
            None => engaged[col] = Some(row),
            Some(current) => {
                let rank = |candidate: usize| acceptors.get(col, candidate).unwrap_or(f64::NEG_INFINITY);
                if rank(row) > rank(current) {
                    engaged[col] = Some(row);
                    free.push_back(current);
                } else {
                    free.push_back(row);
                }
            }
        }
    }

    let mut pairs: Vec<(usize, usize)> = engaged
        .iter()
        .enumerate()
        .filter_map(|(col, row)| row.map(|row| (row, col)))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Sum of inner-measure scores over a stable one-to-one matching of the
/// tokens (or set elements), divided by the larger side's size. Each side
/// proposes once and the two results are averaged so the score does not
/// depend on pair orientation.
#[derive(Debug, Clone)]
pub struct MatchingSimilarity {
    inner: MeasureRef,
}

impl MatchingSimilarity {
    /// `inner` compares single elements and must accept text.
    pub fn new(inner: MeasureRef) -> Self {
        Self { inner }
    }

    fn scores(&self, attribute: &str, from: &[Value], to: &[Value]) -> Result<ScoreTable, MeasureError> {
        let mut table = ScoreTable::new(from.len(), to.len());
        for (row, left) in from.iter().enumerate() {
            for (col, right) in to.iter().enumerate() {
                let pair = AttributePair::new(attribute, Some(left), Some(right));
                table.set(row, col, self.inner.similarity(&pair)?.value());
            }
        }
        Ok(table)
    }
}

fn matched_weight(proposers: &ScoreTable, acceptors: &ScoreTable) -> f64 {
    stable_marriage(proposers, acceptors)
        .into_iter()
        .filter_map(|(row, col)| proposers.get(row, col))
        .sum()
}

impl SimilarityMeasure for MatchingSimilarity {
    fn name(&self) -> &str {
        "matching"
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
                "no elements on either side".to_string(),
            ));
        }
        if left.is_empty() || right.is_empty() {
            return Ok(SimilarityScore::ZERO);
        }

        let forward = self.scores(pair.attribute, &left, &right)?;
        let backward = self.scores(pair.attribute, &right, &left)?;
        let larger = left.len().max(right.len()) as f64;
        let left_proposing = matched_weight(&forward, &backward);
        let right_proposing = matched_weight(&backward, &forward);
        Ok(SimilarityScore::measured(
            (left_proposing + right_proposing) / (2.0 * larger),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{Equality, Levenshtein, MongeElkan};
    use std::sync::Arc;

    fn table(rows: &[&[f64]]) -> ScoreTable {
        let cols = rows.first().map_or(0, |row| row.len());
        let mut table = ScoreTable::new(rows.len(), cols);
        for (row, scores) in rows.iter().enumerate() {
            for (col, &score) in scores.iter().enumerate() {
                table.set(row, col, Some(score));
            }
        }
        table
    }

    fn score(measure: &dyn SimilarityMeasure, left: Value, right: Value) -> Option<f64> {
        let pair = AttributePair::new("tags", Some(&left), Some(&right));
        measure.similarity(&pair).unwrap().value()
    }

    #[test]
    fn test_acceptor_trades_up_for_a_better_proposer() {
        let scores = table(&[&[0.9, 0.8], &[0.95, 0.1]]);
        let pairs = stable_marriage(&scores, &scores.transposed());
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_ties_keep_the_first_engagement() {
        let scores = table(&[&[0.5], &[0.5]]);
        assert_eq!(stable_marriage(&scores, &scores.transposed()), vec![(0, 0)]);
    }

    #[test]
    fn test_unscored_pairs_never_match() {
        let mut scores = ScoreTable::new(2, 2);
        scores.set(0, 0, Some(0.7));
        scores.set(1, 0, Some(0.9));
        let pairs = stable_marriage(&scores, &scores.transposed());
        assert_eq!(pairs, vec![(1, 0)]);
    }

    #[test]
    fn test_element_order_does_not_matter() {
        let measure = MatchingSimilarity::new(Arc::new(Equality));
        assert_eq!(
            score(&measure, Value::set(["apple", "banana"]), Value::set(["banana", "apple"])),
            Some(1.0)
        );
    }

    #[test]
    fn test_elements_are_matched_at_most_once() {
        let matching = MatchingSimilarity::new(Arc::new(Equality));
        let monge_elkan = MongeElkan::new(Arc::new(Equality));
        let left = Value::text("jon jon");
        let right = Value::text("jon smith");
        assert_eq!(score(&matching, left.clone(), right.clone()), Some(0.5));
        assert_eq!(score(&monge_elkan, left, right), Some(0.75));
    }

    #[test]
    fn test_score_is_normalized_by_larger_side() {
        let measure = MatchingSimilarity::new(Arc::new(Equality));
        let value = score(&measure, Value::set(["a", "b", "c"]), Value::set(["a"])).unwrap();
        assert!((value - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(
            score(&measure, Value::set(["a"]), Value::set(["a", "b", "c"])),
            Some(value)
        );
    }

    #[test]
    fn test_fuzzy_inner_measure() {
        let measure = MatchingSimilarity::new(Arc::new(Levenshtein::new()));
        let value = score(&measure, Value::text("acme widgets"), Value::text("widgets acme")).unwrap();
        assert_eq!(value, 1.0);
        let typo = score(&measure, Value::text("acme widgets"), Value::text("acme widgtes")).unwrap();
        assert!(typo > 0.8 && typo < 1.0);
    }

    #[test]
    fn test_domain_and_empty_sides() {
        let measure = MatchingSimilarity::new(Arc::new(Equality));
        assert!(matches!(
            measure.check_kind(ValueKind::Integer),
            Err(MeasureError::TypeMismatch { .. })
        ));
        assert_eq!(score(&measure, Value::set(["a"]), Value::set(Vec::<String>::new())), Some(0.0));
        let empty = Value::set(Vec::<String>::new());
        let pair = AttributePair::new("tags", Some(&empty), Some(&empty));
        assert!(matches!(
            measure.similarity(&pair),
            Err(MeasureError::Incomparable(_))
        ));
    }
}
