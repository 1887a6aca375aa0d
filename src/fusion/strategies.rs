//! Built-in conflict resolution strategies.
//!
//! Narrowing strategies keep the subset of candidates they prefer, in input
//! order, and leave ties for the next strategy in the chain. Computing
//! strategies (mean, sum, union, custom) derive a new value from all
//! candidates.

use super::{Candidate, FusionContext, Resolution, ResolutionStrategy};
use crate::model::{RecordId, Value};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Keep every candidate whose key equals the best key.
fn keep_best<K, F>(candidates: Vec<Candidate>, key: F) -> Resolution
where
    K: PartialOrd,
    F: Fn(&Candidate) -> Option<K>,
{
    let mut best: Option<K> = None;
    for candidate in &candidates {
        if let Some(k) = key(candidate) {
            if best.as_ref().map_or(true, |current| k > *current) {
                best = Some(k);
            }
        }
    }
    let Some(best) = best else {
        return Resolution::Narrowed(Vec::new());
    };
    Resolution::Narrowed(
        candidates
            .into_iter()
            .filter(|candidate| key(candidate).is_some_and(|k| k == best))
            .collect(),
    )
}

fn contributors(candidates: &[Candidate]) -> Vec<RecordId> {
    let mut records: Vec<RecordId> = candidates.iter().map(|c| c.record).collect();
    records.sort_unstable();
    records.dedup();
    records
}

/// Latest timestamp wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostRecent;

impl ResolutionStrategy for MostRecent {
    fn name(&self) -> &str {
        "most_recent"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| candidate.timestamp)
    }

    fn needs_timestamp(&self) -> bool {
        true
    }
}

/// Earliest timestamp wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Earliest;

impl ResolutionStrategy for Earliest {
    fn name(&self) -> &str {
        "earliest"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| candidate.timestamp.map(Reverse))
    }

    fn needs_timestamp(&self) -> bool {
        true
    }
}

/// Candidates from the most trusted source win.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestTrust;

impl ResolutionStrategy for HighestTrust {
    fn name(&self) -> &str {
        "highest_trust"
    }

    fn resolve(&self, candidates: Vec<Candidate>, context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| {
            Some(context.trust.weight(&candidate.source))
        })
    }

    fn needs_trust(&self) -> bool {
        true
    }
}

/// Candidates from the first listed source that has any win.
#[derive(Debug, Clone)]
pub struct PreferSource {
    sources: Vec<String>,
}

impl PreferSource {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResolutionStrategy for PreferSource {
    fn name(&self) -> &str {
        "prefer_source"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        let rank = |candidate: &Candidate| {
            self.sources
                .iter()
                .position(|source| *source == candidate.source)
                .map(Reverse)
        };
        keep_best(candidates, rank)
    }
}

/// Most complete value (characters, set elements) wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Longest;

impl ResolutionStrategy for Longest {
    fn name(&self) -> &str {
        "longest"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| Some(candidate.value.size()))
    }
}

/// Shortest value wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shortest;

impl ResolutionStrategy for Shortest {
    fn name(&self) -> &str {
        "shortest"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| {
            Some(Reverse(candidate.value.size()))
        })
    }
}

/// Most frequent distinct value wins; ties stay for the next strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityVote;

impl ResolutionStrategy for MajorityVote {
    fn name(&self) -> &str {
        "majority_vote"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        let mut counts: BTreeMap<Value, usize> = BTreeMap::new();
        for candidate in &candidates {
            *counts.entry(candidate.value.clone()).or_insert(0) += 1;
        }
        keep_best(candidates, |candidate| counts.get(&candidate.value).copied())
    }
}

/// Distinct value with the highest summed source trust wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedVote;

impl ResolutionStrategy for WeightedVote {
    fn name(&self) -> &str {
        "weighted_vote"
    }

    fn resolve(&self, candidates: Vec<Candidate>, context: &FusionContext<'_>) -> Resolution {
        let mut totals: BTreeMap<Value, f64> = BTreeMap::new();
        for candidate in &candidates {
            *totals.entry(candidate.value.clone()).or_insert(0.0) +=
                context.trust.weight(&candidate.source);
        }
        keep_best(candidates, |candidate| totals.get(&candidate.value).copied())
    }

    fn needs_trust(&self) -> bool {
        true
    }
}

/// Largest value wins. Values of different kinds order by kind first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Maximum;

impl ResolutionStrategy for Maximum {
    fn name(&self) -> &str {
        "max"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| Some(candidate.value.clone()))
    }
}

/// Smallest value wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minimum;

impl ResolutionStrategy for Minimum {
    fn name(&self) -> &str {
        "min"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| {
            Some(Reverse(candidate.value.clone()))
        })
    }
}

/// Takes the value from the record(s) that won an earlier attribute, so
/// related fields (street and city, say) stay together.
#[derive(Debug, Clone)]
pub struct Corresponding {
    attribute: String,
}

impl Corresponding {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

impl ResolutionStrategy for Corresponding {
    fn name(&self) -> &str {
        "corresponding"
    }

    fn resolve(&self, candidates: Vec<Candidate>, context: &FusionContext<'_>) -> Resolution {
        let Some(winners) = context.resolved.get(&self.attribute) else {
            return Resolution::Narrowed(Vec::new());
        };
        Resolution::Narrowed(
            candidates
                .into_iter()
                .filter(|candidate| winners.contains(&candidate.record))
                .collect(),
        )
    }

    fn depends_on(&self) -> Option<&str> {
        Some(self.attribute.as_str())
    }
}

/// Arithmetic mean of numeric candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl ResolutionStrategy for Mean {
    fn name(&self) -> &str {
        "mean"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        let numbers: Option<Vec<f64>> = candidates.iter().map(|c| c.value.as_f64()).collect();
        match numbers {
            Some(numbers) if !numbers.is_empty() => Resolution::Computed {
                value: Value::number(numbers.iter().sum::<f64>() / numbers.len() as f64),
                contributors: contributors(&candidates),
            },
            _ => Resolution::Narrowed(candidates),
        }
    }
}

/// Sum of numeric candidates; stays an integer when every input is one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl ResolutionStrategy for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        if candidates.is_empty() {
            return Resolution::Narrowed(candidates);
        }
        let integers: Option<Vec<i64>> = candidates
            .iter()
            .map(|c| match c.value {
                Value::Integer(value) => Some(value),
                _ => None,
            })
            .collect();
        let value = if let Some(total) = integers.and_then(|values| {
            values
                .into_iter()
                .try_fold(0_i64, |acc, value| acc.checked_add(value))
        }) {
            Value::Integer(total)
        } else {
            let numbers: Option<Vec<f64>> =
                candidates.iter().map(|c| c.value.as_f64()).collect();
            match numbers {
                Some(numbers) => Value::number(numbers.iter().sum()),
                None => return Resolution::Narrowed(candidates),
            }
        };
        Resolution::Computed {
            value,
            contributors: contributors(&candidates),
        }
    }
}

/// Union of set elements; text values join as single elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Union;

impl ResolutionStrategy for Union {
    fn name(&self) -> &str {
        "union"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        let mut items = BTreeSet::new();
        for candidate in &candidates {
            match &candidate.value {
                Value::Set(values) => items.extend(values.iter().cloned()),
                Value::Text(text) => {
                    items.insert(text.clone());
                }
                _ => return Resolution::Narrowed(candidates),
            }
        }
        if items.is_empty() {
            return Resolution::Narrowed(candidates);
        }
        Resolution::Computed {
            value: Value::Set(items),
            contributors: contributors(&candidates),
        }
    }
}

/// Candidate from the lowest record id wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct First;

impl ResolutionStrategy for First {
    fn name(&self) -> &str {
        "first"
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        keep_best(candidates, |candidate| Some(Reverse(candidate.record)))
    }
}

type MergeFn = dyn Fn(&[Candidate]) -> Option<Value> + Send + Sync;

/// Caller-supplied merge function. Returning `None` leaves the candidates
/// untouched for the next strategy.
#[derive(Clone)]
pub struct Custom {
    name: String,
    merge: Arc<MergeFn>,
}

impl Custom {
    pub fn new<F>(name: impl Into<String>, merge: F) -> Self
    where
        F: Fn(&[Candidate]) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            merge: Arc::new(merge),
        }
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom").field("name", &self.name).finish()
    }
}

impl ResolutionStrategy for Custom {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, candidates: Vec<Candidate>, _context: &FusionContext<'_>) -> Resolution {
        match (self.merge)(&candidates) {
            Some(value) => Resolution::Computed {
                value,
                contributors: contributors(&candidates),
            },
            None => Resolution::Narrowed(candidates),
        }
    }
}
