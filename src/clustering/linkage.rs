//! Union-find linkage passes for the three clustering policies.
//!
//! Before each merge the verdicts between the two candidate clusters are
//! tallied by walking the adjacency of the smaller side. That tally drives
//! constraint checks, the majority rule and the conflict report.

use super::{ClusteringStats, NegativeConstraintMode};
use crate::classifier::Outcome;
use crate::conflicts::{ConstraintConflict, Observation};
use crate::dsu::DisjointSet;
use crate::graph::{DuplicateGraph, Edge};
use crate::model::{PairKey, RecordId};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

/// Verdicts between two clusters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossTally {
    pub duplicate: usize,
    pub unknown: usize,
    pub non_duplicate: usize,
    pub duplicate_weight: f64,
    pub non_duplicate_weight: f64,
    /// NonDuplicate pairs, in pair order
    pub blocking: Vec<PairKey>,
}

impl CrossTally {
    /// Share of Duplicate verdicts among all verdicts between the clusters
    pub fn duplicate_fraction(&self) -> f64 {
        let total = self.duplicate + self.unknown + self.non_duplicate;
        if total == 0 {
            0.0
        } else {
            self.duplicate as f64 / total as f64
        }
    }
}

/// Why a merge did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Constraint,
    Size,
    Majority,
}

/// Everything a linkage pass produced
#[derive(Debug, Clone, Default)]
pub(crate) struct LinkOutcome {
    /// Sorted groups, ordered by smallest member
    pub groups: Vec<Vec<RecordId>>,
    pub downgraded: Vec<PairKey>,
    pub observations: Vec<Observation>,
    pub stats: ClusteringStats,
}

/// Union-find state for one clustering run.
pub(crate) struct Linker<'g> {
    graph: &'g DuplicateGraph,
    dsu: DisjointSet,
    /// Slot -> incident edges (positive and negative) with the neighbor slot
    adjacency: Vec<Vec<(u32, Edge)>>,
    mode: NegativeConstraintMode,
    policy: &'static str,
    /// Downgraded edges in processing order
    downgraded: Vec<PairKey>,
    /// Same pairs, for lookups during tallies
    downgraded_set: FxHashSet<PairKey>,
    observations: Vec<Observation>,
    stats: ClusteringStats,
}

impl<'g> Linker<'g> {
    pub fn new(
        graph: &'g DuplicateGraph,
        mode: NegativeConstraintMode,
        policy: &'static str,
    ) -> Self {
        let dsu = DisjointSet::with_records(graph.nodes());
        let mut adjacency = vec![Vec::new(); dsu.len()];
        for edge in graph.all_edges() {
            let (Some(low), Some(high)) =
                (dsu.slot_of(edge.pair.low), dsu.slot_of(edge.pair.high))
            else {
                continue;
            };
            adjacency[low as usize].push((high, *edge));
            adjacency[high as usize].push((low, *edge));
        }
        Self {
            graph,
            dsu,
            adjacency,
            mode,
            policy,
            downgraded: Vec::new(),
            downgraded_set: FxHashSet::default(),
            observations: Vec::new(),
            stats: ClusteringStats::default(),
        }
    }

    /// Duplicate edges in pair order; every negative verdict vetoes.
    pub fn link_strict(&mut self) {
        let edges: Vec<Edge> = self.graph.duplicate_edges().copied().collect();
        for edge in edges {
            self.consider(&edge, |linker, tally, _, _| {
                if tally.non_duplicate > 0 {
                    linker.reject_by_constraint(&edge, tally);
                    return Err(Rejection::Constraint);
                }
                Ok(())
            });
        }
    }

    /// Duplicate edges by descending confidence, optionally capped in size.
    pub fn link_weighted(&mut self, max_cluster_size: Option<usize>) {
        for edge in self.by_confidence() {
            self.consider(&edge, |linker, tally, size_a, size_b| {
                if linker.blocked(tally) {
                    linker.reject_by_constraint(&edge, tally);
                    return Err(Rejection::Constraint);
                }
                if max_cluster_size.is_some_and(|max| size_a + size_b > max) {
                    debug!(
                        "Merge over {} refused: {} + {} exceeds size cap",
                        edge.pair, size_a, size_b
                    );
                    return Err(Rejection::Size);
                }
                Ok(())
            });
        }
    }

    /// Duplicate edges by descending confidence; a merge needs
    /// `min_fraction` of the verdicts between the clusters to be Duplicate.
    pub fn link_majority(&mut self, min_fraction: f64) {
        for edge in self.by_confidence() {
            self.consider(&edge, |linker, tally, _, _| {
                if linker.blocked(tally) {
                    linker.reject_by_constraint(&edge, tally);
                    return Err(Rejection::Constraint);
                }
                if tally.duplicate_fraction() < min_fraction {
                    debug!(
                        "Merge over {} refused: {:.3} of cross verdicts are duplicates",
                        edge.pair,
                        tally.duplicate_fraction()
                    );
                    return Err(Rejection::Majority);
                }
                Ok(())
            });
        }
    }

    pub fn finish(self) -> LinkOutcome {
        LinkOutcome {
            groups: self.dsu.groups(),
            downgraded: self.downgraded,
            observations: self.observations,
            stats: self.stats,
        }
    }

    /// Duplicate edges, most confident first; ties in pair order.
    fn by_confidence(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.graph.duplicate_edges().copied().collect();
        edges.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.pair.cmp(&b.pair))
        });
        edges
    }

    /// Run `check` on the clusters joined by `edge` and merge when it passes.
    fn consider<F>(&mut self, edge: &Edge, check: F)
    where
        F: FnOnce(&mut Self, &CrossTally, usize, usize) -> Result<(), Rejection>,
    {
        self.stats.edges_considered += 1;
        let (Some(a), Some(b)) = (
            self.dsu.find_record(edge.pair.low),
            self.dsu.find_record(edge.pair.high),
        ) else {
            return;
        };
        if a == b {
            return;
        }

        let tally = self.tally(a, b);
        let (size_a, size_b) = (self.dsu.set_size(a), self.dsu.set_size(b));
        match check(self, &tally, size_a, size_b) {
            Ok(()) => {
                self.dsu.union(a, b);
                self.stats.merges += 1;
            }
            Err(Rejection::Constraint) => self.stats.rejected_by_constraint += 1,
            Err(Rejection::Size) => self.stats.rejected_by_size += 1,
            Err(Rejection::Majority) => self.stats.rejected_by_majority += 1,
        }
    }

    /// Count the verdicts between the sets rooted at `a` and `b`.
    fn tally(&self, a: u32, b: u32) -> CrossTally {
        let (small, other) = if self.dsu.members(a).len() <= self.dsu.members(b).len() {
            (a, b)
        } else {
            (b, a)
        };

        let mut tally = CrossTally::default();
        for &member in self.dsu.members(small) {
            for (neighbor, edge) in &self.adjacency[member as usize] {
                if self.dsu.find_root(*neighbor) != other {
                    continue;
                }
                match self.effective_outcome(edge) {
                    Outcome::Duplicate => {
                        tally.duplicate += 1;
                        tally.duplicate_weight += edge.confidence;
                    }
                    Outcome::Unknown => tally.unknown += 1,
                    Outcome::NonDuplicate => {
                        tally.non_duplicate += 1;
                        tally.non_duplicate_weight += edge.confidence;
                        tally.blocking.push(edge.pair);
                    }
                }
            }
        }
        tally.blocking.sort_unstable();
        tally
    }

    /// Downgraded edges count as Unknown from then on.
    fn effective_outcome(&self, edge: &Edge) -> Outcome {
        if edge.outcome == Outcome::Duplicate && self.downgraded_set.contains(&edge.pair) {
            Outcome::Unknown
        } else {
            edge.outcome
        }
    }

    fn blocked(&self, tally: &CrossTally) -> bool {
        if tally.non_duplicate == 0 {
            return false;
        }
        match self.mode {
            NegativeConstraintMode::Veto => true,
            NegativeConstraintMode::Outvoted => {
                tally.non_duplicate_weight >= tally.duplicate_weight
            }
        }
    }

    fn reject_by_constraint(&mut self, edge: &Edge, tally: &CrossTally) {
        warn!(
            "{} merge over {} ({:.3}) blocked by {} negative verdict(s); edge downgraded",
            self.policy,
            edge.pair,
            edge.confidence,
            tally.blocking.len()
        );
        if self.downgraded_set.insert(edge.pair) {
            self.downgraded.push(edge.pair);
        }
        self.observations
            .push(Observation::constraint_conflict(ConstraintConflict::new(
                edge.pair,
                edge.confidence,
                tally.blocking.clone(),
                self.policy,
            )));
    }
}
