//! # Duplicate Graph Module
//!
//! Sparse graph of pairwise verdicts for one resolution batch. Duplicate and
//! Unknown verdicts are edges; NonDuplicate verdicts are kept apart as
//! negative constraints that may veto a transitive merge.

use crate::classifier::{Outcome, Verdict};
use crate::model::{PairKey, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A classified pair inside the graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub pair: PairKey,
    pub outcome: Outcome,
    pub confidence: f64,
}

impl Edge {
    /// Signed cohesion weight: `+confidence` for Duplicate, `-confidence`
    /// for NonDuplicate, zero for Unknown.
    pub fn weight(&self) -> f64 {
        match self.outcome {
            Outcome::Duplicate => self.confidence,
            Outcome::NonDuplicate => -self.confidence,
            Outcome::Unknown => 0.0,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.outcome == Outcome::Duplicate
    }
}

impl From<&Verdict> for Edge {
    fn from(verdict: &Verdict) -> Self {
        Self {
            pair: verdict.pair(),
            outcome: verdict.outcome,
            confidence: verdict.confidence,
        }
    }
}

/// Verdict graph with at most one entry per unordered pair.
#[derive(Debug, Clone, Default)]
pub struct DuplicateGraph {
    nodes: BTreeSet<RecordId>,
    /// Duplicate and Unknown edges
    edges: BTreeMap<PairKey, Edge>,
    /// NonDuplicate constraints
    negatives: BTreeMap<PairKey, Edge>,
}

impl DuplicateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from verdicts; later verdicts for a pair replace earlier
    /// ones.
    pub fn from_verdicts<'a, I>(verdicts: I) -> Self
    where
        I: IntoIterator<Item = &'a Verdict>,
    {
        let mut graph = Self::new();
        for verdict in verdicts {
            graph.add_verdict(verdict);
        }
        graph
    }

    /// Track a record that may have no verdicts (it becomes a singleton).
    pub fn add_node(&mut self, id: RecordId) {
        self.nodes.insert(id);
    }

    /// Insert or overwrite the entry for the verdict's pair. Self pairs are
    /// ignored and reported as `false`.
    pub fn add_verdict(&mut self, verdict: &Verdict) -> bool {
        let edge = Edge::from(verdict);
        if edge.pair.is_self_pair() {
            return false;
        }
        self.nodes.insert(edge.pair.low);
        self.nodes.insert(edge.pair.high);
        self.edges.remove(&edge.pair);
        self.negatives.remove(&edge.pair);
        match edge.outcome {
            Outcome::NonDuplicate => self.negatives.insert(edge.pair, edge),
            Outcome::Duplicate | Outcome::Unknown => self.edges.insert(edge.pair, edge),
        };
        true
    }

    /// Turn a Duplicate edge into an Unknown one, keeping its confidence.
    pub fn downgrade(&mut self, pair: PairKey) -> bool {
        match self.edges.get_mut(&pair) {
            Some(edge) if edge.is_duplicate() => {
                edge.outcome = Outcome::Unknown;
                true
            }
            _ => false,
        }
    }

    pub fn apply_downgrades<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = &'a PairKey>,
    {
        for pair in pairs {
            self.downgrade(*pair);
        }
    }

    /// The entry for a pair, positive or negative
    pub fn edge(&self, pair: PairKey) -> Option<&Edge> {
        self.edges.get(&pair).or_else(|| self.negatives.get(&pair))
    }

    pub fn contains_node(&self, id: RecordId) -> bool {
        self.nodes.contains(&id)
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.nodes.iter().copied()
    }

    /// Duplicate and Unknown edges in pair order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn duplicate_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(|edge| edge.is_duplicate())
    }

    pub fn negative_edges(&self) -> impl Iterator<Item = &Edge> {
        self.negatives.values()
    }

    /// Every entry, positive and negative
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().chain(self.negatives.values())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn negative_count(&self) -> usize {
        self.negatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: u32, b: u32) -> PairKey {
        PairKey::new(RecordId(a), RecordId(b))
    }

    #[test]
    fn test_verdicts_are_split_by_outcome() {
        let verdicts = vec![
            Verdict::duplicate(RecordId(1), RecordId(2), 0.9),
            Verdict::unknown(RecordId(2), RecordId(3), 0.6),
            Verdict::non_duplicate(RecordId(1), RecordId(3), 0.8),
        ];
        let graph = DuplicateGraph::from_verdicts(&verdicts);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.negative_count(), 1);
        assert_eq!(graph.duplicate_edges().count(), 1);
    }

    #[test]
    fn test_reclassification_overwrites() {
        let mut graph = DuplicateGraph::new();
        graph.add_verdict(&Verdict::duplicate(RecordId(1), RecordId(2), 0.9));
        graph.add_verdict(&Verdict::non_duplicate(RecordId(2), RecordId(1), 0.7));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.negative_count(), 1);
        assert_eq!(graph.edge(pair(1, 2)).map(|edge| edge.weight()), Some(-0.7));
    }

    #[test]
    fn test_self_pairs_are_ignored() {
        let mut graph = DuplicateGraph::new();
        assert!(!graph.add_verdict(&Verdict::duplicate(RecordId(4), RecordId(4), 1.0)));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_downgrade() {
        let mut graph = DuplicateGraph::new();
        graph.add_verdict(&Verdict::duplicate(RecordId(1), RecordId(2), 0.9));
        assert!(graph.downgrade(pair(1, 2)));
        assert!(!graph.downgrade(pair(1, 2)));
        let edge = graph.edge(pair(1, 2)).unwrap();
        assert_eq!(edge.outcome, Outcome::Unknown);
        assert_eq!(edge.confidence, 0.9);
    }
}
