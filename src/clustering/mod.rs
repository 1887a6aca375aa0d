//! # Clustering Engine
//!
//! Partitions the records of a [`DuplicateGraph`] into disjoint clusters
//! under a consistency policy:
//!
//! - **strict-transitive**: union-find over Duplicate edges in pair order;
//!   NonDuplicate verdicts are hard constraints.
//! - **confidence-weighted**: greedy union-find over Duplicate edges by
//!   descending confidence, with an optional size cap.
//! - **majority-link**: a merge needs a minimum share of Duplicate verdicts
//!   among all verdicts between the two clusters.
//!
//! A merge blocked by a negative constraint downgrades the Duplicate edge to
//! Unknown and records a [`ConstraintConflict`](crate::conflicts::ConstraintConflict).
//! Clustering itself never fails.

pub mod linkage;
pub mod refine;

use crate::config::{
    default_max_exhaustive_size, default_min_majority_fraction, MAX_EXHAUSTIVE_SIZE_LIMIT,
};
use crate::classifier::Outcome;
use crate::conflicts::Observation;
use crate::dsu::{Cluster, ClusterSummary, Clusters};
use crate::error::ConfigError;
use crate::graph::{DuplicateGraph, Edge};
use crate::model::{ClusterId, PairKey, RecordId};
use linkage::Linker;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, instrument};

/// How verdicts are turned into clusters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum ClusteringPolicy {
    #[default]
    StrictTransitive,
    ConfidenceWeighted {
        #[serde(default)]
        max_cluster_size: Option<usize>,
    },
    MajorityLink {
        #[serde(default = "default_min_majority_fraction")]
        min_majority_fraction: f64,
    },
}

impl ClusteringPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ClusteringPolicy::StrictTransitive => "strict-transitive",
            ClusteringPolicy::ConfidenceWeighted { .. } => "confidence-weighted",
            ClusteringPolicy::MajorityLink { .. } => "majority-link",
        }
    }
}

/// When a NonDuplicate verdict between two clusters blocks their merge.
/// The strict policy always vetoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeConstraintMode {
    /// Any NonDuplicate verdict between the clusters blocks the merge
    #[default]
    Veto,
    /// Block only when the summed NonDuplicate confidence between the
    /// clusters reaches the summed Duplicate confidence
    Outvoted,
}

/// Post-linkage repartitioning of each cluster by cohesion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Clusters up to this size are searched exhaustively; larger ones are
    /// rebuilt greedily
    #[serde(default = "default_max_exhaustive_size")]
    pub max_exhaustive_size: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_exhaustive_size: default_max_exhaustive_size(),
        }
    }
}

/// Clustering configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    #[serde(flatten)]
    pub policy: ClusteringPolicy,
    pub negative_constraints: NegativeConstraintMode,
    /// Refinement pass; disabled when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refine: Option<RefineConfig>,
}

impl ClusteringConfig {
    pub fn new(policy: ClusteringPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_negative_constraints(mut self, mode: NegativeConstraintMode) -> Self {
        self.negative_constraints = mode;
        self
    }

    pub fn with_refinement(mut self, refine: RefineConfig) -> Self {
        self.refine = Some(refine);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.policy {
            ClusteringPolicy::ConfidenceWeighted {
                max_cluster_size: Some(0),
            } => {
                return Err(ConfigError::InvalidParameter {
                    name: "max_cluster_size".to_string(),
                    reason: "must be at least 1".to_string(),
                })
            }
            ClusteringPolicy::MajorityLink {
                min_majority_fraction,
            } if !(0.0..=1.0).contains(&min_majority_fraction) => {
                return Err(ConfigError::ThresholdRange {
                    name: "min_majority_fraction",
                    value: min_majority_fraction,
                })
            }
            _ => {}
        }
        if let Some(refine) = self.refine {
            if refine.max_exhaustive_size > MAX_EXHAUSTIVE_SIZE_LIMIT {
                return Err(ConfigError::InvalidParameter {
                    name: "max_exhaustive_size".to_string(),
                    reason: format!("must not exceed {}", MAX_EXHAUSTIVE_SIZE_LIMIT),
                });
            }
        }
        Ok(())
    }
}

/// Counters for one clustering run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusteringStats {
    /// Duplicate edges examined by the linkage pass
    pub edges_considered: usize,
    pub merges: usize,
    pub rejected_by_constraint: usize,
    pub rejected_by_size: usize,
    pub rejected_by_majority: usize,
    /// Extra clusters produced by refinement
    pub refinement_splits: usize,
}

/// Outcome of one clustering run
#[derive(Debug, Clone, Default)]
pub struct ClusteringResult {
    /// Partition of every graph node, ordered by cluster id
    pub clusters: Clusters,
    /// Duplicate edges downgraded to Unknown, in processing order
    pub downgraded: Vec<PairKey>,
    pub observations: Vec<Observation>,
    pub stats: ClusteringStats,
}

/// Runs a consistency policy over duplicate graphs.
#[derive(Debug, Clone)]
pub struct ClusteringEngine {
    config: ClusteringConfig,
}

impl ClusteringEngine {
    pub fn new(config: ClusteringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Partition the graph. Every node ends up in exactly one cluster; the
    /// result is independent of the order verdicts were added in.
    #[instrument(skip(self, graph), level = "debug")]
    pub fn cluster(&self, graph: &DuplicateGraph) -> ClusteringResult {
        let mut linker = Linker::new(
            graph,
            self.config.negative_constraints,
            self.config.policy.name(),
        );
        match self.config.policy {
            ClusteringPolicy::StrictTransitive => linker.link_strict(),
            ClusteringPolicy::ConfidenceWeighted { max_cluster_size } => {
                linker.link_weighted(max_cluster_size)
            }
            ClusteringPolicy::MajorityLink {
                min_majority_fraction,
            } => linker.link_majority(min_majority_fraction),
        }
        let outcome = linker.finish();
        let mut stats = outcome.stats;

        let effective: Cow<'_, DuplicateGraph> = if outcome.downgraded.is_empty() {
            Cow::Borrowed(graph)
        } else {
            let mut downgraded = graph.clone();
            downgraded.apply_downgrades(&outcome.downgraded);
            Cow::Owned(downgraded)
        };

        let mut groups = outcome.groups;
        if let Some(refine) = self.config.refine {
            let internal = internal_edges(&groups, &effective);
            let mut refined = Vec::with_capacity(groups.len());
            for (group, edges) in groups.into_iter().zip(internal) {
                if group.len() > 2 {
                    let parts = refine::refine(&group, &edges, refine.max_exhaustive_size);
                    stats.refinement_splits += parts.len().saturating_sub(1);
                    refined.extend(parts);
                } else {
                    refined.push(group);
                }
            }
            groups = refined;
        }

        let clusters = assemble(groups, &effective);
        debug!(
            "{} clustering: {} nodes into {} clusters ({} merges, {} constraint rejections, {} downgraded)",
            self.config.policy.name(),
            graph.node_count(),
            clusters.len(),
            stats.merges,
            stats.rejected_by_constraint,
            outcome.downgraded.len()
        );

        ClusteringResult {
            clusters,
            downgraded: outcome.downgraded,
            observations: outcome.observations,
            stats,
        }
    }

    /// Cluster independent batches in parallel. Results follow input order.
    pub fn cluster_batches(&self, graphs: &[DuplicateGraph]) -> Vec<ClusteringResult> {
        graphs.par_iter().map(|graph| self.cluster(graph)).collect()
    }
}

/// Verdicts between members of the same group, bucketed per group.
fn internal_edges(groups: &[Vec<RecordId>], graph: &DuplicateGraph) -> Vec<Vec<Edge>> {
    let mut owner: FxHashMap<RecordId, usize> = FxHashMap::default();
    for (index, group) in groups.iter().enumerate() {
        for &id in group {
            owner.insert(id, index);
        }
    }
    let mut buckets = vec![Vec::new(); groups.len()];
    for edge in graph.all_edges() {
        if let (Some(&low), Some(&high)) = (owner.get(&edge.pair.low), owner.get(&edge.pair.high)) {
            if low == high {
                buckets[low].push(*edge);
            }
        }
    }
    buckets
}

/// Order groups by smallest member, assign dense ids and summarize the
/// verdicts inside each cluster.
fn assemble(mut groups: Vec<Vec<RecordId>>, graph: &DuplicateGraph) -> Clusters {
    for group in &mut groups {
        group.sort_unstable();
    }
    groups.retain(|group| !group.is_empty());
    groups.sort_unstable_by_key(|group| group[0]);

    let mut owner: FxHashMap<RecordId, usize> = FxHashMap::default();
    for (index, group) in groups.iter().enumerate() {
        for &id in group {
            owner.insert(id, index);
        }
    }

    let mut summaries: Vec<ClusterSummary> = groups
        .iter()
        .map(|group| ClusterSummary {
            size: group.len(),
            ..ClusterSummary::default()
        })
        .collect();
    let mut confidence_sums = vec![0.0; groups.len()];

    for edge in graph.all_edges() {
        let (Some(&low), Some(&high)) = (owner.get(&edge.pair.low), owner.get(&edge.pair.high))
        else {
            continue;
        };
        if low != high {
            continue;
        }
        let summary = &mut summaries[low];
        match edge.outcome {
            Outcome::Duplicate => {
                summary.duplicate_edges += 1;
                confidence_sums[low] += edge.confidence;
                summary.min_confidence = Some(
                    summary
                        .min_confidence
                        .map_or(edge.confidence, |current| current.min(edge.confidence)),
                );
            }
            Outcome::Unknown => summary.unknown_edges += 1,
            Outcome::NonDuplicate => summary.non_duplicate_edges += 1,
        }
    }

    let mut clusters = Clusters::new();
    for (index, (group, mut summary)) in groups.into_iter().zip(summaries).enumerate() {
        if summary.duplicate_edges > 0 {
            summary.mean_confidence =
                Some(confidence_sums[index] / summary.duplicate_edges as f64);
        }
        clusters.add_cluster(Cluster::new(ClusterId(index as u32), group).with_summary(summary));
    }
    clusters
}
