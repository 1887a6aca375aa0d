//! # Dedupe
//!
//! A record deduplication engine. Candidate pairs produced by an external
//! blocking step flow through four stages:
//!
//! 1. [`similarity`] measures compare attribute values and combine scores.
//! 2. A [`classifier`] turns each pair into a Duplicate / NonDuplicate /
//!    Unknown verdict with a confidence.
//! 3. The [`clustering`] engine partitions the verdict graph under a
//!    consistency policy, honoring negative constraints.
//! 4. The [`fusion`] engine merges every cluster into a canonical record with
//!    field-level provenance.
//!
//! Recoverable problems (unmeasurable values, constraint conflicts,
//! unresolved field conflicts) never abort a run; they are collected as
//! [`Observation`]s on the result.

pub mod classifier;
pub mod clustering;
pub mod config;
pub mod conflicts;
pub mod dsu;
pub mod error;
pub mod fusion;
pub mod graph;
pub mod model;
pub mod similarity;
pub mod store;

// Re-export main types for convenience
pub use classifier::{Classifier, Outcome, Verdict, WeightedClassifier};
pub use clustering::{ClusteringConfig, ClusteringEngine, ClusteringPolicy, ClusteringStats};
pub use config::DedupeConfig;
pub use conflicts::Observation;
pub use dsu::{Cluster, Clusters};
pub use error::{ConfigError, DedupeError, Result};
pub use fusion::{CanonicalRecord, FusionEngine, Provenance};
pub use graph::DuplicateGraph;
pub use model::{ClusterId, PairKey, Record, RecordId, Value};
pub use store::{RecordSet, RecordStore};

use conflicts::{ConstraintConflict, FusionConflict};
use tracing::{debug, instrument};

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct DedupeOutput {
    /// One verdict per non-self candidate pair, in candidate order
    pub verdicts: Vec<Verdict>,
    /// Partition of every record in the store
    pub clusters: Clusters,
    /// Canonical records, in cluster id order
    pub canonical: Vec<CanonicalRecord>,
    /// Duplicate verdicts demoted by negative constraints
    pub downgraded: Vec<PairKey>,
    /// Non-fatal observations from all stages
    pub observations: Vec<Observation>,
    pub stats: ClusteringStats,
}

impl DedupeOutput {
    pub fn cluster_of(&self, record: RecordId) -> Option<ClusterId> {
        self.clusters.cluster_of(record).map(|cluster| cluster.id)
    }

    pub fn canonical(&self, cluster: ClusterId) -> Option<&CanonicalRecord> {
        self.canonical.iter().find(|record| record.cluster == cluster)
    }

    /// Canonical record of the cluster holding `record`
    pub fn canonical_for(&self, record: RecordId) -> Option<&CanonicalRecord> {
        self.canonical(self.cluster_of(record)?)
    }

    pub fn constraint_conflicts(&self) -> Vec<&ConstraintConflict> {
        conflicts::constraint_conflicts(&self.observations)
    }

    pub fn fusion_conflicts(&self) -> Vec<&FusionConflict> {
        conflicts::fusion_conflicts(&self.observations)
    }
}

/// Main API: classify, cluster and fuse in one call.
#[derive(Debug, Clone)]
pub struct Deduplicator<C = WeightedClassifier> {
    classifier: C,
    clustering: ClusteringEngine,
    fusion: FusionEngine,
}

impl Deduplicator<WeightedClassifier> {
    /// Build all three stages from declarative configuration.
    pub fn from_config(config: &DedupeConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(
            config.build_classifier()?,
            config.build_clustering()?,
            config.build_fusion()?,
        ))
    }
}

impl<C: Classifier> Deduplicator<C> {
    pub fn new(classifier: C, clustering: ClusteringEngine, fusion: FusionEngine) -> Self {
        Self {
            classifier,
            clustering,
            fusion,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn clustering(&self) -> &ClusteringEngine {
        &self.clustering
    }

    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    /// Run the pipeline over `candidates`. Records that appear in no
    /// candidate pair come back as singleton clusters.
    ///
    /// Fails before processing anything when the classifier does not fit
    /// the records or a candidate names an unknown record.
    #[instrument(skip(self, records, candidates), level = "debug")]
    pub fn resolve(
        &self,
        records: &dyn RecordStore,
        candidates: &[(RecordId, RecordId)],
    ) -> Result<DedupeOutput> {
        self.classifier.validate(records)?;
        let batch = classifier::classify_candidates(&self.classifier, records, candidates)?;

        let mut graph = DuplicateGraph::new();
        for id in records.record_ids() {
            graph.add_node(id);
        }
        for verdict in &batch.verdicts {
            graph.add_verdict(verdict);
        }

        let clustered = self.clustering.cluster(&graph);
        let fused = self.fusion.fuse_all(&clustered.clusters, records)?;

        let mut observations = batch.observations;
        observations.extend(clustered.observations);
        observations.extend(fused.observations);

        debug!(
            "Resolved {} records into {} clusters ({} observations)",
            records.len(),
            clustered.clusters.len(),
            observations.len()
        );

        Ok(DedupeOutput {
            verdicts: batch.verdicts,
            clusters: clustered.clusters,
            canonical: fused.records,
            downgraded: clustered.downgraded,
            observations,
            stats: clustered.stats,
        })
    }
}
