//! # Fusion Engine
//!
//! Merges each cluster into one [`CanonicalRecord`]. For every attribute the
//! non-empty values of all members become [`Candidate`]s, and a
//! [`Fallback`] chain of [`ResolutionStrategy`]s narrows them until a single
//! distinct value remains or a strategy computes one. The records behind the
//! winning value are recorded in the [`Provenance`].
//!
//! When no chain settles an attribute, the value of the lowest record id
//! wins and an [`UnresolvedFusion`](crate::conflicts::Observation::UnresolvedFusion)
//! observation is raised.

pub mod strategies;

pub use strategies::{
    Corresponding, Custom, Earliest, First, HighestTrust, Longest, MajorityVote, Maximum, Mean,
    Minimum, MostRecent, PreferSource, Shortest, Sum, Union, WeightedVote,
};

use crate::conflicts::{ConflictValue, FusionConflict, Observation};
use crate::dsu::{Cluster, Clusters};
use crate::error::{ConfigError, Result};
use crate::model::{ClusterId, Record, RecordId, Value};
use crate::store::RecordStore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// One member's value for the attribute being fused
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: Value,
    pub record: RecordId,
    /// Source system of the record
    pub source: String,
    /// Point in time of the record, from the configured timestamp attribute
    pub timestamp: Option<i64>,
}

/// Trust weight per source system. Unlisted sources weigh 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTrust {
    weights: BTreeMap<String, f64>,
}

impl SourceTrust {
    /// Most trusted first. The first of `n` sources weighs `n`, the last 1.
    pub fn from_ranking<I, S>(ranking: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = ranking.into_iter().map(Into::into).collect();
        let total = sources.len();
        let mut weights = BTreeMap::new();
        for (position, source) in sources.into_iter().enumerate() {
            weights.entry(source).or_insert((total - position) as f64);
        }
        Self { weights }
    }

    pub fn with_weight(mut self, source: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(source.into(), weight);
        self
    }

    pub fn weight(&self, source: &str) -> f64 {
        self.weights.get(source).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// What a strategy can see besides the candidates
#[derive(Debug, Clone, Copy)]
pub struct FusionContext<'a> {
    pub cluster: ClusterId,
    pub attribute: &'a str,
    pub trust: &'a SourceTrust,
    /// Contributors of the attributes fused so far in this cluster
    pub resolved: &'a BTreeMap<String, Vec<RecordId>>,
}

/// Result of applying one strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The preferred subset of candidates. Empty means the strategy had
    /// nothing to go on and the chain continues with the previous set.
    Narrowed(Vec<Candidate>),
    /// A value derived from the candidates
    Computed {
        value: Value,
        contributors: Vec<RecordId>,
    },
}

/// A field-level conflict resolution strategy.
pub trait ResolutionStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn resolve(&self, candidates: Vec<Candidate>, context: &FusionContext<'_>) -> Resolution;

    /// Requires a configured timestamp attribute
    fn needs_timestamp(&self) -> bool {
        false
    }

    /// Requires a source trust ranking
    fn needs_trust(&self) -> bool {
        false
    }

    /// Attribute that must be fused before this one
    fn depends_on(&self) -> Option<&str> {
        None
    }
}

pub type StrategyRef = Arc<dyn ResolutionStrategy>;

/// Strategies applied in order until one settles the value.
#[derive(Debug, Clone, Default)]
pub struct Fallback {
    chain: Vec<StrategyRef>,
}

/// How a chain ended
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Resolved {
        value: Value,
        contributors: Vec<RecordId>,
    },
    /// Several distinct values are still in contention
    Unresolved(Vec<Candidate>),
}

impl Fallback {
    pub fn new(chain: Vec<StrategyRef>) -> Self {
        Self { chain }
    }

    pub fn of(strategy: impl ResolutionStrategy + 'static) -> Self {
        Self::new(vec![Arc::new(strategy)])
    }

    /// Append a strategy to the chain
    pub fn then(mut self, strategy: impl ResolutionStrategy + 'static) -> Self {
        self.chain.push(Arc::new(strategy));
        self
    }

    pub fn strategies(&self) -> &[StrategyRef] {
        &self.chain
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Run the chain over a non-empty candidate list.
    pub fn apply(&self, candidates: Vec<Candidate>, context: &FusionContext<'_>) -> Settled {
        let mut current = candidates;
        if let Some(settled) = single_value(&current) {
            return settled;
        }
        for strategy in &self.chain {
            match strategy.resolve(current.clone(), context) {
                Resolution::Computed {
                    value,
                    contributors,
                } => {
                    return Settled::Resolved {
                        value,
                        contributors,
                    }
                }
                Resolution::Narrowed(next) if next.is_empty() => continue,
                Resolution::Narrowed(next) => current = next,
            }
            if let Some(settled) = single_value(&current) {
                return settled;
            }
        }
        Settled::Unresolved(current)
    }
}

/// Settled when all candidates carry the same value.
fn single_value(candidates: &[Candidate]) -> Option<Settled> {
    let first = candidates.first()?;
    if candidates.iter().any(|candidate| candidate.value != first.value) {
        return None;
    }
    let mut contributors: Vec<RecordId> = candidates.iter().map(|c| c.record).collect();
    contributors.sort_unstable();
    contributors.dedup();
    Some(Settled::Resolved {
        value: first.value.clone(),
        contributors,
    })
}

/// Attribute name -> records that determined the fused value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance(BTreeMap<String, Vec<RecordId>>);

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: impl Into<String>, contributors: Vec<RecordId>) {
        self.0.insert(attribute.into(), contributors);
    }

    pub fn get(&self, attribute: &str) -> Option<&[RecordId]> {
        self.0.get(attribute).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<RecordId>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source system names behind an attribute
    pub fn sources<'s>(&self, attribute: &str, records: &'s dyn RecordStore) -> Vec<&'s str> {
        let mut sources: Vec<&str> = self
            .get(attribute)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| records.get_record(*id))
            .map(|record| record.source.as_str())
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources
    }
}

/// The fused representative of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub cluster: ClusterId,
    /// Cluster members in id order
    pub members: Vec<RecordId>,
    pub attributes: BTreeMap<String, Value>,
    pub provenance: Provenance,
}

impl CanonicalRecord {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}

/// Canonical records of a clustering, in cluster id order
#[derive(Debug, Clone, Default)]
pub struct FusionOutput {
    pub records: Vec<CanonicalRecord>,
    pub observations: Vec<Observation>,
}

/// Per-attribute strategy chains plus shared fusion inputs.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    timestamp_attribute: Option<String>,
    trust: SourceTrust,
    /// Configured attributes in fusion order
    attributes: Vec<(String, Fallback)>,
    default_chain: Fallback,
}

/// Builder for [`FusionEngine`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct FusionEngineBuilder {
    engine: FusionEngine,
}

impl FusionEngineBuilder {
    /// Attribute whose `Date`/`Timestamp`/`Integer` value dates each record
    pub fn timestamp_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.engine.timestamp_attribute = Some(attribute.into());
        self
    }

    pub fn trust(mut self, trust: SourceTrust) -> Self {
        self.engine.trust = trust;
        self
    }

    /// Chain for one attribute. Attributes are fused in the order given.
    pub fn attribute(mut self, name: impl Into<String>, chain: Fallback) -> Self {
        self.engine.attributes.push((name.into(), chain));
        self
    }

    /// Chain for attributes without their own
    pub fn default_chain(mut self, chain: Fallback) -> Self {
        self.engine.default_chain = chain;
        self
    }

    pub fn build(self) -> Result<FusionEngine, ConfigError> {
        let engine = self.engine;
        let mut seen: HashSet<&str> = HashSet::new();
        for (name, chain) in &engine.attributes {
            for strategy in chain.strategies() {
                engine.check_requirements(strategy.as_ref())?;
                if let Some(dependency) = strategy.depends_on() {
                    if !seen.contains(dependency) {
                        return Err(ConfigError::InvalidParameter {
                            name: name.clone(),
                            reason: format!(
                                "`{}` must be configured before `{}`",
                                dependency, name
                            ),
                        });
                    }
                }
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::InvalidParameter {
                    name: name.clone(),
                    reason: "attribute configured more than once".to_string(),
                });
            }
        }
        for strategy in engine.default_chain.strategies() {
            engine.check_requirements(strategy.as_ref())?;
            if strategy.depends_on().is_some() {
                return Err(ConfigError::InvalidParameter {
                    name: "default_chain".to_string(),
                    reason: format!("`{}` needs a specific attribute", strategy.name()),
                });
            }
        }
        Ok(engine)
    }
}

impl FusionEngine {
    pub fn builder() -> FusionEngineBuilder {
        FusionEngineBuilder::default()
    }

    pub fn trust(&self) -> &SourceTrust {
        &self.trust
    }

    fn check_requirements(&self, strategy: &dyn ResolutionStrategy) -> Result<(), ConfigError> {
        if strategy.needs_timestamp() && self.timestamp_attribute.is_none() {
            return Err(ConfigError::MissingRequirement {
                strategy: strategy.name().to_string(),
                requirement: "a timestamp attribute",
            });
        }
        if strategy.needs_trust() && self.trust.is_empty() {
            return Err(ConfigError::MissingRequirement {
                strategy: strategy.name().to_string(),
                requirement: "a source trust ranking",
            });
        }
        Ok(())
    }

    fn chain_for(&self, attribute: &str) -> &Fallback {
        self.attributes
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, chain)| chain)
            .unwrap_or(&self.default_chain)
    }

    /// Configured attributes first, in configuration order; the rest sorted.
    fn attribute_order(&self, members: &[&Record]) -> Vec<String> {
        let present: BTreeSet<&str> = members
            .iter()
            .flat_map(|record| record.attributes.keys().map(String::as_str))
            .collect();
        let mut order: Vec<String> = self
            .attributes
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| present.contains(name))
            .map(str::to_string)
            .collect();
        let configured: HashSet<&str> = self.attributes.iter().map(|(n, _)| n.as_str()).collect();
        order.extend(
            present
                .into_iter()
                .filter(|name| !configured.contains(name))
                .map(str::to_string),
        );
        order
    }

    /// Fuse one cluster.
    pub fn fuse(
        &self,
        cluster: &Cluster,
        records: &dyn RecordStore,
    ) -> Result<(CanonicalRecord, Vec<Observation>)> {
        let members: Vec<&Record> = cluster
            .records
            .iter()
            .map(|id| records.require(*id))
            .collect::<Result<_>>()?;

        if let [record] = members.as_slice() {
            let mut provenance = Provenance::new();
            for name in record.attributes.keys() {
                provenance.insert(name.clone(), vec![record.id]);
            }
            return Ok((
                CanonicalRecord {
                    cluster: cluster.id,
                    members: vec![record.id],
                    attributes: record.attributes.clone(),
                    provenance,
                },
                Vec::new(),
            ));
        }

        let mut attributes = BTreeMap::new();
        let mut resolved: BTreeMap<String, Vec<RecordId>> = BTreeMap::new();
        let mut observations = Vec::new();

        for name in self.attribute_order(&members) {
            let holders: Vec<&Record> = members
                .iter()
                .copied()
                .filter(|record| record.get(&name).is_some())
                .collect();
            let candidates: Vec<Candidate> = holders
                .iter()
                .filter_map(|record| {
                    let value = record.get(&name)?;
                    (!value.is_empty()).then(|| self.candidate(record, value))
                })
                .collect();

            let (value, contributors) = if candidates.is_empty() {
                // Only empty values: keep the first one.
                let Some(first) = holders.first() else {
                    continue;
                };
                let Some(value) = first.get(&name) else {
                    continue;
                };
                (value.clone(), vec![first.id])
            } else {
                let context = FusionContext {
                    cluster: cluster.id,
                    attribute: &name,
                    trust: &self.trust,
                    resolved: &resolved,
                };
                match self.chain_for(&name).apply(candidates, &context) {
                    Settled::Resolved {
                        value,
                        contributors,
                    } => (value, contributors),
                    Settled::Unresolved(remaining) => {
                        let (conflict, contributors) =
                            unresolved(cluster.id, &name, &remaining);
                        warn!(
                            "Unresolved conflict on {} in {}: {} distinct values, keeping {}",
                            name,
                            cluster.id,
                            conflict.values.len(),
                            conflict.chosen
                        );
                        let value = remaining[0].value.clone();
                        observations.push(Observation::unresolved_fusion(conflict));
                        (value, contributors)
                    }
                }
            };

            attributes.insert(name.clone(), value);
            resolved.insert(name, contributors);
        }

        Ok((
            CanonicalRecord {
                cluster: cluster.id,
                members: cluster.records.clone(),
                attributes,
                provenance: Provenance(resolved),
            },
            observations,
        ))
    }

    /// Fuse every cluster in parallel; output follows cluster order.
    #[instrument(skip(self, clusters, records), level = "debug")]
    pub fn fuse_all(&self, clusters: &Clusters, records: &dyn RecordStore) -> Result<FusionOutput> {
        let fused = clusters
            .clusters
            .par_iter()
            .map(|cluster| self.fuse(cluster, records))
            .collect::<Result<Vec<_>>>()?;

        let mut output = FusionOutput::default();
        for (record, observations) in fused {
            output.records.push(record);
            output.observations.extend(observations);
        }
        debug!(
            "Fused {} clusters ({} unresolved conflicts)",
            output.records.len(),
            output.observations.len()
        );
        Ok(output)
    }

    fn candidate(&self, record: &Record, value: &Value) -> Candidate {
        let timestamp = self
            .timestamp_attribute
            .as_deref()
            .and_then(|attribute| record.get(attribute))
            .and_then(Value::as_unix_seconds);
        Candidate {
            value: value.clone(),
            record: record.id,
            source: record.source.clone(),
            timestamp,
        }
    }
}

/// Conflict report for candidates left in contention; the value of the
/// lowest record id is kept.
fn unresolved(
    cluster: ClusterId,
    attribute: &str,
    remaining: &[Candidate],
) -> (FusionConflict, Vec<RecordId>) {
    let mut values: Vec<ConflictValue> = Vec::new();
    for candidate in remaining {
        match values.iter_mut().find(|entry| entry.value == candidate.value) {
            Some(entry) => entry.participants.push(candidate.record),
            None => values.push(ConflictValue::new(
                candidate.value.clone(),
                vec![candidate.record],
            )),
        }
    }
    let chosen = remaining[0].record;
    let contributors = values[0].participants.clone();
    (
        FusionConflict {
            cluster,
            attribute: attribute.to_string(),
            values,
            chosen,
        },
        contributors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordSet;

    fn company(id: u32, source: &str, name: &str, suffix: &str) -> Record {
        Record::new(RecordId(id), source)
            .with("name", name)
            .with("suffix", suffix)
    }

    fn cluster_of(ids: &[u32]) -> Cluster {
        Cluster::new(ClusterId(0), ids.iter().map(|&id| RecordId(id)).collect())
    }

    #[test]
    fn test_singleton_is_returned_unchanged() {
        let record = company(4, "crm", "Acme", "Inc.").with("tags", Value::set(Vec::<String>::new()));
        let records = RecordSet::from_records(vec![record.clone()]).unwrap();
        let engine = FusionEngine::builder().build().unwrap();
        let (canonical, observations) = engine.fuse(&cluster_of(&[4]), &records).unwrap();
        assert_eq!(canonical.attributes, record.attributes);
        assert_eq!(canonical.provenance.get("tags"), Some(&[RecordId(4)][..]));
        assert_eq!(canonical.provenance.len(), 3);
        assert!(observations.is_empty());
    }

    #[test]
    fn test_majority_vote_with_provenance() {
        let records = RecordSet::from_records(vec![
            company(1, "crm", "Acme", "Inc."),
            company(2, "erp", "Acme", "Incorporated"),
            company(3, "web", "Acme", "Inc."),
        ])
        .unwrap();
        let engine = FusionEngine::builder()
            .attribute("suffix", Fallback::of(MajorityVote))
            .build()
            .unwrap();
        let (canonical, observations) = engine.fuse(&cluster_of(&[1, 2, 3]), &records).unwrap();
        assert_eq!(canonical.get("suffix"), Some(&Value::text("Inc.")));
        assert_eq!(
            canonical.provenance.get("suffix"),
            Some(&[RecordId(1), RecordId(3)][..])
        );
        assert_eq!(canonical.provenance.sources("suffix", &records), vec!["crm", "web"]);
        assert_eq!(canonical.provenance.get("name").map(<[RecordId]>::len), Some(3));
        assert!(observations.is_empty());
    }

    #[test]
    fn test_vote_tie_falls_back() {
        let records = RecordSet::from_records(vec![
            company(1, "crm", "Acme", "Inc."),
            company(2, "erp", "Acme", "Incorporated"),
        ])
        .unwrap();
        let engine = FusionEngine::builder()
            .attribute("suffix", Fallback::of(MajorityVote).then(Longest))
            .build()
            .unwrap();
        let (canonical, _) = engine.fuse(&cluster_of(&[1, 2]), &records).unwrap();
        assert_eq!(canonical.get("suffix"), Some(&Value::text("Incorporated")));
        assert_eq!(canonical.provenance.get("suffix"), Some(&[RecordId(2)][..]));
    }

    #[test]
    fn test_unconfigured_conflict_keeps_first_by_id() {
        let records = RecordSet::from_records(vec![
            company(7, "crm", "Acme Corp", "Inc."),
            company(3, "erp", "ACME", "Inc."),
        ])
        .unwrap();
        let engine = FusionEngine::builder().build().unwrap();
        let (canonical, observations) = engine.fuse(&cluster_of(&[7, 3]), &records).unwrap();
        assert_eq!(canonical.get("name"), Some(&Value::text("ACME")));
        assert_eq!(canonical.provenance.get("name"), Some(&[RecordId(3)][..]));
        assert_eq!(observations.len(), 1);
        let conflicts = crate::conflicts::fusion_conflicts(&observations);
        assert_eq!(conflicts[0].attribute, "name");
        assert_eq!(conflicts[0].chosen, RecordId(3));
        assert_eq!(conflicts[0].values.len(), 2);
    }

    #[test]
    fn test_most_recent_uses_timestamp_attribute() {
        let records = RecordSet::from_records(vec![
            Record::new(RecordId(1), "crm")
                .with("phone", "555-0100")
                .with("updated", Value::Timestamp(100)),
            Record::new(RecordId(2), "erp")
                .with("phone", "555-0199")
                .with("updated", Value::Timestamp(200)),
        ])
        .unwrap();
        let engine = FusionEngine::builder()
            .timestamp_attribute("updated")
            .attribute("phone", Fallback::of(MostRecent))
            .attribute("updated", Fallback::of(Maximum))
            .build()
            .unwrap();
        let (canonical, observations) = engine.fuse(&cluster_of(&[1, 2]), &records).unwrap();
        assert_eq!(canonical.get("phone"), Some(&Value::text("555-0199")));
        assert_eq!(canonical.get("updated"), Some(&Value::Timestamp(200)));
        assert!(observations.is_empty());
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let records = RecordSet::from_records(vec![
            company(1, "crm", "  ", "Inc."),
            company(2, "erp", "Acme", "Inc."),
            Record::new(RecordId(3), "web").with("nickname", ""),
            Record::new(RecordId(4), "web").with("nickname", " "),
        ])
        .unwrap();
        let engine = FusionEngine::builder().build().unwrap();
        let (canonical, observations) =
            engine.fuse(&cluster_of(&[1, 2, 3, 4]), &records).unwrap();
        assert_eq!(canonical.get("name"), Some(&Value::text("Acme")));
        assert_eq!(canonical.provenance.get("name"), Some(&[RecordId(2)][..]));
        assert_eq!(canonical.get("nickname"), Some(&Value::text("")));
        assert_eq!(canonical.provenance.get("nickname"), Some(&[RecordId(3)][..]));
        assert!(observations.is_empty());
    }

    #[test]
    fn test_corresponding_keeps_fields_together() {
        let records = RecordSet::from_records(vec![
            Record::new(RecordId(1), "crm")
                .with("street", "1 Main St")
                .with("city", "Springfield"),
            Record::new(RecordId(2), "erp")
                .with("street", "22 Elm Street Apt 4")
                .with("city", "Shelbyville"),
        ])
        .unwrap();
        let engine = FusionEngine::builder()
            .attribute("street", Fallback::of(Longest))
            .attribute("city", Fallback::of(Corresponding::new("street")))
            .build()
            .unwrap();
        let (canonical, _) = engine.fuse(&cluster_of(&[1, 2]), &records).unwrap();
        assert_eq!(canonical.get("city"), Some(&Value::text("Shelbyville")));
    }

    #[test]
    fn test_build_validates_requirements() {
        let err = FusionEngine::builder()
            .attribute("phone", Fallback::of(MostRecent))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequirement { .. }));

        let err = FusionEngine::builder()
            .default_chain(Fallback::of(HighestTrust))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequirement { .. }));

        let err = FusionEngine::builder()
            .attribute("city", Fallback::of(Corresponding::new("street")))
            .attribute("street", Fallback::of(Longest))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { .. }));

        assert!(FusionEngine::builder()
            .trust(SourceTrust::from_ranking(["crm"]))
            .default_chain(Fallback::of(HighestTrust).then(First))
            .build()
            .is_ok());
    }

    #[test]
    fn test_fuse_all_keeps_cluster_order() {
        let records = RecordSet::from_records(vec![
            company(1, "crm", "A", "x"),
            company(2, "crm", "B", "y"),
            company(3, "crm", "B", "y"),
        ])
        .unwrap();
        let mut clusters = Clusters::new();
        clusters.add_cluster(Cluster::new(ClusterId(0), vec![RecordId(1)]));
        clusters.add_cluster(Cluster::new(ClusterId(1), vec![RecordId(2), RecordId(3)]));
        let engine = FusionEngine::builder().build().unwrap();
        let output = engine.fuse_all(&clusters, &records).unwrap();
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.records[1].cluster, ClusterId(1));
        assert_eq!(output.records[1].get("name"), Some(&Value::text("B")));
        assert!(output.observations.is_empty());
    }

    #[test]
    fn test_source_trust_ranking() {
        let trust = SourceTrust::from_ranking(["erp", "crm"]).with_weight("web", 0.5);
        assert_eq!(trust.weight("erp"), 2.0);
        assert_eq!(trust.weight("crm"), 1.0);
        assert_eq!(trust.weight("web"), 0.5);
        assert_eq!(trust.weight("unknown"), 0.0);
    }
}
