#[path = "../src/test_support.rs"]
mod test_support;

use std::collections::BTreeMap;
use std::sync::Arc;

use dedupe_rs::classifier::{AttributeRule, OracleClassifier, Thresholds};
use dedupe_rs::clustering::NegativeConstraintMode;
use dedupe_rs::conflicts::Observation;
use dedupe_rs::fusion::{Fallback, HighestTrust, MajorityVote, Maximum, MostRecent, SourceTrust};
use dedupe_rs::similarity::{Equality, Levenshtein};
use dedupe_rs::{
    ClusterId, ClusteringConfig, ClusteringEngine, ClusteringPolicy, ConfigError, DedupeError,
    Deduplicator, FusionEngine, Outcome, PairKey, Record, RecordId, RecordSet, RecordStore, Value,
    WeightedClassifier,
};
use test_support::{generate_people, person_config};

fn id(n: u32) -> RecordId {
    RecordId(n)
}

fn contacts() -> anyhow::Result<RecordSet> {
    Ok(RecordSet::from_records(vec![
        Record::new(id(1), "crm")
            .with("name", "Jonathan Smith")
            .with("email", "jon.smith@example.com")
            .with("phone", "555-0100")
            .with("updated", Value::Timestamp(100)),
        Record::new(id(2), "erp")
            .with("name", "Jonathon Smith")
            .with("email", "jon.smith@example.com")
            .with("phone", "555-0199")
            .with("updated", Value::Timestamp(200)),
        Record::new(id(3), "web")
            .with("name", "Maria Garcia")
            .with("email", "maria@example.com"),
        Record::new(id(4), "crm")
            .with("name", "Maria Garcia")
            .with("email", "maria@example.com"),
        Record::new(id(5), "web")
            .with("name", "Wei Chen")
            .with("email", "wei@example.com"),
    ])?)
}

fn contact_classifier() -> anyhow::Result<WeightedClassifier> {
    Ok(WeightedClassifier::new(
        vec![
            AttributeRule::new("name", Arc::new(Levenshtein::new()), 0.5),
            AttributeRule::new("email", Arc::new(Equality), 0.5),
        ],
        Thresholds::new(0.85, 0.5)?,
    )?)
}

fn contact_fusion() -> anyhow::Result<FusionEngine> {
    Ok(FusionEngine::builder()
        .timestamp_attribute("updated")
        .trust(SourceTrust::from_ranking(["erp", "crm", "web"]))
        .attribute("name", Fallback::of(MajorityVote).then(HighestTrust))
        .attribute("phone", Fallback::of(MostRecent))
        .attribute("updated", Fallback::of(Maximum))
        .build()?)
}

#[test]
fn contacts_resolve_end_to_end() -> anyhow::Result<()> {
    let records = contacts()?;
    let deduplicator = Deduplicator::new(
        contact_classifier()?,
        ClusteringEngine::new(ClusteringConfig::default())?,
        contact_fusion()?,
    );
    let candidates = [(id(1), id(2)), (id(3), id(4)), (id(1), id(3)), (id(5), id(5))];

    let output = deduplicator.resolve(&records, &candidates)?;

    assert_eq!(output.verdicts.len(), 3);
    assert_eq!(output.verdicts[0].outcome, Outcome::Duplicate);
    assert!((output.verdicts[0].confidence - (1.0 - 1.0 / 28.0)).abs() < 1e-9);
    assert_eq!(output.verdicts[1].outcome, Outcome::Duplicate);
    assert_eq!(output.verdicts[1].confidence, 1.0);
    assert_eq!(output.verdicts[2].outcome, Outcome::NonDuplicate);

    assert_eq!(output.clusters.len(), 3);
    assert_eq!(output.cluster_of(id(1)), Some(ClusterId(0)));
    assert_eq!(output.cluster_of(id(2)), Some(ClusterId(0)));
    assert_eq!(output.cluster_of(id(4)), Some(ClusterId(1)));
    assert_eq!(output.cluster_of(id(5)), Some(ClusterId(2)));

    let jon = output.canonical_for(id(2)).expect("canonical record");
    assert_eq!(jon.members, vec![id(1), id(2)]);
    assert_eq!(jon.get("name"), Some(&Value::text("Jonathon Smith")));
    assert_eq!(jon.provenance.get("name"), Some(&[id(2)][..]));
    assert_eq!(jon.get("phone"), Some(&Value::text("555-0199")));
    assert_eq!(jon.get("updated"), Some(&Value::Timestamp(200)));
    assert_eq!(jon.provenance.get("email"), Some(&[id(1), id(2)][..]));

    let wei = output.canonical_for(id(5)).expect("singleton canonical record");
    assert_eq!(wei.attributes, records.require(id(5))?.attributes);
    assert_eq!(wei.provenance.get("name"), Some(&[id(5)][..]));

    assert!(output.constraint_conflicts().is_empty());
    assert!(output.fusion_conflicts().is_empty());
    assert_eq!(
        output.observations,
        vec![Observation::SelfPair { record: id(5) }]
    );
    Ok(())
}

#[test]
fn negative_verdict_blocks_transitive_merge() -> anyhow::Result<()> {
    let records = RecordSet::from_records((1..=3).map(|n| {
        Record::new(id(n), "crm").with("name", format!("Record {}", n))
    }))?;
    let oracle = OracleClassifier::new([(id(1), id(2)), (id(2), id(3))]);
    let candidates = [(id(1), id(2)), (id(2), id(3)), (id(1), id(3))];

    let policies = [
        ClusteringConfig::default(),
        ClusteringConfig::new(ClusteringPolicy::ConfidenceWeighted {
            max_cluster_size: None,
        }),
        ClusteringConfig::new(ClusteringPolicy::ConfidenceWeighted {
            max_cluster_size: None,
        })
        .with_negative_constraints(NegativeConstraintMode::Outvoted),
        ClusteringConfig::new(ClusteringPolicy::MajorityLink {
            min_majority_fraction: 0.5,
        }),
    ];

    for config in policies {
        let deduplicator = Deduplicator::new(
            oracle.clone(),
            ClusteringEngine::new(config)?,
            FusionEngine::builder().build()?,
        );
        let output = deduplicator.resolve(&records, &candidates)?;

        let groups: Vec<Vec<RecordId>> = output
            .clusters
            .iter()
            .map(|cluster| cluster.records.clone())
            .collect();
        assert_eq!(groups, vec![vec![id(1), id(2)], vec![id(3)]]);
        assert_eq!(output.downgraded, vec![PairKey::new(id(2), id(3))]);

        let conflicts = output.constraint_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].edge, PairKey::new(id(2), id(3)));
        assert_eq!(conflicts[0].blocking, vec![PairKey::new(id(1), id(3))]);
    }
    Ok(())
}

#[test]
fn unresolved_field_keeps_lowest_record_value() -> anyhow::Result<()> {
    let records = RecordSet::from_records(vec![
        Record::new(id(8), "crm").with("name", "Acme").with("city", "Boston"),
        Record::new(id(3), "erp").with("name", "Acme").with("city", "Cambridge"),
    ])?;
    let deduplicator = Deduplicator::new(
        OracleClassifier::new([(id(3), id(8))]),
        ClusteringEngine::new(ClusteringConfig::default())?,
        FusionEngine::builder().build()?,
    );

    let output = deduplicator.resolve(&records, &[(id(8), id(3))])?;
    let canonical = &output.canonical[0];
    assert_eq!(canonical.get("city"), Some(&Value::text("Cambridge")));

    let conflicts = output.fusion_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].attribute, "city");
    assert_eq!(conflicts[0].chosen, id(3));
    Ok(())
}

#[test]
fn unknown_candidate_fails_before_processing() -> anyhow::Result<()> {
    let records = contacts()?;
    let deduplicator = Deduplicator::new(
        contact_classifier()?,
        ClusteringEngine::new(ClusteringConfig::default())?,
        contact_fusion()?,
    );
    let err = deduplicator
        .resolve(&records, &[(id(1), id(2)), (id(1), id(42))])
        .unwrap_err();
    assert!(matches!(err, DedupeError::UnknownRecord(RecordId(42))));
    Ok(())
}

#[test]
fn measure_outside_its_domain_is_a_config_error() -> anyhow::Result<()> {
    let records = RecordSet::from_records(vec![
        Record::new(id(1), "crm").with("name", 17_i64).with("email", "a@example.com"),
        Record::new(id(2), "crm").with("name", "Seventeen").with("email", "a@example.com"),
    ])?;
    let deduplicator = Deduplicator::new(
        contact_classifier()?,
        ClusteringEngine::new(ClusteringConfig::default())?,
        contact_fusion()?,
    );
    let err = deduplicator.resolve(&records, &[]).unwrap_err();
    assert!(matches!(
        err,
        DedupeError::Config(ConfigError::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn synthetic_people_resolve_consistently() -> anyhow::Result<()> {
    let dataset = generate_people(40, 3, 7);
    let records = RecordSet::from_records(dataset.records.clone())?;
    let deduplicator = Deduplicator::from_config(&person_config())?;

    let output = deduplicator.resolve(&records, &dataset.candidates)?;

    assert_eq!(output.clusters.record_count(), dataset.records.len());
    assert_eq!(output.canonical.len(), output.clusters.len());
    for (cluster, canonical) in output.clusters.iter().zip(&output.canonical) {
        assert_eq!(cluster.id, canonical.cluster);
        assert_eq!(cluster.records, canonical.members);
        let latest = cluster
            .records
            .iter()
            .filter_map(|member| records.require(*member).ok()?.get("updated_at").cloned())
            .max();
        assert_eq!(canonical.get("updated_at").cloned(), latest);
    }

    let outcomes: BTreeMap<PairKey, Outcome> = output
        .verdicts
        .iter()
        .map(|verdict| (verdict.pair(), verdict.outcome))
        .collect();
    for (left, right) in dataset.true_pairs() {
        assert_eq!(
            outcomes.get(&PairKey::new(left, right)),
            Some(&Outcome::Duplicate),
            "{} and {} describe the same person",
            left,
            right
        );
    }

    let mut reversed = dataset.candidates.clone();
    reversed.reverse();
    let again = deduplicator.resolve(&records, &reversed)?;
    assert_eq!(again.clusters, output.clusters);
    assert_eq!(again.canonical, output.canonical);
    Ok(())
}
