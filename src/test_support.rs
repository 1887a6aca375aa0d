use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dedupe_rs::clustering::ClusteringPolicy;
use dedupe_rs::config::{
    AttributeFusionConfig, AttributeMatchConfig, DedupeConfig, MeasureSpec, StrategySpec,
};
use dedupe_rs::{Record, RecordId, Value};

const FIRST_NAMES: [&str; 12] = [
    "Jonathan", "Maria", "Wei", "Fatima", "Oliver", "Priya", "Lucas", "Amara", "Mateo", "Hannah",
    "Kenji", "Sofia",
];
const LAST_NAMES: [&str; 10] = [
    "Smith", "Garcia", "Chen", "Okafor", "Novak", "Patel", "Silva", "Nguyen", "Kowalski", "Berg",
];
const CITIES: [&str; 5] = ["Springfield", "Riverton", "Lakeside", "Fairview", "Hillcrest"];
const SOURCES: [&str; 3] = ["erp", "crm", "web"];

#[derive(Debug, Clone)]
pub struct PersonDataset {
    pub records: Vec<Record>,
    /// Entity index per record, aligned with `records`
    #[allow(dead_code)]
    pub truth: Vec<u32>,
    /// Pairs sharing a birth year, low id first
    pub candidates: Vec<(RecordId, RecordId)>,
}

impl PersonDataset {
    /// Pairs of records that describe the same entity
    #[allow(dead_code)]
    pub fn true_pairs(&self) -> Vec<(RecordId, RecordId)> {
        let mut pairs = Vec::new();
        for i in 0..self.records.len() {
            for j in (i + 1)..self.records.len() {
                if self.truth[i] == self.truth[j] {
                    pairs.push((self.records[i].id, self.records[j].id));
                }
            }
        }
        pairs
    }
}

/// `entities` people, each copied 1..=`max_copies` times across sources
/// with occasional typos in the name and a missing city.
pub fn generate_people(entities: u32, max_copies: u32, seed: u64) -> PersonDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::new();
    let mut truth = Vec::new();
    let mut years = Vec::new();
    let mut next_id = 1u32;

    for entity in 0..entities {
        let first = FIRST_NAMES[entity as usize % FIRST_NAMES.len()];
        let last = LAST_NAMES[(entity as usize / FIRST_NAMES.len()) % LAST_NAMES.len()];
        let name = format!("{} {}", first, last);
        let email = format!(
            "{}.{}{}@example.com",
            first.to_lowercase(),
            last.to_lowercase(),
            entity
        );
        let birth_year = 1950 + rng.random_range(0..20) as i64;
        let city = CITIES[rng.random_range(0..CITIES.len())];

        let copies = rng.random_range(1..=max_copies.max(1));
        for _ in 0..copies {
            let source = SOURCES[rng.random_range(0..SOURCES.len())];
            let mut record = Record::new(RecordId(next_id), source)
                .with("name", with_typo(&mut rng, &name, 0.3))
                .with("email", email.clone())
                .with("birth_year", birth_year)
                .with("updated_at", Value::Timestamp(rng.random_range(0..1_000_000)));
            if rng.random_bool(0.8) {
                record = record.with("city", city);
            }
            records.push(record);
            truth.push(entity);
            years.push(birth_year);
            next_id += 1;
        }
    }

    let mut candidates = Vec::new();
    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            if years[i] == years[j] {
                candidates.push((records[i].id, records[j].id));
            }
        }
    }

    PersonDataset {
        records,
        truth,
        candidates,
    }
}

fn with_typo(rng: &mut StdRng, text: &str, probability: f64) -> String {
    if !rng.random_bool(probability) {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    let position = rng.random_range(1..chars.len());
    if rng.random_bool(0.5) {
        chars.remove(position);
    } else {
        chars.insert(position, chars[position - 1]);
    }
    chars.into_iter().collect()
}

/// Matching on name, email and birth year; confidence-weighted clustering;
/// recency and trust driven fusion.
#[allow(dead_code)]
pub fn person_config() -> DedupeConfig {
    let mut config = DedupeConfig::default();
    config.matching.attributes.insert(
        "name".to_string(),
        AttributeMatchConfig::new(MeasureSpec::JaroWinkler, 0.5),
    );
    config.matching.attributes.insert(
        "email".to_string(),
        AttributeMatchConfig::new(MeasureSpec::Levenshtein, 0.3),
    );
    config.matching.attributes.insert(
        "birth_year".to_string(),
        AttributeMatchConfig::new(
            MeasureSpec::Numeric {
                max_difference: 2.0,
            },
            0.2,
        ),
    );
    config.clustering.policy = ClusteringPolicy::ConfidenceWeighted {
        max_cluster_size: None,
    };
    config.fusion.timestamp_attribute = Some("updated_at".to_string());
    config.fusion.trust = SOURCES.iter().map(|source| source.to_string()).collect();
    config.fusion.default_chain = vec![StrategySpec::MajorityVote, StrategySpec::HighestTrust];
    config.fusion.attributes = vec![
        AttributeFusionConfig {
            name: "name".to_string(),
            strategies: vec![StrategySpec::MajorityVote, StrategySpec::Longest],
        },
        AttributeFusionConfig {
            name: "updated_at".to_string(),
            strategies: vec![StrategySpec::Maximum],
        },
    ];
    config
}
