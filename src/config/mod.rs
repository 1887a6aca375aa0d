//! Unified configuration for the deduplication pipeline.
//!
//! Configuration is loaded with precedence: overrides > Env vars > Config file > Defaults
//!
//! # Example config file (dedupe.toml)
//! ```toml
//! [matching]
//! duplicate_threshold = 0.9
//! non_duplicate_threshold = 0.4
//!
//! [matching.attributes.name]
//! weight = 0.7
//! measure = { type = "jaro_winkler" }
//!
//! [matching.attributes.age]
//! weight = 0.3
//! measure = { type = "numeric", max_difference = 5.0 }
//! missing = { policy = "penalty", score = 0.0 }
//!
//! [clustering]
//! policy = "confidence-weighted"
//! max_cluster_size = 50
//! negative_constraints = "outvoted"
//!
//! [fusion]
//! timestamp_attribute = "updated_at"
//! trust = ["erp", "crm", "web"]
//! default_chain = [{ strategy = "majority_vote" }, { strategy = "highest_trust" }]
//!
//! [[fusion.attributes]]
//! name = "phone"
//! strategies = [{ strategy = "most_recent" }]
//! ```
//!
//! Environment variables use the `DEDUPE_` prefix and `__` between nesting
//! levels, e.g. `DEDUPE_MATCHING__DUPLICATE_THRESHOLD=0.92`.

mod defaults;

pub use defaults::*;

use crate::classifier::{AttributeRule, Thresholds, WeightedClassifier};
use crate::clustering::{ClusteringConfig, ClusteringEngine, NegativeConstraintMode};
use crate::error::ConfigError;
use crate::fusion::{self, Fallback, FusionEngine, SourceTrust, StrategyRef};
use crate::similarity::{
    Cutoff, DateProximity, Equality, ExactMatchOverride, Inverted, JaroWinkler, Levenshtein,
    MatchingSimilarity, MeasureRef, MissingPolicy, MissingValue, MongeElkan, NumericCloseness,
    Select, TokenOverlap, Transformed, WeightedCombination, WeightedMeasure,
};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Main configuration for a deduplication run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    /// Pairwise classification
    pub matching: MatchingConfig,
    /// Graph partitioning
    pub clustering: ClusteringConfig,
    /// Canonical record construction
    pub fusion: FusionSettings,
}

impl DedupeConfig {
    /// Load configuration with precedence: overrides > Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `overrides` - Programmatic overrides to apply on top
    pub fn load(config_path: Option<&str>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(DedupeConfig::default()));

        // Layer 1: Config file (if provided)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 2: Environment variables with DEDUPE_ prefix
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR));

        // Layer 3: Overrides
        figment = figment.merge(Serialized::defaults(overrides));

        let config: DedupeConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment and optional config file only (no overrides)
    pub fn from_env(config_path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(config_path, ConfigOverrides::default())
    }

    /// Check everything that does not need the records: thresholds,
    /// weights, measure and strategy parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_classifier()?;
        self.build_clustering()?;
        self.build_fusion()?;
        Ok(())
    }

    pub fn build_classifier(&self) -> Result<WeightedClassifier, ConfigError> {
        self.matching.build()
    }

    pub fn build_clustering(&self) -> Result<ClusteringEngine, ConfigError> {
        ClusteringEngine::new(self.clustering.clone())
    }

    pub fn build_fusion(&self) -> Result<FusionEngine, ConfigError> {
        self.fusion.build()
    }
}

/// Pairwise classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub duplicate_threshold: f64,
    pub non_duplicate_threshold: f64,
    /// Identical values score 1.0 without measuring
    pub exact_match_override: bool,
    /// Attribute name -> measure and weight; weights sum to 1
    pub attributes: BTreeMap<String, AttributeMatchConfig>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            non_duplicate_threshold: DEFAULT_NON_DUPLICATE_THRESHOLD,
            exact_match_override: DEFAULT_EXACT_MATCH_OVERRIDE,
            attributes: BTreeMap::new(),
        }
    }
}

impl MatchingConfig {
    pub fn build(&self) -> Result<WeightedClassifier, ConfigError> {
        let thresholds = Thresholds::new(self.duplicate_threshold, self.non_duplicate_threshold)?;
        let rules = self
            .attributes
            .iter()
            .map(|(name, attribute)| {
                Ok(AttributeRule::new(
                    name.clone(),
                    attribute.build()?,
                    attribute.weight,
                ))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(WeightedClassifier::new(rules, thresholds)?
            .with_exact_match_override(self.exact_match_override))
    }
}

/// Measure, weight and missing-value policy of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMatchConfig {
    pub measure: MeasureSpec,
    pub weight: f64,
    #[serde(default)]
    pub missing: MissingPolicy,
}

impl AttributeMatchConfig {
    pub fn new(measure: MeasureSpec, weight: f64) -> Self {
        Self {
            measure,
            weight,
            missing: MissingPolicy::default(),
        }
    }

    pub fn with_missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    fn build(&self) -> Result<MeasureRef, ConfigError> {
        let measure = self.measure.build()?;
        Ok(match self.missing {
            MissingPolicy::Undefined => measure,
            policy => Arc::new(MissingValue::new(measure, policy)),
        })
    }
}

/// One part of a weighted measure combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedMeasureSpec {
    pub weight: f64,
    pub measure: MeasureSpec,
}

/// Declarative similarity measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeasureSpec {
    Equality,
    Levenshtein,
    JaroWinkler,
    Jaccard,
    Cosine,
    MongeElkan {
        inner: Box<MeasureSpec>,
    },
    /// One-to-one element matching scored by `inner`
    Matching {
        inner: Box<MeasureSpec>,
    },
    Numeric {
        #[serde(default = "default_numeric_max_difference")]
        max_difference: f64,
    },
    Date {
        #[serde(default = "default_date_max_days")]
        max_days: f64,
    },
    Weighted {
        parts: Vec<WeightedMeasureSpec>,
    },
    Max {
        measures: Vec<MeasureSpec>,
    },
    Min {
        measures: Vec<MeasureSpec>,
    },
    ExactMatch {
        inner: Box<MeasureSpec>,
    },
    Cutoff {
        inner: Box<MeasureSpec>,
        threshold: f64,
    },
    Inverted {
        inner: Box<MeasureSpec>,
    },
    /// Case-folds and collapses whitespace before measuring
    Normalized {
        inner: Box<MeasureSpec>,
    },
}

impl MeasureSpec {
    pub fn build(&self) -> Result<MeasureRef, ConfigError> {
        let measure: MeasureRef = match self {
            MeasureSpec::Equality => Arc::new(Equality),
            MeasureSpec::Levenshtein => Arc::new(Levenshtein::new()),
            MeasureSpec::JaroWinkler => Arc::new(JaroWinkler),
            MeasureSpec::Jaccard => Arc::new(TokenOverlap::jaccard()),
            MeasureSpec::Cosine => Arc::new(TokenOverlap::cosine()),
            MeasureSpec::MongeElkan { inner } => Arc::new(MongeElkan::new(inner.build()?)),
            MeasureSpec::Matching { inner } => Arc::new(MatchingSimilarity::new(inner.build()?)),
            MeasureSpec::Numeric { max_difference } => {
                Arc::new(NumericCloseness::new(*max_difference)?)
            }
            MeasureSpec::Date { max_days } => Arc::new(DateProximity::new(*max_days)?),
            MeasureSpec::Weighted { parts } => Arc::new(WeightedCombination::new(
                parts
                    .iter()
                    .map(|part| Ok(WeightedMeasure::new(part.weight, part.measure.build()?)))
                    .collect::<Result<Vec<_>, ConfigError>>()?,
            )?),
            MeasureSpec::Max { measures } => Arc::new(Select::max(build_all(measures)?)?),
            MeasureSpec::Min { measures } => Arc::new(Select::min(build_all(measures)?)?),
            MeasureSpec::ExactMatch { inner } => Arc::new(ExactMatchOverride::new(inner.build()?)),
            MeasureSpec::Cutoff { inner, threshold } => {
                Arc::new(Cutoff::new(inner.build()?, *threshold)?)
            }
            MeasureSpec::Inverted { inner } => Arc::new(Inverted::new(inner.build()?)),
            MeasureSpec::Normalized { inner } => Arc::new(Transformed::normalized(inner.build()?)),
        };
        Ok(measure)
    }
}

fn build_all(specs: &[MeasureSpec]) -> Result<Vec<MeasureRef>, ConfigError> {
    specs.iter().map(MeasureSpec::build).collect()
}

/// Fusion configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    /// Attribute that dates each record, for recency strategies
    pub timestamp_attribute: Option<String>,
    /// Source systems, most trusted first
    pub trust: Vec<String>,
    /// Chain for attributes without their own; empty leaves conflicts
    /// unresolved
    pub default_chain: Vec<StrategySpec>,
    /// Per-attribute chains, fused in this order
    pub attributes: Vec<AttributeFusionConfig>,
}

impl FusionSettings {
    pub fn build(&self) -> Result<FusionEngine, ConfigError> {
        let mut builder = FusionEngine::builder()
            .trust(SourceTrust::from_ranking(self.trust.iter().cloned()))
            .default_chain(chain(&self.default_chain));
        if let Some(attribute) = &self.timestamp_attribute {
            builder = builder.timestamp_attribute(attribute.clone());
        }
        for attribute in &self.attributes {
            if attribute.strategies.is_empty() {
                return Err(ConfigError::Empty(format!(
                    "fusion.attributes.{}.strategies",
                    attribute.name
                )));
            }
            builder = builder.attribute(attribute.name.clone(), chain(&attribute.strategies));
        }
        builder.build()
    }
}

fn chain(specs: &[StrategySpec]) -> Fallback {
    Fallback::new(specs.iter().map(StrategySpec::build).collect())
}

/// Fallback chain of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeFusionConfig {
    pub name: String,
    pub strategies: Vec<StrategySpec>,
}

/// Declarative fusion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategySpec {
    MostRecent,
    Earliest,
    HighestTrust,
    PreferSource { sources: Vec<String> },
    Longest,
    Shortest,
    MajorityVote,
    WeightedVote,
    Maximum,
    Minimum,
    Corresponding { attribute: String },
    Mean,
    Sum,
    Union,
    First,
}

impl StrategySpec {
    pub fn build(&self) -> StrategyRef {
        match self {
            StrategySpec::MostRecent => Arc::new(fusion::MostRecent),
            StrategySpec::Earliest => Arc::new(fusion::Earliest),
            StrategySpec::HighestTrust => Arc::new(fusion::HighestTrust),
            StrategySpec::PreferSource { sources } => {
                Arc::new(fusion::PreferSource::new(sources.iter().cloned()))
            }
            StrategySpec::Longest => Arc::new(fusion::Longest),
            StrategySpec::Shortest => Arc::new(fusion::Shortest),
            StrategySpec::MajorityVote => Arc::new(fusion::MajorityVote),
            StrategySpec::WeightedVote => Arc::new(fusion::WeightedVote),
            StrategySpec::Maximum => Arc::new(fusion::Maximum),
            StrategySpec::Minimum => Arc::new(fusion::Minimum),
            StrategySpec::Corresponding { attribute } => {
                Arc::new(fusion::Corresponding::new(attribute.clone()))
            }
            StrategySpec::Mean => Arc::new(fusion::Mean),
            StrategySpec::Sum => Arc::new(fusion::Sum),
            StrategySpec::Union => Arc::new(fusion::Union),
            StrategySpec::First => Arc::new(fusion::First),
        }
    }
}

/// Overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchingOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clustering: Option<ClusteringOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fusion: Option<FusionOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_duplicate_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_match_override: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_constraints: Option<NegativeConstraintMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust: Option<Vec<String>>,
}
