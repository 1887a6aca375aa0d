//! # Data Model
//!
//! Core data structures for record deduplication: record and cluster
//! identifiers, typed attribute values, and the records themselves.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use time::Date;

/// Compact identifier for records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u32);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Compact identifier for clusters, dense and local to one clustering run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// An unordered pair of record identifiers, stored low-first.
///
/// Ordering is lexicographic on `(low, high)`, which is the tie-break order
/// used everywhere pairs must be processed reproducibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub low: RecordId,
    pub high: RecordId,
}

impl PairKey {
    pub fn new(a: RecordId, b: RecordId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn is_self_pair(&self) -> bool {
        self.low == self.high
    }

    /// The other endpoint, if `id` is one of the two.
    pub fn other(&self, id: RecordId) -> Option<RecordId> {
        if id == self.low {
            Some(self.high)
        } else if id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.low, self.high)
    }
}

/// The declared semantic type of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Number,
    Integer,
    Bool,
    Date,
    Timestamp,
    Set,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Bool => "bool",
            ValueKind::Date => "date",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Set => "set",
        };
        f.write_str(label)
    }
}

/// A typed attribute value.
///
/// Numbers are totally ordered so values can be grouped, hashed and sorted
/// during voting and conflict reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Number(OrderedFloat<f64>),
    Integer(i64),
    Bool(bool),
    Date(Date),
    /// Seconds since the unix epoch
    Timestamp(i64),
    Set(BTreeSet<String>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn number(value: f64) -> Self {
        Value::Number(OrderedFloat(value))
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Number(_) => ValueKind::Number,
            Value::Integer(_) => ValueKind::Integer,
            Value::Bool(_) => ValueKind::Bool,
            Value::Date(_) => ValueKind::Date,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Set(_) => ValueKind::Set,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of `Number` and `Integer` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(number.into_inner()),
            Value::Integer(integer) => Some(*integer as f64),
            _ => None,
        }
    }

    /// Point-in-time view of `Timestamp`, `Date` (midnight UTC) and `Integer` values.
    pub fn as_unix_seconds(&self) -> Option<i64> {
        match self {
            Value::Timestamp(seconds) | Value::Integer(seconds) => Some(*seconds),
            Value::Date(date) => Some(date.midnight().assume_utc().unix_timestamp()),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Empty text (after trimming) and empty sets carry no information and
    /// are treated as absent during fusion.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Text(text) => text.trim().is_empty(),
            Value::Set(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Completeness measure: characters for text, elements for sets, and the
    /// rendered width for everything else.
    pub fn size(&self) -> usize {
        match self {
            Value::Text(text) => text.chars().count(),
            Value::Set(items) => items.len(),
            other => other.to_string().chars().count(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Number(number) => write!(f, "{}", number),
            Value::Integer(integer) => write!(f, "{}", integer),
            Value::Bool(flag) => write!(f, "{}", flag),
            Value::Date(date) => write!(f, "{}", date),
            Value::Timestamp(seconds) => write!(f, "@{}", seconds),
            Value::Set(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(item)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

/// A record as supplied by the caller: a stable identifier, the source system
/// it came from, and its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Name of the originating system (e.g. "crm", "erp"); drives source trust
    pub source: String,
    pub attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: RecordId, source: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute insertion
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// True when both records carry exactly the same attribute map.
    pub fn same_attributes(&self, other: &Record) -> bool {
        self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn pair_key_is_unordered() {
        let forward = PairKey::new(RecordId(3), RecordId(1));
        let backward = PairKey::new(RecordId(1), RecordId(3));
        assert_eq!(forward, backward);
        assert_eq!(forward.low, RecordId(1));
        assert_eq!(forward.other(RecordId(1)), Some(RecordId(3)));
        assert_eq!(forward.other(RecordId(2)), None);
    }

    #[test]
    fn pair_keys_sort_lexicographically() {
        let mut pairs = vec![
            PairKey::new(RecordId(2), RecordId(3)),
            PairKey::new(RecordId(1), RecordId(3)),
            PairKey::new(RecordId(1), RecordId(2)),
        ];
        pairs.sort();
        assert_eq!(pairs[0], PairKey::new(RecordId(1), RecordId(2)));
        assert_eq!(pairs[2], PairKey::new(RecordId(2), RecordId(3)));
    }

    #[test]
    fn value_views() {
        assert_eq!(Value::from(4_i64).as_f64(), Some(4.0));
        assert!(Value::text("  ").is_empty());
        assert_eq!(Value::set(["a", "b"]).size(), 2);
        let day = Value::from(date!(1970 - 01 - 02));
        assert_eq!(day.as_unix_seconds(), Some(86_400));
        assert_eq!(day.kind(), ValueKind::Date);
    }

    #[test]
    fn record_builder() {
        let record = Record::new(RecordId(7), "crm")
            .with("name", "Ada Lovelace")
            .with("age", 36_i64);
        assert_eq!(record.get("name"), Some(&Value::text("Ada Lovelace")));
        assert_eq!(record.id.to_string(), "R7");
    }

    #[test]
    fn value_serde_is_tagged() {
        let json = serde_json::to_string(&Value::text("x")).unwrap();
        assert_eq!(json, r#"{"kind":"text","value":"x"}"#);
    }
}
