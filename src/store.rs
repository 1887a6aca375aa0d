//! # Store Module
//!
//! Record lookup for the resolution pipeline. Storage itself belongs to the
//! caller; the core only needs to resolve identifiers to records, which is
//! what [`RecordStore`] captures.

use crate::error::{DedupeError, Result};
use crate::model::{Record, RecordId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Read-only access to the records of one resolution batch.
///
/// Implementations are shared across worker threads during classification
/// and fusion, hence the `Sync` bound.
pub trait RecordStore: Sync {
    /// Get a record by ID
    fn get_record(&self, id: RecordId) -> Option<&Record>;

    /// All record identifiers, in ascending order
    fn record_ids(&self) -> Vec<RecordId>;

    /// Number of records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a record or fail with [`DedupeError::UnknownRecord`].
    fn require(&self, id: RecordId) -> Result<&Record> {
        self.get_record(id).ok_or(DedupeError::UnknownRecord(id))
    }
}

/// In-memory record set with an id index.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    /// Records in insertion order
    records: Vec<Record>,
    /// Position of each record in `records`
    index: FxHashMap<RecordId, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from records, rejecting repeated identifiers.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut set = Self::new();
        for record in records {
            set.insert(record)?;
        }
        Ok(set)
    }

    /// Add a record. Records are immutable once ingested, so a second record
    /// with the same id is an input error rather than an update.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        if self.index.contains_key(&record.id) {
            return Err(DedupeError::DuplicateRecord(record.id));
        }
        self.index.insert(record.id, self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }
}

impl RecordStore for RecordSet {
    fn get_record(&self, id: RecordId) -> Option<&Record> {
        self.index.get(&id).map(|&position| &self.records[position])
    }

    fn record_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

impl RecordStore for BTreeMap<RecordId, Record> {
    fn get_record(&self, id: RecordId) -> Option<&Record> {
        self.get(&id)
    }

    fn record_ids(&self) -> Vec<RecordId> {
        self.keys().copied().collect()
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_set_lookup() {
        let set = RecordSet::from_records(vec![
            Record::new(RecordId(2), "crm").with("name", "b"),
            Record::new(RecordId(1), "erp").with("name", "a"),
        ])
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.record_ids(), vec![RecordId(1), RecordId(2)]);
        assert_eq!(set.get_record(RecordId(1)).unwrap().source, "erp");
        assert!(set.get_record(RecordId(9)).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = RecordSet::from_records(vec![
            Record::new(RecordId(1), "crm"),
            Record::new(RecordId(1), "erp"),
        ]);
        assert!(matches!(result, Err(DedupeError::DuplicateRecord(RecordId(1)))));
    }

    #[test]
    fn test_require_reports_unknown_record() {
        let set = RecordSet::new();
        assert!(matches!(
            set.require(RecordId(4)),
            Err(DedupeError::UnknownRecord(RecordId(4)))
        ));
    }

    #[test]
    fn test_btree_map_store() {
        let mut map = BTreeMap::new();
        map.insert(RecordId(5), Record::new(RecordId(5), "web"));
        assert_eq!(RecordStore::len(&map), 1);
        assert_eq!(map.record_ids(), vec![RecordId(5)]);
    }
}
