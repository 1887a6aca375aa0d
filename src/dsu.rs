//! # Disjoint Set Union (DSU)
//!
//! Union-Find over dense indices. Record ids are mapped to arena slots once;
//! parent, size and member lists are plain vectors indexed by slot. Each root
//! keeps the member list of its set so callers can inspect both sides of a
//! prospective merge before committing to it.

use crate::model::{ClusterId, RecordId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Disjoint set over the records of one clustering run
#[derive(Debug, Clone, Default)]
pub struct DisjointSet {
    /// Slot -> record id
    ids: Vec<RecordId>,
    /// Record id -> slot
    index: FxHashMap<RecordId, u32>,
    parent: Vec<u32>,
    /// Set size, valid for roots only
    size: Vec<u32>,
    /// Member slots, non-empty for roots only
    members: Vec<Vec<u32>>,
    /// Current number of sets
    components: usize,
}

impl DisjointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set with every record as its own singleton.
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RecordId>,
    {
        let mut set = Self::new();
        for id in records {
            set.add_record(id);
        }
        set
    }

    /// Add a record as a singleton; returns its slot. Adding a known record
    /// returns the existing slot.
    pub fn add_record(&mut self, id: RecordId) -> u32 {
        if let Some(&slot) = self.index.get(&id) {
            return slot;
        }
        let slot = self.ids.len() as u32;
        self.ids.push(id);
        self.index.insert(id, slot);
        self.parent.push(slot);
        self.size.push(1);
        self.members.push(vec![slot]);
        self.components += 1;
        slot
    }

    pub fn has_record(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn slot_of(&self, id: RecordId) -> Option<u32> {
        self.index.get(&id).copied()
    }

    pub fn record_at(&self, slot: u32) -> RecordId {
        self.ids[slot as usize]
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Root of a slot, with path halving.
    pub fn find(&mut self, slot: u32) -> u32 {
        let mut current = slot;
        loop {
            let parent = self.parent[current as usize];
            if parent == current {
                return current;
            }
            let grandparent = self.parent[parent as usize];
            self.parent[current as usize] = grandparent;
            current = grandparent;
        }
    }

    /// Root of a slot without compressing the path.
    pub fn find_root(&self, slot: u32) -> u32 {
        let mut current = slot;
        while self.parent[current as usize] != current {
            current = self.parent[current as usize];
        }
        current
    }

    /// Root slot of a record, if tracked
    pub fn find_record(&mut self, id: RecordId) -> Option<u32> {
        let slot = self.slot_of(id)?;
        Some(self.find(slot))
    }

    pub fn same_set(&mut self, a: u32, b: u32) -> bool {
        self.find(a) == self.find(b)
    }

    /// Size of the set containing `slot`
    pub fn set_size(&mut self, slot: u32) -> usize {
        let root = self.find(slot);
        self.size[root as usize] as usize
    }

    /// Member slots of the set rooted at `root`
    pub fn members(&self, root: u32) -> &[u32] {
        &self.members[root as usize]
    }

    /// Merge the sets of `a` and `b`. Returns the surviving root, or `None`
    /// when both already share a set. The larger set survives; on equal
    /// sizes the lower slot does.
    pub fn union(&mut self, a: u32, b: u32) -> Option<u32> {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return None;
        }

        let (size_a, size_b) = (self.size[root_a as usize], self.size[root_b as usize]);
        let (root, child) = if size_a > size_b || (size_a == size_b && root_a < root_b) {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };

        self.parent[child as usize] = root;
        self.size[root as usize] += self.size[child as usize];
        let moved = std::mem::take(&mut self.members[child as usize]);
        self.members[root as usize].extend(moved);
        self.components = self.components.saturating_sub(1);
        Some(root)
    }

    /// Number of disjoint sets
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Every set as sorted record ids, sets ordered by their smallest member.
    pub fn groups(&self) -> Vec<Vec<RecordId>> {
        let mut groups: Vec<Vec<RecordId>> = self
            .members
            .iter()
            .filter(|members| !members.is_empty())
            .map(|members| {
                let mut records: Vec<RecordId> =
                    members.iter().map(|&slot| self.record_at(slot)).collect();
                records.sort_unstable();
                records
            })
            .collect();
        groups.sort_unstable_by_key(|records| records[0]);
        groups
    }
}

/// Confidence summary of the verdicts inside one cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub size: usize,
    /// Duplicate edges between members
    pub duplicate_edges: usize,
    /// Unknown edges between members, including downgraded ones
    pub unknown_edges: usize,
    /// NonDuplicate pairs between members (only possible under lenient
    /// constraint handling)
    pub non_duplicate_edges: usize,
    /// Mean confidence of internal Duplicate edges
    pub mean_confidence: Option<f64>,
    /// Weakest internal Duplicate edge
    pub min_confidence: Option<f64>,
}

/// A cluster of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Dense identifier, local to one clustering run
    pub id: ClusterId,
    /// Members in ascending id order; never empty
    pub records: Vec<RecordId>,
    pub summary: ClusterSummary,
}

impl Cluster {
    /// Create a new cluster; members are sorted.
    pub fn new(id: ClusterId, mut records: Vec<RecordId>) -> Self {
        records.sort_unstable();
        records.dedup();
        let summary = ClusterSummary {
            size: records.len(),
            ..ClusterSummary::default()
        };
        Self {
            id,
            records,
            summary,
        }
    }

    pub fn with_summary(mut self, summary: ClusterSummary) -> Self {
        self.summary = summary;
        self
    }

    /// Get the number of records in this cluster
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.records.len() == 1
    }

    /// Check if this cluster contains a specific record
    pub fn contains(&self, record_id: RecordId) -> bool {
        self.records.binary_search(&record_id).is_ok()
    }
}

/// A partition of records into clusters, ordered by cluster id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clusters {
    pub clusters: Vec<Cluster>,
}

impl Clusters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cluster(&mut self, cluster: Cluster) {
        self.clusters.push(cluster);
    }

    /// Get a cluster by ID
    pub fn get_cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters
            .get(id.0 as usize)
            .filter(|cluster| cluster.id == id)
            .or_else(|| self.clusters.iter().find(|cluster| cluster.id == id))
    }

    pub fn get_all_clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// The cluster holding a record
    pub fn cluster_of(&self, record_id: RecordId) -> Option<&Cluster> {
        self.clusters
            .iter()
            .find(|cluster| cluster.contains(record_id))
    }

    /// Record -> cluster id lookup table
    pub fn assignments(&self) -> FxHashMap<RecordId, ClusterId> {
        self.clusters
            .iter()
            .flat_map(|cluster| cluster.records.iter().map(move |&id| (id, cluster.id)))
            .collect()
    }

    /// Total number of records across clusters
    pub fn record_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsu_creation() {
        let set = DisjointSet::new();
        assert_eq!(set.component_count(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_add_record_is_idempotent() {
        let mut set = DisjointSet::new();
        let slot = set.add_record(RecordId(7));
        assert_eq!(set.add_record(RecordId(7)), slot);
        assert_eq!(set.len(), 1);
        assert_eq!(set.find(slot), slot);
    }

    #[test]
    fn test_union_tracks_members_and_size() {
        let mut set = DisjointSet::with_records([RecordId(1), RecordId(2), RecordId(3)]);
        let root = set.union(0, 1).unwrap();
        assert_eq!(root, 0);
        assert!(set.union(1, 0).is_none());
        assert_eq!(set.set_size(1), 2);
        assert_eq!(set.component_count(), 2);

        let root = set.union(2, 1).unwrap();
        assert_eq!(root, 0);
        let mut members = set.members(root).to_vec();
        members.sort_unstable();
        assert_eq!(members, vec![0, 1, 2]);
        assert_eq!(set.find_root(2), 0);
    }

    #[test]
    fn test_groups_are_ordered_by_smallest_member() {
        let mut set = DisjointSet::with_records([RecordId(9), RecordId(4), RecordId(1), RecordId(5)]);
        let nine = set.slot_of(RecordId(9)).unwrap();
        let one = set.slot_of(RecordId(1)).unwrap();
        set.union(nine, one);
        assert_eq!(
            set.groups(),
            vec![
                vec![RecordId(1), RecordId(9)],
                vec![RecordId(4)],
                vec![RecordId(5)],
            ]
        );
    }

    #[test]
    fn test_cluster_lookup() {
        let mut clusters = Clusters::new();
        clusters.add_cluster(Cluster::new(ClusterId(0), vec![RecordId(3), RecordId(1)]));
        clusters.add_cluster(Cluster::new(ClusterId(1), vec![RecordId(2)]));

        assert_eq!(clusters.get_cluster(ClusterId(0)).unwrap().records[0], RecordId(1));
        assert_eq!(clusters.cluster_of(RecordId(2)).unwrap().id, ClusterId(1));
        assert!(clusters.cluster_of(RecordId(8)).is_none());
        assert_eq!(clusters.assignments()[&RecordId(3)], ClusterId(0));
        assert_eq!(clusters.record_count(), 3);
    }
}
