//! Cluster refinement.
//!
//! Repartitions one cluster to maximize a cohesion score over its internal
//! verdicts. Each pair contributes its signed edge weight (Duplicate
//! `+confidence`, NonDuplicate `-confidence`, otherwise 0):
//!
//! - a pair inside block `p` adds `w / |p|`
//! - a pair split across blocks `p` and `q` subtracts
//!   `w / (n - |p|) + w / (n - |q|)`
//!
//! Small clusters are searched exhaustively over every set partition; larger
//! ones are rebuilt by greedy merging from singletons. The result is always a
//! partition of the input, so refinement can only split.

use crate::dsu::DisjointSet;
use crate::graph::Edge;
use crate::model::RecordId;
use rustc_hash::FxHashMap;

const EPSILON: f64 = 1e-12;

/// Repartition `members` (sorted, distinct) using the verdicts between
/// them. Edges touching non-members are ignored. Blocks come back sorted and
/// ordered by their smallest member.
pub fn refine(
    members: &[RecordId],
    edges: &[Edge],
    max_exhaustive_size: usize,
) -> Vec<Vec<RecordId>> {
    if members.len() <= 2 {
        return vec![members.to_vec()];
    }
    let index: FxHashMap<RecordId, usize> = members
        .iter()
        .enumerate()
        .map(|(slot, &id)| (id, slot))
        .collect();
    let weighted: Vec<(usize, usize, f64)> = edges
        .iter()
        .filter_map(|edge| {
            let low = *index.get(&edge.pair.low)?;
            let high = *index.get(&edge.pair.high)?;
            (low != high).then(|| (low, high, edge.weight()))
        })
        .collect();

    let labels = if members.len() <= max_exhaustive_size {
        exhaustive(&WeightMatrix::new(members.len(), &weighted))
    } else {
        greedy(members, &weighted)
    };
    blocks_from_labels(members, &labels)
}

/// Dense signed weights between the members of a small cluster
struct WeightMatrix {
    n: usize,
    weights: Vec<f64>,
}

impl WeightMatrix {
    fn new(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut weights = vec![0.0; n * n];
        for &(i, j, weight) in edges {
            weights[i * n + j] = weight;
            weights[j * n + i] = weight;
        }
        Self { n, weights }
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.weights[i * self.n + j]
    }

    /// Cohesion of a labeling (block label per member).
    fn score(&self, labels: &[usize]) -> f64 {
        let n = self.n;
        let mut sizes = vec![0usize; n];
        for &label in labels {
            sizes[label] += 1;
        }
        let mut score = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let weight = self.get(i, j);
                if weight == 0.0 {
                    continue;
                }
                let (p, q) = (labels[i], labels[j]);
                if p == q {
                    score += weight / sizes[p] as f64;
                } else {
                    score -= weight / (n - sizes[p]) as f64 + weight / (n - sizes[q]) as f64;
                }
            }
        }
        score
    }
}

/// Best labeling over all set partitions, enumerated as restricted growth
/// strings. The single-block partition comes first and only a strictly
/// better score replaces the incumbent.
fn exhaustive(weights: &WeightMatrix) -> Vec<usize> {
    let n = weights.n;
    let mut labels = vec![0usize; n];
    let mut best = labels.clone();
    let mut best_score = weights.score(&labels);
    enumerate(weights, &mut labels, 1, 0, &mut best, &mut best_score);
    best
}

fn enumerate(
    weights: &WeightMatrix,
    labels: &mut Vec<usize>,
    position: usize,
    max_label: usize,
    best: &mut Vec<usize>,
    best_score: &mut f64,
) {
    if position == labels.len() {
        let score = weights.score(labels);
        if score > *best_score + EPSILON {
            *best_score = score;
            best.clone_from(labels);
        }
        return;
    }
    for label in 0..=max_label + 1 {
        labels[position] = label;
        enumerate(
            weights,
            labels,
            position + 1,
            max_label.max(label),
            best,
            best_score,
        );
    }
    labels[position] = 0;
}

/// Block totals for the greedy pass. The cohesion score is a sum of
/// independent per-block terms, so a merge only changes the terms of the two
/// blocks involved.
struct Blocks {
    /// Cluster size
    n: usize,
    sets: DisjointSet,
    /// Summed weight of pairs inside the block, valid for roots only
    internal: Vec<f64>,
    /// Summed weight of pairs leaving the block, valid for roots only
    external: Vec<f64>,
    /// Root -> neighbouring root -> summed weight between the two blocks
    links: Vec<FxHashMap<u32, f64>>,
}

impl Blocks {
    fn new(members: &[RecordId], edges: &[(usize, usize, f64)]) -> Self {
        let n = members.len();
        let mut links = vec![FxHashMap::default(); n];
        let mut external = vec![0.0; n];
        for &(i, j, weight) in edges {
            *links[i].entry(j as u32).or_insert(0.0) += weight;
            *links[j].entry(i as u32).or_insert(0.0) += weight;
            external[i] += weight;
            external[j] += weight;
        }
        Self {
            n,
            sets: DisjointSet::with_records(members.iter().copied()),
            internal: vec![0.0; n],
            external,
            links,
        }
    }

    fn term(&self, size: usize, internal: f64, external: f64) -> f64 {
        let outside = self.n - size;
        let spread = if outside == 0 {
            0.0
        } else {
            external / outside as f64
        };
        internal / size as f64 - spread
    }

    /// Score change from merging the blocks rooted at `p` and `q`.
    fn gain(&mut self, p: u32, q: u32) -> f64 {
        let between = self.links[p as usize].get(&q).copied().unwrap_or(0.0);
        let (size_p, size_q) = (self.sets.set_size(p), self.sets.set_size(q));
        let (p, q) = (p as usize, q as usize);
        let merged = self.term(
            size_p + size_q,
            self.internal[p] + self.internal[q] + between,
            self.external[p] + self.external[q] - 2.0 * between,
        );
        merged
            - self.term(size_p, self.internal[p], self.external[p])
            - self.term(size_q, self.internal[q], self.external[q])
    }

    fn merge(&mut self, p: u32, q: u32) {
        let Some(root) = self.sets.union(p, q) else {
            return;
        };
        let child = if root == p { q } else { p };
        let (root_slot, child_slot) = (root as usize, child as usize);

        let between = self.links[root_slot].remove(&child).unwrap_or(0.0);
        self.links[child_slot].remove(&root);
        self.internal[root_slot] += self.internal[child_slot] + between;
        self.external[root_slot] += self.external[child_slot] - 2.0 * between;

        let moved = std::mem::take(&mut self.links[child_slot]);
        for (neighbour, weight) in moved {
            let back = &mut self.links[neighbour as usize];
            back.remove(&child);
            *back.entry(root).or_insert(0.0) += weight;
            *self.links[root_slot].entry(neighbour).or_insert(0.0) += weight;
        }
    }
}

/// Start from singletons and walk the Duplicate edges once by descending
/// confidence (pair order on ties), merging the two blocks an edge joins
/// whenever that raises the score. The smaller block's neighbour map is folded
/// into the larger one, so each edge moves at most `log n` times.
fn greedy(members: &[RecordId], edges: &[(usize, usize, f64)]) -> Vec<usize> {
    let mut candidates: Vec<(usize, usize, f64)> = edges
        .iter()
        .copied()
        .filter(|&(_, _, weight)| weight > 0.0)
        .collect();
    candidates.sort_by(|a, b| {
        b.2.total_cmp(&a.2)
            .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
    });

    let mut blocks = Blocks::new(members, edges);
    for (i, j, _) in candidates {
        let (p, q) = (blocks.sets.find(i as u32), blocks.sets.find(j as u32));
        if p == q {
            continue;
        }
        if blocks.gain(p, q) > EPSILON {
            blocks.merge(p, q);
        }
    }

    (0..members.len())
        .map(|slot| blocks.sets.find(slot as u32) as usize)
        .collect()
}

fn blocks_from_labels(members: &[RecordId], labels: &[usize]) -> Vec<Vec<RecordId>> {
    let mut blocks: Vec<Vec<RecordId>> = Vec::new();
    let mut slots: Vec<Option<usize>> = vec![None; members.len()];
    for (member, &label) in members.iter().zip(labels) {
        let slot = *slots[label].get_or_insert_with(|| {
            blocks.push(Vec::new());
            blocks.len() - 1
        });
        blocks[slot].push(*member);
    }
    for block in &mut blocks {
        block.sort_unstable();
    }
    blocks.sort_unstable_by_key(|block| block[0]);
    blocks
}
