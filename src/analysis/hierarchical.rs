// src/analysis/hierarchical.rs - Agglomerative clustering with a distance-threshold cut

use clap::ValueEnum;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Criterion for the distance between two clusters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Minimum increase of within-cluster variance
    #[default]
    Ward,
    /// Mean distance between members
    Average,
    /// Maximum distance between members
    Complete,
    /// Minimum distance between members
    Single,
}

impl Linkage {
    /// Lance-Williams update: distance from cluster `k` to the union of
    /// `x` and `y`, given the distances before the merge and the cluster sizes.
    fn updated_distance(
        self,
        d_xk: f64,
        d_yk: f64,
        d_xy: f64,
        size_x: usize,
        size_y: usize,
        size_k: usize,
    ) -> f64 {
        let (nx, ny, nk) = (size_x as f64, size_y as f64, size_k as f64);
        match self {
            Linkage::Single => d_xk.min(d_yk),
            Linkage::Complete => d_xk.max(d_yk),
            Linkage::Average => (nx * d_xk + ny * d_yk) / (nx + ny),
            Linkage::Ward => {
                let squared = ((nx + nk) * d_xk * d_xk + (ny + nk) * d_yk * d_yk
                    - nk * d_xy * d_xy)
                    / (nx + ny + nk);
                squared.max(0.0).sqrt()
            }
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Linkage::Ward => "ward",
            Linkage::Average => "average",
            Linkage::Complete => "complete",
            Linkage::Single => "single",
        };
        f.write_str(name)
    }
}

impl FromStr for Linkage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ward" => Ok(Linkage::Ward),
            "average" => Ok(Linkage::Average),
            "complete" => Ok(Linkage::Complete),
            "single" => Ok(Linkage::Single),
            other => Err(format!("unknown linkage '{}'", other)),
        }
    }
}

/// A node of the merge tree: either an original sample position or the
/// cluster created by an earlier merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Leaf(usize),
    Merge(usize),
}

impl NodeRef {
    /// Id in the flat linkage numbering, where merges follow the `n_leaves` leaves.
    pub fn linkage_id(self, n_leaves: usize) -> usize {
        match self {
            NodeRef::Leaf(position) => position,
            NodeRef::Merge(step) => n_leaves + step,
        }
    }
}

/// One step of the agglomerative process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    pub left: NodeRef,
    pub right: NodeRef,
    pub distance: f64,
}

/// The complete merge tree over `n_leaves` points. Step `i` creates node
/// `NodeRef::Merge(i)`, and only ever references steps before `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub n_leaves: usize,
    pub linkage: Linkage,
    pub merges: Vec<MergeEvent>,
}

/// Final cluster label per sample position. Labels are dense, numbered by
/// first appearance in sample order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    pub labels: Vec<usize>,
    pub n_clusters: usize,
}

/// Output of one clustering call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringOutcome {
    pub assignment: ClusterAssignment,
    pub hierarchy: Hierarchy,
}

/// Builds the full hierarchy over the rows of `points` and labels every row
/// by cutting it at `distance_threshold`.
pub fn cluster(
    points: ArrayView2<f64>,
    distance_threshold: f64,
    linkage: Linkage,
) -> ClusteringOutcome {
    let hierarchy = build_hierarchy(points, linkage);
    let assignment = hierarchy.cut(distance_threshold);
    ClusteringOutcome {
        assignment,
        hierarchy,
    }
}

impl Hierarchy {
    /// Applies every merge whose subtree height is within `threshold`.
    /// The height of a merge is its distance, raised to the height of its
    /// children if rounding left it below them, so a cluster is only formed
    /// when all of its sub-clusters are.
    pub fn cut(&self, threshold: f64) -> ClusterAssignment {
        let n = self.n_leaves;
        let mut sets = DisjointSet::new(n);
        let mut representative: Vec<usize> = Vec::with_capacity(self.merges.len());
        let mut heights: Vec<f64> = Vec::with_capacity(self.merges.len());

        for merge in &self.merges {
            let (left_leaf, left_height) = node_summary(merge.left, &representative, &heights);
            let (right_leaf, right_height) =
                node_summary(merge.right, &representative, &heights);
            let height = merge.distance.max(left_height).max(right_height);

            if height <= threshold {
                sets.union(left_leaf, right_leaf);
            }
            representative.push(left_leaf);
            heights.push(height);
        }

        let mut dense: HashMap<usize, usize> = HashMap::new();
        let labels: Vec<usize> = (0..n)
            .map(|position| {
                let root = sets.find(position);
                let next = dense.len();
                *dense.entry(root).or_insert(next)
            })
            .collect();

        ClusterAssignment {
            labels,
            n_clusters: dense.len(),
        }
    }
}

fn node_summary(node: NodeRef, representative: &[usize], heights: &[f64]) -> (usize, f64) {
    match node {
        NodeRef::Leaf(position) => (position, 0.0),
        NodeRef::Merge(step) => (representative[step], heights[step]),
    }
}

/// Computes the n-1 merges over the rows of `points` with the
/// nearest-neighbour chain algorithm, then orders them by distance.
pub fn build_hierarchy(points: ArrayView2<f64>, linkage: Linkage) -> Hierarchy {
    let n = points.nrows();
    if n < 2 {
        return Hierarchy {
            n_leaves: n,
            linkage,
            merges: Vec::new(),
        };
    }

    let raw = nearest_neighbor_chain(CondensedDistances::euclidean(points), linkage);
    Hierarchy {
        n_leaves: n,
        linkage,
        merges: order_merges(raw),
    }
}

/// A merge in the order the chain algorithm found it. Child merges are
/// referenced by their index in that same order.
#[derive(Debug, Clone, Copy)]
struct RawMerge {
    left: NodeRef,
    right: NodeRef,
    distance: f64,
    /// Max of this distance and the children's heights; sort key.
    height: f64,
}

fn nearest_neighbor_chain(mut distances: CondensedDistances, linkage: Linkage) -> Vec<RawMerge> {
    let n = distances.n;
    let mut active = vec![true; n];
    let mut sizes = vec![1usize; n];
    // Tree node currently stored in each slot.
    let mut slot_node: Vec<NodeRef> = (0..n).map(NodeRef::Leaf).collect();
    let mut heights: Vec<f64> = Vec::with_capacity(n - 1);
    let mut raw: Vec<RawMerge> = Vec::with_capacity(n - 1);
    let mut chain: Vec<usize> = Vec::with_capacity(n);

    for _ in 0..n - 1 {
        if chain.is_empty() {
            if let Some(first) = active.iter().position(|&a| a) {
                chain.push(first);
            }
        }

        let (x, y, distance) = loop {
            let x = chain[chain.len() - 1];
            let previous = if chain.len() >= 2 {
                Some(chain[chain.len() - 2])
            } else {
                None
            };

            // Ties prefer the previous chain element, which guarantees progress.
            let mut nearest = previous.or_else(|| (0..n).find(|&i| active[i] && i != x));
            let mut nearest_distance = nearest.map_or(f64::INFINITY, |y| distances.get(x, y));
            for i in 0..n {
                if !active[i] || i == x {
                    continue;
                }
                let d = distances.get(x, i);
                if d < nearest_distance {
                    nearest_distance = d;
                    nearest = Some(i);
                }
            }

            // At least two slots are active on every iteration.
            let y = nearest.unwrap_or(x);
            if previous == Some(y) {
                break (x, y, nearest_distance);
            }
            chain.push(y);
        };
        chain.truncate(chain.len() - 2);

        // The merged cluster lives on in the higher slot.
        let (x, y) = if x < y { (x, y) } else { (y, x) };
        for k in 0..n {
            if !active[k] || k == x || k == y {
                continue;
            }
            let updated = linkage.updated_distance(
                distances.get(x, k),
                distances.get(y, k),
                distance,
                sizes[x],
                sizes[y],
                sizes[k],
            );
            distances.set(y, k, updated);
        }

        let height = distance
            .max(raw_height(slot_node[x], &heights))
            .max(raw_height(slot_node[y], &heights));
        raw.push(RawMerge {
            left: slot_node[x],
            right: slot_node[y],
            distance,
            height,
        });
        heights.push(height);

        slot_node[y] = NodeRef::Merge(raw.len() - 1);
        sizes[y] += sizes[x];
        active[x] = false;
    }

    raw
}

fn raw_height(node: NodeRef, heights: &[f64]) -> f64 {
    match node {
        NodeRef::Leaf(_) => 0.0,
        NodeRef::Merge(index) => heights[index],
    }
}

/// Stable-sorts merges by height and renumbers merge references so that
/// step `i` of the result is `NodeRef::Merge(i)`. Within an event the child
/// with the smaller linkage id comes first.
fn order_merges(raw: Vec<RawMerge>) -> Vec<MergeEvent> {
    let n_leaves = raw.len() + 1;
    let mut order: Vec<usize> = (0..raw.len()).collect();
    order.sort_by(|&a, &b| raw[a].height.total_cmp(&raw[b].height));

    let mut step_of = vec![0usize; raw.len()];
    for (step, &index) in order.iter().enumerate() {
        step_of[index] = step;
    }

    let renumber = |node: NodeRef| match node {
        NodeRef::Leaf(position) => NodeRef::Leaf(position),
        NodeRef::Merge(index) => NodeRef::Merge(step_of[index]),
    };

    order
        .iter()
        .map(|&index| {
            let merge = raw[index];
            let (a, b) = (renumber(merge.left), renumber(merge.right));
            let (left, right) = if a.linkage_id(n_leaves) <= b.linkage_id(n_leaves) {
                (a, b)
            } else {
                (b, a)
            };
            MergeEvent {
                left,
                right,
                distance: merge.distance,
            }
        })
        .collect()
}

/// Upper triangle of the pairwise distance matrix, row-major.
struct CondensedDistances {
    n: usize,
    values: Vec<f64>,
}

impl CondensedDistances {
    fn euclidean(points: ArrayView2<f64>) -> Self {
        let n = points.nrows();
        let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            let row_i = points.row(i);
            for j in (i + 1)..n {
                let squared: f64 = row_i
                    .iter()
                    .zip(points.row(j).iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                values.push(squared.sqrt());
            }
        }
        Self { n, values }
    }

    fn index(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.n * i - i * (i + 1) / 2 + (j - i - 1)
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.index(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.index(i, j);
        self.values[idx] = value;
    }
}

/// Union-find over sample positions with path halving and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use ndarray::Array2;
    use proptest::prelude::*;

    /// Textbook O(n^3) agglomeration: merge the globally closest pair each step.
    fn naive_distances(points: &Array2<f64>, linkage: Linkage) -> Vec<f64> {
        let n = points.nrows();
        let mut d = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                d[i][j] = points
                    .row(i)
                    .iter()
                    .zip(points.row(j).iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt();
            }
        }
        let mut active = vec![true; n];
        let mut sizes = vec![1usize; n];
        let mut out = Vec::new();
        for _ in 1..n {
            let mut best = (0, 0, f64::INFINITY);
            for i in 0..n {
                for j in (i + 1)..n {
                    if active[i] && active[j] && d[i][j] < best.2 {
                        best = (i, j, d[i][j]);
                    }
                }
            }
            let (x, y, dist) = best;
            for k in 0..n {
                if active[k] && k != x && k != y {
                    let v = linkage.updated_distance(d[x][k], d[y][k], dist, sizes[x], sizes[y], sizes[k]);
                    d[y][k] = v;
                    d[k][y] = v;
                }
            }
            sizes[y] += sizes[x];
            active[x] = false;
            out.push(dist);
        }
        out.sort_by(f64::total_cmp);
        out
    }

    fn points_strategy() -> impl Strategy<Value = Array2<f64>> {
        (2usize..14).prop_flat_map(|n| {
            prop::collection::vec(-10.0f64..10.0, n * 3)
                .prop_map(move |v| Array2::from_shape_vec((n, 3), v).unwrap())
        })
    }

    fn linkage_strategy() -> impl Strategy<Value = Linkage> {
        prop_oneof![
            Just(Linkage::Ward),
            Just(Linkage::Average),
            Just(Linkage::Complete),
            Just(Linkage::Single),
        ]
    }

    proptest! {
        /// The chain algorithm finds the same merge heights as exhaustive search.
        #[test]
        fn prop_matches_naive_agglomeration(points in points_strategy(), linkage in linkage_strategy()) {
            let fast: Vec<f64> = build_hierarchy(points.view(), linkage)
                .merges
                .iter()
                .map(|m| m.distance)
                .collect();
            let slow = naive_distances(&points, linkage);
            prop_assert_eq!(fast.len(), slow.len());
            for (a, b) in fast.iter().zip(slow.iter()) {
                prop_assert!((a - b).abs() < 1e-7, "{} vs {}", a, b);
            }
        }

        /// Raising the threshold never increases the number of clusters.
        #[test]
        fn prop_cluster_count_monotone_in_threshold(
            points in points_strategy(),
            linkage in linkage_strategy(),
            t1 in 0.0f64..30.0,
            delta in 0.0f64..30.0,
        ) {
            let hierarchy = build_hierarchy(points.view(), linkage);
            let low = hierarchy.cut(t1);
            let high = hierarchy.cut(t1 + delta);
            prop_assert!(high.n_clusters <= low.n_clusters);
            prop_assert!(low.n_clusters >= 1);
            prop_assert_eq!(low.labels.len(), points.nrows());
            prop_assert!(low.labels.iter().all(|&label| label < low.n_clusters));
        }

        #[test]
        fn prop_always_n_minus_one_merges(points in points_strategy(), linkage in linkage_strategy()) {
            let hierarchy = build_hierarchy(points.view(), linkage);
            prop_assert_eq!(hierarchy.merges.len(), points.nrows() - 1);
        }
    }
}
