// src/analysis/linkage.rs

use anyhow::{bail, Result};
use serde::Serialize;

use crate::analysis::hierarchical::{MergeEvent, NodeRef};

/// One row of the linkage structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkageRow {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub leaf_count: usize,
}

impl LinkageRow {
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.left as f64,
            self.right as f64,
            self.distance,
            self.leaf_count as f64,
        ]
    }
}

/// Dendrogram-ready record of every merge: `[child_a, child_b, distance, leaf_count]`
/// per row, where ids at or above `n_leaves` name the node built by row `id - n_leaves`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(into = "Vec<[f64; 4]>")]
pub struct LinkageMatrix {
    pub n_leaves: usize,
    pub rows: Vec<LinkageRow>,
}

impl LinkageMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_arrays(&self) -> Vec<[f64; 4]> {
        self.rows.iter().map(LinkageRow::as_array).collect()
    }
}

impl From<LinkageMatrix> for Vec<[f64; 4]> {
    fn from(matrix: LinkageMatrix) -> Self {
        matrix.to_arrays()
    }
}

/// Converts a merge history over `n_leaves` points into a linkage matrix,
/// computing how many original points sit under each merge.
///
/// Leaf counts are filled in step order; a merge that references its own or
/// a later step is rejected rather than read before it is written.
pub fn reconstruct(n_leaves: usize, merges: &[MergeEvent]) -> Result<LinkageMatrix> {
    let expected = n_leaves.saturating_sub(1);
    if merges.len() != expected {
        bail!(
            "merge history has {} steps, expected {} for {} leaves",
            merges.len(),
            expected,
            n_leaves
        );
    }

    let mut leaf_counts: Vec<usize> = Vec::with_capacity(merges.len());
    let mut rows = Vec::with_capacity(merges.len());

    for (step, merge) in merges.iter().enumerate() {
        let left = leaf_count(merge.left, step, n_leaves, &leaf_counts)?;
        let right = leaf_count(merge.right, step, n_leaves, &leaf_counts)?;
        let count = left + right;
        leaf_counts.push(count);

        rows.push(LinkageRow {
            left: merge.left.linkage_id(n_leaves),
            right: merge.right.linkage_id(n_leaves),
            distance: merge.distance,
            leaf_count: count,
        });
    }

    if let Some(last) = leaf_counts.last() {
        if *last != n_leaves {
            bail!(
                "final merge covers {} leaves, expected {}",
                last,
                n_leaves
            );
        }
    }

    Ok(LinkageMatrix { n_leaves, rows })
}

fn leaf_count(node: NodeRef, step: usize, n_leaves: usize, counts: &[usize]) -> Result<usize> {
    match node {
        NodeRef::Leaf(position) if position < n_leaves => Ok(1),
        NodeRef::Leaf(position) => bail!(
            "step {} references leaf {} but only {} leaves exist",
            step,
            position,
            n_leaves
        ),
        NodeRef::Merge(earlier) if earlier < step => Ok(counts[earlier]),
        NodeRef::Merge(earlier) => bail!(
            "step {} references merge {} before it was built",
            step,
            earlier
        ),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::analysis::hierarchical::{build_hierarchy, Linkage};
    use ndarray::Array2;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_final_row_covers_every_leaf(
            (n, values) in (1usize..40).prop_flat_map(|n| (Just(n), prop::collection::vec(-5.0f64..5.0, n * 2)))
        ) {
            let points = Array2::from_shape_vec((n, 2), values).unwrap();
            let hierarchy = build_hierarchy(points.view(), Linkage::Ward);
            let matrix = reconstruct(n, &hierarchy.merges).unwrap();

            prop_assert_eq!(matrix.len(), n - 1);
            if let Some(last) = matrix.rows.last() {
                prop_assert_eq!(last.leaf_count, n);
            }
            for (step, row) in matrix.rows.iter().enumerate() {
                prop_assert!(row.left < n + step);
                prop_assert!(row.right < n + step);
                prop_assert!(row.leaf_count >= 2);
            }
        }
    }
}
