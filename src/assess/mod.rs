//! Partition-quality assessment against a ground-truth reference.
//!
//! Two entry points share the same scorers and result type:
//!
//! | Entry point | Question answered |
//! |-------------|-------------------|
//! | [`assess_horizontal_cut_curve`] | how good are the *actual* cuts of this valued hierarchy? |
//! | [`OptimalCutAssessor`] | how good is the *best achievable* cut at every region count? |
//!
//! The optimal-cut engine is a bottom-up dynamic program over the merge
//! structure; it never enumerates the exponentially many tree cuts. Both
//! engines accept the reference either as one label per leaf (optionally
//! weighted) or as one label per base element together with a
//! base-to-leaf vertex map (the region-adjacency case).

mod curve;
mod optimal_cut;
mod scorer;

pub use curve::{assess_horizontal_cut_curve, FragmentationCurve};
pub use optimal_cut::OptimalCutAssessor;
pub use scorer::{
    score_partition, BidirectionalConsistency, Covering, DirectionalHamming, PartitionScorer,
    Polarity,
};

use crate::error::{Error, Result};
use crate::tree::Tree;

/// Reference partition preprocessed into per-leaf class histograms.
///
/// Distinct labels are reindexed densely in sorted order, so class ids are
/// deterministic whatever the caller's label values.
#[derive(Debug, Clone)]
pub(crate) struct ReferenceOverlap {
    /// Per leaf, the total weight carried by each reference class.
    pub leaf_overlaps: Vec<Vec<f64>>,
    /// Total weight of each reference class.
    pub class_sizes: Vec<f64>,
    /// Total leaf weight; normalization constant for all scores.
    pub total_weight: f64,
}

impl ReferenceOverlap {
    /// One label per leaf, with optional positive integer weights.
    pub fn from_leaf_labels(
        tree: &Tree,
        labels: &[usize],
        weights: Option<&[usize]>,
    ) -> Result<Self> {
        if labels.len() != tree.num_leaves() {
            return Err(Error::InconsistentPartition {
                expected: tree.num_leaves(),
                found: labels.len(),
            });
        }
        if let Some(weights) = weights {
            if weights.len() != tree.num_leaves() {
                return Err(Error::InconsistentPartition {
                    expected: tree.num_leaves(),
                    found: weights.len(),
                });
            }
            if weights.contains(&0) {
                return Err(Error::InvalidParameter {
                    name: "leaf_weights",
                    message: "weights must be positive",
                });
            }
        }

        let (classes, num_classes) = scorer::dense_index(labels);
        let mut leaf_overlaps = vec![vec![0.0; num_classes]; tree.num_leaves()];
        let mut class_sizes = vec![0.0; num_classes];
        let mut total_weight = 0.0;
        for (leaf, &class) in classes.iter().enumerate() {
            let weight = weights.map_or(1.0, |w| w[leaf] as f64);
            leaf_overlaps[leaf][class] += weight;
            class_sizes[class] += weight;
            total_weight += weight;
        }

        Ok(Self {
            leaf_overlaps,
            class_sizes,
            total_weight,
        })
    }

    /// One label per base element, with a base-to-leaf vertex map. A leaf
    /// standing for several base elements may carry a mixed histogram.
    pub fn from_vertex_map(tree: &Tree, labels: &[usize], vertex_map: &[usize]) -> Result<Self> {
        if labels.len() != vertex_map.len() {
            return Err(Error::InconsistentPartition {
                expected: vertex_map.len(),
                found: labels.len(),
            });
        }
        if vertex_map.iter().any(|&leaf| leaf >= tree.num_leaves()) {
            return Err(Error::InvalidParameter {
                name: "vertex_map",
                message: "entry does not reference a leaf",
            });
        }

        let (classes, num_classes) = scorer::dense_index(labels);
        let mut leaf_overlaps = vec![vec![0.0; num_classes]; tree.num_leaves()];
        let mut class_sizes = vec![0.0; num_classes];
        for (&leaf, &class) in vertex_map.iter().zip(classes.iter()) {
            leaf_overlaps[leaf][class] += 1.0;
            class_sizes[class] += 1.0;
        }

        Ok(Self {
            leaf_overlaps,
            class_sizes,
            total_weight: labels.len() as f64,
        })
    }

    /// Number of regions of the reference partition.
    pub fn num_classes(&self) -> usize {
        self.class_sizes.len()
    }

    /// Class-overlap vector of every tree node, by bottom-up accumulation.
    pub fn node_overlaps(&self, tree: &Tree) -> Vec<Vec<f64>> {
        let num_classes = self.num_classes();
        let mut overlaps = vec![vec![0.0; num_classes]; tree.num_nodes()];
        for leaf in tree.leaves() {
            overlaps[leaf].clone_from(&self.leaf_overlaps[leaf]);
        }
        for node in 0..tree.root() {
            let (lower, upper) = overlaps.split_at_mut(tree.parent(node));
            let parent = &mut upper[0];
            for (acc, w) in parent.iter_mut().zip(lower[node].iter()) {
                *acc += w;
            }
        }
        overlaps
    }
}
