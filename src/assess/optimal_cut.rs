//! Optimal-cut assessment: the best achievable score at every region
//! count, over all cuts of the tree.
//!
//! # Frontier tables
//!
//! The tree cuts of a hierarchy form an exponential family, but a
//! decomposable scorer makes the optimum computable in one bottom-up pass.
//! Every node carries a *frontier table* mapping "number of regions used
//! to cover this subtree" to "best score achievable with cuts confined to
//! this subtree":
//!
//! ```text
//! leaf:     { 1 -> score of the singleton }
//! internal: combine children tables (max-plus convolution over counts),
//!           then let the node itself stand as a single region at count 1
//! ```
//!
//! The root's table, normalized by total weight, is the fragmentation
//! curve. Each table entry remembers which split of counts produced it, so
//! the realizing partition at any count is recovered by backtracking. The
//! convolution costs O(|smaller child| x |larger child|) per merge,
//! bounding the whole pass by O(n^2) on degenerate chains and
//! O(n log n) on balanced trees.

use tracing::debug;

use crate::assess::curve::FragmentationCurve;
use crate::assess::scorer::{PartitionScorer, Polarity};
use crate::assess::ReferenceOverlap;
use crate::cut::labelize_nodes;
use crate::error::{Error, Result};
use crate::tree::Tree;

/// One convolution entry: best score for a total count, with the child
/// counts that produced it.
#[derive(Debug, Clone, Copy)]
struct DpEntry {
    score: f64,
    left_k: usize,
    right_k: usize,
}

/// How a node's table entry covers its subtree.
#[derive(Debug, Clone, Copy)]
enum Choice {
    /// The whole subtree as a single region.
    Region,
    /// Split across the children per the convolution stages.
    Split,
}

#[derive(Debug, Clone, Copy)]
struct NodeEntry {
    score: f64,
    choice: Choice,
}

/// Frontier table of one node: the pairwise convolution stages over its
/// children (stage j pairs the accumulated prefix with child j + 1) and
/// the final per-count entries.
#[derive(Debug, Default)]
struct NodeTable {
    stages: Vec<Vec<Option<DpEntry>>>,
    entries: Vec<Option<NodeEntry>>,
}

fn final_scores(table: &NodeTable) -> Vec<Option<f64>> {
    table.entries.iter().map(|e| e.map(|e| e.score)).collect()
}

/// Combine two frontier tables into the table of their union.
///
/// Index k of the result holds the best split of k regions across the two
/// sides, capped at `max_k`. Ties prefer the smallest left count. Index 0
/// and index 1 are always `None`: both sides must keep at least one
/// region.
fn combine_frontiers(
    left: &[Option<f64>],
    right: &[Option<f64>],
    polarity: Polarity,
    max_k: usize,
) -> Vec<Option<DpEntry>> {
    let left_max = left.len().saturating_sub(1);
    let right_max = right.len().saturating_sub(1);
    let out_max = (left_max + right_max).min(max_k);
    let mut out: Vec<Option<DpEntry>> = vec![None; out_max + 1];
    for (k, slot) in out.iter_mut().enumerate().skip(2) {
        let lo = k.saturating_sub(right_max).max(1);
        let hi = left_max.min(k - 1);
        let mut best: Option<DpEntry> = None;
        for left_k in lo..=hi {
            let (Some(l), Some(r)) = (left[left_k], right[k - left_k]) else {
                continue;
            };
            let score = l + r;
            let replace = match best {
                None => true,
                Some(b) => polarity.prefers(score, b.score),
            };
            if replace {
                best = Some(DpEntry {
                    score,
                    left_k,
                    right_k: k - left_k,
                });
            }
        }
        *slot = best;
    }
    out
}

/// Assessor of the optimal cuts of a hierarchy against a reference
/// partition.
///
/// Construction runs the full dynamic program; every query afterwards is
/// read-only, so a built assessor is safely shared by multiple readers.
#[derive(Debug)]
pub struct OptimalCutAssessor<'a> {
    tree: &'a Tree,
    tables: Vec<NodeTable>,
    curve: FragmentationCurve,
    /// Achievable donor count per curve point, used to backtrack entries
    /// padded over unreachable counts.
    donors: Vec<usize>,
}

impl<'a> OptimalCutAssessor<'a> {
    /// Assess against one reference label per leaf, unit weights.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InconsistentPartition`] when `ground_truth` does
    /// not have one label per leaf.
    pub fn new<S: PartitionScorer>(
        tree: &'a Tree,
        ground_truth: &[usize],
        scorer: &S,
    ) -> Result<Self> {
        let reference = ReferenceOverlap::from_leaf_labels(tree, ground_truth, None)?;
        Self::build(tree, &reference, scorer, tree.num_leaves())
    }

    /// Assess with a positive integer weight per leaf, for leaves standing
    /// for aggregated elements.
    pub fn with_leaf_weights<S: PartitionScorer>(
        tree: &'a Tree,
        ground_truth: &[usize],
        scorer: &S,
        leaf_weights: &[usize],
    ) -> Result<Self> {
        let reference = ReferenceOverlap::from_leaf_labels(tree, ground_truth, Some(leaf_weights))?;
        Self::build(tree, &reference, scorer, tree.num_leaves())
    }

    /// Assess against one reference label per base element, with
    /// `vertex_map` sending each base element to its tree leaf (the
    /// region-adjacency case).
    pub fn with_vertex_map<S: PartitionScorer>(
        tree: &'a Tree,
        ground_truth: &[usize],
        scorer: &S,
        vertex_map: &[usize],
    ) -> Result<Self> {
        let reference = ReferenceOverlap::from_vertex_map(tree, ground_truth, vertex_map)?;
        Self::build(tree, &reference, scorer, tree.num_leaves())
    }

    /// Assess with the frontier tables capped at `max_regions`, bounding
    /// the curve and the quadratic worst case on large trees.
    pub fn with_max_regions<S: PartitionScorer>(
        tree: &'a Tree,
        ground_truth: &[usize],
        scorer: &S,
        vertex_map: Option<&[usize]>,
        max_regions: usize,
    ) -> Result<Self> {
        if max_regions == 0 {
            return Err(Error::InvalidParameter {
                name: "max_regions",
                message: "must be positive",
            });
        }
        let reference = match vertex_map {
            Some(map) => ReferenceOverlap::from_vertex_map(tree, ground_truth, map)?,
            None => ReferenceOverlap::from_leaf_labels(tree, ground_truth, None)?,
        };
        Self::build(tree, &reference, scorer, max_regions)
    }

    fn build<S: PartitionScorer>(
        tree: &'a Tree,
        reference: &ReferenceOverlap,
        scorer: &S,
        max_regions: usize,
    ) -> Result<Self> {
        let polarity = scorer.polarity();
        let max_regions = max_regions.min(tree.num_leaves());
        let leaf_counts = tree.subtree_leaf_counts();
        let overlaps = reference.node_overlaps(tree);
        let class_sizes = &reference.class_sizes;

        let mut tables: Vec<NodeTable> = Vec::with_capacity(tree.num_nodes());
        for v in 0..tree.num_nodes() {
            let region_score = scorer.score_region(&overlaps[v], class_sizes);
            let table = if tree.is_leaf(v) {
                NodeTable {
                    stages: Vec::new(),
                    entries: vec![
                        None,
                        Some(NodeEntry {
                            score: region_score,
                            choice: Choice::Region,
                        }),
                    ],
                }
            } else {
                let cap = leaf_counts[v].min(max_regions);
                let kids = tree.children(v);
                let mut stage_scores = final_scores(&tables[kids[0]]);
                let mut stages = Vec::with_capacity(kids.len() - 1);
                for &child in &kids[1..] {
                    let merged = combine_frontiers(
                        &stage_scores,
                        &final_scores(&tables[child]),
                        polarity,
                        cap,
                    );
                    stage_scores = merged.iter().map(|e| e.map(|e| e.score)).collect();
                    stages.push(merged);
                }

                let mut entries: Vec<Option<NodeEntry>> = vec![None; cap + 1];
                for (k, entry) in entries.iter_mut().enumerate().skip(1) {
                    if let Some(score) = stage_scores.get(k).copied().flatten() {
                        *entry = Some(NodeEntry {
                            score,
                            choice: Choice::Split,
                        });
                    }
                }
                // The node as a single region: the only way to explain
                // count 1 for a branching node, and for a unary chain it
                // replaces the pass-through only on strict improvement.
                let replace = match entries[1] {
                    None => true,
                    Some(e) => polarity.prefers(region_score, e.score),
                };
                if replace {
                    entries[1] = Some(NodeEntry {
                        score: region_score,
                        choice: Choice::Region,
                    });
                }
                NodeTable { stages, entries }
            };
            tables.push(table);
        }

        // Root table -> curve, padding counts no tree cut can realize by
        // carrying the nearest achievable smaller count forward.
        let curve_len = tree.num_leaves().min(max_regions);
        let root_entries = &tables[tree.root()].entries;
        let mut num_regions = Vec::with_capacity(curve_len);
        let mut scores = Vec::with_capacity(curve_len);
        let mut donors = Vec::with_capacity(curve_len);
        let mut donor = 1usize;
        for k in 1..=curve_len {
            if root_entries.get(k).copied().flatten().is_some() {
                donor = k;
            }
            let entry = root_entries
                .get(donor)
                .copied()
                .flatten()
                .unwrap_or(NodeEntry {
                    score: 0.0,
                    choice: Choice::Region,
                });
            num_regions.push(k);
            scores.push(entry.score / reference.total_weight);
            donors.push(donor);
        }

        debug!(
            num_leaves = tree.num_leaves(),
            num_classes = reference.num_classes(),
            max_regions = curve_len,
            "assessed optimal cuts"
        );

        let curve = FragmentationCurve::new(num_regions, scores, reference.num_classes(), polarity);
        Ok(Self {
            tree,
            tables,
            curve,
            donors,
        })
    }

    /// The curve of best achievable scores, one point per region count.
    pub fn fragmentation_curve(&self) -> &FragmentationCurve {
        &self.curve
    }

    /// Number of regions of the reference partition.
    pub fn num_regions_ground_truth(&self) -> usize {
        self.curve.num_regions_ground_truth()
    }

    /// Best region count under the measure's polarity, ties broken toward
    /// the smaller count.
    pub fn optimal_number_of_regions(&self) -> usize {
        self.curve.optimal_number_of_regions()
    }

    /// Score of the best region count.
    pub fn optimal_score(&self) -> f64 {
        self.curve.optimal_score()
    }

    /// Tree nodes of the partition realizing the curve point at
    /// `num_regions`, in increasing index order.
    ///
    /// For a padded (unreachable) count this is the donor count's
    /// partition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `num_regions` is zero or exceeds
    /// the curve.
    pub fn optimal_partition_nodes_for(&self, num_regions: usize) -> Result<Vec<usize>> {
        if num_regions == 0 || num_regions > self.donors.len() {
            return Err(Error::OutOfRange {
                what: "number of regions",
                requested: num_regions,
                limit: self.donors.len(),
            });
        }
        Ok(self.backtrack(self.donors[num_regions - 1]))
    }

    /// Leaf labelling of the partition realizing the curve point at
    /// `num_regions`; labels are the realizing node indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `num_regions` is zero or exceeds
    /// the curve.
    pub fn optimal_partition_for(&self, num_regions: usize) -> Result<Vec<usize>> {
        Ok(labelize_nodes(
            self.tree,
            &self.optimal_partition_nodes_for(num_regions)?,
        ))
    }

    /// Leaf labelling of the overall best partition.
    pub fn optimal_partition(&self) -> Vec<usize> {
        let donor = self.donors[self.curve.optimal_index()];
        labelize_nodes(self.tree, &self.backtrack(donor))
    }

    /// Altitudes under which ordinary horizontal cuts of the tree replay
    /// the sequence of optimal partitions found by this assessor.
    ///
    /// Walking the curve from coarse to fine, every strict score change
    /// opens a new level: the partition's nodes are stamped with
    /// `max_regions - k` (a node restamped at a finer level keeps the
    /// finer value), flat curve segments collapse into the previous level,
    /// and children are clamped to their parents. Thresholding the result
    /// at its i-th largest distinct value therefore yields the i-th
    /// distinct optimal partition. With `normalize` set, altitudes are
    /// scaled into [0, 1].
    pub fn straightened_altitudes(&self, normalize: bool) -> Vec<f64> {
        let max_regions = self.donors.len();
        let scores = self.curve.scores();
        let mut altitudes = vec![0.0f64; self.tree.num_nodes()];
        for i in 0..max_regions {
            if i > 0 && scores[i] == scores[i - 1] {
                continue;
            }
            let value = (max_regions - (i + 1)) as f64;
            for v in self.backtrack(self.donors[i]) {
                altitudes[v] = value;
            }
        }
        for v in (0..self.tree.root()).rev() {
            let parent = altitudes[self.tree.parent(v)];
            if altitudes[v] > parent {
                altitudes[v] = parent;
            }
        }
        if normalize && max_regions > 1 {
            let scale = (max_regions - 1) as f64;
            for altitude in &mut altitudes {
                *altitude /= scale;
            }
        }
        altitudes
    }

    /// Recover the node set of the table entry at `num_regions` (which
    /// must be achievable) by walking the stored convolution choices.
    fn backtrack(&self, num_regions: usize) -> Vec<usize> {
        let mut nodes = Vec::new();
        let mut stack = vec![(self.tree.root(), num_regions)];
        while let Some((v, k)) = stack.pop() {
            let Some(entry) = self.tables[v].entries.get(k).copied().flatten() else {
                continue;
            };
            match entry.choice {
                Choice::Region => nodes.push(v),
                Choice::Split => {
                    let kids = self.tree.children(v);
                    if kids.len() == 1 {
                        stack.push((kids[0], k));
                        continue;
                    }
                    let mut prefix_k = k;
                    for (stage, &child) in
                        self.tables[v].stages.iter().zip(&kids[1..]).rev()
                    {
                        let Some(e) = stage.get(prefix_k).copied().flatten() else {
                            break;
                        };
                        stack.push((child, e.right_k));
                        prefix_k = e.left_k;
                    }
                    stack.push((kids[0], prefix_k));
                }
            }
        }
        nodes.sort_unstable();
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::scorer::{BidirectionalConsistency, Covering, DirectionalHamming};
    use crate::cut::{labelize_horizontal_cut_from_threshold, HorizontalCutExplorer};
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// The 8-leaf reference hierarchy and its ground-truth labels.
    fn example() -> (Tree, Vec<usize>) {
        let tree =
            Tree::new(vec![8, 8, 9, 9, 10, 10, 11, 13, 12, 12, 11, 13, 14, 14, 14]).unwrap();
        (tree, vec![0, 0, 1, 1, 1, 2, 2, 2])
    }

    /// Whether two labellings describe the same partition (bijective
    /// relabelling).
    fn same_partition(a: &[usize], b: &[usize]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let mut fwd = HashMap::new();
        let mut bwd = HashMap::new();
        for (&x, &y) in a.iter().zip(b.iter()) {
            if *fwd.entry(x).or_insert(y) != y || *bwd.entry(y).or_insert(x) != x {
                return false;
            }
        }
        true
    }

    fn assert_close(got: &[f64], expected: &[f64]) {
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(expected.iter()) {
            assert!((g - e).abs() < 1e-12, "got {got:?}, expected {expected:?}");
        }
    }

    #[test]
    fn test_bce_curve_and_optimum() {
        let (tree, ground_truth) = example();
        let assessor =
            OptimalCutAssessor::new(&tree, &ground_truth, &BidirectionalConsistency).unwrap();

        assert_eq!(assessor.optimal_number_of_regions(), 3);
        assert!((assessor.optimal_score() - (2.0 + 4.0 / 3.0 + 2.5) / 8.0).abs() < 1e-12);
        assert_eq!(assessor.num_regions_ground_truth(), 3);

        let curve = assessor.fragmentation_curve();
        assert_eq!(curve.num_regions(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        let expected: Vec<f64> = [
            2.75,
            4.5,
            2.0 + 4.0 / 3.0 + 2.5,
            2.0 + 4.0 / 3.0 + 2.0,
            2.0 + 4.0 / 3.0 + 4.0 / 3.0,
            2.0 + 4.0 / 3.0 + 4.0 / 3.0,
            4.0,
            3.0,
        ]
        .iter()
        .map(|s| s / 8.0)
        .collect();
        assert_close(curve.scores(), &expected);
        assert_eq!(curve.optimal_number_of_regions(), 3);
    }

    #[test]
    fn test_directional_hamming_curve_and_optimum() {
        let (tree, ground_truth) = example();
        let assessor =
            OptimalCutAssessor::new(&tree, &ground_truth, &DirectionalHamming).unwrap();

        // Three counts tie at full agreement; the smallest wins.
        assert_eq!(assessor.optimal_number_of_regions(), 6);
        assert!((assessor.optimal_score() - 1.0).abs() < 1e-12);

        let curve = assessor.fragmentation_curve();
        let expected: Vec<f64> = [3.0, 5.0, 7.0, 7.0, 7.0, 8.0, 8.0, 8.0]
            .iter()
            .map(|s| s / 8.0)
            .collect();
        assert_close(curve.scores(), &expected);

        let normalized = curve.num_regions_normalized();
        for (i, k) in (1..=8).enumerate() {
            assert!((normalized[i] - k as f64 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_covering_curve_and_optimum() {
        let (tree, ground_truth) = example();
        let assessor = OptimalCutAssessor::new(&tree, &ground_truth, &Covering).unwrap();

        assert_eq!(assessor.optimal_number_of_regions(), 3);
        assert!((assessor.optimal_score() - (5.0 + 4.0 / 3.0) / 8.0).abs() < 1e-12);

        let curve = assessor.fragmentation_curve();
        let expected: Vec<f64> = [
            3.0,
            5.0,
            5.0 + 4.0 / 3.0,
            5.0 + 2.0 / 3.0,
            4.0 + 2.0 / 3.0,
            2.0 + 8.0 / 3.0,
            4.0,
            3.0,
        ]
        .iter()
        .map(|s| s / 8.0)
        .collect();
        assert_close(curve.scores(), &expected);
    }

    #[test]
    fn test_bce_optimal_partitions() {
        let (tree, ground_truth) = example();
        let assessor =
            OptimalCutAssessor::new(&tree, &ground_truth, &BidirectionalConsistency).unwrap();

        let expected: Vec<Vec<usize>> = vec![
            vec![0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 1, 1, 1, 1],
            vec![0, 0, 1, 1, 2, 2, 2, 2],
            vec![0, 0, 1, 1, 2, 2, 2, 3],
            vec![0, 0, 1, 1, 2, 2, 3, 4],
            vec![0, 0, 1, 1, 2, 3, 4, 5],
            vec![0, 0, 1, 2, 3, 4, 5, 6],
            vec![0, 1, 2, 3, 4, 5, 6, 7],
        ];

        assert!(same_partition(&assessor.optimal_partition(), &expected[2]));
        for (i, want) in expected.iter().enumerate() {
            let got = assessor.optimal_partition_for(i + 1).unwrap();
            assert!(same_partition(&got, want), "k = {}: {got:?}", i + 1);
        }
    }

    #[test]
    fn test_partition_queries_out_of_range() {
        let (tree, ground_truth) = example();
        let assessor =
            OptimalCutAssessor::new(&tree, &ground_truth, &BidirectionalConsistency).unwrap();

        assert!(matches!(
            assessor.optimal_partition_for(0),
            Err(Error::OutOfRange { requested: 0, .. })
        ));
        assert!(matches!(
            assessor.optimal_partition_for(9),
            Err(Error::OutOfRange { requested: 9, .. })
        ));
    }

    #[test]
    fn test_straightened_altitudes_replay_optimal_cuts() {
        let (tree, ground_truth) = example();
        let assessor =
            OptimalCutAssessor::new(&tree, &ground_truth, &BidirectionalConsistency).unwrap();

        let altitudes = assessor.straightened_altitudes(false);

        // The straightened tree is a valid input for the explorer.
        assert!(HorizontalCutExplorer::new(&tree, &altitudes).is_ok());

        // Cutting at the i-th largest altitude value replays the optimal
        // partitions; the flat curve segment at 5-6 regions collapses into
        // one level, so the 5-region partition appears twice.
        let expected: Vec<Vec<usize>> = vec![
            vec![0, 0, 0, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 0, 1, 1, 1, 1],
            vec![0, 0, 1, 1, 2, 2, 2, 2],
            vec![0, 0, 1, 1, 2, 2, 2, 3],
            vec![0, 0, 1, 1, 2, 2, 3, 4],
            vec![0, 0, 1, 1, 2, 2, 3, 4],
            vec![0, 0, 1, 2, 3, 4, 5, 6],
            vec![0, 1, 2, 3, 4, 5, 6, 7],
        ];

        let mut sorted = altitudes.clone();
        sorted.sort_by(f64::total_cmp);
        for (i, want) in expected.iter().enumerate() {
            let threshold = sorted[tree.root() - i];
            let got =
                labelize_horizontal_cut_from_threshold(&tree, &altitudes, threshold).unwrap();
            assert!(same_partition(&got, want), "rank {i}: {got:?}");
        }
    }

    #[test]
    fn test_straightened_altitudes_normalized() {
        let (tree, ground_truth) = example();
        let assessor =
            OptimalCutAssessor::new(&tree, &ground_truth, &BidirectionalConsistency).unwrap();

        let altitudes = assessor.straightened_altitudes(true);
        let max = altitudes.iter().copied().fold(0.0, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
        for leaf in tree.leaves() {
            assert_eq!(altitudes[leaf], 0.0);
        }
    }

    #[test]
    fn test_bce_with_vertex_map() {
        // Leaves 0..2 stand for two base elements each; the third leaf of
        // the plain example splits across classes 1 and 2 here.
        let tree = Tree::new(vec![6, 6, 5, 5, 7, 7, 8, 8, 8]).unwrap();
        let ground_truth = vec![0, 0, 1, 1, 1, 2, 2, 2];
        let vertex_map = vec![0, 0, 1, 1, 2, 2, 3, 4];

        let assessor = OptimalCutAssessor::with_vertex_map(
            &tree,
            &ground_truth,
            &BidirectionalConsistency,
            &vertex_map,
        )
        .unwrap();

        assert_eq!(assessor.optimal_number_of_regions(), 3);
        assert!((assessor.optimal_score() - (2.0 + 4.0 / 3.0 + 2.5) / 8.0).abs() < 1e-12);
        assert_eq!(assessor.num_regions_ground_truth(), 3);

        let curve = assessor.fragmentation_curve();
        assert_eq!(curve.num_regions(), &[1, 2, 3, 4, 5]);
        let expected: Vec<f64> = [
            2.75,
            4.5,
            2.0 + 4.0 / 3.0 + 2.5,
            2.0 + 4.0 / 3.0 + 2.0,
            2.0 + 4.0 / 3.0 + 4.0 / 3.0,
        ]
        .iter()
        .map(|s| s / 8.0)
        .collect();
        assert_close(curve.scores(), &expected);
    }

    #[test]
    fn test_uniform_leaf_weights_do_not_change_normalized_scores() {
        let (tree, ground_truth) = example();
        let plain = OptimalCutAssessor::new(&tree, &ground_truth, &DirectionalHamming).unwrap();
        let weighted = OptimalCutAssessor::with_leaf_weights(
            &tree,
            &ground_truth,
            &DirectionalHamming,
            &[3; 8],
        )
        .unwrap();

        assert_close(
            weighted.fragmentation_curve().scores(),
            plain.fragmentation_curve().scores(),
        );
    }

    #[test]
    fn test_max_regions_cap() {
        let (tree, ground_truth) = example();
        let capped = OptimalCutAssessor::with_max_regions(
            &tree,
            &ground_truth,
            &BidirectionalConsistency,
            None,
            4,
        )
        .unwrap();

        let curve = capped.fragmentation_curve();
        assert_eq!(curve.num_regions(), &[1, 2, 3, 4]);
        let expected: Vec<f64> = [2.75, 4.5, 2.0 + 4.0 / 3.0 + 2.5, 2.0 + 4.0 / 3.0 + 2.0]
            .iter()
            .map(|s| s / 8.0)
            .collect();
        assert_close(curve.scores(), &expected);
        assert_eq!(capped.optimal_number_of_regions(), 3);
    }

    #[test]
    fn test_constructor_validation() {
        let (tree, _) = example();

        let err = OptimalCutAssessor::new(&tree, &[0, 1], &DirectionalHamming).unwrap_err();
        assert_eq!(
            err,
            Error::InconsistentPartition {
                expected: 8,
                found: 2
            }
        );

        let err = OptimalCutAssessor::with_vertex_map(
            &tree,
            &[0, 1, 2],
            &DirectionalHamming,
            &[0, 1, 9],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidParameter {
                name: "vertex_map",
                message: "entry does not reference a leaf"
            }
        );

        let err = OptimalCutAssessor::with_leaf_weights(
            &tree,
            &[0, 0, 1, 1, 1, 2, 2, 2],
            &DirectionalHamming,
            &[1, 1, 1, 0, 1, 1, 1, 1],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidParameter {
                name: "leaf_weights",
                message: "weights must be positive"
            }
        );

        let err = OptimalCutAssessor::with_max_regions(
            &tree,
            &[0, 0, 1, 1, 1, 2, 2, 2],
            &DirectionalHamming,
            None,
            0,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidParameter {
                name: "max_regions",
                message: "must be positive"
            }
        );
    }

    #[test]
    fn test_combine_frontiers_hand_tables() {
        // Children tables of the example root under the bidirectional
        // measure: left covers leaves {0..3}, right covers {4..7}.
        let left = vec![
            None,
            Some(2.0),
            Some(2.0 + 4.0 / 3.0),
            Some(2.0 + 2.0 / 3.0),
            Some(5.0 / 3.0),
        ];
        let right = vec![None, Some(2.5), Some(2.0), Some(4.0 / 3.0), Some(4.0 / 3.0)];

        let merged = combine_frontiers(&left, &right, Polarity::Maximize, 8);

        assert!(merged[0].is_none() && merged[1].is_none());
        let at = |k: usize| merged[k].unwrap();
        assert!((at(2).score - 4.5).abs() < 1e-12);
        assert_eq!((at(2).left_k, at(2).right_k), (1, 1));
        assert!((at(3).score - (2.0 + 4.0 / 3.0 + 2.5)).abs() < 1e-12);
        assert_eq!((at(3).left_k, at(3).right_k), (2, 1));
        // Two splits tie at 5 regions; the smaller left count wins.
        assert!((at(5).score - (2.0 + 4.0 / 3.0 + 4.0 / 3.0)).abs() < 1e-12);
        assert_eq!((at(5).left_k, at(5).right_k), (2, 3));
        assert!((at(8).score - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_combine_frontiers_respects_cap_and_polarity() {
        let left = vec![None, Some(1.0), Some(3.0)];
        let right = vec![None, Some(2.0), Some(1.0)];

        let merged = combine_frontiers(&left, &right, Polarity::Maximize, 3);
        assert_eq!(merged.len(), 4);
        assert!((merged[3].unwrap().score - 5.0).abs() < 1e-12);

        let merged = combine_frontiers(&left, &right, Polarity::Minimize, 4);
        assert!((merged[3].unwrap().score - 2.0).abs() < 1e-12);
        assert_eq!(merged[3].unwrap().left_k, 1);
    }

    #[test]
    fn test_unary_chain_passes_through() {
        // 0 -> 1 -> 2: a single leaf under two internal nodes.
        let tree = Tree::new(vec![1, 2, 2]).unwrap();
        let assessor = OptimalCutAssessor::new(&tree, &[0], &DirectionalHamming).unwrap();

        let curve = assessor.fragmentation_curve();
        assert_eq!(curve.num_regions(), &[1]);
        assert!((curve.scores()[0] - 1.0).abs() < 1e-12);
        assert_eq!(assessor.optimal_partition(), vec![0]);
    }

    /// Random binary merge tree from proptest-driven choices.
    fn random_hierarchy(picks: &[(usize, usize)]) -> Tree {
        let n_leaves = picks.len() + 1;
        let mut active: Vec<usize> = (0..n_leaves).collect();
        let mut merges = Vec::with_capacity(picks.len());
        for (i, &(pa, pb)) in picks.iter().enumerate() {
            let a = active.swap_remove(pa % active.len());
            let b = active.swap_remove(pb % active.len());
            merges.push((a, b, (i + 1) as f64));
            active.push(n_leaves + i);
        }
        Tree::from_merges(&merges, n_leaves).unwrap().0
    }

    proptest! {
        #[test]
        fn curve_endpoints_match_direct_scoring(
            picks in prop::collection::vec((any::<usize>(), any::<usize>()), 1..16),
            labels in prop::collection::vec(0usize..4, 16),
        ) {
            let tree = random_hierarchy(&picks);
            let n = tree.num_leaves();
            let ground_truth = &labels[..n];
            let assessor =
                OptimalCutAssessor::new(&tree, ground_truth, &DirectionalHamming).unwrap();
            let scores = assessor.fragmentation_curve().scores();

            // One region: the dominant class covers the whole set.
            let mut class_sizes = [0usize; 4];
            for &label in ground_truth {
                class_sizes[label] += 1;
            }
            let dominant = *class_sizes.iter().max().unwrap() as f64;
            prop_assert!((scores[0] - dominant / n as f64).abs() < 1e-12);

            // Every leaf its own region: all regions pure.
            prop_assert!((scores[n - 1] - 1.0).abs() < 1e-12);
        }

        #[test]
        fn directional_hamming_curve_is_monotone(
            picks in prop::collection::vec((any::<usize>(), any::<usize>()), 1..16),
            labels in prop::collection::vec(0usize..4, 16),
        ) {
            let tree = random_hierarchy(&picks);
            let ground_truth = &labels[..tree.num_leaves()];
            let assessor =
                OptimalCutAssessor::new(&tree, ground_truth, &DirectionalHamming).unwrap();
            let scores = assessor.fragmentation_curve().scores();
            for i in 1..scores.len() {
                prop_assert!(scores[i] + 1e-12 >= scores[i - 1]);
            }
        }

        #[test]
        fn backtracked_partitions_have_requested_counts(
            picks in prop::collection::vec((any::<usize>(), any::<usize>()), 1..16),
            labels in prop::collection::vec(0usize..4, 16),
        ) {
            let tree = random_hierarchy(&picks);
            let n = tree.num_leaves();
            let ground_truth = &labels[..n];
            let assessor =
                OptimalCutAssessor::new(&tree, ground_truth, &BidirectionalConsistency).unwrap();

            // Binary merge trees realize every count exactly.
            for k in 1..=n {
                let nodes = assessor.optimal_partition_nodes_for(k).unwrap();
                prop_assert_eq!(nodes.len(), k);
                let mut distinct = assessor.optimal_partition_for(k).unwrap();
                distinct.sort_unstable();
                distinct.dedup();
                prop_assert_eq!(distinct.len(), k);
            }
        }
    }
}
