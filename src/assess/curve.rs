//! Fragmentation curve: best score per achievable number of regions.

use crate::assess::scorer::{PartitionScorer, Polarity};
use crate::assess::ReferenceOverlap;
use crate::cut::HorizontalCutExplorer;
use crate::error::Result;
use crate::tree::Tree;

/// Mapping from number of regions to the score achieved at that count,
/// with the reference partition's own region count attached.
///
/// Region counts are strictly increasing. Immutable once produced, either
/// by [`assess_horizontal_cut_curve`] (actual cuts of a valued hierarchy)
/// or by [`crate::assess::OptimalCutAssessor`] (best achievable cuts).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FragmentationCurve {
    num_regions: Vec<usize>,
    scores: Vec<f64>,
    num_regions_ground_truth: usize,
    polarity: Polarity,
}

impl FragmentationCurve {
    pub(crate) fn new(
        num_regions: Vec<usize>,
        scores: Vec<f64>,
        num_regions_ground_truth: usize,
        polarity: Polarity,
    ) -> Self {
        Self {
            num_regions,
            scores,
            num_regions_ground_truth,
            polarity,
        }
    }

    /// Region count of every curve point, strictly increasing.
    pub fn num_regions(&self) -> &[usize] {
        &self.num_regions
    }

    /// Score of every curve point, aligned with
    /// [`num_regions`](Self::num_regions).
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Region counts divided by the reference partition's region count, so
    /// 1.0 marks the reference granularity.
    pub fn num_regions_normalized(&self) -> Vec<f64> {
        let reference = self.num_regions_ground_truth as f64;
        self.num_regions
            .iter()
            .map(|&k| k as f64 / reference)
            .collect()
    }

    /// Number of regions of the reference partition.
    pub fn num_regions_ground_truth(&self) -> usize {
        self.num_regions_ground_truth
    }

    /// Number of curve points.
    pub fn len(&self) -> usize {
        self.num_regions.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.num_regions.is_empty()
    }

    /// Index of the best curve point under the measure's polarity, ties
    /// broken toward the smaller region count.
    pub(crate) fn optimal_index(&self) -> usize {
        let mut best = 0;
        for (i, &score) in self.scores.iter().enumerate().skip(1) {
            if self.polarity.prefers(score, self.scores[best]) {
                best = i;
            }
        }
        best
    }

    /// Region count of the best curve point, ties broken toward the
    /// smaller count.
    pub fn optimal_number_of_regions(&self) -> usize {
        self.num_regions[self.optimal_index()]
    }

    /// Score of the best curve point.
    pub fn optimal_score(&self) -> f64 {
        self.scores[self.optimal_index()]
    }
}

/// Score every catalogued cut of a valued hierarchy against a reference
/// partition.
///
/// This is the one-shot form: it evaluates the *actual* horizontal cuts of
/// `(tree, altitudes)` rather than optimizing over all tree cuts, so the
/// curve has one point per catalogued cut. The reference is one label per
/// leaf, or one label per base element when `vertex_map` maps base
/// elements to leaves. Scores are normalized by total leaf weight.
///
/// # Errors
///
/// Propagates [`crate::Error::InvalidAltitudes`] /
/// [`crate::Error::DimensionMismatch`] from explorer construction and
/// [`crate::Error::InconsistentPartition`] /
/// [`crate::Error::InvalidParameter`] from reference validation.
pub fn assess_horizontal_cut_curve<S: PartitionScorer>(
    tree: &Tree,
    altitudes: &[f64],
    ground_truth: &[usize],
    scorer: &S,
    vertex_map: Option<&[usize]>,
) -> Result<FragmentationCurve> {
    let reference = match vertex_map {
        Some(map) => ReferenceOverlap::from_vertex_map(tree, ground_truth, map)?,
        None => ReferenceOverlap::from_leaf_labels(tree, ground_truth, None)?,
    };
    let explorer = HorizontalCutExplorer::new(tree, altitudes)?;
    let node_overlaps = reference.node_overlaps(tree);

    let mut num_regions = Vec::with_capacity(explorer.num_cuts());
    let mut scores = Vec::with_capacity(explorer.num_cuts());
    for index in 0..explorer.num_cuts() {
        let cut = explorer.cut_at_index(index)?;
        let total: f64 = cut
            .nodes()
            .iter()
            .map(|&v| scorer.score_region(&node_overlaps[v], &reference.class_sizes))
            .sum();
        num_regions.push(cut.num_regions());
        scores.push(total / reference.total_weight);
    }

    Ok(FragmentationCurve::new(
        num_regions,
        scores,
        reference.num_classes(),
        scorer.polarity(),
    ))
}
