//! Catalogue of the distinct horizontal cuts of a valued hierarchy.

use tracing::debug;

use crate::cut::horizontal::HorizontalCut;
use crate::error::{Error, Result};
use crate::tree::Tree;

/// Explorer over every distinct horizontal cut of a `(tree, altitudes)`
/// pair.
///
/// Construction validates the altitude invariants, then catalogues one cut
/// per distinct altitude value, sorted by strictly decreasing altitude.
/// Region counts are non-decreasing along that order (strictly increasing
/// unless the tree contains single-child chains, whose thresholds induce
/// the same leaf partition). Cut node sets are materialized on demand from
/// the catalogued threshold; the explorer itself is read-only after
/// construction and safe to query from multiple readers.
#[derive(Debug, Clone)]
pub struct HorizontalCutExplorer<'a> {
    tree: &'a Tree,
    altitudes: Vec<f64>,
    /// Catalogued thresholds, strictly decreasing.
    cut_altitudes: Vec<f64>,
    /// Region count of each catalogued cut.
    cut_num_regions: Vec<usize>,
}

impl<'a> HorizontalCutExplorer<'a> {
    /// Build the cut catalogue for a valued tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when `altitudes` does not have
    /// one entry per node, and [`Error::InvalidAltitudes`] citing the first
    /// violating node when a value is negative (or NaN), a leaf altitude is
    /// nonzero, or a node exceeds its parent's altitude.
    pub fn new(tree: &'a Tree, altitudes: &[f64]) -> Result<Self> {
        if altitudes.len() != tree.num_nodes() {
            return Err(Error::DimensionMismatch {
                expected: tree.num_nodes(),
                found: altitudes.len(),
            });
        }
        for (node, &alt) in altitudes.iter().enumerate() {
            if !(alt >= 0.0) {
                return Err(Error::InvalidAltitudes {
                    node,
                    message: "altitude must be non-negative",
                });
            }
        }
        for leaf in tree.leaves() {
            if altitudes[leaf] != 0.0 {
                return Err(Error::InvalidAltitudes {
                    node: leaf,
                    message: "leaf altitude must be zero",
                });
            }
        }
        for node in 0..tree.root() {
            if altitudes[node] > altitudes[tree.parent(node)] {
                return Err(Error::InvalidAltitudes {
                    node,
                    message: "altitude must not exceed the parent altitude",
                });
            }
        }

        // One cut per distinct altitude value, coarsest (root altitude)
        // first. Nodes sharing an altitude collapse into a single cut.
        let mut cut_altitudes = altitudes.to_vec();
        cut_altitudes.sort_by(|a, b| b.total_cmp(a));
        cut_altitudes.dedup();

        // Thresholding at t splits every internal node above t into its
        // children, so the region count is 1 + sum of (arity - 1) over
        // internal nodes with altitude > t. One merge-sorted sweep covers
        // all thresholds.
        let mut splits: Vec<(f64, usize)> = tree
            .internal_nodes()
            .map(|v| (altitudes[v], tree.children(v).len() - 1))
            .collect();
        splits.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut cut_num_regions = Vec::with_capacity(cut_altitudes.len());
        let mut regions = 1usize;
        let mut next_split = 0usize;
        for &threshold in &cut_altitudes {
            while next_split < splits.len() && splits[next_split].0 > threshold {
                regions += splits[next_split].1;
                next_split += 1;
            }
            cut_num_regions.push(regions);
        }

        debug!(
            num_cuts = cut_altitudes.len(),
            num_leaves = tree.num_leaves(),
            "built horizontal cut catalogue"
        );

        Ok(Self {
            tree,
            altitudes: altitudes.to_vec(),
            cut_altitudes,
            cut_num_regions,
        })
    }

    /// Number of distinct cuts in the catalogue.
    pub fn num_cuts(&self) -> usize {
        self.cut_altitudes.len()
    }

    /// Catalogued altitudes, strictly decreasing (index 0 = coarsest cut).
    pub fn cut_altitudes(&self) -> &[f64] {
        &self.cut_altitudes
    }

    /// Region count of each catalogued cut, aligned with
    /// [`cut_altitudes`](Self::cut_altitudes).
    pub fn cut_region_counts(&self) -> &[usize] {
        &self.cut_num_regions
    }

    /// The i-th cut; index 0 is the coarsest (highest altitude, fewest
    /// regions).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `index >= num_cuts()`.
    pub fn cut_at_index(&self, index: usize) -> Result<HorizontalCut> {
        if index >= self.num_cuts() {
            return Err(Error::OutOfRange {
                what: "cut index",
                requested: index,
                limit: self.num_cuts(),
            });
        }
        Ok(self.materialize(index))
    }

    /// The cut that direct thresholding at `altitude` would produce: the
    /// first catalogued cut (in decreasing-altitude order) whose altitude
    /// is at most `altitude`, clamped to the finest cut below the minimum.
    pub fn cut_at_altitude(&self, altitude: f64) -> HorizontalCut {
        let index = self
            .cut_altitudes
            .partition_point(|&alt| alt > altitude)
            .min(self.num_cuts() - 1);
        self.materialize(index)
    }

    /// The finest cut whose region count still reaches `num_regions`: the
    /// smallest catalogued count that is >= `num_regions`, clamped to the
    /// finest cut when the request exceeds the maximum.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] when `num_regions` is zero.
    pub fn cut_to_num_regions(&self, num_regions: usize) -> Result<HorizontalCut> {
        if num_regions == 0 {
            return Err(Error::OutOfRange {
                what: "number of regions",
                requested: 0,
                limit: *self.cut_num_regions.last().unwrap_or(&0),
            });
        }
        let index = self
            .cut_num_regions
            .partition_point(|&count| count < num_regions)
            .min(self.num_cuts() - 1);
        Ok(self.materialize(index))
    }

    /// Collect the maximal nodes at the catalogued threshold.
    fn materialize(&self, index: usize) -> HorizontalCut {
        let threshold = self.cut_altitudes[index];
        let root = self.tree.root();
        let nodes = (0..self.tree.num_nodes())
            .filter(|&v| {
                self.altitudes[v] <= threshold
                    && (v == root || self.altitudes[self.tree.parent(v)] > threshold)
            })
            .collect();
        HorizontalCut::new(nodes, threshold)
    }
}
