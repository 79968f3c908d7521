//! Horizontal cut value object and cut-derived utilities.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

use crate::error::{Error, Result};
use crate::tree::Tree;

/// A horizontal cut of a hierarchy: an antichain of tree nodes that
/// partitions the leaf set, together with the altitude that produced it.
///
/// Produced by [`crate::cut::HorizontalCutExplorer`]; immutable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HorizontalCut {
    /// Cut nodes, in increasing index order.
    nodes: Vec<usize>,
    /// Altitude of the cut.
    altitude: f64,
}

impl HorizontalCut {
    pub(crate) fn new(nodes: Vec<usize>, altitude: f64) -> Self {
        Self { nodes, altitude }
    }

    /// Cut nodes, in increasing index order.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Altitude of the cut.
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    /// Number of regions of the induced leaf partition.
    pub fn num_regions(&self) -> usize {
        self.nodes.len()
    }

    /// Label every leaf with the index of its owning cut node.
    ///
    /// Labels are node indices, so the numbering is deterministic and
    /// comparable across calls.
    pub fn labelize_leaves(&self, tree: &Tree) -> Vec<usize> {
        labelize_nodes(tree, &self.nodes)
    }

    /// Broadcast a per-node value onto the leaves: each leaf receives the
    /// value stored at its owning cut node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when `node_values` does not
    /// have one entry per tree node.
    pub fn reconstruct_leaf_data<T: Clone>(&self, tree: &Tree, node_values: &[T]) -> Result<Vec<T>> {
        if node_values.len() != tree.num_nodes() {
            return Err(Error::DimensionMismatch {
                expected: tree.num_nodes(),
                found: node_values.len(),
            });
        }
        Ok(self
            .labelize_leaves(tree)
            .into_iter()
            .map(|owner| node_values[owner].clone())
            .collect())
    }

    /// Induced edge cut of a base graph over the leaf set: one flag per
    /// edge, set when the edge endpoints fall in different cut regions.
    ///
    /// Flags follow the graph's edge index order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] when the graph's vertex count
    /// differs from the tree's leaf count.
    pub fn graph_cut<N, E>(&self, tree: &Tree, graph: &UnGraph<N, E>) -> Result<Vec<bool>> {
        if graph.node_count() != tree.num_leaves() {
            return Err(Error::DimensionMismatch {
                expected: tree.num_leaves(),
                found: graph.node_count(),
            });
        }
        let labels = self.labelize_leaves(tree);
        Ok(graph
            .edge_references()
            .map(|e| labels[e.source().index()] != labels[e.target().index()])
            .collect())
    }
}

/// Label every leaf with its owning node from an antichain of cut nodes.
///
/// Ownership propagates top-down through the bottom-up numbering: a node's
/// owner is already known when its children are visited, so one reverse
/// pass suffices. A leaf no cut node covers owns itself.
pub(crate) fn labelize_nodes(tree: &Tree, nodes: &[usize]) -> Vec<usize> {
    const UNSET: usize = usize::MAX;
    let mut owner = vec![UNSET; tree.num_nodes()];
    for &node in nodes {
        owner[node] = node;
    }
    for v in (0..tree.root()).rev() {
        if owner[v] == UNSET {
            let up = owner[tree.parent(v)];
            if up != UNSET {
                owner[v] = up;
            }
        }
    }
    tree.leaves()
        .map(|leaf| if owner[leaf] == UNSET { leaf } else { owner[leaf] })
        .collect()
}

/// Label every leaf of the partition induced by thresholding the valued
/// tree at `threshold`, without building an explorer.
///
/// A leaf's label is the index of its maximal ancestor-or-self whose
/// altitude is at most `threshold`; a leaf above the threshold labels
/// itself. Matches [`HorizontalCut::labelize_leaves`] on the cut an
/// explorer would return for the same threshold.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] when `altitudes` does not have one
/// entry per tree node.
pub fn labelize_horizontal_cut_from_threshold(
    tree: &Tree,
    altitudes: &[f64],
    threshold: f64,
) -> Result<Vec<usize>> {
    if altitudes.len() != tree.num_nodes() {
        return Err(Error::DimensionMismatch {
            expected: tree.num_nodes(),
            found: altitudes.len(),
        });
    }

    const UNSET: usize = usize::MAX;
    let root = tree.root();
    let mut owner = vec![UNSET; tree.num_nodes()];
    if altitudes[root] <= threshold {
        owner[root] = root;
    }
    for v in (0..root).rev() {
        if altitudes[v] > threshold {
            continue;
        }
        let up = owner[tree.parent(v)];
        owner[v] = if up == UNSET { v } else { up };
    }
    Ok(tree
        .leaves()
        .map(|leaf| if owner[leaf] == UNSET { leaf } else { owner[leaf] })
        .collect())
}
