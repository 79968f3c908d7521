//! Merge-tree representation of a hierarchy of partitions.
//!
//! A hierarchy over a ground set of `n` elements is a rooted tree whose
//! leaves are the elements and whose internal nodes are successive merges.
//! The tree is stored as a flat parent-index array following the global
//! numbering convention:
//!
//! ```text
//! Index range            │ Nodes
//! ───────────────────────┼──────────────────────────
//! [0, num_leaves)        │ leaves (ground set)
//! [num_leaves, n_nodes)  │ internal nodes (merges)
//! n_nodes - 1            │ root (its own parent)
//! ```
//!
//! Indices increase strictly toward the root, so iterating `0..n_nodes` is
//! a valid bottom-up (children before parents) traversal and no recursion
//! or explicit stack is ever needed.

use crate::error::{Error, Result};

/// A rooted merge tree stored as a flat parent-index array.
///
/// Immutable after construction; all cut and assessment primitives borrow
/// it read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Parent of each node; the root is its own parent.
    parents: Vec<usize>,
    /// Children of each node, in increasing index order.
    children: Vec<Vec<usize>>,
    /// Number of leaf nodes.
    num_leaves: usize,
}

impl Tree {
    /// Build a tree from a parent-index array, validating the numbering
    /// convention.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] for an empty array and
    /// [`Error::InvalidTree`] when a non-root node does not point strictly
    /// upward, the last node is not its own parent, or the childless nodes
    /// do not form the prefix of the numbering.
    pub fn new(parents: Vec<usize>) -> Result<Self> {
        let n = parents.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let root = n - 1;
        if parents[root] != root {
            return Err(Error::InvalidTree {
                node: root,
                message: "root must be its own parent",
            });
        }

        let mut children = vec![Vec::new(); n];
        for (v, &p) in parents.iter().enumerate().take(root) {
            if p >= n {
                return Err(Error::InvalidTree {
                    node: v,
                    message: "parent index out of bounds",
                });
            }
            if p <= v {
                return Err(Error::InvalidTree {
                    node: v,
                    message: "parent index must be strictly greater than the node",
                });
            }
            children[p].push(v);
        }

        let num_leaves = children.iter().take_while(|c| c.is_empty()).count();
        if let Some(v) = (num_leaves..n).find(|&v| children[v].is_empty()) {
            return Err(Error::InvalidTree {
                node: v,
                message: "leaves must precede internal nodes",
            });
        }

        Ok(Self {
            parents,
            children,
            num_leaves,
        })
    }

    /// Build a tree from an agglomerative merge sequence.
    ///
    /// Each merge `(a, b, height)` joins two previously formed clusters
    /// (leaves `0..n_leaves`, then one new node per merge) and records the
    /// dissimilarity at which they merged. Returns the tree together with
    /// its altitude array (zero on leaves, `height` on merge nodes) ready
    /// for [`crate::cut::HorizontalCutExplorer`].
    pub fn from_merges(merges: &[(usize, usize, f64)], n_leaves: usize) -> Result<(Self, Vec<f64>)> {
        let n_total = n_leaves + merges.len();
        if n_total == 0 {
            return Err(Error::EmptyInput);
        }

        let mut parents: Vec<usize> = (0..n_total).collect();
        let mut altitudes = vec![0.0f64; n_total];

        for (i, &(a, b, height)) in merges.iter().enumerate() {
            let merged = n_leaves + i;
            if a >= merged || b >= merged {
                return Err(Error::InvalidTree {
                    node: merged,
                    message: "merge references a cluster that does not exist yet",
                });
            }
            parents[a] = merged;
            parents[b] = merged;
            altitudes[merged] = height;
        }

        let tree = Self::new(parents)?;
        Ok((tree, altitudes))
    }

    /// Total number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.parents.len()
    }

    /// Number of leaf nodes.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Index of the root node (always the last node).
    pub fn root(&self) -> usize {
        self.parents.len() - 1
    }

    /// Parent of a node; the root is its own parent.
    pub fn parent(&self, node: usize) -> usize {
        self.parents[node]
    }

    /// Whether the node is a leaf.
    pub fn is_leaf(&self, node: usize) -> bool {
        node < self.num_leaves
    }

    /// Children of a node, in increasing index order.
    pub fn children(&self, node: usize) -> &[usize] {
        &self.children[node]
    }

    /// Iterator over the leaf indices.
    pub fn leaves(&self) -> core::ops::Range<usize> {
        0..self.num_leaves
    }

    /// Iterator over the internal node indices, bottom-up.
    pub fn internal_nodes(&self) -> core::ops::Range<usize> {
        self.num_leaves..self.parents.len()
    }

    /// Number of leaves in every node's subtree, by bottom-up accumulation.
    pub fn subtree_leaf_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.parents.len()];
        for leaf in 0..self.num_leaves {
            counts[leaf] = 1;
        }
        for node in 0..self.root() {
            counts[self.parents[node]] += counts[node];
        }
        counts
    }
}
