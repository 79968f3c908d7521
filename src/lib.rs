//! # secant
//!
//! Horizontal cuts and optimal-cut assessment for hierarchies of
//! partitions.
//!
//! A hierarchy over a ground set (pixels of an image, vertices of a graph)
//! is a merge tree with a non-decreasing altitude per node. This crate
//! answers two questions about such a tree:
//!
//! | Question | Component |
//! |----------|-----------|
//! | What partition does thresholding at altitude t induce? | [`cut::HorizontalCutExplorer`] |
//! | What is the best partition with k regions any tree cut can achieve? | [`assess::OptimalCutAssessor`] |
//!
//! The explorer catalogues every distinct cut of a valued tree and answers
//! point queries by index, altitude, or region count; cut values label
//! leaves, paint per-region node data back onto leaves, and extract the
//! induced edge cut of a base graph. The assessor runs a bottom-up dynamic
//! program over the merge structure to produce a *fragmentation curve*
//! (best score per region count under a pluggable decomposable measure),
//! the optimal partitions realizing it, and a straightened altitude array
//! that replays those partitions through ordinary thresholding.
//!
//! Building the tree itself (clustering, watershed) is out of scope: the
//! parent array and altitudes arrive already constructed and are only
//! borrowed, never mutated.
//!
//! ```rust
//! use secant::{DirectionalHamming, HorizontalCutExplorer, OptimalCutAssessor, Tree};
//!
//! // 4 leaves merged pairwise, then together.
//! let (tree, altitudes) =
//!     Tree::from_merges(&[(0, 1, 1.0), (2, 3, 1.0), (4, 5, 2.0)], 4)?;
//!
//! let explorer = HorizontalCutExplorer::new(&tree, &altitudes)?;
//! assert_eq!(explorer.cut_at_altitude(1.5).num_regions(), 2);
//!
//! let assessor = OptimalCutAssessor::new(&tree, &[0, 0, 1, 1], &DirectionalHamming)?;
//! assert_eq!(assessor.optimal_number_of_regions(), 2);
//! # Ok::<(), secant::Error>(())
//! ```

pub mod assess;
pub mod cut;
/// Error types used across `secant`.
pub mod error;
pub mod tree;

pub use crate::assess::{
    assess_horizontal_cut_curve, score_partition, BidirectionalConsistency, Covering,
    DirectionalHamming, FragmentationCurve, OptimalCutAssessor, PartitionScorer, Polarity,
};
pub use crate::cut::{
    labelize_horizontal_cut_from_threshold, HorizontalCut, HorizontalCutExplorer,
};
pub use crate::tree::Tree;

pub use error::{Error, Result};
