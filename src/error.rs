use core::fmt;

/// Result alias for `secant`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by tree, cut, and assessment primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Array length does not match the expected node/leaf/edge count.
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Parent array does not encode a valid bottom-up tree.
    InvalidTree {
        /// First offending node.
        node: usize,
        /// What the node violates.
        message: &'static str,
    },

    /// Altitudes violate non-negativity or root-path monotonicity.
    InvalidAltitudes {
        /// First offending node.
        node: usize,
        /// What the altitude violates.
        message: &'static str,
    },

    /// Index or region count outside the valid query domain.
    OutOfRange {
        /// Which quantity was out of range.
        what: &'static str,
        /// Requested value.
        requested: usize,
        /// Exclusive upper bound (or maximum achievable value).
        limit: usize,
    },

    /// Reference labels, leaf weights, or vertex map mismatched to the
    /// leaf/base count.
    InconsistentPartition {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidTree { node, message } => {
                write!(f, "invalid tree at node {node}: {message}")
            }
            Error::InvalidAltitudes { node, message } => {
                write!(f, "invalid altitudes at node {node}: {message}")
            }
            Error::OutOfRange {
                what,
                requested,
                limit,
            } => {
                write!(f, "{what} {requested} out of range (limit {limit})")
            }
            Error::InconsistentPartition { expected, found } => {
                write!(
                    f,
                    "inconsistent partition: expected {expected} entries, found {found}"
                )
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
