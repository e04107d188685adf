//! Error types for cover tree construction and mutation.

use thiserror::Error;

use crate::Scalar;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoverTreeError>;

/// Errors that can occur while building or mutating a cover tree.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoverTreeError {
    /// The base of the level exponent is unusable.
    #[error("Invalid base {base}: must be finite and at least 2")]
    InvalidBase {
        /// Base supplied by the caller
        base: Scalar,
    },

    /// The bound on pairwise distances is unusable.
    #[error("Invalid max distance {max_distance}: must be finite and positive")]
    InvalidMaxDistance {
        /// Bound supplied by the caller
        max_distance: Scalar,
    },

    /// The metric produced NaN or an infinite distance.
    #[error("Metric returned a non-finite distance: {distance}")]
    NonFiniteDistance {
        /// Offending distance value
        distance: Scalar,
    },

    /// An orphaned node could not be re-attached at any finite level.
    #[error("No parent found for orphaned node up to level {level}")]
    Unplaceable {
        /// Last level that was searched
        level: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CoverTreeError::InvalidBase { base: 1.5 }.to_string(),
            "Invalid base 1.5: must be finite and at least 2"
        );
        assert_eq!(
            CoverTreeError::InvalidMaxDistance { max_distance: 0. }.to_string(),
            "Invalid max distance 0: must be finite and positive"
        );
        assert!(CoverTreeError::Unplaceable { level: 7 }
            .to_string()
            .contains("level 7"));
    }
}
