//! Error types for spline operations.

use thiserror::Error;

/// Errors returned by spline edits.
///
/// Every operation that returns one of these leaves the spline untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplineError {
    /// Curve index does not name an existing segment.
    #[error("curve index {index} out of range: spline has {curve_count} curves")]
    InvalidCurveIndex {
        /// Requested curve index.
        index: usize,
        /// Number of curves in the spline.
        curve_count: usize,
    },

    /// Split parameter must lie strictly inside `(0, 1)`.
    #[error("cannot split at t={0}: parameter must lie strictly between 0 and 1")]
    InvalidSplitParameter(f64),

    /// The spline only has one curve left.
    #[error("cannot remove the last remaining curve")]
    LastCurve,

    /// A looped spline with a single curve must be opened before removal.
    #[error("cannot remove the only curve of a looped spline; open the loop first")]
    LoopedSingleCurve,

    /// Degenerate geometry (coincident samples, zero determinant, ...).
    #[error("degenerate geometry: {reason}")]
    Degenerate {
        /// Description of the degeneracy.
        reason: String,
    },

    /// Resampling would produce more samples than the sampler allows.
    #[error("sampling would produce {requested} segments (max {max})")]
    TooManySamples {
        /// Largest supported segment count.
        max: usize,
        /// Segment count the spacing asks for.
        requested: usize,
    },

    /// Persisted spline data is inconsistent.
    #[error("invalid spline data: {reason}")]
    InvalidData {
        /// What is wrong with the data.
        reason: String,
    },
}

impl SplineError {
    /// Create an invalid curve index error.
    #[must_use]
    pub fn invalid_curve_index(index: usize, curve_count: usize) -> Self {
        Self::InvalidCurveIndex { index, curve_count }
    }

    /// Create a degenerate geometry error.
    #[must_use]
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate {
            reason: reason.into(),
        }
    }

    /// Create an invalid data error.
    #[must_use]
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }

    /// Check if this error came from a rejected curve removal.
    #[must_use]
    pub fn is_removal_rejected(&self) -> bool {
        matches!(self, Self::LastCurve | Self::LoopedSingleCurve)
    }

    /// Check if this is an invalid curve index error.
    #[must_use]
    pub fn is_invalid_curve_index(&self) -> bool {
        matches!(self, Self::InvalidCurveIndex { .. })
    }

    /// Check if this is a degenerate geometry error.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate { .. })
    }
}
