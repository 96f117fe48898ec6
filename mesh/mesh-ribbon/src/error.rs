//! Error types for ribbon generation.

use bezier_spline::SplineError;
use thiserror::Error;

/// Result type for ribbon operations.
pub type RibbonResult<T> = Result<T, RibbonError>;

/// Errors that can occur while building a ribbon mesh.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RibbonError {
    /// Path has too few samples to form a strip.
    #[error("ribbon needs at least {min} path points, got {actual}")]
    TooFewPoints {
        /// Minimum required points.
        min: usize,
        /// Actual point count.
        actual: usize,
    },

    /// Path has more samples than 32-bit indices can address.
    #[error("ribbon with {actual} path points exceeds the index range (max {max})")]
    TooManyPoints {
        /// Maximum supported points.
        max: usize,
        /// Actual point count.
        actual: usize,
    },

    /// Global width is negative or not finite.
    #[error("invalid ribbon width: {0}")]
    InvalidWidth(f64),

    /// Sample spacing is not positive or not finite.
    #[error("invalid sample spacing: {0}")]
    InvalidSpacing(f64),

    /// The underlying spline rejected an operation.
    #[error(transparent)]
    Spline(#[from] SplineError),
}

impl RibbonError {
    /// Check if this error comes from invalid configuration.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidWidth(_) | Self::InvalidSpacing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RibbonError::TooFewPoints { min: 2, actual: 1 };
        assert!(err.to_string().contains("at least 2"));

        let err = RibbonError::InvalidSpacing(-1.0);
        assert!(err.is_config_error());
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_spline_error_conversion() {
        let err: RibbonError = SplineError::LastCurve.into();
        assert!(matches!(err, RibbonError::Spline(SplineError::LastCurve)));
        assert!(!err.is_config_error());
    }
}
