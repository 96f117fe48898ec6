//! Sampling configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for arc-length resampling of a spline.
///
/// # Example
///
/// ```
/// use bezier_spline::SamplingConfig;
///
/// let config = SamplingConfig::default().with_spacing(0.25);
/// assert!((config.spacing - 0.25).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplingConfig {
    /// Target distance between consecutive samples, in spline units.
    ///
    /// The sampler rounds `length / spacing` to a whole number of segments
    /// and spreads the remainder evenly.
    pub spacing: f64,

    /// Step in global parameter `t` used while walking the curve.
    ///
    /// Clamped into `[1e-6, 1]`. Smaller steps give more accurate spacing.
    pub precision: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            spacing: 0.5,
            precision: 1e-3,
        }
    }
}

impl SamplingConfig {
    /// Dense sampling for final output.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            spacing: 0.1,
            precision: 1e-4,
        }
    }

    /// Sparse sampling for interactive previews.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            spacing: 1.0,
            precision: 1e-2,
        }
    }

    /// Set the target spacing.
    #[must_use]
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the walk step.
    #[must_use]
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Whether spacing is positive and finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.spacing.is_finite() && self.spacing > 0.0 && self.precision.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_order_by_density() {
        let fine = SamplingConfig::fine();
        let normal = SamplingConfig::default();
        let coarse = SamplingConfig::coarse();
        assert!(fine.spacing < normal.spacing && normal.spacing < coarse.spacing);
        assert!(fine.precision < normal.precision && normal.precision < coarse.precision);
    }

    #[test]
    fn test_validity() {
        assert!(SamplingConfig::default().is_valid());
        assert!(!SamplingConfig::default().with_spacing(0.0).is_valid());
        assert!(!SamplingConfig::default().with_spacing(f64::NAN).is_valid());
        assert!(!SamplingConfig::default().with_precision(f64::INFINITY).is_valid());
    }
}
