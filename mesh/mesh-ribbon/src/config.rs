//! Ribbon generation settings.

use bezier_spline::SamplingConfig;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{RibbonError, RibbonResult};

/// Configuration for sweeping a ribbon along a spline.
///
/// # Example
///
/// ```
/// use mesh_ribbon::RibbonConfig;
///
/// let config = RibbonConfig::default().with_width(0.25).with_spacing(0.1);
/// assert!(config.validate().is_ok());
/// assert!(RibbonConfig::default().with_width(-1.0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RibbonConfig {
    /// Global half-width multiplier.
    pub width: f64,
    /// How the spline is sampled before meshing.
    pub sampling: SamplingConfig,
    /// Starting rotation axis for normal transport. `None` derives one from
    /// the first tangent.
    pub initial_axis: Option<Vector3<f64>>,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            sampling: SamplingConfig::default(),
            initial_axis: None,
        }
    }
}

impl RibbonConfig {
    /// Set the global width.
    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Set the sample spacing.
    #[must_use]
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.sampling = self.sampling.with_spacing(spacing);
        self
    }

    /// Set the walk precision.
    #[must_use]
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.sampling = self.sampling.with_precision(precision);
        self
    }

    /// Set the starting rotation axis.
    #[must_use]
    pub fn with_initial_axis(mut self, axis: Vector3<f64>) -> Self {
        self.initial_axis = Some(axis);
        self
    }

    /// Check the settings before generation.
    ///
    /// # Errors
    ///
    /// [`RibbonError::InvalidWidth`] for a negative or non-finite width,
    /// [`RibbonError::InvalidSpacing`] for a non-positive or non-finite
    /// spacing.
    pub fn validate(&self) -> RibbonResult<()> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(RibbonError::InvalidWidth(self.width));
        }
        let spacing = self.sampling.spacing;
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(RibbonError::InvalidSpacing(spacing));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RibbonConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.initial_axis.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            RibbonConfig::default().with_width(f64::NAN).validate().map_err(|e| e.is_config_error()),
            Err(true)
        );
        assert_eq!(
            RibbonConfig::default().with_spacing(0.0).validate(),
            Err(RibbonError::InvalidSpacing(0.0))
        );
        assert!(RibbonConfig::default().with_width(0.0).validate().is_ok());
    }

    #[test]
    fn test_builders_reach_sampling() {
        let config = RibbonConfig::default()
            .with_spacing(0.2)
            .with_precision(1e-4)
            .with_initial_axis(Vector3::z());
        assert_eq!(config.sampling.spacing, 0.2);
        assert_eq!(config.sampling.precision, 1e-4);
        assert_eq!(config.initial_axis, Some(Vector3::z()));
    }
}
