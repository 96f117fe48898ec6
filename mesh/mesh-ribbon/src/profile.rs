//! Width profiles and UV layout.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A piecewise-linear function of the path parameter `t`.
///
/// Keys are kept sorted by `t`. Outside the key range the curve holds the
/// nearest key's value; with no keys it is constantly `1`.
///
/// # Example
///
/// ```
/// use mesh_ribbon::WidthCurve;
///
/// let taper = WidthCurve::new(vec![(0.0, 1.0), (1.0, 0.0)]);
/// assert!((taper.evaluate(0.25) - 0.75).abs() < 1e-12);
/// assert!((WidthCurve::default().evaluate(0.3) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WidthCurve {
    keys: Vec<(f64, f64)>,
}

impl WidthCurve {
    /// Create a curve from `(t, value)` keys in any order.
    #[must_use]
    pub fn new(mut keys: Vec<(f64, f64)>) -> Self {
        keys.retain(|(t, v)| t.is_finite() && v.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// A curve that is `value` everywhere.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![(0.0, value)])
    }

    /// The sorted keys.
    #[must_use]
    pub fn keys(&self) -> &[(f64, f64)] {
        &self.keys
    }

    /// Value at `t`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        let (Some(&(t0, v0)), Some(&(t1, v1))) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };
        if t <= t0 {
            return v0;
        }
        if t >= t1 {
            return v1;
        }
        // first key strictly after t; exists and is > 0 because t0 < t < t1
        let upper = self.keys.partition_point(|&(kt, _)| kt <= t);
        let (ta, va) = self.keys[upper - 1];
        let (tb, vb) = self.keys[upper];
        let span = tb - ta;
        if span <= 0.0 {
            return vb;
        }
        va + (vb - va) * ((t - ta) / span)
    }
}

/// How the `v` texture coordinate runs along the ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UvMode {
    /// `v` runs from 0 at the start to 1 at the end.
    #[default]
    Linear,
    /// `v` runs 0 → 1 → 0, peaking at the middle sample.
    PingPong,
}

/// Cross-section width and UV settings for a ribbon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WidthProfile {
    /// Width multiplier on the right side, over `t`.
    pub right: WidthCurve,
    /// Width multiplier on the left side; only used when `asymmetric`.
    pub left: WidthCurve,
    /// Use `left` for the left side instead of mirroring `right`.
    pub asymmetric: bool,
    /// Multiply widths by the sample's interpolated `scale.x`.
    pub use_point_scale: bool,
    /// Layout of the `v` coordinate.
    pub uv_mode: UvMode,
    /// Flip `v` to `1 - v`.
    pub mirror_uv: bool,
}

impl Default for WidthProfile {
    fn default() -> Self {
        Self {
            right: WidthCurve::default(),
            left: WidthCurve::default(),
            asymmetric: false,
            use_point_scale: true,
            uv_mode: UvMode::Linear,
            mirror_uv: false,
        }
    }
}

impl WidthProfile {
    /// Symmetric profile following `curve`.
    #[must_use]
    pub fn symmetric(curve: WidthCurve) -> Self {
        Self {
            right: curve,
            ..Self::default()
        }
    }

    /// Profile with independent left and right curves.
    #[must_use]
    pub fn asymmetric(left: WidthCurve, right: WidthCurve) -> Self {
        Self {
            right,
            left,
            asymmetric: true,
            ..Self::default()
        }
    }

    /// Set the UV mode.
    #[must_use]
    pub fn with_uv_mode(mut self, uv_mode: UvMode) -> Self {
        self.uv_mode = uv_mode;
        self
    }

    /// Flip the `v` coordinate.
    #[must_use]
    pub fn with_mirrored_uv(mut self, mirror_uv: bool) -> Self {
        self.mirror_uv = mirror_uv;
        self
    }

    /// Enable or disable point scale.
    #[must_use]
    pub fn with_point_scale(mut self, use_point_scale: bool) -> Self {
        self.use_point_scale = use_point_scale;
        self
    }

    /// `(left, right)` half-widths at parameter `t`.
    #[must_use]
    pub fn widths_at(&self, t: f64, scale_x: f64, global: f64) -> (f64, f64) {
        let base = if self.use_point_scale {
            global * scale_x
        } else {
            global
        };
        let right = base * self.right.evaluate(t);
        let left = if self.asymmetric {
            base * self.left.evaluate(t)
        } else {
            right
        };
        (left, right)
    }

    /// `v` coordinate of sample `i` out of `count`.
    #[must_use]
    pub fn uv_v(&self, i: usize, count: usize) -> f64 {
        let fraction = if count > 1 {
            i as f64 / (count - 1) as f64
        } else {
            0.0
        };
        let v = match self.uv_mode {
            UvMode::Linear => fraction,
            UvMode::PingPong => 1.0 - (2.0 * fraction - 1.0).abs(),
        };
        if self.mirror_uv { 1.0 - v } else { v }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_curve_interpolates_and_clamps() {
        let curve = WidthCurve::new(vec![(1.0, 3.0), (0.0, 1.0), (0.5, 2.0)]);
        assert_eq!(curve.keys()[0], (0.0, 1.0));
        assert_relative_eq!(curve.evaluate(-1.0), 1.0);
        assert_relative_eq!(curve.evaluate(0.25), 1.5);
        assert_relative_eq!(curve.evaluate(0.5), 2.0);
        assert_relative_eq!(curve.evaluate(0.75), 2.5);
        assert_relative_eq!(curve.evaluate(2.0), 3.0);
    }

    #[test]
    fn test_curve_step_and_garbage_keys() {
        let step = WidthCurve::new(vec![(0.0, 1.0), (0.5, 1.0), (0.5, 4.0), (1.0, 4.0), (f64::NAN, 9.0)]);
        assert_eq!(step.keys().len(), 4);
        assert_relative_eq!(step.evaluate(0.49), 1.0);
        assert_relative_eq!(step.evaluate(0.51), 4.0);
        assert_relative_eq!(WidthCurve::constant(0.3).evaluate(0.9), 0.3);
    }

    #[test]
    fn test_symmetric_and_asymmetric_widths() {
        let profile = WidthProfile::symmetric(WidthCurve::constant(2.0));
        assert_eq!(profile.widths_at(0.5, 3.0, 0.5), (3.0, 3.0));
        let profile = profile.with_point_scale(false);
        assert_eq!(profile.widths_at(0.5, 3.0, 0.5), (1.0, 1.0));

        let profile = WidthProfile::asymmetric(WidthCurve::constant(0.5), WidthCurve::constant(2.0));
        assert_eq!(profile.widths_at(0.0, 1.0, 1.0), (0.5, 2.0));
    }

    #[test]
    fn test_uv_layouts() {
        let linear = WidthProfile::default();
        assert_relative_eq!(linear.uv_v(0, 5), 0.0);
        assert_relative_eq!(linear.uv_v(2, 5), 0.5);
        assert_relative_eq!(linear.uv_v(4, 5), 1.0);

        let ping_pong = WidthProfile::default().with_uv_mode(UvMode::PingPong);
        assert_relative_eq!(ping_pong.uv_v(0, 5), 0.0);
        assert_relative_eq!(ping_pong.uv_v(1, 5), 0.5);
        assert_relative_eq!(ping_pong.uv_v(2, 5), 1.0);
        assert_relative_eq!(ping_pong.uv_v(4, 5), 0.0);

        let mirrored = WidthProfile::default().with_mirrored_uv(true);
        assert_relative_eq!(mirrored.uv_v(0, 5), 1.0);
        assert_relative_eq!(mirrored.uv_v(0, 1), 1.0);
    }
}
