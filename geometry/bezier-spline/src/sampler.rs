//! Evaluation and arc-length resampling over the whole spline.
//!
//! The global parameter `t ∈ [0, 1]` is spread uniformly across curves:
//! curve `i` covers `[i / C, (i + 1) / C]`.

use nalgebra::{Isometry3, Point3, Vector3};
use tracing::{debug, warn};

use crate::Result;
use crate::config::SamplingConfig;
use crate::error::SplineError;
use crate::path::SplinePath;
use crate::spline::Spline;
use crate::traits::Curve;

/// Smallest walk step accepted by the sampler.
pub const MIN_PRECISION: f64 = 1e-6;

/// Largest number of segments a single resampling produces.
pub const MAX_SAMPLES: usize = 1 << 20;

fn clamp_precision(precision: f64) -> f64 {
    if precision.is_nan() {
        MIN_PRECISION
    } else {
        precision.clamp(MIN_PRECISION, 1.0)
    }
}

impl Spline {
    /// Curve index and local parameter for a global `t`.
    ///
    /// `t >= 1` maps to the end of the last curve.
    #[must_use]
    pub fn locate(&self, t: f64) -> (usize, f64) {
        let count = self.curve_count();
        if t >= 1.0 {
            return (count - 1, 1.0);
        }
        let scaled = t.max(0.0) * count as f64;
        let curve = (scaled as usize).min(count - 1);
        (curve, scaled - curve as f64)
    }

    /// Position at global parameter `t`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> Point3<f64> {
        let (curve, local) = self.locate(t);
        self.segment(curve).point_at(local)
    }

    /// Position at `t`, transformed into world space.
    #[must_use]
    pub fn evaluate_in(&self, t: f64, transform: &Isometry3<f64>) -> Point3<f64> {
        transform * self.evaluate(t)
    }

    /// Velocity with respect to the global parameter.
    #[must_use]
    pub fn derivative(&self, t: f64) -> Vector3<f64> {
        let (curve, local) = self.locate(t);
        self.segment(curve).derivative_at(local) * self.curve_count() as f64
    }

    /// Unit direction of travel at `t`.
    ///
    /// Where the velocity vanishes the segment's second derivative, then its
    /// chord, is used instead.
    #[must_use]
    pub fn direction(&self, t: f64) -> Vector3<f64> {
        let (curve, local) = self.locate(t);
        self.segment(curve).tangent_at(local)
    }

    /// Anchor scale interpolated across the curve containing `t`.
    #[must_use]
    pub fn scale_at(&self, t: f64) -> Vector3<f64> {
        let (curve, local) = self.locate(t);
        let base = curve * 3;
        self.points[base]
            .scale
            .lerp(&self.points[base + 3].scale, local)
    }

    /// Chord-sum length with chords every `precision` in `t`.
    #[must_use]
    pub fn linear_length(&self, precision: f64) -> f64 {
        let step = clamp_precision(precision);
        let mut length = 0.0;
        let mut t = 0.0;
        let mut prev = self.evaluate(0.0);
        while t < 1.0 {
            t = (t + step).min(1.0);
            let p = self.evaluate(t);
            length += (p - prev).norm();
            prev = p;
        }
        length
    }

    /// Resample at (approximately) equal arc-length intervals.
    ///
    /// The interval is adjusted so that a whole number of intervals covers
    /// the spline. Open splines end with the exact `t = 1` point; looped
    /// ones stop one interval short of the start.
    ///
    /// At most [`MAX_SAMPLES`] segments are produced; a finer spacing is
    /// widened to fit. Use [`Spline::try_sample`] to reject it instead.
    #[must_use]
    pub fn sample_evenly_spaced(&self, spacing: f64, precision: f64) -> SplinePath {
        let step = clamp_precision(precision);
        let (length, segments) = self.plan_segments(spacing, step);
        if segments > MAX_SAMPLES {
            warn!(requested = segments, max = MAX_SAMPLES, "sample count clamped");
        }
        self.walk(segments.min(MAX_SAMPLES), length, step)
    }

    /// Like [`Spline::sample`], but refuses spacings that need more than
    /// [`MAX_SAMPLES`] segments.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::TooManySamples`] with the requested count.
    pub fn try_sample(&self, config: &SamplingConfig) -> Result<SplinePath> {
        let step = clamp_precision(config.precision);
        let (length, segments) = self.plan_segments(config.spacing, step);
        if segments > MAX_SAMPLES {
            warn!(requested = segments, max = MAX_SAMPLES, "sampling rejected");
            return Err(SplineError::TooManySamples {
                max: MAX_SAMPLES,
                requested: segments,
            });
        }
        Ok(self.walk(segments, length, step))
    }

    /// Arc length and the whole number of segments `spacing` asks for.
    fn plan_segments(&self, spacing: f64, step: f64) -> (f64, usize) {
        let length = self.linear_length(step);
        let segments = if spacing.is_finite() && spacing > 0.0 {
            // saturates at usize::MAX for absurd ratios
            ((length / spacing).round() as usize).max(1)
        } else {
            1
        };
        (length, segments)
    }

    /// Resample with a target number of points.
    ///
    /// Open splines get `count` points including both ends (at least 2);
    /// looped splines get `count` points around the loop (at least 1).
    /// Counts beyond [`MAX_SAMPLES`] are clamped.
    #[must_use]
    pub fn sample_count(&self, count: usize, precision: f64) -> SplinePath {
        let step = clamp_precision(precision);
        let length = self.linear_length(step);
        let segments = if self.looped {
            count.max(1)
        } else {
            count.max(2) - 1
        };
        self.walk(segments.min(MAX_SAMPLES), length, step)
    }

    /// Resample with a [`SamplingConfig`].
    #[must_use]
    pub fn sample(&self, config: &SamplingConfig) -> SplinePath {
        self.sample_evenly_spaced(config.spacing, config.precision)
    }

    /// Walk the curve in `step` increments dropping a sample every
    /// `length / segments` units of chord distance.
    fn walk(&self, segments: usize, length: f64, step: f64) -> SplinePath {
        let spacing = length / segments as f64;
        let mut path = SplinePath::with_capacity(segments + 1, self.looped);
        self.push_sample(&mut path, 0.0);

        let mut t = 0.0;
        let mut prev = self.evaluate(0.0);
        while path.len() < segments && t < 1.0 {
            let mut covered = 0.0;
            let mut landed = false;
            while t < 1.0 {
                let next_t = (t + step).min(1.0);
                let next = self.evaluate(next_t);
                let chord = (next - prev).norm();
                if chord > 0.0 && covered + chord >= spacing {
                    t += (next_t - t) * ((spacing - covered) / chord);
                    prev = self.evaluate(t);
                    landed = true;
                    break;
                }
                covered += chord;
                prev = next;
                t = next_t;
            }
            if landed {
                self.push_sample(&mut path, t);
            }
        }

        if !self.looped && path.last_param().is_some_and(|last| last < 1.0) {
            self.push_sample(&mut path, 1.0);
        }

        debug!(
            samples = path.len(),
            segments,
            spacing,
            looped = self.looped,
            "spline resampled"
        );
        path
    }

    fn push_sample(&self, path: &mut SplinePath, t: f64) {
        path.push(self.evaluate(t), self.direction(t), self.scale_at(t), t);
    }
}

impl Curve for Spline {
    fn point_at(&self, t: f64) -> Point3<f64> {
        self.evaluate(t)
    }

    fn derivative_at(&self, t: f64) -> Vector3<f64> {
        self.derivative(t)
    }

    fn tangent_at(&self, t: f64) -> Vector3<f64> {
        self.direction(t)
    }

    fn arc_length(&self) -> f64 {
        self.length()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::point::AnchorMode;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    fn two_curves() -> Spline {
        let mut spline = Spline::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        );
        spline
            .append_curve(
                Point3::new(5.0, -2.0, 0.0),
                Point3::new(7.0, -2.0, 0.0),
                Point3::new(8.0, 0.0, 0.0),
                AnchorMode::Free,
                false,
            )
            .unwrap();
        spline
    }

    #[test]
    fn test_evaluate_hits_anchors() {
        let spline = two_curves();
        assert_relative_eq!(spline.evaluate(0.0), Point3::origin());
        assert_relative_eq!(spline.evaluate(0.5), Point3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(spline.evaluate(1.0), Point3::new(8.0, 0.0, 0.0));
        assert_relative_eq!(spline.evaluate(7.0), Point3::new(8.0, 0.0, 0.0));
        assert_relative_eq!(spline.evaluate(-1.0), Point3::origin());
    }

    #[test]
    fn test_locate_splits_parameter() {
        let spline = two_curves();
        assert_eq!(spline.locate(0.25), (0, 0.5));
        assert_eq!(spline.locate(0.75), (1, 0.5));
        assert_eq!(spline.locate(1.0), (1, 1.0));
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let spline = two_curves();
        let h = 1e-6;
        for t in [0.1, 0.3, 0.6, 0.9] {
            let numeric = (spline.evaluate(t + h) - spline.evaluate(t - h)) / (2.0 * h);
            assert_relative_eq!(spline.derivative(t), numeric, epsilon = 1e-4);
            assert_relative_eq!(spline.direction(t).norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_direction_survives_collapsed_handles() {
        let spline = Spline::new(
            Point3::origin(),
            Point3::origin(),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        let d = spline.direction(0.0);
        assert!(d.iter().all(|c| c.is_finite()));
        assert_relative_eq!(d, Vector3::x(), epsilon = 1e-9);
    }

    #[test]
    fn test_evaluate_in_applies_transform() {
        let spline = Spline::default();
        let transform = Isometry3::from_parts(
            Translation3::new(0.0, 0.0, 5.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
        );
        let p = spline.evaluate_in(1.0, &transform);
        assert_relative_eq!(p, Point3::new(0.0, 4.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn test_linear_length_of_straight_spline() {
        let spline = Spline::default();
        assert_relative_eq!(spline.linear_length(1e-3), 3.0, epsilon = 1e-9);
        // precision is clamped, so nonsense still terminates
        assert_relative_eq!(spline.linear_length(0.0), 3.0, epsilon = 1e-6);
        assert_relative_eq!(spline.linear_length(5.0), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_evenly_spaced_straight_line() {
        let spline = Spline::default();
        let path = spline.sample_evenly_spaced(0.5, 1e-3);
        assert_eq!(path.len(), 7);
        assert_relative_eq!(path.positions[0], Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(path.positions[6], Point3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(path.params[6], 1.0);
        for gap in path.spacings() {
            assert_relative_eq!(gap, 0.5, epsilon = 1e-3);
        }
        for tangent in &path.tangents {
            assert_relative_eq!(*tangent, Vector3::x(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_evenly_spaced_adjusts_spacing() {
        let spline = two_curves();
        let length = spline.linear_length(1e-4);
        let path = spline.sample_evenly_spaced(0.7, 1e-4);
        let segments = (length / 0.7).round();
        let expected = length / segments;
        assert_eq!(path.len(), segments as usize + 1);
        let gaps = path.spacings();
        // all but the last gap follow the adjusted spacing closely
        for gap in &gaps[..gaps.len() - 1] {
            assert!((gap - expected).abs() < expected * 0.02, "gap {gap} vs {expected}");
        }
        assert!(path.params.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_looped_sampling_does_not_repeat_start() {
        let mut spline = two_curves();
        spline.toggle_close_loop().unwrap();
        let path = spline.sample_evenly_spaced(0.5, 1e-3);
        assert!(path.looped);
        let first = path.positions[0];
        let last = path.positions[path.len() - 1];
        assert!((first - last).norm() > 0.25);
        assert!(path.last_param().unwrap() < 1.0);
    }

    #[test]
    fn test_sample_count_hits_target() {
        let spline = two_curves();
        assert_eq!(spline.sample_count(10, 1e-3).len(), 10);
        assert_eq!(spline.sample_count(0, 1e-3).len(), 2);

        let mut looped = spline.clone();
        looped.toggle_close_loop().unwrap();
        assert_eq!(looped.sample_count(12, 1e-3).len(), 12);
    }

    #[test]
    fn test_bad_spacing_degrades_to_endpoints() {
        let spline = Spline::default();
        assert_eq!(spline.sample_evenly_spaced(0.0, 1e-3).len(), 2);
        assert_eq!(spline.sample_evenly_spaced(f64::NAN, 1e-3).len(), 2);
        assert_eq!(spline.sample(&SamplingConfig::coarse()).len(), 4);
    }

    #[test]
    fn test_tiny_spacing_is_bounded() {
        let spline = Spline::default();
        let (_, segments) = spline.plan_segments(1e-300, 1e-3);
        assert_eq!(segments, usize::MAX);

        let config = SamplingConfig::default().with_spacing(1e-300);
        assert_eq!(
            spline.try_sample(&config),
            Err(SplineError::TooManySamples {
                max: MAX_SAMPLES,
                requested: usize::MAX
            })
        );
        let config = SamplingConfig::default().with_spacing(1e-8);
        assert!(matches!(
            spline.try_sample(&config),
            Err(SplineError::TooManySamples { requested, .. }) if requested > MAX_SAMPLES
        ));
        assert_eq!(spline.try_sample(&SamplingConfig::coarse()).unwrap().len(), 4);
    }

    #[test]
    fn test_scale_is_interpolated_between_anchors() {
        let mut spline = Spline::default();
        spline.set_point_scale(3, Vector3::new(3.0, 3.0, 3.0));
        assert_relative_eq!(spline.scale_at(0.5), Vector3::new(2.0, 2.0, 2.0));
        let path = spline.sample_count(3, 1e-3);
        assert_relative_eq!(path.scales[2], Vector3::new(3.0, 3.0, 3.0));
    }
}
