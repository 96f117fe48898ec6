//! Core curve trait.

use nalgebra::{Point3, Vector3};

/// Number of chords used by the default [`Curve::arc_length`].
const DEFAULT_LENGTH_STEPS: usize = 256;

/// A parametric curve in 3D space.
///
/// All curves are parameterized over `t ∈ [0, 1]`, where `t=0` is the start
/// and `t=1` is the end of the curve. Implementations clamp out-of-range
/// parameters.
///
/// # Implementors
///
/// - [`QuadraticBezier`](crate::QuadraticBezier)
/// - [`CubicBezier`](crate::CubicBezier) - Single cubic Bézier segment
/// - [`Spline`](crate::Spline) - Editable chain of cubic segments
pub trait Curve {
    /// Evaluate the curve position at parameter `t ∈ [0, 1]`.
    fn point_at(&self, t: f64) -> Point3<f64>;

    /// Compute the first derivative (velocity) at parameter `t`.
    ///
    /// Unlike [`Self::tangent_at`], this returns the non-normalized derivative,
    /// which encodes both direction and speed.
    fn derivative_at(&self, t: f64) -> Vector3<f64>;

    /// Compute the unit tangent vector at parameter `t`.
    ///
    /// Falls back to `+X` where the velocity vanishes.
    fn tangent_at(&self, t: f64) -> Vector3<f64> {
        self.derivative_at(t)
            .try_normalize(1e-10)
            .unwrap_or_else(Vector3::x)
    }

    /// Compute the total arc length of the curve.
    ///
    /// The default sums chord lengths over uniformly spaced parameters.
    fn arc_length(&self) -> f64 {
        let mut length = 0.0;
        let mut prev = self.point_at(0.0);
        for i in 1..=DEFAULT_LENGTH_STEPS {
            let p = self.point_at(i as f64 / DEFAULT_LENGTH_STEPS as f64);
            length += (p - prev).norm();
            prev = p;
        }
        length
    }

    /// Sample `n` points uniformly in parameter space.
    fn sample_uniform(&self, n: usize) -> Vec<Point3<f64>> {
        match n {
            0 => Vec::new(),
            1 => vec![self.point_at(0.0)],
            _ => (0..n)
                .map(|i| self.point_at(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}
