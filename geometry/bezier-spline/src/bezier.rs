//! Bézier segment math.
//!
//! Quadratic and cubic Bézier segments, their closed-form and approximate
//! lengths, and the inverse solver that recovers a cubic's inner control
//! points from two samples known to lie on it.

use crate::Curve;
use nalgebra::{Matrix2, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this squared magnitude a quadratic is treated as a straight line.
const STRAIGHT_EPSILON: f64 = 1e-12;

/// Determinants smaller than this make the inverse solve ill-conditioned.
const DETERMINANT_EPSILON: f64 = 1e-12;

/// A quadratic Bézier curve defined by 3 control points.
///
/// # Equation
///
/// ```text
/// B(t) = (1-t)²P₀ + 2(1-t)tP₁ + t²P₂
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadraticBezier {
    /// Start point.
    pub p0: Point3<f64>,
    /// Control point.
    pub p1: Point3<f64>,
    /// End point.
    pub p2: Point3<f64>,
}

impl QuadraticBezier {
    /// Create a new quadratic Bézier curve.
    #[must_use]
    pub const fn new(p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) -> Self {
        Self { p0, p1, p2 }
    }

    /// Exact arc length of the curve.
    ///
    /// Integrates `|B'(t)|` in closed form. Straight or degenerate curves
    /// (coincident control points, a zero log denominator) fall back to the
    /// chord length so the result is never NaN.
    ///
    /// # Example
    ///
    /// ```
    /// use bezier_spline::QuadraticBezier;
    /// use nalgebra::Point3;
    ///
    /// let line = QuadraticBezier::new(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(2.0, 0.0, 0.0),
    /// );
    /// assert!((line.length() - 2.0).abs() < 1e-10);
    /// ```
    #[must_use]
    pub fn length(&self) -> f64 {
        let chord = (self.p2 - self.p0).norm();

        let a = self.p0.coords - self.p1.coords * 2.0 + self.p2.coords;
        let b = (self.p1 - self.p0) * 2.0;

        let aa = 4.0 * a.dot(&a);
        if aa < STRAIGHT_EPSILON {
            return chord;
        }
        let bb = 4.0 * a.dot(&b);
        let cc = b.dot(&b);

        let s_abc = 2.0 * (aa + bb + cc).max(0.0).sqrt();
        let a_2 = aa.sqrt();
        let a_32 = 2.0 * aa * a_2;
        let c_2 = 2.0 * cc.sqrt();
        let ba = bb / a_2;

        let denominator = ba + c_2;
        let numerator = 2.0 * a_2 + ba + s_abc;
        if denominator.abs() < STRAIGHT_EPSILON || numerator / denominator <= 0.0 {
            return chord;
        }

        let length = (a_32 * s_abc
            + a_2 * bb * (s_abc - c_2)
            + (4.0 * cc * aa - bb * bb) * (numerator / denominator).ln())
            / (4.0 * a_32);

        if length.is_finite() { length } else { chord }
    }
}

impl Curve for QuadraticBezier {
    fn point_at(&self, t: f64) -> Point3<f64> {
        let t = t.clamp(0.0, 1.0);
        let s = 1.0 - t;

        Point3::from(
            self.p0.coords * (s * s) + self.p1.coords * (2.0 * s * t) + self.p2.coords * (t * t),
        )
    }

    fn derivative_at(&self, t: f64) -> Vector3<f64> {
        let t = t.clamp(0.0, 1.0);
        let s = 1.0 - t;

        // B'(t) = 2(1-t)(P₁-P₀) + 2t(P₂-P₁)
        (self.p1 - self.p0) * (2.0 * s) + (self.p2 - self.p1) * (2.0 * t)
    }

    fn arc_length(&self) -> f64 {
        self.length()
    }
}

/// A cubic Bézier curve defined by 4 control points.
///
/// The curve passes through P₀ and P₃, and is tangent to P₀P₁ at the
/// start and P₂P₃ at the end.
///
/// # Equation
///
/// ```text
/// B(t) = (1-t)³P₀ + 3(1-t)²tP₁ + 3(1-t)t²P₂ + t³P₃
/// ```
///
/// # Example
///
/// ```
/// use bezier_spline::{CubicBezier, Curve};
/// use nalgebra::Point3;
///
/// let curve = CubicBezier::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 2.0, 0.0),
///     Point3::new(3.0, 2.0, 0.0),
///     Point3::new(4.0, 0.0, 0.0),
/// );
///
/// let end = curve.point_at(1.0);
/// assert!((end.x - 4.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubicBezier {
    /// Start point.
    pub p0: Point3<f64>,
    /// First control point (affects start tangent).
    pub p1: Point3<f64>,
    /// Second control point (affects end tangent).
    pub p2: Point3<f64>,
    /// End point.
    pub p3: Point3<f64>,
}

impl CubicBezier {
    /// Create a new cubic Bézier curve.
    #[must_use]
    pub const fn new(p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Get the control points as an array.
    #[must_use]
    pub fn control_points(&self) -> [Point3<f64>; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }

    /// Second derivative (acceleration) at `t`.
    #[must_use]
    pub fn second_derivative_at(&self, t: f64) -> Vector3<f64> {
        let t = t.clamp(0.0, 1.0);
        let s = 1.0 - t;

        // B''(t) = 6(1-t)(P₂ - 2P₁ + P₀) + 6t(P₃ - 2P₂ + P₁)
        let a = self.p2.coords - self.p1.coords * 2.0 + self.p0.coords;
        let b = self.p3.coords - self.p2.coords * 2.0 + self.p1.coords;

        a * (6.0 * s) + b * (6.0 * t)
    }

    /// Split the curve at parameter `t`, returning two cubic curves.
    #[must_use]
    pub fn split(&self, t: f64) -> (Self, Self) {
        let t = t.clamp(0.0, 1.0);

        // De Casteljau's algorithm
        let p01 = lerp_point(self.p0, self.p1, t);
        let p12 = lerp_point(self.p1, self.p2, t);
        let p23 = lerp_point(self.p2, self.p3, t);

        let p012 = lerp_point(p01, p12, t);
        let p123 = lerp_point(p12, p23, t);

        let p0123 = lerp_point(p012, p123, t);

        let left = Self::new(self.p0, p01, p012, p0123);
        let right = Self::new(p0123, p123, p23, self.p3);

        (left, right)
    }

    /// Approximate this cubic by a single quadratic with the same endpoints.
    ///
    /// The control point is `(3(P₁+P₂) - P₀ - P₃) / 4`, which matches the
    /// cubic's midpoint tangent behaviour for gently curved segments.
    #[must_use]
    pub fn to_quadratic(&self) -> QuadraticBezier {
        let control =
            ((self.p1.coords + self.p2.coords) * 3.0 - self.p0.coords - self.p3.coords) / 4.0;
        QuadraticBezier::new(self.p0, Point3::from(control), self.p3)
    }

    /// Approximate arc length.
    ///
    /// Splits the curve at `t = 0.5`, approximates each half by a quadratic
    /// and sums their closed-form lengths.
    ///
    /// # Example
    ///
    /// ```
    /// use bezier_spline::CubicBezier;
    /// use nalgebra::Point3;
    ///
    /// let straight = CubicBezier::new(
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(1.5, 0.0, 0.0),
    ///     Point3::new(3.5, 0.0, 0.0),
    ///     Point3::new(4.0, 0.0, 0.0),
    /// );
    /// assert!((straight.length() - 3.0).abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn length(&self) -> f64 {
        let (left, right) = self.split(0.5);
        left.to_quadratic().length() + right.to_quadratic().length()
    }
}

impl Curve for CubicBezier {
    fn point_at(&self, t: f64) -> Point3<f64> {
        let t = t.clamp(0.0, 1.0);
        let s = 1.0 - t;
        let s2 = s * s;
        let t2 = t * t;

        Point3::from(
            self.p0.coords * (s2 * s)
                + self.p1.coords * (3.0 * s2 * t)
                + self.p2.coords * (3.0 * s * t2)
                + self.p3.coords * (t2 * t),
        )
    }

    fn derivative_at(&self, t: f64) -> Vector3<f64> {
        let t = t.clamp(0.0, 1.0);
        let s = 1.0 - t;

        // B'(t) = 3(1-t)²(P₁-P₀) + 6(1-t)t(P₂-P₁) + 3t²(P₃-P₂)
        (self.p1 - self.p0) * (3.0 * s * s)
            + (self.p2 - self.p1) * (6.0 * s * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    fn tangent_at(&self, t: f64) -> Vector3<f64> {
        let d = self.derivative_at(t);
        let norm = d.norm();
        if norm > 1e-10 {
            d / norm
        } else {
            // Coincident handles: fall back to the second derivative, then the chord
            let d2 = self.second_derivative_at(t);
            d2.try_normalize(1e-10)
                .or_else(|| (self.p3 - self.p0).try_normalize(1e-10))
                .unwrap_or_else(Vector3::x)
        }
    }

    fn arc_length(&self) -> f64 {
        self.length()
    }
}

/// Recover the inner control points of a cubic from two on-curve samples.
///
/// Given the anchors `p0`, `p3` and two points `f = B(u)`, `g = B(v)`, the
/// Bernstein basis is rearranged into the 2×2 system
///
/// ```text
/// | 3(1-u)²u  3(1-u)u² | |P₁|   | f - (1-u)³P₀ - u³P₃ |
/// | 3(1-v)²v  3(1-v)v² | |P₂| = | g - (1-v)³P₀ - v³P₃ |
/// ```
///
/// and solved through the matrix inverse, per coordinate.
///
/// Returns `None` when the system is singular, i.e. `u ≈ v` or either
/// parameter sits on an anchor (`0` or `1`).
///
/// # Example
///
/// ```
/// use bezier_spline::{CubicBezier, Curve, solve_inverse_control_points};
/// use nalgebra::Point3;
///
/// let curve = CubicBezier::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 2.0, 0.0),
///     Point3::new(3.0, 2.0, 0.0),
///     Point3::new(4.0, 0.0, 0.0),
/// );
/// let (p1, p2) = solve_inverse_control_points(
///     curve.p0,
///     curve.p3,
///     curve.point_at(0.25),
///     curve.point_at(0.75),
///     0.25,
///     0.75,
/// )
/// .unwrap();
/// assert!((p1 - curve.p1).norm() < 1e-9);
/// assert!((p2 - curve.p2).norm() < 1e-9);
/// ```
#[must_use]
pub fn solve_inverse_control_points(
    p0: Point3<f64>,
    p3: Point3<f64>,
    f: Point3<f64>,
    g: Point3<f64>,
    u: f64,
    v: f64,
) -> Option<(Point3<f64>, Point3<f64>)> {
    let su = 1.0 - u;
    let sv = 1.0 - v;

    let basis = Matrix2::new(
        3.0 * su * su * u,
        3.0 * su * u * u,
        3.0 * sv * sv * v,
        3.0 * sv * v * v,
    );
    if basis.determinant().abs() < DETERMINANT_EPSILON {
        return None;
    }
    let inverse = basis.try_inverse()?;

    let rhs_u = f.coords - p0.coords * (su * su * su) - p3.coords * (u * u * u);
    let rhs_v = g.coords - p0.coords * (sv * sv * sv) - p3.coords * (v * v * v);

    let p1 = rhs_u * inverse[(0, 0)] + rhs_v * inverse[(0, 1)];
    let p2 = rhs_u * inverse[(1, 0)] + rhs_v * inverse[(1, 1)];

    Some((Point3::from(p1), Point3::from(p2)))
}

/// Linear interpolation between two points.
#[inline]
pub(crate) fn lerp_point(a: Point3<f64>, b: Point3<f64>, t: f64) -> Point3<f64> {
    Point3::from(a.coords * (1.0 - t) + b.coords * t)
}
