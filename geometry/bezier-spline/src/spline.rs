//! The editable spline model.
//!
//! Points are stored flat as `A0, H, H, A1, H, H, A2, ...`: anchors sit at
//! indices `3k`, the handles of anchor `k` at `3k - 1` (incoming) and
//! `3k + 1` (outgoing). A spline with `C` curves holds `3C + 1` points and
//! `C + 1` anchor modes. When looped, the last point duplicates the first and
//! the last mode duplicates the first.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::bezier::CubicBezier;
use crate::change::{ChangeObserver, SplineChange};
use crate::point::{AnchorMode, ControlPoint, PointEdit};

/// An editable chain of cubic Bézier curves sharing endpoints.
///
/// # Example
///
/// ```
/// use bezier_spline::{AnchorMode, Spline};
/// use nalgebra::Point3;
///
/// let mut spline = Spline::default();
/// assert_eq!(spline.curve_count(), 1);
///
/// spline.append_curve(
///     Point3::new(5.0, 0.0, 0.0),
///     Point3::new(6.0, 1.0, 0.0),
///     Point3::new(7.0, 1.0, 0.0),
///     AnchorMode::Free,
///     false,
/// )
/// .unwrap();
/// assert_eq!(spline.curve_count(), 2);
/// assert_eq!(spline.points_count(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct Spline {
    pub(crate) points: Vec<ControlPoint>,
    pub(crate) modes: Vec<AnchorMode>,
    pub(crate) looped: bool,
    /// The last curve of the loop was added by closing it, and is dropped
    /// again when the loop is opened.
    pub(crate) closing_curve: bool,
    pub(crate) normals_rotation: f64,
    observer: Option<ChangeObserver>,
}

impl Default for Spline {
    /// A single straight curve along +X from `(1, 0, 0)` to `(4, 0, 0)`.
    fn default() -> Self {
        Self::new(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(3.5, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        )
    }
}

impl PartialEq for Spline {
    /// Equality of geometry and loop state; the observer is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
            && self.modes == other.modes
            && self.looped == other.looped
            && self.closing_curve == other.closing_curve
            && self.normals_rotation == other.normals_rotation
    }
}

impl Spline {
    /// Create an open single-curve spline with both anchors `Free`.
    #[must_use]
    pub fn new(p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>) -> Self {
        Self {
            points: vec![
                ControlPoint::new(p0),
                ControlPoint::new(p1),
                ControlPoint::new(p2),
                ControlPoint::new(p3),
            ],
            modes: vec![AnchorMode::Free; 2],
            looped: false,
            closing_curve: false,
            normals_rotation: 0.0,
            observer: None,
        }
    }

    /// Build a spline directly from raw parts.
    ///
    /// Callers must guarantee `points.len() == 3 * modes.len() - 2` and, when
    /// looped, matching first/last points and modes.
    pub(crate) fn from_parts(
        points: Vec<ControlPoint>,
        modes: Vec<AnchorMode>,
        looped: bool,
        closing_curve: bool,
        normals_rotation: f64,
    ) -> Self {
        Self {
            points,
            modes,
            looped,
            closing_curve: looped && closing_curve,
            normals_rotation,
            observer: None,
        }
    }

    /// Attach a change observer.
    #[must_use]
    pub fn with_observer(mut self, observer: ChangeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace (or clear) the change observer.
    pub fn set_observer(&mut self, observer: Option<ChangeObserver>) {
        self.observer = observer;
    }

    /// A copy of this spline without the observer, for background work.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            observer: None,
            ..self.clone()
        }
    }

    pub(crate) fn notify(&self, change: SplineChange) {
        if let Some(observer) = &self.observer {
            observer.notify(change);
        }
    }

    // ==================== Queries ====================

    /// Number of cubic curves.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        (self.points.len() - 1) / 3
    }

    /// Number of anchors, including the duplicated wrap anchor of a loop.
    #[must_use]
    pub fn anchor_count(&self) -> usize {
        self.modes.len()
    }

    /// Number of stored control points (`3 * curve_count + 1`).
    #[must_use]
    pub fn points_count(&self) -> usize {
        self.points.len()
    }

    /// Whether the last anchor is welded to the first.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.looped
    }

    /// Map a possibly out-of-range point index onto a stored index.
    ///
    /// Looped splines wrap modulo `points_count - 1`; open splines return
    /// `None` outside `0..points_count`.
    #[must_use]
    pub fn looping_index(&self, index: isize) -> Option<usize> {
        let len = self.points.len();
        if self.looped {
            let ring = isize::try_from(len - 1).ok()?;
            usize::try_from(index.rem_euclid(ring)).ok()
        } else {
            usize::try_from(index).ok().filter(|&i| i < len)
        }
    }

    /// Anchor that owns a point index.
    #[must_use]
    pub fn anchor_of(point_index: usize) -> usize {
        (point_index + 1) / 3
    }

    /// Whether a point index is an anchor.
    #[must_use]
    pub fn is_anchor(point_index: usize) -> bool {
        point_index % 3 == 0
    }

    /// All control points.
    #[must_use]
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// All anchor modes.
    #[must_use]
    pub fn modes(&self) -> &[AnchorMode] {
        &self.modes
    }

    /// Control point at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= points_count()`.
    #[must_use]
    pub fn point(&self, index: usize) -> &ControlPoint {
        &self.points[index]
    }

    /// Position of the control point at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= points_count()`.
    #[must_use]
    pub fn position(&self, index: usize) -> Point3<f64> {
        self.points[index].position
    }

    /// Mode of the anchor that owns `point_index`.
    ///
    /// # Panics
    ///
    /// Panics if `point_index >= points_count()`.
    #[must_use]
    pub fn mode(&self, point_index: usize) -> AnchorMode {
        self.modes[Self::anchor_of(point_index)]
    }

    /// Cubic segment for curve `curve`.
    ///
    /// # Panics
    ///
    /// Panics if `curve >= curve_count()`.
    #[must_use]
    pub fn segment(&self, curve: usize) -> CubicBezier {
        let base = curve * 3;
        CubicBezier::new(
            self.points[base].position,
            self.points[base + 1].position,
            self.points[base + 2].position,
            self.points[base + 3].position,
        )
    }

    /// Iterator over all segments.
    pub fn segments(&self) -> impl Iterator<Item = CubicBezier> + '_ {
        (0..self.curve_count()).map(|i| self.segment(i))
    }

    /// Angular offset (degrees) of an anchor.
    ///
    /// # Panics
    ///
    /// Panics if `anchor >= anchor_count()`.
    #[must_use]
    pub fn anchor_angular_offset(&self, anchor: usize) -> f64 {
        self.points[anchor * 3].angle
    }

    /// Global rotation (degrees) applied to every normal.
    #[must_use]
    pub fn normals_rotation(&self) -> f64 {
        self.normals_rotation
    }

    /// Sum of the closed-form per-segment lengths.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }

    // ==================== Editing ====================

    /// Set the mode of the anchor owning `point_index` and re-apply its
    /// constraint.
    ///
    /// Returns `false` if the index is out of range.
    pub fn set_mode(&mut self, point_index: usize, mode: AnchorMode) -> bool {
        if point_index >= self.points.len() {
            return false;
        }
        let anchor = Self::anchor_of(point_index);
        self.modes[anchor] = mode;
        if self.looped {
            let last = self.modes.len() - 1;
            if anchor == 0 {
                self.modes[last] = mode;
            } else if anchor == last {
                self.modes[0] = mode;
            }
        }
        self.apply_constraints(point_index);
        debug!(anchor, ?mode, "anchor mode set");
        self.notify(SplineChange::Geometry);
        true
    }

    /// Set every anchor to `mode` and re-apply all constraints.
    pub fn set_all_modes(&mut self, mode: AnchorMode) {
        self.modes.iter_mut().for_each(|m| *m = mode);
        self.apply_all_constraints();
        debug!(?mode, anchors = self.modes.len(), "all anchor modes set");
        self.notify(SplineChange::Geometry);
    }

    /// Move a point with default options: anchors carry their handles and
    /// constraints are applied.
    ///
    /// Returns `false` if the index is out of range.
    pub fn set_point(&mut self, index: usize, position: Point3<f64>) -> bool {
        self.set_point_with(index, position, PointEdit::default())
    }

    /// Move a point.
    ///
    /// Moving an anchor with `move_adjacent_handles` translates both handles
    /// by the same delta. On a looped spline, points `0` and
    /// `points_count - 1` move together.
    ///
    /// Returns `false` if the index is out of range.
    pub fn set_point_with(&mut self, index: usize, position: Point3<f64>, edit: PointEdit) -> bool {
        let len = self.points.len();
        if index >= len {
            return false;
        }
        let last = len - 1;
        let wraps = self.looped && (index == 0 || index == last);

        if Self::is_anchor(index) && edit.move_adjacent_handles {
            let delta = position - self.points[index].position;
            if wraps {
                self.points[1].position += delta;
                self.points[last - 1].position += delta;
            } else {
                if index > 0 {
                    self.points[index - 1].position += delta;
                }
                if index + 1 < len {
                    self.points[index + 1].position += delta;
                }
            }
        }

        self.points[index].position = position;
        if wraps {
            self.points[0].position = position;
            self.points[last].position = position;
        }

        if edit.apply_constraints {
            self.apply_constraints(index);
        }
        self.notify(SplineChange::Geometry);
        true
    }

    /// Set the scale of a control point.
    ///
    /// Returns `false` if the index is out of range.
    pub fn set_point_scale(&mut self, index: usize, scale: Vector3<f64>) -> bool {
        let len = self.points.len();
        if index >= len {
            return false;
        }
        self.points[index].scale = scale;
        if self.looped && (index == 0 || index == len - 1) {
            self.points[0].scale = scale;
            self.points[len - 1].scale = scale;
        }
        self.notify(SplineChange::Geometry);
        true
    }

    /// Set the angular offset (degrees) of an anchor.
    ///
    /// Returns `false` if the anchor is out of range.
    pub fn set_anchor_angular_offset(&mut self, anchor: usize, degrees: f64) -> bool {
        let anchors = self.modes.len();
        if anchor >= anchors {
            return false;
        }
        self.points[anchor * 3].angle = degrees;
        if self.looped && (anchor == 0 || anchor == anchors - 1) {
            let last = self.points.len() - 1;
            self.points[0].angle = degrees;
            self.points[last].angle = degrees;
        }
        self.notify(SplineChange::Geometry);
        true
    }

    /// Set the global normal rotation (degrees).
    pub fn set_normals_rotation(&mut self, degrees: f64) {
        self.normals_rotation = degrees;
        self.notify(SplineChange::Geometry);
    }

    /// Copy the first point and mode over the wrap slot of a loop.
    pub(crate) fn sync_loop_closure(&mut self) {
        if !self.looped {
            return;
        }
        let last = self.points.len() - 1;
        self.points[last] = self.points[0];
        let last_mode = self.modes.len() - 1;
        self.modes[last_mode] = self.modes[0];
    }
}
