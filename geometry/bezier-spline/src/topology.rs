//! Structural edits: appending, splitting, removing and merging curves.
//!
//! Every edit is atomic. Validation happens before the first write, and
//! the multi-step edits ([`Spline::factor_spline`],
//! [`Spline::simplify_spline`]) roll back if a step fails.

use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::Result;
use crate::bezier::{CubicBezier, solve_inverse_control_points};
use crate::change::SplineChange;
use crate::error::SplineError;
use crate::point::{AnchorMode, ControlPoint};
use crate::spline::Spline;
use crate::traits::Curve;

/// Endpoints closer than this are welded when closing a loop.
const WELD_TOLERANCE: f64 = 1e-6;

impl Spline {
    /// Add a curve at one end of the spline.
    ///
    /// At the end, `p1` becomes the outgoing handle of the old last anchor
    /// and `p3` the new last anchor; at the beginning the order is mirrored.
    /// On a loop the new end point is welded back onto anchor 0.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` like every other topology edit.
    pub fn append_curve(
        &mut self,
        p1: Point3<f64>,
        p2: Point3<f64>,
        p3: Point3<f64>,
        mode: AnchorMode,
        at_beginning: bool,
    ) -> Result<()> {
        if at_beginning {
            self.prepend_points(p1, p2, p3, mode);
        } else {
            self.push_points(p1, p2, p3, mode);
            // the new curve now closes the loop
            self.closing_curve = false;
        }
        debug!(
            curves = self.curve_count(),
            at_beginning,
            looped = self.looped,
            "curve appended"
        );
        self.notify(SplineChange::Topology);
        Ok(())
    }

    fn push_points(&mut self, p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>, mode: AnchorMode) {
        let old_end = self.points.len() - 1;
        let old_end_anchor = self.modes.len() - 1;
        self.points.extend([p1, p2, p3].map(ControlPoint::new));
        if self.looped {
            self.modes[old_end_anchor] = mode;
            self.modes.push(self.modes[0]);
            self.sync_loop_closure();
            self.apply_constraints(old_end);
            self.apply_constraints(0);
        } else {
            self.modes.push(mode);
            self.apply_constraints(old_end);
            self.apply_constraints(self.points.len() - 1);
        }
    }

    fn prepend_points(&mut self, p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>, mode: AnchorMode) {
        self.points.splice(0..0, [p3, p2, p1].map(ControlPoint::new));
        if self.looped {
            let last = self.points.len() - 1;
            self.points[0] = self.points[last];
            self.modes[0] = mode;
            let wrap_mode = self.modes[self.modes.len() - 1];
            self.modes.insert(0, wrap_mode);
            self.apply_constraints(3);
            self.apply_constraints(0);
        } else {
            self.modes.insert(0, mode);
            self.apply_constraints(3);
            self.apply_constraints(0);
        }
    }

    /// Split curve `curve` at local parameter `t`, inserting a new anchor.
    ///
    /// The new anchor inherits the split curve's start mode. The shape is
    /// preserved exactly unless the new anchor is `Mirrored` or `Auto`.
    ///
    /// # Errors
    ///
    /// - [`SplineError::InvalidCurveIndex`] if `curve >= curve_count()`
    /// - [`SplineError::InvalidSplitParameter`] unless `0 < t < 1`
    /// - [`SplineError::Degenerate`] if the handle fit is singular
    pub fn insert_curve(&mut self, curve: usize, t: f64) -> Result<()> {
        self.split_curve(curve, t)
            .inspect_err(|err| warn!(%err, curve, t, "split rejected"))?;
        if curve + 2 == self.curve_count() {
            self.closing_curve = false;
        }
        self.apply_auto_everywhere();
        debug!(curve, t, curves = self.curve_count(), "curve split");
        self.notify(SplineChange::Topology);
        Ok(())
    }

    /// Split without the spline-wide `Auto` pass or notification.
    fn split_curve(&mut self, curve: usize, t: f64) -> Result<()> {
        let count = self.curve_count();
        if curve >= count {
            return Err(SplineError::invalid_curve_index(curve, count));
        }
        if !(t > 0.0 && t < 1.0) {
            return Err(SplineError::InvalidSplitParameter(t));
        }

        let segment = self.segment(curve);
        let mid = segment.point_at(t);
        let (l1, l2) = fit_handles(&segment, 0.0, t)?;
        let (r1, r2) = fit_handles(&segment, t, 1.0)?;

        let base = curve * 3;
        let start = self.points[base];
        let end = self.points[base + 3];
        let anchor = ControlPoint {
            position: mid,
            scale: start.scale.lerp(&end.scale, t),
            angle: start.angle,
        };

        self.points[base + 1].position = l1;
        self.points[base + 2].position = r2;
        self.points.splice(
            base + 2..base + 2,
            [ControlPoint::new(l2), anchor, ControlPoint::new(r1)],
        );
        let mode = self.modes[curve];
        self.modes.insert(curve + 1, mode);

        if mode == AnchorMode::Mirrored {
            self.apply_constraints(base + 3);
        }
        Ok(())
    }

    /// Remove one curve.
    ///
    /// On an open spline, the first and last curves are cut off. Interior
    /// curves (and every curve of a loop) are removed by dissolving one of
    /// their anchors: the start anchor when `remove_from_start`, otherwise
    /// the end anchor. A two-curve loop collapses into a one-curve loop.
    ///
    /// # Errors
    ///
    /// - [`SplineError::InvalidCurveIndex`] if `curve >= curve_count()`
    /// - [`SplineError::LastCurve`] / [`SplineError::LoopedSingleCurve`] if
    ///   only one curve is left
    pub fn remove_curve(&mut self, curve: usize, remove_from_start: bool) -> Result<()> {
        self.check_removable(curve)
            .inspect_err(|err| warn!(%err, curve, "removal rejected"))?;
        let count = self.curve_count();
        self.closing_curve = false;

        if self.looped && count == 2 {
            self.collapse_two_curve_loop(curve);
        } else if !self.looped && curve == 0 {
            self.points.drain(0..3);
            self.modes.remove(0);
            self.apply_constraints(0);
        } else if !self.looped && curve == count - 1 {
            self.points.truncate(self.points.len() - 3);
            self.modes.pop();
            self.apply_constraints(self.points.len() - 1);
        } else {
            let mut anchor = if remove_from_start { curve } else { curve + 1 };
            if self.looped && (anchor == 0 || anchor == count) {
                self.rotate_loop_start(1);
                anchor = count - 1;
            }
            self.dissolve_anchor(anchor);
            self.apply_constraints((anchor - 1) * 3);
            self.apply_constraints(anchor * 3);
        }

        debug!(
            curve,
            remove_from_start,
            curves = self.curve_count(),
            "curve removed"
        );
        self.notify(SplineChange::Topology);
        Ok(())
    }

    fn check_removable(&self, curve: usize) -> Result<()> {
        let count = self.curve_count();
        if curve >= count {
            return Err(SplineError::invalid_curve_index(curve, count));
        }
        if count == 1 {
            return Err(if self.looped {
                SplineError::LoopedSingleCurve
            } else {
                SplineError::LastCurve
            });
        }
        Ok(())
    }

    /// Keep curve `1 - removed` and weld its two anchors at their midpoint.
    fn collapse_two_curve_loop(&mut self, removed: usize) {
        let keep = 1 - removed;
        let base = keep * 3;
        let start = self.points[base];
        let out_handle = self.points[base + 1].position;
        let in_handle = self.points[base + 2].position;
        let end = self.points[base + 3].position;

        let mid = Point3::from((start.position.coords + end.coords) * 0.5);
        let anchor = ControlPoint {
            position: mid,
            ..start
        };
        let mode = self.modes[keep];

        self.points = vec![
            anchor,
            ControlPoint::new(out_handle + (mid - start.position)),
            ControlPoint::new(in_handle + (mid - end)),
            anchor,
        ];
        self.modes = vec![mode; 2];
        self.apply_constraints(0);
    }

    /// Rotate a loop so that anchor `curves` becomes anchor 0.
    fn rotate_loop_start(&mut self, curves: usize) {
        let count = self.curve_count();
        let mut ring = self.points[..self.points.len() - 1].to_vec();
        ring.rotate_left(curves * 3);
        ring.push(ring[0]);
        self.points = ring;

        let mut modes = self.modes[..count].to_vec();
        modes.rotate_left(curves);
        modes.push(modes[0]);
        self.modes = modes;
    }

    /// Drop an interior anchor and its two handles, merging its curves.
    fn dissolve_anchor(&mut self, anchor: usize) {
        let middle = anchor * 3;
        self.points.drain(middle - 1..=middle + 1);
        self.modes.remove(anchor);
    }

    /// Open a loop, or close an open spline.
    ///
    /// Opening drops the closing curve if closing the loop added one and it
    /// has not been split, merged or replaced since; a loop closed by
    /// welding keeps all its curves. Closing welds coincident endpoints, or
    /// else appends a curve whose handles continue the end tangents.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` like every other topology edit.
    pub fn toggle_close_loop(&mut self) -> Result<()> {
        if self.looped {
            self.open_loop();
        } else {
            self.close_loop();
        }
        info!(
            looped = self.looped,
            curves = self.curve_count(),
            "loop toggled"
        );
        self.notify(SplineChange::Topology);
        Ok(())
    }

    fn open_loop(&mut self) {
        self.looped = false;
        if self.closing_curve && self.curve_count() >= 2 {
            self.points.truncate(self.points.len() - 3);
            self.modes.pop();
        }
        self.closing_curve = false;
        self.apply_constraints(0);
        self.apply_constraints(self.points.len() - 1);
    }

    fn close_loop(&mut self) {
        let len = self.points.len();
        let first = self.points[0].position;
        let last = self.points[len - 1].position;

        if (first - last).norm() <= WELD_TOLERANCE {
            self.looped = true;
            self.closing_curve = false;
            self.sync_loop_closure();
            self.apply_constraints(0);
            return;
        }

        let out_handle = Point3::from(last.coords * 2.0 - self.points[len - 2].position.coords);
        let in_handle = Point3::from(first.coords * 2.0 - self.points[1].position.coords);
        let start = self.points[0];
        self.points.extend([
            ControlPoint::new(out_handle),
            ControlPoint::new(in_handle),
            start,
        ]);
        self.modes.push(self.modes[0]);
        self.looped = true;
        self.closing_curve = true;
        self.apply_constraints(len - 1);
        self.apply_constraints(0);
    }

    /// Split every curve in half, doubling the curve count.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::Degenerate`] if a split fails; the spline is
    /// left unchanged.
    pub fn factor_spline(&mut self) -> Result<()> {
        let original = self.curve_count();
        let backup = (self.points.clone(), self.modes.clone());
        for j in 0..original {
            if let Err(err) = self.split_curve(j * 2, 0.5) {
                (self.points, self.modes) = backup;
                return Err(err);
            }
        }
        self.closing_curve = false;
        self.apply_auto_everywhere();
        info!(from = original, to = self.curve_count(), "spline factored");
        self.notify(SplineChange::Topology);
        Ok(())
    }

    /// Merge neighbouring curve pairs, roughly halving the curve count.
    ///
    /// Curves `2j` and `2j + 1` are refitted as one cubic through the
    /// midpoints of the originals. With an odd count the last curve is
    /// kept as is. Inverts [`Self::factor_spline`] for splines whose
    /// anchors are `Free` or `Aligned`.
    ///
    /// # Errors
    ///
    /// - [`SplineError::LastCurve`] if there is only one curve
    /// - [`SplineError::Degenerate`] if a refit fails; the spline is left
    ///   unchanged
    pub fn simplify_spline(&mut self) -> Result<()> {
        let original = self.curve_count();
        if original == 1 {
            warn!("simplify rejected: single curve");
            return Err(SplineError::LastCurve);
        }
        let backup = (self.points.clone(), self.modes.clone());
        for j in (0..original / 2).rev() {
            if let Err(err) = self.merge_at(j * 2 + 1) {
                (self.points, self.modes) = backup;
                return Err(err);
            }
        }
        // an odd last curve is kept as is
        self.closing_curve &= original % 2 == 1;
        self.apply_all_constraints();
        info!(from = original, to = self.curve_count(), "spline simplified");
        self.notify(SplineChange::Topology);
        Ok(())
    }

    /// Dissolve interior anchor `anchor`, refitting the merged curve.
    fn merge_at(&mut self, anchor: usize) -> Result<()> {
        let before = self.segment(anchor - 1);
        let after = self.segment(anchor);
        let (h1, h2) = solve_inverse_control_points(
            before.p0,
            after.p3,
            before.point_at(0.5),
            after.point_at(0.5),
            0.25,
            0.75,
        )
        .ok_or_else(|| SplineError::degenerate(format!("cannot refit curves around anchor {anchor}")))?;

        let middle = anchor * 3;
        self.points[middle - 2].position = h1;
        self.points[middle + 2].position = h2;
        self.dissolve_anchor(anchor);
        Ok(())
    }
}

/// Fit the inner handles of the sub-curve of `segment` over `[from, to]`.
fn fit_handles(segment: &CubicBezier, from: f64, to: f64) -> Result<(Point3<f64>, Point3<f64>)> {
    let span = to - from;
    solve_inverse_control_points(
        segment.point_at(from),
        segment.point_at(to),
        segment.point_at(from + span / 3.0),
        segment.point_at(from + span * 2.0 / 3.0),
        1.0 / 3.0,
        2.0 / 3.0,
    )
    .ok_or_else(|| SplineError::degenerate(format!("cannot fit handles over [{from}, {to}]")))
}
