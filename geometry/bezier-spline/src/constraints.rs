//! Tangent constraint resolution.
//!
//! Each [`AnchorMode`] has one resolver. Editing a point re-resolves the
//! anchor that owns it, then refreshes `Auto` anchors one hop away, since
//! their handles depend on the edited anchor's position.

use nalgebra::{Point3, Vector3};

use crate::point::AnchorMode;
use crate::spline::Spline;

/// Vectors shorter than this are treated as zero.
const ZERO_EPSILON: f64 = 1e-12;

/// A unit vector perpendicular to `v`, preferring the horizontal plane.
///
/// Tries `v × Z` first and falls back to `v × Y`, then to `Y` for a zero `v`.
pub(crate) fn perpendicular_to(v: &Vector3<f64>) -> Vector3<f64> {
    v.cross(&Vector3::z())
        .try_normalize(ZERO_EPSILON)
        .or_else(|| v.cross(&Vector3::y()).try_normalize(ZERO_EPSILON))
        .unwrap_or_else(Vector3::y)
}

impl Spline {
    /// Re-apply the constraint of the anchor owning `edited`.
    ///
    /// `edited` picks which handle is kept: editing the anchor or its
    /// incoming handle keeps the incoming side, editing the outgoing handle
    /// keeps the outgoing side.
    pub(crate) fn apply_constraints(&mut self, edited: usize) {
        let anchor = self.canonical_anchor(Self::anchor_of(edited));
        match self.modes[anchor] {
            AnchorMode::Free => {}
            AnchorMode::Aligned => self.constrain_aligned(edited, anchor),
            AnchorMode::Mirrored => self.constrain_mirrored(edited, anchor),
            AnchorMode::Auto => self.constrain_auto(anchor),
        }
        self.refresh_auto_neighbours(anchor);
        self.sync_loop_closure();
    }

    /// Re-apply every anchor's constraint, keeping incoming handles.
    pub(crate) fn apply_all_constraints(&mut self) {
        let anchors = if self.looped {
            self.curve_count()
        } else {
            self.modes.len()
        };
        for anchor in 0..anchors {
            let middle = anchor * 3;
            match self.modes[anchor] {
                AnchorMode::Free | AnchorMode::Auto => {}
                AnchorMode::Aligned => self.constrain_aligned(middle, anchor),
                AnchorMode::Mirrored => self.constrain_mirrored(middle, anchor),
            }
        }
        self.apply_auto_everywhere();
        self.sync_loop_closure();
    }

    /// Recompute handles of every `Auto` anchor: interior anchors first,
    /// then the open-spline edge rules.
    pub(crate) fn apply_auto_everywhere(&mut self) {
        let count = self.curve_count();
        let interior = if self.looped { 0..count } else { 1..count };
        for anchor in interior {
            if self.modes[anchor] == AnchorMode::Auto {
                self.constrain_auto(anchor);
            }
        }
        self.apply_auto_edges();
        self.sync_loop_closure();
    }

    /// On a loop the wrap anchor is the same anchor as `0`.
    fn canonical_anchor(&self, anchor: usize) -> usize {
        if self.looped && anchor == self.curve_count() {
            0
        } else {
            anchor
        }
    }

    /// Indices of the (kept, adjusted) handles around `anchor`.
    ///
    /// `None` for the endpoints of an open spline, which have one handle.
    fn handle_pair(&self, edited: usize, anchor: usize) -> Option<(usize, usize)> {
        let count = self.curve_count();
        if !self.looped && (anchor == 0 || anchor == count) {
            return None;
        }
        let middle = isize::try_from(anchor * 3).ok()?;
        let before = self.looping_index(middle - 1)?;
        let after = self.looping_index(middle + 1)?;
        // on a loop, anchor 0 is also reached through the wrap slot
        let keeps_outgoing = if self.looped && anchor == 0 {
            edited == 1
        } else {
            edited > anchor * 3
        };
        if keeps_outgoing {
            Some((after, before))
        } else {
            Some((before, after))
        }
    }

    fn constrain_aligned(&mut self, edited: usize, anchor: usize) {
        let Some((fixed, enforced)) = self.handle_pair(edited, anchor) else {
            return;
        };
        let middle = self.points[anchor * 3].position;
        let tangent = middle - self.points[fixed].position;
        let Some(direction) = tangent.try_normalize(ZERO_EPSILON) else {
            return;
        };
        let length = (middle - self.points[enforced].position).norm();
        self.points[enforced].position = middle + direction * length;
    }

    fn constrain_mirrored(&mut self, edited: usize, anchor: usize) {
        let Some((fixed, enforced)) = self.handle_pair(edited, anchor) else {
            return;
        };
        let middle = self.points[anchor * 3].position;
        let tangent = middle - self.points[fixed].position;
        self.points[enforced].position = middle + tangent;
    }

    /// Place the handles of an `Auto` anchor.
    ///
    /// Interior anchors point their handles along the bisector of the
    /// directions to the neighbouring anchors, at half the neighbour
    /// distance. Endpoints of an open spline use the edge rule instead.
    fn constrain_auto(&mut self, anchor: usize) {
        let count = self.curve_count();
        if !self.looped && (anchor == 0 || anchor == count) {
            self.apply_auto_edge(anchor);
            return;
        }
        let Ok(middle) = isize::try_from(anchor * 3) else {
            return;
        };
        let (Some(prev), Some(next), Some(incoming), Some(outgoing)) = (
            self.looping_index(middle - 3),
            self.looping_index(middle + 3),
            self.looping_index(middle - 1),
            self.looping_index(middle + 1),
        ) else {
            return;
        };

        let a = self.points[anchor * 3].position;
        let to_prev = self.points[prev].position - a;
        let to_next = self.points[next].position - a;
        let (Some(u_prev), Some(u_next)) = (
            to_prev.try_normalize(ZERO_EPSILON),
            to_next.try_normalize(ZERO_EPSILON),
        ) else {
            return;
        };

        let direction = (u_next - u_prev)
            .try_normalize(ZERO_EPSILON)
            .unwrap_or_else(|| perpendicular_to(&u_next));

        self.points[incoming].position = a - direction * (to_prev.norm() * 0.5);
        self.points[outgoing].position = a + direction * (to_next.norm() * 0.5);
    }

    /// Edge rule for the endpoints of an open spline: the single handle sits
    /// halfway between the endpoint and the neighbouring handle.
    fn apply_auto_edge(&mut self, anchor: usize) {
        let len = self.points.len();
        if anchor == 0 {
            self.points[1].position = midpoint(self.points[0].position, self.points[2].position);
        } else {
            self.points[len - 2].position =
                midpoint(self.points[len - 1].position, self.points[len - 3].position);
        }
    }

    fn apply_auto_edges(&mut self) {
        if self.looped {
            return;
        }
        let count = self.curve_count();
        if self.modes[0] == AnchorMode::Auto {
            self.apply_auto_edge(0);
        }
        if self.modes[count] == AnchorMode::Auto {
            self.apply_auto_edge(count);
        }
    }

    /// Refresh interior `Auto` anchors adjacent to `anchor`, then the edges.
    fn refresh_auto_neighbours(&mut self, anchor: usize) {
        let count = self.curve_count();
        let neighbours: [Option<usize>; 2] = if self.looped {
            [Some((anchor + count - 1) % count), Some((anchor + 1) % count)]
        } else {
            [
                anchor.checked_sub(1).filter(|&n| n > 0),
                Some(anchor + 1).filter(|&n| n < count),
            ]
        };
        for neighbour in neighbours.into_iter().flatten() {
            if neighbour != anchor && self.modes[neighbour] == AnchorMode::Auto {
                self.constrain_auto(neighbour);
            }
        }
        self.apply_auto_edges();
    }
}

fn midpoint(a: Point3<f64>, b: Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) * 0.5)
}
