//! Property-based tests for spline editing and sampling.
//!
//! These tests use proptest to generate random splines and edit sequences
//! and verify the storage, constraint and sampling invariants.
//!
//! Run with: cargo test -p bezier-spline -- proptest

#![allow(clippy::unwrap_used)]

use bezier_spline::{AnchorMode, Curve, Point3, Spline};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_point() -> impl Strategy<Value = Point3<f64>> + Clone {
    prop::array::uniform3(-10.0..10.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn arb_mode() -> impl Strategy<Value = AnchorMode> + Clone {
    prop::sample::select(AnchorMode::ALL.to_vec())
}

/// A curve's worth of new points plus the mode of its end anchor.
fn arb_curve_points() -> impl Strategy<Value = ([Point3<f64>; 3], AnchorMode)> {
    (prop::array::uniform3(arb_point()), arb_mode())
}

/// Open spline with 1..=5 curves and arbitrary modes.
fn arb_spline() -> impl Strategy<Value = Spline> {
    (
        prop::array::uniform4(arb_point()),
        prop::collection::vec(arb_curve_points(), 0..5),
        arb_mode(),
    )
        .prop_map(|([p0, p1, p2, p3], extra, first_mode)| {
            let mut spline = Spline::new(p0, p1, p2, p3);
            for ([a, b, c], mode) in extra {
                spline.append_curve(a, b, c, mode, false).unwrap();
            }
            spline.set_mode(0, first_mode);
            spline
        })
}

/// Open spline whose anchors are all `Free` or `Aligned`.
fn arb_shape_preserving_spline() -> impl Strategy<Value = Spline> {
    (
        prop::array::uniform4(arb_point()),
        prop::collection::vec(prop::array::uniform3(arb_point()), 0..4),
        prop::bool::ANY,
    )
        .prop_map(|([p0, p1, p2, p3], extra, aligned)| {
            let mut spline = Spline::new(p0, p1, p2, p3);
            for [a, b, c] in extra {
                spline.append_curve(a, b, c, AnchorMode::Free, false).unwrap();
            }
            if aligned {
                spline.set_all_modes(AnchorMode::Aligned);
            }
            spline
        })
}

#[derive(Debug, Clone)]
enum Edit {
    Append([Point3<f64>; 3], AnchorMode, bool),
    Insert(usize, f64),
    Remove(usize, bool),
    ToggleLoop,
    Factor,
    Simplify,
    MovePoint(usize, Point3<f64>),
    SetMode(usize, AnchorMode),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (prop::array::uniform3(arb_point()), arb_mode(), prop::bool::ANY)
            .prop_map(|(p, m, b)| Edit::Append(p, m, b)),
        (0usize..12, -0.2..1.2f64).prop_map(|(i, t)| Edit::Insert(i, t)),
        (0usize..12, prop::bool::ANY).prop_map(|(i, b)| Edit::Remove(i, b)),
        Just(Edit::ToggleLoop),
        Just(Edit::Factor),
        Just(Edit::Simplify),
        (0usize..40, arb_point()).prop_map(|(i, p)| Edit::MovePoint(i, p)),
        (0usize..40, arb_mode()).prop_map(|(i, m)| Edit::SetMode(i, m)),
    ]
}

fn apply(spline: &mut Spline, edit: &Edit) {
    let before = spline.clone();
    let result = match edit {
        Edit::Append([a, b, c], mode, at_beginning) => {
            spline.append_curve(*a, *b, *c, *mode, *at_beginning)
        }
        Edit::Insert(curve, t) => spline.insert_curve(*curve, *t),
        Edit::Remove(curve, from_start) => spline.remove_curve(*curve, *from_start),
        Edit::ToggleLoop => spline.toggle_close_loop(),
        Edit::Factor if spline.curve_count() < 16 => spline.factor_spline(),
        Edit::Factor => Ok(()),
        Edit::Simplify => spline.simplify_spline(),
        Edit::MovePoint(index, p) => {
            spline.set_point(*index, *p);
            Ok(())
        }
        Edit::SetMode(index, mode) => {
            spline.set_mode(*index, *mode);
            Ok(())
        }
    };
    if result.is_err() {
        assert_eq!(*spline, before, "failed edit {edit:?} modified the spline");
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn assert_layout(spline: &Spline) -> Result<(), TestCaseError> {
    prop_assert!(spline.curve_count() >= 1);
    prop_assert_eq!(spline.points_count(), spline.curve_count() * 3 + 1);
    prop_assert_eq!(spline.modes().len(), spline.curve_count() + 1);
    if spline.is_loop() {
        let last = spline.points_count() - 1;
        prop_assert!((spline.position(0) - spline.position(last)).norm() < 1e-9);
        prop_assert_eq!(spline.modes()[0], spline.modes()[spline.curve_count()]);
    }
    for p in spline.points() {
        prop_assert!(p.position.coords.iter().all(|c| c.is_finite()));
    }
    Ok(())
}

/// Interior anchors (and anchor 0 of a loop) with their handle indices.
fn constrained_anchors(spline: &Spline) -> Vec<(usize, usize, usize)> {
    let count = spline.curve_count();
    let last = spline.points_count() - 1;
    let mut anchors: Vec<_> = (1..count).map(|k| (k * 3, k * 3 - 1, k * 3 + 1)).collect();
    if spline.is_loop() && count > 1 {
        anchors.push((0, last - 1, 1));
    }
    anchors
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Evaluate(0) / Evaluate(1) land on the first / last anchor.
    #[test]
    fn endpoints_match_anchors(mut spline in arb_spline(), close in prop::bool::ANY) {
        if close {
            spline.toggle_close_loop().unwrap();
        }
        let last = spline.points_count() - 1;
        prop_assert!((spline.evaluate(0.0) - spline.position(0)).norm() < 1e-9);
        prop_assert!((spline.evaluate(1.0) - spline.position(last)).norm() < 1e-9);
        if spline.is_loop() {
            prop_assert!((spline.evaluate(1.0) - spline.position(0)).norm() < 1e-9);
        }
    }

    /// Appending a curve and removing it again restores counts and modes.
    #[test]
    fn append_then_remove_restores_layout(
        spline in arb_spline(),
        ([a, b, c], mode) in arb_curve_points(),
    ) {
        let mut edited = spline.clone();
        edited.append_curve(a, b, c, mode, false).unwrap();
        edited.remove_curve(edited.curve_count() - 1, false).unwrap();
        prop_assert_eq!(edited.points_count(), spline.points_count());
        prop_assert_eq!(edited.curve_count(), spline.curve_count());
        prop_assert_eq!(edited.modes(), spline.modes());

        let mut edited = spline.clone();
        edited.append_curve(a, b, c, mode, true).unwrap();
        edited.remove_curve(0, true).unwrap();
        prop_assert_eq!(edited.curve_count(), spline.curve_count());
        prop_assert_eq!(edited.modes(), spline.modes());
    }

    /// Splitting a curve does not change the shape.
    #[test]
    fn insert_preserves_shape(
        spline in arb_shape_preserving_spline(),
        curve_pick in 0usize..8,
        split in 0.05..0.95f64,
    ) {
        let curve = curve_pick % spline.curve_count();
        let mut edited = spline.clone();
        edited.insert_curve(curve, split).unwrap();
        prop_assert_eq!(edited.curve_count(), spline.curve_count() + 1);

        for i in 0..=16 {
            let u = f64::from(i) / 16.0;
            let expected = spline.segment(curve).point_at(u);
            let actual = if u <= split {
                edited.segment(curve).point_at(u / split)
            } else {
                edited.segment(curve + 1).point_at((u - split) / (1.0 - split))
            };
            prop_assert!((expected - actual).norm() < 1e-3, "u={} off by {}", u, (expected - actual).norm());
        }
    }

    /// Mirrored anchors keep equidistant handles through arbitrary edits.
    #[test]
    fn mirrored_handles_stay_equidistant(
        mut spline in arb_spline(),
        close in prop::bool::ANY,
        moves in prop::collection::vec((0usize..40, arb_point()), 0..12),
    ) {
        if close {
            spline.toggle_close_loop().unwrap();
        }
        spline.set_all_modes(AnchorMode::Mirrored);
        for (index, p) in moves {
            spline.set_point(index, p);
        }
        for (a, h_in, h_out) in constrained_anchors(&spline) {
            let anchor = spline.position(a);
            let d_in = spline.position(h_in) - anchor;
            let d_out = spline.position(h_out) - anchor;
            prop_assert!((d_in + d_out).norm() < 1e-6, "anchor {} not mirrored", a);
        }
    }

    /// Aligned anchors keep colinear handles through arbitrary edits.
    #[test]
    fn aligned_handles_stay_colinear(
        mut spline in arb_spline(),
        moves in prop::collection::vec((0usize..40, arb_point()), 0..12),
    ) {
        spline.set_all_modes(AnchorMode::Aligned);
        for (index, p) in moves {
            spline.set_point(index, p);
        }
        for (a, h_in, h_out) in constrained_anchors(&spline) {
            let anchor = spline.position(a);
            let d_in = anchor - spline.position(h_in);
            let d_out = spline.position(h_out) - anchor;
            let scale = d_in.norm() * d_out.norm();
            prop_assert!(d_in.cross(&d_out).norm() <= 1e-6 * scale + 1e-9, "anchor {} not colinear", a);
            prop_assert!(d_in.dot(&d_out) >= -1e-9);
        }
    }

    /// Chord length grows as the walk step is refined.
    #[test]
    fn linear_length_is_monotone(spline in arb_spline()) {
        let lengths: Vec<f64> = (3..=10)
            .map(|k| spline.linear_length(1.0 / f64::from(1u32 << k)))
            .collect();
        prop_assert!(lengths[0] >= 0.0);
        for pair in lengths.windows(2) {
            prop_assert!(pair[1] >= pair[0] - 1e-9);
        }
        prop_assert!(spline.arc_length() >= 0.0);
    }

    /// Resampling never overshoots the adjusted spacing and hits both ends.
    #[test]
    fn even_sampling_respects_spacing(spline in arb_spline(), spacing in 0.5..5.0f64) {
        let precision = 1e-4;
        let path = spline.sample_evenly_spaced(spacing, precision);
        let length = spline.linear_length(precision);
        let segments = ((length / spacing).round()).max(1.0);
        let adjusted = length / segments;

        prop_assert_eq!(path.len(), segments as usize + 1);
        prop_assert!((path.positions[0] - spline.evaluate(0.0)).norm() < 1e-12);
        prop_assert!((path.positions[path.len() - 1] - spline.evaluate(1.0)).norm() < 1e-12);
        for gap in path.spacings() {
            prop_assert!(gap <= adjusted * 1.01 + 1e-3, "gap {} > spacing {}", gap, adjusted);
        }
        prop_assert!(path.params.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Normals are unit length and orthogonal to the tangents.
    #[test]
    fn normals_are_orthonormal(
        spline in arb_spline(),
        offset in -180.0..180.0f64,
        global in -180.0..180.0f64,
    ) {
        let mut spline = spline;
        spline.set_anchor_angular_offset(0, offset);
        spline.set_normals_rotation(global);
        let mut path = spline.sample_evenly_spaced(1.0, 1e-3);
        spline.recalculate_normals(&mut path);
        for (n, t) in path.normals.iter().zip(&path.tangents) {
            prop_assert!((n.norm() - 1.0).abs() < 1e-9);
            prop_assert!(n.dot(t).abs() < 1e-9);
        }
    }

    /// Random edit sequences keep the storage layout consistent, and
    /// rejected edits leave the spline untouched.
    #[test]
    fn edit_sequences_keep_layout(
        spline in arb_spline(),
        edits in prop::collection::vec(arb_edit(), 1..20),
    ) {
        let mut spline = spline;
        for edit in &edits {
            apply(&mut spline, edit);
            assert_layout(&spline)?;
        }
    }

    /// Factor then simplify restores the curve count.
    #[test]
    fn factor_simplify_round_trip(spline in arb_spline()) {
        let mut edited = spline.clone();
        edited.factor_spline().unwrap();
        prop_assert_eq!(edited.curve_count(), spline.curve_count() * 2);
        edited.simplify_spline().unwrap();
        prop_assert_eq!(edited.curve_count(), spline.curve_count());
    }
}
