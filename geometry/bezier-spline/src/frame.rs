//! Rotation-minimizing normals for sampled paths.
//!
//! A rotation axis is carried along the samples with the double reflection
//! method (Wang et al., 2008); the normal at each sample is
//! `axis × tangent`. Per-anchor angular offsets and the spline's global
//! rotation are then applied by rotating each normal about its tangent.

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use tracing::debug;

use crate::constraints::perpendicular_to;
use crate::path::SplinePath;
use crate::spline::Spline;

/// Squared distances below this count as coincident samples.
const COINCIDENT_EPSILON: f64 = 1e-20;

/// Vectors shorter than this are treated as zero.
const ZERO_EPSILON: f64 = 1e-12;

/// Starting rotation axis for a path whose first tangent is `tangent`.
///
/// `tangent × Z` when that is well defined, so that normals of a path in
/// the XY plane point along `+Z`; otherwise a perpendicular fallback.
#[must_use]
pub fn default_rotation_axis(tangent: &Vector3<f64>) -> Vector3<f64> {
    perpendicular_to(tangent)
}

/// Carry `initial_axis` along the samples by double reflection.
///
/// Returns one unit axis per sample, each perpendicular to its tangent.
/// `tangents` must be unit length and as long as `positions`.
#[must_use]
pub fn transport_axes(
    positions: &[Point3<f64>],
    tangents: &[Vector3<f64>],
    initial_axis: Vector3<f64>,
) -> Vec<Vector3<f64>> {
    let Some(first_tangent) = tangents.first() else {
        return Vec::new();
    };

    let mut axis = project_onto_plane(&initial_axis, first_tangent)
        .unwrap_or_else(|| perpendicular_to(first_tangent));
    let mut axes = Vec::with_capacity(tangents.len());
    axes.push(axis);

    for i in 1..positions.len().min(tangents.len()) {
        let tangent = tangents[i];
        let v1 = positions[i] - positions[i - 1];
        let c1 = v1.dot(&v1);

        axis = if c1 < COINCIDENT_EPSILON {
            // coincident samples: only re-project onto the new normal plane
            project_onto_plane(&axis, &tangent).unwrap_or(axis)
        } else {
            // first reflection: across the plane bisecting the two samples
            let r_l = axis - v1 * (2.0 / c1) * v1.dot(&axis);
            let t_l = tangents[i - 1] - v1 * (2.0 / c1) * v1.dot(&tangents[i - 1]);

            // second reflection: maps the reflected tangent onto the new one
            let v2 = tangent - t_l;
            let c2 = v2.dot(&v2);
            let reflected = if c2 < COINCIDENT_EPSILON {
                r_l
            } else {
                r_l - v2 * (2.0 / c2) * v2.dot(&r_l)
            };
            project_onto_plane(&reflected, &tangent).unwrap_or(axis)
        };
        axes.push(axis);
    }
    axes
}

fn project_onto_plane(v: &Vector3<f64>, normal: &Vector3<f64>) -> Option<Vector3<f64>> {
    (v - normal * normal.dot(v)).try_normalize(ZERO_EPSILON)
}

/// Rotate `v` about `axis` by `degrees`.
fn rotate_about(v: &Vector3<f64>, axis: &Vector3<f64>, degrees: f64) -> Vector3<f64> {
    if degrees == 0.0 {
        return *v;
    }
    let rotation = UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), degrees.to_radians());
    rotation * v
}

impl Spline {
    /// Fill `path.normals` using the default starting axis.
    pub fn recalculate_normals(&self, path: &mut SplinePath) {
        let initial = path
            .tangents
            .first()
            .map_or_else(Vector3::z, default_rotation_axis);
        self.recalculate_normals_with_axis(path, initial);
    }

    /// Fill `path.normals` starting from `initial_axis`.
    ///
    /// Each normal is unit length and perpendicular to its tangent, then
    /// rotated by the angular offset of the anchor that starts the sample's
    /// curve, then by [`Spline::normals_rotation`].
    pub fn recalculate_normals_with_axis(&self, path: &mut SplinePath, initial_axis: Vector3<f64>) {
        let axes = transport_axes(&path.positions, &path.tangents, initial_axis);
        let global = self.normals_rotation;

        path.normals = axes
            .iter()
            .zip(&path.tangents)
            .zip(&path.params)
            .map(|((axis, tangent), &t)| {
                let normal = axis
                    .cross(tangent)
                    .try_normalize(ZERO_EPSILON)
                    .unwrap_or_else(|| perpendicular_to(tangent));
                let (curve, _) = self.locate(t);
                let local = self.anchor_angular_offset(curve);
                let normal = rotate_about(&normal, tangent, local);
                rotate_about(&normal, tangent, global)
            })
            .collect();

        debug!(samples = path.normals.len(), global, "normals recalculated");
    }
}
