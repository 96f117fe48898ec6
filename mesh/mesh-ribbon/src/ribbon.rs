//! Flat strip tessellation of a sampled spline path.
//!
//! Each path sample contributes two vertices, one on either side of the
//! path along `normal × tangent`. Consecutive sample pairs are joined by two
//! triangles; a looped path also joins the last pair back to the first.

use bezier_spline::{Spline, SplineError, SplinePath, default_rotation_axis};
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::config::RibbonConfig;
use crate::error::{RibbonError, RibbonResult};
use crate::profile::WidthProfile;

/// Vertex offsets of the two triangles joining sample pairs `i` and `i + 1`.
const QUAD_PATTERN: [usize; 6] = [0, 2, 1, 1, 2, 3];

/// Largest path that still fits `u32` vertex indices.
const MAX_PATH_POINTS: usize = (u32::MAX / 2) as usize;

/// Triangle strip mesh produced by [`build_ribbon`].
///
/// Vertex `2i` lies on the left edge and `2i + 1` on the right edge of
/// path sample `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RibbonMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Per-vertex normals, copied from the path.
    pub normals: Vec<Vector3<f64>>,
    /// Per-vertex texture coordinates, `u` across and `v` along the strip.
    pub uvs: Vec<[f64; 2]>,
    /// Triangle list, three indices per face.
    pub indices: Vec<u32>,
}

impl RibbonMesh {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }
}

/// Both edge vertices of one path sample.
struct CrossSection {
    left: Point3<f64>,
    right: Point3<f64>,
    normal: Vector3<f64>,
    v: f64,
}

/// Tessellate `path` into a flat ribbon.
///
/// `path` must carry normals (see [`Spline::recalculate_normals`]).
/// `width` is the global half-width multiplier.
///
/// # Errors
///
/// [`RibbonError::TooFewPoints`] when `path` has fewer than two samples,
/// [`RibbonError::TooManyPoints`] when it cannot be indexed with `u32`.
pub fn build_ribbon(path: &SplinePath, profile: &WidthProfile, width: f64) -> RibbonResult<RibbonMesh> {
    let count = path.len();
    if count < 2 {
        warn!(points = count, "ribbon path too short");
        return Err(RibbonError::TooFewPoints {
            min: 2,
            actual: count,
        });
    }
    if count > MAX_PATH_POINTS {
        warn!(points = count, "ribbon path exceeds index range");
        return Err(RibbonError::TooManyPoints {
            max: MAX_PATH_POINTS,
            actual: count,
        });
    }

    let sections = cross_sections(path, profile, width);

    let vertex_count = count * 2;
    let mut mesh = RibbonMesh {
        vertices: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        indices: Vec::new(),
    };
    for section in &sections {
        mesh.vertices.push(section.left);
        mesh.vertices.push(section.right);
        mesh.normals.push(section.normal);
        mesh.normals.push(section.normal);
        mesh.uvs.push([0.0, section.v]);
        mesh.uvs.push([1.0, section.v]);
    }

    let quads = if path.looped { count } else { count - 1 };
    mesh.indices.reserve(quads * QUAD_PATTERN.len());
    for i in 0..quads {
        let base = 2 * i;
        for offset in QUAD_PATTERN {
            // only the closing quad of a loop runs past the end
            let index = (base + offset) % vertex_count;
            mesh.indices.push(index as u32);
        }
    }

    debug!(
        points = count,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        looped = path.looped,
        "built ribbon"
    );
    Ok(mesh)
}

/// Sample, frame and tessellate `spline` in one call.
///
/// # Errors
///
/// Configuration errors from [`RibbonConfig::validate`],
/// [`RibbonError::TooManyPoints`] when the spacing is too fine for the
/// spline's length, and the errors of [`build_ribbon`].
///
/// # Example
///
/// ```
/// use bezier_spline::Spline;
/// use mesh_ribbon::{RibbonConfig, WidthProfile, generate_ribbon};
///
/// let spline = Spline::default();
/// let config = RibbonConfig::default().with_width(0.1).with_spacing(0.5);
/// let mesh = generate_ribbon(&spline, &WidthProfile::default(), &config).unwrap();
/// assert_eq!(mesh.vertex_count(), 2 * 7);
/// assert_eq!(mesh.triangle_count(), 2 * 6);
/// ```
pub fn generate_ribbon(
    spline: &Spline,
    profile: &WidthProfile,
    config: &RibbonConfig,
) -> RibbonResult<RibbonMesh> {
    config.validate()?;
    let mut path = spline.try_sample(&config.sampling).map_err(|err| match err {
        SplineError::TooManySamples { max, requested } => RibbonError::TooManyPoints {
            max,
            actual: requested,
        },
        other => other.into(),
    })?;
    match config.initial_axis {
        Some(axis) => spline.recalculate_normals_with_axis(&mut path, axis),
        None => spline.recalculate_normals(&mut path),
    }
    build_ribbon(&path, profile, config.width)
}

fn cross_sections(path: &SplinePath, profile: &WidthProfile, width: f64) -> Vec<CrossSection> {
    let count = path.len();
    let section = |i: usize| {
        let position = path.positions[i];
        let tangent = path.tangents[i];
        let normal = path.normals.get(i).copied().unwrap_or_else(Vector3::zeros);
        let right = normal
            .cross(&tangent)
            .try_normalize(1e-12)
            .unwrap_or_else(|| default_rotation_axis(&tangent));
        let t = path.params.get(i).copied().unwrap_or(0.0);
        let scale_x = path.scales.get(i).map_or(1.0, |s| s.x);
        let (left_width, right_width) = profile.widths_at(t, scale_x, width);

        CrossSection {
            left: position - right * left_width,
            right: position + right * right_width,
            normal,
            v: profile.uv_v(i, count),
        }
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
        (0..count).into_par_iter().map(section).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..count).map(section).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::profile::{UvMode, WidthCurve};
    use approx::assert_relative_eq;

    /// Straight path along +X with normals along +Z.
    fn straight_path(count: usize, looped: bool) -> SplinePath {
        let mut path = SplinePath::with_capacity(count, looped);
        for i in 0..count {
            let t = if count > 1 {
                i as f64 / (count - 1) as f64
            } else {
                0.0
            };
            path.push(Point3::new(i as f64, 0.0, 0.0), Vector3::x(), Vector3::new(1.0, 1.0, 1.0), t);
        }
        path.normals = vec![Vector3::z(); count];
        path
    }

    #[test]
    fn test_rejects_short_paths() {
        let err = build_ribbon(&straight_path(1, false), &WidthProfile::default(), 1.0).unwrap_err();
        assert_eq!(err, RibbonError::TooFewPoints { min: 2, actual: 1 });
        assert!(build_ribbon(&SplinePath::default(), &WidthProfile::default(), 1.0).is_err());
    }

    #[test]
    fn test_vertices_straddle_the_path() {
        let mesh = build_ribbon(&straight_path(3, false), &WidthProfile::default(), 0.5).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        // right = z × x = +y
        assert_relative_eq!(mesh.vertices[0], Point3::new(0.0, -0.5, 0.0));
        assert_relative_eq!(mesh.vertices[1], Point3::new(0.0, 0.5, 0.0));
        assert_relative_eq!(mesh.vertices[5], Point3::new(2.0, 0.5, 0.0));
        assert!(mesh.normals.iter().all(|n| *n == Vector3::z()));
    }

    #[test]
    fn test_open_index_pattern() {
        let mesh = build_ribbon(&straight_path(3, false), &WidthProfile::default(), 1.0).unwrap();
        assert_eq!(mesh.indices, vec![0, 2, 1, 1, 2, 3, 2, 4, 3, 3, 4, 5]);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.triangles().next(), Some([0, 2, 1]));
    }

    #[test]
    fn test_looped_index_pattern_wraps() {
        let mesh = build_ribbon(&straight_path(3, true), &WidthProfile::default(), 1.0).unwrap();
        assert_eq!(mesh.triangle_count(), 6);
        assert_eq!(&mesh.indices[12..], &[4, 0, 5, 5, 0, 1]);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_uvs_follow_profile() {
        let profile = WidthProfile::default().with_uv_mode(UvMode::PingPong);
        let mesh = build_ribbon(&straight_path(3, false), &profile, 1.0).unwrap();
        assert_eq!(mesh.uvs[0], [0.0, 0.0]);
        assert_eq!(mesh.uvs[1], [1.0, 0.0]);
        assert_eq!(mesh.uvs[2], [0.0, 1.0]);
        assert_eq!(mesh.uvs[5], [1.0, 0.0]);
    }

    #[test]
    fn test_asymmetric_widths_and_point_scale() {
        let mut path = straight_path(2, false);
        path.scales[1] = Vector3::new(2.0, 1.0, 1.0);
        let profile = WidthProfile::asymmetric(WidthCurve::constant(0.25), WidthCurve::constant(1.0));
        let mesh = build_ribbon(&path, &profile, 1.0).unwrap();
        assert_relative_eq!(mesh.vertices[0], Point3::new(0.0, -0.25, 0.0));
        assert_relative_eq!(mesh.vertices[1], Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(mesh.vertices[2], Point3::new(1.0, -0.5, 0.0));
        assert_relative_eq!(mesh.vertices[3], Point3::new(1.0, 2.0, 0.0));

        let mesh = build_ribbon(&path, &profile.with_point_scale(false), 1.0).unwrap();
        assert_relative_eq!(mesh.vertices[3], Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_degenerate_normal_falls_back() {
        let mut path = straight_path(2, false);
        path.normals = vec![Vector3::x(); 2];
        let mesh = build_ribbon(&path, &WidthProfile::default(), 1.0).unwrap();
        assert!(mesh.vertices.iter().all(|v| v.coords.iter().all(|c| c.is_finite())));
        assert_relative_eq!((mesh.vertices[1] - mesh.vertices[0]).norm(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_generate_validates_config() {
        let spline = Spline::default();
        let err = generate_ribbon(&spline, &WidthProfile::default(), &RibbonConfig::default().with_spacing(-1.0))
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_generate_rejects_spacing_too_fine_for_length() {
        let spline = Spline::default();
        for spacing in [1e-300, 1e-8] {
            let config = RibbonConfig::default().with_spacing(spacing);
            assert!(config.validate().is_ok());
            let err = generate_ribbon(&spline, &WidthProfile::default(), &config).unwrap_err();
            assert!(
                matches!(err, RibbonError::TooManyPoints { max, actual } if actual > max),
                "spacing {spacing}: {err}"
            );
        }
    }

    #[test]
    fn test_generate_default_spline() {
        let spline = Spline::default();
        let mesh = generate_ribbon(&spline, &WidthProfile::default(), &RibbonConfig::default()).unwrap();
        // length 3 at spacing 0.5: six segments, seven samples
        assert_eq!(mesh.vertex_count(), 14);
        for (i, pair) in mesh.vertices.chunks_exact(2).enumerate() {
            assert_relative_eq!((pair[1] - pair[0]).norm(), 2.0, epsilon = 1e-6);
            assert_relative_eq!(pair[0].x, pair[1].x, epsilon = 1e-9);
            assert!(pair[0].y < pair[1].y, "sample {i} flipped");
        }
    }
}
