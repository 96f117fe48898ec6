//! Sampled spline paths.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered samples along a spline.
///
/// All per-sample vectors have the same length. `normals` stay zero until a
/// frame builder fills them in (see [`Spline::recalculate_normals`]).
///
/// [`Spline::recalculate_normals`]: crate::Spline::recalculate_normals
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplinePath {
    /// Sample positions.
    pub positions: Vec<Point3<f64>>,
    /// Unit tangents.
    pub tangents: Vec<Vector3<f64>>,
    /// Unit normals.
    pub normals: Vec<Vector3<f64>>,
    /// Anchor scales interpolated along each segment.
    pub scales: Vec<Vector3<f64>>,
    /// Global spline parameter of each sample.
    pub params: Vec<f64>,
    /// Whether the path closes back onto its first sample.
    pub looped: bool,
}

impl SplinePath {
    /// Empty path with room for `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize, looped: bool) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            tangents: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
            scales: Vec::with_capacity(capacity),
            params: Vec::with_capacity(capacity),
            looped,
        }
    }

    /// Append a sample with a zero normal.
    pub fn push(&mut self, position: Point3<f64>, tangent: Vector3<f64>, scale: Vector3<f64>, t: f64) {
        self.positions.push(position);
        self.tangents.push(tangent);
        self.normals.push(Vector3::zeros());
        self.scales.push(scale);
        self.params.push(t);
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the path has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Parameter of the last sample.
    #[must_use]
    pub fn last_param(&self) -> Option<f64> {
        self.params.last().copied()
    }

    /// Distances between consecutive samples, including the closing gap of
    /// a looped path.
    #[must_use]
    pub fn spacings(&self) -> Vec<f64> {
        let mut spacings: Vec<f64> = self
            .positions
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .collect();
        if self.looped && self.len() > 1 {
            if let (Some(first), Some(last)) = (self.positions.first(), self.positions.last()) {
                spacings.push((first - last).norm());
            }
        }
        spacings
    }

    /// Polyline length through the samples.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.spacings().iter().sum()
    }
}
