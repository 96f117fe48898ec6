//! Control points and anchor tangent modes.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the two handles around an anchor are tied together.
///
/// Modes are stored per anchor (indices `3k`), never per handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnchorMode {
    /// Handles move independently.
    #[default]
    Free,
    /// Handles stay colinear through the anchor; each keeps its own length.
    Aligned,
    /// Handles stay colinear through the anchor and have equal length.
    Mirrored,
    /// Handles are computed from the neighbouring anchors.
    Auto,
}

impl AnchorMode {
    /// All modes, in declaration order.
    pub const ALL: [Self; 4] = [Self::Free, Self::Aligned, Self::Mirrored, Self::Auto];

    /// Whether the mode forces the handles to be colinear with the anchor.
    #[must_use]
    pub fn is_colinear(self) -> bool {
        matches!(self, Self::Aligned | Self::Mirrored | Self::Auto)
    }
}

/// A single point of the spline's control polygon.
///
/// `scale` only feeds ribbon width scaling and `angle` (degrees) only feeds
/// normal framing; both are read from anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlPoint {
    /// Position in spline-local space.
    pub position: Point3<f64>,
    /// Non-uniform scale factor, `(1, 1, 1)` by default.
    pub scale: Vector3<f64>,
    /// Angular offset applied to normals, in degrees.
    pub angle: f64,
}

impl ControlPoint {
    /// Create a control point with unit scale and no angular offset.
    #[must_use]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            scale: Vector3::new(1.0, 1.0, 1.0),
            angle: 0.0,
        }
    }

    /// Create a control point from coordinates.
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Same point with a different scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vector3<f64>) -> Self {
        self.scale = scale;
        self
    }

    /// Same point with a different angular offset (degrees).
    #[must_use]
    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = degrees;
        self
    }
}

impl From<Point3<f64>> for ControlPoint {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

/// Options for a single point edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointEdit {
    /// Run the constraint solver after moving the point.
    pub apply_constraints: bool,
    /// When moving an anchor, translate its handles with it.
    pub move_adjacent_handles: bool,
}

impl Default for PointEdit {
    fn default() -> Self {
        Self {
            apply_constraints: true,
            move_adjacent_handles: true,
        }
    }
}

impl PointEdit {
    /// Move only the point itself: no handle translation, no constraints.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            apply_constraints: false,
            move_adjacent_handles: false,
        }
    }
}
