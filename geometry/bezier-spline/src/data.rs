//! Persistable spline snapshot.

use nalgebra::{Point3, Vector3};
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::SplineError;
use crate::point::{AnchorMode, ControlPoint};
use crate::spline::Spline;

/// Plain-data form of a [`Spline`], suitable for saving and loading.
///
/// `positions` and `scales` have one entry per control point; `modes` and
/// `angles` one per anchor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplineData {
    /// Control point positions.
    pub positions: Vec<Point3<f64>>,
    /// Control point scales.
    pub scales: Vec<Vector3<f64>>,
    /// Anchor modes.
    pub modes: Vec<AnchorMode>,
    /// Anchor angular offsets in degrees.
    pub angles: Vec<f64>,
    /// Loop flag.
    pub looped: bool,
    /// The loop's last curve was added when closing it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub closing_curve: bool,
    /// Global normal rotation in degrees.
    pub normals_rotation: f64,
}

impl Spline {
    /// Snapshot the spline.
    #[must_use]
    pub fn to_data(&self) -> SplineData {
        SplineData {
            positions: self.points.iter().map(|p| p.position).collect(),
            scales: self.points.iter().map(|p| p.scale).collect(),
            modes: self.modes.clone(),
            angles: self.points.iter().step_by(3).map(|p| p.angle).collect(),
            looped: self.looped,
            closing_curve: self.closing_curve,
            normals_rotation: self.normals_rotation,
        }
    }

    /// Rebuild a spline from a snapshot.
    ///
    /// A loop's last control point is replaced by a copy of the first, so
    /// small gaps and differing end scales or angles are closed.
    ///
    /// # Errors
    ///
    /// Returns [`SplineError::InvalidData`] if the counts do not describe a
    /// spline of at least one curve, or a loop's ends do not match.
    pub fn from_data(data: &SplineData) -> Result<Self> {
        validate(data).inspect_err(|err| warn!(%err, "rejected spline data"))?;

        let points = data
            .positions
            .iter()
            .zip(&data.scales)
            .enumerate()
            .map(|(i, (&position, &scale))| ControlPoint {
                position,
                scale,
                angle: if i % 3 == 0 { data.angles[i / 3] } else { 0.0 },
            })
            .collect();

        let mut spline = Self::from_parts(
            points,
            data.modes.clone(),
            data.looped,
            data.closing_curve,
            data.normals_rotation,
        );
        spline.sync_loop_closure();
        Ok(spline)
    }
}

fn validate(data: &SplineData) -> Result<()> {
    let len = data.positions.len();
    if len < 4 || (len - 1) % 3 != 0 {
        return Err(SplineError::invalid_data(format!(
            "{len} positions cannot form whole cubic curves"
        )));
    }
    if data.scales.len() != len {
        return Err(SplineError::invalid_data(format!(
            "{} scales for {len} positions",
            data.scales.len()
        )));
    }
    let anchors = (len - 1) / 3 + 1;
    if data.modes.len() != anchors || data.angles.len() != anchors {
        return Err(SplineError::invalid_data(format!(
            "expected {anchors} modes and angles, got {} and {}",
            data.modes.len(),
            data.angles.len()
        )));
    }
    if data.looped {
        let gap = (data.positions[0] - data.positions[len - 1]).norm();
        if gap > 1e-9 || data.modes[0] != data.modes[anchors - 1] {
            return Err(SplineError::invalid_data(
                "looped spline must start and end on the same anchor and mode",
            ));
        }
    }
    Ok(())
}
