//! Editable cubic Bézier splines.
//!
//! This crate provides the spline model behind the ribbon mesher:
//!
//! - [`CubicBezier`] / [`QuadraticBezier`] - Single segments with closed-form
//!   length and an inverse control-point solver
//! - [`Spline`] - A chain of cubic curves sharing anchors, open or looped
//! - [`AnchorMode`] - Per-anchor tangent constraints (`Free`, `Aligned`,
//!   `Mirrored`, `Auto`)
//! - [`SplinePath`] - Arc-length resampled points with tangents, normals
//!   and scales
//!
//! # Storage Layout
//!
//! A spline of `C` curves stores `3C + 1` control points
//! `A0, H, H, A1, H, H, ..., AC`. Anchors sit at indices `3k`; the mode of
//! the anchor owning point `i` is `modes[(i + 1) / 3]`. A looped spline
//! duplicates its first anchor (and mode) in the last slot.
//!
//! # Editing
//!
//! Point edits re-run the tangent constraints of the touched anchor and
//! refresh `Auto` anchors one hop away. Structural edits
//! ([`Spline::insert_curve`], [`Spline::remove_curve`],
//! [`Spline::toggle_close_loop`], [`Spline::factor_spline`],
//! [`Spline::simplify_spline`]) return [`Result`] and leave the spline
//! unchanged on error. Every successful edit notifies the spline's
//! [`ChangeObserver`], if any.
//!
//! # Example
//!
//! ```
//! use bezier_spline::{AnchorMode, Spline};
//! use nalgebra::Point3;
//!
//! let mut spline = Spline::default();
//! spline.insert_curve(0, 0.5).unwrap();
//! spline.set_all_modes(AnchorMode::Auto);
//! spline.set_point(3, Point3::new(2.5, 1.0, 0.0));
//!
//! let mut path = spline.sample_evenly_spaced(0.25, 1e-3);
//! spline.recalculate_normals(&mut path);
//! assert_eq!(path.normals.len(), path.len());
//! ```
//!
//! # Coordinate System
//!
//! Right-handed, Z up. Default normals of a path lying in the XY plane
//! point along `+Z`.
//!
//! # Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

#![doc(html_root_url = "https://docs.rs/bezier-spline/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::cast_possible_truncation,
    clippy::too_many_lines,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::suboptimal_flops,
    clippy::while_float,
    clippy::missing_const_for_fn,
    clippy::cast_lossless,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::float_cmp,
    clippy::manual_midpoint,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::needless_range_loop,
    clippy::return_self_not_must_use
)]

mod bezier;
mod change;
mod config;
mod constraints;
mod data;
mod error;
mod frame;
mod path;
mod point;
mod sampler;
mod spline;
mod topology;
mod traits;

pub use bezier::{CubicBezier, QuadraticBezier, solve_inverse_control_points};
pub use change::{ChangeObserver, SplineChange};
pub use config::SamplingConfig;
pub use data::SplineData;
pub use error::SplineError;
pub use frame::{default_rotation_axis, transport_axes};
pub use path::SplinePath;
pub use point::{AnchorMode, ControlPoint, PointEdit};
pub use sampler::{MAX_SAMPLES, MIN_PRECISION};
pub use spline::Spline;
pub use traits::Curve;

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, Vector3};

/// Result type for spline operations.
pub type Result<T> = std::result::Result<T, SplineError>;
