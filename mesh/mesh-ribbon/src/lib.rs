//! Flat ribbon meshes swept along Bézier splines.
//!
//! # Features
//!
//! - **Width profiles**: Piecewise-linear width over the spline, symmetric
//!   or with independent left and right sides
//! - **Point scale**: Widths follow the spline's per-anchor scale
//! - **UV mapping**: Linear or ping-pong `v`, optionally mirrored
//! - **Loops**: Looped splines produce closed strips
//! - **Background generation**: [`RibbonGenerator`] coalesces bursts of
//!   requests and never publishes stale meshes
//!
//! # Quick Start
//!
//! ```
//! use bezier_spline::{AnchorMode, Point3, Spline};
//! use mesh_ribbon::{RibbonConfig, WidthCurve, WidthProfile, generate_ribbon};
//!
//! let mut spline = Spline::default();
//! spline.set_all_modes(AnchorMode::Auto);
//! spline.set_point(3, Point3::new(4.0, 2.0, 0.0));
//!
//! // Taper from full width to nothing
//! let profile = WidthProfile::symmetric(WidthCurve::new(vec![(0.0, 1.0), (1.0, 0.0)]));
//! let config = RibbonConfig::default().with_width(0.2).with_spacing(0.25);
//!
//! let mesh = generate_ribbon(&spline, &profile, &config).unwrap();
//! assert_eq!(mesh.vertex_count(), mesh.uvs.len());
//! assert!(!mesh.is_empty());
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default): Compute cross-sections on the rayon thread pool
//! - `serde`: Enable serialization of profiles and configuration

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::float_cmp,
    clippy::suboptimal_flops,
    clippy::missing_const_for_fn
)]

mod config;
mod error;
mod generator;
mod profile;
mod ribbon;

pub use config::RibbonConfig;
pub use error::{RibbonError, RibbonResult};
pub use generator::{GeneratedRibbon, GenerationMode, RibbonGenerator, RibbonJob};
pub use profile::{UvMode, WidthCurve, WidthProfile};
pub use ribbon::{RibbonMesh, build_ribbon, generate_ribbon};
