//! # SfM Core
//!
//! This library provides the common vocabulary for the triangulation crates in this
//! workspace: bearings, poses, projective points, keypoints, the camera model seam,
//! and the triangulator contract. Every other crate in the workspace depends on the
//! abstractions specified here so that solvers, camera models, and the track
//! orchestration layer can be swapped independently.
//!
//! ## Triangulation
//!
//! Cameras have an optical center out of which all bearings protrude. A bearing is a
//! unit direction pointing from that optical center towards something observed in the
//! image. Given the poses of two or more cameras and a bearing from each one believed
//! to point at the same physical point, triangulation recovers that point. With noisy
//! data the rays never truly intersect, so the solvers in `sfm-geom` minimize
//! different residuals and report how trustworthy the result is.
//!
//! - `p` the point being triangulated
//! - `O` the optical center of a camera
//! - `*` a bearing out of an optical center
//!
//! ```text
//!        p
//!       / \
//!      *   *
//!     /     \
//!    O       O
//! ```

mod bearing;
mod camera;
mod error;
mod keypoint;
mod point;
mod pose;
mod triangulation;

pub use bearing::*;
pub use camera::*;
pub use error::*;
pub use keypoint::*;
pub use nalgebra;
pub use point::*;
pub use pose::*;
pub use triangulation::*;
