//! # `sfm`
//!
//! Batteries-included bearing-based triangulation for structure from motion.
//!
//! This crate re-exports the whole triangulation stack in one place for
//! discoverability and for quickly writing a sample or script. Production
//! applications should depend on the member crates individually so they only pull
//! in what they use; alternatively, disable default features here and enable the
//! pieces you want.
//!
//! The core types (bearings, poses, points, the triangulation contract) live in
//! the crate root. The remaining layers each get a module:
//!
//! ## Modules
//! * [`camera`] - camera models to convert image measurements into bearings (and back)
//! * [`geom`] - the two-ray, DLT, and midpoint triangulation solvers
//! * [`reconstruction`] - track stores, reconstructions, and batch orchestration

pub use sfm_core::*;

/// Camera projection models
pub mod camera {
    #[cfg(feature = "sfm-camera")]
    pub use sfm_camera::*;
}

/// Triangulation solvers
pub mod geom {
    #[cfg(feature = "sfm-geom")]
    pub use sfm_geom::triangulation;
}

/// Track-level orchestration over a reconstruction store
pub mod reconstruction {
    #[cfg(feature = "sfm-reconstruction")]
    pub use sfm_reconstruction::*;
}
