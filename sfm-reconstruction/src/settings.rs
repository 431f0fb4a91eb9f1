#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The multi-view algorithm used when a track has more than two rays.
///
/// Which algorithm to use is an explicit configuration choice, not derived from the
/// data: DLT is algebraically exact for noiseless data and uniform over bearing
/// models, the midpoint method is cheaper and has an explicit geometric
/// interpretation.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriangulationMethod {
    Dlt,
    Midpoint,
}

/// The settings for track triangulation.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangulationSettings {
    /// The angular reprojection error every view must stay within, in radians.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_max_reprojection_error")
    )]
    pub max_reprojection_error: f64,
    /// The minimum angle some pair of rays must subtend, in radians.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_min_ray_angle"))]
    pub min_ray_angle: f64,
    /// The preferred number of rays for a solve.
    ///
    /// This is a soft target, not a gate: tracks with at least two posed
    /// observations are always attempted with all the rays they have. Tracks
    /// falling short of the target are noted at debug level.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_min_triangulated_rays")
    )]
    pub min_triangulated_rays: usize,
    /// The multi-view algorithm used when a track has more than two rays.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_method"))]
    pub method: TriangulationMethod,
}

impl Default for TriangulationSettings {
    fn default() -> Self {
        Self {
            max_reprojection_error: default_max_reprojection_error(),
            min_ray_angle: default_min_ray_angle(),
            min_triangulated_rays: default_min_triangulated_rays(),
            method: default_method(),
        }
    }
}

fn default_max_reprojection_error() -> f64 {
    0.01
}

fn default_min_ray_angle() -> f64 {
    2.0f64.to_radians()
}

fn default_min_triangulated_rays() -> usize {
    10
}

fn default_method() -> TriangulationMethod {
    TriangulationMethod::Midpoint
}
