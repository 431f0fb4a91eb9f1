use crate::{WorldPoint, WorldToCamera};
use nalgebra::UnitVector3;

/// Outcome of a multi-view triangulation attempt.
///
/// Geometric rejection is frequent and expected (many tracks are genuinely
/// degenerate), so it is reported as a value instead of an error. The best-effort
/// point is retained even when validation fails so callers can inspect why a track
/// was rejected, but it must never be committed unless `valid` is true.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangulation {
    /// Whether the recovered point passed every geometric check
    /// (parallax, reprojection error, cheirality).
    pub valid: bool,
    /// The best-effort recovered point. `None` only when the linear solve itself
    /// failed to produce a finite point.
    pub point: Option<WorldPoint>,
}

impl Triangulation {
    /// A point which passed all geometric validation.
    pub fn accepted(point: WorldPoint) -> Self {
        Self {
            valid: true,
            point: Some(point),
        }
    }

    /// A point which was recovered but failed geometric validation.
    pub fn rejected(point: WorldPoint) -> Self {
        Self {
            valid: false,
            point: Some(point),
        }
    }

    /// The linear solve produced no usable point at all.
    pub fn failed() -> Self {
        Self {
            valid: false,
            point: None,
        }
    }

    /// The recovered point, only if it passed validation.
    pub fn ok(self) -> Option<WorldPoint> {
        if self.valid {
            self.point
        } else {
            None
        }
    }
}

/// This trait is for algorithms which triangulate a point from two or more
/// observations. Each observation is a [`WorldToCamera`] pose paired with the
/// camera-frame bearing of the measurement.
///
/// The two multi-view algorithms in `sfm-geom` (DLT and midpoint) both implement
/// this contract so call sites can select one through configuration while the
/// orchestration code stays unchanged.
pub trait TriangulatorObservations {
    fn triangulate_observations(
        &self,
        pairs: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
    ) -> Triangulation;
}
