use float_ord::FloatOrd;
use itertools::Itertools;
use sfm_core::{
    nalgebra::{zero, Matrix2, Matrix3, Matrix3x4, Matrix4, Point3, UnitVector3, Vector2, Vector3},
    ray_angle, Pose, Projective, Triangulation, TriangulatorObservations, WorldPoint,
    WorldToCamera,
};

/// Fixed near-parallel gate of the two-ray midpoint solver, in radians.
///
/// Below this angle the 2x2 normal-equations matrix (determinant `-sin^2(angle)`)
/// is too close to singular for the solve to be meaningful.
pub const TWO_VIEW_MIN_RAY_ANGLE: f64 = 1e-6;

/// Converts a pose and a camera-frame bearing into a world-frame ray: the camera's
/// optical center and the bearing rotated into world orientation.
pub fn world_ray(
    pose: WorldToCamera,
    bearing: UnitVector3<f64>,
) -> (Point3<f64>, UnitVector3<f64>) {
    let camera_to_world = pose.isometry().inverse();
    let direction = UnitVector3::new_unchecked(camera_to_world.rotation * bearing.into_inner());
    (Point3::from(camera_to_world.translation.vector), direction)
}

/// Closed-form least-squares intersection of exactly two world-frame rays.
///
/// Solves the 2x2 normal-equations system for the two ray parameters and returns
/// the midpoint of the two closest points. Returns `None` when the rays are nearly
/// parallel ([`TWO_VIEW_MIN_RAY_ANGLE`]); this is an expected outcome, not an error,
/// since a near-singular system would yield a wildly unstable point.
pub fn triangulate_two_bearings_midpoint(
    o1: Point3<f64>,
    b1: UnitVector3<f64>,
    o2: Point3<f64>,
    b2: UnitVector3<f64>,
) -> Option<Point3<f64>> {
    if ray_angle(&b1, &b2) < TWO_VIEW_MIN_RAY_ANGLE {
        return None;
    }
    let d = o2 - o1;
    let design = Matrix2::new(b1.dot(&b1), -b1.dot(&b2), b1.dot(&b2), -b2.dot(&b2));
    let rhs = Vector2::new(b1.dot(&d), b2.dot(&d));
    let t = design.lu().solve(&rhs)?;
    let p1 = o1.coords + t.x * b1.into_inner();
    let p2 = o2.coords + t.y * b2.into_inner();
    Some(Point3::from((p1 + p2) * 0.5))
}

/// Checks a candidate point against every observation.
///
/// The three checks are the ones every multi-view solve must pass:
///
/// * parallax: at least one pair of rays subtends `min_ray_angle` or more,
/// * reprojection: the angle between each observed bearing and the bearing of the
///   reprojected point stays within `max_reprojection_error` (radians),
/// * cheirality: the reprojected point lies on the observed side of each camera.
pub fn validate_observations(
    point: WorldPoint,
    pairs: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
    min_ray_angle: f64,
    max_reprojection_error: f64,
) -> bool {
    validate_with_budgets(point, pairs, min_ray_angle, &[], max_reprojection_error)
}

fn validate_with_budgets(
    point: WorldPoint,
    pairs: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
    min_ray_angle: f64,
    budgets: &[f64],
    fallback_budget: f64,
) -> bool {
    let sufficient_parallax = pairs
        .clone()
        .map(|(pose, bearing)| world_ray(pose, bearing).1)
        .tuple_combinations()
        .any(|(a, b)| ray_angle(&a, &b) >= min_ray_angle);
    if !sufficient_parallax {
        return false;
    }
    pairs.enumerate().all(|(ix, (pose, bearing))| {
        let reprojected = pose.transform(point).bearing();
        let budget = budgets.get(ix).copied().unwrap_or(fallback_budget);
        bearing.dot(&reprojected).is_sign_positive() && ray_angle(&bearing, &reprojected) <= budget
    })
}

/// Direct Linear Transform over any number of bearings.
///
/// Each ray contributes two homogeneous rows derived from the cross-product
/// constraint between the bearing and the posed point. The rows are accumulated
/// into a 4x4 normal matrix whose smallest eigenvector is the homogeneous solution.
/// Algebraically exact for noiseless data and uniform over bearing models,
/// including non-perspective ones.
///
/// ```
/// use sfm_core::nalgebra::{Point3, Rotation3, Vector3};
/// use sfm_core::{Pose, Projective, TriangulatorObservations, WorldPoint, WorldToCamera};
/// use sfm_geom::triangulation::BearingDltTriangulator;
///
/// let point = WorldPoint::from_point(Point3::new(0.3, 0.1, 2.0));
/// let poses = [
///     WorldToCamera::identity(),
///     WorldToCamera::from_parts(Vector3::new(-1.0, 0.0, 0.0), Rotation3::identity()),
/// ];
/// let pairs = poses.map(|pose| (pose, pose.transform(point).bearing()));
/// let triangulated = BearingDltTriangulator::new()
///     .triangulate_observations(pairs.into_iter())
///     .ok()
///     .unwrap();
/// let distance = (point.point().unwrap() - triangulated.point().unwrap()).norm();
/// assert!(distance < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct BearingDltTriangulator {
    epsilon: f64,
    max_iterations: usize,
    min_ray_angle: f64,
    max_reprojection_error: f64,
}

impl BearingDltTriangulator {
    /// Creates a `BearingDltTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the epsilon used in the symmetric eigen solver.
    ///
    /// Default is `1e-12`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Set the maximum number of iterations for the symmetric eigen solver.
    ///
    /// Default is `1000`.
    #[must_use]
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// Set the minimum angle some pair of rays must subtend, in radians.
    ///
    /// Default is 2 degrees.
    #[must_use]
    pub fn min_ray_angle(self, min_ray_angle: f64) -> Self {
        Self {
            min_ray_angle,
            ..self
        }
    }

    /// Set the angular reprojection error every view must stay within, in radians.
    ///
    /// Default is `0.01`.
    #[must_use]
    pub fn max_reprojection_error(self, max_reprojection_error: f64) -> Self {
        Self {
            max_reprojection_error,
            ..self
        }
    }
}

impl Default for BearingDltTriangulator {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            max_iterations: 1000,
            min_ray_angle: 2.0f64.to_radians(),
            max_reprojection_error: 0.01,
        }
    }
}

impl TriangulatorObservations for BearingDltTriangulator {
    fn triangulate_observations(
        &self,
        pairs: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
    ) -> Triangulation {
        if pairs.clone().count() < 2 {
            return Triangulation::failed();
        }

        let mut design: Matrix4<f64> = zero();
        for (pose, bearing) in pairs.clone() {
            // Get the pose as a 3x4 matrix.
            let rot = pose.0.rotation.matrix();
            let trans = pose.0.translation.vector;
            let rt = Matrix3x4::<f64>::from_columns(&[
                rot.column(0),
                rot.column(1),
                rot.column(2),
                trans.column(0),
            ]);
            // Two independent rows of the cross-product constraint b x (R X + t) = 0.
            let row_x = bearing.x * rt.row(2) - bearing.z * rt.row(0);
            let row_y = bearing.y * rt.row(2) - bearing.z * rt.row(1);
            design += row_x.transpose() * row_x + row_y.transpose() * row_y;
        }

        let se = match design.try_symmetric_eigen(self.epsilon, self.max_iterations) {
            Some(se) => se,
            None => return Triangulation::failed(),
        };

        // The solution lies in the null space: the eigenvector of the smallest
        // eigenvalue, dehomogenized.
        let point = se
            .eigenvalues
            .iter()
            .enumerate()
            .min_by_key(|&(_, &eigenvalue)| FloatOrd(eigenvalue))
            .map(|(ix, _)| se.eigenvectors.column(ix).into_owned())
            .map(WorldPoint::from_homogeneous)
            .filter(|point| point.homogeneous().iter().all(|n| n.is_finite()))
            .and_then(|point| point.point());

        let point = match point {
            Some(point) => WorldPoint::from_point(point),
            None => return Triangulation::failed(),
        };

        if validate_observations(
            point,
            pairs,
            self.min_ray_angle,
            self.max_reprojection_error,
        ) {
            Triangulation::accepted(point)
        } else {
            Triangulation::rejected(point)
        }
    }
}

/// Least-squares closest point to any number of world-frame rays.
///
/// Each ray contributes its projector complement `I - b * b^T` to a 3x3 normal
/// system whose solution minimizes the sum of squared perpendicular distances to
/// the ray lines. Cheaper and numerically simpler than
/// [`BearingDltTriangulator`], with an explicit geometric interpretation.
///
/// ```
/// use sfm_core::nalgebra::{Point3, Rotation3, Vector3};
/// use sfm_core::{Pose, Projective, TriangulatorObservations, WorldPoint, WorldToCamera};
/// use sfm_geom::triangulation::BearingMidpointTriangulator;
///
/// let point = WorldPoint::from_point(Point3::new(0.3, 0.1, 2.0));
/// let poses = [
///     WorldToCamera::identity(),
///     WorldToCamera::from_parts(Vector3::new(-1.0, 0.0, 0.0), Rotation3::identity()),
/// ];
/// let pairs = poses.map(|pose| (pose, pose.transform(point).bearing()));
/// let triangulated = BearingMidpointTriangulator::new()
///     .triangulate_observations(pairs.into_iter())
///     .ok()
///     .unwrap();
/// let distance = (point.point().unwrap() - triangulated.point().unwrap()).norm();
/// assert!(distance < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct BearingMidpointTriangulator {
    min_ray_angle: f64,
    max_reprojection_error: f64,
}

impl BearingMidpointTriangulator {
    /// Creates a `BearingMidpointTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the minimum angle some pair of rays must subtend, in radians.
    ///
    /// Default is 2 degrees.
    #[must_use]
    pub fn min_ray_angle(self, min_ray_angle: f64) -> Self {
        Self {
            min_ray_angle,
            ..self
        }
    }

    /// Set the angular reprojection error every view must stay within, in radians.
    ///
    /// Default is `0.01`.
    #[must_use]
    pub fn max_reprojection_error(self, max_reprojection_error: f64) -> Self {
        Self {
            max_reprojection_error,
            ..self
        }
    }

    /// Triangulates with a per-ray reprojection budget.
    ///
    /// `budgets` is aligned with the ray order of `pairs`; rays beyond the end of
    /// the slice fall back to the solver's uniform `max_reprojection_error`. Call
    /// sites with heterogeneous cameras use this to give each view a threshold in
    /// its own angular resolution.
    pub fn triangulate_with_budgets(
        &self,
        pairs: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
        budgets: &[f64],
    ) -> Triangulation {
        let mut design = Matrix3::<f64>::zeros();
        let mut rhs = Vector3::<f64>::zeros();
        let mut rays = 0usize;
        for (pose, bearing) in pairs.clone() {
            let (origin, direction) = world_ray(pose, bearing);
            let complement =
                Matrix3::identity() - direction.into_inner() * direction.transpose();
            design += complement;
            rhs += complement * origin.coords;
            rays += 1;
        }
        if rays < 2 {
            return Triangulation::failed();
        }

        let point = match design.lu().solve(&rhs) {
            Some(point) if point.iter().all(|n| n.is_finite()) => {
                WorldPoint::from_point(Point3::from(point))
            }
            _ => return Triangulation::failed(),
        };

        if validate_with_budgets(
            point,
            pairs,
            self.min_ray_angle,
            budgets,
            self.max_reprojection_error,
        ) {
            Triangulation::accepted(point)
        } else {
            Triangulation::rejected(point)
        }
    }
}

impl Default for BearingMidpointTriangulator {
    fn default() -> Self {
        Self {
            min_ray_angle: 2.0f64.to_radians(),
            max_reprojection_error: 0.01,
        }
    }
}

impl TriangulatorObservations for BearingMidpointTriangulator {
    fn triangulate_observations(
        &self,
        pairs: impl Iterator<Item = (WorldToCamera, UnitVector3<f64>)> + Clone,
    ) -> Triangulation {
        self.triangulate_with_budgets(pairs, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfm_core::bearing;
    use sfm_core::nalgebra::Rotation3;

    fn baseline_pair() -> [(WorldToCamera, UnitVector3<f64>); 2] {
        // Cameras at the origin and at (1, 0, 0), both identity rotation,
        // observing the point (0, 0, 1).
        [
            (
                WorldToCamera::identity(),
                bearing(Vector3::new(0.0, 0.0, 1.0)).unwrap(),
            ),
            (
                WorldToCamera::from_parts(Vector3::new(-1.0, 0.0, 0.0), Rotation3::identity()),
                bearing(Vector3::new(-1.0, 0.0, 1.0)).unwrap(),
            ),
        ]
    }

    #[test]
    fn dlt_recovers_known_point() {
        let result = BearingDltTriangulator::new()
            .max_reprojection_error(0.01)
            .min_ray_angle(2.0f64.to_radians())
            .triangulate_observations(baseline_pair().into_iter());
        assert!(result.valid);
        let point = result.point.unwrap().point().unwrap();
        assert!((point.coords - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn midpoint_recovers_known_point() {
        let result = BearingMidpointTriangulator::new()
            .max_reprojection_error(0.01)
            .min_ray_angle(2.0f64.to_radians())
            .triangulate_observations(baseline_pair().into_iter());
        assert!(result.valid);
        let point = result.point.unwrap().point().unwrap();
        assert!((point.coords - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn midpoint_accepts_per_ray_budgets() {
        let result = BearingMidpointTriangulator::new()
            .min_ray_angle(2.0f64.to_radians())
            .triangulate_with_budgets(baseline_pair().into_iter(), &[0.01, 0.01]);
        assert!(result.valid);
        let point = result.point.unwrap().point().unwrap();
        assert!((point.coords - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn two_bearings_midpoint_recovers_known_point() {
        let o1 = Point3::new(0.0, 0.0, 0.0);
        let b1 = bearing(Vector3::new(0.0, 0.0, 1.0)).unwrap();
        let o2 = Point3::new(1.0, 0.0, 0.0);
        let b2 = bearing(Vector3::new(-1.0, 0.0, 1.0)).unwrap();
        let point = triangulate_two_bearings_midpoint(o1, b1, o2, b2).unwrap();
        assert!((point.coords - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn two_bearings_midpoint_rejects_near_parallel_rays() {
        let o1 = Point3::new(0.0, 0.0, 0.0);
        let b1 = bearing(Vector3::new(0.0, 0.0, 1.0)).unwrap();
        let o2 = Point3::new(1.0, 0.0, 0.0);
        // Almost parallel; a perturbation of 1e-5 would triangulate again.
        let b2 = bearing(Vector3::new(-1e-10, 0.0, 1.0)).unwrap();
        assert!(triangulate_two_bearings_midpoint(o1, b1, o2, b2).is_none());

        let b2 = bearing(Vector3::new(-1e-5, 0.0, 1.0)).unwrap();
        assert!(triangulate_two_bearings_midpoint(o1, b1, o2, b2).is_some());
    }

    #[test]
    fn solvers_agree_over_many_views() {
        let point = WorldPoint::from_point(Point3::new(0.3, 0.1, 2.0));
        let poses = [
            WorldToCamera::identity(),
            WorldToCamera::from_parts(Vector3::new(-1.0, 0.0, 0.0), Rotation3::identity()),
            WorldToCamera::from_parts(
                Vector3::new(0.5, -0.3, 0.2),
                Rotation3::from_scaled_axis(Vector3::new(0.0, 0.2, 0.0)),
            ),
            WorldToCamera::from_parts(
                Vector3::new(-0.2, 0.4, 0.1),
                Rotation3::from_scaled_axis(Vector3::new(0.1, -0.1, 0.05)),
            ),
        ];
        let pairs = poses.map(|pose| (pose, pose.transform(point).bearing()));

        let dlt = BearingDltTriangulator::new().triangulate_observations(pairs.into_iter());
        let midpoint =
            BearingMidpointTriangulator::new().triangulate_observations(pairs.into_iter());
        assert!(dlt.valid);
        assert!(midpoint.valid);
        let expected = point.point().unwrap().coords;
        let dlt = dlt.point.unwrap().point().unwrap().coords;
        let midpoint = midpoint.point.unwrap().point().unwrap().coords;
        assert!((dlt - expected).norm() < 1e-6);
        assert!((midpoint - expected).norm() < 1e-6);
    }

    #[test]
    fn rejected_solve_still_reports_best_effort_point() {
        // Demand more parallax than the geometry has; the point is still returned
        // for diagnostics but flagged invalid.
        let result = BearingMidpointTriangulator::new()
            .min_ray_angle(80.0f64.to_radians())
            .triangulate_observations(baseline_pair().into_iter());
        assert!(!result.valid);
        let point = result.point.unwrap().point().unwrap();
        assert!((point.coords - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn threshold_tightening_never_accepts_more() {
        let attempt = |min_ray_angle: f64, max_reprojection_error: f64| {
            BearingMidpointTriangulator::new()
                .min_ray_angle(min_ray_angle)
                .max_reprojection_error(max_reprojection_error)
                .triangulate_observations(baseline_pair().into_iter())
                .valid
        };
        // The pair subtends 45 degrees with zero noise.
        assert!(attempt(2.0f64.to_radians(), 0.01));
        // Loosening a passing configuration keeps it passing.
        assert!(attempt(1.0f64.to_radians(), 0.1));
        // Tightening past the geometry fails it, and further tightening keeps failing.
        assert!(!attempt(50.0f64.to_radians(), 0.01));
        assert!(!attempt(60.0f64.to_radians(), 0.005));
    }

    #[test]
    fn cheirality_rejects_point_behind_cameras() {
        // Rays that diverge behind the cameras: each camera looks away from the
        // other's line of sight, so the least-squares point lands behind them.
        let pairs = [
            (
                WorldToCamera::identity(),
                bearing(Vector3::new(-0.5, 0.0, 1.0)).unwrap(),
            ),
            (
                WorldToCamera::from_parts(Vector3::new(-1.0, 0.0, 0.0), Rotation3::identity()),
                bearing(Vector3::new(0.5, 0.0, 1.0)).unwrap(),
            ),
        ];
        let result = BearingMidpointTriangulator::new()
            .min_ray_angle(2.0f64.to_radians())
            .triangulate_observations(pairs.into_iter());
        assert!(!result.valid);
    }
}
