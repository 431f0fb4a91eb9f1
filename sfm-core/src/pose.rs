use crate::{CameraPoint, Projective, WorldPoint};
use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{IsometryMatrix3, Matrix4, Point3, Rotation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented by the rigid transforms in this library:
///
/// * [`WorldToCamera`] - Transforms [`WorldPoint`] into [`CameraPoint`]
/// * [`CameraToWorld`] - Transforms [`CameraPoint`] into [`WorldPoint`]
pub trait Pose: From<IsometryMatrix3<f64>> + Clone + Copy {
    type InputPoint: Projective;
    type OutputPoint: Projective;
    type Inverse: Pose;

    /// Retrieve the isometry.
    fn isometry(self) -> IsometryMatrix3<f64>;

    /// Creates a pose with no change in position or orientation.
    fn identity() -> Self {
        IsometryMatrix3::identity().into()
    }

    /// Takes the inverse of the pose.
    fn inverse(self) -> Self::Inverse {
        self.isometry().inverse().into()
    }

    /// Create the pose from rotation and translation.
    fn from_parts(translation: Vector3<f64>, rotation: Rotation3<f64>) -> Self {
        IsometryMatrix3::from_parts(translation.into(), rotation).into()
    }

    /// Retrieve the homogeneous matrix.
    fn homogeneous(self) -> Matrix4<f64> {
        self.isometry().to_homogeneous()
    }

    /// Transform the given point to an output point.
    fn transform(self, input: Self::InputPoint) -> Self::OutputPoint {
        Projective::from_homogeneous(self.homogeneous() * input.homogeneous())
    }
}

/// A pose of the world relative to a camera. This maps [`WorldPoint`] into
/// [`CameraPoint`], changing an absolute position into a vector relative to
/// the camera.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldToCamera(pub IsometryMatrix3<f64>);

impl Pose for WorldToCamera {
    type InputPoint = WorldPoint;
    type OutputPoint = CameraPoint;
    type Inverse = CameraToWorld;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

impl WorldToCamera {
    /// The camera's optical center in world coordinates.
    ///
    /// Every bearing observed by this camera forms a ray with this point as its
    /// origin.
    pub fn optical_center(self) -> Point3<f64> {
        Point3::from(self.isometry().inverse().translation.vector)
    }
}

/// A pose of a camera relative to the world. This transforms camera points
/// (with depth as `z`) into world coordinates, and tells you where the camera
/// is located and oriented in the world.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToWorld(pub IsometryMatrix3<f64>);

impl Pose for CameraToWorld {
    type InputPoint = CameraPoint;
    type OutputPoint = WorldPoint;
    type Inverse = WorldToCamera;

    #[inline(always)]
    fn isometry(self) -> IsometryMatrix3<f64> {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optical_center_inverts_translation() {
        let pose = WorldToCamera::from_parts(Vector3::new(-1.0, 0.0, 0.0), Rotation3::identity());
        let center = pose.optical_center();
        assert!((center.coords - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn transform_round_trips_through_inverse() {
        let pose = WorldToCamera::from_parts(
            Vector3::new(0.2, -0.4, 1.0),
            Rotation3::from_scaled_axis(Vector3::new(0.1, 0.2, -0.1)),
        );
        let world = WorldPoint::from_point(Point3::new(0.3, 0.1, 2.0));
        let camera = pose.transform(world);
        let back = pose.inverse().transform(camera);
        assert!((world.point().unwrap() - back.point().unwrap()).norm() < 1e-12);
    }
}
