use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Point3, Unit, Vector3, Vector4};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This trait is implemented for homogeneous projective 3d coordinates.
pub trait Projective: From<Vector4<f64>> + Clone + Copy {
    /// Retrieve the homogeneous vector.
    ///
    /// No constraints are put on this vector; it is not normalized. Normalizing it
    /// produces an equivalent coordinate.
    fn homogeneous(self) -> Vector4<f64>;

    /// Create the coordinate from a homogeneous vector.
    fn from_homogeneous(homogeneous: Vector4<f64>) -> Self {
        homogeneous.into()
    }

    /// Retrieve the euclidean 3d point by dehomogenizing the coordinate.
    ///
    /// This may fail, as a homogeneous coordinate can exist at near-infinity,
    /// whereas a euclidean point cannot.
    fn point(self) -> Option<Point3<f64>> {
        Point3::from_homogeneous(self.homogeneous())
    }

    /// Convert a euclidean 3d point into homogeneous coordinates.
    fn from_point(point: Point3<f64>) -> Self {
        point.to_homogeneous().into()
    }

    /// Retrieve the normalized bearing of the coordinate.
    fn bearing(self) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.bearing_unnormalized())
    }

    /// Retrieve the unnormalized bearing of the coordinate.
    fn bearing_unnormalized(self) -> Vector3<f64> {
        self.homogeneous().xyz()
    }
}

/// A 3d point relative to a camera's optical center and orientation, where the
/// positive X axis is right, positive Y axis is down, and positive Z axis is forwards
/// from the optical center. A point in front of the camera has positive Z (depth).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraPoint(pub Vector4<f64>);

impl Projective for CameraPoint {
    fn homogeneous(self) -> Vector4<f64> {
        self.into()
    }
}

/// A 3d point in the reconstruction's world frame.
///
/// The unit of distance is whatever the reconstruction's poses were expressed in;
/// triangulation neither knows nor changes the scale of the world.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldPoint(pub Vector4<f64>);

impl Projective for WorldPoint {
    fn homogeneous(self) -> Vector4<f64> {
        self.into()
    }
}
