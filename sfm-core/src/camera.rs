use crate::{GeometryError, ImagePoint, KeyPoint};
use nalgebra::UnitVector3;

/// Allows conversion between a measurement on an image and the camera-frame bearing
/// of the projection out of the camera.
///
/// Implementations exist for different projection families (perspective, spherical)
/// and are the only place where the meaning of image coordinates is known. The
/// triangulation layers operate purely on bearings.
pub trait CameraModel {
    /// Extracts a bearing from a measurement on an image.
    ///
    /// The bearing's X axis points right, Y axis points down, and Z axis points
    /// forwards, in the camera's frame. Fails with
    /// [`GeometryError::DegenerateVector`] when the measurement cannot form a
    /// meaningful direction.
    fn calibrate<P>(&self, point: P) -> Result<UnitVector3<f64>, GeometryError>
    where
        P: ImagePoint;

    /// Extracts the image measurement corresponding to a camera-frame bearing.
    ///
    /// This operation is fallible since a bearing might not project into the image
    /// (for instance, a bearing behind a perspective camera).
    fn uncalibrate(&self, bearing: UnitVector3<f64>) -> Option<KeyPoint>;
}
