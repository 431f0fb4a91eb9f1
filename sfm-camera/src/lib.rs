//! Camera projection models for bearing-based triangulation.
//!
//! The triangulation solvers only ever see bearings; these models are the seam
//! where image measurements become bearings and back. Two projection families are
//! provided:
//!
//! * [`Perspective`] - the normalized pinhole model, measurements in pixels.
//! * [`Spherical`] - the equirectangular panorama model, measurements in
//!   normalized image coordinates.
//!
//! [`Camera`] dispatches between the families so storage layers need not be
//! generic over the model type.

use sfm_core::{
    bearing,
    nalgebra::{Point2, UnitVector3, Vector3},
    CameraModel, GeometryError, ImagePoint, KeyPoint,
};
use std::f64::consts::TAU;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A pinhole camera with square pixels and no distortion modeled.
///
/// Distortion correction is expected to happen upstream of this crate; the
/// triangulation layers only need the undistorted bearing.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Perspective {
    /// Focal length in pixels.
    pub focal: f64,
    /// Principal point in pixels.
    pub principal_point: Point2<f64>,
}

impl Perspective {
    pub fn new(focal: f64, principal_point: Point2<f64>) -> Self {
        Self {
            focal,
            principal_point,
        }
    }
}

impl CameraModel for Perspective {
    fn calibrate<P>(&self, point: P) -> Result<UnitVector3<f64>, GeometryError>
    where
        P: ImagePoint,
    {
        let point = point.image_point();
        bearing(Vector3::new(
            (point.x - self.principal_point.x) / self.focal,
            (point.y - self.principal_point.y) / self.focal,
            1.0,
        ))
    }

    fn uncalibrate(&self, bearing: UnitVector3<f64>) -> Option<KeyPoint> {
        // A bearing at or behind the image plane has no pixel.
        if bearing.z <= 0.0 {
            return None;
        }
        Some(KeyPoint(Point2::new(
            self.focal * bearing.x / bearing.z + self.principal_point.x,
            self.focal * bearing.y / bearing.z + self.principal_point.y,
        )))
    }
}

/// An equirectangular (360 degree panorama) camera.
///
/// Measurements are in normalized image coordinates: `x` spans one full turn of
/// longitude and `y` half a turn of latitude, both zero at the image center, which
/// looks down the camera's positive Z axis. Every bearing projects, so
/// `uncalibrate` never fails for this model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Spherical;

impl CameraModel for Spherical {
    fn calibrate<P>(&self, point: P) -> Result<UnitVector3<f64>, GeometryError>
    where
        P: ImagePoint,
    {
        let point = point.image_point();
        let longitude = point.x * TAU;
        let latitude = -point.y * TAU;
        Ok(UnitVector3::new_unchecked(Vector3::new(
            latitude.cos() * longitude.sin(),
            -latitude.sin(),
            latitude.cos() * longitude.cos(),
        )))
    }

    fn uncalibrate(&self, bearing: UnitVector3<f64>) -> Option<KeyPoint> {
        let longitude = bearing.x.atan2(bearing.z);
        let latitude = (-bearing.y).atan2(bearing.xz().norm());
        Some(KeyPoint(Point2::new(longitude / TAU, -latitude / TAU)))
    }
}

/// A camera of any supported projection family.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum Camera {
    Perspective(Perspective),
    Spherical(Spherical),
}

impl From<Perspective> for Camera {
    fn from(camera: Perspective) -> Self {
        Self::Perspective(camera)
    }
}

impl From<Spherical> for Camera {
    fn from(camera: Spherical) -> Self {
        Self::Spherical(camera)
    }
}

impl CameraModel for Camera {
    fn calibrate<P>(&self, point: P) -> Result<UnitVector3<f64>, GeometryError>
    where
        P: ImagePoint,
    {
        match self {
            Self::Perspective(camera) => camera.calibrate(point),
            Self::Spherical(camera) => camera.calibrate(point),
        }
    }

    fn uncalibrate(&self, bearing: UnitVector3<f64>) -> Option<KeyPoint> {
        match self {
            Self::Perspective(camera) => camera.uncalibrate(bearing),
            Self::Spherical(camera) => camera.uncalibrate(bearing),
        }
    }
}
