use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Allows the retrieval of the point on the image the measurement came from.
pub trait ImagePoint {
    /// Retrieves the point on the image.
    fn image_point(&self) -> Point2<f64>;
}

/// A 2d measurement on an image frame.
///
/// The coordinate convention is owned by the camera model that interprets the point:
/// pixel coordinates for a perspective camera, normalized image coordinates for a
/// spherical camera. Positive X is right and positive Y is down in either case.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint(pub Point2<f64>);

impl ImagePoint for KeyPoint {
    fn image_point(&self) -> Point2<f64> {
        self.0
    }
}
