use crate::GeometryError;
use nalgebra::{UnitVector3, Vector3};

/// Vectors shorter than this cannot be normalized into a bearing.
const MIN_BEARING_NORM: f64 = 1e-12;

/// Normalizes a raw direction vector into a bearing.
///
/// Fails with [`GeometryError::DegenerateVector`] when the norm of `direction` is
/// near zero, since the direction of such a vector is meaningless.
pub fn bearing(direction: Vector3<f64>) -> Result<UnitVector3<f64>, GeometryError> {
    let norm = direction.norm();
    if norm < MIN_BEARING_NORM {
        return Err(GeometryError::DegenerateVector);
    }
    Ok(UnitVector3::new_unchecked(direction / norm))
}

/// The angle between two bearings in radians, in the range `[0, π]`.
///
/// This is the parallax measure used throughout the workspace: rays with a near-zero
/// angle between them produce numerically unstable triangulations. Symmetric under
/// argument swap.
pub fn ray_angle(a: &UnitVector3<f64>, b: &UnitVector3<f64>) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    #[test]
    fn bearing_normalizes() {
        let b = bearing(Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((b.norm() - 1.0).abs() < 1e-12);
        assert!((b.z - 0.8).abs() < 1e-12);
    }

    #[test]
    fn bearing_rejects_zero_vector() {
        assert_eq!(
            bearing(Vector3::zeros()),
            Err(GeometryError::DegenerateVector)
        );
    }

    #[test]
    fn ray_angle_identities() {
        let b = bearing(Vector3::new(0.3, -0.2, 1.0)).unwrap();
        let c = bearing(Vector3::new(-1.0, 0.4, 0.5)).unwrap();
        assert!(ray_angle(&b, &b).abs() < 1e-8);
        assert!((ray_angle(&b, &UnitVector3::new_unchecked(-b.into_inner())) - PI).abs() < 1e-8);
        assert!((ray_angle(&b, &c) - ray_angle(&c, &b)).abs() < 1e-15);
    }
}
