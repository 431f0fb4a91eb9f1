use thiserror::Error;

/// Hard numeric failures in the geometry layer.
///
/// Geometric rejection (insufficient parallax, excessive reprojection error, failed
/// cheirality) is not an error; it is reported through
/// [`Triangulation::valid`](crate::Triangulation). An error here indicates bad input
/// data and aborts processing of the offending track.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    /// A direction vector with a near-zero norm cannot be normalized into a bearing.
    #[error("cannot normalize a near-zero direction vector into a bearing")]
    DegenerateVector,
}
