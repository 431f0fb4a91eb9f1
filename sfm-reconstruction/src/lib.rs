//! Track-level triangulation orchestration.
//!
//! A track is the set of observations across images believed to depict one physical
//! point. This crate stores tracks and the reconstruction they triangulate into
//! (cameras, posed shots, committed points), and drives the solvers from `sfm-geom`
//! one track at a time: gather the posed observations, turn measurements into
//! bearings through the camera models, dispatch to the two-ray or multi-view
//! solver, validate, and commit the accepted point.
//!
//! Triangulating a track is pure except for the final commit, so tracks are
//! independent units of work. [`TrackTriangulator::triangulate_all`] processes them
//! sequentially; with the `rayon` feature,
//! [`TrackTriangulator::triangulate_all_par`] solves tracks in parallel and commits
//! the accepted points serially.

mod settings;

pub use settings::*;

use log::{debug, info};
use sfm_camera::Camera;
use sfm_core::{
    nalgebra::{Point3, UnitVector3},
    CameraModel, GeometryError, KeyPoint, Projective, Triangulation,
    TriangulatorObservations, WorldPoint, WorldToCamera,
};
use sfm_geom::triangulation::{
    triangulate_two_bearings_midpoint, validate_observations, world_ray,
    BearingDltTriangulator, BearingMidpointTriangulator,
};
use std::collections::BTreeMap;
use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Identifier of an image, assigned by the external feature matcher.
pub type ImageId = String;
/// Identifier of a track, assigned by the external feature matcher.
pub type TrackId = String;

/// Why a track could not be triangulated at all.
///
/// Geometric rejection (insufficient parallax, excessive reprojection error,
/// failed cheirality) is not represented here; it is an ordinary `Ok(false)`
/// outcome of [`TrackTriangulator::triangulate`]. These errors abort the one
/// offending track and must never take down a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// Fewer than two observations of the track have a posed image.
    #[error("track {track} has {actual} posed observations but at least {required} are required")]
    InsufficientRays {
        track: TrackId,
        required: usize,
        actual: usize,
    },
    /// An observation produced a degenerate bearing.
    #[error("track {track} observation on image {image} is degenerate")]
    DegenerateObservation {
        track: TrackId,
        image: ImageId,
        #[source]
        source: GeometryError,
    },
}

/// A single 2d measurement of a track on one image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Observation {
    /// The image the measurement was made on.
    pub image: ImageId,
    /// The measurement, in the coordinate convention of the image's camera model.
    pub pixel: KeyPoint,
    /// Color sampled at the measurement, carried through to the committed point.
    pub color: Option<[u8; 3]>,
    /// Index of the feature within the image.
    pub feature: usize,
}

impl Observation {
    pub fn new(image: impl Into<ImageId>, pixel: KeyPoint, feature: usize) -> Self {
        Self {
            image: image.into(),
            pixel,
            color: None,
            feature,
        }
    }

    /// Attach a sampled color to the observation.
    #[must_use]
    pub fn color(self, color: [u8; 3]) -> Self {
        Self {
            color: Some(color),
            ..self
        }
    }
}

/// Append-only store of the observations of every track.
///
/// Produced by feature matching upstream; triangulation only reads it.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Tracks {
    observations: BTreeMap<TrackId, Vec<Observation>>,
}

impl Tracks {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_observation(&mut self, track: impl Into<TrackId>, observation: Observation) {
        self.observations
            .entry(track.into())
            .or_default()
            .push(observation);
    }

    /// All observations of a track, empty when the track is unknown.
    pub fn observations_of_track(&self, track: &str) -> &[Observation] {
        self.observations.get(track).map_or(&[], Vec::as_slice)
    }

    /// Track identifiers in deterministic (sorted) order.
    pub fn track_ids(&self) -> impl Iterator<Item = &TrackId> {
        self.observations.keys()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// A posed image within a reconstruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Shot {
    /// Name of the camera this image was taken with.
    pub camera: String,
    /// Pose of the world relative to this image's camera.
    pub pose: WorldToCamera,
}

impl Shot {
    pub fn new(camera: impl Into<String>, pose: WorldToCamera) -> Self {
        Self {
            camera: camera.into(),
            pose,
        }
    }
}

/// A triangulated 3d point together with the observations that support it.
///
/// Only ever created whole: either a solve passes validation and the point is
/// committed with its full observation list, or nothing is written.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ReconstructedPoint {
    pub coordinates: Point3<f64>,
    pub observations: Vec<Observation>,
}

/// The cameras, posed shots, and committed points of one reconstruction.
///
/// Triangulation reads the cameras and shots and writes only the point collection,
/// one track at a time.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Reconstruction {
    cameras: BTreeMap<String, Camera>,
    shots: BTreeMap<ImageId, Shot>,
    points: BTreeMap<TrackId, ReconstructedPoint>,
}

impl Reconstruction {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert_camera(&mut self, name: impl Into<String>, camera: impl Into<Camera>) {
        self.cameras.insert(name.into(), camera.into());
    }

    pub fn insert_shot(&mut self, image: impl Into<ImageId>, shot: Shot) {
        self.shots.insert(image.into(), shot);
    }

    pub fn shot(&self, image: &str) -> Option<&Shot> {
        self.shots.get(image)
    }

    /// The pose of an image, if it has been posed in this reconstruction.
    pub fn pose(&self, image: &str) -> Option<WorldToCamera> {
        self.shots.get(image).map(|shot| shot.pose)
    }

    /// The camera model of an image, if the image is posed and its camera known.
    pub fn camera_of(&self, image: &str) -> Option<&Camera> {
        self.cameras.get(&self.shots.get(image)?.camera)
    }

    /// Commits a point for a track, replacing any prior entry.
    pub fn set_point(&mut self, track: impl Into<TrackId>, point: ReconstructedPoint) {
        self.points.insert(track.into(), point);
    }

    /// Removes a committed point, for re-triangulation under new thresholds.
    pub fn remove_point(&mut self, track: &str) -> Option<ReconstructedPoint> {
        self.points.remove(track)
    }

    pub fn point(&self, track: &str) -> Option<&ReconstructedPoint> {
        self.points.get(track)
    }

    pub fn points(&self) -> &BTreeMap<TrackId, ReconstructedPoint> {
        &self.points
    }
}

/// Outcome counts of a batch triangulation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangulationReport {
    /// Tracks whose point was committed.
    pub triangulated: usize,
    /// Tracks rejected by geometric validation.
    pub rejected: usize,
    /// Tracks skipped before solving (too few posed observations, degenerate data).
    pub skipped: usize,
}

/// Triangulates tracks into a reconstruction.
///
/// Borrows the track store; the reconstruction is passed per call so one
/// triangulator can serve several reconstructions of the same track set.
pub struct TrackTriangulator<'a> {
    tracks: &'a Tracks,
    settings: TriangulationSettings,
}

impl<'a> TrackTriangulator<'a> {
    pub fn new(tracks: &'a Tracks, settings: TriangulationSettings) -> Self {
        Self { tracks, settings }
    }

    /// Triangulates one track and commits the point on success.
    ///
    /// Returns `Ok(true)` when a point was committed, `Ok(false)` when the solve
    /// ran but failed geometric validation (the reconstruction is left unchanged),
    /// and an error when the track could not be solved at all. Failure is a normal,
    /// expected outcome for poorly conditioned tracks.
    pub fn triangulate(
        &self,
        reconstruction: &mut Reconstruction,
        track: &str,
    ) -> Result<bool, TrackError> {
        match self.solve(reconstruction, track)? {
            Some(point) => {
                reconstruction.set_point(track, point);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Solves one track without committing anything.
    ///
    /// This is the pure part of [`TrackTriangulator::triangulate`]; it only reads
    /// the reconstruction.
    pub fn solve(
        &self,
        reconstruction: &Reconstruction,
        track: &str,
    ) -> Result<Option<ReconstructedPoint>, TrackError> {
        let mut rays: Vec<(WorldToCamera, UnitVector3<f64>)> = Vec::new();
        let mut supports: Vec<Observation> = Vec::new();
        for observation in self.tracks.observations_of_track(track) {
            // Observations on unposed images do not constrain the point.
            let (pose, camera) = match (
                reconstruction.pose(&observation.image),
                reconstruction.camera_of(&observation.image),
            ) {
                (Some(pose), Some(camera)) => (pose, camera),
                _ => {
                    debug!(
                        "track {} observation on unposed image {} skipped",
                        track, observation.image
                    );
                    continue;
                }
            };
            let bearing =
                camera
                    .calibrate(observation.pixel)
                    .map_err(|source| TrackError::DegenerateObservation {
                        track: track.to_owned(),
                        image: observation.image.clone(),
                        source,
                    })?;
            rays.push((pose, bearing));
            supports.push(observation.clone());
        }

        if rays.len() < 2 {
            return Err(TrackError::InsufficientRays {
                track: track.to_owned(),
                required: 2,
                actual: rays.len(),
            });
        }
        if rays.len() < self.settings.min_triangulated_rays {
            debug!(
                "track {} has {} rays, below the target of {}",
                track,
                rays.len(),
                self.settings.min_triangulated_rays
            );
        }

        let result = if rays.len() == 2 {
            self.solve_two_rays(&rays)
        } else {
            self.solve_multi_view(&rays)
        };

        Ok(result.ok().and_then(|point| point.point()).map(|point| {
            ReconstructedPoint {
                coordinates: point,
                observations: supports,
            }
        }))
    }

    /// Closed-form two-ray path, validated with the same thresholds as the
    /// multi-view solvers.
    fn solve_two_rays(&self, rays: &[(WorldToCamera, UnitVector3<f64>)]) -> Triangulation {
        let (o1, b1) = world_ray(rays[0].0, rays[0].1);
        let (o2, b2) = world_ray(rays[1].0, rays[1].1);
        let point = match triangulate_two_bearings_midpoint(o1, b1, o2, b2) {
            Some(point) => WorldPoint::from_point(point),
            None => return Triangulation::failed(),
        };
        if validate_observations(
            point,
            rays.iter().copied(),
            self.settings.min_ray_angle,
            self.settings.max_reprojection_error,
        ) {
            Triangulation::accepted(point)
        } else {
            Triangulation::rejected(point)
        }
    }

    fn solve_multi_view(&self, rays: &[(WorldToCamera, UnitVector3<f64>)]) -> Triangulation {
        match self.settings.method {
            TriangulationMethod::Dlt => BearingDltTriangulator::new()
                .min_ray_angle(self.settings.min_ray_angle)
                .max_reprojection_error(self.settings.max_reprojection_error)
                .triangulate_observations(rays.iter().copied()),
            TriangulationMethod::Midpoint => BearingMidpointTriangulator::new()
                .min_ray_angle(self.settings.min_ray_angle)
                .max_reprojection_error(self.settings.max_reprojection_error)
                .triangulate_observations(rays.iter().copied()),
        }
    }

    /// Triangulates every track in the store, isolating failures to the offending
    /// track.
    pub fn triangulate_all(&self, reconstruction: &mut Reconstruction) -> TriangulationReport {
        let mut report = TriangulationReport::default();
        for track in self.tracks.track_ids() {
            match self.triangulate(reconstruction, track) {
                Ok(true) => report.triangulated += 1,
                Ok(false) => {
                    debug!("track {} rejected by geometric validation", track);
                    report.rejected += 1;
                }
                Err(error) => {
                    debug!("skipping track {}: {}", track, error);
                    report.skipped += 1;
                }
            }
        }
        info!(
            "triangulated {} of {} tracks ({} rejected, {} skipped)",
            report.triangulated,
            self.tracks.len(),
            report.rejected,
            report.skipped
        );
        report
    }

    /// Like [`TrackTriangulator::triangulate_all`], but solves tracks in parallel.
    ///
    /// The solve is read-only over the reconstruction; only the commit of accepted
    /// points mutates it, and that happens serially afterwards.
    #[cfg(feature = "rayon")]
    pub fn triangulate_all_par(&self, reconstruction: &mut Reconstruction) -> TriangulationReport {
        use rayon::prelude::*;

        let outcomes: Vec<(&TrackId, Result<Option<ReconstructedPoint>, TrackError>)> = self
            .tracks
            .track_ids()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|track| (track, self.solve(reconstruction, track)))
            .collect();

        let mut report = TriangulationReport::default();
        for (track, outcome) in outcomes {
            match outcome {
                Ok(Some(point)) => {
                    reconstruction.set_point(track.clone(), point);
                    report.triangulated += 1;
                }
                Ok(None) => {
                    debug!("track {} rejected by geometric validation", track);
                    report.rejected += 1;
                }
                Err(error) => {
                    debug!("skipping track {}: {}", track, error);
                    report.skipped += 1;
                }
            }
        }
        info!(
            "triangulated {} of {} tracks ({} rejected, {} skipped)",
            report.triangulated,
            self.tracks.len(),
            report.rejected,
            report.skipped
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfm_core::nalgebra::Point2;

    #[test]
    fn unknown_track_has_no_observations() {
        let tracks = Tracks::new();
        assert!(tracks.observations_of_track("nope").is_empty());
    }

    #[test]
    fn set_point_overwrites() {
        let mut reconstruction = Reconstruction::new();
        let first = ReconstructedPoint {
            coordinates: Point3::new(1.0, 2.0, 3.0),
            observations: vec![],
        };
        let second = ReconstructedPoint {
            coordinates: Point3::new(4.0, 5.0, 6.0),
            observations: vec![Observation::new(
                "im1",
                KeyPoint(Point2::new(0.0, 0.0)),
                0,
            )],
        };
        reconstruction.set_point("1", first);
        reconstruction.set_point("1", second.clone());
        assert_eq!(reconstruction.points().len(), 1);
        assert_eq!(reconstruction.point("1"), Some(&second));
    }
}
