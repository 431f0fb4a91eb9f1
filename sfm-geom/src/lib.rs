//! This crate contains the triangulation solvers for bearing-based
//! structure-from-motion.
//!
//! In this problem we know the pose of each camera and the bearing of the same
//! feature observed in each camera frame. We want to find the point all the rays
//! pass closest to, and to know whether that point can be trusted.
//!
//! Three solvers are provided:
//!
//! * [`triangulate_two_bearings_midpoint`](triangulation::triangulate_two_bearings_midpoint)
//!   closed-form intersection of exactly two rays.
//! * [`BearingDltTriangulator`](triangulation::BearingDltTriangulator) the Direct
//!   Linear Transform over any number of rays.
//! * [`BearingMidpointTriangulator`](triangulation::BearingMidpointTriangulator)
//!   least-squares closest point to any number of rays.
//!
//! The multi-view solvers validate their result (parallax, per-view reprojection
//! error, cheirality) and report a verdict rather than an error; see
//! [`sfm_core::Triangulation`].

pub mod triangulation;
