#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera intrinsics.
pub mod camera;

/// Error types for pose estimation.
pub mod error;

/// Essential matrix estimation and decomposition.
pub mod essential;

/// Small fixed-size linear algebra helpers.
pub mod linalg;

/// Robust model estimation with RANSAC.
pub mod ransac;

/// Pose recovery from an essential matrix.
pub mod recover;

pub use crate::camera::PinholeIntrinsics;
pub use crate::error::PoseError;
pub use crate::essential::{
    decompose_essential, enforce_essential_constraints, essential_8point,
    essential_from_fundamental, sampson_distance,
};
pub use crate::ransac::{ransac_essential, RansacParams, RansacResult};
pub use crate::recover::{recover_pose, PoseEstimate};
