//! Two-view odometry pipeline.
//!
//! Composes the feature, matching and geometry stages into a single
//! sequential run over one image pair: extract, match, gather matched
//! point pairs, estimate the essential matrix with RANSAC and recover
//! the relative pose. Image loading and visualization stay with the
//! caller.

use glam::{DMat3, DVec2};

use parallax_features::{FeatureDetector, FeatureError, FeatureMatcher, ImageFeatures, MatchSet};
use parallax_image::Image;
use parallax_pose::{
    ransac_essential, recover_pose, PinholeIntrinsics, PoseError, PoseEstimate, RansacParams,
};

/// Errors surfaced by the odometry pipeline, one per failing stage.
#[derive(thiserror::Error, Debug)]
pub enum OdometryError {
    /// Feature extraction or matching failed.
    #[error("Feature stage error: {0}")]
    Feature(#[from] FeatureError),

    /// Geometry estimation failed. Recoverable per frame pair: the
    /// caller may treat this as "no pose" rather than aborting.
    #[error("Pose stage error: {0}")]
    Pose(#[from] PoseError),
}

/// Configuration for a pipeline run.
#[derive(Clone, Copy, Debug, Default)]
pub struct OdometryConfig {
    /// Camera intrinsics shared by both views.
    pub intrinsics: PinholeIntrinsics,
    /// RANSAC settings for essential matrix estimation.
    pub ransac: RansacParams,
}

/// Everything produced by one pipeline run.
#[derive(Clone, Debug)]
pub struct OdometryResult {
    /// Features detected on the first image.
    pub features0: ImageFeatures,
    /// Features detected on the second image.
    pub features1: ImageFeatures,
    /// Correspondences between the two feature sets.
    pub matches: MatchSet,
    /// Matched keypoint coordinates in the first image.
    pub points0: Vec<DVec2>,
    /// Matched keypoint coordinates in the second image, same length
    /// and order as `points0`.
    pub points1: Vec<DVec2>,
    /// Estimated essential matrix.
    pub essential: DMat3,
    /// Recovered relative pose with its refined inlier mask.
    pub pose: PoseEstimate,
}

impl OdometryResult {
    /// Number of correspondences surviving the refined inlier mask.
    pub fn num_inliers(&self) -> usize {
        self.pose.inliers.iter().filter(|&&b| b).count()
    }
}

/// The two-view odometry pipeline.
///
/// The detector and matcher are trait objects so detector families can
/// be swapped without touching the geometry stage; device selection and
/// model weights are fixed at construction of those stages, not ambient
/// state.
pub struct TwoViewOdometry {
    detector: Box<dyn FeatureDetector>,
    matcher: Box<dyn FeatureMatcher>,
    config: OdometryConfig,
}

impl TwoViewOdometry {
    /// Assemble a pipeline from its stages.
    pub fn new(
        detector: Box<dyn FeatureDetector>,
        matcher: Box<dyn FeatureMatcher>,
        config: OdometryConfig,
    ) -> Self {
        Self {
            detector,
            matcher,
            config,
        }
    }

    /// Run the pipeline on one image pair.
    ///
    /// Stages run strictly in sequence and the first failure terminates
    /// the run; there are no retries.
    pub fn run(
        &self,
        image0: &Image<u8, 3>,
        image1: &Image<u8, 3>,
    ) -> Result<OdometryResult, OdometryError> {
        let features0 = self.detector.detect(image0)?;
        let features1 = self.detector.detect(image1)?;
        log::info!(
            "detected {} / {} keypoints",
            features0.len(),
            features1.len()
        );

        let matches = self.matcher.match_features(&features0, &features1)?;
        log::info!("matched {} correspondences", matches.len());

        let (points0, points1) = gather_matched_points(&features0, &features1, &matches)?;

        let ransac = ransac_essential(
            &points0,
            &points1,
            &self.config.intrinsics,
            &self.config.ransac,
        )?;
        log::info!(
            "essential matrix consensus: {} / {} inliers",
            ransac.inlier_count,
            points0.len()
        );

        let pose = recover_pose(
            &ransac.model,
            &points0,
            &points1,
            &self.config.intrinsics,
            &ransac.inliers,
        )?;

        Ok(OdometryResult {
            features0,
            features1,
            matches,
            points0,
            points1,
            essential: ransac.model,
            pose,
        })
    }
}

/// Gather the matched keypoint coordinates into two equal-length point
/// sequences, `points0[i]` corresponding to `points1[i]`.
///
/// Every index pair is validated against the keypoint sets first, so an
/// out-of-contract matcher surfaces as an error rather than a panic.
pub fn gather_matched_points(
    features0: &ImageFeatures,
    features1: &ImageFeatures,
    matches: &MatchSet,
) -> Result<(Vec<DVec2>, Vec<DVec2>), FeatureError> {
    matches.validate(features0.len(), features1.len())?;

    let mut points0 = Vec::with_capacity(matches.len());
    let mut points1 = Vec::with_capacity(matches.len());
    for &(i0, i1) in matches.indices() {
        let kp0 = features0.keypoints()[i0];
        let kp1 = features1.keypoints()[i1];
        points0.push(DVec2::new(kp0[0] as f64, kp0[1] as f64));
        points1.push(DVec2::new(kp1[0] as f64, kp1[1] as f64));
    }

    Ok((points0, points1))
}
