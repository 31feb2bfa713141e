#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Compute device selection.
pub mod device;

/// Error types for feature extraction and matching.
pub mod error;

/// Keypoint, descriptor and correspondence containers.
pub mod features;

/// Brute-force descriptor matching.
pub mod matcher;

/// ONNX-backed learned extractor and matcher.
pub mod onnx;

pub use crate::device::Device;
pub use crate::error::FeatureError;
pub use crate::features::{ImageFeatures, MatchSet};
pub use crate::matcher::BruteForceMatcher;
pub use crate::onnx::{OnnxExtractor, OnnxExtractorBuilder, OnnxMatcher, OnnxMatcherBuilder};

use parallax_image::Image;

/// A keypoint detector and descriptor extractor for a single image.
///
/// Implementations produce up to a configured maximum number of
/// keypoints with descriptors suitable for matching. Detector families
/// are swappable behind this trait without touching the downstream
/// geometry or visualization stages.
pub trait FeatureDetector {
    /// Detect keypoints and compute their descriptors.
    fn detect(&self, image: &Image<u8, 3>) -> Result<ImageFeatures, FeatureError>;
}

/// A matcher producing correspondences between two keypoint sets.
///
/// The two sets may have different cardinalities; a matcher may emit
/// zero correspondences when no image overlap is found. Every emitted
/// index pair references valid positions in the input sets.
pub trait FeatureMatcher {
    /// Match two feature sets into a correspondence set.
    fn match_features(
        &self,
        feats0: &ImageFeatures,
        feats1: &ImageFeatures,
    ) -> Result<MatchSet, FeatureError>;
}
