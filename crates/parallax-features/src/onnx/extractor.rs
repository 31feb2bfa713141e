use std::path::PathBuf;

use ort::session::Session;

use crate::device::Device;
use crate::error::FeatureError;
use crate::features::ImageFeatures;
use crate::onnx::{build_session, image_to_nchw};
use crate::FeatureDetector;
use parallax_image::Image;

/// Builder for the learned keypoint extractor.
pub struct OnnxExtractorBuilder {
    /// Path to the detector ONNX export.
    pub model_path: PathBuf,
    /// Ceiling on the number of keypoints kept per image.
    pub max_keypoints: usize,
    /// Number of threads to use for inference.
    pub num_threads: usize,
    /// Compute device the session is placed on.
    pub device: Device,
}

impl OnnxExtractorBuilder {
    /// Creates a new builder with default settings for the given model.
    pub fn new(model_path: PathBuf) -> Self {
        Self {
            model_path,
            max_keypoints: 2048,
            num_threads: 4,
            device: Device::auto(),
        }
    }

    /// Sets the keypoint ceiling.
    pub fn with_max_keypoints(mut self, max_keypoints: usize) -> Self {
        self.max_keypoints = max_keypoints;
        self
    }

    /// Sets the number of threads to use for inference.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Sets the compute device.
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Builds the extractor, loading the model onto the device.
    pub fn build(self) -> Result<OnnxExtractor, FeatureError> {
        let session = build_session(&self.model_path, self.num_threads, self.device)?;
        Ok(OnnxExtractor {
            session,
            max_keypoints: self.max_keypoints,
        })
    }
}

/// Learned keypoint extractor backed by an ONNX export.
///
/// Expects a detector of the ALIKED family: input `image` of shape
/// `[1, 3, H, W]` with RGB values in `[0, 1]`, outputs `keypoints`
/// `[1, N, 2]` in pixel coordinates, `descriptors` `[1, N, D]` and
/// `scores` `[1, N]`. Deterministic for fixed weights, input and
/// device, up to backend floating-point differences.
pub struct OnnxExtractor {
    session: Session,
    max_keypoints: usize,
}

impl FeatureDetector for OnnxExtractor {
    fn detect(&self, image: &Image<u8, 3>) -> Result<ImageFeatures, FeatureError> {
        let input = image_to_nchw(image)?;

        let outputs = self.session.run(ort::inputs!["image" => input]?)?;

        let (kpts_shape, kpts) = outputs["keypoints"].try_extract_raw_tensor::<f32>()?;
        let (desc_shape, desc) = outputs["descriptors"].try_extract_raw_tensor::<f32>()?;
        let (score_shape, scores) = outputs["scores"].try_extract_raw_tensor::<f32>()?;

        // batch of one in, batch of one out; strip it and validate the
        // remaining ranks agree on the keypoint count
        if kpts_shape.len() != 3 || kpts_shape[0] != 1 || kpts_shape[2] != 2 {
            return Err(FeatureError::UnexpectedOutputShape {
                name: "keypoints",
                shape: kpts_shape.to_vec(),
            });
        }
        let num_keypoints = kpts_shape[1] as usize;

        if desc_shape.len() != 3 || desc_shape[0] != 1 || desc_shape[1] as usize != num_keypoints {
            return Err(FeatureError::UnexpectedOutputShape {
                name: "descriptors",
                shape: desc_shape.to_vec(),
            });
        }
        let descriptor_dim = desc_shape[2] as usize;

        if score_shape.len() != 2 || score_shape[0] != 1 || score_shape[1] as usize != num_keypoints
        {
            return Err(FeatureError::UnexpectedOutputShape {
                name: "scores",
                shape: score_shape.to_vec(),
            });
        }

        let keypoints = kpts
            .chunks_exact(2)
            .map(|chunk| [chunk[0], chunk[1]])
            .collect::<Vec<_>>();

        let mut features = ImageFeatures::new(
            keypoints,
            desc.to_vec(),
            descriptor_dim,
            scores.to_vec(),
            image.size(),
        )?;
        features.retain_top_k(self.max_keypoints);

        log::debug!(
            "extracted {} keypoints (dim {})",
            features.len(),
            features.descriptor_dim()
        );

        Ok(features)
    }
}
