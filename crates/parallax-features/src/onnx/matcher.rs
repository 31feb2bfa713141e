use std::path::PathBuf;

use ort::session::Session;

use crate::device::Device;
use crate::error::FeatureError;
use crate::features::{ImageFeatures, MatchSet};
use crate::onnx::build_session;
use crate::FeatureMatcher;

/// Builder for the learned feature matcher.
pub struct OnnxMatcherBuilder {
    /// Path to the matcher ONNX export.
    pub model_path: PathBuf,
    /// Number of threads to use for inference.
    pub num_threads: usize,
    /// Compute device the session is placed on.
    pub device: Device,
}

impl OnnxMatcherBuilder {
    /// Creates a new builder with default settings for the given model.
    pub fn new(model_path: PathBuf) -> Self {
        Self {
            model_path,
            num_threads: 4,
            device: Device::auto(),
        }
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

    /// Builds the matcher, loading the model onto the device.
    pub fn build(self) -> Result<OnnxMatcher, FeatureError> {
        let session = build_session(&self.model_path, self.num_threads, self.device)?;
        Ok(OnnxMatcher { session })
    }
}

/// Learned feature matcher backed by an ONNX export.
///
/// Expects a matcher of the LightGlue family, which attends over both
/// keypoint sets at once instead of scoring descriptor pairs in
/// isolation. Inputs: `kpts0` / `kpts1` of shape `[1, N, 2]` with
/// coordinates normalized to `[-1, 1]` by the image size, and `desc0` /
/// `desc1` of shape `[1, N, D]`. Outputs: `matches` `[1, M, 2]` int64
/// index pairs and `mscores` `[1, M]` confidences. The exported weights
/// must correspond to the detector family producing the descriptors.
pub struct OnnxMatcher {
    session: Session,
}

impl FeatureMatcher for OnnxMatcher {
    fn match_features(
        &self,
        feats0: &ImageFeatures,
        feats1: &ImageFeatures,
    ) -> Result<MatchSet, FeatureError> {
        if feats0.descriptor_dim() != feats1.descriptor_dim() {
            return Err(FeatureError::DescriptorDimMismatch(
                feats0.descriptor_dim(),
                feats1.descriptor_dim(),
            ));
        }

        // no keypoints on either side means no overlap to search
        if feats0.is_empty() || feats1.is_empty() {
            return Ok(MatchSet::default());
        }

        let dim = feats0.descriptor_dim();
        let kpts0 =
            ort::value::Tensor::from_array(([1usize, feats0.len(), 2], normalized_keypoints(feats0)))?;
        let kpts1 =
            ort::value::Tensor::from_array(([1usize, feats1.len(), 2], normalized_keypoints(feats1)))?;
        let desc0 = ort::value::Tensor::from_array((
            [1usize, feats0.len(), dim],
            feats0.descriptors().to_vec(),
        ))?;
        let desc1 = ort::value::Tensor::from_array((
            [1usize, feats1.len(), dim],
            feats1.descriptors().to_vec(),
        ))?;

        let outputs = self.session.run(ort::inputs![
            "kpts0" => kpts0,
            "kpts1" => kpts1,
            "desc0" => desc0,
            "desc1" => desc1,
        ]?)?;

        let (match_shape, match_data) = outputs["matches"].try_extract_raw_tensor::<i64>()?;
        let (score_shape, score_data) = outputs["mscores"].try_extract_raw_tensor::<f32>()?;

        // strip the batch dimension and validate the pair-list shape
        if match_shape.len() != 3 || match_shape[0] != 1 || match_shape[2] != 2 {
            return Err(FeatureError::UnexpectedOutputShape {
                name: "matches",
                shape: match_shape.to_vec(),
            });
        }
        let num_matches = match_shape[1] as usize;

        if score_shape.len() != 2 || score_shape[0] != 1 || score_shape[1] as usize != num_matches {
            return Err(FeatureError::UnexpectedOutputShape {
                name: "mscores",
                shape: score_shape.to_vec(),
            });
        }

        // every emitted pair must reference valid keypoints
        let mut indices = Vec::with_capacity(num_matches);
        for pair in match_data.chunks_exact(2) {
            let (i0, i1) = (pair[0], pair[1]);
            if i0 < 0 || i1 < 0 || i0 as usize >= feats0.len() || i1 as usize >= feats1.len() {
                return Err(FeatureError::MatchIndexOutOfBounds {
                    idx0: i0,
                    idx1: i1,
                    len0: feats0.len(),
                    len1: feats1.len(),
                });
            }
            indices.push((i0 as usize, i1 as usize));
        }

        log::debug!("matched {} correspondences", indices.len());

        MatchSet::new(indices, score_data.to_vec())
    }
}

/// Keypoints normalized to [-1, 1] by the image size, flattened for the
/// model input. The matcher was trained on coordinates centered on the
/// image and scaled by half its larger dimension.
fn normalized_keypoints(feats: &ImageFeatures) -> Vec<f32> {
    let w = feats.image_size().width as f32;
    let h = feats.image_size().height as f32;
    let half = 0.5 * w.max(h);
    let (cx, cy) = (0.5 * w, 0.5 * h);

    feats
        .keypoints()
        .iter()
        .flat_map(|kp| [(kp[0] - cx) / half, (kp[1] - cy) / half])
        .collect()
}
