use parallax_image::ImageSize;

use crate::error::FeatureError;

/// Keypoints, descriptors and detection scores for one image.
///
/// Keypoint coordinates are in pixel space (x right, y down). The
/// descriptor buffer is flat row-major: descriptor `i` occupies
/// `[i * dim, (i + 1) * dim)`. The per-keypoint buffers always agree in
/// length; this is validated at construction.
#[derive(Clone, Debug)]
pub struct ImageFeatures {
    keypoints: Vec<[f32; 2]>,
    descriptors: Vec<f32>,
    descriptor_dim: usize,
    scores: Vec<f32>,
    image_size: ImageSize,
}

impl ImageFeatures {
    /// Create a feature set, validating that the buffers agree.
    pub fn new(
        keypoints: Vec<[f32; 2]>,
        descriptors: Vec<f32>,
        descriptor_dim: usize,
        scores: Vec<f32>,
        image_size: ImageSize,
    ) -> Result<Self, FeatureError> {
        if scores.len() != keypoints.len() {
            return Err(FeatureError::LengthMismatch(keypoints.len(), scores.len()));
        }
        if descriptors.len() != keypoints.len() * descriptor_dim {
            return Err(FeatureError::LengthMismatch(
                keypoints.len() * descriptor_dim,
                descriptors.len(),
            ));
        }
        Ok(Self {
            keypoints,
            descriptors,
            descriptor_dim,
            scores,
            image_size,
        })
    }

    /// Number of keypoints.
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Whether the set contains no keypoints.
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Keypoint coordinates in pixel space.
    pub fn keypoints(&self) -> &[[f32; 2]] {
        &self.keypoints
    }

    /// Per-keypoint detection scores.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Descriptor dimensionality.
    pub fn descriptor_dim(&self) -> usize {
        self.descriptor_dim
    }

    /// The flat descriptor buffer.
    pub fn descriptors(&self) -> &[f32] {
        &self.descriptors
    }

    /// The descriptor of keypoint `i`.
    pub fn descriptor(&self, i: usize) -> &[f32] {
        &self.descriptors[i * self.descriptor_dim..(i + 1) * self.descriptor_dim]
    }

    /// Size of the image the features were detected on.
    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Keep only the `k` highest-scoring keypoints, preserving the
    /// original detection order of the survivors.
    pub fn retain_top_k(&mut self, k: usize) {
        if self.len() <= k {
            return;
        }
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.scores[b]
                .partial_cmp(&self.scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut keep = vec![false; self.len()];
        for &i in order.iter().take(k) {
            keep[i] = true;
        }

        let dim = self.descriptor_dim;
        let mut keypoints = Vec::with_capacity(k);
        let mut descriptors = Vec::with_capacity(k * dim);
        let mut scores = Vec::with_capacity(k);
        for i in 0..self.keypoints.len() {
            if keep[i] {
                keypoints.push(self.keypoints[i]);
                descriptors.extend_from_slice(&self.descriptors[i * dim..(i + 1) * dim]);
                scores.push(self.scores[i]);
            }
        }
        self.keypoints = keypoints;
        self.descriptors = descriptors;
        self.scores = scores;
    }
}

/// Correspondences between two keypoint sets.
///
/// Each entry pairs an index into the first set with an index into the
/// second, with an associated confidence. May be empty when the images
/// do not overlap.
#[derive(Clone, Debug, Default)]
pub struct MatchSet {
    indices: Vec<(usize, usize)>,
    scores: Vec<f32>,
}

impl MatchSet {
    /// Create a correspondence set, validating that indices and scores
    /// agree in length.
    pub fn new(indices: Vec<(usize, usize)>, scores: Vec<f32>) -> Result<Self, FeatureError> {
        if indices.len() != scores.len() {
            return Err(FeatureError::LengthMismatch(indices.len(), scores.len()));
        }
        Ok(Self { indices, scores })
    }

    /// Number of correspondences.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the set contains no correspondences.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The index pairs, `(index into set 0, index into set 1)`.
    pub fn indices(&self) -> &[(usize, usize)] {
        &self.indices
    }

    /// Per-correspondence confidence scores.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Check that every index pair is valid for keypoint sets of the
    /// given sizes.
    pub fn validate(&self, len0: usize, len1: usize) -> Result<(), FeatureError> {
        for &(i0, i1) in &self.indices {
            if i0 >= len0 || i1 >= len1 {
                return Err(FeatureError::MatchIndexOutOfBounds {
                    idx0: i0 as i64,
                    idx1: i1 as i64,
                    len0,
                    len1,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> ImageSize {
        ImageSize {
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn features_new_validates_lengths() {
        let res = ImageFeatures::new(
            vec![[0.0, 0.0], [1.0, 1.0]],
            vec![0.0; 2 * 4],
            4,
            vec![0.5], // one score too few
            size(),
        );
        assert!(matches!(res, Err(FeatureError::LengthMismatch(2, 1))));

        let res = ImageFeatures::new(
            vec![[0.0, 0.0], [1.0, 1.0]],
            vec![0.0; 7], // not 2 * 4
            4,
            vec![0.5, 0.6],
            size(),
        );
        assert!(matches!(res, Err(FeatureError::LengthMismatch(8, 7))));
    }

    #[test]
    fn features_descriptor_slicing() -> Result<(), FeatureError> {
        let feats = ImageFeatures::new(
            vec![[0.0, 0.0], [1.0, 1.0]],
            vec![1.0, 2.0, 3.0, 4.0],
            2,
            vec![0.9, 0.8],
            size(),
        )?;
        assert_eq!(feats.descriptor(0), &[1.0, 2.0]);
        assert_eq!(feats.descriptor(1), &[3.0, 4.0]);
        Ok(())
    }

    #[test]
    fn features_retain_top_k_keeps_order() -> Result<(), FeatureError> {
        let mut feats = ImageFeatures::new(
            vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]],
            vec![0.0, 1.0, 2.0, 3.0],
            1,
            vec![0.1, 0.9, 0.3, 0.8],
            size(),
        )?;
        feats.retain_top_k(2);
        // keypoints 1 and 3 survive, in original order
        assert_eq!(feats.keypoints(), &[[1.0, 0.0], [3.0, 0.0]]);
        assert_eq!(feats.scores(), &[0.9, 0.8]);
        assert_eq!(feats.descriptors(), &[1.0, 3.0]);
        Ok(())
    }

    #[test]
    fn match_set_validate_bounds() -> Result<(), FeatureError> {
        let matches = MatchSet::new(vec![(0, 1), (2, 0)], vec![0.9, 0.8])?;
        assert!(matches.validate(3, 2).is_ok());
        assert!(matches!(
            matches.validate(2, 2),
            Err(FeatureError::MatchIndexOutOfBounds { .. })
        ));
        Ok(())
    }
}
