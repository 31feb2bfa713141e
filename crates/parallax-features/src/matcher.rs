use crate::error::FeatureError;
use crate::features::{ImageFeatures, MatchSet};
use crate::FeatureMatcher;

/// Squared L2 distance between two float descriptors.
#[inline]
fn l2_distance_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

/// Brute-force nearest-descriptor matching.
///
/// For each descriptor in the first set, finds the nearest neighbor in
/// the second by L2 distance, optionally keeping only mutual nearest
/// neighbors and applying Lowe's ratio test. A classical baseline for
/// the learned matcher: it scores descriptor pairs in isolation, with
/// no global context across the keypoint sets.
#[derive(Clone, Copy, Debug)]
pub struct BruteForceMatcher {
    /// If set, discard matches with squared distance above this value.
    pub max_distance: Option<f32>,
    /// Keep only mutual nearest neighbors.
    pub cross_check: bool,
    /// If set, apply Lowe's ratio test (best / second-best < ratio).
    pub max_ratio: Option<f32>,
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        Self {
            max_distance: None,
            cross_check: true,
            max_ratio: None,
        }
    }
}

impl BruteForceMatcher {
    /// A matcher with mutual-nearest-neighbor filtering only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Lowe ratio threshold.
    pub fn with_max_ratio(mut self, max_ratio: f32) -> Self {
        self.max_ratio = Some(max_ratio);
        self
    }

    /// Set the maximum squared descriptor distance.
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }
}

impl FeatureMatcher for BruteForceMatcher {
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

        let m = feats0.len();
        let n = feats1.len();
        if m == 0 || n == 0 {
            return Ok(MatchSet::default());
        }

        // Forward pass: for each descriptor in set 0, find best and
        // second-best match in set 1.
        let mut fwd_best_j = vec![0usize; m];
        let mut fwd_best_dist = vec![f32::INFINITY; m];
        let mut fwd_second_dist = vec![f32::INFINITY; m];

        for i in 0..m {
            let d0 = feats0.descriptor(i);
            for j in 0..n {
                let dist = l2_distance_sq(d0, feats1.descriptor(j));
                if dist < fwd_best_dist[i] {
                    fwd_second_dist[i] = fwd_best_dist[i];
                    fwd_best_dist[i] = dist;
                    fwd_best_j[i] = j;
                } else if dist < fwd_second_dist[i] {
                    fwd_second_dist[i] = dist;
                }
            }
        }

        // Reverse pass (only if cross-check): for each descriptor in
        // set 1, find its best match in set 0.
        let rev_best_i = if self.cross_check {
            let mut rev = vec![0usize; n];
            let mut rev_dist = vec![f32::INFINITY; n];
            for i in 0..m {
                let d0 = feats0.descriptor(i);
                for j in 0..n {
                    let dist = l2_distance_sq(d0, feats1.descriptor(j));
                    if dist < rev_dist[j] {
                        rev_dist[j] = dist;
                        rev[j] = i;
                    }
                }
            }
            Some(rev)
        } else {
            None
        };

        // Build matches applying all filters in one pass.
        let mut indices = Vec::new();
        let mut scores = Vec::new();
        for i in 0..m {
            let j = fwd_best_j[i];
            let best_dist = fwd_best_dist[i];

            if let Some(max_dist) = self.max_distance {
                if best_dist > max_dist {
                    continue;
                }
            }

            if let Some(ref rev) = rev_best_i {
                if rev[j] != i {
                    continue;
                }
            }

            if let Some(ratio) = self.max_ratio {
                if ratio < 1.0 {
                    let second = fwd_second_dist[i];
                    let denom = if second == 0.0 { f32::EPSILON } else { second };
                    if best_dist / denom >= ratio {
                        continue;
                    }
                }
            }

            indices.push((i, j));
            scores.push(1.0 / (1.0 + best_dist));
        }

        MatchSet::new(indices, scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallax_image::ImageSize;

    fn size() -> ImageSize {
        ImageSize {
            width: 64,
            height: 64,
        }
    }

    fn features(descriptors: &[[f32; 2]]) -> ImageFeatures {
        let keypoints: Vec<[f32; 2]> = (0..descriptors.len())
            .map(|i| [i as f32, i as f32])
            .collect();
        let flat: Vec<f32> = descriptors.iter().flatten().copied().collect();
        let scores = vec![1.0; descriptors.len()];
        ImageFeatures::new(keypoints, flat, 2, scores, size()).unwrap()
    }

    #[test]
    fn mutual_nearest_neighbors() -> Result<(), FeatureError> {
        let feats0 = features(&[[0.0, 0.0], [10.0, 10.0], [20.0, 0.0]]);
        // set 1 holds close counterparts in shuffled order
        let feats1 = features(&[[10.1, 10.0], [0.1, 0.0], [20.0, 0.1]]);

        let matches = BruteForceMatcher::new().match_features(&feats0, &feats1)?;
        assert_eq!(matches.len(), 3);
        assert_eq!(matches.indices(), &[(0, 1), (1, 0), (2, 2)]);
        matches.validate(feats0.len(), feats1.len())?;
        Ok(())
    }

    #[test]
    fn cross_check_drops_one_sided_matches() -> Result<(), FeatureError> {
        // both descriptors in set 0 are closest to the single entry of
        // set 1, but only one of them is its mutual nearest neighbor
        let feats0 = features(&[[0.0, 0.0], [0.5, 0.0]]);
        let feats1 = features(&[[0.4, 0.0]]);

        let matches = BruteForceMatcher::new().match_features(&feats0, &feats1)?;
        assert_eq!(matches.indices(), &[(1, 0)]);
        Ok(())
    }

    #[test]
    fn ratio_test_rejects_ambiguous_matches() -> Result<(), FeatureError> {
        // two nearly equidistant candidates make the match ambiguous
        let feats0 = features(&[[0.0, 0.0]]);
        let feats1 = features(&[[1.0, 0.0], [1.05, 0.0]]);

        let matcher = BruteForceMatcher {
            cross_check: false,
            ..Default::default()
        }
        .with_max_ratio(0.8);
        let matches = matcher.match_features(&feats0, &feats1)?;
        assert!(matches.is_empty());
        Ok(())
    }

    #[test]
    fn empty_inputs_produce_empty_matches() -> Result<(), FeatureError> {
        let feats0 = features(&[]);
        let feats1 = features(&[[1.0, 0.0]]);
        let matches = BruteForceMatcher::new().match_features(&feats0, &feats1)?;
        assert!(matches.is_empty());
        Ok(())
    }

    #[test]
    fn descriptor_dim_mismatch_is_an_error() {
        let feats0 = features(&[[0.0, 0.0]]);
        let feats1 = ImageFeatures::new(vec![[0.0, 0.0]], vec![0.0; 3], 3, vec![1.0], size()).unwrap();
        let res = BruteForceMatcher::new().match_features(&feats0, &feats1);
        assert!(matches!(res, Err(FeatureError::DescriptorDimMismatch(2, 3))));
    }
}
