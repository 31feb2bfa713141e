use glam::{DMat3, DVec2};
use rand::prelude::*;
use rand::SeedableRng;

use crate::camera::PinholeIntrinsics;
use crate::error::PoseError;
use crate::essential::{essential_8point, sampson_distance, MIN_CORRESPONDENCES};

/// Parameters for RANSAC model estimation.
#[derive(Clone, Copy, Debug)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Target probability of drawing at least one outlier-free sample.
    pub confidence: f64,
    /// Inlier threshold in pixels (Sampson distance).
    pub threshold: f64,
    /// Minimum number of inliers required for acceptance.
    pub min_inliers: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            confidence: 0.999,
            threshold: 1.0,
            min_inliers: 15,
            random_seed: Some(0),
        }
    }
}

/// Result of a RANSAC model fit.
#[derive(Clone, Debug)]
pub struct RansacResult<M> {
    /// Estimated model.
    pub model: M,
    /// Per-point inlier mask.
    pub inliers: Vec<bool>,
    /// Total inlier count.
    pub inlier_count: usize,
    /// Sum of inlier errors (lower is better).
    pub score: f64,
}

/// Estimate an essential matrix with RANSAC using the 8-point solver.
///
/// `pts0` and `pts1` are corresponding points in pixel coordinates;
/// `camera` maps them into normalized image coordinates and scales the
/// pixel threshold accordingly. The iteration budget shrinks adaptively
/// as better models raise the running inlier ratio, bounded by
/// `params.max_iterations`.
pub fn ransac_essential(
    pts0: &[DVec2],
    pts1: &[DVec2],
    camera: &PinholeIntrinsics,
    params: &RansacParams,
) -> Result<RansacResult<DMat3>, PoseError> {
    if pts0.len() != pts1.len() {
        return Err(PoseError::MismatchedLengths(pts0.len(), pts1.len()));
    }
    if pts0.len() < MIN_CORRESPONDENCES {
        return Err(PoseError::InsufficientCorrespondences {
            required: MIN_CORRESPONDENCES,
            actual: pts0.len(),
        });
    }

    let mut rng = match params.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut tr = rand::rng();
            StdRng::from_rng(&mut tr)
        }
    };

    let x1: Vec<DVec2> = pts0.iter().map(|p| camera.normalize(p)).collect();
    let x2: Vec<DVec2> = pts1.iter().map(|p| camera.normalize(p)).collect();

    // Sampson distances are computed in normalized coordinates, so the
    // pixel threshold is mapped through the focal length.
    let thresh_norm = params.threshold / camera.mean_focal();
    let thresh_sq = thresh_norm * thresh_norm;

    let n = x1.len();
    let mut best_model = None;
    let mut best_inliers = Vec::new();
    let mut best_count = 0usize;
    let mut best_score = f64::INFINITY;
    let mut max_iterations = params.max_iterations;

    let mut iteration = 0usize;
    while iteration < max_iterations {
        iteration += 1;

        let sample = rand::seq::index::sample(&mut rng, n, MIN_CORRESPONDENCES);
        let mut s1 = Vec::with_capacity(MIN_CORRESPONDENCES);
        let mut s2 = Vec::with_capacity(MIN_CORRESPONDENCES);
        for idx in sample.iter() {
            s1.push(x1[idx]);
            s2.push(x2[idx]);
        }
        let e = match essential_8point(&s1, &s2) {
            Ok(e) => e,
            Err(_) => continue,
        };

        let mut inliers = vec![false; n];
        let mut count = 0usize;
        let mut score = 0.0f64;
        for i in 0..n {
            let d = sampson_distance(&e, &x1[i], &x2[i]);
            if d <= thresh_sq {
                inliers[i] = true;
                count += 1;
                score += d;
            }
        }

        if count > best_count || (count == best_count && score < best_score) {
            best_model = Some(e);
            best_inliers = inliers;
            best_count = count;
            best_score = score;
            max_iterations =
                max_iterations.min(iterations_for_confidence(params.confidence, count, n));
        }
    }

    let model = match best_model {
        Some(m) if best_count >= params.min_inliers.max(MIN_CORRESPONDENCES) => m,
        _ => return Err(PoseError::RansacFailure),
    };

    Ok(RansacResult {
        model,
        inliers: best_inliers,
        inlier_count: best_count,
        score: best_score,
    })
}

/// Number of iterations needed to draw an outlier-free 8-sample with
/// the given confidence, assuming `count / n` of the points are inliers.
fn iterations_for_confidence(confidence: f64, count: usize, n: usize) -> usize {
    if count == 0 || n == 0 {
        return usize::MAX;
    }
    let w = count as f64 / n as f64;
    let p_sample = w.powi(MIN_CORRESPONDENCES as i32);
    if p_sample >= 1.0 {
        return 1;
    }
    if p_sample <= f64::EPSILON {
        return usize::MAX;
    }
    let needed = (1.0 - confidence).ln() / (1.0 - p_sample).ln();
    needed.ceil().max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn project_px(p: &DVec3, k: &PinholeIntrinsics) -> DVec2 {
        k.denormalize(&DVec2::new(p.x / p.z, p.y / p.z))
    }

    // Pixel-space correspondences from a known relative motion, with a
    // block of gross outliers appended.
    fn synthetic_scene(
        num_outliers: usize,
    ) -> (PinholeIntrinsics, Vec<DVec2>, Vec<DVec2>, usize) {
        let k = PinholeIntrinsics::new(500.0, 500.0, 320.0, 240.0);
        let r = DMat3::from_rotation_y(0.06);
        let t = DVec3::new(0.25, 0.03, 0.01);

        let mut pts0 = Vec::new();
        let mut pts1 = Vec::new();
        for i in 0..10 {
            for j in 0..5 {
                let p = DVec3::new(
                    (i as f64 - 4.5) * 0.25,
                    (j as f64 - 2.0) * 0.2,
                    3.0 + ((i * 3 + j) % 7) as f64 * 0.3,
                );
                let q = r * p + t;
                pts0.push(project_px(&p, &k));
                pts1.push(project_px(&q, &k));
            }
        }
        let num_inliers = pts0.len();

        for m in 0..num_outliers {
            let base = pts0[m % num_inliers];
            pts0.push(base);
            // displaced far off the epipolar line
            pts1.push(DVec2::new(
                base.x + 60.0 + m as f64 * 3.0,
                base.y - 45.0 - m as f64 * 2.0,
            ));
        }

        (k, pts0, pts1, num_inliers)
    }

    #[test]
    fn test_ransac_essential_rejects_outliers() -> Result<(), PoseError> {
        let (k, pts0, pts1, num_inliers) = synthetic_scene(10);
        let params = RansacParams::default();
        let res = ransac_essential(&pts0, &pts1, &k, &params)?;

        assert!(res.inlier_count >= params.min_inliers);
        assert_eq!(res.inliers.len(), pts0.len());
        // all true correspondences kept, all gross outliers rejected
        for (i, &is_inlier) in res.inliers.iter().enumerate() {
            if i < num_inliers {
                assert!(is_inlier, "true correspondence {i} marked outlier");
            } else {
                assert!(!is_inlier, "gross outlier {i} marked inlier");
            }
        }
        Ok(())
    }

    #[test]
    fn test_ransac_essential_seed_reproducible() -> Result<(), PoseError> {
        let (k, pts0, pts1, _) = synthetic_scene(8);
        let params = RansacParams {
            random_seed: Some(42),
            ..Default::default()
        };
        let res_a = ransac_essential(&pts0, &pts1, &k, &params)?;
        let res_b = ransac_essential(&pts0, &pts1, &k, &params)?;
        assert_eq!(res_a.inliers, res_b.inliers);
        assert_eq!(res_a.model.to_cols_array(), res_b.model.to_cols_array());
        Ok(())
    }

    #[test]
    fn test_ransac_essential_too_few_points() {
        let k = PinholeIntrinsics::default();
        let pts: Vec<DVec2> = (0..4).map(|i| DVec2::new(i as f64, 0.5)).collect();
        let res = ransac_essential(&pts, &pts, &k, &RansacParams::default());
        assert!(matches!(
            res,
            Err(PoseError::InsufficientCorrespondences { .. })
        ));
    }

    #[test]
    fn test_ransac_essential_mismatched_lengths() {
        let k = PinholeIntrinsics::default();
        let pts0: Vec<DVec2> = (0..10).map(|i| DVec2::new(i as f64, 0.5)).collect();
        let pts1 = pts0[..9].to_vec();
        let res = ransac_essential(&pts0, &pts1, &k, &RansacParams::default());
        assert!(matches!(res, Err(PoseError::MismatchedLengths(10, 9))));
    }

    #[test]
    fn test_iterations_for_confidence_monotonic() {
        // more inliers means fewer iterations needed
        let a = iterations_for_confidence(0.999, 90, 100);
        let b = iterations_for_confidence(0.999, 50, 100);
        assert!(a < b);
        assert!(a >= 1);
    }
}
