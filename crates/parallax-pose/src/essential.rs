use glam::{DMat3, DVec2, DVec3};

use crate::error::PoseError;
use crate::linalg::svd3;

/// Minimum number of correspondences accepted by [`essential_8point`].
pub const MIN_CORRESPONDENCES: usize = 8;

/// Build an essential matrix from a fundamental matrix and camera intrinsics.
///
/// E = K2^T * F * K1
pub fn essential_from_fundamental(f: &DMat3, k1: &DMat3, k2: &DMat3) -> DMat3 {
    k2.transpose() * *f * *k1
}

/// Enforce the (1,1,0) singular value constraint on an essential matrix.
pub fn enforce_essential_constraints(e: &DMat3) -> DMat3 {
    let svd = svd3(e);
    let s = DMat3::from_diagonal(DVec3::new(1.0, 1.0, 0.0));
    *svd.u() * s * svd.v().transpose()
}

/// Estimate an essential matrix from normalized image coordinates using
/// the 8-point algorithm.
///
/// - `x1`: points in view 1, normalized image coordinates (length >= 8)
/// - `x2`: corresponding points in view 2 (same length)
///
/// The points are conditioned with Hartley similarity transforms, the
/// linear system `x2^T E x1 = 0` is solved via SVD, and the (1,1,0)
/// singular value constraint is enforced on the result. Rank-deficient
/// configurations (coincident or collinear points) are rejected.
pub fn essential_8point(x1: &[DVec2], x2: &[DVec2]) -> Result<DMat3, PoseError> {
    if x1.len() != x2.len() {
        return Err(PoseError::MismatchedLengths(x1.len(), x2.len()));
    }
    if x1.len() < MIN_CORRESPONDENCES {
        return Err(PoseError::InsufficientCorrespondences {
            required: MIN_CORRESPONDENCES,
            actual: x1.len(),
        });
    }

    // Normalize points with similarity transforms to zero mean and
    // average sqrt(2) distance.
    let (x1n, t1) = normalize_points_2d(x1);
    let (x2n, t2) = normalize_points_2d(x2);

    // Build design matrix A (N x 9) for x2' * E * x1 = 0
    let n = x1n.len();
    let mut a = faer::Mat::<f64>::zeros(n, 9);
    for i in 0..n {
        let (x, y) = (x1n[i].x, x1n[i].y);
        let (xp, yp) = (x2n[i].x, x2n[i].y);
        a.write(i, 0, xp * x);
        a.write(i, 1, xp * y);
        a.write(i, 2, xp);
        a.write(i, 3, yp * x);
        a.write(i, 4, yp * y);
        a.write(i, 5, yp);
        a.write(i, 6, x);
        a.write(i, 7, y);
        a.write(i, 8, 1.0);
    }

    // Solve Ae = 0 via SVD: take last column of V
    let svd = a.svd();
    let s = svd.s_diagonal();

    // A unique (up to scale) solution needs rank 8: the 8th singular
    // value must be well separated from zero.
    if s[7] < 1e-10 * s[0].max(1e-300) {
        return Err(PoseError::DegenerateConfiguration);
    }

    let evec = svd.v().col(8);
    let e_norm = DMat3::from_cols(
        DVec3::new(evec[0], evec[3], evec[6]),
        DVec3::new(evec[1], evec[4], evec[7]),
        DVec3::new(evec[2], evec[5], evec[8]),
    );

    // Denormalize: E = T2^T * E * T1
    let e = t2.transpose() * e_norm * t1;

    Ok(enforce_essential_constraints(&e))
}

/// Squared Sampson distance of a correspondence to the epipolar model.
///
/// First-order approximation of the squared geometric reprojection
/// error, in the units of the input coordinates.
pub fn sampson_distance(e: &DMat3, x1: &DVec2, x2: &DVec2) -> f64 {
    let x1h = DVec3::new(x1.x, x1.y, 1.0);
    let x2h = DVec3::new(x2.x, x2.y, 1.0);

    let ex1 = *e * x1h;
    let etx2 = e.transpose() * x2h;

    let num = x2h.dot(ex1);
    let denom = ex1.x * ex1.x + ex1.y * ex1.y + etx2.x * etx2.x + etx2.y * etx2.y;
    if denom < 1e-18 {
        return f64::INFINITY;
    }
    num * num / denom
}

/// Decompose an essential matrix into four possible (R, t) solutions.
///
/// Returns the candidate poses where R is a rotation matrix and t is a
/// unit 3-vector. The correct candidate is the one placing triangulated
/// points in front of both cameras.
pub fn decompose_essential(e: &DMat3) -> Vec<(DMat3, DVec3)> {
    let svd = svd3(e);
    let mut u = *svd.u();
    let mut v = *svd.v();

    if u.determinant() < 0.0 {
        u.z_axis = -u.z_axis;
    }
    if v.determinant() < 0.0 {
        v.z_axis = -v.z_axis;
    }

    let w = DMat3::from_cols(
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
    );
    let wt = w.transpose();

    let r1 = u * w * v.transpose();
    let r2 = u * wt * v.transpose();

    let t = u.z_axis;
    let t_neg = -t;

    vec![(r1, t), (r1, t_neg), (r2, t), (r2, t_neg)]
}

fn normalize_points_2d(x: &[DVec2]) -> (Vec<DVec2>, DMat3) {
    let n = x.len();
    let mut mean = DVec2::ZERO;
    for p in x {
        mean += *p;
    }
    mean /= n as f64;

    let mut mean_dist = 0.0;
    for p in x {
        mean_dist += (*p - mean).length();
    }
    mean_dist /= n as f64;
    let scale = if mean_dist > 0.0 {
        (2.0f64).sqrt() / mean_dist
    } else {
        1.0
    };

    let xn = x.iter().map(|p| (*p - mean) * scale).collect();

    // Similarity transform T = [[s,0,-s*mx],[0,s,-s*my],[0,0,1]]
    let t = DMat3::from_cols(
        DVec3::new(scale, 0.0, 0.0),
        DVec3::new(0.0, scale, 0.0),
        DVec3::new(-scale * mean.x, -scale * mean.y, 1.0),
    );
    (xn, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::skew;

    fn project(p: &DVec3) -> DVec2 {
        DVec2::new(p.x / p.z, p.y / p.z)
    }

    // A small synthetic rig: points in front of both cameras, the
    // second camera rotated about y and translated along x.
    fn synthetic_views() -> (DMat3, DVec3, Vec<DVec2>, Vec<DVec2>) {
        let r = DMat3::from_rotation_y(0.08);
        let t = DVec3::new(0.3, 0.05, 0.02);

        let mut x1 = Vec::new();
        let mut x2 = Vec::new();
        for i in 0..8 {
            for j in 0..4 {
                let p = DVec3::new(
                    (i as f64 - 3.5) * 0.3,
                    (j as f64 - 1.5) * 0.25,
                    3.0 + ((i * 7 + j * 3) % 5) as f64 * 0.4,
                );
                let q = r * p + t;
                x1.push(project(&p));
                x2.push(project(&q));
            }
        }
        (r, t, x1, x2)
    }

    #[test]
    fn test_decompose_essential_identity_rotation() {
        let r = DMat3::IDENTITY;
        let t = DVec3::new(1.0, 0.0, 0.0);
        let e = skew(&t) * r;

        let candidates = decompose_essential(&e);
        assert_eq!(candidates.len(), 4);

        let mut found = false;
        for (rc, tc) in candidates {
            let det = rc.determinant();
            assert!((det - 1.0).abs() < 1e-9);

            let dot = tc.dot(t).abs();
            if dot > 0.99 {
                let ra = rc.to_cols_array();
                let rb = r.to_cols_array();
                let diff: f64 = ra.iter().zip(rb.iter()).map(|(a, b)| (a - b).abs()).sum();
                if diff < 1e-6 {
                    found = true;
                    break;
                }
            }
        }

        assert!(found);
    }

    #[test]
    fn test_enforce_essential_constraints_rank2() {
        let e = DMat3::from_cols(
            DVec3::new(0.1, 0.2, -0.3),
            DVec3::new(0.4, -0.1, 0.2),
            DVec3::new(-0.2, 0.5, 0.3),
        );
        let e_fixed = enforce_essential_constraints(&e);
        let svd = svd3(&e_fixed);
        let s = svd.s();
        assert!(s.z.abs() < 1e-9);
        assert!((s.x - s.y).abs() < 1e-9);
    }

    #[test]
    fn test_essential_8point_epipolar_constraint() -> Result<(), PoseError> {
        let (_, _, x1, x2) = synthetic_views();
        let e = essential_8point(&x1, &x2)?;

        // the estimate has non-trivial scale
        let norm: f64 = e.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!(norm > 1e-6);

        for i in 0..x1.len() {
            let x1h = DVec3::new(x1[i].x, x1[i].y, 1.0);
            let x2h = DVec3::new(x2[i].x, x2[i].y, 1.0);
            let val = x2h.dot(e * x1h) / norm;
            assert!(val.abs() < 1e-8, "epipolar residual too large: {val}");
        }
        Ok(())
    }

    #[test]
    fn test_essential_8point_matches_ground_truth() -> Result<(), PoseError> {
        let (r, t, x1, x2) = synthetic_views();
        let e_true = skew(&t) * r;
        let e_est = essential_8point(&x1, &x2)?;

        // compare up to scale and sign via normalized Frobenius norms
        let na: f64 = e_true.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt();
        let nb: f64 = e_est.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt();
        let a = e_true.to_cols_array().map(|v| v / na);
        let b = e_est.to_cols_array().map(|v| v / nb);

        let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let sign = if dot >= 0.0 { 1.0 } else { -1.0 };
        for i in 0..9 {
            assert!((a[i] - sign * b[i]).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_essential_8point_too_few_points() {
        let x: Vec<DVec2> = (0..4).map(|i| DVec2::new(i as f64, 1.0)).collect();
        let res = essential_8point(&x, &x);
        assert!(matches!(
            res,
            Err(PoseError::InsufficientCorrespondences {
                required: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_essential_8point_degenerate_points() {
        // all points at the same location constrain nothing
        let x1 = vec![DVec2::new(0.1, 0.2); 10];
        let x2 = vec![DVec2::new(0.3, -0.1); 10];
        let res = essential_8point(&x1, &x2);
        assert!(matches!(res, Err(PoseError::DegenerateConfiguration)));
    }

    #[test]
    fn test_essential_from_fundamental_identity_intrinsics() {
        let (r, t, _, _) = synthetic_views();
        let e = skew(&t) * r;
        // with K1 = K2 = I the fundamental and essential matrices agree
        let e2 = essential_from_fundamental(&e, &DMat3::IDENTITY, &DMat3::IDENTITY);
        assert_eq!(e.to_cols_array(), e2.to_cols_array());
    }

    #[test]
    fn test_sampson_distance_zero_for_perfect_match() {
        let (r, t, x1, x2) = synthetic_views();
        let e = skew(&t) * r;
        for i in 0..x1.len() {
            assert!(sampson_distance(&e, &x1[i], &x2[i]) < 1e-16);
        }
    }
}
