use glam::{DMat3, DVec2, DVec3};

use crate::camera::PinholeIntrinsics;
use crate::error::PoseError;
use crate::essential::decompose_essential;

/// Minimum parallax angle (degrees) for a triangulated point to count
/// toward cheirality.
const MIN_PARALLAX_DEG: f64 = 1.0;

/// Relative pose recovered from an essential matrix.
#[derive(Clone, Debug)]
pub struct PoseEstimate {
    /// Relative rotation from view 0 to view 1.
    pub rotation: DMat3,
    /// Relative translation direction from view 0 to view 1, unit norm.
    /// The absolute scale is unrecoverable from two monocular views.
    pub translation: DVec3,
    /// Refined inlier mask: RANSAC inliers that triangulate in front of
    /// both cameras.
    pub inliers: Vec<bool>,
    /// Triangulated 3D points for the refined inliers, in the first
    /// camera frame, up to the global scale ambiguity.
    pub points3d: Vec<DVec3>,
}

/// Recover the relative pose from an essential matrix and its
/// supporting correspondences.
///
/// Decomposes `e` into the four (R, t) candidates and selects the one
/// placing the most triangulated inliers at positive depth in both
/// camera frames. `pts0` / `pts1` are pixel coordinates; `inliers`
/// restricts the cheirality vote to the RANSAC consensus set.
pub fn recover_pose(
    e: &DMat3,
    pts0: &[DVec2],
    pts1: &[DVec2],
    camera: &PinholeIntrinsics,
    inliers: &[bool],
) -> Result<PoseEstimate, PoseError> {
    if pts0.len() != pts1.len() {
        return Err(PoseError::MismatchedLengths(pts0.len(), pts1.len()));
    }
    if pts0.len() != inliers.len() {
        return Err(PoseError::MismatchedLengths(pts0.len(), inliers.len()));
    }

    let x1: Vec<DVec2> = pts0.iter().map(|p| camera.normalize(p)).collect();
    let x2: Vec<DVec2> = pts1.iter().map(|p| camera.normalize(p)).collect();

    let mut best: Option<(DMat3, DVec3, Vec<bool>, Vec<DVec3>)> = None;
    let mut best_count = 0usize;

    for (r, t) in decompose_essential(e) {
        let (count, mask, points) = triangulate_cheirality(&x1, &x2, inliers, &r, &t);
        if count > best_count {
            best_count = count;
            best = Some((r, t, mask, points));
        }
    }

    let (rotation, translation, inliers, points3d) =
        best.ok_or(PoseError::CheiralityFailure)?;

    Ok(PoseEstimate {
        rotation,
        translation,
        inliers,
        points3d,
    })
}

/// Triangulate the masked correspondences under a candidate pose and
/// count the ones with positive depth in both frames and enough
/// parallax. Returns the count, the refined mask and the kept points.
fn triangulate_cheirality(
    x1: &[DVec2],
    x2: &[DVec2],
    inliers: &[bool],
    r: &DMat3,
    t: &DVec3,
) -> (usize, Vec<bool>, Vec<DVec3>) {
    let mut count = 0usize;
    let mut mask = vec![false; x1.len()];
    let mut points = Vec::new();

    for i in 0..x1.len() {
        if !inliers[i] {
            continue;
        }
        if let Some(x) = triangulate_point_linear(&x1[i], &x2[i], r, t) {
            let z1 = x.z;
            let x2c = *r * x + *t;
            let z2 = x2c.z;
            if z1 > 0.0 && z2 > 0.0 && parallax_ok(&x, &x2c) {
                mask[i] = true;
                points.push(x);
                count += 1;
            }
        }
    }

    (count, mask, points)
}

fn parallax_ok(x1: &DVec3, x2: &DVec3) -> bool {
    let n1 = x1.length();
    let n2 = x2.length();
    if n1 <= 1e-12 || n2 <= 1e-12 {
        return false;
    }
    let cos_angle = (x1.dot(*x2) / (n1 * n2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees() >= MIN_PARALLAX_DEG
}

/// Linear (DLT) triangulation of one correspondence in normalized image
/// coordinates, with camera 0 at the origin and camera 1 at (R, t).
fn triangulate_point_linear(x1: &DVec2, x2: &DVec2, r: &DMat3, t: &DVec3) -> Option<DVec3> {
    let p1 = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
    ];
    let rt = r.transpose().to_cols_array(); // rows of R
    let p2 = [
        [rt[0], rt[1], rt[2], t.x],
        [rt[3], rt[4], rt[5], t.y],
        [rt[6], rt[7], rt[8], t.z],
    ];

    let mut a = faer::Mat::<f64>::zeros(4, 4);
    write_dlt_row(&mut a, 0, x1.x, &p1[2], &p1[0]);
    write_dlt_row(&mut a, 1, x1.y, &p1[2], &p1[1]);
    write_dlt_row(&mut a, 2, x2.x, &p2[2], &p2[0]);
    write_dlt_row(&mut a, 3, x2.y, &p2[2], &p2[1]);

    let svd = a.svd();
    let v = svd.v();
    let xh = v.col(3);
    let w = xh[3];
    if w.abs() < 1e-12 {
        return None;
    }
    Some(DVec3::new(xh[0] / w, xh[1] / w, xh[2] / w))
}

fn write_dlt_row(a: &mut faer::Mat<f64>, row: usize, x: f64, p3: &[f64; 4], p1: &[f64; 4]) {
    for j in 0..4 {
        a.write(row, j, x * p3[j] - p1[j]);
    }
}
