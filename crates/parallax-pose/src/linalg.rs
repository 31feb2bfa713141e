use glam::{DMat3, DVec3};

/// Singular value decomposition of a 3x3 matrix, `m = u * diag(s) * v^T`.
pub struct Svd3 {
    u: DMat3,
    s: DVec3,
    v: DMat3,
}

impl Svd3 {
    /// Left singular vectors.
    pub fn u(&self) -> &DMat3 {
        &self.u
    }

    /// Singular values, descending.
    pub fn s(&self) -> &DVec3 {
        &self.s
    }

    /// Right singular vectors.
    pub fn v(&self) -> &DMat3 {
        &self.v
    }
}

/// Compute the SVD of a 3x3 matrix.
pub fn svd3(m: &DMat3) -> Svd3 {
    let a = faer::mat![
        [m.x_axis.x, m.y_axis.x, m.z_axis.x],
        [m.x_axis.y, m.y_axis.y, m.z_axis.y],
        [m.x_axis.z, m.y_axis.z, m.z_axis.z],
    ];
    let svd = a.svd();

    let u = svd.u();
    let s = svd.s_diagonal();
    let v = svd.v();

    let col = |m: faer::MatRef<'_, f64>, j: usize| {
        let c = m.col(j);
        DVec3::new(c[0], c[1], c[2])
    };

    Svd3 {
        u: DMat3::from_cols(col(u, 0), col(u, 1), col(u, 2)),
        s: DVec3::new(s[0], s[1], s[2]),
        v: DMat3::from_cols(col(v, 0), col(v, 1), col(v, 2)),
    }
}

/// Skew-symmetric cross-product matrix of a 3-vector.
pub fn skew(t: &DVec3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.0, t.z, -t.y),
        DVec3::new(-t.z, 0.0, t.x),
        DVec3::new(t.y, -t.x, 0.0),
    )
}
