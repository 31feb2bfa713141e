use glam::{DMat3, DVec2};

/// Intrinsic parameters of a pinhole camera.
///
/// The default intrinsics are unit focal length with a zero principal
/// point, which treats pixel coordinates as already normalized. This
/// matches solvers that are handed bare pixel coordinates without a
/// calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeIntrinsics {
    /// Focal length along x in pixels.
    pub fx: f64,
    /// Focal length along y in pixels.
    pub fy: f64,
    /// Principal point x coordinate in pixels.
    pub cx: f64,
    /// Principal point y coordinate in pixels.
    pub cy: f64,
}

impl Default for PinholeIntrinsics {
    fn default() -> Self {
        Self {
            fx: 1.0,
            fy: 1.0,
            cx: 0.0,
            cy: 0.0,
        }
    }
}

impl PinholeIntrinsics {
    /// Creates new intrinsics from focal lengths and principal point.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Rough intrinsics for an uncalibrated camera: focal length set to
    /// the larger image dimension, principal point at the image center.
    pub fn from_image_size(width: usize, height: usize) -> Self {
        let f = width.max(height) as f64;
        Self {
            fx: f,
            fy: f,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    /// Returns the 3x3 camera matrix K.
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_cols_array(&[
            self.fx, 0.0, 0.0, //
            0.0, self.fy, 0.0, //
            self.cx, self.cy, 1.0,
        ])
    }

    /// Converts a pixel coordinate to normalized image coordinates.
    pub fn normalize(&self, p: &DVec2) -> DVec2 {
        DVec2::new((p.x - self.cx) / self.fx, (p.y - self.cy) / self.fy)
    }

    /// Converts a normalized image coordinate back to pixels.
    pub fn denormalize(&self, p: &DVec2) -> DVec2 {
        DVec2::new(p.x * self.fx + self.cx, p.y * self.fy + self.cy)
    }

    /// Mean of the two focal lengths, used to map pixel thresholds into
    /// normalized units.
    pub fn mean_focal(&self) -> f64 {
        0.5 * (self.fx + self.fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_denormalize_roundtrip() {
        let k = PinholeIntrinsics::new(500.0, 480.0, 320.0, 240.0);
        let p = DVec2::new(100.0, 350.0);
        let q = k.denormalize(&k.normalize(&p));
        assert_relative_eq!(q.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(q.y, p.y, epsilon = 1e-12);
    }

    #[test]
    fn default_is_identity() {
        let k = PinholeIntrinsics::default();
        assert_eq!(k.matrix(), DMat3::IDENTITY);
        let p = DVec2::new(0.3, -0.2);
        assert_eq!(k.normalize(&p), p);
    }

    #[test]
    fn matrix_layout() {
        let k = PinholeIntrinsics::new(500.0, 480.0, 320.0, 240.0);
        let m = k.matrix();
        // column-major: K[0][0] = fx, third column is (cx, cy, 1)
        assert_eq!(m.x_axis.x, 500.0);
        assert_eq!(m.y_axis.y, 480.0);
        assert_eq!(m.z_axis.x, 320.0);
        assert_eq!(m.z_axis.y, 240.0);
        assert_eq!(m.z_axis.z, 1.0);
    }
}
