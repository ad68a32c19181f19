//! Pinhole optics derived from field of view.
//!
//! The simulated camera is an ideal pinhole: no lens distortion, square
//! pixels and the principal point at the image centre.  This is a known
//! simplification of real optics, and it is exact for the simulator.
//!
//! # Example
//!
//! ```rust
//! use simbridge_perception::optics::PinholeModel;
//!
//! let model = PinholeModel::from_fov(640, 480, 1.0).unwrap();
//! assert!((model.focal_length - 585.76).abs() < 0.01);
//! assert_eq!(model.principal_point(), (320.0, 240.0));
//! ```

use simbridge_types::{BridgeError, CameraInfo, DISTORTION_PLUMB_BOB, Header};
use std::f64::consts::PI;

/// Number of plumb-bob distortion coefficients.
const DISTORTION_COEFFS: usize = 5;

const IDENTITY_3X3: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Ideal pinhole camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeModel {
    pub width: u32,
    pub height: u32,
    /// Focal length in pixels, shared by both axes.
    pub focal_length: f64,
}

impl PinholeModel {
    /// Derive the model from a horizontal field of view `fov` (radians):
    /// `f = width / (2 * tan(fov / 2))`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidOptics`] for an empty image or a field
    /// of view outside `(0, π)`.
    pub fn from_fov(width: u32, height: u32, fov: f64) -> Result<Self, BridgeError> {
        if width == 0 || height == 0 {
            return Err(BridgeError::InvalidOptics(format!(
                "image size must be non-zero, got {width}x{height}"
            )));
        }
        if !(fov > 0.0 && fov < PI) {
            return Err(BridgeError::InvalidOptics(format!(
                "field of view must be in (0, π), got {fov}"
            )));
        }
        let focal_length = f64::from(width) / (2.0 * (fov / 2.0).tan());
        Ok(Self {
            width,
            height,
            focal_length,
        })
    }

    /// Principal point `(cx, cy)`: the image centre.
    pub fn principal_point(&self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Row-major 3×3 intrinsic matrix `[[f, 0, cx], [0, f, cy], [0, 0, 1]]`.
    pub fn intrinsic_matrix(&self) -> [f64; 9] {
        let f = self.focal_length;
        let (cx, cy) = self.principal_point();
        [f, 0.0, cx, 0.0, f, cy, 0.0, 0.0, 1.0]
    }

    /// Row-major 3×4 projection matrix: the intrinsic matrix with a zero
    /// translation column.
    pub fn projection_matrix(&self) -> [f64; 12] {
        let k = self.intrinsic_matrix();
        [
            k[0], k[1], k[2], 0.0, //
            k[3], k[4], k[5], 0.0, //
            k[6], k[7], k[8], 0.0,
        ]
    }

    /// Calibration record for this model, with an unset stamp.
    pub fn to_camera_info(&self, frame_id: &str) -> CameraInfo {
        CameraInfo {
            header: Header::new(frame_id),
            height: self.height,
            width: self.width,
            distortion_model: DISTORTION_PLUMB_BOB.to_string(),
            d: vec![0.0; DISTORTION_COEFFS],
            k: self.intrinsic_matrix(),
            r: IDENTITY_3X3,
            p: self.projection_matrix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focal_length_for_640_px_and_one_radian() {
        let model = PinholeModel::from_fov(640, 480, 1.0).unwrap();
        let expected = 640.0 / (2.0 * 0.5f64.tan());
        assert!((model.focal_length - expected).abs() < 1e-9);
        assert!((model.focal_length - 585.76).abs() < 0.01);
    }

    #[test]
    fn intrinsic_matrix_centres_principal_point() {
        let model = PinholeModel::from_fov(640, 480, 1.0).unwrap();
        let k = model.intrinsic_matrix();
        assert_eq!(k[2], 320.0);
        assert_eq!(k[5], 240.0);
        assert_eq!(k[0], k[4]);
        assert_eq!(&k[6..], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn projection_appends_zero_column() {
        let model = PinholeModel::from_fov(64, 32, 0.9).unwrap();
        let k = model.intrinsic_matrix();
        let p = model.projection_matrix();
        for row in 0..3 {
            assert_eq!(&p[row * 4..row * 4 + 3], &k[row * 3..row * 3 + 3]);
            assert_eq!(p[row * 4 + 3], 0.0);
        }
    }

    #[test]
    fn camera_info_is_distortion_free() {
        let info = PinholeModel::from_fov(640, 480, 1.0)
            .unwrap()
            .to_camera_info("camera");
        assert_eq!(info.distortion_model, "plumb_bob");
        assert_eq!(info.d, vec![0.0; 5]);
        assert_eq!(info.r, IDENTITY_3X3);
        assert_eq!(info.header.frame_id, "camera");
        assert_eq!((info.width, info.height), (640, 480));
    }

    #[test]
    fn rejects_degenerate_optics() {
        assert!(matches!(
            PinholeModel::from_fov(0, 480, 1.0),
            Err(BridgeError::InvalidOptics(_))
        ));
        assert!(PinholeModel::from_fov(640, 480, 0.0).is_err());
        assert!(PinholeModel::from_fov(640, 480, PI).is_err());
        assert!(PinholeModel::from_fov(640, 480, f64::NAN).is_err());
    }
}
