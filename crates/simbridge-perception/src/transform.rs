//! Rigid-body transforms between the simulator's native camera frame and
//! the optical frame consumers expect.
//!
//! The simulator reports recognised objects in a camera frame with +x
//! forward, +y left and +z up.  Consumers of image-plane data expect the
//! optical convention: +x right, +y down, +z forward.  [`frame_correction`]
//! is the fixed pure rotation that reconciles the two; it is applied to
//! whole poses with [`Transform3D::apply_to_pose`].
//!
//! # Example
//!
//! ```rust
//! use simbridge_perception::transform::{frame_correction, Vec3};
//!
//! // Straight ahead of the camera ends up on the optical axis.
//! let ahead = frame_correction().rotation.rotate(Vec3::new(2.0, 0.0, 0.0));
//! assert!((ahead.z - 2.0).abs() < 1e-12);
//! ```

use simbridge_types as wire;

/// Frame-correction rotation in (x, y, z, w) order.
pub const FRAME_CORRECTION: [f64; 4] = [0.5, -0.5, 0.5, 0.5];

/// Axis norms below this are treated as "no rotation".
const AXIS_EPSILON: f64 = 1e-12;

// ────────────────────────────────────────────────────────────────────────────
// Primitive types
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<wire::Point> for Vec3 {
    fn from(p: wire::Point) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl From<Vec3> for wire::Point {
    fn from(v: Vec3) -> Self {
        wire::Point {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `axis_angle[3]` radians about the axis
    /// `axis_angle[0..3]`.
    ///
    /// The axis does not need to be normalised.  A zero-length axis yields
    /// the identity.
    pub fn from_axis_angle(axis_angle: [f64; 4]) -> Self {
        let axis = Vec3::new(axis_angle[0], axis_angle[1], axis_angle[2]);
        let norm = axis.norm();
        if norm < AXIS_EPSILON {
            return Self::identity();
        }
        let half = axis_angle[3] / 2.0;
        let s = half.sin() / norm;
        Self::new(half.cos(), axis.x * s, axis.y * s, axis.z * s)
    }

    /// Hamilton product: compose two rotations (`rhs` applied first).
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn norm(self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Row-major 3×3 rotation matrix.
    pub fn to_rotation_matrix(self) -> [[f64; 3]; 3] {
        let Self { w, x, y, z } = self;
        [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * w),
                2.0 * (x * z + y * w),
            ],
            [
                2.0 * (x * y + z * w),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * w),
            ],
            [
                2.0 * (x * z - y * w),
                2.0 * (y * z + x * w),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ]
    }
}

impl From<wire::Quaternion> for Quaternion {
    fn from(q: wire::Quaternion) -> Self {
        Self::new(q.w, q.x, q.y, q.z)
    }
}

impl From<Quaternion> for wire::Quaternion {
    fn from(q: Quaternion) -> Self {
        wire::Quaternion {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform3D
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body 3-D transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Transform3D {
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// A transform that only rotates.
    pub fn from_rotation(rotation: Quaternion) -> Self {
        Self::new(Vec3::zero(), rotation)
    }

    /// Compose two transforms: `other` applied first, then `self`.
    ///
    /// If `self` = T_A_B and `other` = T_B_C, the result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.translation.add(self.rotation.rotate(other.translation));
        let rotated = self.rotation.mul(other.rotation);
        Self::new(translated, rotated)
    }

    /// Inverse transform.
    pub fn inverse(self) -> Self {
        let inv_rot = self.rotation.conjugate();
        let t = inv_rot.rotate(self.translation);
        Self::new(Vec3::new(-t.x, -t.y, -t.z), inv_rot)
    }

    /// Re-express `pose` through this transform: the position is rotated
    /// then translated, the orientation is pre-multiplied by the rotation.
    pub fn apply_to_pose(&self, pose: &wire::Pose) -> wire::Pose {
        let position = self
            .rotation
            .rotate(Vec3::from(pose.position))
            .add(self.translation);
        let orientation = self.rotation.mul(Quaternion::from(pose.orientation));
        wire::Pose {
            position: position.into(),
            orientation: orientation.into(),
        }
    }
}

/// The fixed native-to-optical camera frame correction.
pub fn frame_correction() -> Transform3D {
    let [x, y, z, w] = FRAME_CORRECTION;
    Transform3D::from_rotation(Quaternion::new(w, x, y, z))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
