//! Wire-format message schemas shared by every SimBridge crate.
//!
//! The layouts mirror the common robotics message definitions
//! (`sensor_msgs`, `geometry_msgs`, `vision_msgs`) closely enough that a
//! downstream bridge can forward them field-for-field.  Matrices are stored
//! row-major.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel encoding stamped into every [`Image`] produced by the camera plugin.
pub const ENCODING_BGRA8: &str = "bgra8";

/// Distortion model name for the ideal pinhole camera.
pub const DISTORTION_PLUMB_BOB: &str = "plumb_bob";

// ────────────────────────────────────────────────────────────────────────────
// Header
// ────────────────────────────────────────────────────────────────────────────

/// A timestamp split into whole seconds and nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl Time {
    /// Build a timestamp from floating-point seconds (e.g. simulation time).
    ///
    /// Negative inputs clamp to zero.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let seconds = seconds.max(0.0);
        let sec = seconds.trunc();
        let mut nanosec = ((seconds - sec) * 1e9).round() as u32;
        let mut sec = sec as i32;
        if nanosec >= 1_000_000_000 {
            sec += 1;
            nanosec -= 1_000_000_000;
        }
        Self { sec, nanosec }
    }

    /// Seconds as a float.
    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.sec) + f64::from(self.nanosec) * 1e-9
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(value: DateTime<Utc>) -> Self {
        Self {
            sec: value.timestamp() as i32,
            nanosec: value.timestamp_subsec_nanos(),
        }
    }
}

/// Metadata carried by every stamped message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Time,
    /// Coordinate frame the payload is expressed in, e.g. `"camera"`.
    pub frame_id: String,
}

impl Header {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            stamp: Time::default(),
            frame_id: frame_id.into(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Image + calibration
// ────────────────────────────────────────────────────────────────────────────

/// An uncompressed image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    /// Pixel layout, e.g. [`ENCODING_BGRA8`].
    pub encoding: String,
    pub is_bigendian: bool,
    /// Row length in bytes.
    pub step: u32,
    pub data: Vec<u8>,
}

/// Camera calibration record.
///
/// `k` is the 3×3 intrinsic matrix, `r` the 3×3 rectification matrix and
/// `p` the 3×4 projection matrix, all row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub distortion_model: String,
    pub d: Vec<f64>,
    pub k: [f64; 9],
    pub r: [f64; 9],
    pub p: [f64; 12],
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation in wire order (x, y, z, w).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

/// A pose with a row-major 6×6 covariance (36 entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseWithCovariance {
    pub pose: Pose,
    pub covariance: Vec<f64>,
}

impl PoseWithCovariance {
    /// Wrap `pose` with an all-zero covariance.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            covariance: vec![0.0; 36],
        }
    }
}

impl Default for PoseWithCovariance {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Detections
// ────────────────────────────────────────────────────────────────────────────

/// 2-D pose in pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Axis-aligned box in pixel coordinates, described by its centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    pub center: Pose2D,
    pub size_x: f64,
    pub size_y: f64,
}

/// One class hypothesis with an attached 3-D pose.
///
/// The simulated recognizer has no notion of class confidence, so
/// `class_id` is left empty and `score` at zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectHypothesisWithPose {
    pub class_id: String,
    pub score: f64,
    pub pose: PoseWithCovariance,
}

/// Generic 2-D detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection2D {
    pub header: Header,
    pub results: Vec<ObjectHypothesisWithPose>,
    pub bbox: BoundingBox2D,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection2DArray {
    pub header: Header,
    pub detections: Vec<Detection2D>,
}

/// RGBA color, channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorRGBA {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Recognition result carrying the simulator's native attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraRecognitionObject {
    pub id: i32,
    pub model: String,
    pub pose: Pose,
    pub bbox: BoundingBox2D,
    pub colors: Vec<ColorRGBA>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraRecognitionObjects {
    pub header: Header,
    pub objects: Vec<CameraRecognitionObject>,
}

// ────────────────────────────────────────────────────────────────────────────
// Bus envelope
// ────────────────────────────────────────────────────────────────────────────

/// Every payload that can travel over the SimBridge bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "msg")]
pub enum Message {
    Image(Image),
    CameraInfo(CameraInfo),
    /// Generic 2-D detections.
    Detections(Detection2DArray),
    /// Native recognition objects.
    Recognitions(CameraRecognitionObjects),
}

impl Message {
    /// Header of the wrapped message.
    pub fn header(&self) -> &Header {
        match self {
            Message::Image(m) => &m.header,
            Message::CameraInfo(m) => &m.header,
            Message::Detections(m) => &m.header,
            Message::Recognitions(m) => &m.header,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type shared across the workspace.
///
/// Only initialisation and configuration paths are fallible; the per-step
/// publishing path never returns an error.
#[derive(Error, Debug, PartialEq)]
pub enum BridgeError {
    #[error("Invalid parameter '{name}': {details}")]
    InvalidParameter { name: String, details: String },

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Invalid optics: {0}")]
    InvalidOptics(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_from_secs_splits_fraction() {
        let t = Time::from_secs_f64(12.25);
        assert_eq!(t.sec, 12);
        assert_eq!(t.nanosec, 250_000_000);
        assert!((t.as_secs_f64() - 12.25).abs() < 1e-9);
    }

    #[test]
    fn time_from_negative_secs_clamps_to_zero() {
        assert_eq!(Time::from_secs_f64(-3.0), Time::default());
    }

    #[test]
    fn time_from_datetime() {
        let dt = DateTime::from_timestamp(1_700_000_000, 5).unwrap();
        let t = Time::from(dt);
        assert_eq!(t.sec, 1_700_000_000);
        assert_eq!(t.nanosec, 5);
    }

    #[test]
    fn default_quaternion_is_identity() {
        let q = Quaternion::default();
        assert_eq!((q.x, q.y, q.z, q.w), (0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn pose_with_covariance_has_36_entries() {
        let p = PoseWithCovariance::default();
        assert_eq!(p.covariance.len(), 36);
        assert!(p.covariance.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn message_serializes_with_type_tag() {
        let msg = Message::Detections(Detection2DArray {
            header: Header::new("camera"),
            detections: vec![Detection2D::default()],
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"Detections\""));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
        assert_eq!(back.header().frame_id, "camera");
    }

    #[test]
    fn bridge_error_display() {
        let err = BridgeError::InvalidParameter {
            name: "updateRate".to_string(),
            details: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("updateRate"));
        assert!(BridgeError::DeviceUnavailable("cam".into())
            .to_string()
            .contains("Device unavailable"));
    }
}
