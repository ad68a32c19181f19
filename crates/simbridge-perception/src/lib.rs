//! `simbridge-perception` – geometry shared by sensor plugins.
//!
//! # Modules
//!
//! - [`transform`] – [`Quaternion`][transform::Quaternion],
//!   [`Transform3D`][transform::Transform3D] and the fixed
//!   [`frame_correction`][transform::frame_correction] that moves native
//!   camera poses into the optical frame.
//! - [`optics`] – [`PinholeModel`][optics::PinholeModel]: intrinsics and
//!   projection derived from field of view and resolution.

pub mod optics;
pub mod transform;

pub use optics::PinholeModel;
pub use transform::{FRAME_CORRECTION, Quaternion, Transform3D, Vec3, frame_correction};
