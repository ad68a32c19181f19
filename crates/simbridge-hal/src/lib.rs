//! `simbridge-hal` – device abstraction.
//!
//! # Modules
//!
//! - [`camera`] – the [`CameraDevice`][camera::CameraDevice] trait a sensor
//!   plugin drives, and the native
//!   [`RecognitionObject`][camera::RecognitionObject] record.
//! - [`sim`] – [`SimCamera`][sim::SimCamera], a scriptable in-process camera
//!   for tests and headless runs.

pub mod camera;
pub mod sim;

pub use camera::{CameraDevice, RecognitionObject};
pub use sim::{DeviceCommand, SimCamera};
