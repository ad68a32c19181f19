//! `simbridge-runtime` – sensor plugins that bridge simulated devices onto
//! the event bus.
//!
//! # Modules
//!
//! - [`camera`] – [`CameraPlugin`][camera::CameraPlugin]: the per-step
//!   orchestrator publishing frames, calibration and recognitions.
//! - [`enablement`] – [`EnablementController`][enablement::EnablementController]:
//!   switches the device and its recognition sub-mode on and off following
//!   subscriber demand.
//! - [`detection`] – conversion of native recognition records into the
//!   generic and simulator-specific detection messages.
//! - [`sensor_plugin`] – parameter parsing, publish-rate gating and device
//!   sampling periods shared by sensor plugins.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: `tracing`
//!   subscriber with optional OTLP export.

pub mod camera;
pub mod detection;
pub mod enablement;
pub mod sensor_plugin;
pub mod telemetry;

pub use camera::{CameraPlugin, StampSource, StepReport};
pub use enablement::{Demand, EnablementController, EnablementState};
pub use sensor_plugin::{SensorParameters, StepGate, device_timestep_ms, fixed_name};
pub use telemetry::{TracerProviderGuard, init_tracing};
