//! In-process simulated camera for tests and headless runs.
//!
//! [`SimCamera`] behaves like a simulator camera handle: it only yields a
//! frame once it is enabled *and* a frame has been rendered, and only
//! reports recognised objects while its recognition sub-mode is enabled.
//! Every enable/disable command is recorded so callers can assert on the
//! exact command sequence a plugin issued.
//!
//! # Example
//!
//! ```rust
//! use simbridge_hal::camera::CameraDevice;
//! use simbridge_hal::sim::{DeviceCommand, SimCamera};
//!
//! let mut cam = SimCamera::new("camera", 4, 2, 1.0).with_recognition();
//! assert!(cam.image().is_none());
//!
//! cam.enable(32);
//! cam.render_pattern(0);
//! assert_eq!(cam.image().map(<[u8]>::len), Some(4 * 4 * 2));
//! assert_eq!(cam.commands(), &[DeviceCommand::Enable(32)]);
//! ```

use simbridge_types::BridgeError;
use tracing::{debug, warn};

use crate::camera::{CameraDevice, RecognitionObject};

/// A command received by a [`SimCamera`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Enable(u32),
    Disable,
    RecognitionEnable(u32),
    RecognitionDisable,
}

/// Scriptable stand-in for a simulator camera.
#[derive(Debug, Clone)]
pub struct SimCamera {
    name: String,
    width: u32,
    height: u32,
    fov: f64,
    recognition: bool,
    period: Option<u32>,
    recognition_period: Option<u32>,
    frame: Option<Vec<u8>>,
    objects: Vec<RecognitionObject>,
    commands: Vec<DeviceCommand>,
}

impl SimCamera {
    /// Create a camera without recognition.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fov: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            fov,
            recognition: false,
            period: None,
            recognition_period: None,
            frame: None,
            objects: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Give the camera a recognition sub-mode.
    pub fn with_recognition(mut self) -> Self {
        self.recognition = true;
        self
    }

    /// Byte length of one BGRA frame.
    pub fn frame_len(&self) -> usize {
        4 * self.width as usize * self.height as usize
    }

    /// Store `frame` as the latest rendered image.
    ///
    /// Ignored while the camera is disabled, as a real simulator does not
    /// render disabled cameras.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidParameter`] if `frame` is not exactly
    /// `4 * width * height` bytes long.
    pub fn render(&mut self, frame: &[u8]) -> Result<(), BridgeError> {
        if frame.len() != self.frame_len() {
            return Err(BridgeError::InvalidParameter {
                name: "frame".to_string(),
                details: format!(
                    "expected {} bytes for {}x{} BGRA, got {}",
                    self.frame_len(),
                    self.width,
                    self.height,
                    frame.len()
                ),
            });
        }
        if self.period.is_some() {
            self.frame
                .get_or_insert_with(|| vec![0u8; frame.len()])
                .copy_from_slice(frame);
        }
        Ok(())
    }

    /// Render a synthetic frame whose bytes depend on `seed`.
    pub fn render_pattern(&mut self, seed: u8) {
        if self.period.is_none() {
            return;
        }
        let width = self.width as usize;
        let len = self.frame_len();
        let frame = self.frame.get_or_insert_with(|| vec![0u8; len]);
        for (i, px) in frame.chunks_exact_mut(4).enumerate() {
            let (x, y) = (i % width, i / width);
            px[0] = (x as u8).wrapping_add(seed);
            px[1] = (y as u8).wrapping_add(seed);
            px[2] = seed;
            px[3] = u8::MAX;
        }
    }

    /// Replace the set of objects seen by the recognition sub-mode.
    pub fn set_objects(&mut self, objects: Vec<RecognitionObject>) {
        self.objects = objects;
    }

    /// Every command received so far, oldest first.
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl CameraDevice for SimCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fov(&self) -> f64 {
        self.fov
    }

    fn has_recognition(&self) -> bool {
        self.recognition
    }

    fn enable(&mut self, sampling_period_ms: u32) {
        debug!(camera = %self.name, sampling_period_ms, "sim camera enabled");
        self.period = Some(sampling_period_ms);
        self.commands.push(DeviceCommand::Enable(sampling_period_ms));
    }

    fn disable(&mut self) {
        debug!(camera = %self.name, "sim camera disabled");
        self.period = None;
        self.frame = None;
        self.commands.push(DeviceCommand::Disable);
    }

    fn sampling_period(&self) -> Option<u32> {
        self.period
    }

    fn image(&self) -> Option<&[u8]> {
        self.period?;
        self.frame.as_deref()
    }

    fn recognition_enable(&mut self, sampling_period_ms: u32) {
        if !self.recognition {
            warn!(camera = %self.name, "recognition enable ignored: camera has no recognition");
            return;
        }
        self.recognition_period = Some(sampling_period_ms);
        self.commands
            .push(DeviceCommand::RecognitionEnable(sampling_period_ms));
    }

    fn recognition_disable(&mut self) {
        self.recognition_period = None;
        self.commands.push(DeviceCommand::RecognitionDisable);
    }

    fn recognition_sampling_period(&self) -> Option<u32> {
        self.recognition_period
    }

    fn recognition_objects(&self) -> &[RecognitionObject] {
        if self.recognition_period.is_some() {
            &self.objects
        } else {
            &[]
        }
    }
}
