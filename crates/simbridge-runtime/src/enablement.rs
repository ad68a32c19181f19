//! Demand-driven device enablement.
//!
//! Running a simulated camera (and, worse, its recognition sub-mode) costs
//! simulation time, so a plugin keeps the device off until somebody
//! listens.  [`EnablementController`] holds two independent on/off axes:
//!
//! | Axis | Wanted when |
//! |---|---|
//! | image | `always_on` ∨ image subscribers ∨ recognition subscribers |
//! | recognition | recognition subscribers (axis absent on devices without recognition) |
//!
//! Recognition needs rendered frames, hence the image axis also follows
//! recognition demand.  Each update compares the wanted state with the
//! last commanded state and issues an enable/disable command only on a
//! change.  There is no hysteresis: one step without subscribers disables,
//! one step with a subscriber re-enables.

use simbridge_hal::CameraDevice;
use tracing::info;

/// Subscriber demand observed at one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demand {
    pub always_on: bool,
    pub image_subscribers: usize,
    /// Subscribers summed over both recognition topics.
    pub recognition_subscribers: usize,
}

impl Demand {
    pub fn wants_image(&self) -> bool {
        self.always_on || self.image_subscribers > 0 || self.wants_recognition()
    }

    pub fn wants_recognition(&self) -> bool {
        self.recognition_subscribers > 0
    }
}

/// Last commanded device state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnablementState {
    pub image_enabled: bool,
    /// `None` when the device has no recognition sub-mode.
    pub recognition_enabled: Option<bool>,
}

/// Two-axis enable/disable state machine.
#[derive(Debug, Clone)]
pub struct EnablementController {
    state: EnablementState,
    sampling_period_ms: u32,
}

impl EnablementController {
    /// Both axes start disabled.  `sampling_period_ms` is passed to every
    /// enable command.
    pub fn new(recognition_supported: bool, sampling_period_ms: u32) -> Self {
        Self {
            state: EnablementState {
                image_enabled: false,
                recognition_enabled: recognition_supported.then_some(false),
            },
            sampling_period_ms,
        }
    }

    pub fn state(&self) -> EnablementState {
        self.state
    }

    /// Bring `device` in line with `demand` and return the new state.
    pub fn update<D: CameraDevice + ?Sized>(
        &mut self,
        demand: &Demand,
        device: &mut D,
    ) -> EnablementState {
        let want_image = demand.wants_image();
        if want_image != self.state.image_enabled {
            if want_image {
                device.enable(self.sampling_period_ms);
            } else {
                device.disable();
            }
            info!(
                camera = %device.name(),
                enabled = want_image,
                sampling_period_ms = self.sampling_period_ms,
                "image capture toggled"
            );
            self.state.image_enabled = want_image;
        }

        if let Some(enabled) = self.state.recognition_enabled {
            let want_recognition = demand.wants_recognition();
            if want_recognition != enabled {
                if want_recognition {
                    device.recognition_enable(self.sampling_period_ms);
                } else {
                    device.recognition_disable();
                }
                info!(
                    camera = %device.name(),
                    enabled = want_recognition,
                    "recognition toggled"
                );
                self.state.recognition_enabled = Some(want_recognition);
            }
        }

        self.state
    }
}
