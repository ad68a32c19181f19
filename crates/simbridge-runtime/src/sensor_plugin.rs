//! Plumbing shared by every sensor plugin: parameter parsing, publish-rate
//! gating and device sampling-period synchronisation.
//!
//! Plugins are configured from a flat string map, as handed over by the
//! host that loads them:
//!
//! | Key | Meaning | Default |
//! |---|---|---|
//! | `name` | Device name | required |
//! | `topicName` | Base topic | `/<fixed name>` |
//! | `frameName` | Header frame id | `<fixed name>` |
//! | `updateRate` | Publish rate in Hz | every step |
//! | `alwaysOn` | Keep the device on without subscribers | `false` |
//!
//! The *fixed name* is the device name with every character that is not
//! ASCII alphanumeric or `_` replaced by `_`, so `"front camera"` publishes
//! on `/front_camera`.

use std::collections::HashMap;

use simbridge_types::BridgeError;

/// Parsed plugin parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorParameters {
    pub name: String,
    pub topic_name: String,
    pub frame_name: String,
    /// Minimum simulated time between two publishing steps, in seconds.
    /// Zero publishes on every step.
    pub publish_timestep: f64,
    pub always_on: bool,
}

impl SensorParameters {
    /// Defaults for the device `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let fixed = fixed_name(&name);
        Self {
            topic_name: format!("/{fixed}"),
            frame_name: fixed,
            name,
            publish_timestep: 0.0,
            always_on: false,
        }
    }

    /// Parse the host's parameter map.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidParameter`] when `name` is missing, or
    /// when `updateRate` or `alwaysOn` cannot be parsed.
    pub fn from_map(parameters: &HashMap<String, String>) -> Result<Self, BridgeError> {
        let name = parameters
            .get("name")
            .filter(|n| !n.is_empty())
            .ok_or_else(|| BridgeError::InvalidParameter {
                name: "name".to_string(),
                details: "a device name is required".to_string(),
            })?;
        let mut params = Self::new(name.as_str());

        if let Some(topic) = parameters.get("topicName") {
            params.topic_name = topic.clone();
        }
        if let Some(frame) = parameters.get("frameName") {
            params.frame_name = frame.clone();
        }
        if let Some(rate) = parameters.get("updateRate") {
            params.publish_timestep = parse_update_rate(rate)?;
        }
        if let Some(always_on) = parameters.get("alwaysOn") {
            params.always_on = match always_on.trim() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(BridgeError::InvalidParameter {
                        name: "alwaysOn".to_string(),
                        details: format!("expected 'true' or 'false', got '{other}'"),
                    });
                }
            };
        }
        Ok(params)
    }
}

fn parse_update_rate(raw: &str) -> Result<f64, BridgeError> {
    let invalid = |details: String| BridgeError::InvalidParameter {
        name: "updateRate".to_string(),
        details,
    };
    let rate: f64 = raw
        .trim()
        .parse()
        .map_err(|e| invalid(format!("'{raw}' is not a number: {e}")))?;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(invalid(format!("rate must be a positive number of Hz, got {rate}")));
    }
    Ok(1.0 / rate)
}

/// Device name made safe for topic and frame names.
pub fn fixed_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Device sampling period matching a publish period.
///
/// The publish period is rounded down to a whole number of basic
/// simulation steps and never drops below one step, so the device
/// produces fresh data exactly on the steps where the plugin publishes.
pub fn device_timestep_ms(publish_timestep: f64, basic_timestep_ms: u32) -> u32 {
    let basic = basic_timestep_ms.max(1);
    let publish_ms = (publish_timestep * 1000.0) as u32;
    if publish_ms < basic {
        basic
    } else {
        publish_ms / basic * basic
    }
}

/// Gate that lets a step through at most once per publish timestep.
#[derive(Debug, Clone)]
pub struct StepGate {
    publish_timestep: f64,
    last_update: Option<f64>,
}

impl StepGate {
    pub fn new(publish_timestep: f64) -> Self {
        Self {
            publish_timestep,
            last_update: None,
        }
    }

    /// Return `true` when the plugin is due to act at simulated time `now`
    /// (seconds), and record `now` as the last accepted step.
    ///
    /// The first call is always accepted.
    pub fn pre_step(&mut self, now: f64) -> bool {
        if let Some(last) = self.last_update
            && now - last < self.publish_timestep
        {
            return false;
        }
        self.last_update = Some(now);
        true
    }

    pub fn last_update(&self) -> Option<f64> {
        self.last_update
    }
}
