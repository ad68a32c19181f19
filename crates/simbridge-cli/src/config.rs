//! Bridge configuration – reads/writes `~/.simbridge/config.toml`.

use serde::{Deserialize, Serialize};
use simbridge_hal::RecognitionObject;
use simbridge_types::BridgeError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Simulation step length in milliseconds.
    #[serde(default = "default_basic_timestep_ms")]
    pub basic_timestep_ms: u32,

    /// Steps to run before exiting; `0` runs until Ctrl-C.
    #[serde(default)]
    pub steps: u64,

    /// Pace the loop to wall-clock time.
    #[serde(default = "default_true")]
    pub realtime: bool,

    /// Stamp headers with simulation time instead of wall-clock time.
    #[serde(default = "default_true")]
    pub use_sim_time: bool,

    /// Topics to subscribe to in-process, creating demand.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monitor: Vec<String>,

    /// Simulated camera configuration.
    #[serde(default)]
    pub camera: CameraConfig,

    /// Objects the simulated recognition sub-mode reports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_name")]
    pub name: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Horizontal field of view in radians.
    #[serde(default = "default_fov")]
    pub fov: f64,
    #[serde(default)]
    pub recognition: bool,
    /// Publish rate in Hz; unset publishes every step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_rate: Option<f64>,
    #[serde(default)]
    pub always_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_name: Option<String>,
}

/// One scripted recognition result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub id: i32,
    pub model: String,
    /// Camera-relative position in metres (x forward, y left, z up).
    pub position: [f64; 3],
    /// Axis-angle orientation `[ax, ay, az, angle]`.
    #[serde(default = "default_orientation")]
    pub orientation: [f64; 4],
    #[serde(default)]
    pub position_on_image: [i32; 2],
    #[serde(default)]
    pub size_on_image: [i32; 2],
    #[serde(default)]
    pub colors: Vec<[f64; 3]>,
}

impl From<&ObjectConfig> for RecognitionObject {
    fn from(o: &ObjectConfig) -> Self {
        RecognitionObject {
            id: o.id,
            model: o.model.clone(),
            position: o.position,
            orientation: o.orientation,
            position_on_image: o.position_on_image,
            size_on_image: o.size_on_image,
            colors: o.colors.clone(),
        }
    }
}

fn default_basic_timestep_ms() -> u32 {
    32
}
fn default_true() -> bool {
    true
}
fn default_camera_name() -> String {
    "camera".to_string()
}
fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}
fn default_fov() -> f64 {
    0.785
}
fn default_orientation() -> [f64; 4] {
    [0.0, 0.0, 1.0, 0.0]
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: default_camera_name(),
            width: default_width(),
            height: default_height(),
            fov: default_fov(),
            recognition: false,
            update_rate: None,
            always_on: false,
            topic_name: None,
            frame_name: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            basic_timestep_ms: default_basic_timestep_ms(),
            steps: 0,
            realtime: true,
            use_sim_time: true,
            monitor: Vec::new(),
            objects: Vec::new(),
        }
    }
}

impl CameraConfig {
    /// Plugin parameters in the string-map form a simulator hands to a
    /// plugin.
    pub fn plugin_parameters(&self) -> HashMap<String, String> {
        let mut map = HashMap::from([
            ("name".to_string(), self.name.clone()),
            ("alwaysOn".to_string(), self.always_on.to_string()),
        ]);
        if let Some(rate) = self.update_rate {
            map.insert("updateRate".to_string(), rate.to_string());
        }
        if let Some(topic) = &self.topic_name {
            map.insert("topicName".to_string(), topic.clone());
        }
        if let Some(frame) = &self.frame_name {
            map.insert("frameName".to_string(), frame.clone());
        }
        map
    }
}

/// Return the path to `~/.simbridge/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".simbridge").join("config.toml")
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, BridgeError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        BridgeError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| BridgeError::Config(format!("failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `SIMBRIDGE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SIMBRIDGE_CAMERA_NAME` | `camera.name` |
/// | `SIMBRIDGE_UPDATE_RATE` | `camera.update_rate` |
/// | `SIMBRIDGE_ALWAYS_ON` | `camera.always_on` |
/// | `SIMBRIDGE_BASIC_TIMESTEP_MS` | `basic_timestep_ms` |
/// | `SIMBRIDGE_STEPS` | `steps` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SIMBRIDGE_CAMERA_NAME") {
        cfg.camera.name = v;
    }
    if let Some(v) = var("SIMBRIDGE_UPDATE_RATE")
        && let Ok(rate) = v.parse::<f64>()
    {
        cfg.camera.update_rate = Some(rate);
    }
    if let Some(v) = var("SIMBRIDGE_ALWAYS_ON")
        && let Ok(on) = v.parse::<bool>()
    {
        cfg.camera.always_on = on;
    }
    if let Some(v) = var("SIMBRIDGE_BASIC_TIMESTEP_MS")
        && let Ok(ms) = v.parse::<u32>()
    {
        cfg.basic_timestep_ms = ms;
    }
    if let Some(v) = var("SIMBRIDGE_STEPS")
        && let Ok(steps) = v.parse::<u64>()
    {
        cfg.steps = steps;
    }
}

/// Save the config to `path`, creating its directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), BridgeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BridgeError::Config(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| BridgeError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| BridgeError::Config(format!("failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.camera.name, "camera");
        assert_eq!(loaded.camera.width, 640);
        assert_eq!(loaded.basic_timestep_ms, 32);
        assert!(loaded.use_sim_time);
    }

    #[test]
    fn config_path_points_to_simbridge_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.simbridge/config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("bridge.toml");
        std::fs::write(
            &path,
            r#"
steps = 100
monitor = ["/eye/recognitions"]

[camera]
name = "eye"
recognition = true
update_rate = 15.0

[[objects]]
id = 1
model = "ball"
position = [2.0, 0.0, 0.0]
"#,
        )
        .expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.steps, 100);
        assert_eq!(cfg.camera.name, "eye");
        assert_eq!(cfg.camera.height, 480);
        assert_eq!(cfg.camera.update_rate, Some(15.0));
        assert_eq!(cfg.monitor, vec!["/eye/recognitions"]);
        assert_eq!(cfg.objects.len(), 1);
        assert_eq!(cfg.objects[0].orientation, [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "steps = \"many\"").expect("write");
        assert!(matches!(load_from(&path), Err(BridgeError::Config(_))));
    }

    #[test]
    fn overrides_apply_and_ignore_garbage() {
        let vars = HashMap::from([
            ("SIMBRIDGE_CAMERA_NAME", "left eye"),
            ("SIMBRIDGE_UPDATE_RATE", "30"),
            ("SIMBRIDGE_ALWAYS_ON", "true"),
            ("SIMBRIDGE_BASIC_TIMESTEP_MS", "sixteen"),
        ]);
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.camera.name, "left eye");
        assert_eq!(cfg.camera.update_rate, Some(30.0));
        assert!(cfg.camera.always_on);
        assert_eq!(cfg.basic_timestep_ms, 32);
    }

    #[test]
    fn env_override_changes_always_on() {
        // SAFETY: no other test reads SIMBRIDGE_ALWAYS_ON.
        unsafe { std::env::set_var("SIMBRIDGE_ALWAYS_ON", "true") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert!(cfg.camera.always_on);
        unsafe { std::env::remove_var("SIMBRIDGE_ALWAYS_ON") };
    }

    #[test]
    fn plugin_parameters_use_harness_keys() {
        let camera = CameraConfig {
            update_rate: Some(20.0),
            frame_name: Some("optical".to_string()),
            ..CameraConfig::default()
        };
        let map = camera.plugin_parameters();
        assert_eq!(map["name"], "camera");
        assert_eq!(map["updateRate"], "20");
        assert_eq!(map["frameName"], "optical");
        assert_eq!(map["alwaysOn"], "false");
        assert!(!map.contains_key("topicName"));
    }
}
