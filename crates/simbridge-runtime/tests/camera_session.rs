//! Full bus + simulated camera sessions driven step by step.

use std::collections::HashMap;
use std::time::Duration;

use simbridge_hal::{CameraDevice, DeviceCommand, RecognitionObject, SimCamera};
use simbridge_middleware::{EventBus, TopicReceiver};
use simbridge_runtime::{CameraPlugin, SensorParameters, StampSource};
use simbridge_types::Message;

const BASIC_TIMESTEP_MS: u32 = 32;

fn params(update_rate: &str) -> SensorParameters {
    let map: HashMap<String, String> = [
        ("name", "front camera"),
        ("frameName", "front_camera_optical"),
        ("updateRate", update_rate),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    SensorParameters::from_map(&map).unwrap()
}

fn camera() -> SimCamera {
    SimCamera::new("front camera", 16, 12, 0.785).with_recognition()
}

fn target(id: i32) -> RecognitionObject {
    RecognitionObject {
        id,
        model: "crate".to_string(),
        position: [3.0, -1.0, 0.5],
        orientation: [0.0, 0.0, 1.0, 0.0],
        position_on_image: [8, 6],
        size_on_image: [4, 3],
        colors: vec![[0.8, 0.1, 0.1]],
    }
}

/// Steps a plugin forward on a shared simulation clock.
struct Session {
    plugin: CameraPlugin<SimCamera>,
    tick: u32,
}

impl Session {
    fn new(update_rate: &str) -> (EventBus, Self) {
        let bus = EventBus::new();
        let plugin = CameraPlugin::new(
            camera(),
            &bus,
            params(update_rate),
            BASIC_TIMESTEP_MS,
            StampSource::Simulation,
        )
        .unwrap();
        (bus, Self { plugin, tick: 0 })
    }

    /// Run `steps` basic steps, rendering a fresh frame before each one.
    fn run(&mut self, steps: u32) {
        for _ in 0..steps {
            let t = f64::from(self.tick * BASIC_TIMESTEP_MS) / 1000.0;
            self.plugin.device_mut().render_pattern(self.tick as u8);
            self.plugin.step(t);
            self.tick += 1;
        }
    }
}

async fn drain(rx: &mut TopicReceiver) -> Vec<Message> {
    let mut out = Vec::new();
    while let Ok(Ok(msg)) = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await {
        out.push(msg);
    }
    out
}

#[tokio::test]
async fn image_subscriber_receives_rate_limited_frames() {
    let (bus, mut session) = Session::new("10");
    let mut rx = bus.subscribe("/front_camera");

    // 0.000 .. 0.288 s; the 100 ms gate accepts 0.000, 0.128 and 0.256.
    // The first accepted step enables the device, so no frame is ready yet;
    // rendering happens before each step, so the later two publish.
    session.run(10);

    let frames = drain(&mut rx).await;
    assert_eq!(frames.len(), 2);
    for msg in &frames {
        let Message::Image(image) = msg else {
            panic!("unexpected message {msg:?}");
        };
        assert_eq!(image.header.frame_id, "front_camera_optical");
        assert_eq!(image.data.len(), 16 * 12 * 4);
    }
    assert_eq!(session.plugin.device().sampling_period(), Some(96));
}

#[tokio::test]
async fn recognition_session_publishes_both_collections() {
    let (bus, mut session) = Session::new("1000");
    let mut detections_rx = bus.subscribe("/front_camera/recognitions");
    let mut objects_rx = bus.subscribe("/front_camera/recognitions/webots");

    // Nothing in view: no recognition messages at all.
    session.run(3);
    assert!(drain(&mut detections_rx).await.is_empty());
    assert!(drain(&mut objects_rx).await.is_empty());

    session.plugin.device_mut().set_objects(vec![target(7), target(8)]);
    session.run(1);

    let detections = drain(&mut detections_rx).await;
    let objects = drain(&mut objects_rx).await;
    assert_eq!(detections.len(), 1);
    assert_eq!(objects.len(), 1);
    let Message::Detections(array) = &detections[0] else {
        panic!("expected detections");
    };
    let Message::Recognitions(records) = &objects[0] else {
        panic!("expected recognition objects");
    };
    assert_eq!(array.detections.len(), 2);
    assert_eq!(records.objects.len(), 2);
    // Forward 3 m, right 1 m, up 0.5 m in the optical frame.
    let p = records.objects[0].pose.position;
    assert!((p.x - 1.0).abs() < 1e-9);
    assert!((p.y + 0.5).abs() < 1e-9);
    assert!((p.z - 3.0).abs() < 1e-9);
    assert_eq!(array.detections[0].results[0].pose.pose, records.objects[0].pose);
}

#[tokio::test]
async fn camera_info_heartbeat_while_subscribed() {
    let (bus, mut session) = Session::new("1000");
    let mut rx = bus.subscribe("/front_camera/camera_info");

    session.run(4);
    let infos = drain(&mut rx).await;
    assert_eq!(infos.len(), 4);
    let stamps: Vec<_> = infos.iter().map(|m| m.header().stamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    for msg in &infos {
        let Message::CameraInfo(info) = msg else {
            panic!("expected camera info");
        };
        assert_eq!(info.k, session.plugin.camera_info().k);
        assert_eq!(info.width, 16);
        assert_eq!(info.height, 12);
    }
    // Calibration demand alone never powers the camera.
    assert!(session.plugin.device().commands().is_empty());
}

#[tokio::test]
async fn subscribers_coming_and_going_toggle_the_device() {
    let (bus, mut session) = Session::new("1000");

    session.run(2);
    let rx = bus.subscribe("/front_camera");
    session.run(2);
    drop(rx);
    session.run(2);
    let rx = bus.subscribe("/front_camera/recognitions");
    session.run(1);
    drop(rx);
    session.run(1);

    assert_eq!(
        session.plugin.device().commands(),
        &[
            DeviceCommand::Enable(32),
            DeviceCommand::Disable,
            DeviceCommand::Enable(32),
            DeviceCommand::RecognitionEnable(32),
            DeviceCommand::Disable,
            DeviceCommand::RecognitionDisable,
        ]
    );
    assert_eq!(session.plugin.image_buffer_len(), 16 * 12 * 4);
}
