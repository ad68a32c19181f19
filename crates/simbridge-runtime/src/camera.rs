//! [`CameraPlugin`] – publishes a simulated camera on the bus on demand.
//!
//! Topics, relative to the plugin's base topic `<topic>`:
//!
//! | Topic | Message | Present |
//! |---|---|---|
//! | `<topic>` | [`Image`] (BGRA, 4 bytes/pixel) | always |
//! | `<topic>/camera_info` | [`CameraInfo`] | always |
//! | `<topic>/recognitions` | [`Detection2DArray`] | recognition cameras |
//! | `<topic>/recognitions/webots` | [`CameraRecognitionObjects`] | recognition cameras |
//!
//! All topics use the sensor-data QoS made reliable.
//!
//! Each accepted [`step`][CameraPlugin::step]:
//!
//! 1. reads the subscriber counts and updates the [`EnablementController`];
//! 2. publishes the latest frame if forced on or the image topic is
//!    subscribed, skipping silently while the device has no frame yet;
//! 3. publishes both recognition collections if a recognition topic is
//!    subscribed and at least one object was recognised;
//! 4. republishes the cached calibration with a fresh stamp if the
//!    calibration topic is subscribed.
//!
//! The image and recognition messages are allocated once at construction
//! and overwritten in place on every publish.

use chrono::Utc;
use simbridge_hal::CameraDevice;
use simbridge_middleware::{EventBus, Publisher, QosProfile};
use simbridge_perception::PinholeModel;
use simbridge_types::{
    BridgeError, CameraInfo, CameraRecognitionObjects, Detection2DArray, ENCODING_BGRA8, Header,
    Image, Message, Time,
};
use tracing::{debug, info, warn};

use crate::detection::fill_collections;
use crate::enablement::{Demand, EnablementController, EnablementState};
use crate::sensor_plugin::{SensorParameters, StepGate, device_timestep_ms};

const BYTES_PER_PIXEL: usize = 4;

/// Where header stamps come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StampSource {
    /// Simulation time passed to [`CameraPlugin::step`].
    #[default]
    Simulation,
    /// Wall-clock time at publish.
    Wall,
}

/// What one call to [`CameraPlugin::step`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// `false` when the publish gate skipped the whole step.
    pub ran: bool,
    pub image_published: bool,
    /// Both recognition collections were published.
    pub recognitions_published: bool,
    pub camera_info_published: bool,
    pub state: EnablementState,
}

struct RecognitionPublishers {
    detections: Publisher,
    objects: Publisher,
}

impl RecognitionPublishers {
    fn subscription_count(&self) -> usize {
        self.detections.subscription_count() + self.objects.subscription_count()
    }
}

/// Bridges one [`CameraDevice`] to the bus.
///
/// `D` may be an owned device or a `&mut` borrow of a device owned by the
/// host.
pub struct CameraPlugin<D: CameraDevice> {
    device: D,
    params: SensorParameters,
    gate: StepGate,
    controller: EnablementController,
    stamp_source: StampSource,
    image_publisher: Publisher,
    camera_info_publisher: Publisher,
    recognition: Option<RecognitionPublishers>,
    image: Image,
    camera_info: CameraInfo,
    detections: Detection2DArray,
    objects: CameraRecognitionObjects,
}

impl<D: CameraDevice> CameraPlugin<D> {
    /// Set up publishers and cached messages for `device`.
    ///
    /// # Errors
    ///
    /// * [`BridgeError::DeviceUnavailable`] – `device` is not the device
    ///   named in `params`.
    /// * [`BridgeError::InvalidParameter`] – `basic_timestep_ms` is zero.
    /// * [`BridgeError::InvalidOptics`] – the device reports an empty
    ///   image or an unusable field of view.
    pub fn new(
        device: D,
        bus: &EventBus,
        params: SensorParameters,
        basic_timestep_ms: u32,
        stamp_source: StampSource,
    ) -> Result<Self, BridgeError> {
        if device.name() != params.name {
            return Err(BridgeError::DeviceUnavailable(format!(
                "no camera named '{}' (got '{}')",
                params.name,
                device.name()
            )));
        }
        if basic_timestep_ms == 0 {
            return Err(BridgeError::InvalidParameter {
                name: "basic_timestep_ms".to_string(),
                details: "must be at least 1 ms".to_string(),
            });
        }

        let width = device.width();
        let height = device.height();
        let optics = PinholeModel::from_fov(width, height, device.fov())?;
        let sampling_period_ms = device_timestep_ms(params.publish_timestep, basic_timestep_ms);
        let qos = QosProfile::sensor_data().reliable();

        let image_publisher = bus.create_publisher(params.topic_name.clone(), qos);
        let camera_info_publisher =
            bus.create_publisher(format!("{}/camera_info", params.topic_name), qos);
        let recognition = device.has_recognition().then(|| RecognitionPublishers {
            detections: bus.create_publisher(format!("{}/recognitions", params.topic_name), qos),
            objects: bus.create_publisher(
                format!("{}/recognitions/webots", params.topic_name),
                qos,
            ),
        });

        let image = Image {
            header: Header::new(params.frame_name.as_str()),
            height,
            width,
            encoding: ENCODING_BGRA8.to_string(),
            is_bigendian: false,
            step: BYTES_PER_PIXEL as u32 * width,
            data: vec![0u8; BYTES_PER_PIXEL * width as usize * height as usize],
        };
        let camera_info = optics.to_camera_info(&params.frame_name);

        info!(
            camera = %params.name,
            topic = %params.topic_name,
            width,
            height,
            focal_length = optics.focal_length,
            sampling_period_ms,
            recognition = recognition.is_some(),
            always_on = params.always_on,
            "camera plugin initialised"
        );

        Ok(Self {
            controller: EnablementController::new(recognition.is_some(), sampling_period_ms),
            gate: StepGate::new(params.publish_timestep),
            detections: Detection2DArray {
                header: Header::new(params.frame_name.as_str()),
                detections: Vec::new(),
            },
            objects: CameraRecognitionObjects {
                header: Header::new(params.frame_name.as_str()),
                objects: Vec::new(),
            },
            device,
            params,
            stamp_source,
            image_publisher,
            camera_info_publisher,
            recognition,
            image,
            camera_info,
        })
    }

    /// Run one simulation step at simulated time `sim_time` (seconds).
    pub fn step(&mut self, sim_time: f64) -> StepReport {
        if !self.gate.pre_step(sim_time) {
            return StepReport {
                state: self.controller.state(),
                ..StepReport::default()
            };
        }

        let image_subscribers = self.image_publisher.subscription_count();
        let demand = Demand {
            always_on: self.params.always_on,
            image_subscribers,
            recognition_subscribers: self
                .recognition
                .as_ref()
                .map_or(0, RecognitionPublishers::subscription_count),
        };
        let state = self.controller.update(&demand, &mut self.device);
        let stamp = self.stamp(sim_time);

        let image_published =
            (demand.always_on || image_subscribers > 0) && self.publish_image(stamp);
        let recognitions_published = demand.wants_recognition() && self.publish_recognition(stamp);

        let camera_info_published = self.camera_info_publisher.subscription_count() > 0;
        if camera_info_published {
            self.camera_info.header.stamp = stamp;
            self.camera_info_publisher
                .publish(Message::CameraInfo(self.camera_info.clone()));
        }

        debug!(
            camera = %self.params.name,
            sim_time,
            ?demand,
            image_published,
            recognitions_published,
            camera_info_published,
            "step"
        );

        StepReport {
            ran: true,
            image_published,
            recognitions_published,
            camera_info_published,
            state,
        }
    }

    /// Copy the device's latest frame into the cached image and publish it.
    ///
    /// Returns `false` without publishing while the device has no frame.
    pub fn publish_image(&mut self, stamp: Time) -> bool {
        let Some(frame) = self.device.image() else {
            debug!(camera = %self.params.name, "no frame available yet");
            return false;
        };
        let len = self.image.data.len();
        if frame.len() < len {
            warn!(
                camera = %self.params.name,
                expected = len,
                got = frame.len(),
                "short frame from device; skipped"
            );
            return false;
        }
        self.image.header.stamp = stamp;
        self.image.data.copy_from_slice(&frame[..len]);
        self.image_publisher.publish(Message::Image(self.image.clone()));
        true
    }

    /// Rebuild and publish both recognition collections.
    ///
    /// Returns `false` without publishing on cameras without recognition
    /// and on steps where nothing was recognised.
    pub fn publish_recognition(&mut self, stamp: Time) -> bool {
        let Some(publishers) = &self.recognition else {
            return false;
        };
        let objects = self.device.recognition_objects();
        if objects.is_empty() {
            return false;
        }

        self.detections.header.stamp = stamp;
        self.objects.header.stamp = stamp;
        fill_collections(objects, &mut self.detections, &mut self.objects);

        publishers
            .objects
            .publish(Message::Recognitions(self.objects.clone()));
        publishers
            .detections
            .publish(Message::Detections(self.detections.clone()));
        true
    }

    fn stamp(&self, sim_time: f64) -> Time {
        match self.stamp_source {
            StampSource::Simulation => Time::from_secs_f64(sim_time),
            StampSource::Wall => Time::from(Utc::now()),
        }
    }

    pub fn state(&self) -> EnablementState {
        self.controller.state()
    }

    pub fn parameters(&self) -> &SensorParameters {
        &self.params
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Cached calibration record.
    pub fn camera_info(&self) -> &CameraInfo {
        &self.camera_info
    }

    /// Length of the cached image buffer in bytes.
    pub fn image_buffer_len(&self) -> usize {
        self.image.data.len()
    }
}
