//! `CameraDevice` trait and the native recognition record.

/// One object reported by the camera's recognition sub-mode.
///
/// Coordinates are in the device's native frame: `position` is relative
/// to the camera, `orientation` is an axis-angle `[ax, ay, az, angle]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionObject {
    pub id: i32,
    pub model: String,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
    /// Bounding-box centre in pixels.
    pub position_on_image: [i32; 2],
    /// Bounding-box size in pixels.
    pub size_on_image: [i32; 2],
    /// RGB samples, channels in `[0, 1]`.
    pub colors: Vec<[f64; 3]>,
}

/// A simulated camera, optionally with object recognition.
///
/// The surrounding host owns the device; sensor plugins borrow it for their
/// whole lifetime through the blanket `&mut T` implementation.
pub trait CameraDevice {
    /// Device name as declared in the robot description, e.g. `"camera"`.
    fn name(&self) -> &str;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Horizontal field of view in radians.
    fn fov(&self) -> f64;

    /// Whether the device carries a recognition sub-mode at all.
    fn has_recognition(&self) -> bool;

    /// Start producing frames every `sampling_period_ms`.
    fn enable(&mut self, sampling_period_ms: u32);

    fn disable(&mut self);

    /// Current sampling period, or `None` while disabled.
    fn sampling_period(&self) -> Option<u32>;

    /// Latest BGRA frame (`4 * width * height` bytes).
    ///
    /// Returns `None` while the device is disabled or has not rendered its
    /// first frame yet.
    fn image(&self) -> Option<&[u8]>;

    fn recognition_enable(&mut self, sampling_period_ms: u32);

    fn recognition_disable(&mut self);

    fn recognition_sampling_period(&self) -> Option<u32>;

    /// Objects recognised during the latest sampling period, in device
    /// enumeration order.
    fn recognition_objects(&self) -> &[RecognitionObject];
}

impl<T: CameraDevice + ?Sized> CameraDevice for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn fov(&self) -> f64 {
        (**self).fov()
    }

    fn has_recognition(&self) -> bool {
        (**self).has_recognition()
    }

    fn enable(&mut self, sampling_period_ms: u32) {
        (**self).enable(sampling_period_ms)
    }

    fn disable(&mut self) {
        (**self).disable()
    }

    fn sampling_period(&self) -> Option<u32> {
        (**self).sampling_period()
    }

    fn image(&self) -> Option<&[u8]> {
        (**self).image()
    }

    fn recognition_enable(&mut self, sampling_period_ms: u32) {
        (**self).recognition_enable(sampling_period_ms)
    }

    fn recognition_disable(&mut self) {
        (**self).recognition_disable()
    }

    fn recognition_sampling_period(&self) -> Option<u32> {
        (**self).recognition_sampling_period()
    }

    fn recognition_objects(&self) -> &[RecognitionObject] {
        (**self).recognition_objects()
    }
}
