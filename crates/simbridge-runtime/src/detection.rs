//! Translation of native recognition records into the two published
//! recognition schemas.
//!
//! Each [`RecognitionObject`] becomes:
//!
//! * a generic [`Detection2D`]: the frame-corrected pose as a single
//!   hypothesis plus the pixel-space bounding box;
//! * a [`CameraRecognitionObject`]: the same pose and box plus the
//!   simulator's id, model name and color samples.
//!
//! The pose is corrected with [`frame_correction`]; the bounding box is
//! copied untouched since it already lives in image space.

use simbridge_hal::RecognitionObject;
use simbridge_perception::{Quaternion, Transform3D, frame_correction};
use simbridge_types::{
    BoundingBox2D, CameraRecognitionObject, CameraRecognitionObjects, ColorRGBA, Detection2D,
    Detection2DArray, Header, ObjectHypothesisWithPose, Point, Pose, Pose2D, PoseWithCovariance,
};

/// Native pose: position copied as-is, axis-angle turned into a quaternion.
pub fn native_pose(object: &RecognitionObject) -> Pose {
    let [x, y, z] = object.position;
    Pose {
        position: Point { x, y, z },
        orientation: Quaternion::from_axis_angle(object.orientation).into(),
    }
}

/// Pixel-space bounding box of `object`.
pub fn bounding_box(object: &RecognitionObject) -> BoundingBox2D {
    BoundingBox2D {
        center: Pose2D {
            x: f64::from(object.position_on_image[0]),
            y: f64::from(object.position_on_image[1]),
            theta: 0.0,
        },
        size_x: f64::from(object.size_on_image[0]),
        size_y: f64::from(object.size_on_image[1]),
    }
}

/// Color samples with the alpha channel left at its default.
pub fn colors(object: &RecognitionObject) -> Vec<ColorRGBA> {
    object
        .colors
        .iter()
        .map(|&[r, g, b]| ColorRGBA {
            r: r as f32,
            g: g as f32,
            b: b as f32,
            ..ColorRGBA::default()
        })
        .collect()
}

/// Both output records for one object.
///
/// The detection's own header stays at its default; stamp and frame live on
/// the enclosing array.
pub fn transform_object(
    object: &RecognitionObject,
    correction: &Transform3D,
) -> (Detection2D, CameraRecognitionObject) {
    let pose = correction.apply_to_pose(&native_pose(object));
    let bbox = bounding_box(object);

    let detection = Detection2D {
        header: Header::default(),
        results: vec![ObjectHypothesisWithPose {
            pose: PoseWithCovariance::new(pose),
            ..ObjectHypothesisWithPose::default()
        }],
        bbox,
    };
    let record = CameraRecognitionObject {
        id: object.id,
        model: object.model.clone(),
        pose,
        bbox,
        colors: colors(object),
    };
    (detection, record)
}

/// Rebuild both collections from scratch for this step's objects.
///
/// The collections keep their headers; only their contents are replaced.
/// Output order matches `objects`.
pub fn fill_collections(
    objects: &[RecognitionObject],
    detections: &mut Detection2DArray,
    records: &mut CameraRecognitionObjects,
) {
    let correction = frame_correction();
    detections.detections.clear();
    records.objects.clear();
    for object in objects {
        let (detection, record) = transform_object(object, &correction);
        detections.detections.push(detection);
        records.objects.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simbridge_perception::Vec3;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    fn object(id: i32, model: &str) -> RecognitionObject {
        RecognitionObject {
            id,
            model: model.to_string(),
            position: [2.0, 0.5, -0.25],
            orientation: [0.0, 0.0, 1.0, FRAC_PI_2],
            position_on_image: [120, 64],
            size_on_image: [30, 18],
            colors: vec![[1.0, 0.5, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    #[test]
    fn native_pose_copies_position_and_converts_orientation() {
        let pose = native_pose(&object(1, "box"));
        assert_eq!(pose.position, Point { x: 2.0, y: 0.5, z: -0.25 });
        let q = Quaternion::from(pose.orientation);
        assert!((q.norm() - 1.0).abs() < 1e-12);
        assert!((q.w - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((q.z - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!(q.x.abs() < 1e-12 && q.y.abs() < 1e-12);
    }

    #[test]
    fn position_is_rotated_into_optical_frame() {
        let (detection, record) = transform_object(&object(1, "box"), &frame_correction());
        // forward 2.0 → z, left 0.5 → -x, up -0.25 → +y
        let p = record.pose.position;
        assert!((p.x + 0.5).abs() < 1e-9);
        assert!((p.y - 0.25).abs() < 1e-9);
        assert!((p.z - 2.0).abs() < 1e-9);
        assert_eq!(detection.results.len(), 1);
        assert_eq!(detection.results[0].pose.pose, record.pose);
        assert_eq!(detection.results[0].score, 0.0);
    }

    #[test]
    fn inverse_correction_recovers_native_orientation() {
        let obj = object(1, "box");
        let correction = frame_correction();
        let (_, record) = transform_object(&obj, &correction);
        let recovered = correction
            .rotation
            .conjugate()
            .mul(Quaternion::from(record.pose.orientation));
        let native = Quaternion::from_axis_angle(obj.orientation);
        let dot = recovered.w * native.w
            + recovered.x * native.x
            + recovered.y * native.y
            + recovered.z * native.z;
        assert!((dot.abs() - 1.0).abs() < 1e-9);

        let back = correction.rotation.conjugate().rotate(Vec3::from(record.pose.position));
        assert!((back.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_is_copied_in_pixels() {
        let (detection, record) = transform_object(&object(1, "box"), &frame_correction());
        assert_eq!(detection.bbox.center.x, 120.0);
        assert_eq!(detection.bbox.center.y, 64.0);
        assert_eq!(detection.bbox.size_x, 30.0);
        assert_eq!(detection.bbox.size_y, 18.0);
        assert_eq!(record.bbox, detection.bbox);
    }

    #[test]
    fn colors_keep_default_alpha() {
        let c = colors(&object(1, "box"));
        assert_eq!(
            c,
            vec![
                ColorRGBA { r: 1.0, g: 0.5, b: 0.0, a: 0.0 },
                ColorRGBA { r: 0.0, g: 0.0, b: 1.0, a: 0.0 },
            ]
        );
    }

    #[test]
    fn collections_are_rebuilt_in_input_order() {
        let mut detections = Detection2DArray {
            header: Header::new("camera"),
            detections: vec![Detection2D::default(); 5],
        };
        let mut records = CameraRecognitionObjects {
            header: Header::new("camera"),
            objects: vec![CameraRecognitionObject::default(); 5],
        };
        let objects = vec![object(3, "apple"), object(1, "pear"), object(2, "plum")];

        fill_collections(&objects, &mut detections, &mut records);

        assert_eq!(detections.detections.len(), 3);
        assert_eq!(records.objects.len(), 3);
        let ids: Vec<i32> = records.objects.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        let models: Vec<&str> = records.objects.iter().map(|o| o.model.as_str()).collect();
        assert_eq!(models, vec!["apple", "pear", "plum"]);
        assert!(detections.detections.iter().all(|d| d.header == Header::default()));
        assert_eq!(detections.header.frame_id, "camera");
    }
}
