//! Per-box fusion: clipping, centroid depth lookup and back-projection.
//!
//! Pure computation, no publishing. Every lookup failure downgrades the
//! affected field to "unavailable" instead of failing the frame: a frame
//! with no depth still yields records, they just carry null distance and
//! position.

use contracts::{DetectionRecord, RawDetection, RawFrame};

use crate::camera::CameraModel;

/// Round to 2 decimal places for reported confidences and distances.
pub(crate) fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Round to millimeter precision for reported positions.
pub(crate) fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}

/// Clip a possibly-fractional, possibly-out-of-frame box to valid pixel
/// coordinates. Truncates toward zero like the detector's integer cast.
pub(crate) fn clip_bbox(bbox: [f32; 4], width: u32, height: u32) -> [i32; 4] {
    let max_x = (width as i32 - 1).max(0);
    let max_y = (height as i32 - 1).max(0);
    [
        (bbox[0] as i32).clamp(0, max_x),
        (bbox[1] as i32).clamp(0, max_y),
        (bbox[2] as i32).clamp(0, max_x),
        (bbox[3] as i32).clamp(0, max_y),
    ]
}

/// Fuses one detector instance with the color frame, cached depth and
/// camera model into a published record.
pub struct DetectionFuser<'a> {
    threshold: f32,
    camera: &'a CameraModel,
    color: &'a RawFrame,
    depth: Option<&'a RawFrame>,
}

impl<'a> DetectionFuser<'a> {
    pub fn new(
        threshold: f32,
        camera: &'a CameraModel,
        color: &'a RawFrame,
        depth: Option<&'a RawFrame>,
    ) -> Self {
        Self {
            threshold,
            camera,
            color,
            depth,
        }
    }

    /// Build the record for one instance, or `None` if it fails the
    /// confidence filter.
    pub fn fuse(&self, detection: &RawDetection) -> Option<DetectionRecord> {
        if detection.confidence < self.threshold {
            return None;
        }

        let bbox = clip_bbox(detection.bbox, self.color.width, self.color.height);
        // Truncating division, both coordinates are non-negative after clipping
        let center = [(bbox[0] + bbox[2]) / 2, (bbox[1] + bbox[3]) / 2];

        let avg_bgr = self.box_mean_bgr(bbox);

        let raw_depth = self
            .depth
            .and_then(|d| d.depth_at(center[0] as u32, center[1] as u32));
        let distance_m = raw_depth.map(round2);
        let position_camera = raw_depth
            .and_then(|z| self.camera.project(center[0], center[1], z))
            .map(|p| [round3(p.x), round3(p.y), round3(p.z)]);

        Some(DetectionRecord {
            label: detection.label.clone(),
            confidence: round2(detection.confidence),
            bbox,
            center,
            distance_m,
            position_camera,
            mask_3d_points: 0,
            avg_bgr,
        })
    }

    /// Mean BGR over the clipped box, inclusive of both corners. A box that
    /// inverted during clipping has zero area; a non-color frame has no
    /// channel statistic. Both report "unavailable".
    fn box_mean_bgr(&self, bbox: [i32; 4]) -> Option<[f32; 3]> {
        let bgr = self.color.as_bgr()?;
        let [x1, y1, x2, y2] = bbox;
        if x1 > x2 || y1 > y2 {
            return None;
        }

        let row_stride = self.color.width as usize * 3;
        let mut sums = [0f64; 3];
        let mut count = 0u32;
        for v in y1 as usize..=y2 as usize {
            let row = v * row_stride;
            for u in x1 as usize..=x2 as usize {
                let px = row + u * 3;
                sums[0] += bgr[px] as f64;
                sums[1] += bgr[px + 1] as f64;
                sums[2] += bgr[px + 2] as f64;
                count += 1;
            }
        }

        let n = count as f64;
        Some([
            (sums[0] / n) as f32,
            (sums[1] / n) as f32,
            (sums[2] / n) as f32,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{PixelData, PixelFormat, Stamp};
    use std::sync::Arc;

    fn color_frame(width: u32, height: u32, bgr: [u8; 3]) -> RawFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&bgr);
        }
        RawFrame {
            width,
            height,
            format: PixelFormat::Bgr8,
            stamp: Stamp::default(),
            pixels: PixelData::Bgr8(Bytes::from(data)),
        }
    }

    fn depth_frame(width: u32, height: u32, value: f32) -> RawFrame {
        let plane: Arc<[f32]> = vec![value; (width * height) as usize].into();
        RawFrame {
            width,
            height,
            format: PixelFormat::Depth32F,
            stamp: Stamp::default(),
            pixels: PixelData::DepthMeters(plane),
        }
    }

    fn detection(confidence: f32, bbox: [f32; 4]) -> RawDetection {
        RawDetection::new("person", 0, confidence, bbox)
    }

    #[test]
    fn test_confidence_filter() {
        let camera = CameraModel::new();
        let color = color_frame(4, 4, [0, 0, 0]);
        let fuser = DetectionFuser::new(0.5, &camera, &color, None);

        assert!(fuser.fuse(&detection(0.49, [0.0, 0.0, 3.0, 3.0])).is_none());
        // Exactly at the threshold is kept
        assert!(fuser.fuse(&detection(0.5, [0.0, 0.0, 3.0, 3.0])).is_some());
    }

    #[test]
    fn test_bbox_clipped_and_center_truncated() {
        let camera = CameraModel::new();
        let color = color_frame(4, 4, [0, 0, 0]);
        let fuser = DetectionFuser::new(0.5, &camera, &color, None);

        let record = fuser
            .fuse(&detection(0.9, [-10.0, -10.0, 100.0, 100.0]))
            .unwrap();
        assert_eq!(record.bbox, [0, 0, 3, 3]);
        assert_eq!(record.center, [1, 1]);
    }

    #[test]
    fn test_distance_and_position_with_full_context() {
        let camera = CameraModel::new();
        camera.set_intrinsics(1.0, 1.0, 2.0, 2.0);
        let color = color_frame(4, 4, [10, 20, 30]);
        let depth = depth_frame(4, 4, 2.0);
        let fuser = DetectionFuser::new(0.5, &camera, &color, Some(&depth));

        let record = fuser.fuse(&detection(0.9, [0.0, 0.0, 3.0, 3.0])).unwrap();
        assert_eq!(record.center, [1, 1]);
        assert_eq!(record.distance_m, Some(2.0));
        assert_eq!(record.position_camera, Some([-2.0, -2.0, 2.0]));
    }

    #[test]
    fn test_no_depth_yields_nulls() {
        let camera = CameraModel::new();
        camera.set_intrinsics(525.0, 525.0, 320.0, 240.0);
        let color = color_frame(4, 4, [0, 0, 0]);
        let fuser = DetectionFuser::new(0.5, &camera, &color, None);

        let record = fuser.fuse(&detection(0.9, [0.0, 0.0, 3.0, 3.0])).unwrap();
        assert_eq!(record.distance_m, None);
        assert_eq!(record.position_camera, None);
    }

    #[test]
    fn test_center_outside_smaller_depth_frame() {
        let camera = CameraModel::new();
        camera.set_intrinsics(525.0, 525.0, 320.0, 240.0);
        let color = color_frame(8, 8, [0, 0, 0]);
        let depth = depth_frame(2, 2, 1.5);
        let fuser = DetectionFuser::new(0.5, &camera, &color, Some(&depth));

        // Center (5, 5) is out of bounds for a 2x2 depth frame
        let record = fuser.fuse(&detection(0.9, [4.0, 4.0, 7.0, 7.0])).unwrap();
        assert_eq!(record.distance_m, None);
        assert_eq!(record.position_camera, None);
    }

    #[test]
    fn test_zero_depth_reports_distance_but_no_position() {
        let camera = CameraModel::new();
        camera.set_intrinsics(525.0, 525.0, 320.0, 240.0);
        let color = color_frame(4, 4, [0, 0, 0]);
        let depth = depth_frame(4, 4, 0.0);
        let fuser = DetectionFuser::new(0.5, &camera, &color, Some(&depth));

        let record = fuser.fuse(&detection(0.9, [0.0, 0.0, 3.0, 3.0])).unwrap();
        // The raw sensor reading is reported as-is
        assert_eq!(record.distance_m, Some(0.0));
        // But a non-positive depth never projects
        assert_eq!(record.position_camera, None);
    }

    #[test]
    fn test_uncalibrated_camera_yields_null_position() {
        let camera = CameraModel::new();
        let color = color_frame(4, 4, [0, 0, 0]);
        let depth = depth_frame(4, 4, 2.0);
        let fuser = DetectionFuser::new(0.5, &camera, &color, Some(&depth));

        let record = fuser.fuse(&detection(0.9, [0.0, 0.0, 3.0, 3.0])).unwrap();
        assert_eq!(record.distance_m, Some(2.0));
        assert_eq!(record.position_camera, None);
    }

    #[test]
    fn test_avg_bgr_over_box() {
        let camera = CameraModel::new();
        let color = color_frame(4, 4, [12, 34, 56]);
        let fuser = DetectionFuser::new(0.5, &camera, &color, None);

        let record = fuser.fuse(&detection(0.9, [1.0, 1.0, 2.0, 2.0])).unwrap();
        let avg = record.avg_bgr.unwrap();
        assert_eq!(avg, [12.0, 34.0, 56.0]);
    }

    #[test]
    fn test_inverted_box_has_no_color_stat() {
        let camera = CameraModel::new();
        let color = color_frame(4, 4, [12, 34, 56]);
        let fuser = DetectionFuser::new(0.5, &camera, &color, None);

        // x1 > x2 stays inverted after clipping
        let record = fuser.fuse(&detection(0.9, [3.0, 3.0, 0.0, 0.0])).unwrap();
        assert_eq!(record.avg_bgr, None);
        // Center is still computed from the clipped corners
        assert_eq!(record.center, [1, 1]);
    }

    #[test]
    fn test_mono_frame_has_no_color_stat() {
        let camera = CameraModel::new();
        let mono = RawFrame {
            width: 4,
            height: 4,
            format: PixelFormat::Mono8,
            stamp: Stamp::default(),
            pixels: PixelData::Mono8(Bytes::from(vec![128u8; 16])),
        };
        let fuser = DetectionFuser::new(0.5, &camera, &mono, None);

        let record = fuser.fuse(&detection(0.9, [0.0, 0.0, 3.0, 3.0])).unwrap();
        assert_eq!(record.avg_bgr, None);
        assert_eq!(record.center, [1, 1]);
    }

    #[test]
    fn test_confidence_rounding() {
        let camera = CameraModel::new();
        let color = color_frame(4, 4, [0, 0, 0]);
        let fuser = DetectionFuser::new(0.5, &camera, &color, None);

        let record = fuser.fuse(&detection(0.876, [0.0, 0.0, 3.0, 3.0])).unwrap();
        assert_eq!(record.confidence, 0.88);
    }
}
