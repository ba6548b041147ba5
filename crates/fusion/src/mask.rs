//! Instance mask to 3D point projection.
//!
//! Masks arrive at the detector's internal resolution and are resized to
//! frame resolution with nearest-neighbor lookups only. Subsampling to the
//! per-instance cap happens before the depth-validity filter, matching the
//! published wire behavior: the final point count may land below the cap
//! even when the mask had more than enough foreground.

use contracts::{FusionConfig, MaskRaster, RawFrame};
use nalgebra::Point3;
use rand::seq::index::sample;
use rand::Rng;

use crate::camera::CameraModel;

/// Scores above this are foreground after resizing.
const FOREGROUND_THRESHOLD: f32 = 0.5;

/// Projects one instance mask into labeled camera-frame points.
pub struct MaskFuser<'a> {
    config: &'a FusionConfig,
    camera: &'a CameraModel,
    depth: &'a RawFrame,
}

impl<'a> MaskFuser<'a> {
    pub fn new(config: &'a FusionConfig, camera: &'a CameraModel, depth: &'a RawFrame) -> Self {
        Self {
            config,
            camera,
            depth,
        }
    }

    /// Project the mask's foreground into `points`/`labels`, tagging every
    /// point with `class_id`. Returns the number of points emitted.
    ///
    /// The pipeline per pixel: resize (nearest neighbor), binarize, cap by
    /// uniform sampling without replacement, then depth lookup, range
    /// filter and back-projection. Pixels outside the depth frame or with
    /// out-of-range depth are dropped silently.
    pub fn fuse<R: Rng>(
        &self,
        mask: &MaskRaster,
        class_id: u32,
        frame_width: u32,
        frame_height: u32,
        rng: &mut R,
        points: &mut Vec<Point3<f32>>,
        labels: &mut Vec<u32>,
    ) -> u32 {
        let foreground = foreground_pixels(mask, frame_width, frame_height);
        if foreground.is_empty() {
            return 0;
        }

        let cap = self.config.max_points_per_instance;
        let retained: Vec<(u32, u32)> = if foreground.len() > cap {
            sample(rng, foreground.len(), cap)
                .iter()
                .map(|i| foreground[i])
                .collect()
        } else {
            foreground
        };

        let mut emitted = 0u32;
        for (u, v) in retained {
            let Some(z) = self.depth.depth_at(u, v) else {
                continue;
            };
            if !self.config.depth_in_range(z) {
                continue;
            }
            let Some(point) = self.camera.project(u as i32, v as i32, z) else {
                continue;
            };
            points.push(point);
            labels.push(class_id);
            emitted += 1;
        }
        emitted
    }
}

/// Foreground pixel coordinates at frame resolution, row-major.
///
/// Resize and binarize are fused into the scan: each frame pixel reads its
/// nearest source score, so the intermediate raster is never materialized.
fn foreground_pixels(mask: &MaskRaster, width: u32, height: u32) -> Vec<(u32, u32)> {
    if mask.width == 0 || mask.height == 0 || width == 0 || height == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    for v in 0..height {
        let src_v = (v as u64 * mask.height as u64 / height as u64) as u32;
        for u in 0..width {
            let src_u = (u as u64 * mask.width as u64 / width as u64) as u32;
            if mask
                .score_at(src_u, src_v)
                .is_some_and(|s| s > FOREGROUND_THRESHOLD)
            {
                out.push((u, v));
            }
        }
    }
    out
}
