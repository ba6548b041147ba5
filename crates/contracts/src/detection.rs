//! Detection types - raw detector output and the published record shape
//!
//! `RawDetection` is what an inference backend hands back; `DetectionRecord`
//! is the exact JSON shape published per instance. The published shape is a
//! wire contract: field names and rounding must not drift.

use serde::{Deserialize, Serialize};

// ===== Detector output =====

/// Instance segmentation mask at the detector's native resolution.
///
/// Scores are row-major floats in [0, 1]; the fusion stage resizes to frame
/// resolution and binarizes at 0.5.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskRaster {
    pub width: u32,
    pub height: u32,
    pub scores: Vec<f32>,
}

impl MaskRaster {
    pub fn new(width: u32, height: u32, scores: Vec<f32>) -> Self {
        debug_assert_eq!(scores.len(), (width * height) as usize);
        Self {
            width,
            height,
            scores,
        }
    }

    /// Mask filled with a single score, handy for tests.
    pub fn filled(width: u32, height: u32, score: f32) -> Self {
        Self {
            width,
            height,
            scores: vec![score; (width * height) as usize],
        }
    }

    pub fn score_at(&self, u: u32, v: u32) -> Option<f32> {
        if u >= self.width || v >= self.height {
            return None;
        }
        Some(self.scores[v as usize * self.width as usize + u as usize])
    }
}

/// One detected instance, straight from the inference backend.
///
/// Bounding box is `[x1, y1, x2, y2]` in pixel coordinates, possibly
/// fractional and possibly out of frame bounds; fusion clips it.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub label: String,
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: [f32; 4],
    pub mask: Option<MaskRaster>,
}

impl RawDetection {
    pub fn new(label: impl Into<String>, class_id: u32, confidence: f32, bbox: [f32; 4]) -> Self {
        Self {
            label: label.into(),
            class_id,
            confidence,
            bbox,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: MaskRaster) -> Self {
        self.mask = Some(mask);
        self
    }
}

// ===== Published record =====

/// Per-instance record as published on the detections topic.
///
/// Serialized field order and names match the downstream consumers:
/// `{label, confidence, bbox, center, distance_m, position_camera,
/// mask_3d_points}`. `distance_m` and `position_camera` serialize as
/// `null` when depth or calibration was unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub label: String,
    /// Confidence rounded to 2 decimal places.
    pub confidence: f32,
    /// Box clipped to frame bounds, `[x1, y1, x2, y2]` as integers.
    pub bbox: [i32; 4],
    /// Box center `[cx, cy]` via truncating integer division.
    pub center: [i32; 2],
    /// Depth at center in meters, rounded to 2 decimal places.
    pub distance_m: Option<f32>,
    /// Camera-frame position `[x, y, z]`, each rounded to 3 decimal places.
    pub position_camera: Option<[f32; 3]>,
    /// Number of 3D points emitted for this instance's mask.
    pub mask_3d_points: u32,
    /// Mean BGR over the clipped box. Logged for operators, never published.
    #[serde(skip)]
    pub avg_bgr: Option<[f32; 3]>,
}
