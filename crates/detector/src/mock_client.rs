//! Mock detector
//!
//! Procedural synthetic scenes for running the full pipeline without a
//! model: a small rotating label table, jittered boxes sized relative to
//! the frame, and optional box-shaped masks at a reduced internal
//! resolution, the way segmentation models return them.

use contracts::{MaskRaster, PerceptionError, RawDetection, RawFrame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use crate::client::Detector;

/// Labels the mock cycles through, with their class ids.
const SCENE_LABELS: &[(&str, u32)] = &[("person", 0), ("cup", 41), ("chair", 56), ("bottle", 39)];

/// Masks are produced at 1/4 frame resolution.
const MASK_SCALE: u32 = 4;

/// Mock detector configuration
#[derive(Debug, Clone)]
pub struct MockDetectorConfig {
    /// Upper bound on instances per frame; the actual count cycles.
    pub max_instances: usize,
    /// Whether instances carry segmentation masks.
    pub with_masks: bool,
    /// Center of the confidence jitter band.
    pub base_confidence: f32,
}

impl Default for MockDetectorConfig {
    fn default() -> Self {
        Self {
            max_instances: 3,
            with_masks: true,
            base_confidence: 0.85,
        }
    }
}

/// Procedural scene detector.
pub struct MockDetector {
    config: MockDetectorConfig,
    rng: StdRng,
    frame_counter: u64,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::with_config(MockDetectorConfig::default())
    }

    pub fn with_config(config: MockDetectorConfig) -> Self {
        Self::with_config_and_seed(config, rand::rng().random())
    }

    /// Deterministic scenes for tests.
    pub fn with_config_and_seed(config: MockDetectorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            frame_counter: 0,
        }
    }

    /// Frames detected so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    fn make_instance(&mut self, index: usize, width: u32, height: u32) -> RawDetection {
        let (label, class_id) = SCENE_LABELS[(self.frame_counter as usize + index) % SCENE_LABELS.len()];

        let w = width as f32;
        let h = height as f32;
        let x1 = self.rng.random_range(0.0..w * 0.5);
        let y1 = self.rng.random_range(0.0..h * 0.5);
        let x2 = (x1 + self.rng.random_range(w * 0.2..w * 0.5)).min(w - 1.0);
        let y2 = (y1 + self.rng.random_range(h * 0.2..h * 0.5)).min(h - 1.0);

        let confidence = (self.config.base_confidence + self.rng.random_range(-0.1..0.1))
            .clamp(0.0, 1.0);

        let mut detection =
            RawDetection::new(label, class_id, confidence, [x1, y1, x2, y2]);
        if self.config.with_masks {
            detection = detection.with_mask(box_mask([x1, y1, x2, y2], width, height));
        }
        detection
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for MockDetector {
    fn name(&self) -> &str {
        "mock"
    }

    #[instrument(
        name = "mock_detector_detect",
        skip(self, frame),
        fields(width = frame.width, height = frame.height)
    )]
    async fn detect(&mut self, frame: &RawFrame) -> Result<Vec<RawDetection>, PerceptionError> {
        self.frame_counter += 1;

        let max = self.config.max_instances.max(1);
        let count = 1 + (self.frame_counter as usize - 1) % max;
        let instances = (0..count)
            .map(|i| self.make_instance(i, frame.width, frame.height))
            .collect();
        Ok(instances)
    }
}

/// Box-shaped mask at the reduced internal resolution: foreground inside
/// the scaled-down bbox, background elsewhere.
fn box_mask(bbox: [f32; 4], frame_width: u32, frame_height: u32) -> MaskRaster {
    let mask_w = (frame_width / MASK_SCALE).max(1);
    let mask_h = (frame_height / MASK_SCALE).max(1);

    let sx = mask_w as f32 / frame_width as f32;
    let sy = mask_h as f32 / frame_height as f32;
    let x1 = (bbox[0] * sx) as u32;
    let y1 = (bbox[1] * sy) as u32;
    let x2 = ((bbox[2] * sx) as u32).min(mask_w - 1);
    let y2 = ((bbox[3] * sy) as u32).min(mask_h - 1);

    let mut scores = vec![0.0f32; (mask_w * mask_h) as usize];
    for v in y1..=y2 {
        for u in x1..=x2 {
            scores[(v * mask_w + u) as usize] = 1.0;
        }
    }
    MaskRaster::new(mask_w, mask_h, scores)
}
