//! FusionConfig - flattened parameters the fusion engine consumes
//!
//! Derived from the blueprint via `PipelineBlueprint::to_fusion_config`;
//! kept separate so the engine does not depend on the full blueprint shape.

use serde::{Deserialize, Serialize};

/// Runtime parameters for the fusion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Instances below this confidence are dropped.
    pub confidence_threshold: f32,
    /// Minimum wall-clock seconds between published frames.
    pub min_publish_interval_s: f64,
    /// Per-instance cap on sampled mask points.
    pub max_points_per_instance: usize,
    /// Exclusive lower depth bound in meters.
    pub depth_min_m: f32,
    /// Exclusive upper depth bound in meters.
    pub depth_max_m: f32,
    /// Coordinate frame stamped onto published clouds.
    pub cloud_frame_id: String,
    /// Whether to attach a color snapshot to each output.
    pub capture_frames: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            min_publish_interval_s: 0.3,
            max_points_per_instance: 3000,
            depth_min_m: 0.0,
            depth_max_m: 10.0,
            cloud_frame_id: "camera_rgb_optical_frame".to_string(),
            capture_frames: false,
        }
    }
}

impl FusionConfig {
    /// Whether a depth sample is usable for projection.
    #[inline]
    pub fn depth_in_range(&self, z: f32) -> bool {
        z.is_finite() && z > self.depth_min_m && z < self.depth_max_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_range_is_exclusive() {
        let config = FusionConfig::default();

        assert!(!config.depth_in_range(0.0));
        assert!(config.depth_in_range(0.001));
        assert!(config.depth_in_range(9.999));
        assert!(!config.depth_in_range(10.0));
        assert!(!config.depth_in_range(12.0));
        assert!(!config.depth_in_range(f32::NAN));
        assert!(!config.depth_in_range(f32::INFINITY));
        assert!(!config.depth_in_range(-1.0));
    }
}
