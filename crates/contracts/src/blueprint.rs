//! PipelineBlueprint - declarative pipeline configuration
//!
//! The blueprint is the single document an operator edits: bus endpoint,
//! stream topics, detector settings, fusion parameters and output sinks.
//! Every field has a serde default so a minimal file (or none at all)
//! yields a working mock pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::fusion_config::FusionConfig;

// ===== Defaults =====

fn default_version() -> String {
    "1".to_string()
}

fn default_bus_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bus_port() -> u16 {
    9090
}

fn default_color_topic() -> String {
    "/camera/rgb/image_raw".to_string()
}

fn default_depth_topic() -> String {
    "/camera/depth/image_raw".to_string()
}

fn default_camera_info_topic() -> String {
    "/camera/rgb/camera_info".to_string()
}

fn default_model_path() -> String {
    "/workspace/weights/yolo/yolo26m-seg.pt".to_string()
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_detector_timeout_ms() -> u64 {
    2000
}

fn default_min_publish_interval_s() -> f64 {
    0.3
}

fn default_max_points_per_instance() -> usize {
    3000
}

fn default_depth_min_m() -> f32 {
    0.0
}

fn default_depth_max_m() -> f32 {
    10.0
}

fn default_capture_directory() -> String {
    "captures".to_string()
}

fn default_detections_topic() -> String {
    "/perception/detections".to_string()
}

fn default_cloud_topic() -> String {
    "/perception/cloud".to_string()
}

fn default_cloud_frame_id() -> String {
    "camera_rgb_optical_frame".to_string()
}

fn default_queue_capacity() -> usize {
    100
}

// ===== Blueprint sections =====

/// Message bus endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BusEndpoint {
    #[serde(default = "default_bus_host")]
    #[validate(length(min = 1, message = "bus host must not be empty"))]
    pub host: String,
    #[serde(default = "default_bus_port")]
    #[validate(range(min = 1, message = "bus port must be non-zero"))]
    pub port: u16,
}

impl Default for BusEndpoint {
    fn default() -> Self {
        Self {
            host: default_bus_host(),
            port: default_bus_port(),
        }
    }
}

impl BusEndpoint {
    /// Websocket URL for this endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// Input stream topics.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StreamTopics {
    #[serde(default = "default_color_topic")]
    #[validate(length(min = 1, message = "color topic must not be empty"))]
    pub color: String,
    #[serde(default = "default_depth_topic")]
    #[validate(length(min = 1, message = "depth topic must not be empty"))]
    pub depth: String,
    #[serde(default = "default_camera_info_topic")]
    #[validate(length(min = 1, message = "camera_info topic must not be empty"))]
    pub camera_info: String,
}

impl Default for StreamTopics {
    fn default() -> Self {
        Self {
            color: default_color_topic(),
            depth: default_depth_topic(),
            camera_info: default_camera_info_topic(),
        }
    }
}

/// Which detector implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorBackend {
    /// Procedural scenes, no model file needed.
    #[default]
    Mock,
    /// Pre-scripted outputs, mainly for tests and replay.
    Scripted,
}

impl DetectorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Scripted => "scripted",
        }
    }
}

/// Detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectorSettings {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_confidence_threshold")]
    #[validate(range(
        min = 0.0,
        max = 1.0,
        message = "confidence threshold must be within [0, 1]"
    ))]
    pub confidence_threshold: f32,
    #[serde(default = "default_detector_timeout_ms")]
    #[validate(range(min = 1, message = "detector timeout must be non-zero"))]
    pub timeout_ms: u64,
    #[serde(default)]
    pub backend: DetectorBackend,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            confidence_threshold: default_confidence_threshold(),
            timeout_ms: default_detector_timeout_ms(),
            backend: DetectorBackend::default(),
        }
    }
}

/// Frame capture settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CaptureSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_capture_directory")]
    #[validate(length(min = 1, message = "capture directory must not be empty"))]
    pub directory: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_capture_directory(),
        }
    }
}

/// Fusion stage parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FusionSettings {
    /// Minimum wall-clock seconds between published frames.
    #[serde(default = "default_min_publish_interval_s")]
    #[validate(range(min = 0.0, message = "publish interval must be non-negative"))]
    pub min_publish_interval_s: f64,
    /// Per-instance cap on sampled mask points.
    #[serde(default = "default_max_points_per_instance")]
    #[validate(range(min = 1, message = "max points per instance must be non-zero"))]
    pub max_points_per_instance: usize,
    /// Depth values at or below this are treated as invalid.
    #[serde(default = "default_depth_min_m")]
    pub depth_min_m: f32,
    /// Depth values at or above this are treated as invalid.
    #[serde(default = "default_depth_max_m")]
    #[validate(range(min = 0.001, message = "depth ceiling must be positive"))]
    pub depth_max_m: f32,
    #[serde(default)]
    #[validate(nested)]
    pub capture: CaptureSettings,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            min_publish_interval_s: default_min_publish_interval_s(),
            max_points_per_instance: default_max_points_per_instance(),
            depth_min_m: default_depth_min_m(),
            depth_max_m: default_depth_max_m(),
            capture: CaptureSettings::default(),
        }
    }
}

/// Output topics for published results.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OutputTopics {
    #[serde(default = "default_detections_topic")]
    #[validate(length(min = 1, message = "detections topic must not be empty"))]
    pub detections: String,
    #[serde(default = "default_cloud_topic")]
    #[validate(length(min = 1, message = "cloud topic must not be empty"))]
    pub cloud: String,
    #[serde(default = "default_cloud_frame_id")]
    #[validate(length(min = 1, message = "cloud frame_id must not be empty"))]
    pub cloud_frame_id: String,
}

impl Default for OutputTopics {
    fn default() -> Self {
        Self {
            detections: default_detections_topic(),
            cloud: default_cloud_topic(),
            cloud_frame_id: default_cloud_frame_id(),
        }
    }
}

/// Kind of output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Structured console output.
    Log,
    /// PLY point clouds and snapshots on disk.
    File,
    /// Publish back onto the message bus.
    Network,
}

impl SinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::File => "file",
            Self::Network => "network",
        }
    }
}

/// One configured output sink.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    #[validate(length(min = 1, message = "sink name must not be empty"))]
    pub name: String,
    #[serde(rename = "type")]
    pub sink_type: SinkType,
    /// Per-sink queue depth; output is dropped when the queue is full.
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "queue capacity must be non-zero"))]
    pub queue_capacity: usize,
    /// Sink-specific parameters (e.g. `directory` for the file sink).
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

// ===== Blueprint root =====

/// Root pipeline configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PipelineBlueprint {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    #[validate(nested)]
    pub bus: BusEndpoint,
    #[serde(default)]
    #[validate(nested)]
    pub streams: StreamTopics,
    #[serde(default)]
    #[validate(nested)]
    pub detector: DetectorSettings,
    #[serde(default)]
    #[validate(nested)]
    pub fusion: FusionSettings,
    #[serde(default)]
    #[validate(nested)]
    pub outputs: OutputTopics,
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

impl PipelineBlueprint {
    /// Flatten the fusion-relevant parts into the engine's config.
    pub fn to_fusion_config(&self) -> FusionConfig {
        FusionConfig {
            confidence_threshold: self.detector.confidence_threshold,
            min_publish_interval_s: self.fusion.min_publish_interval_s,
            max_points_per_instance: self.fusion.max_points_per_instance,
            depth_min_m: self.fusion.depth_min_m,
            depth_max_m: self.fusion.depth_max_m,
            cloud_frame_id: self.outputs.cloud_frame_id.clone(),
            capture_frames: self.fusion.capture.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let blueprint: PipelineBlueprint = toml::from_str("").unwrap();

        assert_eq!(blueprint.bus.host, "127.0.0.1");
        assert_eq!(blueprint.bus.port, 9090);
        assert_eq!(blueprint.streams.color, "/camera/rgb/image_raw");
        assert_eq!(blueprint.streams.depth, "/camera/depth/image_raw");
        assert_eq!(blueprint.streams.camera_info, "/camera/rgb/camera_info");
        assert_eq!(blueprint.detector.confidence_threshold, 0.5);
        assert_eq!(blueprint.detector.backend, DetectorBackend::Mock);
        assert_eq!(blueprint.fusion.min_publish_interval_s, 0.3);
        assert_eq!(blueprint.fusion.max_points_per_instance, 3000);
        assert_eq!(blueprint.fusion.depth_max_m, 10.0);
        assert_eq!(blueprint.outputs.detections, "/perception/detections");
        assert_eq!(blueprint.outputs.cloud_frame_id, "camera_rgb_optical_frame");
        assert!(blueprint.sinks.is_empty());
    }

    #[test]
    fn test_validation_rejects_bad_confidence() {
        let mut blueprint = PipelineBlueprint::default();
        blueprint.detector.confidence_threshold = 1.5;
        assert!(blueprint.validate().is_err());

        blueprint.detector.confidence_threshold = 0.5;
        assert!(blueprint.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_topic() {
        let mut blueprint = PipelineBlueprint::default();
        blueprint.streams.depth = String::new();
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn test_sink_config_from_toml() {
        let text = r#"
            [[sinks]]
            name = "disk"
            type = "file"
            queue_capacity = 8

            [sinks.params]
            directory = "/tmp/clouds"
        "#;

        let blueprint: PipelineBlueprint = toml::from_str(text).unwrap();
        assert_eq!(blueprint.sinks.len(), 1);

        let sink = &blueprint.sinks[0];
        assert_eq!(sink.name, "disk");
        assert_eq!(sink.sink_type, SinkType::File);
        assert_eq!(sink.queue_capacity, 8);
        assert_eq!(sink.param("directory"), Some("/tmp/clouds"));
    }

    #[test]
    fn test_to_fusion_config() {
        let mut blueprint = PipelineBlueprint::default();
        blueprint.detector.confidence_threshold = 0.7;
        blueprint.fusion.max_points_per_instance = 128;

        let config = blueprint.to_fusion_config();
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.max_points_per_instance, 128);
        assert_eq!(config.depth_max_m, 10.0);
        assert_eq!(config.cloud_frame_id, "camera_rgb_optical_frame");
    }
}
