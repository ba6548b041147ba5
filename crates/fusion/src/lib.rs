//! # Fusion
//!
//! RGB-D detection fusion engine: turns color frames, cached depth and a
//! detector's 2D answers into 3D-annotated detection records and labeled
//! point clouds.
//!
//! Responsibilities:
//! - wire image decoding (color and depth encodings)
//! - first-wins camera calibration and pinhole back-projection
//! - latest-wins depth caching
//! - publish-rate gating
//! - per-instance record fusion and mask-to-cloud projection
//!
//! ## Usage
//!
//! ```ignore
//! use fusion::FusionEngine;
//! use contracts::FusionConfig;
//!
//! let mut engine = FusionEngine::new(FusionConfig::default());
//!
//! // Route bus packets as they arrive
//! if let Some(job) = engine.ingest(&packet, now_s) {
//!     let detections = detector.detect(&job.color).await?;
//!     let output = engine.fuse(&job, &detections, latency_ms);
//! }
//! ```

mod cache;
mod camera;
mod cloud;
mod decode;
mod detection;
mod engine;
mod limiter;
mod mask;

pub use cache::DepthSlot;
pub use camera::{CameraModel, Intrinsics};
pub use cloud::{decode_cloud, CloudEncoder, LabeledPoint};
pub use decode::{decode, decode_message};
pub use detection::DetectionFuser;
pub use engine::{EngineState, FrameJob, FusionEngine};
pub use limiter::RateGate;
pub use mask::MaskFuser;

// Re-export contracts types engine callers always need
pub use contracts::{FrameOutput, FusionConfig, FusionMeta, RawDetection, RawFrame};
