//! Fusion output bundle - everything one processed frame produces
//!
//! Sinks receive a single `FrameOutput` per published frame and decide for
//! themselves which parts to forward (the log sink prints records, the
//! network sink publishes records and cloud, the file sink writes the cloud
//! and optional snapshot to disk).

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::cloud::CloudMessage;
use crate::detection::DetectionRecord;
use crate::message::Stamp;

/// Timing and bookkeeping for one processed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionMeta {
    /// Wall time the detector spent on this frame, in milliseconds.
    pub detector_latency_ms: f64,
    /// Wall time fusion spent (projection, mask sampling, encoding).
    pub fusion_latency_ms: f64,
    /// Instances the detector returned before the confidence filter.
    pub instances_in: usize,
    /// Instances surviving the confidence filter.
    pub instances_kept: usize,
    /// Total 3D points across all instances.
    pub points_emitted: usize,
    /// Whether a depth frame was available when this frame was fused.
    pub depth_available: bool,
    /// Whether calibration had arrived when this frame was fused.
    pub intrinsics_available: bool,
}

/// A captured color frame, BGR bytes at frame resolution.
#[derive(Debug, Clone)]
pub struct SnapshotImage {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// Everything produced for one published frame.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Monotonic sequence number assigned at publish time.
    pub seq: u32,
    /// Stamp of the color frame that drove this output.
    pub stamp: Stamp,
    /// Coordinate frame the cloud is expressed in.
    pub frame_id: String,
    pub detections: Vec<DetectionRecord>,
    /// Present only when at least one instance produced mask points.
    pub cloud: Option<CloudMessage>,
    /// Present only when frame capture is enabled.
    pub snapshot: Option<SnapshotImage>,
    pub meta: FusionMeta,
}

impl FrameOutput {
    /// Whether this output carries anything a sink would publish.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty() && self.cloud.is_none()
    }
}
