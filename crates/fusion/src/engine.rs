//! Main fusion engine implementation.

use std::time::Instant;

use contracts::{
    FrameOutput, FusionConfig, FusionMeta, RawDetection, RawFrame, SnapshotImage, Stamp,
    StreamKind, StreamPacket,
};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument, trace, warn};

use crate::cache::DepthSlot;
use crate::camera::CameraModel;
use crate::cloud::CloudEncoder;
use crate::decode;
use crate::detection::DetectionFuser;
use crate::limiter::RateGate;
use crate::mask::MaskFuser;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No packet observed yet
    Idle,
    /// Streams are flowing, calibration has not arrived
    Calibrating,
    /// Calibrated; the segmentation path is active
    Ready,
}

/// A color frame admitted for a detection cycle, bundled with the depth
/// snapshot that was current at admission time.
#[derive(Debug)]
pub struct FrameJob {
    /// Engine-assigned monotonic sequence number.
    pub seq: u32,
    /// Stamp carried on the color frame's header.
    pub stamp: Stamp,
    pub color: RawFrame,
    pub depth: Option<RawFrame>,
}

/// RGB-D detection fusion engine.
///
/// Split into two synchronous halves so the async detector call can sit
/// between them: `ingest` routes bus packets and admits color frames,
/// `fuse` turns the detector's answer for an admitted frame into the
/// published output. One frame is fully fused before the next is admitted.
#[derive(Debug)]
pub struct FusionEngine {
    /// Configuration
    config: FusionConfig,
    /// First-wins calibration
    camera: CameraModel,
    /// Latest-wins depth frame
    depth_slot: DepthSlot,
    /// Publish-rate gate
    gate: RateGate,
    /// Current state
    state: EngineState,
    /// Admitted frame counter
    frame_counter: u32,
    /// Frames dropped by the rate gate
    gated_frames: u64,
    /// Frames dropped by decode failures
    decode_failures: u64,
    /// Mask subsampling source
    rng: StdRng,
}

impl FusionEngine {
    /// Create a new engine with the given configuration.
    pub fn new(config: FusionConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Create an engine with a caller-supplied RNG, for deterministic
    /// mask subsampling in tests.
    pub fn with_rng(config: FusionConfig, rng: StdRng) -> Self {
        Self {
            config,
            camera: CameraModel::new(),
            depth_slot: DepthSlot::new(),
            gate: RateGate::new(0.0),
            state: EngineState::Idle,
            frame_counter: 0,
            gated_frames: 0,
            decode_failures: 0,
            rng,
        }
        .with_gate()
    }

    fn with_gate(mut self) -> Self {
        self.gate = RateGate::new(self.config.min_publish_interval_s);
        self
    }

    /// Route one bus packet.
    ///
    /// Depth and calibration packets update internal state and return
    /// `None`. A color packet that passes the rate gate and decodes
    /// returns a `FrameJob` for the caller to run the detector on. The
    /// gate commits only on successful decode, so a dropped frame never
    /// consumes publish budget.
    #[instrument(
        level = "trace",
        name = "fusion_engine_ingest",
        skip(self, packet),
        fields(topic = %packet.topic, kind = packet.kind.as_str())
    )]
    pub fn ingest(&mut self, packet: &StreamPacket, now_s: f64) -> Option<FrameJob> {
        if self.state == EngineState::Idle {
            self.state = EngineState::Calibrating;
        }

        match packet.kind {
            StreamKind::CameraInfo => {
                self.handle_camera_info(packet);
                None
            }
            StreamKind::Depth => {
                self.handle_depth(packet);
                None
            }
            StreamKind::Color => self.handle_color(packet, now_s),
        }
    }

    fn handle_camera_info(&mut self, packet: &StreamPacket) {
        let Some(info) = packet.as_camera_info() else {
            warn!(topic = %packet.topic, "camera info packet without calibration payload");
            return;
        };

        match self.camera.set_from_matrix(&info.k) {
            Ok(true) => {
                if let Some(intr) = self.camera.intrinsics() {
                    tracing::info!(
                        fx = intr.fx,
                        fy = intr.fy,
                        cx = intr.cx,
                        cy = intr.cy,
                        "camera intrinsics latched"
                    );
                }
                self.state = EngineState::Ready;
                metrics::gauge!("fusion_calibrated").set(1.0);
            }
            Ok(false) => {
                trace!("already calibrated, ignoring camera info");
            }
            Err(e) => {
                warn!(error = %e, "rejecting camera intrinsics");
            }
        }
    }

    fn handle_depth(&mut self, packet: &StreamPacket) {
        let Some(msg) = packet.as_image() else {
            warn!(topic = %packet.topic, "depth packet without image payload");
            return;
        };

        match decode::decode_message(msg) {
            Ok(frame) => {
                let version = self.depth_slot.update(frame);
                metrics::counter!("fusion_depth_updates").increment(1);
                trace!(version, "depth slot updated");
            }
            Err(e) => {
                self.decode_failures += 1;
                metrics::counter!("fusion_decode_failures", "stream" => "depth").increment(1);
                warn!(error = %e, "dropping corrupt depth frame, keeping last good one");
            }
        }
    }

    fn handle_color(&mut self, packet: &StreamPacket, now_s: f64) -> Option<FrameJob> {
        let Some(msg) = packet.as_image() else {
            warn!(topic = %packet.topic, "color packet without image payload");
            return None;
        };

        if !self.gate.ready(now_s) {
            self.gated_frames += 1;
            metrics::counter!("fusion_frames_gated").increment(1);
            trace!("rate gate closed, dropping color frame");
            return None;
        }

        match decode::decode_message(msg) {
            Ok(color) => {
                self.gate.commit(now_s);
                self.frame_counter += 1;

                // Header stamp vs wall clock, for delivery latency visibility
                let stamp_age_s = now_s - msg.header.stamp.as_secs_f64();
                debug!(
                    seq = self.frame_counter,
                    stamp = msg.header.stamp.as_secs_f64(),
                    stamp_age_s,
                    "color frame admitted"
                );

                Some(FrameJob {
                    seq: self.frame_counter,
                    stamp: msg.header.stamp,
                    color,
                    depth: self.depth_slot.snapshot(),
                })
            }
            Err(e) => {
                self.decode_failures += 1;
                metrics::counter!("fusion_decode_failures", "stream" => "color").increment(1);
                warn!(error = %e, "dropping undecodable color frame");
                None
            }
        }
    }

    /// Fuse the detector's answer for an admitted frame into an output.
    ///
    /// Never fails: absence of depth or calibration degrades individual
    /// fields, and a cloud encode failure skips only the cloud while the
    /// detection records still go out.
    #[instrument(
        name = "fusion_engine_fuse",
        skip(self, job, detections),
        fields(seq = job.seq, instances = detections.len())
    )]
    pub fn fuse(
        &mut self,
        job: &FrameJob,
        detections: &[RawDetection],
        detector_latency_ms: f64,
    ) -> FrameOutput {
        let started = Instant::now();

        let fuser = DetectionFuser::new(
            self.config.confidence_threshold,
            &self.camera,
            &job.color,
            job.depth.as_ref(),
        );

        let mut records = Vec::new();
        let mut points: Vec<Point3<f32>> = Vec::new();
        let mut labels: Vec<u32> = Vec::new();

        for detection in detections {
            let Some(mut record) = fuser.fuse(detection) else {
                continue;
            };

            // The segmentation path needs both a depth frame and a
            // calibrated camera; the bare record goes out either way.
            if let (Some(mask), Some(depth), true) = (
                &detection.mask,
                job.depth.as_ref(),
                self.camera.is_calibrated(),
            ) {
                let masker = MaskFuser::new(&self.config, &self.camera, depth);
                record.mask_3d_points = masker.fuse(
                    mask,
                    detection.class_id,
                    job.color.width,
                    job.color.height,
                    &mut self.rng,
                    &mut points,
                    &mut labels,
                );
            }

            records.push(record);
        }

        let cloud = if points.is_empty() {
            None
        } else {
            let encoder = CloudEncoder::new(&self.config.cloud_frame_id);
            match encoder.encode(&points, &labels) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    warn!(error = %e, "cloud encode failed, skipping cloud for this frame");
                    None
                }
            }
        };

        let snapshot = if self.config.capture_frames {
            job.color.as_bgr().map(|bgr| SnapshotImage {
                width: job.color.width,
                height: job.color.height,
                data: bgr.clone(),
            })
        } else {
            None
        };

        let meta = FusionMeta {
            detector_latency_ms,
            fusion_latency_ms: started.elapsed().as_secs_f64() * 1000.0,
            instances_in: detections.len(),
            instances_kept: records.len(),
            points_emitted: points.len(),
            depth_available: job.depth.is_some(),
            intrinsics_available: self.camera.is_calibrated(),
        };

        metrics::counter!("fusion_frames_processed").increment(1);
        metrics::counter!("fusion_detections_kept").increment(records.len() as u64);
        metrics::counter!("fusion_points_emitted").increment(points.len() as u64);
        metrics::histogram!("fusion_latency_ms").record(meta.fusion_latency_ms);

        FrameOutput {
            seq: job.seq,
            stamp: job.stamp,
            frame_id: self.config.cloud_frame_id.clone(),
            detections: records,
            cloud,
            snapshot,
            meta,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_calibrated(&self) -> bool {
        self.camera.is_calibrated()
    }

    /// Frames admitted so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_counter
    }

    /// Frames dropped by the rate gate.
    pub fn gated_count(&self) -> u64 {
        self.gated_frames
    }

    /// Frames dropped due to decode failures, both streams combined.
    pub fn decode_failure_count(&self) -> u64 {
        self.decode_failures
    }

    /// Depth frames overwritten before any color frame consumed them.
    pub fn depth_replaced_count(&self) -> u64 {
        self.depth_slot.replaced_count()
    }
}
