//! Pipeline orchestrator - wires sources, engine, detector and sinks.
//!
//! The orchestrator owns the single processing loop: packets come off the
//! intake channel, the engine routes them, admitted color frames go to the
//! detector under a timeout budget, and fused output fans out through the
//! dispatcher.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{PipelineBlueprint, RawDetection};
use detector::{build_detector, Detector};
use fusion::{FrameJob, FusionEngine};
use ingestion::{IntakePipeline, MockStreamConfig, MockTopicSource, ReplayConfig, ReplayTopicSource};
use observability::{record_fusion_metrics, record_packet_received};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::PipelineStats;

/// Where stream packets come from.
#[derive(Debug, Clone)]
pub enum RunMode {
    /// Built-in synthetic camera rig
    Mock,
    /// Recorded packet stream
    Replay(ReplayConfig),
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The pipeline blueprint configuration
    pub blueprint: PipelineBlueprint,

    /// Stream source mode
    pub mode: RunMode,

    /// Maximum number of frames to publish (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup intake
        info!("Setting up intake pipeline...");
        let mut intake = IntakePipeline::new(self.config.buffer_size);
        self.register_sources(&mut intake)?;
        let active_sources = intake.source_count();

        info!(active_sources, "Intake pipeline configured");

        // Setup detector
        let mut det = build_detector(&blueprint.detector);
        let detector_budget = Duration::from_millis(blueprint.detector.timeout_ms);

        // Setup fusion engine
        let mut engine = FusionEngine::new(blueprint.to_fusion_config());
        info!(
            confidence_threshold = blueprint.detector.confidence_threshold,
            publish_interval_s = blueprint.fusion.min_publish_interval_s,
            "Fusion engine configured"
        );

        // Setup dispatcher
        info!("Setting up dispatcher...");
        let (output_tx, output_rx) = mpsc::channel(self.config.buffer_size);

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - published output will be dropped");
        }

        let disp = dispatcher::create_dispatcher(blueprint.sinks.clone(), output_rx)
            .await
            .context("Failed to create dispatcher")?;

        let active_sinks = blueprint.sinks.len();
        let dispatcher_handle = disp.spawn();

        info!(active_sinks, "Dispatcher started");

        // Start intake
        info!("Starting stream intake...");
        intake.start_all();
        let intake_rx = intake
            .take_receiver()
            .context("Failed to get intake receiver")?;

        let max_frames = self.config.max_frames;

        info!(max_frames = ?max_frames, "Pipeline running");

        // Pipeline processing task
        let pipeline_task = async {
            let mut stats = PipelineStats {
                active_sources,
                active_sinks,
                ..Default::default()
            };

            while let Ok(packet) = intake_rx.recv().await {
                stats.packets_received += 1;
                record_packet_received(&packet.topic, packet.kind.as_str());

                let now_s = start_time.elapsed().as_secs_f64();
                let Some(job) = engine.ingest(&packet, now_s) else {
                    continue;
                };

                let Some(detections) =
                    run_detector(&mut det, &job, detector_budget, &mut stats).await
                else {
                    continue;
                };

                let detector_latency_ms = (start_time.elapsed().as_secs_f64() - now_s) * 1000.0;
                let output = engine.fuse(&job, &detections, detector_latency_ms);

                record_fusion_metrics(&output.meta, output.seq);
                stats.fusion_metrics.update(&output.meta);

                info!(
                    seq = output.seq,
                    detections = output.detections.len(),
                    points = output.meta.points_emitted,
                    detector_ms = format!("{:.1}", output.meta.detector_latency_ms),
                    "Frame fused"
                );

                // Hollow output is not published, matching the bus convention
                if output.is_empty() && output.snapshot.is_none() {
                    continue;
                }

                stats.frames_published += 1;

                if output_tx.send(output).await.is_err() {
                    warn!("Dispatcher channel closed");
                    break;
                }

                // Check max frames limit
                if let Some(max) = max_frames {
                    if stats.frames_published >= max {
                        info!(frames = stats.frames_published, "Reached max frames limit");
                        break;
                    }
                }
            }

            stats.frames_gated = engine.gated_count();
            stats.decode_failures = engine.decode_failure_count();
            stats
        };

        // Run with optional timeout
        let stats = if let Some(timeout) = self.config.timeout {
            match tokio::time::timeout(timeout, pipeline_task).await {
                Ok(stats) => stats,
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                    PipelineStats::default()
                }
            }
        } else {
            pipeline_task.await
        };

        // Shutdown
        info!("Shutting down pipeline...");
        intake.stop_all();
        drop(output_tx);

        // Wait for dispatcher to flush
        let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

        let mut final_stats = stats;
        final_stats.duration = start_time.elapsed();

        info!(
            duration_secs = final_stats.duration.as_secs_f64(),
            fps = format!("{:.2}", final_stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(final_stats)
    }

    /// Register stream sources according to the run mode.
    fn register_sources(&self, intake: &mut IntakePipeline) -> Result<()> {
        let streams = &self.config.blueprint.streams;

        match &self.config.mode {
            RunMode::Mock => {
                info!("Running in MOCK mode (synthetic camera rig)");
                let rig = MockStreamConfig::default();

                intake.register_source(Box::new(
                    MockTopicSource::color(rig.clone()).on_topic(&streams.color),
                ));
                intake.register_source(Box::new(
                    MockTopicSource::depth(rig.clone()).on_topic(&streams.depth),
                ));
                intake.register_source(Box::new(
                    MockTopicSource::camera_info(rig).on_topic(&streams.camera_info),
                ));
            }
            RunMode::Replay(replay) => {
                info!(path = %replay.path.display(), "Running in REPLAY mode");
                let sources = ReplayTopicSource::load_all(replay)
                    .context("Failed to load replay recording")?;

                for source in sources {
                    intake.register_source(Box::new(source));
                }
            }
        }

        Ok(())
    }
}

/// Run the detector under its timeout budget.
///
/// Returns None when the frame should be skipped (timeout or backend
/// failure); the engine keeps its committed publish slot either way.
async fn run_detector<D: Detector>(
    det: &mut D,
    job: &FrameJob,
    budget: Duration,
    stats: &mut PipelineStats,
) -> Option<Vec<RawDetection>> {
    match tokio::time::timeout(budget, det.detect(&job.color)).await {
        Ok(Ok(detections)) => Some(detections),
        Ok(Err(e)) => {
            warn!(seq = job.seq, error = %e, "Detector failed, skipping frame");
            None
        }
        Err(_) => {
            stats.detector_timeouts += 1;
            warn!(
                seq = job.seq,
                budget_ms = budget.as_millis() as u64,
                "Detector timed out, skipping frame"
            );
            None
        }
    }
}
