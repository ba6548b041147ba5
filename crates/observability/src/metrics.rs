//! Fusion pipeline metrics
//!
//! Records `FusionMeta` into the metrics registry and aggregates it in
//! memory for the end-of-run summary.

use contracts::FusionMeta;
use metrics::{counter, gauge, histogram};

/// Record metrics from one published frame.
///
/// Call once per `FrameOutput` the engine produces.
pub fn record_fusion_metrics(meta: &FusionMeta, seq: u32) {
    counter!("rgbd_fuser_frames_published_total").increment(1);

    // Sequence number (detects restarts and gaps)
    gauge!("rgbd_fuser_last_seq").set(seq as f64);

    histogram!("rgbd_fuser_detector_latency_ms").record(meta.detector_latency_ms);
    histogram!("rgbd_fuser_fusion_latency_ms").record(meta.fusion_latency_ms);

    if meta.instances_in > 0 {
        counter!("rgbd_fuser_instances_in_total").increment(meta.instances_in as u64);
    }
    if meta.instances_kept > 0 {
        counter!("rgbd_fuser_instances_kept_total").increment(meta.instances_kept as u64);
    }
    if meta.points_emitted > 0 {
        counter!("rgbd_fuser_points_emitted_total").increment(meta.points_emitted as u64);
    }

    gauge!("rgbd_fuser_depth_available").set(if meta.depth_available { 1.0 } else { 0.0 });
    gauge!("rgbd_fuser_intrinsics_available")
        .set(if meta.intrinsics_available { 1.0 } else { 0.0 });

    if !meta.depth_available {
        counter!("rgbd_fuser_frames_without_depth_total").increment(1);
    }
    if !meta.intrinsics_available {
        counter!("rgbd_fuser_frames_before_calibration_total").increment(1);
    }
}

/// Record one packet pulled off the bus.
pub fn record_packet_received(topic: &str, kind: &str) {
    counter!(
        "rgbd_fuser_packets_received_total",
        "topic" => topic.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record one output handed to a sink.
pub fn record_output_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "rgbd_fuser_outputs_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the intake channel depth.
pub fn record_intake_queue_depth(depth: usize) {
    gauge!("rgbd_fuser_intake_queue_depth").set(depth as f64);
}

/// Run-level aggregation of fusion metadata.
///
/// Aggregates in memory so the CLI can print a summary at shutdown
/// without scraping the Prometheus endpoint.
#[derive(Debug, Clone, Default)]
pub struct FusionRunAggregator {
    /// Published frames
    pub total_frames: u64,

    /// Instances before the confidence filter
    pub total_instances_in: u64,

    /// Instances surviving the confidence filter
    pub total_instances_kept: u64,

    /// 3D points emitted across all frames
    pub total_points: u64,

    /// Frames fused without a depth frame
    pub frames_without_depth: u64,

    /// Frames fused before calibration arrived
    pub frames_before_calibration: u64,

    /// Detector latency statistics (milliseconds)
    pub detector_latency_stats: RunningStats,

    /// Fusion latency statistics (milliseconds)
    pub fusion_latency_stats: RunningStats,

    /// Per-frame emitted point counts
    pub points_stats: RunningStats,
}

impl FusionRunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one published frame into the aggregate.
    pub fn update(&mut self, meta: &FusionMeta) {
        self.total_frames += 1;
        self.total_instances_in += meta.instances_in as u64;
        self.total_instances_kept += meta.instances_kept as u64;
        self.total_points += meta.points_emitted as u64;

        if !meta.depth_available {
            self.frames_without_depth += 1;
        }
        if !meta.intrinsics_available {
            self.frames_before_calibration += 1;
        }

        self.detector_latency_stats.push(meta.detector_latency_ms);
        self.fusion_latency_stats.push(meta.fusion_latency_ms);
        self.points_stats.push(meta.points_emitted as f64);
    }

    /// Produce the printable summary.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            total_instances_in: self.total_instances_in,
            total_instances_kept: self.total_instances_kept,
            total_points: self.total_points,
            frames_without_depth: self.frames_without_depth,
            frames_before_calibration: self.frames_before_calibration,
            keep_rate: if self.total_instances_in > 0 {
                self.total_instances_kept as f64 / self.total_instances_in as f64 * 100.0
            } else {
                0.0
            },
            detector_latency_ms: StatsSummary::from(&self.detector_latency_stats),
            fusion_latency_ms: StatsSummary::from(&self.fusion_latency_stats),
            points_per_frame: StatsSummary::from(&self.points_stats),
        }
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Printable run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub total_instances_in: u64,
    pub total_instances_kept: u64,
    pub total_points: u64,
    pub frames_without_depth: u64,
    pub frames_before_calibration: u64,
    pub keep_rate: f64,
    pub detector_latency_ms: StatsSummary,
    pub fusion_latency_ms: StatsSummary,
    pub points_per_frame: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Fusion Run Summary ===")?;
        writeln!(f, "Published frames: {}", self.total_frames)?;
        writeln!(
            f,
            "Instances: {} in, {} kept ({:.2}%)",
            self.total_instances_in, self.total_instances_kept, self.keep_rate
        )?;
        writeln!(f, "3D points emitted: {}", self.total_points)?;
        writeln!(f, "Frames without depth: {}", self.frames_without_depth)?;
        writeln!(
            f,
            "Frames before calibration: {}",
            self.frames_before_calibration
        )?;
        writeln!(f, "Detector latency (ms): {}", self.detector_latency_ms)?;
        writeln!(f, "Fusion latency (ms): {}", self.fusion_latency_ms)?;
        writeln!(f, "Points per frame: {}", self.points_per_frame)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
