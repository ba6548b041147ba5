//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::FusionRunAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total frames published to sinks
    pub frames_published: u64,

    /// Total packets received from stream sources
    pub packets_received: u64,

    /// Color frames rejected by the publish-rate gate
    pub frames_gated: u64,

    /// Packets that failed to decode
    pub decode_failures: u64,

    /// Frames skipped because the detector exceeded its budget
    pub detector_timeouts: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of stream sources that were active
    pub active_sources: usize,

    /// Number of sinks that received output
    pub active_sinks: usize,

    /// Fusion metadata aggregator
    pub fusion_metrics: FusionRunAggregator,
}

impl PipelineStats {
    /// Calculate published frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames published: {}", self.frames_published);
        println!("   ├─ Packets received: {}", self.packets_received);
        println!("   ├─ Frames gated: {}", self.frames_gated);
        println!("   ├─ Decode failures: {}", self.decode_failures);
        println!("   ├─ Detector timeouts: {}", self.detector_timeouts);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Active sources: {}", self.active_sources);
        println!("   └─ Active sinks: {}", self.active_sinks);

        let summary = self.fusion_metrics.summary();

        println!("\n📈 Fusion Metrics");
        println!(
            "   ├─ Instances: {} in, {} kept ({:.2}%)",
            summary.total_instances_in, summary.total_instances_kept, summary.keep_rate
        );
        println!("   ├─ 3D points emitted: {}", summary.total_points);
        println!(
            "   ├─ Frames without depth: {}",
            summary.frames_without_depth
        );
        println!(
            "   ├─ Frames before calibration: {}",
            summary.frames_before_calibration
        );
        println!(
            "   ├─ Detector latency (ms): {}",
            summary.detector_latency_ms
        );
        println!("   └─ Fusion latency (ms): {}", summary.fusion_latency_ms);

        println!();
    }
}
