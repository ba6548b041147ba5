//! LogSink - per-detection console lines via tracing

use contracts::{DetectionRecord, FrameOutput, OutputSink, PerceptionError};
use tracing::{info, instrument};

/// Sink that prints one line per detected instance, the way an operator
/// watches a live run.
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn format_record(record: &DetectionRecord) -> String {
        let [x1, y1, x2, y2] = record.bbox;
        let [cx, cy] = record.center;

        let distance = match record.distance_m {
            Some(d) => format!("{d:.2}m"),
            None => "n/a".to_string(),
        };
        let pos_cam = match record.position_camera {
            Some([x, y, z]) => format!("[{x:.3}, {y:.3}, {z:.3}]"),
            None => "n/a".to_string(),
        };

        format!(
            "Detected {} conf={:.2} bbox=({x1},{y1},{x2},{y2}) center=({cx},{cy}) \
             distance={distance} pos_cam={pos_cam} mask_3d_pts={}",
            record.label, record.confidence, record.mask_3d_points
        )
    }
}

impl OutputSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_publish",
        skip(self, output),
        fields(sink = %self.name, seq = output.seq)
    )]
    async fn publish(&mut self, output: &FrameOutput) -> Result<(), PerceptionError> {
        for record in &output.detections {
            // Mean box color rides along as a structured field; the line
            // itself stays in the operator format
            info!(
                sink = %self.name,
                avg_bgr = ?record.avg_bgr,
                "{}",
                Self::format_record(record)
            );
        }

        if let Some(cloud) = &output.cloud {
            info!(
                sink = %self.name,
                seq = output.seq,
                points = cloud.point_count(),
                "Labeled cloud published"
            );
        }

        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), PerceptionError> {
        // Nothing buffered
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), PerceptionError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
