//! Scripted detector
//!
//! Replays a queue of pre-built answers, with failure injection and an
//! optional artificial latency. Used by integration tests and replay runs
//! where the detector's output for each frame is known up front.

use std::collections::VecDeque;
use std::time::Duration;

use contracts::{PerceptionError, RawDetection, RawFrame};
use tracing::instrument;

use crate::client::Detector;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    /// Return these instances.
    Detections(Vec<RawDetection>),
    /// Fail with this message.
    Fail(String),
}

/// Detector that answers from a pre-loaded script.
///
/// Steps are consumed front-to-back; once the script runs dry every
/// further frame gets an empty answer.
#[derive(Debug, Default)]
pub struct ScriptedDetector {
    script: VecDeque<ScriptedStep>,
    delay: Option<Duration>,
    calls: u64,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer.
    pub fn push_detections(&mut self, detections: Vec<RawDetection>) -> &mut Self {
        self.script.push_back(ScriptedStep::Detections(detections));
        self
    }

    /// Queue a failure.
    pub fn push_failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.script.push_back(ScriptedStep::Fail(message.into()));
        self
    }

    /// Sleep this long before every answer, to exercise timeout paths.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many frames have been answered.
    pub fn call_count(&self) -> u64 {
        self.calls
    }

    /// Steps still queued.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    #[instrument(name = "scripted_detector_detect", skip(self, _frame))]
    async fn detect(&mut self, _frame: &RawFrame) -> Result<Vec<RawDetection>, PerceptionError> {
        self.calls += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.script.pop_front() {
            Some(ScriptedStep::Detections(detections)) => Ok(detections),
            Some(ScriptedStep::Fail(message)) => {
                Err(PerceptionError::detector("scripted", message))
            }
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{PixelData, PixelFormat, Stamp};

    fn frame() -> RawFrame {
        RawFrame {
            width: 2,
            height: 2,
            format: PixelFormat::Bgr8,
            stamp: Stamp::default(),
            pixels: PixelData::Bgr8(Bytes::from(vec![0u8; 12])),
        }
    }

    #[tokio::test]
    async fn test_steps_consumed_in_order() {
        let mut detector = ScriptedDetector::new();
        detector
            .push_detections(vec![RawDetection::new("cup", 41, 0.9, [0.0, 0.0, 1.0, 1.0])])
            .push_failure("model crashed")
            .push_detections(vec![]);

        let first = detector.detect(&frame()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].label, "cup");

        let err = detector.detect(&frame()).await.unwrap_err();
        assert!(matches!(err, PerceptionError::Detector { .. }));
        assert!(err.to_string().contains("model crashed"));

        assert!(detector.detect(&frame()).await.unwrap().is_empty());
        assert_eq!(detector.call_count(), 3);
    }

    #[tokio::test]
    async fn test_dry_script_answers_empty() {
        let mut detector = ScriptedDetector::new();
        assert!(detector.detect(&frame()).await.unwrap().is_empty());
        assert_eq!(detector.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applied() {
        let mut detector = ScriptedDetector::new().with_delay(Duration::from_millis(50));
        detector.push_detections(vec![]);

        let started = tokio::time::Instant::now();
        detector.detect(&frame()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
