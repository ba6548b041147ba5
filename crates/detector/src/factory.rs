//! Detector construction from configuration.

use contracts::{DetectorBackend, DetectorSettings, PerceptionError, RawDetection, RawFrame};
use tracing::info;

use crate::client::Detector;
use crate::mock_client::MockDetector;
use crate::scripted::ScriptedDetector;

/// A configured detector backend.
///
/// The `Detector` trait uses return-position `impl Future`, so backends
/// are dispatched through this enum instead of a trait object.
pub enum AnyDetector {
    Mock(MockDetector),
    Scripted(ScriptedDetector),
}

impl Detector for AnyDetector {
    fn name(&self) -> &str {
        match self {
            Self::Mock(d) => d.name(),
            Self::Scripted(d) => d.name(),
        }
    }

    async fn detect(&mut self, frame: &RawFrame) -> Result<Vec<RawDetection>, PerceptionError> {
        match self {
            Self::Mock(d) => d.detect(frame).await,
            Self::Scripted(d) => d.detect(frame).await,
        }
    }
}

/// Build the detector named by the settings.
///
/// The model path is informational for the shipped backends; a real
/// inference backend would load its weights from it.
pub fn build_detector(settings: &DetectorSettings) -> AnyDetector {
    info!(
        backend = settings.backend.as_str(),
        model_path = %settings.model_path,
        "building detector"
    );

    match settings.backend {
        DetectorBackend::Mock => AnyDetector::Mock(MockDetector::new()),
        DetectorBackend::Scripted => AnyDetector::Scripted(ScriptedDetector::new()),
    }
}
