//! Detector abstraction
//!
//! Defines the trait for the external detection/segmentation model,
//! supporting mock and scripted implementations behind a unified seam.

use contracts::{PerceptionError, RawDetection, RawFrame};

/// Async detector seam.
///
/// The model is a black-box collaborator: it consumes a decoded color
/// frame and answers with 2D instances, optionally carrying masks at the
/// model's internal resolution. `Detector` is the `Send` variant the
/// pipeline awaits on; `LocalDetector` exists for single-threaded use.
#[trait_variant::make(Detector: Send)]
pub trait LocalDetector {
    /// Backend name for logs and error attribution.
    fn name(&self) -> &str;

    /// Run the model on one color frame.
    ///
    /// No instances is an `Ok(vec![])`, not an error; `Err` means the
    /// backend itself failed and the caller should skip the frame.
    async fn detect(&mut self, frame: &RawFrame) -> Result<Vec<RawDetection>, PerceptionError>;
}
