//! # Detector
//!
//! Detection model seam.
//!
//! Responsibilities:
//! - Define the async `Detector` trait the pipeline awaits on
//! - Ship mock and scripted backends as first-class library code
//! - Build the configured backend from `DetectorSettings`
//!
//! A real inference binding would live behind the same trait; the shipped
//! backends exist so the whole pipeline runs and tests without a model.

pub mod client;
pub mod factory;
pub mod mock_client;
pub mod scripted;

pub use client::{Detector, LocalDetector};
pub use contracts::{DetectorBackend, DetectorSettings, RawDetection};
pub use factory::{build_detector, AnyDetector};
pub use mock_client::{MockDetector, MockDetectorConfig};
pub use scripted::{ScriptedDetector, ScriptedStep};
