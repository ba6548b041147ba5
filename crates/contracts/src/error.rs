//! Layered error definitions
//!
//! Categorized by source: config / decode / fusion / detector / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum PerceptionError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Decode Errors =====
    /// Pixel encoding tag not understood by the decoder
    #[error("unsupported encoding: {encoding}")]
    UnsupportedEncoding { encoding: String },

    /// Payload byte count does not match the declared geometry
    #[error(
        "payload length mismatch for {width}x{height} {encoding}: expected {expected} bytes, got {actual}"
    )]
    PayloadLength {
        width: u32,
        height: u32,
        encoding: String,
        expected: usize,
        actual: usize,
    },

    /// Base64 text payload failed to decode
    #[error("invalid base64 payload: {message}")]
    InvalidBase64 { message: String },

    // ===== Calibration Errors =====
    /// Intrinsic matrix carries unusable focal lengths
    #[error("invalid camera intrinsics: {message}")]
    InvalidIntrinsics { message: String },

    // ===== Cloud Encode Errors =====
    /// Points and labels differ in length
    #[error("cloud length mismatch: {points} points vs {labels} labels")]
    CloudLengthMismatch { points: usize, labels: usize },

    /// Cloud byte buffer is not a whole number of points
    #[error("cloud buffer length {actual} is not a multiple of point stride {stride}")]
    CloudStride { actual: usize, stride: usize },

    // ===== Detector Errors =====
    /// Detector backend reported a failure
    #[error("detector '{name}' failed: {message}")]
    Detector { name: String, message: String },

    /// Detector did not answer within the configured budget
    #[error("detector '{name}' timed out after {timeout_ms}ms")]
    DetectorTimeout { name: String, timeout_ms: u64 },

    // ===== Sink Errors =====
    /// Sink publish error
    #[error("sink '{sink_name}' publish error: {message}")]
    PublishFailed { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PerceptionError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unsupported-encoding error
    pub fn unsupported_encoding(encoding: impl Into<String>) -> Self {
        Self::UnsupportedEncoding {
            encoding: encoding.into(),
        }
    }

    /// Create invalid-base64 error
    pub fn invalid_base64(message: impl Into<String>) -> Self {
        Self::InvalidBase64 {
            message: message.into(),
        }
    }

    /// Create detector error
    pub fn detector(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Detector {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create sink publish error
    pub fn publish_failed(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PublishFailed {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// True for conditions that drop a single frame but leave the loop running
    pub fn is_frame_local(&self) -> bool {
        !matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::Io(_)
        )
    }
}
