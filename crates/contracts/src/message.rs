//! Bus message types - wire-level structures received from the message bus
//!
//! These mirror the JSON layout used by the rosbridge-style websocket bus:
//! image frames, depth frames and camera calibration all arrive as JSON
//! documents whose `data` payload is either a base64 string or a raw byte
//! array depending on the publisher.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::topic::TopicName;

// ===== Timestamps =====

/// Wire timestamp: seconds plus nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    #[serde(default)]
    pub secs: u32,
    #[serde(default)]
    pub nsecs: u32,
}

impl Stamp {
    pub fn new(secs: u32, nsecs: u32) -> Self {
        Self { secs, nsecs }
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            secs: elapsed.as_secs() as u32,
            nsecs: elapsed.subsec_nanos(),
        }
    }

    /// Timestamp as fractional seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.nsecs as f64 * 1e-9
    }
}

/// Standard message header carried by every bus message.
///
/// All fields default so that partial headers (common with simulated
/// publishers) still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub stamp: Stamp,
    #[serde(default)]
    pub frame_id: String,
}

// ===== Payload encodings =====

/// Image payload bytes as they appear on the wire.
///
/// rosbridge publishers send image data either as a base64 string or as a
/// plain JSON byte array; the untagged enum accepts both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadBytes {
    /// Base64-encoded string payload.
    Text(String),
    /// Raw byte-array payload.
    Raw(serde_bytes::ByteBuf),
}

impl PayloadBytes {
    /// Approximate wire size in bytes (before base64 decoding).
    pub fn wire_len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Raw(b) => b.len(),
        }
    }
}

impl Default for PayloadBytes {
    fn default() -> Self {
        Self::Raw(serde_bytes::ByteBuf::new())
    }
}

impl From<Vec<u8>> for PayloadBytes {
    fn from(v: Vec<u8>) -> Self {
        Self::Raw(serde_bytes::ByteBuf::from(v))
    }
}

impl From<String> for PayloadBytes {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ===== Image and calibration messages =====

/// Image message as published on the bus (color or depth).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageMessage {
    #[serde(default)]
    pub header: MessageHeader,
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    #[serde(default)]
    pub is_bigendian: u8,
    #[serde(default)]
    pub step: u32,
    pub data: PayloadBytes,
}

/// Camera calibration message.
///
/// Only the 3x3 intrinsic matrix is consumed; distortion and projection
/// matrices are ignored. Some publishers use lowercase `k`, so both keys
/// are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraInfoMessage {
    #[serde(default)]
    pub header: MessageHeader,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(rename = "K", alias = "k")]
    pub k: [f64; 9],
}

// ===== Stream packets =====

/// Which logical stream a packet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Color,
    Depth,
    CameraInfo,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Depth => "depth",
            Self::CameraInfo => "camera_info",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded message body of a stream packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPayload {
    Image(ImageMessage),
    CameraInfo(CameraInfoMessage),
}

/// A single message pulled off the bus, tagged with its topic and stream
/// kind so downstream stages can route without re-parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamPacket {
    pub topic: TopicName,
    pub kind: StreamKind,
    pub stamp: Stamp,
    pub payload: StreamPayload,
}

impl StreamPacket {
    pub fn image(topic: TopicName, kind: StreamKind, msg: ImageMessage) -> Self {
        let stamp = msg.header.stamp;
        Self {
            topic,
            kind,
            stamp,
            payload: StreamPayload::Image(msg),
        }
    }

    pub fn camera_info(topic: TopicName, msg: CameraInfoMessage) -> Self {
        let stamp = msg.header.stamp;
        Self {
            topic,
            kind: StreamKind::CameraInfo,
            stamp,
            payload: StreamPayload::CameraInfo(msg),
        }
    }

    /// Image body, if this packet carries one.
    pub fn as_image(&self) -> Option<&ImageMessage> {
        match &self.payload {
            StreamPayload::Image(msg) => Some(msg),
            _ => None,
        }
    }

    /// Calibration body, if this packet carries one.
    pub fn as_camera_info(&self) -> Option<&CameraInfoMessage> {
        match &self.payload {
            StreamPayload::CameraInfo(msg) => Some(msg),
            _ => None,
        }
    }
}
