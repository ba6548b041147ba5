//! Decoded frame types - the in-memory representation after wire decoding
//!
//! Color frames normalize to BGR8 regardless of wire encoding; depth frames
//! normalize to f32 meters. Decoding itself lives in the fusion crate, these
//! are the shared result types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::PerceptionError;
use crate::message::Stamp;

// ===== Pixel formats =====

/// Supported wire pixel encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit RGB, 3 bytes per pixel.
    Rgb8,
    /// 8-bit BGR, 3 bytes per pixel.
    Bgr8,
    /// 8-bit grayscale, 1 byte per pixel.
    Mono8,
    /// 16-bit unsigned depth in millimeters, little-endian.
    Depth16U,
    /// 32-bit float depth in meters, little-endian.
    Depth32F,
}

impl PixelFormat {
    /// Parse a wire encoding tag. Unknown tags are an error naming the tag.
    pub fn parse(encoding: &str) -> Result<Self, PerceptionError> {
        match encoding {
            "rgb8" => Ok(Self::Rgb8),
            "bgr8" => Ok(Self::Bgr8),
            "mono8" => Ok(Self::Mono8),
            "16UC1" => Ok(Self::Depth16U),
            "32FC1" => Ok(Self::Depth32F),
            other => Err(PerceptionError::unsupported_encoding(other)),
        }
    }

    /// Bytes per pixel on the wire.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Mono8 => 1,
            Self::Depth16U => 2,
            Self::Depth32F => 4,
        }
    }

    /// Canonical wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgb8 => "rgb8",
            Self::Bgr8 => "bgr8",
            Self::Mono8 => "mono8",
            Self::Depth16U => "16UC1",
            Self::Depth32F => "32FC1",
        }
    }

    /// Whether this format carries depth rather than color.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth16U | Self::Depth32F)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Decoded pixels =====

/// Decoded pixel storage. Color normalizes to BGR byte triples, grayscale
/// stays single-channel, depth normalizes to f32 meters.
#[derive(Debug, Clone)]
pub enum PixelData {
    /// BGR triples, 3 bytes per pixel.
    Bgr8(Bytes),
    /// Single-channel grayscale.
    Mono8(Bytes),
    /// Depth in meters, one f32 per pixel. Arc'd so a cached depth frame
    /// can be shared with in-flight fusion work without copying.
    DepthMeters(Arc<[f32]>),
}

/// A fully decoded frame.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub stamp: Stamp,
    pub pixels: PixelData,
}

impl RawFrame {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Depth plane in meters, if this is a depth frame.
    pub fn as_depth(&self) -> Option<&Arc<[f32]>> {
        match &self.pixels {
            PixelData::DepthMeters(plane) => Some(plane),
            _ => None,
        }
    }

    /// BGR plane, if this is a color frame.
    pub fn as_bgr(&self) -> Option<&Bytes> {
        match &self.pixels {
            PixelData::Bgr8(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Depth value at pixel (u, v), if in bounds on a depth frame.
    pub fn depth_at(&self, u: u32, v: u32) -> Option<f32> {
        if u >= self.width || v >= self.height {
            return None;
        }
        self.as_depth()
            .map(|plane| plane[v as usize * self.width as usize + u as usize])
    }
}
