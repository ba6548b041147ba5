//! Wire image decoding.
//!
//! Normalizes the payload (base64 text or raw bytes) and reinterprets it
//! according to the encoding tag. Color stays byte-per-channel with BGR
//! channel order as the canonical layout; depth becomes f32 meters.

use std::borrow::Cow;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use contracts::{
    ImageMessage, PayloadBytes, PerceptionError, PixelData, PixelFormat, RawFrame, Stamp,
};

/// Decode a raw payload into a typed frame.
///
/// The payload length must match `width * height * bytes_per_pixel` exactly;
/// anything else is a malformed buffer.
pub fn decode(
    payload: &PayloadBytes,
    width: u32,
    height: u32,
    encoding: &str,
    stamp: Stamp,
) -> Result<RawFrame, PerceptionError> {
    let format = PixelFormat::parse(encoding)?;
    let bytes = normalize_payload(payload)?;

    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if bytes.len() != expected {
        return Err(PerceptionError::PayloadLength {
            width,
            height,
            encoding: encoding.to_string(),
            expected,
            actual: bytes.len(),
        });
    }

    let pixels = match format {
        PixelFormat::Rgb8 => PixelData::Bgr8(swap_rgb_to_bgr(&bytes)),
        PixelFormat::Bgr8 => PixelData::Bgr8(Bytes::copy_from_slice(&bytes)),
        PixelFormat::Mono8 => PixelData::Mono8(Bytes::copy_from_slice(&bytes)),
        PixelFormat::Depth16U => PixelData::DepthMeters(millimeters_to_meters(&bytes)),
        PixelFormat::Depth32F => PixelData::DepthMeters(meters_from_le_f32(&bytes)),
    };

    Ok(RawFrame {
        width,
        height,
        format,
        stamp,
        pixels,
    })
}

/// Decode a bus image message.
pub fn decode_message(msg: &ImageMessage) -> Result<RawFrame, PerceptionError> {
    decode(
        &msg.data,
        msg.width,
        msg.height,
        &msg.encoding,
        msg.header.stamp,
    )
}

/// Normalize the wire payload to raw bytes.
fn normalize_payload(payload: &PayloadBytes) -> Result<Cow<'_, [u8]>, PerceptionError> {
    match payload {
        PayloadBytes::Text(text) => STANDARD
            .decode(text.as_bytes())
            .map(Cow::Owned)
            .map_err(|e| PerceptionError::invalid_base64(e.to_string())),
        PayloadBytes::Raw(bytes) => Ok(Cow::Borrowed(bytes.as_ref())),
    }
}

fn swap_rgb_to_bgr(bytes: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(bytes.len());
    for px in bytes.chunks_exact(3) {
        out.push(px[2]);
        out.push(px[1]);
        out.push(px[0]);
    }
    Bytes::from(out)
}

fn millimeters_to_meters(bytes: &[u8]) -> Arc<[f32]> {
    bytes
        .chunks_exact(2)
        .map(|px| u16::from_le_bytes([px[0], px[1]]) as f32 / 1000.0)
        .collect()
}

fn meters_from_le_f32(bytes: &[u8]) -> Arc<[f32]> {
    bytes
        .chunks_exact(4)
        .map(|px| f32::from_le_bytes([px[0], px[1], px[2], px[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(bytes: Vec<u8>) -> PayloadBytes {
        PayloadBytes::from(bytes)
    }

    #[test]
    fn test_bgr8_passthrough() {
        let input = vec![1u8, 2, 3, 4, 5, 6];
        let frame = decode(&raw(input.clone()), 2, 1, "bgr8", Stamp::default()).unwrap();

        assert_eq!(frame.format, PixelFormat::Bgr8);
        assert_eq!(frame.as_bgr().unwrap().as_ref(), input.as_slice());
    }

    #[test]
    fn test_rgb8_swaps_channels() {
        // One pixel r=10 g=20 b=30
        let frame = decode(&raw(vec![10, 20, 30]), 1, 1, "rgb8", Stamp::default()).unwrap();
        assert_eq!(frame.as_bgr().unwrap().as_ref(), &[30, 20, 10]);

        // Swapping back recovers the original
        let decoded = frame.as_bgr().unwrap();
        let recovered: Vec<u8> = decoded
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();
        assert_eq!(recovered, vec![10, 20, 30]);
    }

    #[test]
    fn test_mono8_passthrough() {
        let frame = decode(&raw(vec![7, 8, 9, 10]), 2, 2, "mono8", Stamp::default()).unwrap();
        match &frame.pixels {
            PixelData::Mono8(bytes) => assert_eq!(bytes.as_ref(), &[7, 8, 9, 10]),
            other => panic!("expected mono pixels, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_16uc1_converts_millimeters() {
        // 1500 mm and 250 mm, little-endian u16
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1500u16.to_le_bytes());
        bytes.extend_from_slice(&250u16.to_le_bytes());

        let frame = decode(&raw(bytes), 2, 1, "16UC1", Stamp::default()).unwrap();
        let plane = frame.as_depth().unwrap();
        assert!((plane[0] - 1.5).abs() < 1e-6);
        assert!((plane[1] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_depth_32fc1_reinterprets() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2.5f32.to_le_bytes());
        bytes.extend_from_slice(&0.125f32.to_le_bytes());

        let frame = decode(&raw(bytes), 1, 2, "32FC1", Stamp::default()).unwrap();
        let plane = frame.as_depth().unwrap();
        assert_eq!(plane[0], 2.5);
        assert_eq!(plane[1], 0.125);

        // Re-encoding the plane reproduces the wire bytes
        let recovered: Vec<u8> = plane.iter().flat_map(|v| v.to_le_bytes()).collect();
        let original: Vec<u8> = [2.5f32, 0.125]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_base64_text_payload() {
        // base64 of [1, 2, 3]
        let payload = PayloadBytes::Text("AQID".to_string());
        let frame = decode(&payload, 1, 1, "bgr8", Stamp::default()).unwrap();
        assert_eq!(frame.as_bgr().unwrap().as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let payload = PayloadBytes::Text("not@@base64!!".to_string());
        let err = decode(&payload, 1, 1, "bgr8", Stamp::default()).unwrap_err();
        assert!(matches!(err, PerceptionError::InvalidBase64 { .. }));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = decode(&raw(vec![0u8; 5]), 2, 1, "bgr8", Stamp::default()).unwrap_err();
        match err {
            PerceptionError::PayloadLength {
                expected, actual, ..
            } => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("expected payload length error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let err = decode(&raw(vec![0u8; 4]), 1, 1, "rgba8", Stamp::default()).unwrap_err();
        assert!(err.to_string().contains("rgba8"));
    }

    #[test]
    fn test_decode_message_uses_header_stamp() {
        let msg = ImageMessage {
            header: contracts::MessageHeader {
                stamp: Stamp::new(42, 7),
                ..Default::default()
            },
            height: 1,
            width: 1,
            encoding: "mono8".into(),
            data: raw(vec![128]),
            ..Default::default()
        };

        let frame = decode_message(&msg).unwrap();
        assert_eq!(frame.stamp, Stamp::new(42, 7));
    }
}
