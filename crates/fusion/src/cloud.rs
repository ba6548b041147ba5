//! Labeled point cloud packing.
//!
//! Packs camera-frame points and their class labels into the fixed
//! 16-byte-per-point wire layout: f32 x/y/z at offsets 0/4/8 and a u32
//! label at 12, all little-endian.

use bytemuck::{Pod, Zeroable};
use bytes::Bytes;
use contracts::{
    cloud_fields, CloudMessage, MessageHeader, PerceptionError, Stamp, POINT_STRIDE,
};
use nalgebra::Point3;

/// One packed cloud record, layout-identical to the wire format.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LabeledPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub label: u32,
}

const _: () = assert!(std::mem::size_of::<LabeledPoint>() == POINT_STRIDE);

/// Builds cloud messages stamped with a fixed coordinate frame.
#[derive(Debug, Clone)]
pub struct CloudEncoder {
    frame_id: String,
}

impl CloudEncoder {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
        }
    }

    /// Pack points and labels into a wire message.
    ///
    /// The header is stamped with wall-clock time at encode time. Zero
    /// points produce a valid empty message; callers decide whether an
    /// empty cloud is worth publishing.
    pub fn encode(
        &self,
        points: &[Point3<f32>],
        labels: &[u32],
    ) -> Result<CloudMessage, PerceptionError> {
        if points.len() != labels.len() {
            return Err(PerceptionError::CloudLengthMismatch {
                points: points.len(),
                labels: labels.len(),
            });
        }

        let mut buf = Vec::with_capacity(points.len() * POINT_STRIDE);
        for (point, &label) in points.iter().zip(labels) {
            let record = LabeledPoint {
                x: point.x,
                y: point.y,
                z: point.z,
                label,
            };
            buf.extend_from_slice(bytemuck::bytes_of(&record));
        }

        let count = points.len() as u32;
        Ok(CloudMessage {
            header: MessageHeader {
                seq: 0,
                stamp: Stamp::now(),
                frame_id: self.frame_id.clone(),
            },
            height: 1,
            width: count,
            fields: cloud_fields(),
            is_bigendian: false,
            point_step: POINT_STRIDE as u32,
            row_step: count * POINT_STRIDE as u32,
            data: Bytes::from(buf),
            is_dense: true,
        })
    }
}

/// Unpack a cloud byte buffer back into points and labels.
///
/// Used by sinks that re-serialize per point. Reads are unaligned since
/// the buffer may sit at any offset inside a larger wire frame.
pub fn decode_cloud(data: &[u8]) -> Result<(Vec<Point3<f32>>, Vec<u32>), PerceptionError> {
    if data.len() % POINT_STRIDE != 0 {
        return Err(PerceptionError::CloudStride {
            actual: data.len(),
            stride: POINT_STRIDE,
        });
    }

    let count = data.len() / POINT_STRIDE;
    let mut points = Vec::with_capacity(count);
    let mut labels = Vec::with_capacity(count);
    for chunk in data.chunks_exact(POINT_STRIDE) {
        let record: LabeledPoint = bytemuck::pod_read_unaligned(chunk);
        points.push(Point3::new(record.x, record.y, record.z));
        labels.push(record.label);
    }
    Ok((points, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let encoder = CloudEncoder::new("camera_rgb_optical_frame");
        let points = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-0.5, 0.0, 9.5)];
        let labels = vec![7u32, 42];

        let msg = encoder.encode(&points, &labels).unwrap();
        assert_eq!(msg.data.len(), 2 * POINT_STRIDE);
        assert_eq!(msg.height, 1);
        assert_eq!(msg.width, 2);
        assert_eq!(msg.point_step, 16);
        assert_eq!(msg.row_step, 32);
        assert!(!msg.is_bigendian);
        assert!(msg.is_dense);
        assert_eq!(msg.header.frame_id, "camera_rgb_optical_frame");

        // First record byte-for-byte: three LE floats then the LE label
        assert_eq!(&msg.data[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&msg.data[4..8], &2.0f32.to_le_bytes());
        assert_eq!(&msg.data[8..12], &3.0f32.to_le_bytes());
        assert_eq!(&msg.data[12..16], &7u32.to_le_bytes());
    }

    #[test]
    fn test_decode_recovers_points_and_labels() {
        let encoder = CloudEncoder::new("map");
        let points = vec![
            Point3::new(0.125, -2.25, 4.5),
            Point3::new(1e-3, 0.0, 9.999),
        ];
        let labels = vec![0u32, u32::MAX];

        let msg = encoder.encode(&points, &labels).unwrap();
        let (back_points, back_labels) = decode_cloud(&msg.data).unwrap();

        assert_eq!(back_labels, labels);
        for (a, b) in points.iter().zip(&back_points) {
            assert!((a.x - b.x).abs() < 1e-5);
            assert!((a.y - b.y).abs() < 1e-5);
            assert!((a.z - b.z).abs() < 1e-5);
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let encoder = CloudEncoder::new("map");
        let err = encoder
            .encode(&[Point3::new(0.0, 0.0, 1.0)], &[1, 2])
            .unwrap_err();
        assert!(matches!(
            err,
            PerceptionError::CloudLengthMismatch {
                points: 1,
                labels: 2
            }
        ));
    }

    #[test]
    fn test_empty_cloud_is_valid() {
        let encoder = CloudEncoder::new("map");
        let msg = encoder.encode(&[], &[]).unwrap();
        assert_eq!(msg.width, 0);
        assert_eq!(msg.data.len(), 0);
        assert_eq!(msg.point_count(), 0);
    }

    #[test]
    fn test_ragged_buffer_rejected() {
        let err = decode_cloud(&[0u8; 17]).unwrap_err();
        assert!(matches!(
            err,
            PerceptionError::CloudStride {
                actual: 17,
                stride: 16
            }
        ));
    }
}
