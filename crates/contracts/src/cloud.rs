//! Point cloud wire types
//!
//! Message layout matches the PointCloud2 convention consumed by bus
//! subscribers: packed little-endian records of x/y/z floats plus a u32
//! class label, with the byte blob base64-encoded in the JSON form.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::message::MessageHeader;

// ===== Wire constants =====

/// Field datatype tag for unsigned 32-bit integers.
pub const FIELD_UINT32: u8 = 6;
/// Field datatype tag for 32-bit floats.
pub const FIELD_FLOAT32: u8 = 7;
/// Bytes per packed point record: three f32 coordinates plus a u32 label.
pub const POINT_STRIDE: usize = 16;

// ===== Field descriptors =====

/// Descriptor for one field of a packed point record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointField {
    pub name: String,
    pub offset: u32,
    pub datatype: u8,
    pub count: u32,
}

impl PointField {
    pub fn new(name: &str, offset: u32, datatype: u8) -> Self {
        Self {
            name: name.to_string(),
            offset,
            datatype,
            count: 1,
        }
    }
}

/// The fixed field layout every published cloud carries:
/// x/y/z floats at offsets 0/4/8 and a u32 label at offset 12.
pub fn cloud_fields() -> Vec<PointField> {
    vec![
        PointField::new("x", 0, FIELD_FLOAT32),
        PointField::new("y", 4, FIELD_FLOAT32),
        PointField::new("z", 8, FIELD_FLOAT32),
        PointField::new("label", 12, FIELD_UINT32),
    ]
}

// ===== Cloud message =====

/// Point cloud message in wire form.
///
/// `data` holds the packed point records; in JSON it serializes as a
/// base64 string, which is how bus subscribers expect the blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudMessage {
    pub header: MessageHeader,
    /// Always 1: clouds are published unorganized.
    pub height: u32,
    /// Number of points.
    pub width: u32,
    pub fields: Vec<PointField>,
    pub is_bigendian: bool,
    /// Bytes per point record.
    pub point_step: u32,
    /// Bytes per row; equals `point_step * width` for unorganized clouds.
    pub row_step: u32,
    #[serde(with = "b64")]
    pub data: Bytes,
    pub is_dense: bool,
}

impl CloudMessage {
    /// Number of points implied by the data length.
    pub fn point_count(&self) -> usize {
        self.data.len() / POINT_STRIDE
    }
}

/// Serde adapter: `Bytes` as a base64 string in human-readable formats.
pub mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
