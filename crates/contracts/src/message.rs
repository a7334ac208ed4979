//! StreamMessage - ingestion output.
//!
//! One decoded record from the MCAP stream, typed by a closed variant set.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A 4x4 homogeneous transform, row-major float32.
pub type Matrix4 = [[f32; 4]; 4];

/// Key identifying a parent -> child coordinate-frame relationship.
///
/// Used to index the transform cache and the per-pair output datasets.
pub fn frame_pair_key(parent_frame: &str, child_frame: &str) -> String {
    format!("{parent_frame}_to_{child_frame}")
}

/// One topic-tagged message from the recording.
///
/// Ephemeral: produced by ingestion, consumed immediately by the
/// synchronizer, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    /// Topic the message was recorded under
    pub topic: String,

    /// Decoded payload
    pub payload: SensorPayload,

    /// Timestamp (seconds, f64) - header stamp where available
    pub timestamp: f64,
}

/// Decoded message payload
///
/// Closed set of variants; the core never inspects ad hoc attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorPayload {
    /// Self-describing lidar point cloud
    PointCloud(PointCloudData),

    /// Compressed camera image (JPEG/PNG payload)
    CompressedImage(ImageData),

    /// Batch of timestamped frame-to-frame transforms
    TransformBatch(Vec<Transform>),

    /// Camera calibration (intrinsics + projection)
    CameraIntrinsics(CameraIntrinsics),
}

/// Self-describing point-cloud record: N fixed-stride binary rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloudData {
    /// Field descriptors for one row
    pub fields: Vec<PointField>,

    /// Bytes per row ("point step"); may exceed the sum of field sizes
    pub point_step: u32,

    /// Number of rows
    pub num_points: u32,

    /// Raw row data, little-endian (zero-copy)
    pub data: Bytes,
}

/// One field within a point-cloud row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointField {
    /// Field name (e.g. "x", "intensity")
    pub name: String,

    /// Byte offset within the row
    pub offset: u32,

    /// Scalar element type
    pub scalar_type: ScalarType,
}

/// Scalar element types of point-cloud fields.
///
/// Discriminants match the `sensor_msgs/PointField` datatype codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ScalarType {
    /// Map a `sensor_msgs/PointField` datatype code (1..=8).
    pub fn from_ros_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Int8),
            2 => Some(Self::UInt8),
            3 => Some(Self::Int16),
            4 => Some(Self::UInt16),
            5 => Some(Self::Int32),
            6 => Some(Self::UInt32),
            7 => Some(Self::Float32),
            8 => Some(Self::Float64),
            _ => None,
        }
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }
}

/// Compressed image payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Compression format hint as recorded (e.g. "jpeg", "png")
    pub format: String,

    /// Compressed bytes (zero-copy)
    pub data: Bytes,
}

/// One stamped parent -> child transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    /// Parent coordinate frame
    pub parent_frame: String,

    /// Child coordinate frame
    pub child_frame: String,

    /// Stamp (seconds)
    pub timestamp: f64,

    /// Translation x, y, z (meters)
    pub translation: [f64; 3],

    /// Unit quaternion x, y, z, w
    pub rotation_xyzw: [f64; 4],
}

impl Transform {
    /// Frame-pair key for this transform.
    pub fn key(&self) -> String {
        frame_pair_key(&self.parent_frame, &self.child_frame)
    }
}

/// Camera calibration as recorded on the camera-info topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Distortion model name (e.g. "plumb_bob")
    pub distortion_model: String,

    /// Distortion coefficients (model-dependent length)
    pub d: Vec<f64>,

    /// Intrinsic matrix, 3x3 row-major
    pub k: [f64; 9],

    /// Rectification matrix, 3x3 row-major
    pub r: [f64; 9],

    /// Projection matrix, 3x4 row-major
    pub p: [f64; 12],
}
