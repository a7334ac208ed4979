//! ROS 2 message bodies as they appear on the wire (CDR encoded).
//!
//! Only the message types the converter consumes are declared here. Field
//! order must match the ROS IDL exactly, CDR has no field names.

use std::io::Cursor;

use cdr::de::Deserializer;
use cdr::LittleEndian;
use serde::Deserialize;

use contracts::{PipelineError, ScalarType, Transform};

/// builtin_interfaces/msg/Time
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl Time {
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nanosec as f64 * 1e-9
    }

    pub fn is_zero(&self) -> bool {
        self.sec == 0 && self.nanosec == 0
    }
}

/// std_msgs/msg/Header
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub stamp: Time,
    pub frame_id: String,
}

/// sensor_msgs/msg/PointField
#[derive(Debug, Clone, Deserialize)]
pub struct PointFieldMsg {
    pub name: String,
    pub offset: u32,
    pub datatype: u8,
    pub count: u32,
}

/// sensor_msgs/msg/PointCloud2
#[derive(Debug, Clone, Deserialize)]
pub struct PointCloud2 {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub fields: Vec<PointFieldMsg>,
    pub is_bigendian: bool,
    pub point_step: u32,
    pub row_step: u32,
    pub data: Vec<u8>,
    pub is_dense: bool,
}

/// sensor_msgs/msg/CompressedImage
#[derive(Debug, Clone, Deserialize)]
pub struct CompressedImage {
    pub header: Header,
    pub format: String,
    pub data: Vec<u8>,
}

/// sensor_msgs/msg/RegionOfInterest
#[derive(Debug, Clone, Deserialize)]
pub struct RegionOfInterest {
    pub x_offset: u32,
    pub y_offset: u32,
    pub height: u32,
    pub width: u32,
    pub do_rectify: bool,
}

/// sensor_msgs/msg/CameraInfo
#[derive(Debug, Clone, Deserialize)]
pub struct CameraInfo {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub distortion_model: String,
    pub d: Vec<f64>,
    pub k: [f64; 9],
    pub r: [f64; 9],
    pub p: [f64; 12],
    pub binning_x: u32,
    pub binning_y: u32,
    pub roi: RegionOfInterest,
}

/// geometry_msgs/msg/Vector3
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// geometry_msgs/msg/Quaternion
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuaternionMsg {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// geometry_msgs/msg/Transform
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransformMsg {
    pub translation: Vector3,
    pub rotation: QuaternionMsg,
}

/// geometry_msgs/msg/TransformStamped
#[derive(Debug, Clone, Deserialize)]
pub struct TransformStamped {
    pub header: Header,
    pub child_frame_id: String,
    pub transform: TransformMsg,
}

/// tf2_msgs/msg/TFMessage
#[derive(Debug, Clone, Deserialize)]
pub struct TfMessage {
    pub transforms: Vec<TransformStamped>,
}

impl TransformStamped {
    /// Flatten into the shared contract representation.
    pub fn to_contract(&self) -> Transform {
        let t = &self.transform;
        Transform {
            parent_frame: self.header.frame_id.clone(),
            child_frame: self.child_frame_id.clone(),
            timestamp: self.header.stamp.as_secs_f64(),
            translation: [t.translation.x, t.translation.y, t.translation.z],
            rotation_xyzw: [t.rotation.x, t.rotation.y, t.rotation.z, t.rotation.w],
        }
    }
}

/// Deserialize a CDR payload, falling back to a headerless little-endian
/// read when the 4-byte encapsulation header is missing.
pub fn decode_cdr<'de, T>(data: &'de [u8], context: &str) -> Result<T, PipelineError>
where
    T: Deserialize<'de>,
{
    cdr::deserialize::<T>(data)
        .or_else(|_| {
            let mut de = Deserializer::<_, cdr::Infinite, LittleEndian>::new(
                Cursor::new(data),
                cdr::Infinite,
            );
            T::deserialize(&mut de)
        })
        .map_err(|e| PipelineError::decode(context, e.to_string()))
}

/// Map a ROS PointField datatype code to the shared scalar type.
pub fn scalar_type_from_code(code: u8, field: &str) -> Result<ScalarType, PipelineError> {
    ScalarType::from_ros_code(code).ok_or_else(|| {
        PipelineError::decode(field, format!("unknown point field datatype code {code}"))
    })
}
