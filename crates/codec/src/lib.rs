//! # Codec
//!
//! Pure payload decoding, shared by ingestion and the dataset writer.
//!
//! Responsibilities:
//! - Point-cloud field extraction (self-describing rows -> dense f32 matrix)
//! - Compressed-image decoding to a fixed-shape H x W x 3 pixel array
//! - Transform <-> 4x4 matrix conversion and timestamp interpolation numerics
//!
//! Everything here is a pure function over its inputs; no component state.

mod image_codec;
mod pointcloud;
mod transform;

pub use image_codec::decode_image;
pub use pointcloud::decode_points;
pub use transform::{interpolate_matrix, transform_to_matrix};

/// Column order of the persisted lidar point pool.
pub const LIDAR_FIELDS: [&str; 4] = ["x", "y", "z", "intensity"];
