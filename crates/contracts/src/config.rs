//! Conversion configuration contracts shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Full conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Input MCAP recording
    pub input: PathBuf,

    /// Output HDF5 dataset
    pub output: PathBuf,

    /// Topic assignments
    #[serde(default)]
    pub topics: TopicConfig,

    /// Synchronization settings
    #[serde(default)]
    pub sync: SyncSettings,

    /// Writer settings
    #[serde(default)]
    pub writer: WriterSettings,
}

/// Topic names for the recognized sensor roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Lidar point-cloud topic
    pub lidar: String,

    /// Compressed camera image topic
    pub camera_image: String,

    /// Camera intrinsic parameters topic
    pub camera_info: String,

    /// Dynamic transform topic
    pub tf: String,

    /// Static transform topic
    pub tf_static: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            lidar: "/sensor/lidar/front/points".to_string(),
            camera_image: "/sensor/camera/left/image_raw/compressed".to_string(),
            camera_info: "/sensor/camera/left/camera_info".to_string(),
            tf: "/tf".to_string(),
            tf_static: "/tf_static".to_string(),
        }
    }
}

/// Synchronization engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Maximum silence on one sensor topic before the recording is
    /// segmented into a new window (seconds)
    pub max_chunk_gap: f64,

    /// Maximum lidar-camera pairing tolerance (seconds, inclusive boundary)
    pub sync_threshold: f64,

    /// Transform history entries kept per frame-pair
    pub transform_cache_capacity: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_chunk_gap: 0.15,
            sync_threshold: 0.05,
            transform_cache_capacity: 100,
        }
    }
}

/// Dataset writer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Fused samples buffered before a write
    pub write_batch_size: usize,

    /// Initial lidar point-pool capacity (rows)
    pub initial_point_pool_capacity: usize,

    /// Deflate compression level for bulk datasets (0 = none)
    pub compression_level: u8,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            write_batch_size: 100,
            initial_point_pool_capacity: 1_000_000,
            compression_level: 1,
        }
    }
}
