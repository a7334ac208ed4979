//! FusedSample - Synchronizer output.
//!
//! One time-aligned record: lidar scan, nearest camera frame, interpolated
//! transforms. Immutable once emitted; consumed exactly once by the writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ImageData, Matrix4, PointCloudData};

/// One fused sample, anchored at the lidar timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedSample {
    /// Reference timestamp (lidar-anchored, seconds)
    pub timestamp: f64,

    /// Synchronization-window id, stamped by the orchestrator
    pub chunk_id: i32,

    /// Lidar scan, still in wire form (decoded at write time)
    pub lidar: PointCloudData,

    /// Paired camera frame, still compressed (decoded at write time)
    pub camera: ImageData,

    /// Interpolated transform per known frame-pair key at `timestamp`.
    ///
    /// Keys absent from the cache at flush time are simply omitted.
    pub transforms: BTreeMap<String, Matrix4>,
}
