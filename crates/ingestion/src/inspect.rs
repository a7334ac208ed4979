//! Recording inspection.
//!
//! Summarizes the topics in an MCAP recording and guesses which ones carry
//! the lidar, camera image, and camera info streams based on schema names.

use std::path::Path;

use tracing::warn;

use contracts::PipelineError;

/// One topic as listed in the recording's summary section.
#[derive(Debug, Clone)]
pub struct TopicInfo {
    pub topic: String,
    pub schema: String,
    pub message_count: u64,
}

/// Topics recognized by schema name.
#[derive(Debug, Clone, Default)]
pub struct DetectedTopics {
    pub lidar: Option<String>,
    pub camera_image: Option<String>,
    pub camera_info: Option<String>,
}

/// Inspection result for a recording.
#[derive(Debug, Clone)]
pub struct InspectReport {
    pub topics: Vec<TopicInfo>,
    pub detected: DetectedTopics,
}

const LIDAR_SCHEMAS: &[&str] = &["sensor_msgs/msg/PointCloud2"];
const CAMERA_IMAGE_SCHEMAS: &[&str] =
    &["sensor_msgs/msg/CompressedImage", "sensor_msgs/msg/Image"];
const CAMERA_INFO_SCHEMAS: &[&str] = &["sensor_msgs/msg/CameraInfo"];

/// Read a recording's summary section and detect the sensor topics.
pub fn inspect(path: &Path) -> Result<InspectReport, PipelineError> {
    crate::source::check_recording(path)?;
    let buf = std::fs::read(path)?;

    let summary = mcap::Summary::read(&buf)
        .map_err(|e| PipelineError::source_read(format!("failed to read summary: {e}")))?
        .ok_or_else(|| {
            PipelineError::source_read("recording has no summary section".to_string())
        })?;

    let counts = summary
        .stats
        .as_ref()
        .map(|s| s.channel_message_counts.clone())
        .unwrap_or_default();

    let mut topics: Vec<TopicInfo> = summary
        .channels
        .iter()
        .map(|(id, channel)| TopicInfo {
            topic: channel.topic.clone(),
            schema: channel
                .schema
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            message_count: counts.get(id).copied().unwrap_or(0),
        })
        .collect();
    topics.sort_by(|a, b| a.topic.cmp(&b.topic));

    let detected = DetectedTopics {
        lidar: pick_candidate(&topics, LIDAR_SCHEMAS, "lidar"),
        camera_image: pick_candidate(&topics, CAMERA_IMAGE_SCHEMAS, "camera image"),
        camera_info: pick_candidate(&topics, CAMERA_INFO_SCHEMAS, "camera info"),
    };

    Ok(InspectReport { topics, detected })
}

/// First topic matching one of the schema names. Warns when the guess is
/// ambiguous.
fn pick_candidate(topics: &[TopicInfo], schemas: &[&str], role: &str) -> Option<String> {
    let candidates: Vec<&TopicInfo> = topics
        .iter()
        .filter(|t| schemas.contains(&t.schema.as_str()))
        .collect();

    if candidates.len() > 1 {
        let names: Vec<&str> = candidates.iter().map(|t| t.topic.as_str()).collect();
        warn!(
            role,
            candidates = ?names,
            "multiple topics match, picking the first"
        );
    }
    candidates.first().map(|t| t.topic.clone())
}
