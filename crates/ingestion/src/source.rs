//! MCAP recording source.
//!
//! Reads a recording from disk on a blocking worker and forwards decoded
//! sensor messages over a bounded channel, preserving log order. The first
//! camera intrinsics message and the first static transform batch are
//! captured out-of-band and reported in the [`SourceSummary`] when the
//! reader finishes.

use std::path::{Path, PathBuf};

use async_channel::{bounded, Receiver, Sender};
use bytes::Bytes;
use mcap::read::MessageStream;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{
    CameraIntrinsics, ImageData, PipelineError, PointCloudData, PointField, StreamMessage,
    SensorPayload, TopicConfig, Transform,
};

use crate::messages::{
    decode_cdr, scalar_type_from_code, CameraInfo, CompressedImage, PointCloud2, TfMessage,
};

/// Totals and out-of-band captures from a full pass over the recording.
#[derive(Debug, Default)]
pub struct SourceSummary {
    /// Messages decoded and forwarded downstream
    pub messages_forwarded: u64,

    /// Messages on unconfigured topics, dropped without decoding
    pub messages_skipped: u64,

    /// First camera intrinsics seen on the camera info topic
    pub camera_intrinsics: Option<CameraIntrinsics>,

    /// Static transforms from the first tf_static batch
    pub static_transforms: Vec<Transform>,
}

/// A file-backed MCAP source bound to a topic assignment.
pub struct McapSource {
    path: PathBuf,
    topics: TopicConfig,
}

impl McapSource {
    pub fn new(path: impl Into<PathBuf>, topics: TopicConfig) -> Self {
        Self {
            path: path.into(),
            topics,
        }
    }

    /// Start the blocking reader.
    ///
    /// Returns the message receiver and a handle resolving to the
    /// [`SourceSummary`] once the recording is exhausted. Fails up front
    /// when the recording does not exist.
    #[instrument(name = "source_spawn", skip(self), fields(path = %self.path.display()))]
    pub fn spawn(
        self,
        channel_capacity: usize,
    ) -> Result<
        (
            Receiver<StreamMessage>,
            JoinHandle<Result<SourceSummary, PipelineError>>,
        ),
        PipelineError,
    > {
        if !self.path.is_file() {
            return Err(PipelineError::missing_source(
                self.path.display().to_string(),
                "recording not found",
            ));
        }

        let (tx, rx) = bounded(channel_capacity);
        let handle = tokio::task::spawn_blocking(move || self.read_all(tx));
        Ok((rx, handle))
    }

    fn read_all(self, tx: Sender<StreamMessage>) -> Result<SourceSummary, PipelineError> {
        let buf = std::fs::read(&self.path)?;
        let stream = MessageStream::new(&buf)
            .map_err(|e| PipelineError::source_read(format!("failed to open recording: {e}")))?;

        let mut summary = SourceSummary::default();

        for message in stream {
            let message = message
                .map_err(|e| PipelineError::source_read(format!("corrupt record: {e}")))?;
            let topic = message.channel.topic.as_str();
            let log_time = message.log_time as f64 * 1e-9;

            let decoded = if topic == self.topics.lidar {
                Some(decode_pointcloud(&message.data, topic, log_time)?)
            } else if topic == self.topics.camera_image {
                Some(decode_image(&message.data, topic, log_time)?)
            } else if topic == self.topics.camera_info {
                let (stamp, intrinsics) = decode_camera_info(&message.data, topic, log_time)?;
                if summary.camera_intrinsics.is_none() {
                    debug!(topic, "captured camera intrinsics");
                    summary.camera_intrinsics = Some(intrinsics.clone());
                }
                Some((stamp, SensorPayload::CameraIntrinsics(intrinsics)))
            } else if topic == self.topics.tf {
                Some(decode_tf(&message.data, topic, log_time)?)
            } else if topic == self.topics.tf_static {
                // Static transforms describe the rig, not the motion.
                // They go straight into the summary and are never streamed.
                if summary.static_transforms.is_empty() {
                    let tf: TfMessage = decode_cdr(&message.data, topic)?;
                    summary.static_transforms =
                        tf.transforms.iter().map(|t| t.to_contract()).collect();
                    debug!(
                        topic,
                        count = summary.static_transforms.len(),
                        "captured static transforms"
                    );
                }
                None
            } else {
                summary.messages_skipped += 1;
                None
            };

            if let Some((timestamp, payload)) = decoded {
                counter!("ingestion_messages_total", "topic" => topic.to_string()).increment(1);
                summary.messages_forwarded += 1;
                let out = StreamMessage {
                    topic: topic.to_string(),
                    payload,
                    timestamp,
                };
                if tx.send_blocking(out).is_err() {
                    // Receiver gone, the pipeline is shutting down.
                    warn!(topic, "downstream closed, stopping reader");
                    break;
                }
            }
        }

        info!(
            forwarded = summary.messages_forwarded,
            skipped = summary.messages_skipped,
            "recording exhausted"
        );
        Ok(summary)
    }
}

/// Best available timestamp for a stamped message.
fn resolve_stamp(stamp: &crate::messages::Time, log_time: f64) -> f64 {
    if stamp.is_zero() {
        log_time
    } else {
        stamp.as_secs_f64()
    }
}

fn decode_pointcloud(
    data: &[u8],
    topic: &str,
    log_time: f64,
) -> Result<(f64, SensorPayload), PipelineError> {
    let msg: PointCloud2 = decode_cdr(data, topic)?;
    if msg.is_bigendian {
        return Err(PipelineError::decode(
            topic,
            "big-endian point data is not supported",
        ));
    }

    let mut fields = Vec::with_capacity(msg.fields.len());
    for f in &msg.fields {
        fields.push(PointField {
            name: f.name.clone(),
            offset: f.offset,
            scalar_type: scalar_type_from_code(f.datatype, &f.name)?,
        });
    }

    let cloud = PointCloudData {
        fields,
        point_step: msg.point_step,
        num_points: msg.width * msg.height,
        data: Bytes::from(msg.data),
    };
    Ok((
        resolve_stamp(&msg.header.stamp, log_time),
        SensorPayload::PointCloud(cloud),
    ))
}

fn decode_image(
    data: &[u8],
    topic: &str,
    log_time: f64,
) -> Result<(f64, SensorPayload), PipelineError> {
    let msg: CompressedImage = decode_cdr(data, topic)?;
    let image = ImageData {
        format: msg.format,
        data: Bytes::from(msg.data),
    };
    Ok((
        resolve_stamp(&msg.header.stamp, log_time),
        SensorPayload::CompressedImage(image),
    ))
}

fn decode_camera_info(
    data: &[u8],
    topic: &str,
    log_time: f64,
) -> Result<(f64, CameraIntrinsics), PipelineError> {
    let msg: CameraInfo = decode_cdr(data, topic)?;
    let stamp = resolve_stamp(&msg.header.stamp, log_time);
    Ok((
        stamp,
        CameraIntrinsics {
            width: msg.width,
            height: msg.height,
            distortion_model: msg.distortion_model,
            d: msg.d,
            k: msg.k,
            r: msg.r,
            p: msg.p,
        },
    ))
}

fn decode_tf(
    data: &[u8],
    topic: &str,
    log_time: f64,
) -> Result<(f64, SensorPayload), PipelineError> {
    let msg: TfMessage = decode_cdr(data, topic)?;
    let transforms: Vec<Transform> = msg.transforms.iter().map(|t| t.to_contract()).collect();
    // A transform batch carries no header of its own, the first entry's
    // stamp stands in for the batch.
    let timestamp = transforms
        .first()
        .map(|t| t.timestamp)
        .filter(|t| *t != 0.0)
        .unwrap_or(log_time);
    Ok((timestamp, SensorPayload::TransformBatch(transforms)))
}

/// Check that a path points at an existing MCAP recording.
pub fn check_recording(path: &Path) -> Result<(), PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::missing_source(
            path.display().to_string(),
            "recording not found",
        ));
    }
    Ok(())
}
