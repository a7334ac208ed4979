//! Time-windowed lidar/camera synchronizer.

use std::collections::HashMap;

use metrics::counter;
use tracing::{debug, instrument, trace};

use contracts::{FusedSample, ImageData, PointCloudData, SensorPayload, StreamMessage, SyncSettings};

use crate::buffer::ChunkBuffer;
use crate::tf_cache::TransformCache;

/// Groups lidar and camera frames into synchronization windows and pairs
/// them by nearest timestamp.
///
/// A window ends when any sensor topic goes silent for longer than
/// `max_chunk_gap`, or when the stream ends (`flush`). Pairing happens at
/// window boundaries; transform history is kept across windows.
#[derive(Debug)]
pub struct Synchronizer {
    settings: SyncSettings,
    lidar: ChunkBuffer<PointCloudData>,
    camera: ChunkBuffer<ImageData>,
    /// Last-seen stamp per sensor topic, cleared on flush
    last_seen: HashMap<String, f64>,
    cache: TransformCache,
    unpaired_dropped: u64,
}

impl Synchronizer {
    pub fn new(settings: SyncSettings) -> Self {
        let cache = TransformCache::new(settings.transform_cache_capacity);
        Self {
            settings,
            lidar: ChunkBuffer::new(),
            camera: ChunkBuffer::new(),
            last_seen: HashMap::new(),
            cache,
            unpaired_dropped: 0,
        }
    }

    /// Feed one message.
    ///
    /// Returns `Some(samples)` when the message's arrival closed the
    /// current window (the flush may pair zero frames). Transform batches
    /// go to the cache and never close a window.
    #[instrument(
        level = "trace",
        name = "sync_process_message",
        skip(self, message),
        fields(topic = %message.topic, timestamp = message.timestamp)
    )]
    pub fn process_message(&mut self, message: StreamMessage) -> Option<Vec<FusedSample>> {
        match message.payload {
            SensorPayload::TransformBatch(transforms) => {
                for transform in &transforms {
                    self.cache.ingest(transform);
                }
                None
            }
            // Intrinsics are captured by the source; nothing to pair here.
            SensorPayload::CameraIntrinsics(_) => None,
            SensorPayload::PointCloud(cloud) => {
                let flushed = self.check_gap(&message.topic, message.timestamp);
                self.lidar.push(message.timestamp, cloud);
                self.last_seen.insert(message.topic, message.timestamp);
                flushed
            }
            SensorPayload::CompressedImage(image) => {
                let flushed = self.check_gap(&message.topic, message.timestamp);
                self.camera.push(message.timestamp, image);
                self.last_seen.insert(message.topic, message.timestamp);
                flushed
            }
        }
    }

    /// Close the current window if `timestamp` opens a gap on `topic`.
    fn check_gap(&mut self, topic: &str, timestamp: f64) -> Option<Vec<FusedSample>> {
        let last = *self.last_seen.get(topic)?;
        if timestamp - last > self.settings.max_chunk_gap {
            debug!(topic, gap = timestamp - last, "gap detected, closing window");
            Some(self.flush())
        } else {
            None
        }
    }

    /// Pair and emit everything buffered in the current window.
    ///
    /// Both sensor buffers and the last-seen stamps are cleared; the
    /// transform cache persists.
    pub fn flush(&mut self) -> Vec<FusedSample> {
        let lidar_frames = self.lidar.drain();
        let mut samples = Vec::new();

        for (lidar_ts, cloud) in lidar_frames {
            let Some((camera_ts, image)) = self.nearest_camera(lidar_ts) else {
                trace!(timestamp = lidar_ts, "no camera frame in window, dropping");
                self.drop_unpaired();
                continue;
            };
            let diff = (camera_ts - lidar_ts).abs();
            if diff > self.settings.sync_threshold {
                trace!(
                    timestamp = lidar_ts,
                    diff,
                    "nearest camera outside threshold, dropping"
                );
                self.drop_unpaired();
                continue;
            }

            let transforms = self.cache.query_all(lidar_ts);
            samples.push(FusedSample {
                timestamp: lidar_ts,
                chunk_id: 0,
                lidar: cloud,
                camera: image,
                transforms,
            });
        }

        self.camera.clear();
        self.last_seen.clear();

        counter!("sync_samples_emitted_total").increment(samples.len() as u64);
        debug!(emitted = samples.len(), "window flushed");
        samples
    }

    /// Nearest camera frame by absolute time difference. Ties keep the
    /// earliest-buffered frame.
    fn nearest_camera(&self, lidar_ts: f64) -> Option<(f64, ImageData)> {
        let mut best: Option<(f64, &ImageData)> = None;
        let mut best_diff = f64::INFINITY;
        for (camera_ts, image) in self.camera.iter() {
            let diff = (camera_ts - lidar_ts).abs();
            if diff < best_diff {
                best_diff = diff;
                best = Some((*camera_ts, image));
            }
        }
        best.map(|(ts, image)| (ts, image.clone()))
    }

    fn drop_unpaired(&mut self) {
        self.unpaired_dropped += 1;
        counter!("sync_frames_dropped_total").increment(1);
    }

    /// Lidar frames dropped for lack of a matching camera frame.
    pub fn unpaired_dropped(&self) -> u64 {
        self.unpaired_dropped
    }

    pub fn buffered_lidar(&self) -> usize {
        self.lidar.len()
    }

    pub fn buffered_camera(&self) -> usize {
        self.camera.len()
    }

    /// Frame pairs currently known to the transform cache.
    pub fn known_frame_pairs(&self) -> usize {
        self.cache.key_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::Transform;

    fn lidar_msg(ts: f64) -> StreamMessage {
        StreamMessage {
            topic: "/lidar/points".into(),
            timestamp: ts,
            payload: SensorPayload::PointCloud(PointCloudData {
                fields: Vec::new(),
                point_step: 16,
                num_points: 0,
                data: Bytes::new(),
            }),
        }
    }

    fn camera_msg(ts: f64) -> StreamMessage {
        camera_msg_tagged(ts, "jpeg")
    }

    fn camera_msg_tagged(ts: f64, tag: &str) -> StreamMessage {
        StreamMessage {
            topic: "/camera/image".into(),
            timestamp: ts,
            payload: SensorPayload::CompressedImage(ImageData {
                format: tag.into(),
                data: Bytes::new(),
            }),
        }
    }

    fn tf_msg(ts: f64, x: f64) -> StreamMessage {
        StreamMessage {
            topic: "/tf".into(),
            timestamp: ts,
            payload: SensorPayload::TransformBatch(vec![Transform {
                parent_frame: "odom".into(),
                child_frame: "base_link".into(),
                timestamp: ts,
                translation: [x, 0.0, 0.0],
                rotation_xyzw: [0.0, 0.0, 0.0, 1.0],
            }]),
        }
    }

    fn settings() -> SyncSettings {
        SyncSettings {
            max_chunk_gap: 0.15,
            sync_threshold: 0.05,
            transform_cache_capacity: 100,
        }
    }

    #[test]
    fn test_pairs_within_threshold() {
        let mut sync = Synchronizer::new(settings());
        assert!(sync.process_message(lidar_msg(0.0)).is_none());
        assert!(sync.process_message(camera_msg(0.04)).is_none());
        assert!(sync.process_message(lidar_msg(0.2)).is_none());
        assert!(sync.process_message(camera_msg(0.25)).is_none());

        let samples = sync.flush();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, 0.0);
        assert_eq!(samples[1].timestamp, 0.2);
        assert_eq!(sync.unpaired_dropped(), 0);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let mut sync = Synchronizer::new(settings());
        sync.process_message(lidar_msg(0.0));
        sync.process_message(camera_msg(0.05));
        let samples = sync.flush();
        assert_eq!(samples.len(), 1);

        sync.process_message(lidar_msg(1.0));
        sync.process_message(camera_msg(1.0501));
        let samples = sync.flush();
        assert!(samples.is_empty());
        assert_eq!(sync.unpaired_dropped(), 1);
    }

    #[test]
    fn test_tie_keeps_first_buffered_camera() {
        let mut sync = Synchronizer::new(settings());
        sync.process_message(camera_msg_tagged(0.06, "first"));
        sync.process_message(lidar_msg(0.10));
        sync.process_message(camera_msg_tagged(0.14, "second"));

        let samples = sync.flush();
        assert_eq!(samples.len(), 1);
        // Both candidates are 0.04 away; the earlier-buffered one wins.
        assert_eq!(samples[0].camera.format, "first");
    }

    #[test]
    fn test_gap_closes_window_before_buffering() {
        let mut sync = Synchronizer::new(settings());
        sync.process_message(lidar_msg(0.0));
        sync.process_message(camera_msg(0.02));

        // 0.30 - 0.0 > max_chunk_gap on the lidar topic
        let flushed = sync.process_message(lidar_msg(0.30)).unwrap();
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].timestamp, 0.0);

        // The triggering frame starts the next window.
        assert_eq!(sync.buffered_lidar(), 1);
        assert_eq!(sync.buffered_camera(), 0);
    }

    #[test]
    fn test_no_camera_drops_silently() {
        let mut sync = Synchronizer::new(settings());
        sync.process_message(lidar_msg(0.0));
        let samples = sync.flush();
        assert!(samples.is_empty());
        assert_eq!(sync.unpaired_dropped(), 1);
    }

    #[test]
    fn test_transform_cache_survives_flush() {
        let mut sync = Synchronizer::new(settings());
        sync.process_message(tf_msg(0.0, 0.0));
        sync.process_message(tf_msg(1.0, 10.0));

        sync.process_message(lidar_msg(0.5));
        sync.process_message(camera_msg(0.5));
        let samples = sync.flush();
        assert_eq!(samples.len(), 1);
        let m = samples[0].transforms.get("odom_to_base_link").unwrap();
        assert!((m[0][3] - 5.0).abs() < 1e-5);

        // A later window interpolates from the same history.
        sync.process_message(lidar_msg(0.75));
        sync.process_message(camera_msg(0.75));
        let samples = sync.flush();
        assert_eq!(samples.len(), 1);
        let m = samples[0].transforms.get("odom_to_base_link").unwrap();
        assert!((m[0][3] - 7.5).abs() < 1e-5);
    }

    #[test]
    fn test_transform_batch_never_closes_window() {
        let mut sync = Synchronizer::new(settings());
        sync.process_message(lidar_msg(0.0));
        sync.process_message(camera_msg(0.01));
        // Far in the future, but tf traffic must not trigger the gap check.
        assert!(sync.process_message(tf_msg(5.0, 0.0)).is_none());
        assert_eq!(sync.buffered_lidar(), 1);
    }
}
