//! # Integration Tests
//!
//! End-to-end tests over the full conversion path:
//! recording file -> source -> synchronizer -> HDF5 dataset.

#[cfg(test)]
mod recording {
    //! Synthetic MCAP recording builder shared by the e2e tests.

    use std::collections::BTreeMap;
    use std::io::BufWriter;
    use std::path::Path;

    use cdr::{CdrLe, Infinite};
    use serde::Serialize;

    use contracts::TopicConfig;

    #[derive(Serialize)]
    struct TimeOut {
        sec: i32,
        nanosec: u32,
    }

    #[derive(Serialize)]
    struct HeaderOut {
        stamp: TimeOut,
        frame_id: String,
    }

    fn header(stamp_secs: f64, frame: &str) -> HeaderOut {
        let sec = stamp_secs as i32;
        let nanosec = ((stamp_secs - sec as f64) * 1e9).round() as u32;
        HeaderOut {
            stamp: TimeOut { sec, nanosec },
            frame_id: frame.into(),
        }
    }

    #[derive(Serialize)]
    struct PointFieldOut {
        name: String,
        offset: u32,
        datatype: u8,
        count: u32,
    }

    #[derive(Serialize)]
    struct PointCloud2Out {
        header: HeaderOut,
        height: u32,
        width: u32,
        fields: Vec<PointFieldOut>,
        is_bigendian: bool,
        point_step: u32,
        row_step: u32,
        data: Vec<u8>,
        is_dense: bool,
    }

    #[derive(Serialize)]
    struct CompressedImageOut {
        header: HeaderOut,
        format: String,
        data: Vec<u8>,
    }

    #[derive(Serialize)]
    struct RegionOfInterestOut {
        x_offset: u32,
        y_offset: u32,
        height: u32,
        width: u32,
        do_rectify: bool,
    }

    #[derive(Serialize)]
    struct CameraInfoOut {
        header: HeaderOut,
        height: u32,
        width: u32,
        distortion_model: String,
        d: Vec<f64>,
        k: [f64; 9],
        r: [f64; 9],
        p: [f64; 12],
        binning_x: u32,
        binning_y: u32,
        roi: RegionOfInterestOut,
    }

    #[derive(Serialize)]
    struct Vector3Out {
        x: f64,
        y: f64,
        z: f64,
    }

    #[derive(Serialize)]
    struct QuaternionOut {
        x: f64,
        y: f64,
        z: f64,
        w: f64,
    }

    #[derive(Serialize)]
    struct TransformOut {
        translation: Vector3Out,
        rotation: QuaternionOut,
    }

    #[derive(Serialize)]
    struct TransformStampedOut {
        header: HeaderOut,
        child_frame_id: String,
        transform: TransformOut,
    }

    #[derive(Serialize)]
    struct TfMessageOut {
        transforms: Vec<TransformStampedOut>,
    }

    fn xyzi_fields() -> Vec<PointFieldOut> {
        ["x", "y", "z", "intensity"]
            .iter()
            .enumerate()
            .map(|(i, name)| PointFieldOut {
                name: (*name).into(),
                offset: (i * 4) as u32,
                datatype: 7, // float32
                count: 1,
            })
            .collect()
    }

    /// A cloud of `num_points` rows with recognizable sequential values.
    fn cloud(stamp: f64, num_points: u32, base: f32) -> PointCloud2Out {
        let mut data = Vec::new();
        for point in 0..num_points {
            for channel in 0..4u32 {
                let value = base + point as f32 + channel as f32 * 0.1;
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
        PointCloud2Out {
            header: header(stamp, "lidar_front"),
            height: 1,
            width: num_points,
            fields: xyzi_fields(),
            is_bigendian: false,
            point_step: 16,
            row_step: 16 * num_points,
            data,
            is_dense: true,
        }
    }

    /// A 4x3 RGB PNG so every camera frame decodes to the same shape.
    fn png_image() -> Vec<u8> {
        let img = image::RgbImage::from_fn(4, 3, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn tf_batch(stamp: f64, parent: &str, child: &str, x: f64) -> TfMessageOut {
        TfMessageOut {
            transforms: vec![TransformStampedOut {
                header: header(stamp, parent),
                child_frame_id: child.into(),
                transform: TransformOut {
                    translation: Vector3Out { x, y: 0.0, z: 0.0 },
                    rotation: QuaternionOut {
                        x: 0.0,
                        y: 0.0,
                        z: 0.0,
                        w: 1.0,
                    },
                },
            }],
        }
    }

    fn camera_info(stamp: f64) -> CameraInfoOut {
        CameraInfoOut {
            header: header(stamp, "camera_left"),
            height: 3,
            width: 4,
            distortion_model: "plumb_bob".into(),
            d: vec![0.1, -0.2, 0.0, 0.0, 0.0],
            k: [500.0, 0.0, 2.0, 0.0, 500.0, 1.5, 0.0, 0.0, 1.0],
            r: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            p: [500.0, 0.0, 2.0, 0.0, 0.0, 500.0, 1.5, 0.0, 0.0, 0.0, 1.0, 0.0],
            binning_x: 0,
            binning_y: 0,
            roi: RegionOfInterestOut {
                x_offset: 0,
                y_offset: 0,
                height: 0,
                width: 0,
                do_rectify: false,
            },
        }
    }

    fn nanos(secs: f64) -> u64 {
        (secs * 1e9).round() as u64
    }

    struct RecordingWriter {
        out: mcap::Writer<BufWriter<std::fs::File>>,
        sequence: u32,
    }

    impl RecordingWriter {
        fn create(path: &Path) -> Self {
            let out =
                mcap::Writer::new(BufWriter::new(std::fs::File::create(path).unwrap())).unwrap();
            Self { out, sequence: 0 }
        }

        fn channel(&mut self, topic: &str, schema: &str) -> u16 {
            let schema_id = self.out.add_schema(schema, "ros2msg", b"").unwrap();
            self.out
                .add_channel(schema_id, topic, "cdr", &BTreeMap::new())
                .unwrap()
        }

        fn write<T: Serialize>(&mut self, channel_id: u16, log_time_secs: f64, message: &T) {
            let data = cdr::serialize::<_, _, CdrLe>(message, Infinite).unwrap();
            self.out
                .write_to_known_channel(
                    &mcap::records::MessageHeader {
                        channel_id,
                        sequence: self.sequence,
                        log_time: nanos(log_time_secs),
                        publish_time: nanos(log_time_secs),
                    },
                    &data,
                )
                .unwrap();
            self.sequence += 1;
        }

        fn finish(mut self) {
            self.out.finish().unwrap();
        }
    }

    /// Two gap-separated windows of paired lidar/camera frames.
    ///
    /// Chronology (seconds):
    /// - 9.90  camera info, static transform
    /// - 10.00 lidar (2 points), 10.01 tf x=1.0, 10.02 camera
    /// - 10.10 lidar (3 points), 10.12 camera
    /// - 10.30 tf x=2.0
    /// - 10.50 lidar (1 point), 10.52 camera (after a 0.4s silence)
    pub fn write_two_window_recording(path: &Path, topics: &TopicConfig) {
        let mut rec = RecordingWriter::create(path);

        let lidar = rec.channel(&topics.lidar, "sensor_msgs/msg/PointCloud2");
        let camera = rec.channel(&topics.camera_image, "sensor_msgs/msg/CompressedImage");
        let info = rec.channel(&topics.camera_info, "sensor_msgs/msg/CameraInfo");
        let tf = rec.channel(&topics.tf, "tf2_msgs/msg/TFMessage");
        let tf_static = rec.channel(&topics.tf_static, "tf2_msgs/msg/TFMessage");

        rec.write(info, 9.90, &camera_info(9.90));
        rec.write(
            tf_static,
            9.90,
            &tf_batch(9.90, "base_link", "lidar_front", 0.5),
        );

        rec.write(lidar, 10.00, &cloud(10.00, 2, 0.0));
        rec.write(tf, 10.01, &tf_batch(10.01, "odom", "base_link", 1.0));
        rec.write(
            camera,
            10.02,
            &CompressedImageOut {
                header: header(10.02, "camera_left"),
                format: "png".into(),
                data: png_image(),
            },
        );

        rec.write(lidar, 10.10, &cloud(10.10, 3, 100.0));
        rec.write(
            camera,
            10.12,
            &CompressedImageOut {
                header: header(10.12, "camera_left"),
                format: "png".into(),
                data: png_image(),
            },
        );

        rec.write(tf, 10.30, &tf_batch(10.30, "odom", "base_link", 2.0));

        rec.write(lidar, 10.50, &cloud(10.50, 1, 200.0));
        rec.write(
            camera,
            10.52,
            &CompressedImageOut {
                header: header(10.52, "camera_left"),
                format: "png".into(),
                data: png_image(),
            },
        );

        rec.finish();
    }

    /// A single window whose lidar frame has no camera partner within any
    /// reasonable threshold. No camera info topic.
    pub fn write_unpaired_recording(path: &Path, topics: &TopicConfig) {
        let mut rec = RecordingWriter::create(path);

        let lidar = rec.channel(&topics.lidar, "sensor_msgs/msg/PointCloud2");
        let camera = rec.channel(&topics.camera_image, "sensor_msgs/msg/CompressedImage");

        rec.write(lidar, 10.00, &cloud(10.00, 2, 0.0));
        rec.write(
            camera,
            10.20,
            &CompressedImageOut {
                header: header(10.20, "camera_left"),
                format: "png".into(),
                data: png_image(),
            },
        );

        rec.finish();
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use contracts::{ConversionConfig, FusedSample};
    use dataset_writer::Hdf5Writer;
    use ingestion::{McapSource, SourceSummary};
    use observability::ConversionStats;
    use sync_engine::Synchronizer;

    use crate::recording;

    /// Drive the full pipeline the way the CLI orchestrator does:
    /// stream, synchronize, stamp chunk ids per closed window, batch
    /// writes, then finalize with the out-of-band captures.
    async fn run_conversion(config: &ConversionConfig) -> (ConversionStats, SourceSummary) {
        let source = McapSource::new(&config.input, config.topics.clone());
        let (rx, reader) = source.spawn(16).unwrap();

        let mut synchronizer = Synchronizer::new(config.sync.clone());
        let mut writer = Hdf5Writer::create(&config.output, config.writer.clone()).unwrap();

        let batch_size = config.writer.write_batch_size.max(1);
        let mut pending: Vec<FusedSample> = Vec::new();
        let mut stats = ConversionStats::new();
        let mut next_chunk_id: i32 = 0;

        let stage = |samples: Vec<FusedSample>,
                         chunk_id: i32,
                         pending: &mut Vec<FusedSample>,
                         stats: &mut ConversionStats| {
            for mut sample in samples {
                sample.chunk_id = chunk_id;
                stats.record_sample(sample.lidar.num_points as u64);
                pending.push(sample);
            }
        };

        while let Ok(message) = rx.recv().await {
            if let Some(flushed) = synchronizer.process_message(message) {
                stats.record_window();
                stage(flushed, next_chunk_id, &mut pending, &mut stats);
                next_chunk_id += 1;
                if pending.len() >= batch_size {
                    writer.write_batch_sync(&pending).unwrap();
                    pending.clear();
                }
            }
        }

        let residual = synchronizer.flush();
        if !residual.is_empty() {
            stats.record_window();
            stage(residual, next_chunk_id, &mut pending, &mut stats);
        }
        if !pending.is_empty() {
            writer.write_batch_sync(&pending).unwrap();
        }

        let summary = reader.await.unwrap().unwrap();
        stats.unpaired_dropped = synchronizer.unpaired_dropped();
        stats.messages_read = summary.messages_forwarded;
        stats.messages_skipped = summary.messages_skipped;

        writer
            .finalize_sync(
                summary.camera_intrinsics.as_ref(),
                &summary.static_transforms,
            )
            .unwrap();

        (stats, summary)
    }

    fn config_for(dir: &Path) -> ConversionConfig {
        let content = format!(
            r#"
input = "{}"
output = "{}"

[writer]
write_batch_size = 2
initial_point_pool_capacity = 4
compression_level = 1
"#,
            dir.join("recording.mcap").display(),
            dir.join("dataset.hdf5").display(),
        );
        let config_path = dir.join("config.toml");
        std::fs::write(&config_path, content).unwrap();
        config_loader::ConfigLoader::load_from_path(&config_path).unwrap()
    }

    #[tokio::test]
    async fn test_two_window_recording_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        recording::write_two_window_recording(&config.input, &config.topics);

        let (stats, summary) = run_conversion(&config).await;

        // 3 lidar + 3 camera + 2 tf + 1 camera info forwarded; tf_static
        // and camera intrinsics are captured out-of-band
        assert_eq!(stats.messages_read, 9);
        assert_eq!(stats.messages_skipped, 0);
        assert_eq!(stats.samples_written, 3);
        assert_eq!(stats.windows_flushed, 2);
        assert_eq!(stats.unpaired_dropped, 0);
        assert_eq!(stats.total_points, 6);
        assert!(summary.camera_intrinsics.is_some());
        assert_eq!(summary.static_transforms.len(), 1);

        let file = hdf5::File::open(&config.output).unwrap();

        assert_eq!(
            file.attr("num_samples")
                .unwrap()
                .read_scalar::<i64>()
                .unwrap(),
            3
        );
        assert_eq!(
            file.attr("lidar_point_offset")
                .unwrap()
                .read_scalar::<i64>()
                .unwrap(),
            6
        );

        let timestamps = file
            .dataset("samples/timestamps")
            .unwrap()
            .read_1d::<f64>()
            .unwrap();
        assert_eq!(timestamps.len(), 3);
        assert!((timestamps[0] - 10.00).abs() < 1e-6);
        assert!((timestamps[1] - 10.10).abs() < 1e-6);
        assert!((timestamps[2] - 10.50).abs() < 1e-6);

        let chunk_ids = file
            .dataset("samples/chunk_ids")
            .unwrap()
            .read_1d::<i32>()
            .unwrap();
        assert_eq!(chunk_ids.to_vec(), vec![0, 0, 1]);

        let offsets = file
            .dataset("lidar/offsets")
            .unwrap()
            .read_1d::<i64>()
            .unwrap();
        assert_eq!(offsets.to_vec(), vec![0, 2, 5]);

        let counts = file
            .dataset("lidar/counts")
            .unwrap()
            .read_1d::<i32>()
            .unwrap();
        assert_eq!(counts.to_vec(), vec![2, 3, 1]);

        // Pool trimmed to exactly the written rows despite growth past the
        // initial capacity of 4
        let pool = file.dataset("lidar/data").unwrap();
        assert_eq!(pool.shape(), vec![6, 4]);
        let rows = pool.read_2d::<f32>().unwrap();
        assert!((rows[[0, 0]] - 0.0).abs() < 1e-6);
        assert!((rows[[2, 0]] - 100.0).abs() < 1e-6);
        assert!((rows[[5, 0]] - 200.0).abs() < 1e-6);

        let images = file.dataset("camera/images").unwrap();
        assert_eq!(images.shape(), vec![3, 3, 4, 3]);

        // Interpolated odom -> base_link translation x: clamped to 1.0
        // before the first stamp, interpolated between the two stamps,
        // clamped to 2.0 after the last
        let transforms = file.dataset("transforms/odom_to_base_link").unwrap();
        assert_eq!(transforms.shape(), vec![3, 4, 4]);
        let matrices = transforms.read_dyn::<f32>().unwrap();
        assert!((matrices[[0, 0, 3]] - 1.0).abs() < 1e-4);
        let expected_mid = 1.0 + (10.10 - 10.01) / (10.30 - 10.01);
        assert!((matrices[[1, 0, 3]] - expected_mid as f32).abs() < 1e-4);
        assert!((matrices[[2, 0, 3]] - 2.0).abs() < 1e-4);

        let static_tf = file
            .dataset("static_transforms/base_link_to_lidar_front")
            .unwrap();
        assert_eq!(static_tf.shape(), vec![4, 4]);
        let static_matrix = static_tf.read_2d::<f32>().unwrap();
        assert!((static_matrix[[0, 3]] - 0.5).abs() < 1e-6);

        // Camera calibration attributes
        let k = file.attr("camera_k").unwrap().read_2d::<f64>().unwrap();
        assert!((k[[0, 0]] - 500.0).abs() < 1e-9);
        assert_eq!(
            file.attr("camera_width")
                .unwrap()
                .read_scalar::<i64>()
                .unwrap(),
            4
        );
    }

    #[tokio::test]
    async fn test_unpaired_lidar_yields_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        recording::write_unpaired_recording(&config.input, &config.topics);

        let (stats, summary) = run_conversion(&config).await;

        assert_eq!(stats.samples_written, 0);
        assert_eq!(stats.unpaired_dropped, 1);
        assert!(summary.camera_intrinsics.is_none());
        assert!(summary.static_transforms.is_empty());

        let file = hdf5::File::open(&config.output).unwrap();
        assert_eq!(
            file.attr("num_samples")
                .unwrap()
                .read_scalar::<i64>()
                .unwrap(),
            0
        );
        // Calibration attributes are omitted when the recording carries none
        assert!(file.attr("camera_k").is_err());
        let pool = file.dataset("lidar/data").unwrap();
        assert_eq!(pool.shape(), vec![0, 4]);
    }
}
