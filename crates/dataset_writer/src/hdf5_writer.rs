//! HDF5 dataset sink.
//!
//! Persists fused samples into a single random-access HDF5 file:
//!
//! - `samples/timestamps` (f64), `samples/chunk_ids` (i32)
//! - `lidar/data` (N x 4 f32 point pool), `lidar/offsets` (i64),
//!   `lidar/counts` (i32)
//! - `camera/images` (count x H x W x 3 u8)
//! - `transforms/<parent>_to_<child>` (count x 4 x 4 f32, lazily created)
//! - `static_transforms/<key>` (4 x 4 f32, written at finalize)
//!
//! The point pool grows by doubling and is trimmed to its exact length at
//! finalize. Offsets are dense: `offset[i] + count[i] == offset[i+1]`.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File, Group, H5Type};
use metrics::{counter, histogram};
use ndarray::{arr2, s, ArrayView1, ArrayView2, Axis};
use tracing::{debug, info, instrument, warn};

use contracts::{
    CameraIntrinsics, DatasetSink, FusedSample, Matrix4, PipelineError, Transform, WriterSettings,
};

use crate::layout;

const SINK_NAME: &str = "hdf5";

/// Row-chunk size for the 1-D bookkeeping datasets.
const INDEX_CHUNK: usize = 1024;

/// Growable dataset sink writing the fused-sample layout.
pub struct Hdf5Writer {
    file: File,
    settings: WriterSettings,

    timestamps: Dataset,
    chunk_ids: Dataset,
    lidar_data: Dataset,
    lidar_offsets: Dataset,
    lidar_counts: Dataset,

    /// Created on the first sample, fixing the image shape for the run
    images: Option<Dataset>,
    image_shape: Option<(usize, usize)>,

    /// Per-frame-pair transform datasets, created lazily
    transforms: HashMap<String, Dataset>,
    transforms_group: Group,

    sample_count: usize,
    point_cursor: usize,
    pool_capacity: usize,
    finalized: bool,
}

impl Hdf5Writer {
    /// Create the output file with the fixed group layout and an empty,
    /// pre-sized point pool.
    #[instrument(name = "writer_create", skip(settings), fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>, settings: WriterSettings) -> Result<Self, PipelineError> {
        let file = File::create(path).map_err(sink_err)?;

        let samples = file.create_group(layout::SAMPLES_GROUP).map_err(sink_err)?;
        let lidar = file.create_group(layout::LIDAR_GROUP).map_err(sink_err)?;
        file.create_group(layout::CAMERA_GROUP).map_err(sink_err)?;
        let transforms_group = file
            .create_group(layout::TRANSFORMS_GROUP)
            .map_err(sink_err)?;

        let compression = settings.compression_level;
        let timestamps =
            create_column::<f64>(&samples, layout::TIMESTAMPS, compression).map_err(sink_err)?;
        let chunk_ids =
            create_column::<i32>(&samples, layout::CHUNK_IDS, compression).map_err(sink_err)?;
        let lidar_offsets =
            create_column::<i64>(&lidar, layout::LIDAR_OFFSETS, compression).map_err(sink_err)?;
        let lidar_counts =
            create_column::<i32>(&lidar, layout::LIDAR_COUNTS, compression).map_err(sink_err)?;

        let pool_capacity = settings.initial_point_pool_capacity;
        let lidar_data = create_pool(&lidar, pool_capacity, compression).map_err(sink_err)?;

        debug!(pool_capacity, "output file created");
        Ok(Self {
            file,
            settings,
            timestamps,
            chunk_ids,
            lidar_data,
            lidar_offsets,
            lidar_counts,
            images: None,
            image_shape: None,
            transforms: HashMap::new(),
            transforms_group,
            sample_count: 0,
            point_cursor: 0,
            pool_capacity,
            finalized: false,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn point_count(&self) -> usize {
        self.point_cursor
    }

    /// Append a batch of fused samples.
    ///
    /// The first sample fixes the camera image shape; later samples with a
    /// different shape are rejected.
    #[instrument(name = "writer_write_batch", skip(self, samples), fields(batch = samples.len()))]
    pub fn write_batch_sync(&mut self, samples: &[FusedSample]) -> Result<(), PipelineError> {
        for sample in samples {
            self.write_sample(sample)?;
        }
        counter!("writer_samples_total").increment(samples.len() as u64);
        Ok(())
    }

    fn write_sample(&mut self, sample: &FusedSample) -> Result<(), PipelineError> {
        let index = self.sample_count;

        let image = codec::decode_image(&sample.camera)?;
        let (h, w, _) = image.dim();
        match self.image_shape {
            None => {
                self.images = Some(
                    create_image_dataset(
                        &self.file,
                        h,
                        w,
                        self.settings.compression_level,
                    )
                    .map_err(sink_err)?,
                );
                self.image_shape = Some((h, w));
                debug!(height = h, width = w, "image shape fixed");
            }
            Some(shape) if shape != (h, w) => {
                return Err(PipelineError::sink_write(
                    SINK_NAME,
                    format!(
                        "image shape {}x{} does not match dataset shape {}x{}",
                        h, w, shape.0, shape.1
                    ),
                ));
            }
            Some(_) => {}
        }

        let points = codec::decode_points(&sample.lidar, &codec::LIDAR_FIELDS)?;
        let num_points = points.nrows();
        self.ensure_pool_capacity(self.point_cursor + num_points)?;

        // Point rows first, bookkeeping after, so a failed write never
        // leaves offsets pointing at missing rows.
        if num_points > 0 {
            self.lidar_data
                .write_slice(
                    points.view(),
                    s![self.point_cursor..self.point_cursor + num_points, ..],
                )
                .map_err(sink_err)?;
        }

        let images = self.images.as_ref().ok_or_else(|| {
            PipelineError::sink_write(SINK_NAME, "image dataset missing")
        })?;
        images.resize((index + 1, h, w, 3)).map_err(sink_err)?;
        images
            .write_slice(
                image.view().insert_axis(Axis(0)),
                s![index..index + 1, .., .., ..],
            )
            .map_err(sink_err)?;

        append_value(&self.timestamps, index, sample.timestamp).map_err(sink_err)?;
        append_value(&self.chunk_ids, index, sample.chunk_id).map_err(sink_err)?;
        append_value(&self.lidar_offsets, index, self.point_cursor as i64).map_err(sink_err)?;
        append_value(&self.lidar_counts, index, num_points as i32).map_err(sink_err)?;

        for (key, matrix) in &sample.transforms {
            self.write_transform(key, index, matrix)?;
        }

        self.point_cursor += num_points;
        self.sample_count += 1;
        histogram!("writer_points_per_sample").record(num_points as f64);
        Ok(())
    }

    /// Grow the point pool by doubling when `needed` rows exceed capacity.
    fn ensure_pool_capacity(&mut self, needed: usize) -> Result<(), PipelineError> {
        if needed <= self.pool_capacity {
            return Ok(());
        }
        let new_capacity = needed.max(self.pool_capacity * 2);
        self.lidar_data
            .resize((new_capacity, 4))
            .map_err(sink_err)?;
        debug!(
            old = self.pool_capacity,
            new = new_capacity,
            "point pool grown"
        );
        self.pool_capacity = new_capacity;
        Ok(())
    }

    /// Write one transform matrix at `index`, creating the per-key dataset
    /// on first sight and growing it to cover `index`. Samples without the
    /// key leave zero-filled rows behind.
    fn write_transform(
        &mut self,
        key: &str,
        index: usize,
        matrix: &Matrix4,
    ) -> Result<(), PipelineError> {
        if !self.transforms.contains_key(key) {
            let dataset = self
                .transforms_group
                .new_dataset::<f32>()
                .shape((0.., 4, 4))
                .chunk((INDEX_CHUNK, 4, 4))
                .create(key)
                .map_err(sink_err)?;
            self.transforms.insert(key.to_string(), dataset);
        }
        let dataset = &self.transforms[key];
        dataset.resize((index + 1, 4, 4)).map_err(sink_err)?;
        let matrix = arr2(matrix);
        dataset
            .write_slice(
                matrix.view().insert_axis(Axis(0)),
                s![index..index + 1, .., ..],
            )
            .map_err(sink_err)?;
        Ok(())
    }

    /// Trim the point pool, persist counters and camera metadata, and
    /// write the static transform datasets.
    #[instrument(name = "writer_finalize", skip_all)]
    pub fn finalize_sync(
        &mut self,
        camera: Option<&CameraIntrinsics>,
        static_transforms: &[Transform],
    ) -> Result<(), PipelineError> {
        self.lidar_data
            .resize((self.point_cursor, 4))
            .map_err(sink_err)?;
        self.pool_capacity = self.point_cursor;

        write_scalar_attr(&self.file, layout::ATTR_NUM_SAMPLES, self.sample_count as i64)
            .map_err(sink_err)?;
        write_scalar_attr(
            &self.file,
            layout::ATTR_POINT_OFFSET,
            self.point_cursor as i64,
        )
        .map_err(sink_err)?;

        match camera {
            Some(intrinsics) => self.write_camera_attrs(intrinsics)?,
            None => warn!("no camera intrinsics captured, metadata attrs omitted"),
        }

        if static_transforms.is_empty() {
            warn!("no static transforms captured, static_transforms group omitted");
        } else {
            let group = self
                .file
                .create_group(layout::STATIC_TRANSFORMS_GROUP)
                .map_err(sink_err)?;
            for transform in static_transforms {
                let matrix = codec::transform_to_matrix(transform);
                group
                    .new_dataset::<f32>()
                    .shape((4, 4))
                    .create(transform.key().as_str())
                    .map_err(sink_err)?
                    .write(arr2(&matrix).view())
                    .map_err(sink_err)?;
            }
        }

        self.finalized = true;
        info!(
            samples = self.sample_count,
            points = self.point_cursor,
            "dataset finalized"
        );
        Ok(())
    }

    fn write_camera_attrs(&self, intrinsics: &CameraIntrinsics) -> Result<(), PipelineError> {
        write_matrix_attr(&self.file, layout::ATTR_CAMERA_K, &intrinsics.k, (3, 3))
            .map_err(sink_err)?;
        write_matrix_attr(&self.file, layout::ATTR_CAMERA_R, &intrinsics.r, (3, 3))
            .map_err(sink_err)?;
        write_matrix_attr(&self.file, layout::ATTR_CAMERA_P, &intrinsics.p, (3, 4))
            .map_err(sink_err)?;

        let d = self
            .file
            .new_attr::<f64>()
            .shape((intrinsics.d.len(),))
            .create(layout::ATTR_CAMERA_D)
            .map_err(sink_err)?;
        d.write(ArrayView1::from(intrinsics.d.as_slice()))
            .map_err(sink_err)?;

        let model = VarLenUnicode::from_str(&intrinsics.distortion_model).map_err(|e| {
            PipelineError::sink_write(SINK_NAME, format!("invalid distortion model string: {e}"))
        })?;
        self.file
            .new_attr::<VarLenUnicode>()
            .create(layout::ATTR_DISTORTION_MODEL)
            .map_err(sink_err)?
            .write_scalar(&model)
            .map_err(sink_err)?;

        write_scalar_attr(&self.file, layout::ATTR_CAMERA_WIDTH, intrinsics.width as i64)
            .map_err(sink_err)?;
        write_scalar_attr(
            &self.file,
            layout::ATTR_CAMERA_HEIGHT,
            intrinsics.height as i64,
        )
        .map_err(sink_err)?;
        Ok(())
    }
}

impl DatasetSink for Hdf5Writer {
    fn name(&self) -> &str {
        SINK_NAME
    }

    async fn write_batch(&mut self, samples: &[FusedSample]) -> Result<(), PipelineError> {
        self.write_batch_sync(samples)
    }

    async fn finalize(
        &mut self,
        camera: Option<&CameraIntrinsics>,
        static_transforms: &[Transform],
    ) -> Result<(), PipelineError> {
        self.finalize_sync(camera, static_transforms)
    }
}

impl Drop for Hdf5Writer {
    fn drop(&mut self) {
        if !self.finalized {
            warn!(
                samples = self.sample_count,
                "writer dropped without finalize, metadata attrs are missing"
            );
        }
    }
}

fn sink_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::sink_write(SINK_NAME, e.to_string())
}

fn create_column<T: H5Type>(
    group: &Group,
    name: &str,
    compression: u8,
) -> hdf5::Result<Dataset> {
    let mut builder = group.new_dataset::<T>().shape((0..,)).chunk((INDEX_CHUNK,));
    if compression > 0 {
        builder = builder.deflate(compression);
    }
    builder.create(name)
}

fn create_pool(group: &Group, capacity: usize, compression: u8) -> hdf5::Result<Dataset> {
    let mut builder = group
        .new_dataset::<f32>()
        .shape((0.., 4))
        .chunk((INDEX_CHUNK, 4));
    if compression > 0 {
        builder = builder.deflate(compression);
    }
    let dataset = builder.create(layout::LIDAR_DATA)?;
    dataset.resize((capacity, 4))?;
    Ok(dataset)
}

fn create_image_dataset(
    file: &File,
    height: usize,
    width: usize,
    compression: u8,
) -> hdf5::Result<Dataset> {
    let camera = file.group(layout::CAMERA_GROUP)?;
    let mut builder = camera
        .new_dataset::<u8>()
        .shape((0.., height, width, 3))
        .chunk((1, height, width, 3));
    if compression > 0 {
        builder = builder.deflate(compression);
    }
    builder.create(layout::CAMERA_IMAGES)
}

fn append_value<T: H5Type>(dataset: &Dataset, index: usize, value: T) -> hdf5::Result<()> {
    dataset.resize((index + 1,))?;
    dataset.write_slice(ArrayView1::from(&[value][..]), s![index..index + 1])
}

fn write_scalar_attr(file: &File, name: &str, value: i64) -> hdf5::Result<()> {
    file.new_attr::<i64>().create(name)?.write_scalar(&value)
}

fn write_matrix_attr(
    file: &File,
    name: &str,
    values: &[f64],
    shape: (usize, usize),
) -> hdf5::Result<()> {
    let view = ArrayView2::from_shape(shape, values)
        .map_err(|e| hdf5::Error::Internal(e.to_string()))?;
    file.new_attr::<f64>().shape(shape).create(name)?.write(view)
}
