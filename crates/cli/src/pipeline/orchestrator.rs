//! Pipeline orchestrator - coordinates all components.
//!
//! Wires the MCAP source, the synchronizer, and the HDF5 writer together
//! and owns the chunk-id counter: each closed synchronization window gets
//! the next id, stamped on every sample it emitted.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ConversionConfig, DatasetSink, FusedSample};
use dataset_writer::Hdf5Writer;
use ingestion::McapSource;
use observability::ConversionStats;
use sync_engine::Synchronizer;
use tracing::{debug, info, warn};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The conversion configuration
    pub config: ConversionConfig,

    /// Ingestion channel capacity
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the conversion to completion
    pub async fn run(self) -> Result<ConversionStats> {
        let start_time = Instant::now();
        let conversion = &self.config.config;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        info!(
            input = %conversion.input.display(),
            output = %conversion.output.display(),
            "Opening recording"
        );

        let source = McapSource::new(&conversion.input, conversion.topics.clone());
        let (rx, reader) = source
            .spawn(self.config.buffer_size)
            .context("Failed to start recording reader")?;

        let mut synchronizer = Synchronizer::new(conversion.sync.clone());
        let mut writer =
            Hdf5Writer::create(&conversion.output, conversion.writer.clone()).with_context(
                || format!("Failed to create dataset at {}", conversion.output.display()),
            )?;

        let batch_size = conversion.writer.write_batch_size.max(1);
        let mut pending: Vec<FusedSample> = Vec::with_capacity(batch_size);
        let mut stats = ConversionStats::new();
        let mut next_chunk_id: i32 = 0;

        while let Ok(message) = rx.recv().await {
            if let Some(flushed) = synchronizer.process_message(message) {
                debug!(
                    chunk_id = next_chunk_id,
                    samples = flushed.len(),
                    "Synchronization window closed"
                );
                stats.record_window();
                stage_samples(flushed, next_chunk_id, &mut pending, &mut stats);
                next_chunk_id += 1;

                if pending.len() >= batch_size {
                    writer
                        .write_batch(&pending)
                        .await
                        .context("Batch write failed")?;
                    pending.clear();
                }
            }
        }

        // Close the window left in the buffers once the recording ends
        let residual = synchronizer.flush();
        if !residual.is_empty() {
            debug!(
                chunk_id = next_chunk_id,
                samples = residual.len(),
                "Final window closed"
            );
            stats.record_window();
            stage_samples(residual, next_chunk_id, &mut pending, &mut stats);
        }

        if !pending.is_empty() {
            writer
                .write_batch(&pending)
                .await
                .context("Batch write failed")?;
            pending.clear();
        }

        let summary = reader
            .await
            .context("Recording reader task panicked")?
            .context("Recording read failed")?;

        stats.unpaired_dropped = synchronizer.unpaired_dropped();
        stats.messages_read = summary.messages_forwarded;
        stats.messages_skipped = summary.messages_skipped;

        if summary.camera_intrinsics.is_none() {
            warn!("Recording carried no camera intrinsics - calibration attributes will be absent");
        }

        writer
            .finalize(
                summary.camera_intrinsics.as_ref(),
                &summary.static_transforms,
            )
            .await
            .context("Failed to finalize dataset")?;

        info!(
            samples = stats.samples_written,
            windows = stats.windows_flushed,
            unpaired_dropped = stats.unpaired_dropped,
            duration_secs = format!("{:.2}", start_time.elapsed().as_secs_f64()),
            "Conversion complete"
        );

        Ok(stats)
    }
}

/// Stamp a flushed window with its chunk id and queue it for writing
fn stage_samples(
    samples: Vec<FusedSample>,
    chunk_id: i32,
    pending: &mut Vec<FusedSample>,
    stats: &mut ConversionStats,
) {
    for mut sample in samples {
        sample.chunk_id = chunk_id;
        stats.record_sample(sample.lidar.num_points as u64);
        pending.push(sample);
    }
}
