//! DatasetSink trait - writer interface
//!
//! Defines the abstract interface for dataset sinks.

use crate::{CameraIntrinsics, FusedSample, PipelineError, Transform};

/// Dataset output trait
///
/// Exactly one sink owns the dataset handle for the duration of a run.
/// Batches must be written in the order fused samples were produced: sample
/// indices and point-pool offsets are positionally derived.
#[trait_variant::make(DatasetSink: Send)]
pub trait LocalDatasetSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Append a batch of fused samples in arrival order.
    ///
    /// # Errors
    /// Returns write/decode errors (should include context)
    async fn write_batch(&mut self, samples: &[FusedSample]) -> Result<(), PipelineError>;

    /// Trim over-allocation, persist global metadata, close the store.
    ///
    /// Missing camera metadata or static transforms are warnings, not
    /// errors; the corresponding attributes are simply absent.
    async fn finalize(
        &mut self,
        camera: Option<&CameraIntrinsics>,
        static_transforms: &[Transform],
    ) -> Result<(), PipelineError>;
}
