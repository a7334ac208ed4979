//! # Dataset Writer
//!
//! Growable HDF5 sink for fused samples.
//!
//! Responsibilities:
//! - Append fused samples batch-by-batch into a single random-access file
//! - Keep the lidar point pool densely packed with offset/count indexing
//! - Persist run metadata (counters, camera intrinsics, static transforms)
//!   at finalize

mod hdf5_writer;
mod layout;

pub use hdf5_writer::Hdf5Writer;
pub use layout::*;
