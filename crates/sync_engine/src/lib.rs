//! # Sync Engine
//!
//! Time-windowed multi-sensor synchronization.
//!
//! Responsibilities:
//! - Buffer lidar and camera frames into gap-delimited windows
//! - Pair each lidar frame with its nearest camera frame at flush
//! - Maintain a bounded transform interpolation cache across windows
//!
//! ## Usage
//!
//! ```ignore
//! use sync_engine::Synchronizer;
//!
//! let mut sync = Synchronizer::new(config.sync.clone());
//! while let Ok(message) = rx.recv().await {
//!     if let Some(samples) = sync.process_message(message) {
//!         // a gap closed the window
//!     }
//! }
//! let residual = sync.flush();
//! ```

mod buffer;
mod engine;
mod tf_cache;

pub use buffer::ChunkBuffer;
pub use engine::Synchronizer;
pub use tf_cache::TransformCache;
