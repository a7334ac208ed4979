//! # Ingestion
//!
//! MCAP recording ingestion.
//!
//! Responsibilities:
//! - Open a recording and stream its messages in log order
//! - Decode CDR payloads into the shared contract types
//! - Capture camera intrinsics and static transforms out-of-band
//! - Inspect a recording's topic table and auto-detect sensor topics
//!
//! The reader runs on a blocking worker and forwards messages over a
//! bounded async-channel, so a slow consumer backpressures the file read
//! instead of buffering the whole recording.
//!
//! ## Usage
//!
//! ```ignore
//! use ingestion::McapSource;
//!
//! let source = McapSource::new(&config.input, config.topics.clone());
//! let (rx, reader) = source.spawn(256)?;
//! while let Ok(message) = rx.recv().await {
//!     // feed the synchronizer
//! }
//! let summary = reader.await??;
//! ```

mod inspect;
mod messages;
mod source;

pub use inspect::{inspect, DetectedTopics, InspectReport, TopicInfo};
pub use messages::{
    CameraInfo, CompressedImage, Header, PointCloud2, PointFieldMsg, TfMessage, Time,
    TransformStamped,
};
pub use source::{check_recording, McapSource, SourceSummary};
