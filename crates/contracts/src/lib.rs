//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Sensor timestamps are seconds as `f64` (ROS2 header stamp where present,
//!   otherwise the MCAP log time)
//! - Messages arrive in log-chronological order; the synchronizer relies on it

mod config;
mod error;
mod message;
mod sample;
mod sink;

pub use config::*;
pub use error::*;
pub use message::*;
pub use sample::*;
pub use sink::*;
