//! Layered error definitions
//!
//! Categorized by source: config / source / decode / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum PipelineError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Log file absent or unreadable; fails immediately, no retry
    #[error("source file not readable: {path}: {message}")]
    MissingSource { path: String, message: String },

    /// Malformed MCAP container
    #[error("mcap read error: {message}")]
    SourceRead { message: String },

    // ===== Decode Errors =====
    /// A point-cloud record lacks a requested field
    #[error("point cloud is missing requested field '{field}'")]
    MalformedRecord { field: String },

    /// Payload decode error (CDR or image codec)
    #[error("decode error in {context}: {message}")]
    Decode { context: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing-source error
    pub fn missing_source(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MissingSource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create source read error
    pub fn source_read(message: impl Into<String>) -> Self {
        Self::SourceRead {
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
