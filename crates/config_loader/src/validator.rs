//! Configuration validation module
//!
//! Validation rules:
//! - input / output paths non-empty
//! - topic names non-empty and distinct
//! - max_chunk_gap > 0
//! - sync_threshold > 0
//! - transform_cache_capacity > 0
//! - write_batch_size > 0
//! - initial_point_pool_capacity > 0
//! - compression_level <= 9

use std::collections::HashSet;

use contracts::{ConversionConfig, PipelineError};

/// Validate a ConversionConfig.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &ConversionConfig) -> Result<(), PipelineError> {
    validate_paths(config)?;
    validate_topics(config)?;
    validate_sync_settings(config)?;
    validate_writer_settings(config)?;
    Ok(())
}

fn validate_paths(config: &ConversionConfig) -> Result<(), PipelineError> {
    if config.input.as_os_str().is_empty() {
        return Err(PipelineError::config_validation(
            "input",
            "input path cannot be empty",
        ));
    }
    if config.output.as_os_str().is_empty() {
        return Err(PipelineError::config_validation(
            "output",
            "output path cannot be empty",
        ));
    }
    Ok(())
}

/// Topic names must be non-empty and mutually distinct
fn validate_topics(config: &ConversionConfig) -> Result<(), PipelineError> {
    let topics = &config.topics;
    let named = [
        ("topics.lidar", topics.lidar.as_str()),
        ("topics.camera_image", topics.camera_image.as_str()),
        ("topics.camera_info", topics.camera_info.as_str()),
        ("topics.tf", topics.tf.as_str()),
        ("topics.tf_static", topics.tf_static.as_str()),
    ];

    let mut seen = HashSet::new();
    for (field, topic) in named {
        if topic.is_empty() {
            return Err(PipelineError::config_validation(
                field,
                "topic name cannot be empty",
            ));
        }
        if !seen.insert(topic) {
            return Err(PipelineError::config_validation(
                field,
                format!("duplicate topic name '{topic}'"),
            ));
        }
    }
    Ok(())
}

fn validate_sync_settings(config: &ConversionConfig) -> Result<(), PipelineError> {
    let sync = &config.sync;

    if sync.max_chunk_gap <= 0.0 {
        return Err(PipelineError::config_validation(
            "sync.max_chunk_gap",
            format!("max_chunk_gap must be > 0, got {}", sync.max_chunk_gap),
        ));
    }
    if sync.sync_threshold <= 0.0 {
        return Err(PipelineError::config_validation(
            "sync.sync_threshold",
            format!("sync_threshold must be > 0, got {}", sync.sync_threshold),
        ));
    }
    if sync.transform_cache_capacity == 0 {
        return Err(PipelineError::config_validation(
            "sync.transform_cache_capacity",
            "transform_cache_capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_writer_settings(config: &ConversionConfig) -> Result<(), PipelineError> {
    let writer = &config.writer;

    if writer.write_batch_size == 0 {
        return Err(PipelineError::config_validation(
            "writer.write_batch_size",
            "write_batch_size must be > 0",
        ));
    }
    if writer.initial_point_pool_capacity == 0 {
        return Err(PipelineError::config_validation(
            "writer.initial_point_pool_capacity",
            "initial_point_pool_capacity must be > 0",
        ));
    }
    if writer.compression_level > 9 {
        return Err(PipelineError::config_validation(
            "writer.compression_level",
            format!(
                "compression_level must be <= 9, got {}",
                writer.compression_level
            ),
        ));
    }
    Ok(())
}
