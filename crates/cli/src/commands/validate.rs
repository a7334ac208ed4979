//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    input: String,
    output: String,
    lidar_topic: String,
    camera_topic: String,
    max_chunk_gap: f64,
    sync_threshold: f64,
    write_batch_size: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    input: config.input.display().to_string(),
                    output: config.output.display().to_string(),
                    lidar_topic: config.topics.lidar.clone(),
                    camera_topic: config.topics.camera_image.clone(),
                    max_chunk_gap: config.sync.max_chunk_gap,
                    sync_threshold: config.sync.sync_threshold,
                    write_batch_size: config.writer.write_batch_size,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::ConversionConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.input.is_file() {
        warnings.push(format!(
            "Input recording not found: {} (can be overridden with --input)",
            config.input.display()
        ));
    }

    if config.output.exists() {
        warnings.push(format!(
            "Output already exists and will be overwritten: {}",
            config.output.display()
        ));
    }

    if config.sync.sync_threshold > config.sync.max_chunk_gap {
        warnings.push(
            "sync_threshold exceeds max_chunk_gap - windows may close before a camera partner arrives"
                .to_string(),
        );
    }

    if config.writer.compression_level == 0 {
        warnings.push("Compression disabled - bulk datasets will be stored raw".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Input:  {}", summary.input);
            println!("  Output: {}", summary.output);
            println!("  Lidar topic:  {}", summary.lidar_topic);
            println!("  Camera topic: {}", summary.camera_topic);
            println!(
                "  Sync: gap {:.3}s, threshold {:.3}s",
                summary.max_chunk_gap, summary.sync_threshold
            );
            println!("  Write batch size: {}", summary.write_batch_size);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
