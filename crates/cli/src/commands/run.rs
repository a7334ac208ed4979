//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref input) = args.input {
        info!(input = %input.display(), "Overriding input recording from CLI");
        config.input = input.clone();
    }
    if let Some(ref output) = args.output {
        info!(output = %output.display(), "Overriding output dataset from CLI");
        config.output = output.clone();
    }

    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        lidar = %config.topics.lidar,
        camera = %config.topics.camera_image,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        config,
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    let shutdown_signal = setup_shutdown_signal();

    info!("Starting conversion...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Conversion failed")?;
            println!("\n{}", stats.summary());
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, aborting conversion");
            anyhow::bail!("Conversion interrupted");
        }
    }

    info!("mcap2hdf5 finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::ConversionConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Input:  {}", config.input.display());
    println!("Output: {}", config.output.display());
    println!("\nTopics:");
    println!("  Lidar:        {}", config.topics.lidar);
    println!("  Camera image: {}", config.topics.camera_image);
    println!("  Camera info:  {}", config.topics.camera_info);
    println!("  TF:           {}", config.topics.tf);
    println!("  TF static:    {}", config.topics.tf_static);
    println!("\nSync:");
    println!("  Max chunk gap:   {:.3}s", config.sync.max_chunk_gap);
    println!("  Sync threshold:  {:.3}s", config.sync.sync_threshold);
    println!(
        "  Transform cache: {} entries per frame pair",
        config.sync.transform_cache_capacity
    );
    println!("\nWriter:");
    println!("  Batch size:        {}", config.writer.write_batch_size);
    println!(
        "  Point pool:        {} rows initial",
        config.writer.initial_point_pool_capacity
    );
    println!("  Compression level: {}", config.writer.compression_level);
    println!();
}
