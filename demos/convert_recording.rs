//! Minimal Conversion Demo
//!
//! Wires the library crates together by hand, without the CLI layer:
//! MCAP source -> synchronizer -> HDF5 writer.
//!
//! Run with: cargo run --bin convert_recording -- input.mcap output.hdf5

use contracts::{ConversionConfig, DatasetSink, FusedSample, TopicConfig};
use dataset_writer::Hdf5Writer;
use ingestion::McapSource;
use observability::ConversionStats;
use sync_engine::Synchronizer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let (input, output) = match (args.next(), args.next()) {
        (Some(input), Some(output)) => (input, output),
        _ => {
            eprintln!("usage: convert_recording <input.mcap> <output.hdf5>");
            std::process::exit(2);
        }
    };

    // ==== Stage 1: Build a configuration ====
    // Defaults for everything except the paths; a real setup would load
    // a TOML file through config_loader::ConfigLoader instead.
    let config = ConversionConfig {
        input: input.into(),
        output: output.into(),
        topics: TopicConfig::default(),
        sync: Default::default(),
        writer: Default::default(),
    };

    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        "Starting conversion demo"
    );

    // ==== Stage 2: Inspect the recording ====
    let report = ingestion::inspect(&config.input)?;
    for topic in &report.topics {
        tracing::info!(
            topic = %topic.topic,
            schema = %topic.schema,
            messages = topic.message_count,
            "recording topic"
        );
    }

    // ==== Stage 3: Stream, synchronize, write ====
    let source = McapSource::new(&config.input, config.topics.clone());
    let (rx, reader) = source.spawn(100)?;

    let mut synchronizer = Synchronizer::new(config.sync.clone());
    let mut writer = Hdf5Writer::create(&config.output, config.writer.clone())?;

    let batch_size = config.writer.write_batch_size;
    let mut pending: Vec<FusedSample> = Vec::with_capacity(batch_size);
    let mut stats = ConversionStats::new();
    let mut next_chunk_id: i32 = 0;

    while let Ok(message) = rx.recv().await {
        if let Some(flushed) = synchronizer.process_message(message) {
            stats.record_window();
            for mut sample in flushed {
                sample.chunk_id = next_chunk_id;
                stats.record_sample(sample.lidar.num_points as u64);
                pending.push(sample);
            }
            next_chunk_id += 1;

            if pending.len() >= batch_size {
                writer.write_batch(&pending).await?;
                pending.clear();
            }
        }
    }

    let residual = synchronizer.flush();
    if !residual.is_empty() {
        stats.record_window();
        for mut sample in residual {
            sample.chunk_id = next_chunk_id;
            stats.record_sample(sample.lidar.num_points as u64);
            pending.push(sample);
        }
    }
    if !pending.is_empty() {
        writer.write_batch(&pending).await?;
    }

    // ==== Stage 4: Finalize with the out-of-band captures ====
    let summary = reader.await??;
    stats.unpaired_dropped = synchronizer.unpaired_dropped();
    stats.messages_read = summary.messages_forwarded;
    stats.messages_skipped = summary.messages_skipped;

    writer
        .finalize(
            summary.camera_intrinsics.as_ref(),
            &summary.static_transforms,
        )
        .await?;

    println!("\n{}", stats.summary());
    Ok(())
}
