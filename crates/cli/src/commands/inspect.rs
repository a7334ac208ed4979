//! `inspect` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InspectArgs;

/// Inspection report for JSON output
#[derive(Serialize)]
struct InspectOutput {
    recording: String,
    topics: Vec<TopicEntry>,
    detected: DetectedEntry,
}

#[derive(Serialize)]
struct TopicEntry {
    topic: String,
    schema: String,
    message_count: u64,
}

#[derive(Serialize)]
struct DetectedEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    lidar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera_info: Option<String>,
}

/// Execute the `inspect` command
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    info!(recording = %args.input.display(), "Inspecting recording");

    let report = ingestion::inspect(&args.input)
        .with_context(|| format!("Failed to inspect {}", args.input.display()))?;

    if args.json {
        let output = InspectOutput {
            recording: args.input.display().to_string(),
            topics: report
                .topics
                .iter()
                .map(|t| TopicEntry {
                    topic: t.topic.clone(),
                    schema: t.schema.clone(),
                    message_count: t.message_count,
                })
                .collect(),
            detected: DetectedEntry {
                lidar: report.detected.lidar.clone(),
                camera_image: report.detected.camera_image.clone(),
                camera_info: report.detected.camera_info.clone(),
            },
        };
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize inspect report")?;
        println!("{}", json);
    } else {
        print_report(args, &report);
    }

    Ok(())
}

fn print_report(args: &InspectArgs, report: &ingestion::InspectReport) {
    println!("Recording: {}", args.input.display());

    println!("\nTopics ({}):", report.topics.len());
    for topic in &report.topics {
        println!(
            "  {:<40} {:<36} {:>8} msgs",
            topic.topic, topic.schema, topic.message_count
        );
    }

    println!("\nDetected sensor topics:");
    print_role("lidar", &report.detected.lidar);
    print_role("camera image", &report.detected.camera_image);
    print_role("camera info", &report.detected.camera_info);
    println!();
}

fn print_role(role: &str, topic: &Option<String>) {
    match topic {
        Some(topic) => println!("  {:<14} {}", format!("{role}:"), topic),
        None => println!("  {:<14} (not found)", format!("{role}:")),
    }
}
