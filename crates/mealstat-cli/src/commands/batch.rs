//! Batch command - normalize a mailbox dump into the order dataset.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use mealstat_core::export::{merge, read_dataset_file, write_dataset_file};
use mealstat_core::{BatchNormalizer, ExtractionFailure, ExtractionReport};

use super::{expand_inputs, load_config, read_messages};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files, directory or glob pattern (.json, .jsonl, .eml)
    #[arg(required = true)]
    input: String,

    /// Dataset CSV to write (default: export.output_file from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the extraction report and every failure as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Replace the dataset instead of merging into it
    #[arg(long)]
    fresh: bool,

    /// Extract on a single thread
    #[arg(long)]
    sequential: bool,

    /// Do not filter .eml files by sender and subject
    #[arg(long)]
    no_filter: bool,

    /// Continue when an input file cannot be read
    #[arg(long)]
    continue_on_error: bool,
}

/// Report file contents.
#[derive(Serialize)]
struct ReportFile<'a> {
    #[serde(flatten)]
    report: &'a ExtractionReport,
    failures: &'a [ExtractionFailure],
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let offset = config.extraction.reporting_offset()?;
    let timestamp_format = config.export.timestamp_format.as_str();

    let files = expand_inputs(&args.input)?;

    println!(
        "{} Found {} files to read",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut messages = Vec::new();
    let mut unreadable = 0usize;

    for path in &files {
        match read_messages(path, &config, !args.no_filter) {
            Ok(batch) => {
                debug!("Read {} messages from {}", batch.len(), path.display());
                messages.extend(batch);
            }
            Err(e) if args.continue_on_error => {
                warn!("Failed to read {}: {}", path.display(), e);
                unreadable += 1;
            }
            Err(e) => {
                pb.abandon();
                anyhow::bail!("Failed to read {}: {}", path.display(), e);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if let Some(first) = messages.first() {
        debug!("First message: {:#?}", first);
    }
    info!("Loaded {} messages", messages.len());

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| config.export.output_file.clone());

    let existing = if args.fresh {
        Vec::new()
    } else {
        read_dataset_file(&output_path, timestamp_format, offset)?
    };
    debug!("Existing dataset has {} records", existing.len());

    let normalizer = BatchNormalizer::from_config(&config.extraction)?
        .with_known_ids(existing.iter().map(|r| r.source_message_id.clone()));
    let normalizer = if args.sequential {
        normalizer.with_parallel(false)
    } else {
        normalizer
    };

    let outcome = normalizer.normalize(&messages);
    let report = outcome.report();
    let added = outcome.dataset.len();

    let dataset = merge(existing, outcome.dataset);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_dataset_file(&output_path, &dataset, timestamp_format)?;

    if let Some(report_path) = &args.report {
        let contents = ReportFile {
            report: &report,
            failures: &outcome.failures,
        };
        fs::write(report_path, serde_json::to_string_pretty(&contents)?)?;
        println!(
            "{} Report written to {}",
            style("✓").green(),
            report_path.display()
        );
    }

    // Print summary
    println!();
    println!(
        "{} Processed {} messages in {:?}",
        style("✓").green(),
        report.total,
        start.elapsed()
    );
    println!(
        "{} {} new orders, {} total written to {}",
        style("✓").green(),
        added,
        dataset.len(),
        output_path.display()
    );

    if report.failed > 0 {
        println!("{} {}", style("✗").red(), report);
        for (field, count) in &report.missing_fields {
            println!("    missing {}: {}", field, count);
        }
    }

    if unreadable > 0 {
        println!(
            "{} {} files could not be read",
            style("⚠").yellow(),
            unreadable
        );
    }

    Ok(())
}
