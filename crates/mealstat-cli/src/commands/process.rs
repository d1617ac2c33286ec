//! Process command - extract orders from stored messages one by one.
//!
//! Unlike `batch`, nothing is deduplicated or merged: every message gets
//! its own outcome, which makes this the tool for checking a template
//! against a handful of saved emails.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use mealstat_core::export::{format_timestamp, write_dataset};
use mealstat_core::extract::rules::format_inr;
use mealstat_core::{
    ExtractionFailure, MealstatConfig, MessageExtractor, OrderExtractor, OrderRecord,
    RawMessage, RecordValidator,
};

use super::{expand_inputs, load_config, read_messages};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file, directory or glob pattern (.json, .jsonl, .eml)
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip cross-field validation of extracted records
    #[arg(long)]
    no_validate: bool,

    /// Do not filter .eml files by sender and subject
    #[arg(long)]
    no_filter: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (accepted records only)
    Csv,
    /// Plain text summary
    Text,
}

/// Outcome of one message, as printed.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum MessageOutcome {
    Ok { record: OrderRecord },
    Failed { failure: ExtractionFailure },
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut messages = Vec::new();
    for path in expand_inputs(&args.input)? {
        info!("Reading {}", path.display());
        messages.extend(read_messages(&path, &config, !args.no_filter)?);
    }

    if messages.is_empty() {
        anyhow::bail!("No delivery confirmations found in {}", args.input);
    }

    let extractor = OrderExtractor::from_config(&config.extraction)?;
    let outcomes = process_messages(&extractor, &messages, !args.no_validate);

    let output = format_outcomes(&outcomes, args.format, &config)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn process_messages(
    extractor: &OrderExtractor,
    messages: &[RawMessage],
    validate: bool,
) -> Vec<MessageOutcome> {
    let validator = RecordValidator::new();

    messages
        .iter()
        .map(|message| {
            let outcome = extractor.extract(message).and_then(|record| {
                if validate {
                    validator.validate(record)
                } else {
                    Ok(record)
                }
            });
            match outcome {
                Ok(record) => MessageOutcome::Ok { record },
                Err(failure) => MessageOutcome::Failed { failure },
            }
        })
        .collect()
}

fn format_outcomes(
    outcomes: &[MessageOutcome],
    format: OutputFormat,
    config: &MealstatConfig,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(outcomes)?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Csv => format_csv(outcomes, config),
        OutputFormat::Text => format_text(outcomes, config),
    }
}

fn format_csv(outcomes: &[MessageOutcome], config: &MealstatConfig) -> anyhow::Result<String> {
    let records: Vec<OrderRecord> = outcomes
        .iter()
        .filter_map(|o| match o {
            MessageOutcome::Ok { record } => Some(record.clone()),
            MessageOutcome::Failed { .. } => None,
        })
        .collect();

    let mut buf = Vec::new();
    write_dataset(&mut buf, &records, &config.export.timestamp_format)?;
    Ok(String::from_utf8(buf)?)
}

fn format_text(outcomes: &[MessageOutcome], config: &MealstatConfig) -> anyhow::Result<String> {
    let format = config.export.timestamp_format.as_str();
    let mut output = String::new();

    for outcome in outcomes {
        match outcome {
            MessageOutcome::Ok { record } => {
                output.push_str(&format!("Message: {}\n", record.source_message_id));
                output.push_str(&format!("  Restaurant: {}\n", record.restaurant_name));
                output.push_str(&format!(
                    "  Ordered:    {}\n",
                    format_timestamp(&record.order_time, format)?
                ));
                if let Some(delivered) = &record.delivery_time {
                    output.push_str(&format!(
                        "  Delivered:  {}\n",
                        format_timestamp(delivered, format)?
                    ));
                }
                if let Some(mins) = record.delivery_duration_mins() {
                    output.push_str(&format!("  Took:       {:.0} min\n", mins));
                }
                output.push_str(&format!("  Amount:     {}\n", format_inr(record.amount)));
                if !record.discount_amount.is_zero() {
                    output.push_str(&format!(
                        "  Discount:   {}\n",
                        format_inr(record.discount_amount)
                    ));
                }
            }
            MessageOutcome::Failed { failure } => {
                output.push_str(&format!("Message: {}\n", failure.message_id));
                output.push_str(&format!("  Failed: {}\n", failure.reason));
            }
        }
        output.push('\n');
    }

    Ok(output)
}
