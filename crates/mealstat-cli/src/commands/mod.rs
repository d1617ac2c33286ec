//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod stats;

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use tracing::debug;

use mealstat_core::ingest::{parse_eml, read_json_messages};
use mealstat_core::{MealstatConfig, RawMessage};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mealstat")
        .join("config.json")
}

/// Load configuration from an explicit path, the default path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<MealstatConfig> {
    if let Some(path) = config_path {
        return Ok(MealstatConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(MealstatConfig::from_file(&default_path)?)
    } else {
        Ok(MealstatConfig::default())
    }
}

/// Expand an input path, directory, or glob pattern to message files.
pub fn expand_inputs(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);
    let pattern = if path.is_dir() {
        path.join("*").to_string_lossy().into_owned()
    } else {
        input.to_string()
    };

    let mut files: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "json" | "jsonl" | "eml")
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", input);
    }

    Ok(files)
}

/// Read every message stored in a file.
///
/// `.eml` files are checked against the configured sender, subject
/// keywords and date range when `filter` is set. JSON dumps are trusted
/// as already filtered.
pub fn read_messages(
    path: &Path,
    config: &MealstatConfig,
    filter: bool,
) -> anyhow::Result<Vec<RawMessage>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" | "jsonl" => {
            let content = fs::read_to_string(path)?;
            Ok(read_json_messages(&content)?)
        }
        "eml" => {
            let raw = fs::read(path)?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("message");
            let envelope = parse_eml(&raw, stem)?;

            if filter && !config.mail.accepts(&envelope.from, &envelope.message.subject) {
                debug!(
                    "Skipping {}: not a delivery confirmation from {}",
                    path.display(),
                    config.mail.sender
                );
                return Ok(Vec::new());
            }
            if filter && !config.mail.in_range(envelope.message.received_at.date_naive()) {
                debug!("Skipping {}: outside the configured date range", path.display());
                return Ok(Vec::new());
            }
            Ok(vec![envelope.message])
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}
