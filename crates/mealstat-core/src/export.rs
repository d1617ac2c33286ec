//! Row-oriented CSV export of the order dataset.
//!
//! Columns are `restaurant_name, order_time, delivery_time, amount,
//! discount_amount, source_message_id, delivery_duration_mins`. An absent
//! delivery time is written as an empty cell, never as a zero timestamp.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{MealstatError, Result};
use crate::models::order::OrderRecord;

/// Header row of the exported dataset.
pub const COLUMNS: [&str; 7] = [
    "restaurant_name",
    "order_time",
    "delivery_time",
    "amount",
    "discount_amount",
    "source_message_id",
    "delivery_duration_mins",
];

/// Reject strftime formats with unknown or incomplete specifiers.
pub fn check_timestamp_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid_format(format));
    }
    Ok(())
}

/// Render a timestamp, failing instead of panicking on a bad format.
pub fn format_timestamp(ts: &DateTime<FixedOffset>, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", ts.format(format)).map_err(|_| invalid_format(format))?;
    Ok(out)
}

fn invalid_format(format: &str) -> MealstatError {
    MealstatError::Config(format!("invalid timestamp format '{}'", format))
}

/// Write records as CSV.
pub fn write_dataset<W: io::Write>(
    writer: W,
    records: &[OrderRecord],
    timestamp_format: &str,
) -> Result<()> {
    check_timestamp_format(timestamp_format)?;

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;

    for record in records {
        wtr.write_record([
            record.restaurant_name.clone(),
            format_timestamp(&record.order_time, timestamp_format)?,
            record
                .delivery_time
                .map(|t| format_timestamp(&t, timestamp_format))
                .transpose()?
                .unwrap_or_default(),
            record.amount.to_string(),
            record.discount_amount.to_string(),
            record.source_message_id.clone(),
            record
                .delivery_duration_mins()
                .map(|m| format!("{:.1}", m))
                .unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write records to a CSV file, replacing it.
pub fn write_dataset_file(path: &Path, records: &[OrderRecord], timestamp_format: &str) -> Result<()> {
    let file = File::create(path)?;
    write_dataset(file, records, timestamp_format)?;
    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read records back from CSV written by [`write_dataset`].
///
/// Timestamps without an explicit offset are placed in `offset`.
pub fn read_dataset<R: io::Read>(
    reader: R,
    timestamp_format: &str,
    offset: FixedOffset,
) -> Result<Vec<OrderRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        let line = i + 2;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();
        let invalid = |reason: String| MealstatError::InvalidRow { row: line, reason };

        let parse_time = |s: &str| {
            parse_timestamp(s, timestamp_format, offset)
                .ok_or_else(|| invalid(format!("bad timestamp '{}'", s)))
        };
        let parse_decimal = |s: &str| {
            Decimal::from_str(s).map_err(|e| invalid(format!("bad amount '{}': {}", s, e)))
        };

        let delivery_time = match field(2) {
            "" => None,
            s => Some(parse_time(s)?),
        };

        records.push(OrderRecord {
            restaurant_name: field(0).to_string(),
            order_time: parse_time(field(1))?,
            delivery_time,
            amount: parse_decimal(field(3))?,
            discount_amount: parse_decimal(field(4))?,
            source_message_id: field(5).to_string(),
        });
    }

    Ok(records)
}

/// Read a dataset file; a missing file is an empty dataset.
pub fn read_dataset_file(
    path: &Path,
    timestamp_format: &str,
    offset: FixedOffset,
) -> Result<Vec<OrderRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_dataset(File::open(path)?, timestamp_format, offset)
}

/// Combine a stored dataset with newly accepted records.
///
/// Stored records win over new ones with the same message id. The result
/// is ordered by `(order_time, source_message_id)`.
pub fn merge(existing: Vec<OrderRecord>, new: Vec<OrderRecord>) -> Vec<OrderRecord> {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.source_message_id.clone()).collect();
    let mut merged = existing;

    for record in new {
        if seen.insert(record.source_message_id.clone()) {
            merged.push(record);
        }
    }

    merged.sort_by(|a, b| {
        a.order_time
            .cmp(&b.order_time)
            .then_with(|| a.source_message_id.cmp(&b.source_message_id))
    });
    merged
}

fn parse_timestamp(s: &str, format: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, format)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, format)
                .ok()
                .and_then(|naive| offset.from_local_datetime(&naive).single())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok())
}
