//! Timestamp extraction for delivery confirmations.
//!
//! The sender has changed its date layout between template versions, so a
//! value is tried against each recognized layout in turn. A layout that
//! recognizes the text but yields an impossible date or time is a failure;
//! the next layout is not consulted.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use regex::{Captures, Regex};

use super::patterns::{
    month_to_number, TIMESTAMP_DAY_FIRST, TIMESTAMP_DMY, TIMESTAMP_ISO, TIMESTAMP_MONTH_FIRST,
};
use super::{ExtractionMatch, FieldExtractor, FieldResult};
use crate::error::FailureReason;

/// Turns the captures of one layout into a wall-clock time.
type Convert = fn(&Captures<'_>) -> Option<NaiveDateTime>;

/// Timestamp field extractor, interpreting wall-clock values in the
/// sender's reporting timezone.
pub struct TimestampExtractor {
    offset: FixedOffset,
}

impl TimestampExtractor {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Indian Standard Time, the reporting zone of the default sender.
    pub fn ist() -> Self {
        Self::new(ist_offset())
    }

    fn localize(&self, naive: Option<NaiveDateTime>) -> Result<DateTime<FixedOffset>, FailureReason> {
        naive
            .and_then(|n| self.offset.from_local_datetime(&n).single())
            .ok_or(FailureReason::UnparsableTimestamp)
    }
}

impl Default for TimestampExtractor {
    fn default() -> Self {
        Self::ist()
    }
}

impl FieldExtractor for TimestampExtractor {
    type Output = DateTime<FixedOffset>;

    fn extract(&self, text: &str) -> Option<FieldResult<DateTime<FixedOffset>>> {
        let layouts: [(&Regex, Convert); 4] = [
            (&*TIMESTAMP_MONTH_FIRST, month_first as Convert),
            (&*TIMESTAMP_DAY_FIRST, day_first as Convert),
            (&*TIMESTAMP_ISO, iso as Convert),
            (&*TIMESTAMP_DMY, dmy as Convert),
        ];

        for (pattern, convert) in layouts {
            if let Some(caps) = pattern.captures(text) {
                let full_match = caps.get(0)?;
                return Some(self.localize(convert(&caps)).map(|ts| {
                    ExtractionMatch::new(ts, full_match.as_str())
                        .with_position(full_match.start(), full_match.end())
                }));
            }
        }

        None
    }

    fn extract_all(&self, text: &str) -> Vec<FieldResult<DateTime<FixedOffset>>> {
        text.lines().filter_map(|line| self.extract(line)).collect()
    }
}

/// UTC+05:30.
pub fn ist_offset() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap_or(Utc.fix())
}

fn month_first(caps: &Captures) -> Option<NaiveDateTime> {
    let month = month_to_number(&caps[1]);
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let hour = hour_from_12h(caps[4].parse().ok()?, &caps[6])?;
    let minute: u32 = caps[5].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

fn day_first(caps: &Captures) -> Option<NaiveDateTime> {
    let day: u32 = caps[1].parse().ok()?;
    let month = month_to_number(&caps[2]);
    let year: i32 = caps[3].parse().ok()?;
    let hour = hour_from_12h(caps[4].parse().ok()?, &caps[6])?;
    let minute: u32 = caps[5].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

fn iso(caps: &Captures) -> Option<NaiveDateTime> {
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let second: u32 = match caps.get(6) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

fn dmy(caps: &Captures) -> Option<NaiveDateTime> {
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

fn hour_from_12h(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = meridiem.eq_ignore_ascii_case("p");
    Some(match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ist(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn extract(text: &str) -> Option<FieldResult<DateTime<FixedOffset>>> {
        TimestampExtractor::ist().extract(text)
    }

    #[test]
    fn test_weekday_long_format() {
        let result = extract("Friday, March 1, 2024 7:30 PM").unwrap().unwrap();
        assert_eq!(result.value, ist("2024-03-01T19:30:00+05:30"));
    }

    #[test]
    fn test_weekday_is_not_checked() {
        // Mismatched weekday names are tolerated; the date is authoritative.
        let result = extract("Monday, March 1, 2024 12:05 AM").unwrap().unwrap();
        assert_eq!(result.value, ist("2024-03-01T00:05:00+05:30"));
    }

    #[test]
    fn test_day_first_format() {
        let result = extract("1 Mar 2024, 12:15 pm").unwrap().unwrap();
        assert_eq!(result.value, ist("2024-03-01T12:15:00+05:30"));
    }

    #[test]
    fn test_iso_format() {
        let result = extract("2024-03-01 19:30").unwrap().unwrap();
        assert_eq!(result.value, ist("2024-03-01T19:30:00+05:30"));

        let result = extract("2024-03-01T19:30:15").unwrap().unwrap();
        assert_eq!(result.value, ist("2024-03-01T19:30:15+05:30"));
    }

    #[test]
    fn test_dmy_format() {
        let result = extract("01/03/2024 19:30").unwrap().unwrap();
        assert_eq!(result.value, ist("2024-03-01T19:30:00+05:30"));
    }

    #[test]
    fn test_impossible_values() {
        assert_eq!(
            extract("2024-02-30 19:30").unwrap().unwrap_err(),
            FailureReason::UnparsableTimestamp
        );
        assert_eq!(
            extract("2024-03-01 25:10").unwrap().unwrap_err(),
            FailureReason::UnparsableTimestamp
        );
        assert_eq!(
            extract("March 1, 2024 13:30 PM").unwrap().unwrap_err(),
            FailureReason::UnparsableTimestamp
        );
    }

    #[test]
    fn test_unrecognized() {
        assert!(extract("sometime yesterday").is_none());
        assert!(extract("Smarch 1, 2024 7:30 PM").is_none());
        assert!(extract("Order 12, 2024 7:30 PM").is_none());
    }

    #[test]
    fn test_other_offset() {
        let utc = TimestampExtractor::new(FixedOffset::east_opt(0).unwrap());
        let result = utc.extract("2024-03-01 19:30").unwrap().unwrap();
        assert_eq!(result.value, ist("2024-03-01T19:30:00+00:00"));
    }
}
