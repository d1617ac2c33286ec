//! Structured order records extracted from delivery confirmations.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The structured result of successfully parsing one [`RawMessage`](super::message::RawMessage).
///
/// Records are built once by the extractor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Restaurant the order was placed with.
    pub restaurant_name: String,

    /// When the order was placed, in the sender's reporting timezone.
    pub order_time: DateTime<FixedOffset>,

    /// When the order was delivered, if the message reports it.
    pub delivery_time: Option<DateTime<FixedOffset>>,

    /// Order total.
    pub amount: Decimal,

    /// Discount applied; zero when the message reports none.
    pub discount_amount: Decimal,

    /// Id of the message this record came from.
    pub source_message_id: String,
}

impl OrderRecord {
    /// Minutes between order and delivery, when both are known.
    pub fn delivery_duration_mins(&self) -> Option<f64> {
        self.delivery_time
            .map(|delivered| (delivered - self.order_time).num_seconds() as f64 / 60.0)
    }

    /// Amount actually charged after the discount.
    pub fn net_amount(&self) -> Decimal {
        self.amount - self.discount_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn record(delivery_time: Option<DateTime<FixedOffset>>) -> OrderRecord {
        OrderRecord {
            restaurant_name: "Tasty Bites".to_string(),
            order_time: ts("2024-03-01T19:30:00+05:30"),
            delivery_time,
            amount: Decimal::from_str("450.00").unwrap(),
            discount_amount: Decimal::from_str("50.00").unwrap(),
            source_message_id: "m-1".to_string(),
        }
    }

    #[test]
    fn test_delivery_duration() {
        let rec = record(Some(ts("2024-03-01T20:05:00+05:30")));
        assert_eq!(rec.delivery_duration_mins(), Some(35.0));

        let rec = record(None);
        assert_eq!(rec.delivery_duration_mins(), None);
    }

    #[test]
    fn test_net_amount() {
        let rec = record(None);
        assert_eq!(rec.net_amount(), Decimal::from_str("400.00").unwrap());
    }
}
