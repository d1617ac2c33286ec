//! Aggregate statistics over an order dataset.
//!
//! Hours, weekdays and months are taken from each order's own timestamp,
//! i.e. in the sender's reporting timezone.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::order::OrderRecord;

/// Headline totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub orders: usize,
    pub total_spent: Decimal,
    pub total_discount: Decimal,
    pub average_order_value: Decimal,
}

/// Spending for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub month: String,
    pub total_spent: Decimal,
    pub order_count: usize,
    pub total_discount: Decimal,
}

/// Spending at one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantTotals {
    pub restaurant_name: String,
    pub total_spent: Decimal,
    pub order_count: usize,
}

/// Orders placed during one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub orders: usize,
}

/// Orders placed on one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayCount {
    pub weekday: String,
    pub orders: usize,
}

/// Delivery duration summary over orders that report a delivery time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryStats {
    pub measured_orders: usize,
    pub average_mins: f64,
    pub min_mins: f64,
    pub max_mins: f64,
}

/// Everything the dashboard charts, computed once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderStats {
    pub totals: Totals,
    pub monthly: Vec<MonthlyTotals>,
    pub top_by_spend: Vec<RestaurantTotals>,
    pub top_by_orders: Vec<RestaurantTotals>,
    pub by_hour: Vec<HourCount>,
    pub by_weekday: Vec<WeekdayCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryStats>,
}

impl OrderStats {
    /// Compute statistics, keeping the `top_n` restaurants in each ranking.
    pub fn compute(records: &[OrderRecord], top_n: usize) -> Self {
        Self {
            totals: totals(records),
            monthly: monthly(records),
            top_by_spend: top_restaurants(records, top_n, |a, b| {
                b.total_spent.cmp(&a.total_spent)
            }),
            top_by_orders: top_restaurants(records, top_n, |a, b| {
                b.order_count.cmp(&a.order_count)
            }),
            by_hour: by_hour(records),
            by_weekday: by_weekday(records),
            delivery: delivery(records),
        }
    }
}

fn totals(records: &[OrderRecord]) -> Totals {
    let total_spent: Decimal = records.iter().map(|r| r.amount).sum();
    let total_discount: Decimal = records.iter().map(|r| r.discount_amount).sum();
    let average_order_value = if records.is_empty() {
        Decimal::ZERO
    } else {
        (total_spent / Decimal::from(records.len())).round_dp(2)
    };

    Totals {
        orders: records.len(),
        total_spent,
        total_discount,
        average_order_value,
    }
}

fn monthly(records: &[OrderRecord]) -> Vec<MonthlyTotals> {
    let mut months: BTreeMap<String, MonthlyTotals> = BTreeMap::new();

    for record in records {
        let month = record.order_time.format("%Y-%m").to_string();
        let entry = months.entry(month.clone()).or_insert_with(|| MonthlyTotals {
            month,
            total_spent: Decimal::ZERO,
            order_count: 0,
            total_discount: Decimal::ZERO,
        });
        entry.total_spent += record.amount;
        entry.total_discount += record.discount_amount;
        entry.order_count += 1;
    }

    months.into_values().collect()
}

fn top_restaurants<F>(records: &[OrderRecord], top_n: usize, rank: F) -> Vec<RestaurantTotals>
where
    F: Fn(&RestaurantTotals, &RestaurantTotals) -> std::cmp::Ordering,
{
    let mut by_name: BTreeMap<&str, RestaurantTotals> = BTreeMap::new();

    for record in records {
        let entry = by_name
            .entry(record.restaurant_name.as_str())
            .or_insert_with(|| RestaurantTotals {
                restaurant_name: record.restaurant_name.clone(),
                total_spent: Decimal::ZERO,
                order_count: 0,
            });
        entry.total_spent += record.amount;
        entry.order_count += 1;
    }

    let mut ranked: Vec<RestaurantTotals> = by_name.into_values().collect();
    // Stable sort over name-ordered input keeps ties alphabetical.
    ranked.sort_by(|a, b| rank(a, b));
    ranked.truncate(top_n);
    ranked
}

fn by_hour(records: &[OrderRecord]) -> Vec<HourCount> {
    let mut counts = [0usize; 24];
    for record in records {
        counts[record.order_time.hour() as usize] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(hour, &orders)| HourCount {
            hour: hour as u32,
            orders,
        })
        .collect()
}

fn by_weekday(records: &[OrderRecord]) -> Vec<WeekdayCount> {
    let mut counts = [0usize; 7];
    for record in records {
        counts[record.order_time.weekday().num_days_from_monday() as usize] += 1;
    }

    let days = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    days.iter()
        .zip(counts)
        .map(|(day, orders)| WeekdayCount {
            weekday: day.to_string(),
            orders,
        })
        .collect()
}

fn delivery(records: &[OrderRecord]) -> Option<DeliveryStats> {
    let durations: Vec<f64> = records
        .iter()
        .filter_map(OrderRecord::delivery_duration_mins)
        .collect();

    if durations.is_empty() {
        return None;
    }

    let sum: f64 = durations.iter().sum();
    Some(DeliveryStats {
        measured_orders: durations.len(),
        average_mins: sum / durations.len() as f64,
        min_mins: durations.iter().copied().fold(f64::INFINITY, f64::min),
        max_mins: durations.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(name: &str, order: &str, delivery: Option<&str>, amount: &str, discount: &str) -> OrderRecord {
        let ts = |s: &str| DateTime::<FixedOffset>::parse_from_rfc3339(s).unwrap();
        OrderRecord {
            restaurant_name: name.to_string(),
            order_time: ts(order),
            delivery_time: delivery.map(ts),
            amount: dec(amount),
            discount_amount: dec(discount),
            source_message_id: format!("{}-{}", name, order),
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            // Friday
            record("Tasty Bites", "2024-03-01T19:30:00+05:30", Some("2024-03-01T20:05:00+05:30"), "450.00", "50.00"),
            // Saturday
            record("Meghana Foods", "2024-03-02T13:05:00+05:30", Some("2024-03-02T13:41:00+05:30"), "1012.00", "120.00"),
            // Monday
            record("Tasty Bites", "2024-04-01T19:10:00+05:30", None, "300.00", "0.00"),
        ]
    }

    #[test]
    fn test_totals() {
        let stats = OrderStats::compute(&sample(), 10);
        assert_eq!(
            stats.totals,
            Totals {
                orders: 3,
                total_spent: dec("1762.00"),
                total_discount: dec("170.00"),
                average_order_value: dec("587.33"),
            }
        );
    }

    #[test]
    fn test_monthly() {
        let stats = OrderStats::compute(&sample(), 10);
        assert_eq!(
            stats.monthly,
            vec![
                MonthlyTotals {
                    month: "2024-03".to_string(),
                    total_spent: dec("1462.00"),
                    order_count: 2,
                    total_discount: dec("170.00"),
                },
                MonthlyTotals {
                    month: "2024-04".to_string(),
                    total_spent: dec("300.00"),
                    order_count: 1,
                    total_discount: dec("0.00"),
                },
            ]
        );
    }

    #[test]
    fn test_rankings() {
        let stats = OrderStats::compute(&sample(), 1);
        assert_eq!(stats.top_by_spend.len(), 1);
        assert_eq!(stats.top_by_spend[0].restaurant_name, "Meghana Foods");
        assert_eq!(stats.top_by_orders[0].restaurant_name, "Tasty Bites");
        assert_eq!(stats.top_by_orders[0].order_count, 2);
    }

    #[test]
    fn test_time_patterns() {
        let stats = OrderStats::compute(&sample(), 10);
        assert_eq!(stats.by_hour.len(), 24);
        assert_eq!(stats.by_hour[19].orders, 2);
        assert_eq!(stats.by_hour[13].orders, 1);

        let weekdays: Vec<(&str, usize)> = stats
            .by_weekday
            .iter()
            .map(|w| (w.weekday.as_str(), w.orders))
            .collect();
        assert_eq!(
            weekdays,
            vec![("Mon", 1), ("Tue", 0), ("Wed", 0), ("Thu", 0), ("Fri", 1), ("Sat", 1), ("Sun", 0)]
        );
    }

    #[test]
    fn test_delivery() {
        let stats = OrderStats::compute(&sample(), 10);
        let delivery = stats.delivery.unwrap();
        assert_eq!(delivery.measured_orders, 2);
        assert_eq!(delivery.min_mins, 35.0);
        assert_eq!(delivery.max_mins, 36.0);
        assert_eq!(delivery.average_mins, 35.5);
    }

    #[test]
    fn test_empty() {
        let stats = OrderStats::compute(&[], 10);
        assert_eq!(stats.totals.orders, 0);
        assert_eq!(stats.totals.average_order_value, Decimal::ZERO);
        assert!(stats.monthly.is_empty());
        assert!(stats.delivery.is_none());
    }
}
