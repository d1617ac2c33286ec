//! Known delivery-confirmation layouts.
//!
//! Each template locates the raw text of every field it knows about and
//! nothing more; turning that text into typed values is shared by all
//! templates and lives in the extractor. Supporting a new layout means
//! adding one [`TemplateMatcher`] to [`default_templates`].

use regex::Regex;

use super::rules::patterns::{
    CURRENCY_AMOUNT, INLINE_AMOUNT, INLINE_DELIVERED_AT, INLINE_DISCOUNT, INLINE_ORDERED_AT,
    INLINE_RESTAURANT,
};

/// Raw field text located by a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatedFields {
    /// Text between the restaurant markers, untrimmed; may be empty.
    pub restaurant_name: String,
    /// Text holding the order amount.
    pub amount: String,
    /// Text holding the discount, if the layout reports one.
    pub discount: Option<String>,
    /// Text holding the order time.
    pub order_time: Option<String>,
    /// Text holding the delivery time.
    pub delivery_time: Option<String>,
}

/// A fixed rule recognizing one known email layout.
pub trait TemplateMatcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Locate the fields of this layout in the body lines.
    ///
    /// Returns `None` unless the restaurant marker, the amount marker and
    /// at least one timestamp marker are all present.
    fn locate(&self, lines: &[String]) -> Option<LocatedFields>;

    /// Whether this layout structurally matches the body lines.
    fn matches(&self, lines: &[String]) -> bool {
        self.locate(lines).is_some()
    }
}

/// The closed set of known layouts, in priority order.
pub fn default_templates() -> Vec<Box<dyn TemplateMatcher>> {
    vec![Box::new(SummaryBlockTemplate), Box::new(InlineLabelTemplate)]
}

/// The order-summary layout: every label sits on its own line and the value
/// follows on the next line.
///
/// ```text
/// Restaurant
/// Tasty Bites
/// Order placed at:
/// Friday, March 1, 2024 7:30 PM
/// Order delivered at:
/// Friday, March 1, 2024 8:05 PM
/// Order Total:
/// ₹450.00
/// Discount Applied
/// ₹50.00
/// ```
pub struct SummaryBlockTemplate;

impl SummaryBlockTemplate {
    const RESTAURANT: &'static str = "Restaurant";
    const ORDER_TOTAL: &'static str = "Order Total:";
    const PLACED_AT: &'static str = "Order placed at:";
    const DELIVERED_AT: &'static str = "Order delivered at:";
    const DISCOUNT: &'static str = "Discount Applied";
    const HEADINGS: [&'static str; 2] = ["Order", "Your Order Summary:"];

    fn value_after(lines: &[String], label: &str) -> Option<String> {
        let pos = lines.iter().position(|l| l == label)?;
        Some(lines.get(pos + 1).cloned().unwrap_or_default())
    }

    fn restaurant_after(lines: &[String]) -> Option<String> {
        let pos = lines.iter().position(|l| l == Self::RESTAURANT)?;
        let name = lines[pos + 1..]
            .iter()
            .find(|l| !Self::HEADINGS.contains(&l.as_str()))
            .filter(|l| !Self::is_label(l))
            .cloned()
            .unwrap_or_default();
        Some(name)
    }

    fn discount(lines: &[String]) -> Option<String> {
        let pos = lines.iter().position(|l| l.contains(Self::DISCOUNT))?;
        if CURRENCY_AMOUNT.is_match(&lines[pos]) {
            return Some(lines[pos].clone());
        }
        // "No Discount Applied" directly followed by the next label
        lines
            .get(pos + 1)
            .filter(|next| !Self::is_label(next) && next.as_str() != Self::RESTAURANT)
            .cloned()
    }

    fn is_label(line: &str) -> bool {
        [Self::ORDER_TOTAL, Self::PLACED_AT, Self::DELIVERED_AT].contains(&line)
    }
}

impl TemplateMatcher for SummaryBlockTemplate {
    fn name(&self) -> &'static str {
        "summary-block"
    }

    fn locate(&self, lines: &[String]) -> Option<LocatedFields> {
        let restaurant_name = Self::restaurant_after(lines)?;
        let amount = Self::value_after(lines, Self::ORDER_TOTAL)?;
        let order_time = Self::value_after(lines, Self::PLACED_AT);
        let delivery_time = Self::value_after(lines, Self::DELIVERED_AT);

        if order_time.is_none() && delivery_time.is_none() {
            return None;
        }

        Some(LocatedFields {
            restaurant_name,
            amount,
            discount: Self::discount(lines),
            order_time,
            delivery_time,
        })
    }
}

/// The single-line layout: `Label: value` pairs.
///
/// ```text
/// Restaurant: Tasty Bites
/// Order Amount: ₹450.00
/// Discount: ₹50.00
/// Ordered at: 2024-03-01 19:30
/// Delivered at: 2024-03-01 20:05
/// ```
pub struct InlineLabelTemplate;

impl InlineLabelTemplate {
    fn labeled(lines: &[String], pattern: &Regex) -> Option<String> {
        lines
            .iter()
            .find_map(|l| pattern.captures(l).map(|caps| caps[1].to_string()))
    }

    fn timestamp(lines: &[String], pattern: &Regex) -> Option<String> {
        Self::labeled(lines, pattern).filter(|v| !v.trim().is_empty())
    }
}

impl TemplateMatcher for InlineLabelTemplate {
    fn name(&self) -> &'static str {
        "inline-label"
    }

    fn locate(&self, lines: &[String]) -> Option<LocatedFields> {
        let restaurant_name = Self::labeled(lines, &INLINE_RESTAURANT)?;
        let amount = Self::labeled(lines, &INLINE_AMOUNT)?;
        let order_time = Self::timestamp(lines, &INLINE_ORDERED_AT);
        let delivery_time = Self::timestamp(lines, &INLINE_DELIVERED_AT);

        if order_time.is_none() && delivery_time.is_none() {
            return None;
        }

        Some(LocatedFields {
            restaurant_name,
            amount,
            discount: Self::labeled(lines, &INLINE_DISCOUNT),
            order_time,
            delivery_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        crate::text::body_lines(text)
    }

    #[test]
    fn test_summary_block_locate() {
        let body = "Your Order Summary:\nRestaurant\nOrder\nTasty Bites\nOrder placed at:\nFriday, March 1, 2024 7:30 PM\nOrder delivered at:\nFriday, March 1, 2024 8:05 PM\nOrder Total:\n₹450.00\nDiscount Applied\n₹50.00";
        let located = SummaryBlockTemplate.locate(&lines(body)).unwrap();
        assert_eq!(
            located,
            LocatedFields {
                restaurant_name: "Tasty Bites".to_string(),
                amount: "₹450.00".to_string(),
                discount: Some("₹50.00".to_string()),
                order_time: Some("Friday, March 1, 2024 7:30 PM".to_string()),
                delivery_time: Some("Friday, March 1, 2024 8:05 PM".to_string()),
            }
        );
    }

    #[test]
    fn test_summary_block_inline_discount() {
        let body = "Restaurant\nTasty Bites\nOrder placed at:\nMarch 1, 2024 7:30 PM\nOrder Total:\n₹450.00\nDiscount Applied ₹25.00";
        let located = SummaryBlockTemplate.locate(&lines(body)).unwrap();
        assert_eq!(located.discount.as_deref(), Some("Discount Applied ₹25.00"));
        assert_eq!(located.delivery_time, None);
    }

    #[test]
    fn test_summary_block_no_discount_before_label() {
        let body = "Restaurant\nTasty Bites\nOrder placed at:\nMarch 1, 2024 7:30 PM\nNo Discount Applied\nOrder Total:\n₹450.00";
        let located = SummaryBlockTemplate.locate(&lines(body)).unwrap();
        assert_eq!(located.discount, None);
        assert_eq!(located.amount, "₹450.00");
    }

    #[test]
    fn test_summary_block_name_missing() {
        let body = "Restaurant\nOrder Total:\n₹450.00\nOrder placed at:\nMarch 1, 2024 7:30 PM";
        let located = SummaryBlockTemplate.locate(&lines(body)).unwrap();
        assert_eq!(located.restaurant_name, "");
    }

    #[test]
    fn test_summary_block_requires_timestamp_marker() {
        let body = "Restaurant\nTasty Bites\nOrder Total:\n₹450.00";
        assert!(!SummaryBlockTemplate.matches(&lines(body)));
    }

    #[test]
    fn test_inline_locate() {
        let body = "Restaurant: Tasty Bites\nOrder Amount: ₹450.00\nOrdered at: 2024-03-01 19:30";
        let located = InlineLabelTemplate.locate(&lines(body)).unwrap();
        assert_eq!(located.restaurant_name.trim(), "Tasty Bites");
        assert_eq!(located.amount.trim(), "₹450.00");
        assert_eq!(located.discount, None);
        assert_eq!(located.order_time.as_deref().map(str::trim), Some("2024-03-01 19:30"));
    }

    #[test]
    fn test_inline_requires_markers() {
        let promo = "Craving biryani? Get 50% off on orders above ₹199!\nOrder now: swiggy.in";
        assert!(!InlineLabelTemplate.matches(&lines(promo)));
        assert!(!SummaryBlockTemplate.matches(&lines(promo)));
    }

    #[test]
    fn test_priority_order() {
        let names: Vec<&str> = default_templates().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["summary-block", "inline-label"]);
    }
}
