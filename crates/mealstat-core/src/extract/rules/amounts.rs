//! Currency amount extraction.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{CURRENCY_AMOUNT, PLAIN_AMOUNT};
use super::{ExtractionMatch, FieldExtractor, FieldResult};
use crate::error::FailureReason;

/// Extracts currency-prefixed amounts (`₹`, `Rs.`, `INR`).
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = Decimal;

    fn extract(&self, text: &str) -> Option<FieldResult<Decimal>> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<FieldResult<Decimal>> {
        CURRENCY_AMOUNT
            .captures_iter(text)
            .filter_map(|caps| {
                let full_match = caps.get(0)?;
                let figure = caps.get(1)?;
                Some(parse_amount(figure.as_str()).map(|amount| {
                    ExtractionMatch::new(amount, full_match.as_str())
                        .with_position(full_match.start(), full_match.end())
                }))
            })
            .collect()
    }
}

/// Parse a currency figure into a two-place decimal.
///
/// Thousands separators are removed first (both `1,250.00` and the Indian
/// `1,00,000.00` grouping). Negative values and values with more than two
/// fractional digits are rejected.
pub fn parse_amount(s: &str) -> Result<Decimal, FailureReason> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();

    if !PLAIN_AMOUNT.is_match(&cleaned) {
        return Err(FailureReason::UnparsableAmount);
    }

    let mut amount = Decimal::from_str(&cleaned).map_err(|_| FailureReason::UnparsableAmount)?;
    amount.rescale(2);
    Ok(amount)
}

/// Format an amount with rupee sign and Indian digit grouping (₹1,23,456.00).
pub fn format_inr(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::new();
    let head_len = digits.len().saturating_sub(3);

    for (i, c) in digits[..head_len].iter().enumerate() {
        if i > 0 && (head_len - i) % 2 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    if head_len > 0 {
        grouped.push(',');
    }
    grouped.extend(&digits[head_len..]);

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("450.00"), Ok(dec("450.00")));
        assert_eq!(parse_amount("1,250.50"), Ok(dec("1250.50")));
        assert_eq!(parse_amount("1,00,000"), Ok(dec("100000")));
        assert_eq!(parse_amount("99.5"), Ok(dec("99.50")));
        assert_eq!(parse_amount("99.5").unwrap().scale(), 2);
    }

    #[test]
    fn test_parse_amount_rejects() {
        assert_eq!(parse_amount("-10.00"), Err(FailureReason::UnparsableAmount));
        assert_eq!(parse_amount("12.345"), Err(FailureReason::UnparsableAmount));
        assert_eq!(parse_amount("free"), Err(FailureReason::UnparsableAmount));
        assert_eq!(parse_amount(""), Err(FailureReason::UnparsableAmount));
    }

    #[test]
    fn test_extract_all_amounts() {
        let extractor = AmountExtractor::new();
        let text = "Item total ₹400.00, taxes Rs. 50, paid INR 1,450.00";

        let results: Vec<Decimal> = extractor
            .extract_all(text)
            .into_iter()
            .map(|r| r.unwrap().value)
            .collect();
        assert_eq!(results, vec![dec("400.00"), dec("50.00"), dec("1450.00")]);
    }

    #[test]
    fn test_extract_negative_is_unparsable() {
        let extractor = AmountExtractor::new();
        let result = extractor.extract("Order Amount: ₹-10.00").unwrap();
        assert_eq!(result.unwrap_err(), FailureReason::UnparsableAmount);
    }

    #[test]
    fn test_no_currency_no_match() {
        let extractor = AmountExtractor::new();
        assert!(extractor.extract("Order Amount: 450").is_none());
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(dec("450")), "₹450.00");
        assert_eq!(format_inr(dec("1250.5")), "₹1,250.50");
        assert_eq!(format_inr(dec("123456.78")), "₹1,23,456.78");
        assert_eq!(format_inr(dec("12345678")), "₹1,23,45,678.00");
    }
}
