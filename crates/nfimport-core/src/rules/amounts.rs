//! Amount parsing for Brazilian receipts.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::TOTAL_TO_PAY;
use super::{ExtractionMatch, FieldExtractor};

/// Extractor for the labelled "Valor a pagar" total.
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
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TOTAL_TO_PAY
            .captures_iter(text)
            .filter_map(|caps| {
                let amount = parse_br_amount(&caps[1])?;
                let full_match = caps.get(0)?;
                Some(ExtractionMatch::new(amount, full_match.as_str()))
            })
            .collect()
    }
}

/// Parse a page-formatted amount ("1.234,56" or "7,99").
///
/// Dots are thousands separators and the comma is the decimal mark.
pub fn parse_br_amount(s: &str) -> Option<Decimal> {
    let normalized = s.trim().replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

/// Parse an XML amount. The dot is already the decimal mark; a stray comma
/// is treated as one too.
pub fn parse_xml_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(&s.trim().replace(',', ".")).ok()
}

/// Last-resort total: the first whitespace-delimited token of the page text
/// that parses as a positive amount. Frequently picks an unrelated number.
pub fn first_positive_token(text: &str) -> Option<Decimal> {
    text.split_whitespace()
        .filter_map(parse_br_amount)
        .find(|value| *value > Decimal::ZERO)
}
