//! Rule-based field extractors for Brazilian fiscal receipts.

pub mod access_key;
pub mod amounts;
pub mod dates;
pub mod patterns;

pub use access_key::{
    access_key_from_digits, format_access_key, normalize_access_key, synthesize_access_key,
    AccessKeyExtractor, ACCESS_KEY_DIGITS,
};
pub use amounts::{first_positive_token, parse_br_amount, parse_xml_amount, AmountExtractor};
pub use dates::{parse_dmy, DateExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value found in text, with the text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    pub value: T,
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            source: source.into(),
        }
    }
}
