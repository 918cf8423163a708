//! Emission date extraction for receipt pages.

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{
    ANY_DATETIME, BARE_DATE, DATA_EMISSION_DATETIME, EMISSION_DATE, EMISSION_DATETIME,
};
use super::{ExtractionMatch, FieldExtractor};

/// Emission date extractor.
///
/// Patterns are tried from most to least specific; within a pattern the
/// first match holding a valid calendar date wins.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn labeled_patterns() -> [&'static Regex; 4] {
        [
            &*EMISSION_DATETIME,
            &*DATA_EMISSION_DATETIME,
            &*EMISSION_DATE,
            &*ANY_DATETIME,
        ]
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for pattern in Self::labeled_patterns() {
            for caps in pattern.captures_iter(text) {
                let Some(date) = parse_dmy(&caps[1]) else {
                    continue;
                };
                if results.iter().any(|r| r.value == date) {
                    continue;
                }
                if let Some(full_match) = caps.get(0) {
                    results.push(ExtractionMatch::new(date, full_match.as_str()));
                }
            }
        }

        for caps in BARE_DATE.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                if results.iter().any(|r| r.value == date) {
                    continue;
                }
                if let Some(full_match) = caps.get(0) {
                    results.push(ExtractionMatch::new(date, full_match.as_str()));
                }
            }
        }

        results
    }
}

/// Parse `DD/MM/YYYY`.
pub fn parse_dmy(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_emission_datetime_preferred() {
        let extractor = DateExtractor::new();
        let text = "Protocolo 01/01/2020 Número: 36 Série: 1 Emissão: 11/02/2026 07:35:22-03:00";

        let found = extractor.extract(text).unwrap();
        assert_eq!(found.value, ymd(2026, 2, 11));
    }

    #[test]
    fn test_emission_without_time() {
        let extractor = DateExtractor::new();
        let found = extractor.extract("Emissao: 05/03/2025 via consumidor").unwrap();
        assert_eq!(found.value, ymd(2025, 3, 5));
    }

    #[test]
    fn test_invalid_calendar_date_is_skipped() {
        let extractor = DateExtractor::new();
        let found = extractor.extract("Emissão: 31/02/2026 10:00:00 depois 14/02/2026").unwrap();
        assert_eq!(found.value, ymd(2026, 2, 14));
    }

    #[test]
    fn test_no_date() {
        assert!(DateExtractor::new().extract("sem data").is_none());
    }
}
