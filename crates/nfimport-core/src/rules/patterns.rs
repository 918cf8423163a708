//! Common regex patterns for Brazilian receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Access key (chave de acesso): 44 digits, often grouped by 4
    pub static ref ACCESS_KEY_LABELED: Regex = Regex::new(
        r"(?i)Chave\s*de\s*Acesso[^\d]*(\d(?:\s*\d){43})"
    ).unwrap();

    pub static ref ACCESS_KEY_BARE: Regex = Regex::new(
        r"(?:^|[^\d])(\d(?:\s*\d){43})(?:[^\d]|$)"
    ).unwrap();

    // Emission dates, most specific first
    pub static ref EMISSION_DATETIME: Regex = Regex::new(
        r"(?i)Emiss[aã]o\s*:\s*(\d{2}/\d{2}/\d{4})\s+\d{2}:\d{2}:\d{2}(?:[-+]\d{2}:?\d{2})?"
    ).unwrap();

    pub static ref DATA_EMISSION_DATETIME: Regex = Regex::new(
        r"(?i)Data\s+Emiss[aã]o\s*:\s*(\d{2}/\d{2}/\d{4})\s+\d{2}:\d{2}:\d{2}(?:[-+]\d{2}:?\d{2})?"
    ).unwrap();

    pub static ref EMISSION_DATE: Regex = Regex::new(
        r"(?i)Emiss[aã]o\s*:\s*(\d{2}/\d{2}/\d{4})"
    ).unwrap();

    pub static ref ANY_DATETIME: Regex = Regex::new(
        r"(\d{2}/\d{2}/\d{4})\s+\d{2}:\d{2}:\d{2}(?:[-+]\d{2}:?\d{2})?"
    ).unwrap();

    pub static ref BARE_DATE: Regex = Regex::new(
        r"\b(\d{2})/(\d{2})/(\d{4})\b"
    ).unwrap();

    // Total amount
    pub static ref TOTAL_TO_PAY: Regex = Regex::new(
        r"(?i)Valor\s+a\s+pagar\s*R\$[: ]\s*([\d.,]+)"
    ).unwrap();

    // Item sub-fields (tabResult layout and regional line scan)
    pub static ref QUANTITY_LABEL: Regex = Regex::new(
        r"(?i)Qtde\.?:?\s*(\d[\d,.]*)"
    ).unwrap();

    pub static ref QUANTITY_MARKER: Regex = Regex::new(
        r"(?i)^Qtde\.?:"
    ).unwrap();

    pub static ref UNIT_LABEL: Regex = Regex::new(
        r"(?i)UN:\s*(\w+)"
    ).unwrap();

    pub static ref UNIT_MARKER: Regex = Regex::new(
        r"(?i)^UN:"
    ).unwrap();

    pub static ref UNIT_PRICE_LABEL: Regex = Regex::new(
        r"(?i)Vl\.?\s*Unit\.?:?\s*(\d[\d,.]*)"
    ).unwrap();

    pub static ref UNIT_PRICE_MARKER: Regex = Regex::new(
        r"(?i)^Vl\.?\s*Unit\.?:"
    ).unwrap();

    pub static ref LINE_TOTAL_MARKER: Regex = Regex::new(
        r"(?i)^Vl\.?\s*Total"
    ).unwrap();

    pub static ref LINE_TOTAL_LABEL: Regex = Regex::new(
        r"(?i)Vl\.?\s*Total\s*:?\s*(\d[\d,.]*)"
    ).unwrap();
}
