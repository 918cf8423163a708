//! Header fields shared by every page layout.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::ElementRef;
use tracing::{debug, warn};

use crate::rules::{
    access_key_from_digits, normalize_access_key, synthesize_access_key, AccessKeyExtractor,
    AmountExtractor, DateExtractor, FieldExtractor, ACCESS_KEY_DIGITS,
};

use super::page::{element_text, has_class, Page, HEADINGS, KEY_SPAN, SELLER_TOP, STRONG};

/// Seller name used when a page names no establishment.
pub const UNKNOWN_SELLER: &str = "Estabelecimento Desconhecido";

const KEY_LABEL: &str = "chave de acesso";

/// Seller from the `txtTopo` header block, with the CNPJ line appended when
/// the following `text` block carries one.
pub fn header_seller(page: &Page) -> Option<String> {
    let header = page.select_first(&SELLER_TOP)?;
    let name = element_text(header);

    let cnpj = header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "div" && has_class(*sibling, "text"))
        .map(element_text)
        .filter(|text| text.to_uppercase().contains("CNPJ:"));

    Some(match cnpj {
        Some(cnpj) => format!("{}; {}", name, cnpj),
        None => name,
    })
}

/// First non-empty `h1` or `h2`.
pub fn heading_seller(page: &Page) -> Option<String> {
    page.document()
        .select(&HEADINGS)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Access key located in the page, formatted in groups of four.
pub fn find_access_key(page: &Page) -> Option<String> {
    if let Some(key) = page
        .select_first(&KEY_SPAN)
        .and_then(|span| normalize_access_key(&element_text(span)))
    {
        return Some(key);
    }

    for strong in page.document().select(&STRONG) {
        if !element_text(strong).to_lowercase().contains(KEY_LABEL) {
            continue;
        }
        if let Some(key) = key_after_label(strong) {
            return Some(key);
        }
    }

    AccessKeyExtractor::new()
        .extract(&page.text(" "))
        .map(|found| found.value)
}

/// Key in the text node right after a "Chave de acesso" label, or in a
/// sibling element of the label.
fn key_after_label(label: ElementRef<'_>) -> Option<String> {
    let next = label.next_siblings().find(|node| {
        node.value()
            .as_text()
            .is_none_or(|text| !text.trim().is_empty())
    });
    if let Some(key) = next
        .and_then(|node| node.value().as_text())
        .and_then(|text| access_key_from_digits(text))
    {
        return Some(key);
    }

    let parent = label.parent().and_then(ElementRef::wrap)?;
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| sibling.id() != label.id())
        .map(element_text)
        .filter(|text| text.chars().count() >= ACCESS_KEY_DIGITS)
        .find_map(|text| normalize_access_key(&text))
}

/// Access key from the page, or a synthesized placeholder with `prefix`.
pub fn access_key_or_synthesized(page: &Page, prefix: &str) -> String {
    match find_access_key(page) {
        Some(key) => key,
        None => {
            let key = synthesize_access_key(prefix);
            warn!("No access key found on page, synthesized {}", key);
            key
        }
    }
}

/// Emission date from the page text; today's date when nothing matches.
pub fn emission_date(page: &Page) -> NaiveDate {
    match DateExtractor::new().extract(&page.text(" ")) {
        Some(found) => found.value,
        None => {
            let today = chrono::Local::now().date_naive();
            warn!("No emission date found on page, using {}", today);
            today
        }
    }
}

/// Amount labelled "Valor a pagar R$".
pub fn labeled_total(page: &Page) -> Option<Decimal> {
    let found = AmountExtractor::new().extract(&page.text(" "))?;
    debug!("Total {} from '{}'", found.value, found.source);
    Some(found.value)
}

/// Line total as `unit_price * quantity`, or the unit price when the
/// product does not fit in a `Decimal`.
pub fn computed_total(unit_price: Decimal, quantity: Decimal) -> Decimal {
    unit_price.checked_mul(quantity).unwrap_or(unit_price)
}

/// Whether `name` is exactly one of the configured false-positive names,
/// ignoring case and surrounding whitespace.
pub fn is_false_positive(name: &str, false_positives: &[String]) -> bool {
    let lowered = name.trim().to_lowercase();
    false_positives
        .iter()
        .any(|token| token.trim().to_lowercase() == lowered)
}
