//! Adapter for the Rio de Janeiro NFC-e consultation layout.
//!
//! The RJ page carries no item table. Items are recovered by scanning the
//! flattened page text line by line: every `Qtde.:` marker anchors one item,
//! the product name is searched in a window of lines before the marker and
//! unit, unit price and line total in a window after it.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::document::{CanonicalDocument, CanonicalItem, Provenance};
use crate::rules::parse_br_amount;
use crate::rules::patterns::{
    LINE_TOTAL_LABEL, LINE_TOTAL_MARKER, QUANTITY_MARKER, UNIT_LABEL, UNIT_MARKER,
    UNIT_PRICE_LABEL, UNIT_PRICE_MARKER,
};

use super::fields::{
    access_key_or_synthesized, computed_total, emission_date, header_seller, is_false_positive,
    labeled_total, UNKNOWN_SELLER,
};
use super::page::{element_text, Page, SELLER_BLOCKS};
use super::{DEFAULT_UNIT, Result};

/// Synthesized access key prefix for RJ pages.
pub const KEY_PREFIX: &str = "SCRAPING-RJ-";

/// Case-sensitive markers of lines that are never a product name.
const NAME_REJECT: [&str; 3] = ["Código", "Clear text", "(Código"];

/// Lowercase markers of lines that are never a product name.
const NAME_REJECT_LOWER: [&str; 6] = ["qtde", "vl.", "un:", "cnpj", "documento auxiliar", ")"];

/// A product name must be longer than this many characters.
const NAME_MIN_CHARS: usize = 3;

/// A quantity marker line longer than this carries its value inline.
const INLINE_QUANTITY_MIN_CHARS: usize = 6;

pub(super) fn parse(page: &Page, config: &ExtractionConfig) -> Result<CanonicalDocument> {
    let seller_name = header_seller(page)
        .or_else(|| cnpj_block_seller(page))
        .unwrap_or_else(|| UNKNOWN_SELLER.to_string());
    let access_key = access_key_or_synthesized(page, KEY_PREFIX);
    let emission_date = emission_date(page);
    let total_amount = labeled_total(page).unwrap_or(Decimal::ZERO);

    let lines = page.lines();
    let scanner = LineScanner {
        lines: &lines,
        window: ScanWindow {
            lookback: config.regional_lookback,
            lookahead: config.regional_lookahead,
        },
        false_positives: &config.false_positive_names,
    };
    let items = scanner.scan();
    if items.is_empty() {
        return Err(ExtractionError::NoItems);
    }

    debug!("Regional adapter found {} items for {}", items.len(), seller_name);

    Ok(CanonicalDocument {
        emission_date,
        seller_name,
        total_amount,
        access_key,
        items,
        provenance: Provenance::Scraped,
    })
}

/// First element whose text contains "CNPJ:", trimmed to what precedes "CNPJ".
fn cnpj_block_seller(page: &Page) -> Option<String> {
    SELLER_BLOCKS.iter().find_map(|selector| {
        page.document()
            .select(selector)
            .map(element_text)
            .find(|text| text.to_lowercase().contains("cnpj:"))
            .map(|text| {
                let head = text.split("CNPJ").next().unwrap_or_default();
                head.trim_matches(|c: char| matches!(c, ' ' | ':' | '-')).to_string()
            })
    })
}

/// Number of lines searched before and after a quantity marker.
#[derive(Debug, Clone, Copy)]
pub struct ScanWindow {
    pub lookback: usize,
    pub lookahead: usize,
}

/// Field whose value is expected on the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Nothing,
    Unit,
    UnitPrice,
    LineTotal,
}

/// Item fields gathered after a quantity marker.
#[derive(Debug, Default)]
struct Details {
    unit: Option<String>,
    unit_price: Option<Decimal>,
    total_price: Option<Decimal>,
}

struct LineScanner<'a> {
    lines: &'a [&'a str],
    window: ScanWindow,
    false_positives: &'a [String],
}

impl LineScanner<'_> {
    fn scan(&self) -> Vec<CanonicalItem> {
        let mut items = Vec::new();

        for (index, line) in self.lines.iter().enumerate() {
            if !QUANTITY_MARKER.is_match(line) {
                continue;
            }

            let (quantity, details_from) = self.quantity_at(index);
            let Some(name) = self.name_before(index) else {
                continue;
            };
            if quantity <= Decimal::ZERO {
                continue;
            }

            let details = self.details_after(index, details_from);
            let unit_price = details.unit_price.unwrap_or(Decimal::ZERO);
            items.push(CanonicalItem {
                name,
                quantity,
                unit: details.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
                unit_price,
                total_price: details
                    .total_price
                    .unwrap_or_else(|| computed_total(unit_price, quantity)),
                product_code: None,
            });
        }

        items
    }

    /// Quantity of the marker at `index` and the offset where details start.
    ///
    /// Values are written either inline (`Qtde.: 2`) or on the next line.
    fn quantity_at(&self, index: usize) -> (Decimal, usize) {
        let line = self.lines[index];
        let (raw, offset) = match line.split_once(':') {
            Some((_, value)) if line.chars().count() > INLINE_QUANTITY_MIN_CHARS => (Some(value), 1),
            _ => (self.lines.get(index + 1).copied(), 2),
        };
        let quantity = raw.and_then(parse_br_amount).unwrap_or(Decimal::ZERO);
        (quantity, offset)
    }

    /// Most recent plausible product name in the lookback window.
    fn name_before(&self, index: usize) -> Option<String> {
        let start = index.saturating_sub(self.window.lookback);
        self.lines[start..index]
            .iter()
            .rev()
            .find(|line| self.looks_like_name(line))
            .map(|line| line.to_string())
    }

    fn looks_like_name(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        line.chars().count() > NAME_MIN_CHARS
            && !line.chars().all(|c| c.is_ascii_digit())
            && line.chars().any(char::is_alphabetic)
            && !NAME_REJECT.iter().any(|marker| line.contains(marker))
            && !NAME_REJECT_LOWER.iter().any(|marker| lowered.contains(marker))
            && !is_false_positive(line, self.false_positives)
    }

    /// Walk the lookahead window collecting unit, unit price and line total.
    /// A label line either carries its value or arms the next line to hold it.
    /// The item ends once its line total is read or the next item starts.
    fn details_after(&self, index: usize, offset: usize) -> Details {
        let mut details = Details::default();
        let mut pending = Pending::Nothing;
        let end = (index + self.window.lookahead).min(self.lines.len());

        for line in self.lines.iter().take(end).skip(index + offset) {
            if QUANTITY_MARKER.is_match(line) {
                break;
            }
            if let Some(label) = Self::label_of(line) {
                pending = match Self::inline_value(label, line) {
                    Some(value) => {
                        details.assign(label, value);
                        Pending::Nothing
                    }
                    None => label,
                };
            } else if pending != Pending::Nothing {
                details.assign(pending, line);
                pending = Pending::Nothing;
            }

            if details.total_price.is_some() {
                break;
            }
        }

        details
    }

    fn label_of(line: &str) -> Option<Pending> {
        if UNIT_MARKER.is_match(line) {
            Some(Pending::Unit)
        } else if UNIT_PRICE_MARKER.is_match(line) {
            Some(Pending::UnitPrice)
        } else if LINE_TOTAL_MARKER.is_match(line) {
            Some(Pending::LineTotal)
        } else {
            None
        }
    }

    fn inline_value(label: Pending, line: &str) -> Option<&str> {
        let pattern = match label {
            Pending::Unit => &*UNIT_LABEL,
            Pending::UnitPrice => &*UNIT_PRICE_LABEL,
            Pending::LineTotal => &*LINE_TOTAL_LABEL,
            Pending::Nothing => return None,
        };
        pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl Details {
    fn assign(&mut self, field: Pending, value: &str) {
        match field {
            Pending::Unit => self.unit = Some(value.trim().to_string()),
            Pending::UnitPrice => self.unit_price = parse_br_amount(value),
            Pending::LineTotal => self.total_price = parse_br_amount(value),
            Pending::Nothing => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn run(html: &str) -> Result<CanonicalDocument> {
        parse(&Page::parse(html), &ExtractionConfig::default())
    }

    const RJ_PAGE: &str = r#"
        <html><body>
        <div id="conteudo">
          <div><strong>SUPERMERCADOS MUNDIAL LTDA</strong> CNPJ: 33.381.286/0001-60</div>
          <div>DOCUMENTO AUXILIAR DA NOTA FISCAL DE CONSUMIDOR ELETRÔNICA</div>
          <div>
            <span>TAXA ENTREGA CAMBOIN</span>
            <span>(Código: 6378 )</span>
            <span>Qtde.:</span><span>1</span>
            <span>UN:</span><span>UN</span>
            <span>Vl. Unit.:</span><span>7,99</span>
            <span>Vl. Total</span><span>7,99</span>
          </div>
          <div>
            <span>LEITE INTEGRAL 1L</span>
            <span>(Código: 1200 )</span>
            <span>Qtde.: 3</span>
            <span>UN: CX</span>
            <span>Vl. Unit.: 4,50</span>
            <span>Vl. Total</span><span>13,50</span>
          </div>
          <div>Valor a pagar R$: 21,49</div>
          <div>Emissão: 11/02/2026 07:35:22-03:00</div>
        </div>
        </body></html>"#;

    #[test]
    fn test_line_scan_items() {
        let doc = run(RJ_PAGE).unwrap();

        assert_eq!(doc.seller_name, "SUPERMERCADOS MUNDIAL LTDA");
        assert_eq!(doc.total_amount, dec("21.49"));
        assert!(doc.access_key.starts_with(KEY_PREFIX));
        assert_eq!(doc.items.len(), 2);

        let delivery = &doc.items[0];
        assert_eq!(delivery.name, "TAXA ENTREGA CAMBOIN");
        assert_eq!(delivery.quantity, dec("1"));
        assert_eq!(delivery.unit, "UN");
        assert_eq!(delivery.unit_price, dec("7.99"));
        assert_eq!(delivery.total_price, dec("7.99"));

        let milk = &doc.items[1];
        assert_eq!(milk.name, "LEITE INTEGRAL 1L");
        assert_eq!(milk.quantity, dec("3"));
        assert_eq!(milk.unit, "CX");
        assert_eq!(milk.unit_price, dec("4.50"));
        assert_eq!(milk.total_price, dec("13.50"));
    }

    #[test]
    fn test_header_seller_preferred() {
        let html = RJ_PAGE.replace(
            r#"<div id="conteudo">"#,
            r#"<div id="conteudo"><div class="txtTopo" id="u20">MUNDIAL</div>"#,
        );
        assert_eq!(run(&html).unwrap().seller_name, "MUNDIAL");
    }

    #[test]
    fn test_zero_quantity_and_unnamed_items_are_dropped() {
        let lines = ["Qtde.:", "2", "TOTAL DA COMPRA", "Qtde.:", "0", "Vl. Total", "1,00"];
        let false_positives = vec!["niteroi".to_string()];
        let scanner = LineScanner {
            lines: &lines,
            window: ScanWindow { lookback: 8, lookahead: 15 },
            false_positives: &false_positives,
        };
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn test_missing_unit_defaults_and_total_computed() {
        let lines = ["QUEIJO MINAS", "Qtde.:", "2", "Vl. Unit.:", "10,00"];
        let scanner = LineScanner {
            lines: &lines,
            window: ScanWindow { lookback: 8, lookahead: 15 },
            false_positives: &[],
        };
        let items = scanner.scan();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit, "UN");
        assert_eq!(items[0].total_price, dec("20.00"));
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let lines = [
            "BRINDE",
            "Qtde.:",
            "7891234567890123",
            "Vl. Unit.:",
            "7891234567890123",
            "Vl. Total",
            "1,00",
            "CAIXA",
            "Qtde.:",
            "7891234567890123",
            "Vl. Unit.:",
            "7891234567890123",
        ];
        let scanner = LineScanner {
            lines: &lines,
            window: ScanWindow { lookback: 8, lookahead: 15 },
            false_positives: &[],
        };
        let items = scanner.scan();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].total_price, dec("1.00"));
        assert_eq!(items[1].total_price, dec("7891234567890123"));
    }

    #[test]
    fn test_name_outside_lookback_window_is_ignored() {
        let lines = ["PAO FRANCES", "1", "2", "Qtde.:", "1"];
        let scanner = LineScanner {
            lines: &lines,
            window: ScanWindow { lookback: 2, lookahead: 15 },
            false_positives: &[],
        };
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn test_no_items() {
        assert_eq!(
            run("<div>SUPERMERCADO CNPJ: 1</div>").unwrap_err(),
            ExtractionError::NoItems
        );
    }
}
