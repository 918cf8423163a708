//! Adapter for the common SEFAZ NFC-e consultation layout.

use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::document::{CanonicalDocument, CanonicalItem, Provenance};
use crate::rules::first_positive_token;
use crate::rules::parse_br_amount;
use crate::rules::patterns::{QUANTITY_LABEL, UNIT_LABEL, UNIT_PRICE_LABEL};

use super::fields::{
    access_key_or_synthesized, computed_total, emission_date, header_seller, heading_seller,
    is_false_positive, labeled_total, UNKNOWN_SELLER,
};
use super::page::{
    element_text, text_fragments, Page, CELL, HEADER_CELL, ITEM_NAME, ITEM_QUANTITY, ITEM_TOTAL,
    ITEM_UNIT, ITEM_UNIT_PRICE, RESULT_TABLE, ROW, TABLE,
};
use super::{DEFAULT_UNIT, Result};

/// Row id prefix of items in the `tabResult` table.
const ITEM_ROW_PREFIX: &str = "Item + ";

/// Words that never start a product name inside an item cell.
const CELL_NOISE: [&str; 6] = ["código", "qtde", "un:", "vl. unit", "r$", "valor"];

/// Minimum character count of a name recovered from cell fragments.
const MIN_NAME_CHARS: usize = 4;

pub(super) fn parse(page: &Page, config: &ExtractionConfig) -> Result<CanonicalDocument> {
    let seller_name = header_seller(page)
        .or_else(|| heading_seller(page))
        .unwrap_or_else(|| UNKNOWN_SELLER.to_string());
    let access_key = access_key_or_synthesized(page, Provenance::Scraped.synthetic_key_prefix());
    let emission_date = emission_date(page);
    let total_amount = labeled_total(page)
        .or_else(|| first_positive_token(&page.text(" ")))
        .unwrap_or(Decimal::ZERO);

    let mut items = result_table_items(page, &config.false_positive_names);
    if items.is_empty() {
        items = fallback_table_items(page, &config.false_positive_names);
    }
    if items.is_empty() {
        return Err(ExtractionError::NoItems);
    }

    debug!("Generic adapter found {} items for {}", items.len(), seller_name);

    Ok(CanonicalDocument {
        emission_date,
        seller_name,
        total_amount,
        access_key,
        items,
        provenance: Provenance::Scraped,
    })
}

/// Items from rows `Item + N` of `table#tabResult`.
fn result_table_items(page: &Page, false_positives: &[String]) -> Vec<CanonicalItem> {
    let Some(table) = page.select_first(&RESULT_TABLE) else {
        return Vec::new();
    };

    table
        .select(&ROW)
        .filter(|row| {
            row.value()
                .attr("id")
                .is_some_and(|id| id.starts_with(ITEM_ROW_PREFIX))
        })
        .filter_map(|row| result_row_item(row, false_positives))
        .collect()
}

fn result_row_item(row: ElementRef<'_>, false_positives: &[String]) -> Option<CanonicalItem> {
    let cells: Vec<_> = row.select(&CELL).collect();
    let first = *cells.first()?;

    let name = cell_item_name(first, false_positives)?;

    let labeled = |selector: &Selector, pattern: &Regex| {
        first
            .select(selector)
            .next()
            .map(element_text)
            .and_then(|text| pattern.captures(&text).map(|caps| caps[1].to_string()))
    };
    let quantity = labeled(&*ITEM_QUANTITY, &*QUANTITY_LABEL)
        .and_then(|raw| parse_br_amount(&raw))
        .unwrap_or(Decimal::ZERO);
    let unit = labeled(&*ITEM_UNIT, &*UNIT_LABEL).unwrap_or_else(|| DEFAULT_UNIT.to_string());
    let unit_price_text = labeled(&*ITEM_UNIT_PRICE, &*UNIT_PRICE_LABEL);
    let unit_price = unit_price_text
        .as_deref()
        .and_then(parse_br_amount)
        .unwrap_or(Decimal::ZERO);
    let total_price = cells
        .get(1)
        .and_then(|cell| cell.select(&ITEM_TOTAL).next())
        .map(element_text)
        .or(unit_price_text)
        .and_then(|raw| parse_br_amount(&raw))
        .unwrap_or_else(|| computed_total(unit_price, quantity));

    Some(CanonicalItem {
        name,
        quantity,
        unit,
        unit_price,
        total_price,
        product_code: None,
    })
}

/// Item name from `span.txtTit`, then from the first meaningful text
/// fragment of the cell, then from the cell's own text nodes.
fn cell_item_name(cell: ElementRef<'_>, false_positives: &[String]) -> Option<String> {
    let usable = |name: &str| !name.is_empty() && !is_false_positive(name, false_positives);

    if let Some(name) = cell.select(&ITEM_NAME).next().map(element_text) {
        if usable(&name) {
            return Some(name);
        }
    }

    let from_fragments = text_fragments(cell).find(|fragment| {
        let lowered = fragment.to_lowercase();
        fragment.chars().count() >= MIN_NAME_CHARS
            && !CELL_NOISE.iter().any(|noise| lowered.contains(noise))
            && usable(fragment)
    });
    if let Some(name) = from_fragments {
        return Some(name.to_string());
    }

    cell.children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| usable(text))
        .map(str::to_string)
}

/// Items from the first table shaped like a product listing: a header row
/// with at least three cells and body rows of name, quantity, unit and
/// optionally unit price and line total.
fn fallback_table_items(page: &Page, false_positives: &[String]) -> Vec<CanonicalItem> {
    for table in page.document().select(&TABLE) {
        let rows: Vec<_> = table.select(&ROW).collect();
        if rows.len() < 2 || rows[0].select(&HEADER_CELL).count() < 3 {
            continue;
        }

        let items: Vec<_> = rows[1..]
            .iter()
            .filter_map(|row| fallback_row_item(*row, false_positives))
            .collect();
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

fn fallback_row_item(row: ElementRef<'_>, false_positives: &[String]) -> Option<CanonicalItem> {
    let cols: Vec<String> = row.select(&CELL).map(element_text).collect();
    if cols.len() < 3 {
        return None;
    }

    let name = cols[0].clone();
    if name.is_empty() || is_false_positive(&name, false_positives) {
        return None;
    }

    let quantity = parse_br_amount(&cols[1]).unwrap_or(Decimal::ZERO);
    let unit = match cols[2].as_str() {
        "" => DEFAULT_UNIT.to_string(),
        unit => unit.to_string(),
    };
    let unit_price_text = cols.get(3).map(String::as_str).unwrap_or("0");
    let unit_price = parse_br_amount(unit_price_text).unwrap_or(Decimal::ZERO);
    let total_price = cols
        .get(4)
        .and_then(|raw| parse_br_amount(raw))
        .unwrap_or(unit_price);

    Some(CanonicalItem {
        name,
        quantity,
        unit,
        unit_price,
        total_price,
        product_code: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn run(html: &str) -> Result<CanonicalDocument> {
        parse(&Page::parse(html), &ExtractionConfig::default())
    }

    const ITEMS_TABLE: &str = r#"
        <table>
            <tr><th>Produto</th><th>Qtd</th><th>Un</th></tr>
            <tr><td>Item Teste</td><td>1</td><td>UN</td></tr>
        </table>"#;

    const RESULT_PAGE: &str = r#"
        <html><body>
        <div class="txtTopo" id="u20">SUPERMERCADO TESTE</div>
        <div class="text">CNPJ: 12.345.678/0001-90</div>
        <table id="tabResult">
          <tr id="Item + 1">
            <td>
              <span class="txtTit">ARROZ TIPO 1 KG</span>
              <span class="RCod">(Código: 123 )</span>
              <span class="Rqtd"><strong>Qtde.:</strong>2</span>
              <span class="RUN"><strong>UN: </strong>KG</span>
              <span class="RvlUnit"><strong>Vl. Unit.:</strong>&nbsp;15,00</span>
            </td>
            <td class="txtTit noWrap">Vl. Total<br><span class="valor">30,00</span></td>
          </tr>
          <tr id="Item + 2">
            <td>
              <span class="txtTit">FEIJAO PRETO 1KG</span>
              <span class="Rqtd"><strong>Qtde.:</strong>1</span>
              <span class="RvlUnit"><strong>Vl. Unit.:</strong>&nbsp;8,50</span>
            </td>
            <td><span class="valor">8,50</span></td>
          </tr>
          <tr id="Resumo"><td>Qtd. total de itens: 2</td></tr>
        </table>
        <div id="totalNota">Valor a pagar R$: 38,50</div>
        <div>Emissão: 14/02/2026 10:11:12-03:00</div>
        <span class="chave">3326 0210 6976 9700 0660 6510 7000 3680 6612 6649 4182</span>
        </body></html>"#;

    #[test]
    fn test_result_table_page() {
        let doc = run(RESULT_PAGE).unwrap();

        assert_eq!(doc.seller_name, "SUPERMERCADO TESTE; CNPJ: 12.345.678/0001-90");
        assert_eq!(doc.total_amount, dec("38.50"));
        assert_eq!(doc.emission_date, NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
        assert_eq!(doc.access_key, "3326 0210 6976 9700 0660 6510 7000 3680 6612 6649 4182");
        assert_eq!(doc.provenance, Provenance::Scraped);

        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[0].name, "ARROZ TIPO 1 KG");
        assert_eq!(doc.items[0].quantity, dec("2"));
        assert_eq!(doc.items[0].unit, "KG");
        assert_eq!(doc.items[0].unit_price, dec("15.00"));
        assert_eq!(doc.items[0].total_price, dec("30.00"));
        assert_eq!(doc.items[1].unit, "UN");
        assert_eq!(doc.items[1].total_price, dec("8.50"));
    }

    #[test]
    fn test_fallback_table_and_unknown_seller() {
        let doc = run(&format!("<html>{}</html>", ITEMS_TABLE)).unwrap();

        assert_eq!(doc.seller_name, UNKNOWN_SELLER);
        assert!(doc.access_key.starts_with("SCRAPING-"));
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].name, "Item Teste");
        assert_eq!(doc.items[0].quantity, dec("1"));
        assert_eq!(doc.items[0].unit_price, Decimal::ZERO);
    }

    #[test]
    fn test_heading_seller() {
        let doc = run(&format!("<html><h2>Mercado Exemplo</h2>{}</html>", ITEMS_TABLE)).unwrap();
        assert_eq!(doc.seller_name, "Mercado Exemplo");
    }

    #[test]
    fn test_total_falls_back_to_first_positive_token() {
        let doc = run(&format!("<html><p>Total 12,34</p>{}</html>", ITEMS_TABLE)).unwrap();
        assert_eq!(doc.total_amount, dec("12.34"));
    }

    #[test]
    fn test_niteroi_rows_are_skipped() {
        let html = r#"<table>
            <tr><th>Produto</th><th>Qtd</th><th>Un</th></tr>
            <tr><td> NITEROI </td><td>1</td><td>UN</td></tr>
            <tr><td>Cafe</td><td>2</td><td>UN</td><td>10,00</td><td>20,00</td></tr>
        </table>"#;
        let doc = run(html).unwrap();

        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].name, "Cafe");
        assert_eq!(doc.items[0].total_price, dec("20.00"));
    }

    #[test]
    fn test_product_named_after_city_is_kept() {
        let html = r#"<table>
            <tr><th>Produto</th><th>Qtd</th><th>Un</th></tr>
            <tr><td>AGUA MINERAL NITEROI 500ML</td><td>1</td><td>UN</td></tr>
            <tr><td>CAFE</td><td>2</td><td>UN</td></tr>
        </table>"#;
        let doc = run(html).unwrap();

        let names: Vec<_> = doc.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["AGUA MINERAL NITEROI 500ML", "CAFE"]);
    }

    #[test]
    fn test_huge_result_row_numbers_do_not_overflow() {
        let html = r#"<table id="tabResult">
          <tr id="Item + 1">
            <td><span class="txtTit">BRINDE</span>
              <span class="Rqtd">Qtde.: 7891234567890123</span>
              <span class="RvlUnit">Vl. Unit.: 7891234567890123</span></td>
            <td><span class="valor">1,00</span></td>
          </tr>
        </table>"#;
        let doc = run(html).unwrap();

        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].quantity, dec("7891234567890123"));
        assert_eq!(doc.items[0].total_price, dec("1.00"));
    }

    #[test]
    fn test_no_items() {
        assert_eq!(run("<html><h1>Loja</h1></html>").unwrap_err(), ExtractionError::NoItems);
    }
}
