//! Rendering of imported documents.

use nfimport_core::CanonicalDocument;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_document(document: &CanonicalDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(document)?),
        OutputFormat::Csv => format_csv(document),
        OutputFormat::Text => Ok(format_text(document)),
    }
}

fn format_csv(document: &CanonicalDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "access_key",
        "emission_date",
        "seller_name",
        "total_amount",
        "item_name",
        "quantity",
        "unit",
        "unit_price",
        "total_price",
        "product_code",
    ])?;

    let emission_date = document.emission_date.to_string();
    let total_amount = document.total_amount.to_string();

    for item in &document.items {
        wtr.write_record([
            &document.access_key,
            &emission_date,
            &document.seller_name,
            &total_amount,
            &item.name,
            &item.quantity.to_string(),
            &item.unit,
            &item.unit_price.to_string(),
            &item.total_price.to_string(),
            item.product_code.as_deref().unwrap_or(""),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(document: &CanonicalDocument) -> String {
    let mut output = String::new();

    output.push_str(&format!("Seller: {}\n", document.seller_name));
    output.push_str(&format!("Date: {}\n", document.emission_date));
    output.push_str(&format!("Access key: {}\n", document.access_key));
    output.push('\n');

    output.push_str("Items:\n");
    for item in &document.items {
        output.push_str(&format!(
            "  {} x {} {} @ {} = {}",
            item.name, item.quantity, item.unit, item.unit_price, item.total_price
        ));
        match &item.product_code {
            Some(code) => output.push_str(&format!(" [{}]\n", code)),
            None => output.push_str(" [no code]\n"),
        }
    }
    output.push('\n');

    output.push_str(&format!("Total: R$ {}\n", document.total_amount));
    if document.items_total() != document.total_amount {
        output.push_str(&format!("Items sum: R$ {}\n", document.items_total()));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nfimport_core::{CanonicalItem, Provenance};
    use rust_decimal::Decimal;

    fn document() -> CanonicalDocument {
        CanonicalDocument {
            emission_date: NaiveDate::from_ymd_opt(2026, 2, 11).unwrap(),
            seller_name: "LOJA, EXEMPLO".to_string(),
            total_amount: Decimal::new(3850, 2),
            access_key: "SCRAPING-1".to_string(),
            items: vec![
                CanonicalItem {
                    name: "ARROZ".to_string(),
                    quantity: Decimal::from(2),
                    unit: "UN".to_string(),
                    unit_price: Decimal::new(1500, 2),
                    total_price: Decimal::new(3000, 2),
                    product_code: None,
                },
                CanonicalItem {
                    name: "FEIJAO".to_string(),
                    quantity: Decimal::ONE,
                    unit: "UN".to_string(),
                    unit_price: Decimal::new(850, 2),
                    total_price: Decimal::new(850, 2),
                    product_code: Some("7896006716112".to_string()),
                },
            ],
            provenance: Provenance::Scraped,
        }
    }

    #[test]
    fn test_csv_has_row_per_item() {
        let csv = format_document(&document(), OutputFormat::Csv).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("access_key,emission_date"));
        assert!(lines[1].contains("\"LOJA, EXEMPLO\""));
        assert!(lines[2].ends_with("7896006716112"));
    }

    #[test]
    fn test_text_marks_orphans() {
        let text = format_document(&document(), OutputFormat::Text).unwrap();

        assert!(text.contains("ARROZ x 2 UN @ 15.00 = 30.00 [no code]"));
        assert!(text.contains("[7896006716112]"));
        assert!(text.contains("Total: R$ 38.50"));
        assert!(!text.contains("Items sum"));
    }

    #[test]
    fn test_json_round_trips() {
        let json = format_document(&document(), OutputFormat::Json).unwrap();
        let parsed: CanonicalDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, document());
    }
}
