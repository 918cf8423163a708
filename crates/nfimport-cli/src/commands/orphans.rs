//! Orphans command - list stored items still waiting for a product code.

use clap::Args;
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;

use nfimport_core::{CanonicalDocument, DocumentStore, JsonFileStore};

use super::output::OutputFormat;

/// Arguments for the orphans command.
#[derive(Args)]
pub struct OrphansArgs {
    /// Only show items sold by sellers whose name contains this text
    #[arg(short, long)]
    seller: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// One item without a product code, with the mapping key it needs.
#[derive(Debug, Serialize)]
struct OrphanRow<'a> {
    raw_description: &'a str,
    seller_name: &'a str,
    access_key: &'a str,
    quantity: Decimal,
    unit: &'a str,
}

fn orphan_rows<'a>(documents: &[&'a CanonicalDocument], seller: Option<&str>) -> Vec<OrphanRow<'a>> {
    let seller = seller.map(str::to_lowercase);

    documents
        .iter()
        .copied()
        .filter(|doc| match &seller {
            Some(needle) => doc.seller_name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .flat_map(|doc| {
            doc.orphan_items().map(move |item| OrphanRow {
                raw_description: &item.name,
                seller_name: &doc.seller_name,
                access_key: &doc.access_key,
                quantity: item.quantity,
                unit: &item.unit,
            })
        })
        .collect()
}

pub fn run(args: OrphansArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let store = JsonFileStore::open(&config.paths.store)?;
    let documents = store.documents();

    let rows = orphan_rows(&documents, args.seller.as_deref());

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&rows)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for row in &rows {
                wtr.serialize(row)?;
            }
            print!("{}", String::from_utf8(wtr.into_inner()?)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!(
                    "{} Every stored item has a product code",
                    style("✓").green()
                );
                return Ok(());
            }

            println!(
                "{} {} items in {} documents have no product code",
                style("⚠").yellow(),
                rows.len(),
                documents.len()
            );
            for row in &rows {
                println!(
                    "  - {} ({} {}) from {}",
                    row.raw_description, row.quantity, row.unit, row.seller_name
                );
            }
        }
    }

    Ok(())
}
