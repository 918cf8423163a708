//! Canonical receipt representation shared by every source format.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a canonical document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Signed NFe/NFCe XML.
    Xml,
    /// Tax-authority HTML receipt page.
    Scraped,
}

impl Provenance {
    /// Prefix used when an access key has to be synthesized.
    pub fn synthetic_key_prefix(&self) -> &'static str {
        match self {
            Self::Xml => "XML-",
            Self::Scraped => "SCRAPING-",
        }
    }
}

/// A normalized fiscal receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    /// Emission date (time of day is discarded).
    pub emission_date: NaiveDate,

    /// Seller display name, possibly with embedded CNPJ text.
    pub seller_name: String,

    /// Declared total amount.
    pub total_amount: Decimal,

    /// Statutory access key, or a synthesized unique token.
    pub access_key: String,

    /// Line items in document order.
    pub items: Vec<CanonicalItem>,

    /// Source format.
    pub provenance: Provenance,
}

impl CanonicalDocument {
    /// Number of line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items still waiting for a canonical product code.
    pub fn orphan_items(&self) -> impl Iterator<Item = &CanonicalItem> {
        self.items.iter().filter(|item| item.is_orphan())
    }

    /// Whether the access key was synthesized rather than read from the source.
    pub fn has_synthetic_key(&self) -> bool {
        self.access_key.starts_with(Provenance::Xml.synthetic_key_prefix())
            || self.access_key.starts_with(Provenance::Scraped.synthetic_key_prefix())
    }

    /// Sum of line totals, useful to compare with the declared total.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(|item| item.total_price).sum()
    }
}

/// A single purchased line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem {
    /// Raw, retailer-specific description.
    pub name: String,

    /// Quantity (non-negative).
    pub quantity: Decimal,

    /// Unit of measure as printed (UN, KG, ...).
    pub unit: String,

    /// Price per unit.
    pub unit_price: Decimal,

    /// Line total. Falls back to the unit price when the source has none.
    pub total_price: Decimal,

    /// Canonical product code (EAN), once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
}

impl CanonicalItem {
    /// Whether the item has no canonical product code yet.
    pub fn is_orphan(&self) -> bool {
        self.product_code.is_none()
    }
}
