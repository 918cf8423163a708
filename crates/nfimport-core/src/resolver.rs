//! Product identity resolution.
//!
//! A line item is resolved to a canonical product code by fixed precedence:
//! a code declared by the document itself, then a verbatim mapping of the
//! raw description as sold by that seller. Anything else stays an orphan.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::document::{CanonicalDocument, CanonicalItem};

/// Read-only source of `(raw description, seller) -> product code` mappings.
pub trait MappingLookup {
    fn lookup(&self, raw_description: &str, seller_name: &str) -> Option<String>;
}

impl<M: MappingLookup + ?Sized> MappingLookup for &M {
    fn lookup(&self, raw_description: &str, seller_name: &str) -> Option<String> {
        (**self).lookup(raw_description, seller_name)
    }
}

/// One mapping as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMapping {
    pub raw_description: String,
    pub seller_name: String,
    pub product_code: String,
}

/// In-memory mapping table keyed by exact description and seller.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<(String, String), String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of mappings. Later entries override earlier ones.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let mappings: Vec<ProductMapping> = serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(mappings.into_iter().collect())
    }

    pub fn insert(
        &mut self,
        raw_description: impl Into<String>,
        seller_name: impl Into<String>,
        product_code: impl Into<String>,
    ) {
        self.entries
            .insert((raw_description.into(), seller_name.into()), product_code.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ProductMapping> for MappingTable {
    fn from_iter<I: IntoIterator<Item = ProductMapping>>(iter: I) -> Self {
        let mut table = Self::new();
        for mapping in iter {
            table.insert(mapping.raw_description, mapping.seller_name, mapping.product_code);
        }
        table
    }
}

impl MappingLookup for MappingTable {
    fn lookup(&self, raw_description: &str, seller_name: &str) -> Option<String> {
        self.entries
            .get(&(raw_description.to_string(), seller_name.to_string()))
            .cloned()
    }
}

/// Product code for `item` sold by `seller_name`.
pub fn resolve(item: &CanonicalItem, seller_name: &str, mappings: &impl MappingLookup) -> Option<String> {
    if let Some(code) = &item.product_code {
        return Some(code.clone());
    }
    let code = mappings.lookup(&item.name, seller_name)?;
    debug!("Mapped '{}' from {} to {}", item.name, seller_name, code);
    Some(code)
}

/// Resolve every item of `document` in place. Returns how many items
/// remain without a product code.
pub fn resolve_document(document: &mut CanonicalDocument, mappings: &impl MappingLookup) -> usize {
    let seller_name = document.seller_name.clone();
    for item in &mut document.items {
        item.product_code = resolve(item, &seller_name, mappings);
    }
    document.orphan_items().count()
}
