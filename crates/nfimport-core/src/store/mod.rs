//! Persistence of imported documents and of the processed-source log.

mod source_log;

pub use source_log::{JsonSourceLog, MemorySourceLog, SourceLog};

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::document::CanonicalDocument;

/// Persistence boundary for canonical documents. Implementations must
/// reject a second document with an access key they already hold.
pub trait DocumentStore {
    /// Persist `document` and return its record id.
    fn persist(&mut self, document: &CanonicalDocument) -> Result<u64, StoreError>;

    /// Every stored document in insertion order.
    fn documents(&self) -> Vec<&CanonicalDocument>;
}

/// A stored document with its record id.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredDocument {
    pub id: u64,
    pub document: CanonicalDocument,
}

/// Documents kept in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<StoredDocument>,
    by_key: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_records(records: Vec<StoredDocument>) -> Self {
        let by_key = records
            .iter()
            .map(|r| (r.document.access_key.clone(), r.id))
            .collect();
        Self { records, by_key }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, access_key: &str) -> Option<&CanonicalDocument> {
        let id = self.by_key.get(access_key)?;
        self.records
            .iter()
            .find(|r| r.id == *id)
            .map(|r| &r.document)
    }

    fn next_id(&self) -> u64 {
        self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }
}

impl DocumentStore for MemoryStore {
    fn persist(&mut self, document: &CanonicalDocument) -> Result<u64, StoreError> {
        if self.by_key.contains_key(&document.access_key) {
            return Err(StoreError::DuplicateAccessKey(document.access_key.clone()));
        }

        let id = self.next_id();
        self.by_key.insert(document.access_key.clone(), id);
        self.records.push(StoredDocument {
            id,
            document: document.clone(),
        });
        debug!("Stored document {} as record {}", document.access_key, id);
        Ok(id)
    }

    fn documents(&self) -> Vec<&CanonicalDocument> {
        self.records.iter().map(|r| &r.document).collect()
    }
}

/// Documents kept in a JSON file, rewritten whole after every insert.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records: Vec<StoredDocument> = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };
        info!("Opened document store {} with {} records", path.display(), records.len());

        Ok(Self {
            path,
            inner: MemoryStore::from_records(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(&self.inner.records)?;
        write_atomic(&self.path, &content)?;
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn persist(&mut self, document: &CanonicalDocument) -> Result<u64, StoreError> {
        let id = self.inner.persist(document)?;
        if let Err(err) = self.flush() {
            self.inner.records.pop();
            self.inner.by_key.remove(&document.access_key);
            return Err(err);
        }
        Ok(id)
    }

    fn documents(&self) -> Vec<&CanonicalDocument> {
        self.inner.documents()
    }
}

/// Write `content` to a temporary file beside `path`, then rename it over
/// `path`. Readers see either the old or the new file, never a torn one.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{CanonicalItem, Provenance};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn document(key: &str) -> CanonicalDocument {
        CanonicalDocument {
            emission_date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            seller_name: "LOJA".to_string(),
            total_amount: Decimal::new(850, 2),
            access_key: key.to_string(),
            items: vec![CanonicalItem {
                name: "FEIJAO".to_string(),
                quantity: Decimal::ONE,
                unit: "UN".to_string(),
                unit_price: Decimal::new(850, 2),
                total_price: Decimal::new(850, 2),
                product_code: None,
            }],
            provenance: Provenance::Xml,
        }
    }

    #[test]
    fn test_memory_store_rejects_duplicate_key() {
        let mut store = MemoryStore::new();
        assert_eq!(store.persist(&document("A")).unwrap(), 1);
        assert_eq!(store.persist(&document("B")).unwrap(), 2);

        let err = store.persist(&document("A")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateAccessKey(key) if key == "A"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("B").map(|d| d.seller_name.as_str()), Some("LOJA"));
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("documents.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.persist(&document("A")).unwrap();
        store.persist(&document("B")).unwrap();

        let mut reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.documents()[1].access_key, "B");
        assert!(matches!(
            reopened.persist(&document("A")),
            Err(StoreError::DuplicateAccessKey(_))
        ));
        assert_eq!(reopened.persist(&document("C")).unwrap(), 3);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");

        write_atomic(&path, b"[1]").unwrap();
        write_atomic(&path, b"[1,2]").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2]");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
