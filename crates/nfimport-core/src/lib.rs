//! Core library for Brazilian fiscal receipt import.
//!
//! This crate provides:
//! - NFe/NFCe XML normalization into a canonical document
//! - SEFAZ consultation page acquisition with tiered escalation
//!   (plain HTTP, headless browser, visible browser)
//! - Layout adapters for the common and the Rio de Janeiro receipt pages
//! - Product identity resolution against a seller-specific mapping table
//! - An import coordinator that commits each access key exactly once

pub mod acquisition;
pub mod adapters;
pub mod error;
pub mod importer;
pub mod models;
pub mod resolver;
pub mod rules;
pub mod store;
pub mod xml;

pub use acquisition::{Acquirer, FetchOutcome, HttpFetcher, PageFetcher, PageRenderer, RenderOptions, Tier};
#[cfg(feature = "browser")]
pub use acquisition::ChromeRenderer;
pub use adapters::{AdapterKind, AdapterRegistry, BlockDetector};
pub use error::{AcquisitionError, ExtractionError, ImportError, LogError, Result, StoreError};
pub use importer::{ImportOutcome, ImportSource, Importer, RestoreFailure, RestoreReport};
pub use models::config::ImportConfig;
pub use models::document::{CanonicalDocument, CanonicalItem, Provenance};
pub use resolver::{MappingLookup, MappingTable, ProductMapping};
pub use store::{DocumentStore, JsonFileStore, JsonSourceLog, MemorySourceLog, MemoryStore, SourceLog};
pub use xml::XmlNormalizer;
