//! Import coordinator: acquisition or normalization, resolution, persistence.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::acquisition::{self, Acquirer, BoxedAcquirer, PageFetcher, PageRenderer};
use crate::adapters::AdapterRegistry;
use crate::error::{ImportError, Result};
use crate::models::config::ImportConfig;
use crate::models::document::CanonicalDocument;
use crate::resolver::{resolve_document, MappingLookup};
use crate::store::{DocumentStore, SourceLog};
use crate::xml::XmlNormalizer;

/// Origin label for XML payloads in error messages.
const XML_ORIGIN: &str = "XML upload";

/// Input of a single import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// Raw NFe/NFCe XML bytes.
    Xml(Vec<u8>),
    /// SEFAZ consultation page URL.
    Url { url: String, force_rendered: bool },
}

impl ImportSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url {
            url: url.into(),
            force_rendered: false,
        }
    }

    /// A URL fetched directly with the browser, skipping plain HTTP.
    pub fn rendered(url: impl Into<String>) -> Self {
        Self::Url {
            url: url.into(),
            force_rendered: true,
        }
    }
}

/// A committed import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// The document as stored, with product codes resolved.
    pub document: CanonicalDocument,
    /// Record id assigned by the store.
    pub record_id: u64,
    /// Items left without a product code.
    pub orphan_count: usize,
}

/// A URL that failed during bulk restore.
#[derive(Debug)]
pub struct RestoreFailure {
    pub url: String,
    pub error: ImportError,
}

/// Result of a bulk restore. Failures never abort the run.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub imported: Vec<ImportOutcome>,
    pub failures: Vec<RestoreFailure>,
}

impl RestoreReport {
    pub fn attempted(&self) -> usize {
        self.imported.len() + self.failures.len()
    }

    pub fn conflicts(&self) -> usize {
        self.failures.iter().filter(|f| f.error.is_conflict()).count()
    }
}

/// Runs imports one at a time against a store, a mapping table and a
/// processed-source log.
pub struct Importer<S, M, L, F = Box<dyn PageFetcher>, R = Box<dyn PageRenderer>> {
    acquirer: Acquirer<F, R>,
    registry: AdapterRegistry,
    normalizer: XmlNormalizer,
    store: S,
    mappings: M,
    log: L,
    cooldown: Duration,
}

impl<S, M, L> Importer<S, M, L>
where
    S: DocumentStore,
    M: MappingLookup,
    L: SourceLog,
{
    /// Importer with the HTTP and browser tiers described by `config`.
    pub fn from_config(config: &ImportConfig, store: S, mappings: M, log: L) -> Result<Self> {
        let acquirer: BoxedAcquirer = acquisition::from_config(config)
            .map_err(|e| ImportError::Config(e.to_string()))?;
        Ok(Importer::new(acquirer, store, mappings, log).with_cooldown(config.restore.cooldown()))
    }
}

impl<S, M, L, F, R> Importer<S, M, L, F, R>
where
    S: DocumentStore,
    M: MappingLookup,
    L: SourceLog,
    F: PageFetcher,
    R: PageRenderer,
{
    pub fn new(acquirer: Acquirer<F, R>, store: S, mappings: M, log: L) -> Self {
        Self {
            acquirer,
            registry: AdapterRegistry::default(),
            normalizer: XmlNormalizer::new(),
            store,
            mappings,
            log,
            cooldown: Duration::ZERO,
        }
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Pause between network-bound imports of a bulk restore.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Import one source and commit it.
    pub fn import(&mut self, source: ImportSource) -> Result<ImportOutcome> {
        let (mut document, url) = match source {
            ImportSource::Xml(bytes) => {
                let document = self.normalizer.parse(&bytes).map_err(|source| {
                    ImportError::Extraction {
                        origin: XML_ORIGIN.to_string(),
                        source,
                    }
                })?;
                (document, None)
            }
            ImportSource::Url {
                url,
                force_rendered,
            } => {
                let adapter = self.registry.select(&url);
                let document = self.acquirer.acquire(&url, adapter, force_rendered)?;
                (document, Some(url))
            }
        };

        let orphan_count = resolve_document(&mut document, &self.mappings);

        let record_id = self.store.persist(&document).map_err(|err| {
            let err = ImportError::from(err);
            if err.is_conflict() {
                warn!("Rejected duplicate access key {}", document.access_key);
            }
            err
        })?;

        if let Some(url) = &url {
            if let Err(err) = self.log.add(url) {
                warn!("Could not record {} in the processed-source log: {}", url, err);
            }
        }

        info!(
            "Imported {} from {} as record {} ({} items, {} orphans)",
            document.access_key,
            url.as_deref().unwrap_or(XML_ORIGIN),
            record_id,
            document.item_count(),
            orphan_count
        );

        Ok(ImportOutcome {
            document,
            record_id,
            orphan_count,
        })
    }

    /// Import every URL in order, pausing the cooldown between imports.
    pub fn restore(&mut self, urls: &[String]) -> RestoreReport {
        self.restore_with(urls, |_, _| {})
    }

    /// Like [`restore`](Self::restore), calling `on_done` after each URL.
    pub fn restore_with<C>(&mut self, urls: &[String], mut on_done: C) -> RestoreReport
    where
        C: FnMut(&str, std::result::Result<&ImportOutcome, &ImportError>),
    {
        let mut report = RestoreReport::default();

        for (index, url) in urls.iter().enumerate() {
            if index > 0 && !self.cooldown.is_zero() {
                thread::sleep(self.cooldown);
            }

            match self.import(ImportSource::url(url.as_str())) {
                Ok(outcome) => {
                    on_done(url.as_str(), Ok(&outcome));
                    report.imported.push(outcome);
                }
                Err(error) => {
                    warn!("Restore of {} failed: {}", url, error);
                    on_done(url.as_str(), Err(&error));
                    report.failures.push(RestoreFailure {
                        url: url.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "Restore finished: {} imported, {} failed",
            report.imported.len(),
            report.failures.len()
        );
        report
    }

    /// Re-import every URL in the processed-source log.
    pub fn restore_logged(&mut self) -> RestoreReport {
        let urls = self.log.urls();
        self.restore(&urls)
    }
}
