//! Regional HTML adapters turning SEFAZ consultation pages into canonical documents.

mod fields;
mod generic;
pub mod page;
mod regional;

pub use fields::UNKNOWN_SELLER;
pub use page::{BlockDetector, Page};
pub use regional::{ScanWindow, KEY_PREFIX as REGIONAL_KEY_PREFIX};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::document::CanonicalDocument;

/// Result type for HTML extraction.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Unit of measure assumed when a page omits it.
pub const DEFAULT_UNIT: &str = "UN";

/// URL fragment identifying the Rio de Janeiro portal.
pub const RJ_PORTAL: &str = "fazenda.rj.gov.br";

/// Page layouts with a dedicated adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Common layout with a `tabResult` item table.
    Generic,
    /// Rio de Janeiro layout, items recovered by line scan.
    Regional,
}

impl AdapterKind {
    pub fn name(&self) -> &'static str {
        match self {
            AdapterKind::Generic => "default",
            AdapterKind::Regional => "rj_nfe_moderno",
        }
    }

    /// Parse a consultation page. Block pages are rejected before any
    /// field is read.
    pub fn parse(&self, html: &str, config: &ExtractionConfig) -> Result<CanonicalDocument> {
        let page = Page::parse(html);
        if BlockDetector::new(config.block_signatures.iter().cloned()).is_blocked_page(&page) {
            return Err(ExtractionError::BlockPage);
        }

        match self {
            AdapterKind::Generic => generic::parse(&page, config),
            AdapterKind::Regional => regional::parse(&page, config),
        }
    }
}

/// URL substring routed to an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterRoute {
    pub pattern: String,
    pub kind: AdapterKind,
}

/// Chooses the adapter for a URL. Routes are checked in registration order;
/// unmatched URLs get the fallback adapter.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    routes: Vec<AdapterRoute>,
    fallback: AdapterKind,
}

impl AdapterRegistry {
    /// A registry with no routes.
    pub fn empty(fallback: AdapterKind) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
        }
    }

    pub fn register(&mut self, pattern: impl Into<String>, kind: AdapterKind) -> &mut Self {
        self.routes.push(AdapterRoute {
            pattern: pattern.into(),
            kind,
        });
        self
    }

    pub fn select(&self, url: &str) -> AdapterKind {
        let kind = self
            .routes
            .iter()
            .find(|route| url.contains(&route.pattern))
            .map(|route| route.kind)
            .unwrap_or(self.fallback);
        debug!("Adapter {} selected for {}", kind.name(), url);
        kind
    }

    pub fn routes(&self) -> &[AdapterRoute] {
        &self.routes
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty(AdapterKind::Generic);
        registry.register(RJ_PORTAL, AdapterKind::Regional);
        registry
    }
}
