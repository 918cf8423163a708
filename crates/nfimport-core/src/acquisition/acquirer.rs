//! Ordered fetch tiers and escalation between them.

use tracing::{debug, info, warn};

use crate::adapters::{AdapterKind, BlockDetector};
use crate::error::{ImportError, Result};
use crate::models::config::{BrowserConfig, ExtractionConfig};
use crate::models::document::CanonicalDocument;

use super::{FetchOutcome, PageFetcher, PageRenderer, RenderOptions};

/// Fetch tiers from cheapest to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Plain HTTP GET.
    Lightweight,
    /// Browser run with the configured headless setting.
    Rendered,
    /// Browser with a visible window, tried after a blocked headless run.
    Visible,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Lightweight => "lightweight",
            Tier::Rendered => "rendered",
            Tier::Visible => "visible",
        }
    }
}

/// Fetches receipt pages and runs the adapter on them, escalating through
/// tiers when the origin blocks access.
pub struct Acquirer<F, R> {
    fetcher: F,
    renderer: R,
    detector: BlockDetector,
    render_options: RenderOptions,
    extraction: ExtractionConfig,
}

impl<F: PageFetcher, R: PageRenderer> Acquirer<F, R> {
    pub fn new(fetcher: F, renderer: R, browser: &BrowserConfig, extraction: ExtractionConfig) -> Self {
        Self {
            fetcher,
            renderer,
            detector: BlockDetector::new(extraction.block_signatures.iter().cloned()),
            render_options: RenderOptions::from_config(browser),
            extraction,
        }
    }

    /// Tiers tried for one acquisition, in order.
    pub fn tiers(&self, force_rendered: bool) -> Vec<Tier> {
        let mut tiers = Vec::with_capacity(3);
        if !force_rendered {
            tiers.push(Tier::Lightweight);
        }
        tiers.push(Tier::Rendered);
        if self.render_options.headless {
            tiers.push(Tier::Visible);
        }
        tiers
    }

    /// Fetch `url` and extract a document with `adapter`.
    pub fn acquire(&self, url: &str, adapter: AdapterKind, force_rendered: bool) -> Result<CanonicalDocument> {
        for tier in self.tiers(force_rendered) {
            debug!("Fetching {} via {} tier", url, tier.name());

            let html = match self.fetch(tier, url) {
                FetchOutcome::Html(html) => html,
                FetchOutcome::Blocked => {
                    info!("{} tier was blocked for {}, escalating", tier.name(), url);
                    continue;
                }
                FetchOutcome::Failed(source) => {
                    return Err(ImportError::Acquisition {
                        url: url.to_string(),
                        source,
                    });
                }
            };

            match adapter.parse(&html, &self.extraction) {
                Ok(document) => {
                    info!(
                        "Extracted {} items from {} via {} tier",
                        document.item_count(),
                        url,
                        tier.name()
                    );
                    return Ok(document);
                }
                Err(err) if tier == Tier::Lightweight => {
                    warn!("Lightweight page for {} was unreadable ({}), escalating", url, err);
                }
                Err(source) => {
                    return Err(ImportError::Extraction {
                        origin: url.to_string(),
                        source,
                    });
                }
            }
        }

        warn!("Every fetch tier was blocked for {}", url);
        Err(ImportError::Blocked {
            url: url.to_string(),
        })
    }

    fn fetch(&self, tier: Tier, url: &str) -> FetchOutcome {
        let fetched = match tier {
            Tier::Lightweight => self.fetcher.fetch(url),
            Tier::Rendered => self.renderer.render(url, &self.render_options),
            Tier::Visible => self.renderer.render(url, &self.render_options.visible()),
        };

        match fetched {
            Ok(html) if self.detector.is_blocked(&html) => FetchOutcome::Blocked,
            Ok(html) => FetchOutcome::Html(html),
            Err(err) => FetchOutcome::Failed(err),
        }
    }
}
