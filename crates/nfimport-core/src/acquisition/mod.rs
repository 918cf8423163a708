//! Receipt page acquisition with tiered escalation.
//!
//! A page is fetched by the cheapest tier first. Tiers that get a block page
//! (or, for the lightweight tier, a page the adapter cannot read) hand over
//! to the next tier; transport failures end the attempt.

mod acquirer;
mod browser;
mod http;

pub use acquirer::{Acquirer, Tier};
pub use browser::{PageRenderer, RenderOptions};
#[cfg(feature = "browser")]
pub use browser::ChromeRenderer;
#[cfg(not(feature = "browser"))]
pub use browser::UnavailableRenderer;
pub use http::HttpFetcher;

use crate::error::AcquisitionError;
use crate::models::config::ImportConfig;

/// Acquirer with type-erased tiers, as built from configuration.
pub type BoxedAcquirer = Acquirer<Box<dyn PageFetcher>, Box<dyn PageRenderer>>;

/// Build the HTTP and browser tiers described by `config`.
pub fn from_config(config: &ImportConfig) -> Result<BoxedAcquirer, AcquisitionError> {
    let fetcher: Box<dyn PageFetcher> = Box::new(HttpFetcher::new(&config.http)?);

    #[cfg(feature = "browser")]
    let renderer: Box<dyn PageRenderer> = Box::new(ChromeRenderer::new());
    #[cfg(not(feature = "browser"))]
    let renderer: Box<dyn PageRenderer> = Box::new(UnavailableRenderer);

    Ok(Acquirer::new(
        fetcher,
        renderer,
        &config.browser,
        config.extraction.clone(),
    ))
}

/// Result of one fetch tier.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Page content that does not look like a block page.
    Html(String),
    /// The origin answered with an access-denied page.
    Blocked,
    /// The fetch itself failed.
    Failed(AcquisitionError),
}

/// Non-rendering fetch of a page body.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, AcquisitionError>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch(&self, url: &str) -> Result<String, AcquisitionError> {
        (**self).fetch(url)
    }
}

impl<F: PageFetcher + ?Sized> PageFetcher for Box<F> {
    fn fetch(&self, url: &str) -> Result<String, AcquisitionError> {
        (**self).fetch(url)
    }
}
