//! Lightweight HTTP tier.

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::AcquisitionError;
use crate::models::config::HttpConfig;

use super::PageFetcher;

/// User agent sent when none is configured.
const DEFAULT_USER_AGENT: &str = concat!("nfimport/", env!("CARGO_PKG_VERSION"));

/// Plain HTTP GET with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .build()
            .map_err(|e| AcquisitionError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, AcquisitionError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| AcquisitionError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status(status.as_u16()));
        }

        response
            .text()
            .map_err(|e| AcquisitionError::Http(e.to_string()))
    }
}
