//! Configuration structures for the import pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the nfimport pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Lightweight HTTP fetch configuration.
    pub http: HttpConfig,

    /// Rendered browser fetch configuration.
    pub browser: BrowserConfig,

    /// HTML extraction configuration.
    pub extraction: ExtractionConfig,

    /// Bulk restore configuration.
    pub restore: RestoreConfig,

    /// Data file locations.
    pub paths: PathsConfig,
}

/// Lightweight (non-rendering) HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with requests. `None` uses the client default.
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// When navigation is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitCondition {
    /// The `load` event fired.
    Load,
    /// The DOM was parsed.
    DomContentLoaded,
    /// No network activity for a short while.
    #[default]
    NetworkIdle,
}

/// Headless browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Start in headless mode. When false the visible-mode retry is skipped.
    pub headless: bool,

    /// Navigation timeout in milliseconds.
    pub timeout_ms: u64,

    /// Navigation wait condition.
    pub wait_until: WaitCondition,

    /// Extra settle time after navigation for deferred scripts.
    pub post_load_wait_ms: u64,

    /// Pause between browser actions.
    pub slow_mo_ms: u64,

    /// User agent presented by the browser.
    pub user_agent: String,

    /// Accept-Language presented by the browser.
    pub locale: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_ms: 20_000,
            wait_until: WaitCondition::NetworkIdle,
            post_load_wait_ms: 1_500,
            slow_mo_ms: 300,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            locale: "pt-BR".to_string(),
        }
    }
}

impl BrowserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn post_load_wait(&self) -> Duration {
        Duration::from_millis(self.post_load_wait_ms)
    }

    pub fn slow_mo(&self) -> Duration {
        Duration::from_millis(self.slow_mo_ms)
    }
}

/// HTML extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Phrases (lowercase) that identify an access-denied page.
    pub block_signatures: Vec<String>,

    /// Item names (compared case-insensitively) known to be layout noise.
    pub false_positive_names: Vec<String>,

    /// Lines scanned backwards from a quantity marker for the product name.
    pub regional_lookback: usize,

    /// Lines scanned forwards from a quantity marker for unit and prices.
    pub regional_lookahead: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            block_signatures: vec![
                "acesso negado ao portal".to_string(),
                "acesso bloqueado".to_string(),
            ],
            false_positive_names: vec!["niteroi".to_string()],
            regional_lookback: 8,
            regional_lookahead: 15,
        }
    }
}

/// Bulk restore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    /// Pause between network-bound imports, in seconds.
    pub cooldown_secs: u64,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self { cooldown_secs: 5 }
    }
}

impl RestoreConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Data file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON array of successfully imported URLs.
    pub processed_log: PathBuf,

    /// JSON array of product mappings.
    pub mappings: PathBuf,

    /// JSON document store.
    pub store: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            processed_log: PathBuf::from("data/processed_urls_backup.json"),
            mappings: PathBuf::from("data/product_mappings.json"),
            store: PathBuf::from("data/fiscal_documents.json"),
        }
    }
}

impl ImportConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
