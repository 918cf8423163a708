//! Error types for the nfimport-core library.

use thiserror::Error;

/// Main error type returned by the import pipeline.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Network or transport failure while fetching a receipt page.
    #[error("failed to acquire {url}: {source}")]
    Acquisition {
        url: String,
        #[source]
        source: AcquisitionError,
    },

    /// The origin kept denying automated access after every fetch tier.
    #[error(
        "access to {url} was denied by the tax authority even with a visible browser; \
         configure a residential or rotating proxy and try again"
    )]
    Blocked { url: String },

    /// Required fields could not be recovered from a fetched or uploaded document.
    #[error("extraction failed for {origin}: {source}")]
    Extraction {
        origin: String,
        #[source]
        source: ExtractionError,
    },

    /// A document with the same access key has already been imported.
    #[error("a fiscal document with access key {access_key} was already imported")]
    Conflict { access_key: String },

    /// Persistence failure unrelated to access-key uniqueness.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ImportError {
    /// Whether this error came from the access-key uniqueness check.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateAccessKey(access_key) => Self::Conflict { access_key },
            other => Self::Store(other),
        }
    }
}

/// Errors raised while fetching receipt pages.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// The HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The rendering browser failed to launch or navigate.
    #[error("browser fetch failed: {0}")]
    Browser(String),
}

/// Errors related to receipt field extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Required field is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A field was present but its value could not be parsed.
    #[error("failed to parse {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The XML payload is not well formed.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// The page is an access-denied page rather than a receipt.
    #[error("access to the receipt page was denied by the tax authority; no receipt content available")]
    BlockPage,

    /// No line items survived extraction.
    #[error("no line items found in the document")]
    NoItems,
}

/// Errors raised by document stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The access key is already present in the store.
    #[error("duplicate access key: {0}")]
    DuplicateAccessKey(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by the processed-source log.
#[derive(Error, Debug)]
pub enum LogError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The log file does not hold a JSON array of strings.
    #[error("invalid log file: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for the nfimport library.
pub type Result<T> = std::result::Result<T, ImportError>;
