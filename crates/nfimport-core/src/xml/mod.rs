//! NFe/NFCe XML normalization.

mod normalizer;
mod tree;

pub use normalizer::{clean_seller_name, XmlNormalizer};
pub use tree::{Descendants, XmlElement};

use crate::error::ExtractionError;

/// Namespace of the NFe schema.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// Result type for XML normalization.
pub type Result<T> = std::result::Result<T, ExtractionError>;
