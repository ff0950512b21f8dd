//! Book catalog providers.
//!
//! This module defines the interface for querying an external book catalog and
//! includes one implementation per supported catalog.
//!
//! The `BookProvider` trait hides each catalog's request format and response
//! schema. Every provider returns unified [`Book`] records; source-native
//! field names never leave the provider's own module.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Book, BookSource};

pub mod google;
pub mod gutenberg;
pub mod http;
pub mod openlibrary;

pub use google::GoogleBooksProvider;
pub use gutenberg::GutenbergProvider;
pub use http::CatalogClient;
pub use openlibrary::OpenLibraryProvider;

/// Errors that can occur when querying a catalog.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, DNS or TLS failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The catalog answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    StatusError { status: u16, url: String },

    /// Response body is not the expected JSON shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The catalog did not answer in time
    #[error("Request timed out")]
    Timeout,

    /// Other provider-specific errors
    #[error("Provider error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::ParseError(err.to_string())
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Trait for querying a single book catalog.
///
/// # Design Notes
///
/// - Providers own exactly one endpoint and one response schema
/// - Providers apply their own result limits
/// - Records are not deduplicated here; the search pipeline does that
#[async_trait]
pub trait BookProvider: Send + Sync {
    /// Search the catalog with a free-text query.
    ///
    /// # Errors
    /// Returns `ProviderError` on transport failure, non-success status, or a
    /// malformed payload. A response with no matches is `Ok(vec![])`.
    async fn search(&self, query: &str) -> ProviderResult<Vec<Book>>;

    /// Catalog this provider queries.
    fn source(&self) -> BookSource;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(ProviderError::from(err), ProviderError::ParseError(_)));
    }
}
