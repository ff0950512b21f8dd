//! Search configuration.
//!
//! Endpoints, per-catalog result limits, timeouts and the mood keyword table.
//! Every field has a default, so a JSON config file only needs to name the
//! values it overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mood::MoodTerms;

/// Default number of books returned to the caller.
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Default per-catalog timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for the book search engine and mood service client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Google Books volumes endpoint
    pub google_books_url: String,

    /// Results requested from Google Books (`maxResults`)
    pub google_books_max_results: usize,

    /// Gutendex books endpoint
    pub gutenberg_url: String,

    /// Gutenberg results kept after the response is received
    pub gutenberg_limit: usize,

    /// Open Library base URL (`/search.json` is appended)
    pub open_library_url: String,

    /// Results requested from Open Library (`limit`)
    pub open_library_limit: usize,

    /// Cover image base URL for Open Library cover ids
    pub covers_url: String,

    /// Per-catalog timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of books returned from a search
    pub page_size: usize,

    /// User-Agent sent to the catalogs
    pub user_agent: String,

    /// Mood analysis and track recommendation service
    pub mood_service_url: String,

    /// Keyword appended to the query for each mood
    pub mood_terms: MoodTerms,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            google_books_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            google_books_max_results: 20,
            gutenberg_url: "https://gutendex.com/books".to_string(),
            gutenberg_limit: 10,
            open_library_url: "https://openlibrary.org".to_string(),
            open_library_limit: 15,
            covers_url: "https://covers.openlibrary.org".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: concat!("moodsync/", env!("CARGO_PKG_VERSION")).to_string(),
            mood_service_url: "http://127.0.0.1:8000".to_string(),
            mood_terms: MoodTerms::default(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a JSON file, filling omitted fields with defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that limits and timeouts are usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        for (name, limit) in [
            ("google_books_max_results", self.google_books_max_results),
            ("gutenberg_limit", self.gutenberg_limit),
            ("open_library_limit", self.open_library_limit),
        ] {
            if limit == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodKey;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.page_size, 24);
        assert_eq!(config.google_books_max_results, 20);
        assert_eq!(config.gutenberg_limit, 10);
        assert_eq!(config.open_library_limit, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"page_size": 12, "timeout_secs": 3, "mood_terms": {{"calm": ["tea"]}}}}"#
        )
        .unwrap();

        let config = SearchConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.gutenberg_limit, 10);
        assert_eq!(config.mood_terms.keyword_for(MoodKey::Calm), Some("tea"));
        assert_eq!(config.mood_terms.keyword_for(MoodKey::Upbeat), None);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"page_size": 0}}"#).unwrap();
        assert!(matches!(
            SearchConfig::from_json_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            SearchConfig::from_json_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
