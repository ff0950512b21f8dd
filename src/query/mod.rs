//! Query processing and ranking module.
//!
//! This module fans a search out to every catalog provider, merges whatever
//! comes back, and turns it into one bounded, ordered page of books.
//!
//! # Usage
//!
//! ```rust,no_run
//! use moodsync::config::SearchConfig;
//! use moodsync::mood::MoodKey;
//! use moodsync::query::{BookSearchEngine, SearchEngine, SearchQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = BookSearchEngine::from_config(&SearchConfig::default())?;
//!
//! let query = SearchQuery::new("Calm/Peaceful", Some(MoodKey::Calm), None);
//! let books = engine.search(&query).await?;
//!
//! for book in books {
//!     println!("[{}] {} - {:.1}", book.source, book.title, book.average_rating);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! 1. Append the mood keyword to the query (if a mood is given)
//! 2. Query all providers concurrently and wait for every one to settle
//! 3. Concatenate results in provider order; failed providers add nothing
//! 4. Deduplicate by normalized title (first occurrence wins)
//! 5. Rank: Gutenberg first, then rating descending, stable
//! 6. Truncate to the page size

pub mod pipeline;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{SearchConfig, DEFAULT_PAGE_SIZE};
use crate::models::{Book, BookSource};
use crate::mood::{derive_search_term, MoodKey, MoodTerms};
use crate::provider::{
    BookProvider, CatalogClient, GoogleBooksProvider, GutenbergProvider, OpenLibraryProvider,
    ProviderError, ProviderResult,
};

use self::pipeline::{bound, dedupe, rank};

/// Message shown to users when a search fails as a whole.
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search books. Please try again.";

/// Errors that can occur during query processing.
///
/// Individual catalog failures never show up here; they are absorbed during
/// aggregation. Only failures of the orchestration itself are reported.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Invalid query parameters
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Other unexpected errors
    #[error("Unexpected query error: {0}")]
    Other(String),
}

impl QueryError {
    /// Message suitable for display, without transport details.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::InvalidQuery(reason) => reason.clone(),
            QueryError::Other(_) => SEARCH_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Search query parameters.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text query as entered by the user
    pub text: String,

    /// Mood whose keyword is appended to the query
    pub mood: Option<MoodKey>,

    /// Maximum number of results to return; `None` uses the engine's page size
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Create a new search query.
    ///
    /// # Arguments
    /// * `text` - The search query text
    /// * `mood` - Optional mood used to augment the query
    /// * `limit` - Maximum number of results (default: the engine's page size)
    pub fn new(text: impl Into<String>, mood: Option<MoodKey>, limit: Option<usize>) -> Self {
        Self {
            text: text.into(),
            mood,
            limit,
        }
    }
}

/// Trait for book search engines.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Execute a search and return one bounded, ranked page of books.
    ///
    /// # Errors
    /// Returns `QueryError` if the query is invalid or orchestration fails.
    /// No matches at all is `Ok(vec![])`.
    async fn search(&self, query: &SearchQuery) -> QueryResult<Vec<Book>>;
}

/// What one provider contributed to a search.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: BookSource,
    pub result: ProviderResult<Vec<Book>>,
    pub elapsed: Duration,
}

/// Search engine that fans out to a fixed, ordered list of catalog providers.
pub struct BookSearchEngine {
    /// Providers in concatenation order
    providers: Vec<Box<dyn BookProvider>>,

    /// Per-provider time limit
    timeout: Duration,

    /// Keywords used to augment mood searches
    mood_terms: MoodTerms,

    /// Result bound for queries without an explicit limit
    page_size: usize,
}

impl BookSearchEngine {
    /// Create an engine over the given providers.
    ///
    /// Provider order matters: it is the concatenation order, and therefore
    /// decides which record survives deduplication.
    pub fn new(
        providers: Vec<Box<dyn BookProvider>>,
        timeout: Duration,
        mood_terms: MoodTerms,
    ) -> Self {
        Self {
            providers,
            timeout,
            mood_terms,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the result bound used when a query carries no limit.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Create an engine over Google Books, Gutenberg and Open Library, in that
    /// order, sharing one HTTP client.
    ///
    /// # Errors
    /// Returns `QueryError::Other` if the HTTP client cannot be built
    pub fn from_config(config: &SearchConfig) -> QueryResult<Self> {
        let client = CatalogClient::new(config.timeout(), &config.user_agent)
            .map_err(|e| QueryError::Other(e.to_string()))?;

        let providers: Vec<Box<dyn BookProvider>> = vec![
            Box::new(GoogleBooksProvider::from_config(client.clone(), config)),
            Box::new(GutenbergProvider::from_config(client.clone(), config)),
            Box::new(OpenLibraryProvider::from_config(client, config)),
        ];

        Ok(Self::new(providers, config.timeout(), config.mood_terms.clone())
            .with_page_size(config.page_size))
    }

    /// Catalogs queried by this engine, in concatenation order.
    pub fn sources(&self) -> Vec<BookSource> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    /// Query every provider concurrently and report each outcome.
    ///
    /// Waits for all providers to settle. A provider that exceeds the timeout
    /// is reported as `ProviderError::Timeout`; no failure cancels the others.
    /// Outcomes are returned in provider order regardless of completion order.
    pub async fn fan_out(&self, query: &str) -> Vec<SourceOutcome> {
        let searches = self.providers.iter().map(|provider| async move {
            let start = Instant::now();
            let result = match tokio::time::timeout(self.timeout, provider.search(query)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            };
            SourceOutcome {
                source: provider.source(),
                result,
                elapsed: start.elapsed(),
            }
        });

        join_all(searches).await
    }

    /// Query every provider and concatenate their books in provider order.
    ///
    /// Failed providers are logged and contribute nothing.
    pub async fn aggregate(&self, query: &str) -> Vec<Book> {
        let mut books = Vec::new();

        for outcome in self.fan_out(query).await {
            match outcome.result {
                Ok(found) => {
                    debug!(
                        source = %outcome.source,
                        count = found.len(),
                        elapsed_ms = outcome.elapsed.as_millis() as u64,
                        "catalog returned results"
                    );
                    books.extend(found);
                }
                Err(e) => {
                    warn!(
                        source = %outcome.source,
                        error = %e,
                        elapsed_ms = outcome.elapsed.as_millis() as u64,
                        "catalog search failed"
                    );
                }
            }
        }

        let before = books.len();
        books.retain(Book::is_valid);
        if books.len() < before {
            debug!(
                dropped = before - books.len(),
                "dropped records without title, author or link"
            );
        }

        books
    }
}

#[async_trait]
impl SearchEngine for BookSearchEngine {
    async fn search(&self, query: &SearchQuery) -> QueryResult<Vec<Book>> {
        // 1. Validate and derive the catalog search term
        if query.text.trim().is_empty() {
            return Err(QueryError::InvalidQuery("Search query cannot be empty".to_string()));
        }
        let term = derive_search_term(&query.text, query.mood, &self.mood_terms);
        info!(query = %term, mood = ?query.mood, "searching catalogs");

        // 2. Fan out and merge
        let books = self.aggregate(&term).await;
        let fetched = books.len();

        // 3. Dedupe, rank, bound
        let limit = query.limit.unwrap_or(self.page_size);
        let results = bound(rank(dedupe(books)), limit);
        info!(fetched, returned = results.len(), "search complete");

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    // Mock BookProvider for testing
    struct MockProvider {
        source: BookSource,
        books: Vec<Book>,
        should_fail: bool,
        delay: Option<Duration>,
        queries: Arc<Mutex<Vec<String>>>,
    }

    impl MockProvider {
        fn new(source: BookSource, books: Vec<Book>) -> Self {
            Self {
                source,
                books,
                should_fail: false,
                delay: None,
                queries: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn with_failure(source: BookSource) -> Self {
            Self {
                should_fail: true,
                ..Self::new(source, Vec::new())
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl BookProvider for MockProvider {
        async fn search(&self, query: &str) -> ProviderResult<Vec<Book>> {
            self.queries.lock().unwrap().push(query.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.should_fail {
                return Err(ProviderError::ParseError("Mock malformed payload".to_string()));
            }
            Ok(self.books.clone())
        }

        fn source(&self) -> BookSource {
            self.source
        }
    }

    fn create_test_book(source: BookSource, id: &str, title: &str, rating: f32) -> Book {
        let authors = vec!["Test Author".to_string()];
        let mut book = Book::new(source, id, Some(title.to_string()), authors, "General")
            .with_rating(rating, 0);
        book.info_link = Some(format!("https://example.org/{}", id));
        book
    }

    fn numbered(source: BookSource, prefix: &str, count: usize) -> Vec<Book> {
        (0..count)
            .map(|i| {
                let id = format!("{}{}", prefix, i);
                create_test_book(source, &id, &format!("{} {}", prefix, i), 3.0)
            })
            .collect()
    }

    fn engine(providers: Vec<MockProvider>) -> BookSearchEngine {
        let providers = providers
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn BookProvider>)
            .collect();
        BookSearchEngine::new(providers, Duration::from_secs(5), MoodTerms::default())
    }

    #[test]
    fn test_search_query_defaults() {
        let query = SearchQuery::new("test query", None, None);
        assert_eq!(query.limit, None);
        assert!(query.mood.is_none());
        assert_eq!(engine(vec![]).page_size(), 24);
    }

    #[tokio::test]
    async fn test_engine_page_size_applies_without_query_limit() {
        let engine = engine(vec![MockProvider::new(
            BookSource::GoogleBooks,
            numbered(BookSource::GoogleBooks, "a", 20),
        )])
        .with_page_size(12);

        let results = engine.search(&SearchQuery::new("x", None, None)).await.unwrap();
        assert_eq!(results.len(), 12);

        // an explicit limit still wins
        let results = engine.search(&SearchQuery::new("x", None, Some(3))).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_from_config_reads_page_size() {
        let config = SearchConfig {
            page_size: 12,
            ..SearchConfig::default()
        };
        let engine = BookSearchEngine::from_config(&config).unwrap();
        assert_eq!(engine.page_size(), 12);
    }

    #[tokio::test]
    async fn test_query_without_mood_passes_through_unchanged() {
        let provider = MockProvider::new(BookSource::GoogleBooks, vec![]);
        let queries = Arc::clone(&provider.queries);
        let engine = engine(vec![provider]);

        engine.search(&SearchQuery::new("  war and peace ", None, None)).await.unwrap();
        assert_eq!(queries.lock().unwrap().as_slice(), ["  war and peace ".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_sources() {
        let engine = engine(vec![
            MockProvider::new(BookSource::GoogleBooks, numbered(BookSource::GoogleBooks, "a", 5)),
            MockProvider::with_failure(BookSource::Gutenberg),
            MockProvider::new(BookSource::OpenLibrary, numbered(BookSource::OpenLibrary, "c", 3)),
        ]);

        let books = engine.aggregate("anything").await;
        assert_eq!(books.len(), 8);

        let outcomes = engine.fan_out("anything").await;
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(outcomes[1].result, Err(ProviderError::ParseError(_))));
        assert!(outcomes[2].result.is_ok());
    }

    #[tokio::test]
    async fn test_all_sources_empty_is_ok() {
        let engine = engine(vec![
            MockProvider::new(BookSource::GoogleBooks, vec![]),
            MockProvider::with_failure(BookSource::Gutenberg),
            MockProvider::new(BookSource::OpenLibrary, vec![]),
        ]);

        let results = engine.search(&SearchQuery::new("zzzz", None, None)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_concatenation_follows_provider_order_not_completion_order() {
        let engine = engine(vec![
            MockProvider::new(BookSource::GoogleBooks, numbered(BookSource::GoogleBooks, "a", 1))
                .with_delay(Duration::from_millis(50)),
            MockProvider::new(BookSource::Gutenberg, numbered(BookSource::Gutenberg, "b", 1)),
            MockProvider::new(BookSource::OpenLibrary, numbered(BookSource::OpenLibrary, "c", 1)),
        ]);

        let books = engine.aggregate("x").await;
        let sources: Vec<BookSource> = books.iter().map(|b| b.source).collect();
        assert_eq!(
            sources,
            vec![BookSource::GoogleBooks, BookSource::Gutenberg, BookSource::OpenLibrary]
        );
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_without_blocking_others() {
        let providers: Vec<Box<dyn BookProvider>> = vec![
            Box::new(MockProvider::new(
                BookSource::GoogleBooks,
                numbered(BookSource::GoogleBooks, "a", 2),
            )),
            Box::new(
                MockProvider::new(BookSource::Gutenberg, numbered(BookSource::Gutenberg, "b", 2))
                    .with_delay(Duration::from_secs(30)),
            ),
        ];
        let engine =
            BookSearchEngine::new(providers, Duration::from_millis(100), MoodTerms::default());

        let start = Instant::now();
        let outcomes = engine.fan_out("x").await;
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(matches!(outcomes[1].result, Err(ProviderError::Timeout)));

        let books = engine.aggregate("x").await;
        assert_eq!(books.len(), 2);
    }

    #[tokio::test]
    async fn test_end_to_end_meditation_scenario() {
        let mut gutenberg = create_test_book(BookSource::Gutenberg, "1", "Meditations", 4.0);
        gutenberg.pdf_url = Some("https://www.gutenberg.org/files/2680/2680.pdf".to_string());

        let engine = engine(vec![
            MockProvider::new(
                BookSource::GoogleBooks,
                vec![
                    create_test_book(BookSource::GoogleBooks, "g1", "Meditation Basics", 4.5),
                    create_test_book(BookSource::GoogleBooks, "g2", "Daily Practice", 3.0),
                ],
            ),
            MockProvider::new(BookSource::Gutenberg, vec![gutenberg]),
            MockProvider::new(
                BookSource::OpenLibrary,
                vec![create_test_book(BookSource::OpenLibrary, "OL1W", "Stillness", 3.8)],
            ),
        ]);

        let results = engine
            .search(&SearchQuery::new("meditation", None, None))
            .await
            .unwrap();

        // Rating descending applies across non-Gutenberg catalogs, so the
        // Open Library default (3.8) outranks the 3.0 Google volume.
        let ids: Vec<&str> = results.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["gutenberg-1", "google-g1", "openlibrary-OL1W", "google-g2"]
        );
        assert_eq!(results.len(), 4);
        assert!(results[0].pdf_url.is_some());
    }

    #[tokio::test]
    async fn test_duplicates_across_sources_keep_first() {
        let engine = engine(vec![
            MockProvider::new(
                BookSource::GoogleBooks,
                vec![create_test_book(BookSource::GoogleBooks, "g1", "The Hobbit!", 4.7)],
            ),
            MockProvider::new(
                BookSource::Gutenberg,
                vec![create_test_book(BookSource::Gutenberg, "5", "the hobbit", 4.0)],
            ),
            MockProvider::new(BookSource::OpenLibrary, vec![]),
        ]);

        let results = engine.search(&SearchQuery::new("hobbit", None, None)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "google-g1");
    }

    #[tokio::test]
    async fn test_results_bounded_to_limit() {
        let engine = engine(vec![
            MockProvider::new(BookSource::GoogleBooks, numbered(BookSource::GoogleBooks, "a", 20)),
            MockProvider::new(BookSource::Gutenberg, numbered(BookSource::Gutenberg, "b", 10)),
            MockProvider::new(BookSource::OpenLibrary, numbered(BookSource::OpenLibrary, "c", 15)),
        ]);

        let results = engine.search(&SearchQuery::new("x", None, None)).await.unwrap();
        assert_eq!(results.len(), 24);
        assert!(results[..10].iter().all(|b| b.source == BookSource::Gutenberg));

        let results = engine.search(&SearchQuery::new("x", None, Some(5))).await.unwrap();
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn test_mood_keyword_reaches_providers() {
        let provider = MockProvider::new(BookSource::GoogleBooks, vec![]);
        let queries = Arc::clone(&provider.queries);
        let engine = engine(vec![provider]);

        engine
            .search(&SearchQuery::new("Calm/Peaceful", Some(MoodKey::Calm), None))
            .await
            .unwrap();
        engine.search(&SearchQuery::new("poetry", None, None)).await.unwrap();

        let seen = queries.lock().unwrap().clone();
        assert_eq!(seen, vec!["Calm/Peaceful mindfulness".to_string(), "poetry".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_query_rejected_without_network() {
        let provider = MockProvider::new(BookSource::GoogleBooks, vec![]);
        let queries = Arc::clone(&provider.queries);
        let engine = engine(vec![provider]);

        let result = engine.search(&SearchQuery::new("   ", None, None)).await;
        assert!(matches!(result, Err(QueryError::InvalidQuery(_))));
        assert!(queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_records_dropped() {
        let mut linkless = create_test_book(BookSource::GoogleBooks, "x", "No Link", 4.0);
        linkless.info_link = None;
        let engine = engine(vec![MockProvider::new(
            BookSource::GoogleBooks,
            vec![linkless, create_test_book(BookSource::GoogleBooks, "y", "Linked", 4.0)],
        )]);

        let books = engine.aggregate("x").await;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "google-y");
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = QueryError::Other("dns error: no such host".to_string());
        assert_eq!(err.user_message(), SEARCH_FAILED_MESSAGE);
    }

    #[test]
    fn test_from_config_uses_fixed_order() {
        let engine = BookSearchEngine::from_config(&SearchConfig::default()).unwrap();
        assert_eq!(
            engine.sources(),
            vec![BookSource::GoogleBooks, BookSource::Gutenberg, BookSource::OpenLibrary]
        );
    }
}
