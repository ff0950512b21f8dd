//! MoodSync - mood-driven book search across public catalogs.
//!
//! This library fans a free-text query out to several independent book
//! catalogs, optionally augmented with a keyword derived from the reader's
//! mood, and merges the answers into one deduplicated, ranked page of books.
//!
//! # Architecture
//!
//! The system is organized into several key modules:
//!
//! - **models**: Core data structures (Book, BookSource, Track)
//! - **mood**: Mood categories, quiz classification and search-term derivation
//! - **provider**: Catalog adapters (Google Books, Gutenberg, Open Library)
//! - **query**: Fan-out aggregation, deduplication, ranking and bounding
//! - **session**: Busy tracking, last-write-wins results and screen states
//! - **service**: Clients for the mood analysis and track services
//! - **config**: Endpoints, limits and mood keywords
//!
//! # Workflow
//!
//! 1. Derive the search term from the query and the optional mood
//! 2. Query every catalog concurrently, each under its own timeout
//! 3. Concatenate results in catalog order; failed catalogs add nothing
//! 4. Deduplicate by normalized title (first occurrence wins)
//! 5. Rank free Gutenberg books first, then by rating
//! 6. Return at most one page of results
//!
//! # Example
//!
//! ```ignore
//! use moodsync::{BookSearchEngine, MoodKey, SearchConfig, SearchEngine, SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = BookSearchEngine::from_config(&SearchConfig::default())?;
//!
//!     let query = SearchQuery::new("walden", Some(MoodKey::Calm), None);
//!     let books = engine.search(&query).await?;
//!
//!     for book in books {
//!         println!("{} ({})", book.title, book.source);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Public modules
pub mod config;
pub mod models;
pub mod mood;
pub mod provider;
pub mod query;
pub mod service;
pub mod session;

// Re-export commonly used types at the crate root
pub use config::SearchConfig;
pub use models::{Book, BookSource, Track};
pub use mood::{MoodKey, MoodTerms};
pub use provider::BookProvider;
pub use query::{BookSearchEngine, SearchEngine, SearchQuery};
pub use session::{SearchOutcome, SearchSession};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
