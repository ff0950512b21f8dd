//! Open Library provider.
//!
//! Queries `/search.json`. Docs carry no ratings; cover images are derived
//! from the numeric `cover_i` field, and the edition count is exposed as
//! `editions`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{BookProvider, CatalogClient, ProviderResult};
use crate::config::SearchConfig;
use crate::models::{Book, BookSource};

/// Rating assigned to every Open Library record.
pub const OPEN_LIBRARY_RATING: f32 = 3.8;

const DEFAULT_CATEGORY: &str = "Literature";
const DEFAULT_DESCRIPTION: &str = "Classic literature from Open Library.";
const DEFAULT_LANGUAGE: &str = "en";
const WORKS_PREFIX: &str = "/works/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    docs: Option<Vec<Doc>>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    key: Option<String>,
    title: Option<String>,
    author_name: Option<Vec<String>>,
    first_sentence: Option<Vec<String>>,
    cover_i: Option<i64>,
    subject: Option<Vec<String>>,
    first_publish_year: Option<i32>,
    edition_count: Option<u64>,
    isbn: Option<Vec<String>>,
    publisher: Option<Vec<String>>,
    language: Option<Vec<String>>,
}

/// Provider for the Open Library search API.
#[derive(Debug, Clone)]
pub struct OpenLibraryProvider {
    client: CatalogClient,
    base_url: String,
    covers_url: String,
    limit: usize,
}

impl OpenLibraryProvider {
    /// Create a provider.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `base_url` - Open Library base URL; also used to build record links
    /// * `covers_url` - Cover image service base URL
    /// * `limit` - Value sent as `limit`
    pub fn new(
        client: CatalogClient,
        base_url: impl Into<String>,
        covers_url: impl Into<String>,
        limit: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            covers_url: covers_url.into().trim_end_matches('/').to_string(),
            limit,
        }
    }

    pub fn from_config(client: CatalogClient, config: &SearchConfig) -> Self {
        Self::new(
            client,
            config.open_library_url.clone(),
            config.covers_url.clone(),
            config.open_library_limit,
        )
    }

    fn cover_url(&self, cover_id: i64) -> String {
        format!("{}/b/id/{}-M.jpg", self.covers_url, cover_id)
    }

    fn map_response(&self, response: SearchResponse) -> Vec<Book> {
        response
            .docs
            .unwrap_or_default()
            .into_iter()
            .filter_map(|doc| self.map_doc(doc))
            .collect()
    }

    fn map_doc(&self, doc: Doc) -> Option<Book> {
        let key = doc.key.filter(|k| !k.is_empty())?;
        let native_id = key.trim_start_matches(WORKS_PREFIX);
        let link = format!("{}{}", self.base_url, key);
        let editions = doc.edition_count;

        let mut book = Book::new(
            BookSource::OpenLibrary,
            native_id,
            doc.title,
            doc.author_name.unwrap_or_default(),
            DEFAULT_CATEGORY,
        )
        .with_categories(doc.subject.unwrap_or_default().into_iter().take(3).collect())
        .with_rating(OPEN_LIBRARY_RATING, editions.unwrap_or(0));

        book.description = doc
            .first_sentence
            .map(|s| s.join(" "))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        book.thumbnail = doc.cover_i.map(|id| self.cover_url(id));
        book.published_date = doc.first_publish_year.map(|y| y.to_string());
        book.preview_link = Some(link.clone());
        book.info_link = Some(link);
        book.isbn = doc.isbn.and_then(|v| v.into_iter().next());
        book.publisher = doc.publisher.and_then(|v| v.into_iter().next());
        book.language = Some(
            doc.language
                .and_then(|v| v.into_iter().next())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        );
        book.editions = editions;

        Some(book)
    }
}

#[async_trait]
impl BookProvider for OpenLibraryProvider {
    async fn search(&self, query: &str) -> ProviderResult<Vec<Book>> {
        let url = format!("{}/search.json", self.base_url);
        let params = [("q", query.to_string()), ("limit", self.limit.to_string())];
        let response: SearchResponse = self.client.get_json(&url, &params).await?;
        let books = self.map_response(response);
        debug!(count = books.len(), "open library mapped");
        Ok(books)
    }

    fn source(&self) -> BookSource {
        BookSource::OpenLibrary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::fixture::serve_once;
    use std::time::Duration;

    fn provider() -> OpenLibraryProvider {
        let client = CatalogClient::new(Duration::from_secs(1), "test").unwrap();
        OpenLibraryProvider::new(
            client,
            "https://openlibrary.org/",
            "https://covers.openlibrary.org",
            15,
        )
    }

    fn parse(json: &str) -> Vec<Book> {
        let p = provider();
        p.map_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_maps_doc() {
        let books = parse(
            r#"{
                "numFound": 1,
                "docs": [{
                    "key": "/works/OL27448W",
                    "title": "The Lord of the Rings",
                    "author_name": ["J.R.R. Tolkien"],
                    "first_sentence": ["This book is largely concerned", "with Hobbits."],
                    "cover_i": 9255566,
                    "subject": ["Fantasy", "Fiction", "Middle Earth", "Quests"],
                    "first_publish_year": 1954,
                    "edition_count": 120,
                    "isbn": ["9780618640157"],
                    "publisher": ["Houghton Mifflin"],
                    "language": ["eng"]
                }]
            }"#,
        );

        let book = &books[0];
        assert_eq!(book.id, "openlibrary-OL27448W");
        assert_eq!(
            book.thumbnail.as_deref(),
            Some("https://covers.openlibrary.org/b/id/9255566-M.jpg")
        );
        assert_eq!(
            book.description,
            "This book is largely concerned with Hobbits."
        );
        assert_eq!(book.categories.len(), 3);
        assert_eq!(book.average_rating, OPEN_LIBRARY_RATING);
        assert_eq!(book.ratings_count, 120);
        assert_eq!(book.editions, Some(120));
        assert_eq!(book.published_date.as_deref(), Some("1954"));
        assert_eq!(
            book.info_link.as_deref(),
            Some("https://openlibrary.org/works/OL27448W")
        );
        assert_eq!(book.language.as_deref(), Some("eng"));
        assert!(book.pdf_url.is_none());
    }

    #[test]
    fn test_sparse_doc_defaults() {
        let books = parse(r#"{"docs": [{"key": "/works/OL1W"}]}"#);
        let book = &books[0];
        assert!(book.thumbnail.is_none());
        assert_eq!(book.description, DEFAULT_DESCRIPTION);
        assert_eq!(book.categories, vec![DEFAULT_CATEGORY.to_string()]);
        assert_eq!(book.language.as_deref(), Some("en"));
        assert_eq!(book.ratings_count, 0);
        assert!(book.is_valid());
    }

    #[test]
    fn test_doc_without_key_skipped() {
        let books = parse(r#"{"docs": [{"title": "Orphan"}, {"key": "/works/OL2W"}]}"#);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "openlibrary-OL2W");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = CatalogClient::new(Duration::from_secs(2), "test").unwrap();
        let provider =
            OpenLibraryProvider::new(client, "http://127.0.0.1:9", "http://127.0.0.1:9", 15);
        let result = provider.search("hobbit").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_search_hits_search_json_with_limit() {
        let body = r#"{"docs": [{"key": "/works/OL27482W", "title": "The Hobbit"}]}"#;
        let (base, request) = serve_once("200 OK", body).await;
        let client = CatalogClient::new(Duration::from_secs(5), "moodsync-test").unwrap();
        let config = SearchConfig {
            open_library_url: format!("{}/", base),
            ..SearchConfig::default()
        };

        let books = OpenLibraryProvider::from_config(client, &config)
            .search("the hobbit")
            .await
            .unwrap();

        assert_eq!(
            request.await.unwrap(),
            "GET /search.json?q=the+hobbit&limit=15 HTTP/1.1"
        );
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "openlibrary-OL27482W");
        assert_eq!(
            books[0].info_link.as_deref(),
            Some(format!("{}/works/OL27482W", base).as_str())
        );
    }
}
