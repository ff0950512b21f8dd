//! Project Gutenberg provider (via the Gutendex API).
//!
//! Gutenberg is the only catalog offering free downloadable files, so it is
//! the only provider that fills `pdf_url`, `epub_url`, `text_url` and
//! `download_count`. Results are capped well below the page size because the
//! same classic texts tend to appear many times over.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{BookProvider, CatalogClient, ProviderResult};
use crate::config::SearchConfig;
use crate::models::{Book, BookSource};

/// Rating assigned to every Gutenberg record; the catalog has no ratings
/// and its works are curated classics.
pub const GUTENBERG_RATING: f32 = 4.0;

const DEFAULT_CATEGORY: &str = "Literature";
const DESCRIPTION_PREFIX: &str = "Free public domain book from Project Gutenberg.";
const EBOOK_LINK_BASE: &str = "https://www.gutenberg.org/ebooks/";

const MIME_PDF: &str = "application/pdf";
const MIME_EPUB: &str = "application/epub+zip";
const MIME_TEXT: &str = "text/plain";

#[derive(Debug, Deserialize)]
struct BooksResponse {
    results: Option<Vec<GutendexBook>>,
}

#[derive(Debug, Deserialize)]
struct GutendexBook {
    id: u64,
    title: Option<String>,
    authors: Option<Vec<Person>>,
    subjects: Option<Vec<String>>,
    languages: Option<Vec<String>>,
    formats: Option<BTreeMap<String, String>>,
    download_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Person {
    name: Option<String>,
}

/// Provider for the Gutendex book search API.
#[derive(Debug, Clone)]
pub struct GutenbergProvider {
    client: CatalogClient,
    endpoint: String,
    limit: usize,
}

impl GutenbergProvider {
    /// Create a provider.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `endpoint` - Gutendex `/books` endpoint URL
    /// * `limit` - Maximum number of results kept from a response
    pub fn new(client: CatalogClient, endpoint: impl Into<String>, limit: usize) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            limit,
        }
    }

    pub fn from_config(client: CatalogClient, config: &SearchConfig) -> Self {
        Self::new(client, config.gutenberg_url.clone(), config.gutenberg_limit)
    }
}

#[async_trait]
impl BookProvider for GutenbergProvider {
    async fn search(&self, query: &str) -> ProviderResult<Vec<Book>> {
        let params = [
            ("search", query.to_string()),
            ("mime_type", MIME_PDF.to_string()),
        ];
        let response: BooksResponse = self.client.get_json(&self.endpoint, &params).await?;
        let books = map_response(response, self.limit);
        debug!(count = books.len(), "gutenberg mapped");
        Ok(books)
    }

    fn source(&self) -> BookSource {
        BookSource::Gutenberg
    }
}

fn map_response(response: BooksResponse, limit: usize) -> Vec<Book> {
    response
        .results
        .unwrap_or_default()
        .into_iter()
        .take(limit)
        .map(map_book)
        .collect()
}

fn map_book(item: GutendexBook) -> Book {
    let authors = item
        .authors
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.name)
        .collect();
    let subjects = item.subjects.unwrap_or_default();
    let formats = item.formats.unwrap_or_default();
    let download_count = item.download_count.unwrap_or(0);
    let native_id = item.id.to_string();

    let description = format!(
        "{} {}",
        DESCRIPTION_PREFIX,
        subjects.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
    )
    .trim_end()
    .to_string();

    let link = format!("{}{}", EBOOK_LINK_BASE, native_id);

    let mut book = Book::new(
        BookSource::Gutenberg,
        &native_id,
        item.title,
        authors,
        DEFAULT_CATEGORY,
    )
    .with_categories(subjects.into_iter().take(2).collect())
    .with_rating(GUTENBERG_RATING, download_count);

    book.description = description;
    book.preview_link = Some(link.clone());
    book.info_link = Some(link);
    book.pdf_url = formats.get(MIME_PDF).cloned();
    book.epub_url = formats.get(MIME_EPUB).cloned();
    book.text_url = formats.get(MIME_TEXT).cloned().or_else(|| {
        formats
            .iter()
            .find(|(mime, _)| mime.starts_with(MIME_TEXT))
            .map(|(_, url)| url.clone())
    });
    book.download_count = item.download_count;
    book.language = item.languages.unwrap_or_default().into_iter().next();

    book
}
