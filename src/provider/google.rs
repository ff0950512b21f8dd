//! Google Books provider.
//!
//! Queries the volumes endpoint with `printType=books`. Volumes carry real
//! ratings, ISBNs and publisher data, but no downloadable files.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{BookProvider, CatalogClient, ProviderResult};
use crate::config::SearchConfig;
use crate::models::{Book, BookSource};

const DEFAULT_CATEGORY: &str = "General";
const DEFAULT_DESCRIPTION: &str = "No description available.";
const DEFAULT_LANGUAGE: &str = "en";
const FALLBACK_LINK_BASE: &str = "https://books.google.com/books?id=";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: Option<String>,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    description: Option<String>,
    image_links: Option<ImageLinks>,
    categories: Option<Vec<String>>,
    published_date: Option<String>,
    page_count: Option<u32>,
    average_rating: Option<f32>,
    ratings_count: Option<u64>,
    preview_link: Option<String>,
    info_link: Option<String>,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
    publisher: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    identifier: Option<String>,
}

/// Provider for the Google Books volumes API.
#[derive(Debug, Clone)]
pub struct GoogleBooksProvider {
    client: CatalogClient,
    endpoint: String,
    max_results: usize,
}

impl GoogleBooksProvider {
    /// Create a provider.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `endpoint` - Volumes endpoint URL
    /// * `max_results` - Value sent as `maxResults`
    pub fn new(client: CatalogClient, endpoint: impl Into<String>, max_results: usize) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            max_results,
        }
    }

    pub fn from_config(client: CatalogClient, config: &SearchConfig) -> Self {
        Self::new(
            client,
            config.google_books_url.clone(),
            config.google_books_max_results,
        )
    }
}

#[async_trait]
impl BookProvider for GoogleBooksProvider {
    async fn search(&self, query: &str) -> ProviderResult<Vec<Book>> {
        let params = [
            ("q", query.to_string()),
            ("maxResults", self.max_results.to_string()),
            ("printType", "books".to_string()),
        ];
        let response: VolumesResponse = self.client.get_json(&self.endpoint, &params).await?;
        let books = map_response(response);
        debug!(count = books.len(), "google books mapped");
        Ok(books)
    }

    fn source(&self) -> BookSource {
        BookSource::GoogleBooks
    }
}

/// Absent `items` means no matches.
fn map_response(response: VolumesResponse) -> Vec<Book> {
    response
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(map_volume)
        .collect()
}

fn map_volume(volume: Volume) -> Option<Book> {
    let id = volume.id.filter(|id| !id.is_empty())?;
    let info = volume.volume_info;

    let mut book = Book::new(
        BookSource::GoogleBooks,
        &id,
        info.title,
        info.authors.unwrap_or_default(),
        DEFAULT_CATEGORY,
    )
    .with_categories(info.categories.unwrap_or_default())
    .with_rating(
        info.average_rating.unwrap_or(0.0),
        info.ratings_count.unwrap_or(0),
    );

    book.description = info
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
    book.thumbnail = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail));
    book.published_date = info.published_date;
    book.page_count = info.page_count;
    book.isbn = info
        .industry_identifiers
        .unwrap_or_default()
        .into_iter()
        .find_map(|ident| ident.identifier);
    book.publisher = info.publisher;
    book.language = Some(info.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()));

    if info.preview_link.is_none() && info.info_link.is_none() {
        book.info_link = Some(format!("{}{}", FALLBACK_LINK_BASE, id));
    } else {
        book.preview_link = info.preview_link;
        book.info_link = info.info_link;
    }

    Some(book)
}
