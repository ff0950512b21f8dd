//! Core data models for the mood-driven book search system.
//!
//! This module contains the unified `Book` record that every catalog adapter
//! produces, the tag identifying which catalog a record came from, and the
//! music track reference returned by the recommendation service.

use serde::{Deserialize, Serialize};

/// Title used when a catalog omits one.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Author used when a catalog omits the author list.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Catalog that produced a `Book`.
///
/// The declaration order matches the fixed fan-out order used when merging
/// results from all catalogs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookSource {
    /// Google Books: rich volume metadata with real ratings
    #[serde(rename = "google")]
    GoogleBooks,

    /// Project Gutenberg via Gutendex: public-domain works with downloads
    Gutenberg,

    /// Open Library: bibliographic union catalog with edition counts
    OpenLibrary,
}

impl BookSource {
    /// Short tag used as the id prefix and in serialized output.
    pub fn tag(&self) -> &'static str {
        match self {
            BookSource::GoogleBooks => "google",
            BookSource::Gutenberg => "gutenberg",
            BookSource::OpenLibrary => "openlibrary",
        }
    }

    /// Human-readable catalog name.
    pub fn display_name(&self) -> &'static str {
        match self {
            BookSource::GoogleBooks => "Google Books",
            BookSource::Gutenberg => "Project Gutenberg",
            BookSource::OpenLibrary => "Open Library",
        }
    }

    /// Ranking tier; lower sorts first.
    ///
    /// Gutenberg records are the only ones guaranteed to carry a free
    /// downloadable file, so they occupy the top tier on their own.
    pub fn priority(&self) -> u8 {
        match self {
            BookSource::Gutenberg => 0,
            BookSource::GoogleBooks | BookSource::OpenLibrary => 1,
        }
    }

    /// Build a collision-free record id for this catalog.
    pub fn make_id(&self, native_id: &str) -> String {
        format!("{}-{}", self.tag(), native_id)
    }
}

impl std::fmt::Display for BookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Unified book record shared by every stage after the adapters.
///
/// Records are built once by an adapter and never mutated afterwards. The
/// constructor enforces the invariants the rest of the pipeline relies on:
/// a non-empty title, at least one author, at least one category, and a
/// rating inside `[0, 5]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Source-prefixed identifier, unique within one search response
    pub id: String,

    /// Book title
    pub title: String,

    /// Authors in catalog order
    pub authors: Vec<String>,

    /// Catalog description or a generated fallback sentence
    pub description: String,

    /// Cover image URL
    pub thumbnail: Option<String>,

    /// Subject tags
    pub categories: Vec<String>,

    /// Publication date or year as reported by the catalog
    pub published_date: Option<String>,

    /// Page count (Google Books only)
    pub page_count: Option<u32>,

    /// Rating in `[0, 5]`; catalogs without ratings supply a fixed default
    pub average_rating: f32,

    /// Number of ratings, 0 when unknown
    pub ratings_count: u64,

    /// Catalog that produced this record
    pub source: BookSource,

    pub preview_link: Option<String>,
    pub info_link: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epub_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editions: Option<u64>,
}

impl Book {
    /// Create a record with the required fields and sentinel defaults.
    ///
    /// # Arguments
    /// * `source` - Catalog producing the record
    /// * `native_id` - Catalog-native identifier (prefixed with the source tag)
    /// * `title` - Title, replaced by [`UNKNOWN_TITLE`] when missing or blank
    /// * `authors` - Author names; blanks are dropped and an empty list becomes
    ///   [`UNKNOWN_AUTHOR`]
    /// * `default_category` - Tag used until categories are supplied
    pub fn new(
        source: BookSource,
        native_id: &str,
        title: Option<String>,
        authors: Vec<String>,
        default_category: &str,
    ) -> Self {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let mut authors: Vec<String> = authors
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect();
        if authors.is_empty() {
            authors.push(UNKNOWN_AUTHOR.to_string());
        }

        Self {
            id: source.make_id(native_id),
            title,
            authors,
            description: String::new(),
            thumbnail: None,
            categories: vec![default_category.to_string()],
            published_date: None,
            page_count: None,
            average_rating: 0.0,
            ratings_count: 0,
            source,
            preview_link: None,
            info_link: None,
            pdf_url: None,
            epub_url: None,
            text_url: None,
            download_count: None,
            isbn: None,
            publisher: None,
            language: None,
            editions: None,
        }
    }

    /// Replace the categories, keeping the default when `categories` is empty.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        let categories: Vec<String> = categories
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        if !categories.is_empty() {
            self.categories = categories;
        }
        self
    }

    /// Set the rating, clamped into `[0, 5]`. Non-finite values become 0.
    pub fn with_rating(mut self, rating: f32, count: u64) -> Self {
        self.average_rating = clamp_rating(rating);
        self.ratings_count = count;
        self
    }

    /// Whether the record is a free public-domain download.
    pub fn is_free(&self) -> bool {
        self.source == BookSource::Gutenberg
    }

    /// Link to open the book online, preferring the info page.
    pub fn online_link(&self) -> Option<&str> {
        self.info_link
            .as_deref()
            .or(self.preview_link.as_deref())
    }

    /// Whether the record satisfies the invariants required downstream.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.authors.is_empty() && self.online_link().is_some()
    }
}

// Negative zero maps to 0.0 so equal ratings rank as equal under `total_cmp`.
fn clamp_rating(rating: f32) -> f32 {
    if rating.is_finite() && rating > 0.0 {
        rating.min(5.0)
    } else {
        0.0
    }
}

/// A playable track reference from the recommendation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: Option<String>,

    /// Track name
    #[serde(default = "default_track_name")]
    pub name: String,

    /// Comma-separated artist names
    #[serde(default)]
    pub artist: String,

    /// Album cover URL, empty when unavailable
    #[serde(default, rename = "albumArt")]
    pub album_art: String,

    /// Link to the track on the streaming service
    #[serde(default)]
    pub external_url: String,
}

fn default_track_name() -> String {
    "Unknown".to_string()
}
