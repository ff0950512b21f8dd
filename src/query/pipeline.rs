//! Post-aggregation stages: deduplication, ranking and bounding.
//!
//! Each stage is a pure function over `Vec<Book>` so it can be tested without
//! any catalog in the loop.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::Book;

/// Normalize a title into its deduplication key.
///
/// Lower-cases the title and removes every character that is neither
/// alphanumeric nor whitespace. Whitespace itself is kept as-is.
///
/// # Example
/// ```
/// use moodsync::query::pipeline::normalize_title;
/// assert_eq!(normalize_title("The Hobbit!"), "the hobbit");
/// ```
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Drop records whose normalized title has already been seen.
///
/// Order-preserving; the first record of each title group wins even if a
/// later duplicate carries richer metadata. Fields are never merged across
/// duplicates.
pub fn dedupe(books: Vec<Book>) -> Vec<Book> {
    let mut seen = HashSet::with_capacity(books.len());
    books
        .into_iter()
        .filter(|book| seen.insert(normalize_title(&book.title)))
        .collect()
}

/// Ranking comparator: source tier first, then rating descending.
pub fn compare(a: &Book, b: &Book) -> Ordering {
    a.source
        .priority()
        .cmp(&b.source.priority())
        .then_with(|| b.average_rating.total_cmp(&a.average_rating))
}

/// Sort records into display order.
///
/// The sort is stable, so records equal under [`compare`] keep their
/// relative input order.
pub fn rank(mut books: Vec<Book>) -> Vec<Book> {
    books.sort_by(compare);
    books
}

/// Keep at most `limit` records, preserving order.
pub fn bound(mut books: Vec<Book>, limit: usize) -> Vec<Book> {
    books.truncate(limit);
    books
}
