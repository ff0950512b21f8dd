//! Caller-side search session.
//!
//! Owns the busy indicator and decides which search result gets displayed.
//! A new search does not cancel one already in flight; instead every search
//! takes a ticket and only the most recently issued one is accepted.

pub mod state;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Book;
use crate::mood::MoodKey;
use crate::query::{SearchEngine, SearchQuery};

pub use state::{Event, Screen};

/// Error shown to the user when a search fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SessionError(pub String);

/// Outcome of a search issued through a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results of the latest search
    Accepted(Vec<Book>),

    /// A newer search started before this one finished; discard
    Superseded,
}

/// Marks the session busy for as long as it is alive.
///
/// Acquired before fan-out and released exactly once when dropped, on
/// success, failure or cancellation alike.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wraps a search engine with busy tracking and last-write-wins results.
pub struct SearchSession<E: SearchEngine> {
    engine: E,
    in_flight: AtomicUsize,
    latest_ticket: AtomicU64,
}

impl<E: SearchEngine> SearchSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            in_flight: AtomicUsize::new(0),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Whether any search is still running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn acquire(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            in_flight: &self.in_flight,
        }
    }

    /// Run a search and accept its result only if it is still the latest.
    ///
    /// # Errors
    /// Returns `SessionError` carrying a user-facing message if the latest
    /// search fails. Failures of superseded searches are not reported.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchOutcome, SessionError> {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let result = {
            let _guard = self.acquire();
            self.engine.search(query).await
        };

        if self.latest_ticket.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "discarding superseded search");
            return Ok(SearchOutcome::Superseded);
        }

        match result {
            Ok(books) => Ok(SearchOutcome::Accepted(books)),
            Err(e) => {
                warn!(error = %e, "search failed");
                Err(SessionError(e.user_message()))
            }
        }
    }

    /// Search for books matching a mood category.
    ///
    /// Uses the category's display name as the query text, augmented with the
    /// mood keyword.
    pub async fn search_mood(
        &self,
        mood: MoodKey,
        limit: Option<usize>,
    ) -> Result<SearchOutcome, SessionError> {
        let query = SearchQuery::new(mood.category().name, Some(mood), limit);
        self.search(&query).await
    }
}
