//! Mood analysis and track recommendation clients.
//!
//! Both services are external collaborators. The book search only consumes
//! the mood key they produce; this module provides the client side of the
//! contract plus a local analyzer applying the same classification rule.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::Track;
use crate::mood::{classify, MoodKey, QUIZ_LENGTH};

/// Errors that can occur when talking to the mood service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The service answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    StatusError { status: u16, url: String },

    /// Response body is not the expected JSON shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Quiz answers are missing or out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result of analyzing quiz answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodAnalysis {
    pub mood: MoodKey,

    /// Display name of the mood category, e.g. "Calm/Peaceful"
    pub category_name: String,

    #[serde(default)]
    pub description: String,
}

impl From<MoodKey> for MoodAnalysis {
    fn from(mood: MoodKey) -> Self {
        let category = mood.category();
        Self {
            mood,
            category_name: category.name.to_string(),
            description: category.description.to_string(),
        }
    }
}

/// Turns quiz answers into a mood.
#[async_trait]
pub trait MoodAnalyzer: Send + Sync {
    /// Analyze five 1-5 answers, ordered energy, stress, emotion, need, focus.
    async fn analyze(&self, answers: &[u8]) -> ServiceResult<MoodAnalysis>;
}

/// Suggests music tracks for a mood.
#[async_trait]
pub trait TrackRecommender: Send + Sync {
    async fn tracks(&self, mood: MoodKey) -> ServiceResult<Vec<Track>>;
}

/// Check that a full quiz was answered with values in 1-5.
pub fn validate_answers(answers: &[u8]) -> ServiceResult<()> {
    if answers.len() != QUIZ_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "expected {} answers, got {}",
            QUIZ_LENGTH,
            answers.len()
        )));
    }
    if let Some(bad) = answers.iter().find(|a| !(1..=5).contains(*a)) {
        return Err(ServiceError::InvalidInput(format!(
            "answer {} is outside 1-5",
            bad
        )));
    }
    Ok(())
}

/// In-process analyzer using the rule-based classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMoodAnalyzer;

#[async_trait]
impl MoodAnalyzer for LocalMoodAnalyzer {
    async fn analyze(&self, answers: &[u8]) -> ServiceResult<MoodAnalysis> {
        validate_answers(answers)?;
        Ok(classify(answers).into())
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    answers: &'a [u8],
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// HTTP client for the remote mood service.
#[derive(Debug, Clone)]
pub struct HttpMoodService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMoodService {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    /// Returns `ServiceError::NetworkError` if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        url: &str,
    ) -> ServiceResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::StatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ServiceError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MoodAnalyzer for HttpMoodService {
    async fn analyze(&self, answers: &[u8]) -> ServiceResult<MoodAnalysis> {
        validate_answers(answers)?;
        let url = format!("{}/mood/analyze", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { answers })
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        let analysis: MoodAnalysis = Self::decode(response, &url).await?;
        debug!(mood = %analysis.mood, "mood analyzed");
        Ok(analysis)
    }
}

#[async_trait]
impl TrackRecommender for HttpMoodService {
    async fn tracks(&self, mood: MoodKey) -> ServiceResult<Vec<Track>> {
        let url = format!("{}/music/tracks/{}", self.base_url, mood);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        let body: TracksResponse = Self::decode(response, &url).await?;
        debug!(%mood, count = body.tracks.len(), "tracks fetched");
        Ok(body.tracks)
    }
}
