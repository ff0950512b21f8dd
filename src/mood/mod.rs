//! Mood categories, quiz classification and mood-driven query terms.
//!
//! A mood key is produced by the mood analysis service (or the local
//! [`classify`] rule) and is used for two things: fetching tracks, and
//! augmenting a book search with a keyword representative of the mood.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of questions in the mood quiz.
pub const QUIZ_LENGTH: usize = 5;

/// Answer value used for a missing energy or stress answer.
const NEUTRAL_ANSWER: u8 = 3;

/// Enumerated mood tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MoodKey {
    Anxious,
    Stressed,
    Melancholic,
    Calm,
    Upbeat,
    Balanced,
}

impl MoodKey {
    /// All moods in display order.
    pub const ALL: [MoodKey; 6] = [
        MoodKey::Anxious,
        MoodKey::Stressed,
        MoodKey::Melancholic,
        MoodKey::Calm,
        MoodKey::Upbeat,
        MoodKey::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodKey::Anxious => "anxious",
            MoodKey::Stressed => "stressed",
            MoodKey::Melancholic => "melancholic",
            MoodKey::Calm => "calm",
            MoodKey::Upbeat => "upbeat",
            MoodKey::Balanced => "balanced",
        }
    }

    /// Display metadata for this mood.
    pub fn category(&self) -> MoodCategory {
        let (name, description) = match self {
            MoodKey::Anxious => (
                "Anxious/Overwhelmed",
                "Feeling worried, stressed, or overwhelmed",
            ),
            MoodKey::Stressed => ("Stressed/Tired", "Feeling pressured or fatigued"),
            MoodKey::Melancholic => (
                "Melancholic/Reflective",
                "Feeling contemplative or slightly sad",
            ),
            MoodKey::Calm => ("Calm/Peaceful", "Feeling serene and at peace"),
            MoodKey::Upbeat => ("Upbeat/Positive", "Feeling energetic and positive"),
            MoodKey::Balanced => ("Balanced/Neutral", "Feeling centered and balanced"),
        };
        MoodCategory {
            key: *self,
            name,
            description,
        }
    }
}

impl fmt::Display for MoodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mood key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mood: {0}")]
pub struct UnknownMood(pub String);

impl FromStr for MoodKey {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MoodKey::ALL
            .into_iter()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Display metadata for a mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoodCategory {
    pub key: MoodKey,

    /// Display name, e.g. "Calm/Peaceful"
    pub name: &'static str,

    pub description: &'static str,
}

/// Mood-to-keyword table used to augment book searches.
///
/// Each mood maps to a list of keywords; the first entry is the
/// representative one. A mood without an entry (or with an empty list)
/// simply gets no augmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodTerms {
    terms: HashMap<MoodKey, Vec<String>>,
}

impl MoodTerms {
    /// Create a table with no keywords at all.
    pub fn empty() -> Self {
        Self {
            terms: HashMap::new(),
        }
    }

    /// Set the keywords for a mood, replacing any existing ones.
    pub fn with(mut self, mood: MoodKey, keywords: &[&str]) -> Self {
        self.terms
            .insert(mood, keywords.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Representative keyword for a mood, if one is configured.
    pub fn keyword_for(&self, mood: MoodKey) -> Option<&str> {
        self.terms
            .get(&mood)
            .and_then(|keywords| keywords.iter().find(|k| !k.trim().is_empty()))
            .map(|k| k.trim())
    }
}

impl Default for MoodTerms {
    fn default() -> Self {
        Self::empty()
            .with(MoodKey::Anxious, &["anxiety"])
            .with(MoodKey::Stressed, &["stress relief"])
            .with(MoodKey::Melancholic, &["hope"])
            .with(MoodKey::Calm, &["mindfulness"])
            .with(MoodKey::Upbeat, &["happiness"])
            .with(MoodKey::Balanced, &["self-help"])
    }
}

/// Build the search string sent to the catalogs.
///
/// With a mood that has a configured keyword the result is
/// `"<base> <keyword>"`; otherwise `base` is returned unchanged.
pub fn derive_search_term(base: &str, mood: Option<MoodKey>, terms: &MoodTerms) -> String {
    match mood.and_then(|m| terms.keyword_for(m)) {
        Some(keyword) => format!("{} {}", base, keyword),
        None => base.to_string(),
    }
}

/// Classify quiz answers into a mood.
///
/// Answers are ordered energy, stress, emotion, need, focus, each 1-5.
/// Missing energy or stress answers count as neutral. An empty slice is
/// classified as balanced.
pub fn classify(answers: &[u8]) -> MoodKey {
    if answers.is_empty() {
        return MoodKey::Balanced;
    }

    let energy = answers.first().copied().unwrap_or(NEUTRAL_ANSWER);
    let stress = answers.get(1).copied().unwrap_or(NEUTRAL_ANSWER);
    let mean = answers.iter().map(|&a| f32::from(a)).sum::<f32>() / answers.len() as f32;

    if stress >= 4 && energy <= 2 {
        MoodKey::Anxious
    } else if stress >= 3 && energy <= 3 {
        MoodKey::Stressed
    } else if mean <= 2.5 {
        MoodKey::Melancholic
    } else if mean >= 4.0 && stress <= 2 {
        MoodKey::Upbeat
    } else if mean >= 3.5 && stress <= 2 {
        MoodKey::Calm
    } else {
        MoodKey::Balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_search_term_with_mood() {
        let terms = MoodTerms::default();
        let term = derive_search_term("Calm/Peaceful", Some(MoodKey::Calm), &terms);
        assert_eq!(term, "Calm/Peaceful mindfulness");
    }

    #[test]
    fn test_derive_search_term_without_mood() {
        let terms = MoodTerms::default();
        assert_eq!(derive_search_term("x", None, &terms), "x");
    }

    #[test]
    fn test_missing_keyword_is_passthrough() {
        let terms = MoodTerms::empty().with(MoodKey::Upbeat, &[]);
        assert_eq!(derive_search_term("poetry", Some(MoodKey::Calm), &terms), "poetry");
        assert_eq!(derive_search_term("poetry", Some(MoodKey::Upbeat), &terms), "poetry");
    }

    #[test]
    fn test_every_mood_has_default_keyword() {
        let terms = MoodTerms::default();
        for mood in MoodKey::ALL {
            assert!(terms.keyword_for(mood).is_some(), "no keyword for {}", mood);
        }
    }

    #[test]
    fn test_mood_terms_from_json() {
        let terms: MoodTerms =
            serde_json::from_str(r#"{"calm": ["nature writing", "zen"]}"#).unwrap();
        assert_eq!(terms.keyword_for(MoodKey::Calm), Some("nature writing"));
        assert_eq!(terms.keyword_for(MoodKey::Anxious), None);
    }

    #[test]
    fn test_parse_mood_key() {
        assert_eq!("calm".parse::<MoodKey>(), Ok(MoodKey::Calm));
        assert_eq!(" Upbeat ".parse::<MoodKey>(), Ok(MoodKey::Upbeat));
        assert!("grumpy".parse::<MoodKey>().is_err());
    }

    #[test]
    fn test_category_names() {
        assert_eq!(MoodKey::Calm.category().name, "Calm/Peaceful");
        assert_eq!(MoodKey::Anxious.category().name, "Anxious/Overwhelmed");
    }

    #[test]
    fn test_classify_rules() {
        assert_eq!(classify(&[1, 5, 3, 3, 3]), MoodKey::Anxious);
        assert_eq!(classify(&[3, 3, 3, 3, 3]), MoodKey::Stressed);
        assert_eq!(classify(&[4, 1, 1, 2, 2]), MoodKey::Melancholic);
        assert_eq!(classify(&[5, 1, 5, 5, 5]), MoodKey::Upbeat);
        assert_eq!(classify(&[4, 2, 4, 3, 5]), MoodKey::Calm);
        assert_eq!(classify(&[4, 3, 3, 3, 3]), MoodKey::Balanced);
    }

    #[test]
    fn test_classify_missing_answers() {
        // energy 2 with neutral stress -> stressed
        assert_eq!(classify(&[2]), MoodKey::Stressed);
        assert_eq!(classify(&[]), MoodKey::Balanced);
    }
}
