//! Application screens as an explicit state machine.

use serde::Serialize;

use crate::mood::QUIZ_LENGTH;

/// Screen currently shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "kebab-case")]
pub enum Screen {
    /// Pick between music and books
    #[default]
    Choice,

    /// Mood quiz in progress
    MoodQuestions { answered: usize },

    /// Mood and suggested tracks
    MoodResult,

    /// Book search form
    BookSearch,

    /// Ranked search results
    BookResults,

    /// Details of the result at `index`
    BookDetails { index: usize },
}

/// Discrete user or system event driving screen changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ChooseMusic,
    ChooseBooks,
    /// One quiz answer was recorded
    AnswerRecorded,
    /// Mood analysis finished for a complete quiz
    MoodAnalyzed,
    /// A search finished and its results were accepted
    ResultsReady,
    SelectBook(usize),
    Back,
    Reset,
}

impl Screen {
    /// Next screen after `event`. Events with no transition from the current
    /// screen leave it unchanged.
    pub fn on(self, event: Event) -> Screen {
        use Event::*;
        use Screen::*;

        match (self, event) {
            (_, Reset) => Choice,

            (Choice, ChooseMusic) => MoodQuestions { answered: 0 },
            (Choice, ChooseBooks) => BookSearch,

            (MoodQuestions { answered }, AnswerRecorded) if answered < QUIZ_LENGTH => {
                MoodQuestions { answered: answered + 1 }
            }
            (MoodQuestions { answered }, MoodAnalyzed) if answered == QUIZ_LENGTH => MoodResult,

            (BookSearch | BookResults | BookDetails { .. }, ResultsReady) => BookResults,
            (BookResults, SelectBook(index)) => BookDetails { index },

            (BookDetails { .. }, Back) => BookResults,
            (BookResults, Back) => BookSearch,
            (MoodQuestions { .. } | MoodResult | BookSearch, Back) => Choice,

            (screen, _) => screen,
        }
    }

    /// Whether the quiz has all its answers.
    pub fn quiz_complete(&self) -> bool {
        matches!(self, Screen::MoodQuestions { answered } if *answered == QUIZ_LENGTH)
    }
}
