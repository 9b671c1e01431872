use crate::error::FeedbackError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result for a single letter at a single position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterResult {
    Correct, // Green
    Present, // Yellow
    Absent,  // Gray
}

impl LetterResult {
    /// Parses the `G`/`Y`/`X` notation, case-insensitively.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'G' => Some(Self::Correct),
            'Y' => Some(Self::Present),
            'X' => Some(Self::Absent),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            Self::Correct => 'G',
            Self::Present => 'Y',
            Self::Absent => 'X',
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Correct => "🟩",
            Self::Present => "🟨",
            Self::Absent => "⬜",
        }
    }
}

/// Parses a whole feedback string such as `XYGXX`.
pub fn parse_feedback(feedback: &str) -> Result<Vec<LetterResult>, FeedbackError> {
    feedback
        .trim()
        .chars()
        .map(|c| LetterResult::from_char(c).ok_or(FeedbackError::InvalidCode(c)))
        .collect()
}

/// A submitted word together with the feedback it received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuessRecord {
    word: String,
    results: Vec<LetterResult>,
}

impl GuessRecord {
    /// The word is lowercased; `results` must have one entry per letter.
    pub fn new(word: &str, results: Vec<LetterResult>) -> Result<Self, FeedbackError> {
        let word = word.trim().to_lowercase();
        let letters = word.chars().count();
        if letters != results.len() {
            return Err(FeedbackError::LengthMismatch {
                word,
                letters,
                results: results.len(),
            });
        }
        Ok(Self { word, results })
    }

    /// Parses `crane:XXGYX`.
    pub fn parse(entry: &str) -> Result<Self, FeedbackError> {
        let Some((word, feedback)) = entry.split_once(':') else {
            return Err(FeedbackError::InvalidEntry(entry.to_string()));
        };
        if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FeedbackError::InvalidEntry(entry.to_string()));
        }
        Self::new(word, parse_feedback(feedback)?)
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn results(&self) -> &[LetterResult] {
        &self.results
    }

    /// Letter/result pairs in board order.
    pub fn letters(&self) -> impl Iterator<Item = (char, LetterResult)> + '_ {
        self.word.chars().zip(self.results.iter().copied())
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        is_solved(&self.results)
    }

    #[must_use]
    pub fn pattern(&self) -> String {
        self.results.iter().map(|r| r.emoji()).collect()
    }
}

impl fmt::Display for GuessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.word, self.pattern())
    }
}

/// True when every letter came back correct.
#[must_use]
pub fn is_solved(results: &[LetterResult]) -> bool {
    !results.is_empty() && results.iter().all(|r| *r == LetterResult::Correct)
}

/// Append-only list of guesses in submission order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    records: Vec<GuessRecord>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: GuessRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&GuessRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GuessRecord> {
        self.records.iter()
    }
}

impl FromIterator<GuessRecord> for History {
    fn from_iter<I: IntoIterator<Item = GuessRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a GuessRecord;
    type IntoIter = std::slice::Iter<'a, GuessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
