//! Remote puzzle that scores guesses.

use crate::error::ClientError;
use crate::feedback::LetterResult;
use crate::info_log;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_PUZZLE_URL: &str = "https://wordle.votee.dev:8000";

/// Scores a guess against the hidden word.
pub trait PuzzleOracle {
    /// Returns exactly `word_size` results aligned with `word`.
    fn evaluate(
        &mut self,
        word: &str,
        word_size: usize,
        seed: Option<u64>,
    ) -> Result<Vec<LetterResult>, ClientError>;
}

impl<T: PuzzleOracle + ?Sized> PuzzleOracle for &mut T {
    fn evaluate(
        &mut self,
        word: &str,
        word_size: usize,
        seed: Option<u64>,
    ) -> Result<Vec<LetterResult>, ClientError> {
        (**self).evaluate(word, word_size, seed)
    }
}

/// One entry of the puzzle's JSON reply.
#[derive(Debug, Deserialize)]
struct SlotResult {
    slot: Option<usize>,
    guess: String,
    result: LetterResult,
}

/// Checks the reply against the submitted word before it reaches the solver.
fn validate_slots(
    word: &str,
    word_size: usize,
    slots: Vec<SlotResult>,
) -> Result<Vec<LetterResult>, ClientError> {
    if slots.len() != word_size {
        return Err(ClientError::MalformedResponse(format!(
            "expected {word_size} results, got {}",
            slots.len()
        )));
    }

    let letters: Vec<char> = word.chars().collect();
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            if let Some(n) = slot.slot
                && n != i
            {
                return Err(ClientError::MalformedResponse(format!(
                    "slot {n} reported at position {i}"
                )));
            }
            let echoed = slot.guess.to_lowercase();
            let expected = letters.get(i).map(char::to_string).unwrap_or_default();
            if echoed != expected {
                return Err(ClientError::MalformedResponse(format!(
                    "slot {i} echoes '{}' but guess has '{expected}'",
                    slot.guess
                )));
            }
            Ok(slot.result)
        })
        .collect()
}

fn parse_evaluation(
    word: &str,
    word_size: usize,
    body: &str,
) -> Result<Vec<LetterResult>, ClientError> {
    let slots: Vec<SlotResult> = serde_json::from_str(body)?;
    validate_slots(word, word_size, slots)
}

/// Blocking client for the `/random` puzzle endpoint.
pub struct PuzzleClient {
    http: Client,
    base_url: String,
}

impl PuzzleClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info_log!("Puzzle client ready: {}", base_url);
        Ok(Self { http, base_url })
    }
}

impl PuzzleOracle for PuzzleClient {
    fn evaluate(
        &mut self,
        word: &str,
        word_size: usize,
        seed: Option<u64>,
    ) -> Result<Vec<LetterResult>, ClientError> {
        let mut query = vec![
            ("guess", word.to_string()),
            ("size", word_size.to_string()),
        ];
        if let Some(seed) = seed {
            query.push(("seed", seed.to_string()));
        }

        let response = self
            .http
            .get(format!("{}/random", self.base_url))
            .query(&query)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        parse_evaluation(word, word_size, &body)
    }
}
