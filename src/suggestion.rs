//! Candidate words from an OpenAI-compatible chat completion service.
//!
//! The solver only sees the [`SuggestionSource`] trait. [`LlmClient`] is the
//! HTTP implementation; it owns its own request spacing and failure counters.

use crate::constraints::ConstraintSet;
use crate::error::ClientError;
use crate::{debug_log, info_log};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "deepseek-chat";
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

const BASE_TEMPERATURE: f32 = 0.1;
const TEMPERATURE_STEP: f32 = 0.2;
const MAX_TEMPERATURE: f32 = 2.0;
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const ERROR_BODY_LIMIT: usize = 200;

/// Anything that can propose a word for the current constraints.
pub trait SuggestionSource {
    /// `retry` counts from 0 within one attempt; implementations should use it
    /// to diversify their answers. `None` means no usable reply.
    fn suggest(
        &mut self,
        constraints: &ConstraintSet,
        word_size: usize,
        retry: usize,
    ) -> Option<String>;
}

impl<T: SuggestionSource + ?Sized> SuggestionSource for &mut T {
    fn suggest(
        &mut self,
        constraints: &ConstraintSet,
        word_size: usize,
        retry: usize,
    ) -> Option<String> {
        (**self).suggest(constraints, word_size, retry)
    }
}

/// Sampling temperature for the given retry, rising until the service cap.
#[must_use]
pub fn temperature_for_retry(retry: usize) -> f32 {
    (BASE_TEMPERATURE + TEMPERATURE_STEP * retry as f32).min(MAX_TEMPERATURE)
}

/// Renders the constraint set as instructions for the model.
#[must_use]
pub fn build_prompt(constraints: &ConstraintSet, word_size: usize) -> String {
    let mut lines = vec![
        format!("Wordle Game - Word length: {word_size}"),
        format!("Board: {}", constraints.board(word_size)),
        "Rules:".to_string(),
        "1. Keep green letters at their positions".to_string(),
    ];

    for (letter, columns) in &constraints.misplaced_letters {
        let columns: Vec<String> = columns.iter().map(ToString::to_string).collect();
        lines.push(format!(
            "2. Include letter '{letter}' but NOT at positions [{}]",
            columns.join(", ")
        ));
    }
    if !constraints.excluded_letters.is_empty() {
        let letters: Vec<String> = constraints
            .excluded_letters
            .iter()
            .map(ToString::to_string)
            .collect();
        lines.push(format!("3. Do NOT use these letters: {}", letters.join(", ")));
    }
    if !constraints.tried_words.is_empty() {
        let words: Vec<&str> = constraints.tried_words.iter().map(String::as_str).collect();
        lines.push(format!(
            "4. Already guessed words (do not repeat): {}",
            words.join(", ")
        ));
    }
    lines.push(format!(
        "5. Return only the {word_size}-letter word, lowercase, no quotes, no explanation."
    ));
    lines.push("Word:".to_string());

    lines.join("\n")
}

/// Cleans up a raw model reply into a bare lowercase word.
///
/// Takes the first non-empty line, drops a `Word:` prefix and surrounding
/// quotes or punctuation. Returns `None` unless only ASCII letters remain.
#[must_use]
pub fn normalize_suggestion(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let lower = line.to_lowercase();
    let word = lower.strip_prefix("word:").unwrap_or(lower.as_str());
    let word = word.trim_matches(|c: char| !c.is_ascii_alphabetic());
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    Some(word.to_string())
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub top_p: f32,
    pub timeout: Duration,
    /// Minimum spacing between two requests.
    pub min_request_interval: Duration,
    /// How long to wait after a 429 before the single retry.
    pub throttle_wait: Duration,
}

impl LlmConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: api_key.into(),
            max_tokens: 100,
            top_p: 0.9,
            timeout: Duration::from_secs(30),
            min_request_interval: Duration::from_secs(5),
            throttle_wait: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn parse_chat_response(body: &str) -> Result<String, ClientError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ClientError::EmptyCompletion);
    }
    Ok(text)
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Request pacing state owned by one client.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    backoff_base: Duration,
    last_request: Option<Instant>,
    request_count: u64,
    consecutive_failures: u32,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration, backoff_base: Duration) -> Self {
        Self {
            min_interval,
            backoff_base,
            last_request: None,
            request_count: 0,
            consecutive_failures: 0,
        }
    }

    /// Required gap after the previous request, widened by recent failures.
    #[must_use]
    pub fn spacing(&self) -> Duration {
        let backoff = self.backoff_base.saturating_mul(self.consecutive_failures);
        self.min_interval.saturating_add(backoff).min(self.min_interval.max(MAX_BACKOFF))
    }

    /// How long a request issued at `now` still has to wait.
    #[must_use]
    pub fn delay_at(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => self.spacing().saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Sleeps until the next request may go out, then records it.
    pub fn wait_turn(&mut self) {
        let delay = self.delay_at(Instant::now());
        if !delay.is_zero() {
            debug_log!("Spacing completion requests: sleeping {:?}", delay);
            thread::sleep(delay);
        }
        self.last_request = Some(Instant::now());
        self.request_count += 1;
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

/// Blocking chat-completions client.
pub struct LlmClient {
    http: Client,
    config: LlmConfig,
    limiter: RateLimiter,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey(API_KEY_ENV.to_string()));
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        let limiter = RateLimiter::new(config.min_request_interval, config.throttle_wait);
        info_log!(
            "LLM client ready: model={} endpoint={}",
            config.model,
            config.endpoint
        );
        Ok(Self {
            http,
            config,
            limiter,
        })
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Sends one user message and returns the reply text.
    pub fn chat(&mut self, prompt: &str, temperature: f32) -> Result<String, ClientError> {
        self.limiter.wait_turn();
        let result = self.send(prompt, temperature);
        match &result {
            Ok(_) => self.limiter.record_success(),
            Err(_) => self.limiter.record_failure(),
        }
        result
    }

    fn send(&self, prompt: &str, temperature: f32) -> Result<String, ClientError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature,
            top_p: self.config.top_p,
            stream: false,
        };

        let mut response = self.post(&request)?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            log::warn!(
                "Completion service rate limit reached, waiting {:?} before retrying",
                self.config.throttle_wait
            );
            thread::sleep(self.config.throttle_wait);
            response = self.post(&request)?;
        }

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        parse_chat_response(&body)
    }

    fn post(&self, request: &ChatRequest<'_>) -> Result<reqwest::blocking::Response, ClientError> {
        Ok(self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()?)
    }
}

impl SuggestionSource for LlmClient {
    fn suggest(
        &mut self,
        constraints: &ConstraintSet,
        word_size: usize,
        retry: usize,
    ) -> Option<String> {
        let prompt = build_prompt(constraints, word_size);
        let temperature = temperature_for_retry(retry);
        debug_log!("Requesting suggestion (retry {}, temperature {:.1})", retry, temperature);
        match self.chat(&prompt, temperature) {
            Ok(reply) => Some(reply),
            Err(e) => {
                log::warn!("Completion request failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::derive_constraints;
    use crate::feedback::{GuessRecord, History};

    fn constraints_for(entries: &[&str]) -> ConstraintSet {
        let history: History = entries
            .iter()
            .map(|e| GuessRecord::parse(e).unwrap())
            .collect();
        derive_constraints(&history, 5)
    }

    #[test]
    fn test_temperature_schedule_rises_and_caps() {
        assert!((temperature_for_retry(0) - 0.1).abs() < 1e-6);
        assert!((temperature_for_retry(1) - 0.3).abs() < 1e-6);
        assert!(temperature_for_retry(5) > temperature_for_retry(4));
        assert!((temperature_for_retry(19) - MAX_TEMPERATURE).abs() < 1e-6);
    }

    #[test]
    fn test_prompt_for_empty_constraints() {
        let prompt = build_prompt(&ConstraintSet::default(), 5);
        assert_eq!(
            prompt,
            "Wordle Game - Word length: 5\n\
             Board: _ _ _ _ _\n\
             Rules:\n\
             1. Keep green letters at their positions\n\
             5. Return only the 5-letter word, lowercase, no quotes, no explanation.\n\
             Word:"
        );
    }

    #[test]
    fn test_prompt_lists_every_constraint() {
        let prompt = build_prompt(&constraints_for(&["crane:XXGYX"]), 5);
        assert!(prompt.contains("Board: _ _ a _ _"));
        assert!(prompt.contains("2. Include letter 'n' but NOT at positions [4]"));
        assert!(prompt.contains("3. Do NOT use these letters: c, e, r"));
        assert!(prompt.contains("4. Already guessed words (do not repeat): crane"));
    }

    #[test]
    fn test_normalize_suggestion() {
        assert_eq!(normalize_suggestion("  Crane \n"), Some("crane".to_string()));
        assert_eq!(normalize_suggestion("\"slate\"."), Some("slate".to_string()));
        assert_eq!(normalize_suggestion("Word: TRAIN"), Some("train".to_string()));
        assert_eq!(normalize_suggestion("\n\nbrick\nbecause..."), Some("brick".to_string()));
        assert_eq!(normalize_suggestion("two words"), None);
        assert_eq!(normalize_suggestion("cr4ne"), None);
        assert_eq!(normalize_suggestion("   "), None);
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" crane \n"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "crane");
    }

    #[test]
    fn test_parse_chat_response_without_text() {
        let body = r#"{"choices":[]}"#;
        assert!(matches!(parse_chat_response(body), Err(ClientError::EmptyCompletion)));
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(matches!(parse_chat_response(body), Err(ClientError::EmptyCompletion)));
        assert!(matches!(parse_chat_response("oops"), Err(ClientError::Json(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "deepseek-chat",
            messages: vec![ChatMessage {
                role: "user",
                content: "Hello",
            }],
            max_tokens: 100,
            temperature: 0.5,
            top_p: 0.9,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "deepseek-chat");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Hello");
        assert_eq!(value["max_tokens"], 100);
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_rate_limiter_spacing() {
        let mut limiter = RateLimiter::new(Duration::from_secs(5), Duration::from_secs(10));
        let now = Instant::now();
        assert_eq!(limiter.delay_at(now), Duration::ZERO);

        limiter.last_request = Some(now);
        assert_eq!(limiter.delay_at(now), Duration::from_secs(5));
        assert_eq!(
            limiter.delay_at(now + Duration::from_secs(2)),
            Duration::from_secs(3)
        );
        assert_eq!(limiter.delay_at(now + Duration::from_secs(7)), Duration::ZERO);
    }

    #[test]
    fn test_rate_limiter_backs_off_after_failures() {
        let mut limiter = RateLimiter::new(Duration::from_secs(5), Duration::from_secs(10));
        limiter.record_failure();
        limiter.record_failure();
        assert_eq!(limiter.consecutive_failures(), 2);
        assert_eq!(limiter.spacing(), Duration::from_secs(25));

        for _ in 0..20 {
            limiter.record_failure();
        }
        assert_eq!(limiter.spacing(), MAX_BACKOFF);

        limiter.record_success();
        assert_eq!(limiter.spacing(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let mut limiter = RateLimiter::new(Duration::ZERO, Duration::ZERO);
        limiter.wait_turn();
        limiter.wait_turn();
        assert_eq!(limiter.request_count(), 2);
        assert_eq!(limiter.delay_at(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = LlmClient::new(LlmConfig::new("  "));
        assert!(matches!(result, Err(ClientError::MissingApiKey(_))));
    }
}
