//! Error types shared by the HTTP collaborators and the feedback model.

use thiserror::Error;

/// Failure talking to the completion service or the puzzle service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("API error: {status} - {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Body was not the JSON we expected
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Body decoded but failed validation
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Completion came back without any text
    #[error("completion contained no text")]
    EmptyCompletion,

    /// Credential variable not set
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

/// Invalid feedback handed to the data model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("word '{word}' has {letters} letters but {results} results were given")]
    LengthMismatch {
        word: String,
        letters: usize,
        results: usize,
    },

    #[error("invalid feedback character '{0}' (expected G, Y or X)")]
    InvalidCode(char),

    #[error("expected <guess>:<feedback>, got '{0}'")]
    InvalidEntry(String),
}

/// Anything that stops the binary before or outside a solving session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
