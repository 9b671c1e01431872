use crate::constraints::ConstraintSet;
use crate::error::ClientError;
use crate::feedback::{GuessRecord, History};
use crate::game_state::{GameState, MAX_ATTEMPTS, Session, SessionObserver};
use crate::puzzle::DEFAULT_PUZZLE_URL;
use crate::suggestion::{API_KEY_ENV, DEFAULT_LLM_ENDPOINT, DEFAULT_LLM_MODEL, LlmConfig};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::time::Duration;

/// Solve Wordle puzzles by asking a language model for guesses
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one puzzle against the remote service
    Solve(SolveArgs),
    /// Check that the completion service answers
    Ping(LlmArgs),
    /// Print the constraints and prompt for a hand-entered history
    Constraints(ConstraintsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// Chat completions endpoint
    #[arg(long, env = "LLM_API_URL", default_value = DEFAULT_LLM_ENDPOINT)]
    pub llm_url: String,

    /// Model name sent with every request
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub model: String,

    /// API key for the completion service
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Minimum seconds between completion requests
    #[arg(long, default_value_t = 5)]
    pub min_interval_secs: u64,
}

impl LlmArgs {
    pub fn to_config(&self) -> Result<LlmConfig, ClientError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ClientError::MissingApiKey(API_KEY_ENV.to_string()))?;
        let mut config = LlmConfig::new(api_key);
        config.endpoint.clone_from(&self.llm_url);
        config.model.clone_from(&self.model);
        config.min_request_interval = Duration::from_secs(self.min_interval_secs);
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// Letters in the hidden word
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=15))]
    pub size: u8,

    /// Puzzle seed, for a reproducible hidden word
    #[arg(long, default_value_t = 42, conflicts_with = "no_seed")]
    pub seed: u64,

    /// Let the puzzle pick a random word
    #[arg(long)]
    pub no_seed: bool,

    /// Puzzle service base URL
    #[arg(long, env = "WORDLE_API_URL", default_value = DEFAULT_PUZZLE_URL)]
    pub puzzle_url: String,

    #[command(flatten)]
    pub llm: LlmArgs,
}

impl SolveArgs {
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        (!self.no_seed).then_some(self.seed)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConstraintsArgs {
    /// Letters in the hidden word
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=15))]
    pub size: u8,

    /// Guesses as <word>:<feedback>, feedback in G/Y/X (e.g. crane:XXGYX)
    #[arg(required = true)]
    pub guesses: Vec<String>,
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

pub fn format_constraints(constraints: &ConstraintSet, word_size: usize) -> String {
    let mut out = format!("Board:     {}\n", constraints.board(word_size));
    let misplaced: Vec<String> = constraints
        .misplaced_letters
        .iter()
        .map(|(letter, columns)| {
            let columns: Vec<String> = columns.iter().map(ToString::to_string).collect();
            format!("{letter} (not {})", columns.join(","))
        })
        .collect();
    out.push_str(&format!("Misplaced: {}\n", misplaced.join(", ")));
    let excluded: String = constraints.excluded_letters.iter().collect();
    out.push_str(&format!("Excluded:  {excluded}\n"));
    let tried: Vec<&str> = constraints.tried_words.iter().map(String::as_str).collect();
    out.push_str(&format!("Tried:     {}", tried.join(", ")));
    out
}

pub fn format_outcome(state: &GameState) -> String {
    match state {
        GameState::Solved { attempts } => {
            format!("Guessing completed, guessed correctly after {attempts} attempts")
        }
        GameState::ExhaustedAttempts => {
            format!("Failed to guess correctly within {MAX_ATTEMPTS} attempts")
        }
        GameState::SuggestionFailed { attempt } => {
            format!("Language model did not produce a valid guess on attempt {attempt}, guessing ended")
        }
        GameState::PuzzleUnavailable { attempt, reason } => {
            format!("Puzzle service failed on attempt {attempt}: {reason}")
        }
        GameState::Running { attempt } => format!("Still running (attempt {attempt})"),
    }
}

pub fn format_history(history: &History) -> String {
    history
        .iter()
        .enumerate()
        .map(|(i, record)| format!("  Attempt {}: {record}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes the final outcome and the full attempt list.
pub fn display_session<W: Write>(out: &mut W, session: &Session) -> std::io::Result<()> {
    writeln!(out, "\n{}", format_outcome(&session.state))?;
    writeln!(out, "\nAttempt history:")?;
    if session.history.is_empty() {
        writeln!(out, "  (no guesses recorded)")?;
    } else {
        writeln!(out, "{}", format_history(&session.history))?;
    }
    Ok(())
}

/// Prints each attempt as it happens.
pub struct TranscriptPrinter<W: Write> {
    out: W,
}

impl<W: Write> TranscriptPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

// Transcript output is best effort; a closed stdout must not abort the session.
impl<W: Write> SessionObserver for TranscriptPrinter<W> {
    fn attempt_started(&mut self, attempt: usize, _constraints: &ConstraintSet) {
        let _ = writeln!(self.out, "\n--- Attempt {attempt} ---");
    }

    fn guess_accepted(&mut self, _attempt: usize, word: &str) {
        let _ = writeln!(self.out, "Guess: {word}");
    }

    fn feedback_recorded(&mut self, _attempt: usize, record: &GuessRecord) {
        let _ = writeln!(self.out, "Feedback: {}", record.pattern());
    }
}
