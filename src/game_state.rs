use crate::constraints::{ConstraintSet, derive_constraints, is_consistent};
use crate::feedback::{GuessRecord, History, is_solved};
use crate::puzzle::PuzzleOracle;
use crate::suggestion::{SuggestionSource, normalize_suggestion};
use crate::{debug_log, info_log};

/// Puzzle submissions allowed per session.
pub const MAX_ATTEMPTS: usize = 20;
/// Suggestions requested per attempt before giving up.
pub const MAX_SUGGESTION_RETRIES: usize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameState {
    Running { attempt: usize },
    Solved { attempts: usize },
    ExhaustedAttempts,
    /// No consistent suggestion after every retry.
    SuggestionFailed { attempt: usize },
    /// The puzzle service failed; the guess was not recorded.
    PuzzleUnavailable { attempt: usize, reason: String },
}

impl GameState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running { .. })
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    pub word_size: usize,
    /// Passed to the puzzle so runs are reproducible.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            word_size: 5,
            seed: None,
        }
    }
}

/// Receives progress events while a session runs.
///
/// Every method defaults to doing nothing.
pub trait SessionObserver {
    fn attempt_started(&mut self, _attempt: usize, _constraints: &ConstraintSet) {}
    fn suggestion_rejected(&mut self, _attempt: usize, _retry: usize, _raw: Option<&str>) {}
    fn guess_accepted(&mut self, _attempt: usize, _word: &str) {}
    fn feedback_recorded(&mut self, _attempt: usize, _record: &GuessRecord) {}
}

pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Final state plus every guess made on the way there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub state: GameState,
    pub history: History,
}

/// Asks `source` for a word until one is consistent with `constraints`.
///
/// Each absent or inconsistent reply uses up one of
/// [`MAX_SUGGESTION_RETRIES`].
pub fn request_suggestion<S, O>(
    source: &mut S,
    constraints: &ConstraintSet,
    word_size: usize,
    attempt: usize,
    observer: &mut O,
) -> Option<String>
where
    S: SuggestionSource + ?Sized,
    O: SessionObserver + ?Sized,
{
    for retry in 0..MAX_SUGGESTION_RETRIES {
        let raw = source.suggest(constraints, word_size, retry);
        if let Some(word) = raw.as_deref().and_then(normalize_suggestion)
            && is_consistent(&word, constraints, word_size)
        {
            return Some(word);
        }
        debug_log!("Rejected suggestion {:?} on retry {}", raw, retry);
        observer.suggestion_rejected(attempt, retry, raw.as_deref());
    }
    None
}

/// Drives one solving session: suggest, submit, record, repeat.
pub struct Solver<S, P> {
    suggestions: S,
    puzzle: P,
    config: SolverConfig,
    history: History,
    state: GameState,
}

impl<S: SuggestionSource, P: PuzzleOracle> Solver<S, P> {
    pub fn new(suggestions: S, puzzle: P, config: SolverConfig) -> Self {
        Self {
            suggestions,
            puzzle,
            config,
            history: History::new(),
            state: GameState::Running { attempt: 1 },
        }
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn run(&mut self) -> GameState {
        self.run_with(&mut NoopObserver)
    }

    /// Runs until a terminal state, reporting progress to `observer`.
    pub fn run_with<O: SessionObserver + ?Sized>(&mut self, observer: &mut O) -> GameState {
        while let GameState::Running { attempt } = self.state {
            self.state = self.step(attempt, observer);
        }
        info_log!(
            "Session finished in state {:?} after {} guesses",
            self.state,
            self.history.len()
        );
        self.state.clone()
    }

    #[must_use]
    pub fn into_session(self) -> Session {
        Session {
            state: self.state,
            history: self.history,
        }
    }

    fn step<O: SessionObserver + ?Sized>(&mut self, attempt: usize, observer: &mut O) -> GameState {
        let word_size = self.config.word_size;
        let constraints = derive_constraints(&self.history, word_size);
        observer.attempt_started(attempt, &constraints);

        let Some(guess) =
            request_suggestion(&mut self.suggestions, &constraints, word_size, attempt, observer)
        else {
            log::warn!("No consistent suggestion on attempt {attempt}");
            return GameState::SuggestionFailed { attempt };
        };
        observer.guess_accepted(attempt, &guess);

        let results = match self.puzzle.evaluate(&guess, word_size, self.config.seed) {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Puzzle evaluation failed on attempt {attempt}: {e}");
                return GameState::PuzzleUnavailable {
                    attempt,
                    reason: e.to_string(),
                };
            }
        };
        let solved = is_solved(&results);

        let record = match GuessRecord::new(&guess, results) {
            Ok(record) => record,
            Err(e) => {
                return GameState::PuzzleUnavailable {
                    attempt,
                    reason: e.to_string(),
                };
            }
        };
        observer.feedback_recorded(attempt, &record);
        self.history.push(record);

        if solved {
            GameState::Solved { attempts: attempt }
        } else if attempt >= MAX_ATTEMPTS {
            GameState::ExhaustedAttempts
        } else {
            GameState::Running {
                attempt: attempt + 1,
            }
        }
    }
}
