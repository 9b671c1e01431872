// Library interface for llm-wordle
// The binary and the integration tests both go through these modules

pub mod cli;
pub mod constraints;
pub mod error;
pub mod feedback;
pub mod game_state;
pub mod logging;
pub mod puzzle;
pub mod suggestion;

// Re-export commonly used items for easier testing
pub use constraints::{ConstraintSet, derive_constraints, is_consistent};
pub use feedback::{GuessRecord, History, LetterResult};
pub use game_state::{GameState, MAX_ATTEMPTS, Session, SessionObserver, Solver, SolverConfig};
pub use puzzle::PuzzleOracle;
pub use suggestion::SuggestionSource;
