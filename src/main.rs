use llm_wordle::cli::{
    Command, ConstraintsArgs, LlmArgs, SolveArgs, TranscriptPrinter, display_session,
    format_constraints, parse_cli,
};
use llm_wordle::constraints::derive_constraints;
use llm_wordle::error::AppError;
use llm_wordle::feedback::{GuessRecord, History};
use llm_wordle::game_state::{Solver, SolverConfig};
use llm_wordle::logging::init_logging;
use llm_wordle::puzzle::PuzzleClient;
use llm_wordle::suggestion::{LlmClient, build_prompt};
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = parse_cli();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Solve(args) => solve(&args),
        Command::Ping(args) => ping(&args),
        Command::Constraints(args) => constraints(&args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn solve(args: &SolveArgs) -> Result<ExitCode, AppError> {
    let llm = LlmClient::new(args.llm.to_config()?)?;
    let puzzle = PuzzleClient::new(args.puzzle_url.as_str())?;
    let config = SolverConfig {
        word_size: usize::from(args.size),
        seed: args.seed(),
    };

    println!("\nStart automatically guessing words...");
    let mut solver = Solver::new(llm, puzzle, config);
    let mut printer = TranscriptPrinter::new(io::stdout());
    let state = solver.run_with(&mut printer);

    let session = solver.into_session();
    display_session(&mut io::stdout().lock(), &session)?;

    Ok(if state.is_solved() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn ping(args: &LlmArgs) -> Result<ExitCode, AppError> {
    let mut llm = LlmClient::new(args.to_config()?)?;
    let reply = llm.chat("Hello", 1.0)?;
    println!("API call successful!");
    println!("Model response: {reply}");
    Ok(ExitCode::SUCCESS)
}

fn constraints(args: &ConstraintsArgs) -> Result<ExitCode, AppError> {
    let word_size = usize::from(args.size);
    let history = args
        .guesses
        .iter()
        .map(|entry| GuessRecord::parse(entry))
        .collect::<Result<History, _>>()?;
    let constraints = derive_constraints(&history, word_size);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", format_constraints(&constraints, word_size))?;
    writeln!(out, "\nPrompt:\n{}", build_prompt(&constraints, word_size))?;
    Ok(ExitCode::SUCCESS)
}
