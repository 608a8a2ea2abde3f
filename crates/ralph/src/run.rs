//! The `loop` and `resume` commands: validation, wiring, and the Ctrl+C
//! path that leaves resumable state behind.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use ralph_agent::KiroCliAgent;
use ralph_core::{
    LoopConfig, LoopOutcome, LoopRunner, LoopState, RawLoopConfig, StateFile, ValidationError,
};
use ralph_sessions::{Feedback, SessionStore};

use crate::LoopOpts;

pub async fn loop_cmd(prompt: String, opts: LoopOpts) -> Result<i32> {
    let raw = RawLoopConfig {
        prompt,
        min_iterations: opts.min_iterations.unwrap_or_else(|| "1".into()),
        max_iterations: opts.max_iterations.unwrap_or_else(|| "0".into()),
        completion_promise: opts.completion_promise.unwrap_or_else(|| "COMPLETE".into()),
        agent_name: opts.agent_name,
    };

    let config = match LoopConfig::from_raw(raw) {
        Ok(config) => config,
        Err(errors) => return Ok(report_validation_errors(&errors)),
    };

    execute(config, None).await
}

pub async fn resume_cmd(opts: LoopOpts) -> Result<i32> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let state_file = StateFile::new(&working_dir);

    if !state_file.exists() {
        anyhow::bail!(
            "No Ralph loop state found at {}.\nStart a loop first with 'ralph loop \"...\"'.",
            state_file.path().display()
        );
    }

    let state = state_file
        .load()
        .with_context(|| format!("Could not read loop state at {}", state_file.path().display()))?;

    // CLI flags override the persisted settings; everything else comes from
    // the snapshot so resume is self-contained.
    let raw = RawLoopConfig {
        prompt: state.prompt.clone(),
        min_iterations: opts
            .min_iterations
            .unwrap_or_else(|| state.min_iterations.to_string()),
        max_iterations: opts
            .max_iterations
            .unwrap_or_else(|| state.max_iterations.to_string()),
        completion_promise: opts
            .completion_promise
            .unwrap_or_else(|| state.completion_promise.clone()),
        agent_name: opts.agent_name,
    };

    let config = match LoopConfig::from_raw(raw) {
        Ok(config) => config.resuming_from(state.iteration),
        Err(errors) => return Ok(report_validation_errors(&errors)),
    };

    eprintln!(
        "{} iteration {}",
        "Resuming Ralph loop at".bold().blue(),
        state.iteration
    );

    execute(config, state.previous_feedback).await
}

fn report_validation_errors(errors: &[ValidationError]) -> i32 {
    eprintln!("{}", "Invalid configuration:".bright_red());
    for error in errors {
        eprintln!("  - {error}");
    }
    1
}

async fn execute(config: LoopConfig, initial_feedback: Option<Feedback>) -> Result<i32> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;

    let agent = KiroCliAgent::new(config.agent_name.clone())?;
    let store = SessionStore::new()?;
    let runner = LoopRunner::new(&agent, &store, working_dir.clone());

    eprintln!("{}", "Ralph loop starting".bold().blue());
    eprintln!("   Agent: {}", agent.agent_name());
    eprintln!("   Min iterations: {}", config.min_iterations);
    if config.max_iterations > 0 {
        eprintln!("   Max iterations: {}", config.max_iterations);
    } else {
        eprintln!("   Max iterations: unlimited");
    }
    eprintln!("   Completion promise: {}", config.completion_promise);
    eprintln!();

    install_interrupt_handler(&runner, &config, &working_dir)?;

    let outcome = runner.run(&config, initial_feedback).await?;
    print_outcome(&outcome);
    Ok(outcome.exit_code())
}

/// Persist a resumable snapshot from whatever the loop last published, then
/// exit. The handler only reads the progress cell; "as of signal delivery"
/// consistency is all that's needed.
fn install_interrupt_handler(
    runner: &LoopRunner<'_>,
    config: &LoopConfig,
    working_dir: &Path,
) -> Result<()> {
    let progress = runner.progress_handle();
    let config = config.clone();
    let state_file = StateFile::new(working_dir);

    ctrlc::set_handler(move || {
        let progress = progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if progress.iteration > 0 {
            state_file.save(&LoopState {
                active: false,
                iteration: progress.iteration,
                min_iterations: config.min_iterations,
                max_iterations: config.max_iterations,
                completion_promise: config.completion_promise.clone(),
                started_at: progress.started_at,
                prompt: config.prompt.clone(),
                previous_feedback: progress.feedback.clone(),
            });
        }
        eprintln!();
        eprintln!(
            "{} at iteration {}. Resume with 'ralph resume'.",
            "Interrupted".bright_yellow(),
            progress.iteration
        );
        std::process::exit(1);
    })
    .context("Failed to set Ctrl+C handler")
}

fn print_outcome(outcome: &LoopOutcome) {
    match outcome {
        LoopOutcome::Completed { iterations } => {
            eprintln!();
            eprintln!(
                "{} Completed at iteration {}!",
                "✓".bright_green(),
                iterations
            );
        }
        LoopOutcome::MaxIterationsReached { iterations } => {
            eprintln!();
            eprintln!(
                "{} Max iterations ({}) reached.",
                "⚠".bright_yellow(),
                iterations
            );
            eprintln!("State kept on disk; continue with 'ralph resume'.");
        }
    }
}
