use thiserror::Error;

/// Errors that abort a loop run.
///
/// Deliberately narrow: session-store and feedback problems are downgraded
/// to warnings inside the runner, and state writes are best-effort. Only a
/// failure to launch the agent at all is fatal.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Agent error: {0}")]
    Agent(#[from] ralph_agent::AgentError),
}
