use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur constructing or invoking an agent
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to spawn agent process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Agent config not found at {path}\nRun 'ralph init' first to initialize Ralph Wiggum in this project.")]
    ConfigMissing { path: String },

    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),
}

/// The seam between the loop and the external agent process.
///
/// One call per iteration. The returned value is the process exit code;
/// non-zero is reported by the caller but does not stop the loop, since the
/// agent may have made partial progress before failing.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Human-readable name of the agent for logs and banners.
    fn name(&self) -> &str;

    /// Run one chat invocation with the given prompt, returning the exit code.
    async fn run_chat(&self, prompt: &str) -> Result<i32, AgentError>;
}
