use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{Agent, AgentError};

/// Agent name kiro-cli resolves from the project's `.kiro/agents/` directory.
pub const DEFAULT_AGENT_NAME: &str = "ralph-wiggum";

/// Descriptor that must exist before the default agent can be used.
pub const LOCAL_AGENT_PATH: &str = ".kiro/agents/ralph-wiggum.json";

/// Kiro CLI agent wrapper.
///
/// Runs `kiro-cli chat` fully autonomously: `--no-interactive` so it never
/// prompts, `--trust-all-tools` so tool calls don't block, the task prompt
/// fed on stdin, and stdout/stderr left attached to the terminal so the
/// operator can watch the iteration live.
pub struct KiroCliAgent {
    agent_name: String,
}

impl KiroCliAgent {
    /// Create an agent, resolving the agent name.
    ///
    /// With no override the default name is used only after verifying the
    /// local descriptor exists; a missing descriptor is fatal since kiro-cli
    /// would otherwise run without the Ralph steering context. An explicit
    /// override skips the check (the name may refer to a global agent).
    pub fn new(agent_override: Option<String>) -> Result<Self, AgentError> {
        let agent_name = match agent_override {
            Some(name) => name,
            None => {
                if !Path::new(LOCAL_AGENT_PATH).exists() {
                    return Err(AgentError::ConfigMissing {
                        path: LOCAL_AGENT_PATH.to_string(),
                    });
                }
                DEFAULT_AGENT_NAME.to_string()
            }
        };
        Ok(Self { agent_name })
    }

    /// The resolved agent name.
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }
}

#[async_trait]
impl Agent for KiroCliAgent {
    fn name(&self) -> &str {
        "kiro-cli"
    }

    async fn run_chat(&self, prompt: &str) -> Result<i32, AgentError> {
        debug!(
            agent = %self.agent_name,
            prompt_len = prompt.len(),
            "Spawning kiro-cli chat"
        );

        let mut child = Command::new("kiro-cli")
            .args([
                "chat",
                "--agent",
                &self.agent_name,
                "--no-interactive",
                "--trust-all-tools",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let start = Instant::now();

        // Write the prompt and close stdin so the chat session starts.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                warn!(error = %e, "Failed to write prompt to kiro-cli stdin");
            }
            drop(stdin);
        }

        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(-1);

        debug!(
            exit_code,
            duration_ms = start.elapsed().as_millis(),
            "kiro-cli chat finished"
        );

        Ok(exit_code)
    }
}
