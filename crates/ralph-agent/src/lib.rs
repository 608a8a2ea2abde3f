//! # ralph-agent
//!
//! Spawns the external coding agent once per loop iteration.
//!
//! The agent is an opaque subprocess: it takes the task prompt on stdin,
//! streams its conversation to the controlling terminal, and records the
//! actual transcript in its own store (read back via `ralph-sessions`).

mod kiro;
mod traits;

pub use kiro::{KiroCliAgent, DEFAULT_AGENT_NAME, LOCAL_AGENT_PATH};
pub use traits::{Agent, AgentError};
