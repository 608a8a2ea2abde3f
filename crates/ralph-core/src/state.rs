use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use ralph_sessions::Feedback;

/// Loop state file, relative to the working directory.
pub const STATE_FILE_PATH: &str = ".kiro/ralph-loop.local.md";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Invalid state file format: {0}")]
    Format(String),

    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot of a running loop, persisted before every agent invocation.
///
/// The durable form is markdown with a YAML frontmatter header so the prompt
/// stays human-readable:
///
/// ```text
/// ---
/// active: true
/// iteration: 3
/// ...
/// ---
///
/// <prompt>
/// ```
///
/// `active` stays true while the loop runs; a snapshot left behind by
/// cancellation or a hit ceiling is rewritten with `active: false` so
/// `ralph resume` can pick it up. Genuine completion deletes the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    pub active: bool,
    pub iteration: u32,
    pub min_iterations: u32,
    pub max_iterations: u32,
    pub completion_promise: String,
    pub started_at: DateTime<Utc>,
    pub prompt: String,
    pub previous_feedback: Option<Feedback>,
}

/// Frontmatter fields, i.e. everything except the prompt body.
#[derive(Serialize, Deserialize)]
struct StateHeader {
    active: bool,
    iteration: u32,
    min_iterations: u32,
    max_iterations: u32,
    completion_promise: String,
    started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous_feedback: Option<Feedback>,
}

impl LoopState {
    /// Serialize to markdown with YAML frontmatter.
    pub fn to_markdown(&self) -> Result<String, StateError> {
        let header = StateHeader {
            active: self.active,
            iteration: self.iteration,
            min_iterations: self.min_iterations,
            max_iterations: self.max_iterations,
            completion_promise: self.completion_promise.clone(),
            started_at: self.started_at,
            previous_feedback: self.previous_feedback.clone(),
        };
        let yaml = serde_yaml::to_string(&header)
            .map_err(|e| StateError::Format(format!("could not serialize header: {e}")))?;
        Ok(format!("---\n{yaml}---\n\n{}", self.prompt))
    }

    /// Parse from markdown with YAML frontmatter.
    ///
    /// Only the opening `---` line and the first `---` at a line start
    /// delimit the header: a `---` inside a header value (say, the promise
    /// phrase) or anywhere in the prompt body round-trips intact.
    pub fn from_markdown(content: &str) -> Result<Self, StateError> {
        let Some(rest) = content.strip_prefix("---\n") else {
            return Err(StateError::Format("missing YAML frontmatter".into()));
        };
        let mut parts = rest.splitn(2, "\n---");
        let (Some(header), Some(body)) = (parts.next(), parts.next()) else {
            return Err(StateError::Format("missing YAML frontmatter".into()));
        };

        let header: StateHeader = serde_yaml::from_str(header)
            .map_err(|e| StateError::Format(format!("unparseable header: {e}")))?;

        let state = Self {
            active: header.active,
            iteration: header.iteration,
            min_iterations: header.min_iterations,
            max_iterations: header.max_iterations,
            completion_promise: header.completion_promise,
            started_at: header.started_at,
            prompt: body.trim().to_string(),
            previous_feedback: header.previous_feedback,
        };
        state.validate()?;
        Ok(state)
    }

    /// Shape checks shared with fresh construction: a decoded state that
    /// would be invalid as a config is rejected the same way.
    fn validate(&self) -> Result<(), StateError> {
        if self.iteration < 1 {
            return Err(StateError::Format("iteration must be at least 1".into()));
        }
        if self.min_iterations < 1 {
            return Err(StateError::Format(
                "min_iterations must be at least 1".into(),
            ));
        }
        if self.completion_promise.trim().is_empty() {
            return Err(StateError::Format(
                "completion_promise cannot be empty".into(),
            ));
        }
        if self.prompt.is_empty() {
            return Err(StateError::Format("prompt cannot be empty".into()));
        }
        Ok(())
    }
}

/// The on-disk state file for a working directory.
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            path: working_dir.join(STATE_FILE_PATH),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist a snapshot, best-effort.
    ///
    /// A write failure is downgraded to a warning and any stale file is
    /// removed rather than left half-written.
    pub fn save(&self, state: &LoopState) {
        if let Err(e) = self.try_save(state) {
            warn!(path = %self.path.display(), error = %e, "Could not write loop state");
            let _ = fs::remove_file(&self.path);
        }
    }

    fn try_save(&self, state: &LoopState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, state.to_markdown()?)?;
        Ok(())
    }

    pub fn load(&self) -> Result<LoopState, StateError> {
        let content = fs::read_to_string(&self.path)?;
        LoopState::from_markdown(&content)
    }

    /// Delete the state file; a missing file is fine.
    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Could not remove loop state");
            }
        }
    }
}
