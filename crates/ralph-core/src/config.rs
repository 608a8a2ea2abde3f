use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Loop parameters as they arrive from the command line.
///
/// Iteration counts stay string-typed here so that validation can report
/// every problem in one pass instead of failing at the first bad parse.
#[derive(Debug, Clone, Default)]
pub struct RawLoopConfig {
    pub prompt: String,
    pub min_iterations: String,
    pub max_iterations: String,
    pub completion_promise: String,
    pub agent_name: Option<String>,
}

/// Validated configuration for one loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Task prompt fed to the agent each iteration.
    pub prompt: String,
    /// Iterations to run before the completion promise is even checked.
    pub min_iterations: u32,
    /// Iteration ceiling; 0 means unlimited.
    pub max_iterations: u32,
    /// Phrase the agent must emit inside `<promise>` tags to finish.
    pub completion_promise: String,
    /// Agent name override; `None` means the default project agent.
    pub agent_name: Option<String>,
    /// Whether this run continues a persisted loop.
    pub is_resume: bool,
    /// Iteration recorded by the persisted loop; only meaningful on resume.
    pub resume_from_iteration: u32,
}

impl LoopConfig {
    /// Validate raw command-line input into a config.
    ///
    /// Returns all violations, not just the first; on any failure no partial
    /// config is produced.
    pub fn from_raw(raw: RawLoopConfig) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        if raw.prompt.is_empty() {
            errors.push(ValidationError::new("prompt", "prompt cannot be empty"));
        }

        let min_iterations = match raw.min_iterations.trim().parse::<u32>() {
            Ok(n) if n >= 1 => Some(n),
            Ok(n) => {
                errors.push(ValidationError::new(
                    "min_iterations",
                    format!("must be at least 1, got {n}"),
                ));
                None
            }
            Err(_) => {
                errors.push(ValidationError::new(
                    "min_iterations",
                    format!("not a valid integer: {:?}", raw.min_iterations),
                ));
                None
            }
        };

        let max_iterations = match raw.max_iterations.trim().parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => {
                errors.push(ValidationError::new(
                    "max_iterations",
                    format!("not a valid integer: {:?}", raw.max_iterations),
                ));
                None
            }
        };

        if raw.completion_promise.trim().is_empty() {
            errors.push(ValidationError::new(
                "completion_promise",
                "completion promise cannot be empty",
            ));
        }

        // A nonzero ceiling below the floor would stop the loop before the
        // completion check ever runs.
        if let (Some(min), Some(max)) = (min_iterations, max_iterations) {
            if max != 0 && max < min {
                errors.push(ValidationError::new(
                    "max_iterations",
                    format!("must be 0 (unlimited) or at least min_iterations ({min}), got {max}"),
                ));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            prompt: raw.prompt,
            min_iterations: min_iterations.unwrap_or(1),
            max_iterations: max_iterations.unwrap_or(0),
            completion_promise: raw.completion_promise,
            agent_name: raw.agent_name,
            is_resume: false,
            resume_from_iteration: 0,
        })
    }

    /// Mark this config as resuming from a recorded iteration.
    pub fn resuming_from(mut self, iteration: u32) -> Self {
        self.is_resume = true;
        self.resume_from_iteration = iteration;
        self
    }

    /// Project the config back into raw form (round-trip support).
    pub fn to_raw(&self) -> RawLoopConfig {
        RawLoopConfig {
            prompt: self.prompt.clone(),
            min_iterations: self.min_iterations.to_string(),
            max_iterations: self.max_iterations.to_string(),
            completion_promise: self.completion_promise.clone(),
            agent_name: self.agent_name.clone(),
        }
    }
}
