mod config;
mod error;
mod outcome;
mod runner;
mod state;

pub use config::{LoopConfig, RawLoopConfig, ValidationError};
pub use error::LoopError;
pub use outcome::LoopOutcome;
pub use runner::{build_iteration_prompt, LoopRunner, Progress, DEFAULT_SETTLE_DELAY};
pub use state::{LoopState, StateError, StateFile, STATE_FILE_PATH};
