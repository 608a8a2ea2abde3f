/// Terminal result of a loop run.
///
/// Interruption is not represented here: the Ctrl+C handler persists its own
/// snapshot and exits the process directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The agent emitted the completion promise after the iteration floor.
    Completed { iterations: u32 },
    /// The iteration ceiling was hit; a resumable snapshot remains on disk.
    MaxIterationsReached { iterations: u32 },
}

impl LoopOutcome {
    pub fn iterations(&self) -> u32 {
        match self {
            Self::Completed { iterations } => *iterations,
            Self::MaxIterationsReached { iterations } => *iterations,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Both outcomes are orderly stops, not failures.
    pub fn exit_code(&self) -> i32 {
        0
    }
}
