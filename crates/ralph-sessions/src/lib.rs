//! # ralph-sessions
//!
//! Read-only access to the Kiro CLI conversation store, plus the parsers
//! that inspect what the agent said.
//!
//! Kiro persists conversations in a SQLite database keyed by working
//! directory. This crate never writes to that database; it only fetches the
//! most recent record for a directory and scans its assistant turns for the
//! completion promise and the structured `<ralph-feedback>` block.

pub mod parser;
pub mod store;
pub mod types;

pub use parser::{contains_completion_promise, extract_feedback};
pub use store::SessionStore;
pub use types::{ConversationRecord, Feedback, HistoryTurn};
