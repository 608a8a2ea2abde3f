//! Cancel an active loop by tearing down its state file.

use std::fs;

use anyhow::{Context, Result};

use ralph_core::StateFile;

const SESSION_FILE: &str = ".kiro/ralph-session.json";

pub fn cancel_cmd() -> Result<i32> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let state_file = StateFile::new(&working_dir);

    if !state_file.exists() {
        eprintln!("No active Ralph loop found.");
        return Ok(0);
    }

    // Best-effort: report the iteration if the file is still readable.
    let iteration = state_file
        .load()
        .map(|state| state.iteration.to_string())
        .unwrap_or_else(|_| "?".into());

    state_file.remove();
    let _ = fs::remove_file(working_dir.join(SESSION_FILE));

    eprintln!("Cancelled Ralph loop (was at iteration {iteration})");
    Ok(0)
}
