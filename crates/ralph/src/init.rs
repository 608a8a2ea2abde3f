//! Project initialization: copy the bundled agent descriptor and steering
//! document into `.kiro/` so kiro-cli can discover the Ralph agent.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use ralph_agent::LOCAL_AGENT_PATH;

const STEERING_PATH: &str = ".kiro/steering/ralph-context.md";

const AGENT_TEMPLATE: &str = include_str!("../templates/ralph-wiggum.json");
const STEERING_TEMPLATE: &str = include_str!("../templates/ralph-context.md");

pub fn init_cmd(force: bool) -> Result<i32> {
    let agent_path = Path::new(LOCAL_AGENT_PATH);
    let steering_path = Path::new(STEERING_PATH);

    if !force {
        let existing: Vec<&Path> = [agent_path, steering_path]
            .into_iter()
            .filter(|p| p.exists())
            .collect();
        if !existing.is_empty() {
            eprintln!("{}", "Files already exist:".bright_red());
            for path in existing {
                eprintln!("  - {}", path.display());
            }
            eprintln!();
            eprintln!("Use {} to overwrite.", "--force".bold());
            return Ok(1);
        }
    }

    for path in [agent_path, steering_path] {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    fs::write(agent_path, AGENT_TEMPLATE)
        .with_context(|| format!("Failed to write {}", agent_path.display()))?;
    eprintln!("{} {}", "Created".bright_green(), agent_path.display());

    fs::write(steering_path, STEERING_TEMPLATE)
        .with_context(|| format!("Failed to write {}", steering_path.display()))?;
    eprintln!("{} {}", "Created".bright_green(), steering_path.display());

    eprintln!();
    eprintln!("{}", "Ralph Wiggum initialized!".bold().bright_green());
    eprintln!();
    eprintln!("Start a loop:");
    eprintln!(
        "  {}",
        r#"ralph loop "Your task" --max-iterations 20 --completion-promise "DONE""#.dimmed()
    );

    Ok(0)
}
