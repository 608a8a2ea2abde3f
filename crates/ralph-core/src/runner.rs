use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use ralph_agent::Agent;
use ralph_sessions::{contains_completion_promise, extract_feedback, Feedback, SessionStore};

use crate::error::LoopError;
use crate::outcome::LoopOutcome;
use crate::state::{LoopState, StateFile};
use crate::LoopConfig;

/// Wait between agent exit and the session query; the agent's store flushes
/// asynchronously, so reading immediately can miss the final turn.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Progress values shared with the interrupt handler.
///
/// The Ctrl+C handler runs outside the loop and must see the latest
/// iteration number and feedback to persist a resumable snapshot, so the
/// runner refreshes this cell as it goes. The handler only reads and then
/// exits the process.
#[derive(Debug, Clone)]
pub struct Progress {
    pub iteration: u32,
    pub feedback: Option<Feedback>,
    pub started_at: DateTime<Utc>,
}

impl Progress {
    fn new() -> Self {
        Self {
            iteration: 0,
            feedback: None,
            started_at: Utc::now(),
        }
    }
}

/// Drives the iterate-until-promised loop.
///
/// Strictly sequential: one agent invocation in flight, one session read per
/// iteration. Per iteration the runner persists a snapshot, invokes the
/// agent, waits for the store to settle, reads the latest session, carries
/// feedback forward, and evaluates the termination conditions.
pub struct LoopRunner<'a> {
    agent: &'a dyn Agent,
    store: &'a SessionStore,
    working_dir: PathBuf,
    state_file: StateFile,
    settle_delay: Duration,
    progress: Arc<Mutex<Progress>>,
}

impl<'a> LoopRunner<'a> {
    pub fn new(agent: &'a dyn Agent, store: &'a SessionStore, working_dir: PathBuf) -> Self {
        let state_file = StateFile::new(&working_dir);
        Self {
            agent,
            store,
            working_dir,
            state_file,
            settle_delay: DEFAULT_SETTLE_DELAY,
            progress: Arc::new(Mutex::new(Progress::new())),
        }
    }

    /// Override the settle delay (tests run with zero).
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Handle for the interrupt path to read the latest progress.
    pub fn progress_handle(&self) -> Arc<Mutex<Progress>> {
        self.progress.clone()
    }

    pub fn state_file(&self) -> &StateFile {
        &self.state_file
    }

    /// Run the loop to an orderly stop.
    ///
    /// `initial_feedback` seeds the first iteration's prompt when resuming.
    /// Resume restarts *at* the recorded iteration, re-running it: the
    /// interrupted iteration made unknown partial progress.
    pub async fn run(
        &self,
        config: &LoopConfig,
        initial_feedback: Option<Feedback>,
    ) -> Result<LoopOutcome, LoopError> {
        let started_at = self.progress.lock().expect("progress cell poisoned").started_at;

        let mut iteration: u32 = if config.is_resume {
            config.resume_from_iteration.saturating_sub(1)
        } else {
            // A leftover file from a crashed run must not be mistaken for
            // live state.
            self.state_file.remove();
            0
        };
        let mut feedback = initial_feedback;

        loop {
            iteration += 1;

            let state = LoopState {
                active: true,
                iteration,
                min_iterations: config.min_iterations,
                max_iterations: config.max_iterations,
                completion_promise: config.completion_promise.clone(),
                started_at,
                prompt: config.prompt.clone(),
                previous_feedback: feedback.clone(),
            };
            self.state_file.save(&state);

            {
                let mut progress = self.progress.lock().expect("progress cell poisoned");
                progress.iteration = iteration;
                progress.feedback = feedback.clone();
            }

            info!(iteration, agent = self.agent.name(), "Starting iteration");

            let prompt = build_iteration_prompt(&config.prompt, feedback.as_ref());
            let exit_code = self.agent.run_chat(&prompt).await?;
            if exit_code != 0 {
                warn!(exit_code, "Agent exited non-zero, continuing anyway");
            }

            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }

            let session = self.store.latest_for_dir(&self.working_dir);
            let last_text = session
                .as_ref()
                .and_then(|record| record.last_assistant_text());

            feedback = last_text.and_then(extract_feedback);
            self.progress.lock().expect("progress cell poisoned").feedback = feedback.clone();

            if iteration >= config.min_iterations {
                let promised = last_text
                    .map(|text| contains_completion_promise(text, &config.completion_promise))
                    .unwrap_or(false);
                if promised {
                    info!(iteration, "Completion promise detected");
                    self.state_file.remove();
                    return Ok(LoopOutcome::Completed {
                        iterations: iteration,
                    });
                }
            } else {
                info!(
                    iteration,
                    min_iterations = config.min_iterations,
                    "Minimum not reached, skipping completion check"
                );
            }

            if config.max_iterations > 0 && iteration >= config.max_iterations {
                warn!(
                    max_iterations = config.max_iterations,
                    "Max iterations reached"
                );
                let mut stopped = state;
                stopped.active = false;
                stopped.previous_feedback = feedback.clone();
                self.state_file.save(&stopped);
                return Ok(LoopOutcome::MaxIterationsReached {
                    iterations: iteration,
                });
            }
        }
    }
}

/// Compose the prompt for one iteration.
///
/// The base task text goes out verbatim; when the previous iteration left
/// structured feedback, a rendered section follows so the agent sees its own
/// last self-assessment.
pub fn build_iteration_prompt(base: &str, feedback: Option<&Feedback>) -> String {
    let Some(fb) = feedback else {
        return base.to_string();
    };

    let mut prompt = String::from(base);
    prompt.push_str("\n\n## Feedback from your previous iteration\n");
    if let Some(score) = fb.quality_score {
        prompt.push_str(&format!("\nQuality score: {score}/10\n"));
    }
    if let Some(summary) = &fb.quality_summary {
        prompt.push_str(&format!("\nSummary: {summary}\n"));
    }
    push_section(&mut prompt, "Improvements", &fb.improvements);
    push_section(&mut prompt, "Next steps", &fb.next_steps);
    push_section(&mut prompt, "Ideas", &fb.ideas);
    push_section(&mut prompt, "Blockers", &fb.blockers);
    prompt
}

fn push_section(prompt: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push_str(&format!("\n{title}:\n"));
    for item in items {
        prompt.push_str(&format!("- {item}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_feedback_is_verbatim() {
        assert_eq!(build_iteration_prompt("do the thing", None), "do the thing");
    }

    #[test]
    fn test_prompt_renders_feedback_sections() {
        let fb = Feedback {
            quality_score: Some(6),
            quality_summary: Some("halfway".into()),
            improvements: vec!["tests".into()],
            next_steps: vec!["docs".into(), "lint".into()],
            ideas: vec![],
            blockers: vec![],
        };
        let prompt = build_iteration_prompt("task", Some(&fb));
        assert!(prompt.starts_with("task"));
        assert!(prompt.contains("Quality score: 6/10"));
        assert!(prompt.contains("Summary: halfway"));
        assert!(prompt.contains("Improvements:\n- tests"));
        assert!(prompt.contains("Next steps:\n- docs\n- lint"));
        assert!(!prompt.contains("Ideas:"));
        assert!(!prompt.contains("Blockers:"));
    }
}
