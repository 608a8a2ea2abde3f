//! Completion-promise detection and `<ralph-feedback>` extraction.
//!
//! All patterns here are fixed structural regexes compiled once. User input
//! (the configured promise phrase) and agent output are only ever compared
//! as plain strings against captured text, never interpolated into a
//! pattern.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::Feedback;

lazy_static! {
    static ref PROMISE_RE: Regex = tag_regex("promise");
    static ref FEEDBACK_RE: Regex = tag_regex("ralph-feedback");
    static ref QUALITY_RE: Regex = tag_regex("quality-assessment");
    static ref SCORE_RE: Regex = tag_regex("score");
    static ref SUMMARY_RE: Regex = tag_regex("summary");
    static ref IMPROVEMENTS_RE: Regex = tag_regex("improvements");
    static ref NEXT_STEPS_RE: Regex = tag_regex("next-steps");
    static ref IDEAS_RE: Regex = tag_regex("ideas");
    static ref BLOCKERS_RE: Regex = tag_regex("blockers");
}

/// Case-insensitive, multi-line, non-greedy `<name>...</name>` matcher.
/// Only called with literal tag names at static-init time.
fn tag_regex(name: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{name}>(.*?)</{name}>"))
        .unwrap_or_else(|e| panic!("invalid tag pattern for <{name}>: {e}"))
}

/// First occurrence of the tag's inner text, untrimmed.
fn extract_tag<'a>(text: &'a str, re: &Regex) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Check whether `text` contains a `<promise>` tag whose inner content
/// equals the configured phrase.
///
/// Every occurrence is checked; the comparison is exact full-phrase equality
/// after trimming and case-folding both sides, so a phrase like `DONE.NOW`
/// matches only itself and substrings never count.
pub fn contains_completion_promise(text: &str, promise: &str) -> bool {
    let want = promise.trim().to_lowercase();
    if want.is_empty() {
        return false;
    }
    PROMISE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .any(|m| m.as_str().trim().to_lowercase() == want)
}

/// Extract the agent's structured self-assessment from its response text.
///
/// Only the first `<ralph-feedback>` block is considered. Returns `None`
/// when the block is absent or nothing inside it yields a value; callers
/// never see an all-empty `Feedback`.
pub fn extract_feedback(text: &str) -> Option<Feedback> {
    let block = extract_tag(text, &FEEDBACK_RE)?;

    let quality = extract_tag(block, &QUALITY_RE);
    let quality_score = quality
        .and_then(|q| extract_tag(q, &SCORE_RE))
        .and_then(parse_score);
    let quality_summary = quality
        .and_then(|q| extract_tag(q, &SUMMARY_RE))
        .map(|s| sanitize(s.trim()))
        .filter(|s| !s.is_empty());

    let feedback = Feedback {
        quality_score,
        quality_summary,
        improvements: bullet_items(extract_tag(block, &IMPROVEMENTS_RE)),
        next_steps: bullet_items(extract_tag(block, &NEXT_STEPS_RE)),
        ideas: bullet_items(extract_tag(block, &IDEAS_RE)),
        blockers: bullet_items(extract_tag(block, &BLOCKERS_RE)),
    };

    if feedback.is_empty() {
        None
    } else {
        Some(feedback)
    }
}

/// A score is only kept when it parses to an integer in [1, 10].
/// Anything else is silently dropped; a bad score is not an error.
fn parse_score(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|score| (1..=10).contains(score))
}

/// Split a list section into bullet items.
///
/// A line counts only if, after trimming, it starts with `-` or `*`; the
/// marker is stripped and the remainder trimmed. Bullets that end up blank
/// are dropped.
fn bullet_items(section: Option<&str>) -> Vec<String> {
    let Some(section) = section else {
        return Vec::new();
    };
    section
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix('-').or_else(|| line.strip_prefix('*'))
        })
        .map(|item| sanitize(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Strip control characters other than tab/newline/carriage-return.
/// The session payload is externally owned; corrupt or binary content must
/// not reach the persisted state or the terminal.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}
