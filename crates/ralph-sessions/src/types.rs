use serde::{Deserialize, Serialize};

/// A conversation fetched from the Kiro store.
///
/// Kiro serializes far more than we care about; everything beyond the
/// conversation id and the turn history is ignored on deserialization.
/// `history` is required so that a payload without a list-shaped history is
/// rejected at parse time rather than silently treated as empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(default)]
    pub conversation_id: String,
    pub history: Vec<HistoryTurn>,
}

/// A single turn in the conversation history.
///
/// The assistant payload has several shapes (`Response`, `ToolUse`, ...);
/// only `Response` carries text we can scan, so both sides are kept as raw
/// JSON and probed on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryTurn {
    #[serde(default)]
    pub user: Option<serde_json::Value>,
    #[serde(default)]
    pub assistant: Option<serde_json::Value>,
}

impl HistoryTurn {
    /// Text of the assistant `Response` payload, if this turn has one.
    pub fn assistant_text(&self) -> Option<&str> {
        self.assistant
            .as_ref()?
            .get("Response")?
            .get("content")?
            .as_str()
    }
}

impl ConversationRecord {
    /// The most recent non-empty assistant response text.
    ///
    /// Scans newest-first: the last turn is usually a `Response`, but tool
    /// use can leave trailing turns without text.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find_map(|turn| turn.assistant_text().filter(|text| !text.is_empty()))
    }
}

/// Structured self-assessment the agent may emit each iteration.
///
/// Carried into the next iteration's prompt and persisted in the loop state
/// so a resumed run keeps its context. An all-empty record is never
/// constructed; [`crate::extract_feedback`] returns `None` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improvements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ideas: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<String>,
}

impl Feedback {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.quality_score.is_none()
            && self.quality_summary.is_none()
            && self.improvements.is_empty()
            && self.next_steps.is_empty()
            && self.ideas.is_empty()
            && self.blockers.is_empty()
    }
}
