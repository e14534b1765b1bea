use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`ToolInvocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Running,
    Complete,
    Error,
}

/// One in-flight or finished tool call made by the upstream agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Opaque id assigned upstream, unique per invocation.
    pub id: String,
    /// Raw tool identifier, e.g. `firecrawl_search`.
    pub name: String,
    /// User-facing label, filled in once the input is known.
    pub display_name: String,
    /// Raw JSON input, accumulated from partial-input fragments.
    pub input: String,
    pub status: ToolStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Result summary or simplified error text.
    pub message: Option<String>,
}

impl ToolInvocation {
    /// Creates a running invocation with an empty input buffer.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: String::new(),
            input: String::new(),
            status: ToolStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            message: None,
        }
    }

    /// Appends a partial-input fragment.
    pub fn push_input(&mut self, fragment: &str) {
        self.input.push_str(fragment);
    }

    /// Marks the invocation complete.
    pub fn complete(&mut self, message: Option<String>) {
        self.status = ToolStatus::Complete;
        self.ended_at = Some(Utc::now());
        self.message = message;
    }

    /// Marks the invocation failed with an already-simplified message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ToolStatus::Error;
        self.ended_at = Some(Utc::now());
        self.message = Some(message.into());
    }

    /// Milliseconds between start and end (or now, while running).
    pub fn elapsed_ms(&self) -> u64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        u64::try_from((end - self.started_at).num_milliseconds()).unwrap_or(0)
    }

    /// Whether the invocation has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.status != ToolStatus::Running
    }
}
