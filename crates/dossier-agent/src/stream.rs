use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events produced by the upstream agent while it runs one task.
///
/// Decoded at the boundary by [`AgentEvent::decode`], which never fails:
/// anything it does not recognise becomes [`AgentEvent::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A chunk of assistant prose.
    Text {
        #[serde(alias = "content", alias = "delta")]
        text: String,
    },

    /// The agent decided to call a tool. Input follows in fragments.
    ToolUse {
        #[serde(alias = "tool_use_id", alias = "toolUseId")]
        id: String,
        #[serde(alias = "tool_name", alias = "toolName")]
        name: String,
    },

    /// A fragment of a tool call's JSON input.
    ToolUseInput {
        #[serde(alias = "tool_use_id", alias = "toolUseId")]
        id: String,
        #[serde(alias = "partialJson", alias = "input")]
        partial_json: String,
    },

    /// The tool call is approved and about to execute.
    ToolUseApproved {
        #[serde(alias = "tool_use_id", alias = "toolUseId")]
        id: String,
    },

    /// The tool call returned.
    ToolUseResult {
        #[serde(alias = "tool_use_id", alias = "toolUseId")]
        id: String,
        #[serde(default, alias = "output", alias = "content")]
        result: Option<Value>,
    },

    /// The tool call failed. The agent usually retries on its own.
    ToolUseError {
        #[serde(alias = "tool_use_id", alias = "toolUseId")]
        id: String,
        #[serde(default, alias = "message")]
        error: String,
    },

    /// The task finished.
    Completed {
        #[serde(default)]
        result: Option<Value>,
    },

    /// The task failed as a whole.
    Error {
        #[serde(default, alias = "error")]
        message: String,
    },

    /// An event type this crate does not handle, or a malformed payload.
    #[serde(skip_deserializing)]
    Unknown { kind: String },
}

impl AgentEvent {
    /// Decodes one JSON payload. Total: malformed input yields `Unknown`.
    pub fn decode(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(_) => {
                return AgentEvent::Unknown {
                    kind: "invalid_json".to_string(),
                }
            }
        };
        Self::from_value(value)
    }

    /// Decodes an already-parsed payload. Total, like [`AgentEvent::decode`].
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        serde_json::from_value(value).unwrap_or(AgentEvent::Unknown { kind })
    }

    /// Tool call id for tool lifecycle events.
    pub fn tool_id(&self) -> Option<&str> {
        match self {
            AgentEvent::ToolUse { id, .. }
            | AgentEvent::ToolUseInput { id, .. }
            | AgentEvent::ToolUseApproved { id }
            | AgentEvent::ToolUseResult { id, .. }
            | AgentEvent::ToolUseError { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Renders a tool result as short plain text for logs.
pub fn result_preview(result: Option<&Value>, max_chars: usize) -> String {
    let text = match result {
        None | Some(Value::Null) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if text.chars().count() <= max_chars {
        text
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
