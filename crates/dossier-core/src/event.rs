use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Normalized events pushed to the browser over the outbound SSE stream.
///
/// Each frame on the wire is `data: <json>\n\n` where `<json>` is one of these
/// variants, tagged by `type`. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A complete sentence or raw Markdown chunk of assistant prose.
    AssistantText { content: String, timestamp: i64 },

    /// A tool call was approved and is now running.
    #[serde(rename_all = "camelCase")]
    ToolStart {
        tool_id: String,
        tool_name: String,
        display_name: String,
        timestamp: i64,
    },

    /// A tool call returned a result.
    #[serde(rename_all = "camelCase")]
    ToolComplete {
        tool_id: String,
        tool_name: String,
        display_name: String,
        #[serde(default)]
        duration_ms: u64,
        timestamp: i64,
    },

    /// A tool call failed. Non-fatal; the task continues.
    #[serde(rename_all = "camelCase")]
    ToolError {
        tool_id: String,
        tool_name: String,
        display_name: String,
        error: String,
        timestamp: i64,
    },

    /// Informational progress (task started, upstream stalled).
    Status { message: String, timestamp: i64 },

    /// The task finished. Terminal.
    #[serde(rename_all = "camelCase")]
    Complete {
        duration_ms: u64,
        tool_count: usize,
        timestamp: i64,
    },

    /// The task failed. Terminal.
    Error { message: String, timestamp: i64 },
}

impl StreamEvent {
    /// Wire name of the event category.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::AssistantText { .. } => "assistant_text",
            StreamEvent::ToolStart { .. } => "tool_start",
            StreamEvent::ToolComplete { .. } => "tool_complete",
            StreamEvent::ToolError { .. } => "tool_error",
            StreamEvent::Status { .. } => "status",
            StreamEvent::Complete { .. } => "complete",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Milliseconds since the Unix epoch at which the event was produced.
    pub fn timestamp(&self) -> i64 {
        match self {
            StreamEvent::AssistantText { timestamp, .. }
            | StreamEvent::ToolStart { timestamp, .. }
            | StreamEvent::ToolComplete { timestamp, .. }
            | StreamEvent::ToolError { timestamp, .. }
            | StreamEvent::Status { timestamp, .. }
            | StreamEvent::Complete { timestamp, .. }
            | StreamEvent::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Overwrites the event timestamp.
    pub fn set_timestamp(&mut self, ts: i64) {
        match self {
            StreamEvent::AssistantText { timestamp, .. }
            | StreamEvent::ToolStart { timestamp, .. }
            | StreamEvent::ToolComplete { timestamp, .. }
            | StreamEvent::ToolError { timestamp, .. }
            | StreamEvent::Status { timestamp, .. }
            | StreamEvent::Complete { timestamp, .. }
            | StreamEvent::Error { timestamp, .. } => *timestamp = ts,
        }
    }

    /// `complete` and `error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }

    /// Creates an `assistant_text` event stamped now.
    pub fn assistant_text(content: impl Into<String>) -> Self {
        StreamEvent::AssistantText {
            content: content.into(),
            timestamp: now_millis(),
        }
    }

    /// Creates a `status` event stamped now.
    pub fn status(message: impl Into<String>) -> Self {
        StreamEvent::Status {
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    /// Creates an `error` event stamped now.
    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    /// Encodes the event as one SSE frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> crate::DossierResult<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("data: {json}\n\n"))
    }
}

/// The SSE comment frame sent on the idle timer.
pub const KEEPALIVE_FRAME: &str = ": keepalive\n\n";

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_start_wire_shape() {
        let event = StreamEvent::ToolStart {
            tool_id: "toolu_1".into(),
            tool_name: "firecrawl_search".into(),
            display_name: "Web Search: Jane".into(),
            timestamp: 42,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool_start");
        assert_eq!(value["toolId"], "toolu_1");
        assert_eq!(value["toolName"], "firecrawl_search");
        assert_eq!(value["displayName"], "Web Search: Jane");
        assert_eq!(value["timestamp"], 42);
    }

    #[test]
    fn test_complete_wire_shape() {
        let event = StreamEvent::Complete {
            duration_ms: 1500,
            tool_count: 3,
            timestamp: 7,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["durationMs"], 1500);
        assert_eq!(value["toolCount"], 3);
        assert!(event.is_terminal());
    }

    #[test]
    fn test_sse_frame_format() {
        let event = StreamEvent::AssistantText {
            content: "Hi.".into(),
            timestamp: 1,
        };
        let frame = event.to_sse_frame().unwrap();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("}\n\n"));
        assert!(frame.contains("\"type\":\"assistant_text\""));
    }

    #[test]
    fn test_set_timestamp() {
        let mut event = StreamEvent::status("working");
        event.set_timestamp(99);
        assert_eq!(event.timestamp(), 99);
        assert_eq!(event.kind(), "status");
        assert!(!event.is_terminal());
    }
}
