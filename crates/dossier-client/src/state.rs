use crate::merge::LegacyMerger;
use dossier_core::{Message, StreamEvent, ToolStatus};
use std::collections::HashSet;
use uuid::Uuid;

/// Marker placed in front of an error appended to an assistant message.
pub const ERROR_MARKER: &str = "**Error:**";

/// One row of the tool activity list shown next to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatusEntry {
    pub tool_id: String,
    pub tool_name: String,
    pub display_name: String,
    pub status: ToolStatus,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
}

/// Client-side conversation state built from stream events.
///
/// Assistant text is appended to the message it belongs to; tool events
/// maintain a separate status list. Once a message sees `complete` or
/// `error` it stops accepting anything.
#[derive(Debug, Default)]
pub struct ChatState {
    messages: Vec<Message>,
    tools: Vec<ToolStatusEntry>,
    finished: HashSet<Uuid>,
    status: Option<String>,
    legacy: Option<LegacyMerger>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State that merges assistant text through [`LegacyMerger`] instead of
    /// appending it verbatim.
    pub fn with_legacy_merge(merger: LegacyMerger) -> Self {
        Self {
            legacy: Some(merger),
            ..Self::default()
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> Uuid {
        let message = Message::user(content);
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Adds an empty streaming assistant message and returns its id.
    pub fn begin_assistant(&mut self) -> Uuid {
        let message = Message::assistant_pending();
        let id = message.id;
        self.messages.push(message);
        self.tools.clear();
        self.status = None;
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Tool activity for the current assistant turn, in start order.
    pub fn tools(&self) -> &[ToolStatusEntry] {
        &self.tools
    }

    /// Latest `status` message for the current turn.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_finished(&self, id: Uuid) -> bool {
        self.finished.contains(&id)
    }

    /// Applies one event to message `id`. Returns false when the event was
    /// ignored (unknown or already finished message).
    pub fn apply(&mut self, id: Uuid, event: &StreamEvent) -> bool {
        if self.finished.contains(&id) {
            return false;
        }
        let legacy = self.legacy;
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };

        match event {
            StreamEvent::AssistantText { content, .. } => {
                message.content = match legacy {
                    Some(merger) => merger.merge(&message.content, content),
                    None => {
                        let mut merged = std::mem::take(&mut message.content);
                        merged.push_str(content);
                        merged
                    }
                };
            }

            StreamEvent::ToolStart {
                tool_id,
                tool_name,
                display_name,
                ..
            } => {
                if !self.tools.iter().any(|t| &t.tool_id == tool_id) {
                    self.tools.push(ToolStatusEntry {
                        tool_id: tool_id.clone(),
                        tool_name: tool_name.clone(),
                        display_name: display_name.clone(),
                        status: ToolStatus::Running,
                        error: None,
                        duration_ms: None,
                    });
                }
            }

            StreamEvent::ToolComplete {
                tool_id,
                tool_name,
                display_name,
                duration_ms,
                ..
            } => {
                let entry = self.tool_entry(tool_id, tool_name, display_name);
                entry.status = ToolStatus::Complete;
                entry.duration_ms = Some(*duration_ms);
            }

            StreamEvent::ToolError {
                tool_id,
                tool_name,
                display_name,
                error,
                ..
            } => {
                let entry = self.tool_entry(tool_id, tool_name, display_name);
                entry.status = ToolStatus::Error;
                entry.error = Some(error.clone());
            }

            StreamEvent::Status { message: text, .. } => {
                self.status = Some(text.clone());
            }

            StreamEvent::Complete { .. } => {
                message.streaming = false;
                self.finished.insert(id);
                self.status = None;
            }

            StreamEvent::Error { message: text, .. } => {
                let body = message.content.trim_end();
                message.content = if body.is_empty() {
                    format!("{ERROR_MARKER} {text}")
                } else {
                    format!("{body}\n\n{ERROR_MARKER} {text}")
                };
                message.streaming = false;
                self.finished.insert(id);
                self.status = None;
            }
        }
        true
    }

    fn tool_entry(&mut self, tool_id: &str, tool_name: &str, display_name: &str) -> &mut ToolStatusEntry {
        let idx = match self.tools.iter().position(|t| t.tool_id == tool_id) {
            Some(idx) => idx,
            None => {
                self.tools.push(ToolStatusEntry {
                    tool_id: tool_id.to_string(),
                    tool_name: tool_name.to_string(),
                    display_name: display_name.to_string(),
                    status: ToolStatus::Running,
                    error: None,
                    duration_ms: None,
                });
                self.tools.len() - 1
            }
        };
        &mut self.tools[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> StreamEvent {
        StreamEvent::AssistantText {
            content: s.into(),
            timestamp: 1,
        }
    }

    fn complete() -> StreamEvent {
        StreamEvent::Complete {
            duration_ms: 10,
            tool_count: 0,
            timestamp: 2,
        }
    }

    #[test]
    fn test_text_accumulates() {
        let mut state = ChatState::new();
        let id = state.begin_assistant();
        assert!(state.apply(id, &text("Hello")));
        assert!(state.apply(id, &text(" world.")));
        let msg = state.message(id).map(|m| m.content.clone());
        assert_eq!(msg.as_deref(), Some("Hello world."));
    }

    #[test]
    fn test_complete_only_stops_streaming() {
        let mut state = ChatState::new();
        let id = state.begin_assistant();
        state.apply(id, &text("Jane is a pilot. "));
        assert!(state.apply(id, &complete()));

        let msg = state.message(id).cloned();
        let msg = msg.as_ref();
        assert_eq!(msg.map(|m| m.content.as_str()), Some("Jane is a pilot. "));
        assert_eq!(msg.map(|m| m.streaming), Some(false));

        assert!(!state.apply(id, &text("late text")));
        assert_eq!(
            state.message(id).map(|m| m.content.as_str()),
            Some("Jane is a pilot. ")
        );
        assert!(state.is_finished(id));
    }

    #[test]
    fn test_error_appends_marked_suffix() {
        let mut state = ChatState::new();
        let id = state.begin_assistant();
        state.apply(id, &text("Partial answer "));
        state.apply(
            id,
            &StreamEvent::Error {
                message: "The research took too long.".into(),
                timestamp: 3,
            },
        );
        let msg = state.message(id);
        assert_eq!(
            msg.map(|m| m.content.as_str()),
            Some("Partial answer\n\n**Error:** The research took too long.")
        );
        assert_eq!(msg.map(|m| m.streaming), Some(false));
        assert!(!state.apply(id, &complete()));
    }

    #[test]
    fn test_tool_lifecycle() {
        let mut state = ChatState::new();
        let id = state.begin_assistant();
        state.apply(
            id,
            &StreamEvent::ToolStart {
                tool_id: "t1".into(),
                tool_name: "firecrawl_search".into(),
                display_name: "Web Search: Jane".into(),
                timestamp: 1,
            },
        );
        state.apply(
            id,
            &StreamEvent::ToolStart {
                tool_id: "t2".into(),
                tool_name: "firecrawl_scrape".into(),
                display_name: "Reading Page: LinkedIn".into(),
                timestamp: 2,
            },
        );
        state.apply(
            id,
            &StreamEvent::ToolComplete {
                tool_id: "t1".into(),
                tool_name: "firecrawl_search".into(),
                display_name: "Web Search: Jane".into(),
                duration_ms: 812,
                timestamp: 3,
            },
        );
        state.apply(
            id,
            &StreamEvent::ToolError {
                tool_id: "t2".into(),
                tool_name: "firecrawl_scrape".into(),
                display_name: "Reading Page: LinkedIn".into(),
                error: "Access blocked by the site. Trying another source...".into(),
                timestamp: 4,
            },
        );

        let tools = state.tools();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].status, ToolStatus::Complete);
        assert_eq!(tools[0].duration_ms, Some(812));
        assert_eq!(tools[1].status, ToolStatus::Error);
        assert!(tools[1].error.is_some());
        assert_eq!(state.message(id).map(|m| m.content.as_str()), Some(""));
    }

    #[test]
    fn test_status_and_unknown_message() {
        let mut state = ChatState::new();
        let id = state.begin_assistant();
        state.apply(
            id,
            &StreamEvent::Status {
                message: "Researching Jane...".into(),
                timestamp: 1,
            },
        );
        assert_eq!(state.status(), Some("Researching Jane..."));
        assert!(!state.apply(Uuid::new_v4(), &text("stray")));
    }

    #[test]
    fn test_legacy_merge_drops_resent_text() {
        let mut state = ChatState::with_legacy_merge(LegacyMerger::default());
        let id = state.begin_assistant();
        state.apply(id, &text("Jane Q. Public is a structural engineer. "));
        state.apply(id, &text("Jane Q. Public is a structural engineer."));
        state.apply(id, &text("She lives in Ohio."));
        assert_eq!(
            state.message(id).map(|m| m.content.as_str()),
            Some("Jane Q. Public is a structural engineer. She lives in Ohio.")
        );
    }
}
