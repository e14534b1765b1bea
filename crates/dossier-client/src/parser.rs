use dossier_core::StreamEvent;
use tracing::warn;

/// Incremental parser for the gateway's SSE body.
///
/// Bytes are buffered until a newline, so frames (and multi-byte UTF-8
/// characters) may be split anywhere across network chunks. `data:` lines
/// decode into [`StreamEvent`]s; blank lines and `:` comments are skipped,
/// and payloads that fail to decode are dropped with a warning.
#[derive(Debug, Default)]
pub struct SseLineParser {
    buffer: Vec<u8>,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the events it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Parses whatever remains once the body has ended without a final
    /// newline.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line).into_iter().collect()
    }

    /// Bytes received but not yet terminated by a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn parse_line(raw: &[u8]) -> Option<StreamEvent> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?.trim_start();
    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "Skipping undecodable stream event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "data: {\"type\":\"assistant_text\",\"content\":\"Hi. \",\"timestamp\":1}\n\n";

    #[test]
    fn test_whole_frame() {
        let mut parser = SseLineParser::new();
        let events = parser.push(TEXT.as_bytes());
        assert_eq!(
            events,
            vec![StreamEvent::AssistantText {
                content: "Hi. ".into(),
                timestamp: 1
            }]
        );
        assert_eq!(parser.pending(), 0);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut parser = SseLineParser::new();
        let bytes = TEXT.as_bytes();
        let mut events = Vec::new();
        for piece in bytes.chunks(7) {
            events.extend(parser.push(piece));
        }
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_split_multibyte_character() {
        let frame = "data: {\"type\":\"status\",\"message\":\"Café\",\"timestamp\":2}\n";
        let bytes = frame.as_bytes();
        let split = frame.find('é').unwrap_or(0) + 1;
        let mut parser = SseLineParser::new();
        assert!(parser.push(&bytes[..split]).is_empty());
        let events = parser.push(&bytes[split..]);
        assert_eq!(
            events,
            vec![StreamEvent::Status {
                message: "Café".into(),
                timestamp: 2
            }]
        );
    }

    #[test]
    fn test_comments_blanks_and_garbage_skipped() {
        let mut parser = SseLineParser::new();
        let body = ": keepalive\n\n\ndata: {not json}\nevent: ping\ndata: {\"type\":\"error\",\"message\":\"x\",\"timestamp\":3}\n\n";
        let events = parser.push(body.as_bytes());
        assert_eq!(events.len(), 1);
        assert!(events[0].is_terminal());
    }

    #[test]
    fn test_finish_without_trailing_newline() {
        let mut parser = SseLineParser::new();
        let frame = "data: {\"type\":\"complete\",\"durationMs\":5,\"toolCount\":0,\"timestamp\":4}";
        assert!(parser.push(frame.as_bytes()).is_empty());
        assert_eq!(parser.finish().len(), 1);
        assert!(parser.finish().is_empty());
    }
}
