use super::{AgentBackend, AgentEventStream};
use crate::config::AgentConfig;
use crate::prompt::TaskRequest;
use crate::stream::AgentEvent;
use async_trait::async_trait;
use dossier_core::{DossierError, DossierResult};
use futures_util::StreamExt;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Agent service reached over HTTP.
///
/// `initialize` opens a session at `{base_url}/v1/session`; `run_task` posts
/// to `{base_url}/v1/tasks` and reads an SSE body of `data: <event json>`
/// lines.
pub struct HttpAgentBackend {
    config: AgentConfig,
    http: reqwest::Client,
    session_id: OnceLock<String>,
}

impl HttpAgentBackend {
    pub fn new(config: AgentConfig) -> DossierResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DossierError::Http(e.to_string()))?;
        Ok(Self {
            config,
            http,
            session_id: OnceLock::new(),
        })
    }

    /// Session id returned by the agent service, once initialized.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.get().map(String::as_str)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url(), path);
        let mut req = self
            .http
            .post(url)
            .header("content-type", "application/json");
        if !self.config.api_key.is_empty() {
            req = req.header("x-api-key", &self.config.api_key);
        }
        req
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn initialize(&self) -> DossierResult<()> {
        let body = serde_json::json!({
            "model": self.config.model_id,
            "tools": ["firecrawl_search", "firecrawl_scrape"],
        });

        let resp = self
            .post("/v1/session")
            .json(&body)
            .send()
            .await
            .map_err(|e| DossierError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(DossierError::Agent(format!(
                "Agent session error {}: {}",
                status, error_body
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DossierError::Http(e.to_string()))?;
        let session = json["sessionId"]
            .as_str()
            .or_else(|| json["session_id"].as_str())
            .unwrap_or_default()
            .to_string();

        if !session.is_empty() {
            let _ = self.session_id.set(session.clone());
        }
        info!(session_id = %session, model = %self.config.model_id, "Agent session ready");
        Ok(())
    }

    async fn run_task(&self, task: TaskRequest) -> DossierResult<AgentEventStream> {
        let mut body = serde_json::to_value(&task)?;
        if let Some(session) = self.session_id() {
            body["sessionId"] = serde_json::json!(session);
        }

        let resp = self
            .post("/v1/tasks")
            .header("accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| DossierError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(DossierError::Http(format!(
                "Agent API error {}: {}",
                status, error_body
            )));
        }

        let (tx, rx) = mpsc::channel::<AgentEvent>(EVENT_CHANNEL_CAPACITY);
        let byte_stream = resp.bytes_stream();

        tokio::spawn(async move {
            let mut stream = byte_stream;
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(error = %e, "Agent stream read error");
                        let _ = tx
                            .send(AgentEvent::Error {
                                message: format!("Stream read error: {e}"),
                            })
                            .await;
                        return;
                    }
                };

                buffer.extend_from_slice(&chunk);

                for data in drain_data_lines(&mut buffer) {
                    let event = AgentEvent::decode(&data);
                    if let AgentEvent::Unknown { kind } = &event {
                        debug!(kind = %kind, "Skipping unrecognised agent event");
                        continue;
                    }
                    if tx.send(event).await.is_err() {
                        debug!("Agent event receiver dropped; stopping pump");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Removes every complete line from `buffer` and returns the `data:` payloads
/// among them. Bytes after the last newline stay buffered, so a multi-byte
/// character split across network chunks is decoded only once whole.
fn drain_data_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
            continue;
        };
        if data == "[DONE]" {
            continue;
        }
        out.push(data.to_string());
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_keeps_split_character_buffered() {
        let frame = "data: {\"type\":\"text\",\"text\":\"Zoë\"}\n\n".as_bytes();
        let split = frame.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut buffer = frame[..split].to_vec();
        assert!(drain_data_lines(&mut buffer).is_empty());
        assert_eq!(buffer.len(), split);

        buffer.extend_from_slice(&frame[split..]);
        assert_eq!(
            drain_data_lines(&mut buffer),
            vec![r#"{"type":"text","text":"Zoë"}"#.to_string()]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_skips_comments_and_done() {
        let mut buffer = b": ping\n\ndata: [DONE]\nevent: x\ndata: {}\npartial".to_vec();
        assert_eq!(drain_data_lines(&mut buffer), vec!["{}".to_string()]);
        assert_eq!(buffer, b"partial");
    }
}
