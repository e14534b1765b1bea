use crate::parser::SseLineParser;
use crate::state::ChatState;
use dossier_core::{DossierError, DossierResult, StreamEvent};
use futures_util::StreamExt;
use tracing::{debug, info};
use uuid::Uuid;

const TRUNCATED_MESSAGE: &str = "The connection closed before the research finished.";

/// HTTP client for a running Dossier gateway.
pub struct ResearchClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl ResearchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http: reqwest::Client::new(),
        }
    }

    /// Sends `Authorization: Bearer <key>` with research requests.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Researches `person_name`, applying every event to `state` as it
    /// arrives and passing it to `on_event`. Returns the id of the
    /// assistant message that received the answer.
    ///
    /// A body that ends without `complete` or `error` is finished locally
    /// with an error so the message never stays streaming.
    pub async fn research<F>(
        &self,
        person_name: &str,
        state: &mut ChatState,
        mut on_event: F,
    ) -> DossierResult<Uuid>
    where
        F: FnMut(&StreamEvent),
    {
        let url = format!("{}/api/research", self.base_url);
        let mut req = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "personName": person_name }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DossierError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(DossierError::Http(format!("Gateway error {status}: {detail}")));
        }

        state.push_user(person_name);
        let id = state.begin_assistant();
        info!(%url, message_id = %id, "Research stream opened");

        let mut parser = SseLineParser::new();
        let mut stream = resp.bytes_stream();
        let mut terminated = false;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(error = %e, "Research stream read error");
                    break;
                }
            };
            for event in parser.push(&chunk) {
                terminated |= event.is_terminal();
                state.apply(id, &event);
                on_event(&event);
            }
            if terminated {
                break;
            }
        }

        if !terminated {
            for event in parser.finish() {
                terminated |= event.is_terminal();
                state.apply(id, &event);
                on_event(&event);
            }
        }

        if !terminated {
            let event = StreamEvent::error(TRUNCATED_MESSAGE);
            state.apply(id, &event);
            on_event(&event);
        }
        Ok(id)
    }
}
