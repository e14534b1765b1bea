use serde::{Deserialize, Serialize};

/// Connection settings for the hosted agent service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Connect/handshake timeout for each upstream HTTP call. Task duration
    /// is bounded separately by the gateway.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_model_id() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model_id: default_model_id(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AgentConfig {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Applies `DOSSIER_AGENT_URL`, `DOSSIER_AGENT_API_KEY` and
    /// `DOSSIER_MODEL` when set and non-empty.
    pub fn apply_env(&mut self) {
        if let Some(url) = non_empty_env("DOSSIER_AGENT_URL") {
            self.base_url = url;
        }
        if let Some(key) = non_empty_env("DOSSIER_AGENT_API_KEY") {
            self.api_key = key;
        }
        if let Some(model) = non_empty_env("DOSSIER_MODEL") {
            self.model_id = model;
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
