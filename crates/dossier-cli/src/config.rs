use dossier_agent::AgentConfig;
use dossier_gateway::StreamConfig;
use serde::Deserialize;
use std::path::Path;

/// Contents of `dossier.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct DossierConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer keys accepted on `/api/research`. Empty disables auth.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_keys: vec![],
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}

impl DossierConfig {
    /// Reads `path` (defaults when it does not exist), then applies
    /// environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read config file '{}': {e}", path.display())
            })?;
            Self::parse(&raw)?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found; using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// `DOSSIER_AGENT_URL`, `DOSSIER_AGENT_API_KEY`, `DOSSIER_MODEL`, plus
    /// `DOSSIER_API_KEYS` (comma separated) for the gateway's own keys.
    pub fn apply_env(&mut self) {
        self.agent.apply_env();
        if let Ok(keys) = std::env::var("DOSSIER_API_KEYS") {
            let keys: Vec<String> = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
            if !keys.is_empty() {
                self.server.api_keys = keys;
            }
        }
    }

    /// Checks what `serve` needs before binding.
    pub fn validate(&self) -> anyhow::Result<()> {
        let base = self.agent.base_url();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            anyhow::bail!("agent.base_url must be an http(s) URL, got '{base}'");
        }
        if self.agent.model_id.trim().is_empty() {
            anyhow::bail!("agent.model_id must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DossierConfig::parse("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.api_keys.is_empty());
        assert_eq!(config.stream.keepalive_secs, 15);
        assert_eq!(config.stream.research_timeout_secs, 300);
        assert_eq!(config.agent.request_timeout_secs, 30);
        config.validate().unwrap();
    }

    #[test]
    fn test_full_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
base_url = "https://agents.internal:8787/"
model_id = "claude-opus-4"

[server]
host = "0.0.0.0"
port = 8080
api_keys = ["k1", "k2"]

[stream]
keepalive_secs = 5
stall_secs = 20
research_timeout_secs = 120
"#
        )
        .unwrap();

        let config = DossierConfig::parse(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(config.agent.base_url(), "https://agents.internal:8787");
        assert_eq!(config.agent.model_id, "claude-opus-4");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.api_keys, vec!["k1", "k2"]);
        assert_eq!(config.stream.keepalive_secs, 5);
        assert_eq!(config.stream.conversation_timeout_secs, 60);
        assert_eq!(config.stream.channel_capacity, 64);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DossierConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(DossierConfig::parse("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let config = DossierConfig::parse("[agent]\nbase_url = \"ftp://agents\"").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }
}
