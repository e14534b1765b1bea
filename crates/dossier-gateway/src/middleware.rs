use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

/// Auth configuration for the research route.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// API keys that are allowed to call the research route. Empty = no auth required.
    pub api_keys: Vec<String>,
}

impl AuthConfig {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: api_keys
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Returns true if authentication is enabled (at least one key configured).
    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }
}

#[derive(serde::Deserialize, Default)]
pub struct AuthQuery {
    pub api_key: Option<String>,
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Auth middleware: validates an API key from header or query param.
///
/// Checks `Authorization: Bearer <key>` first, then `?api_key=<key>`.
/// If no API keys are configured, all requests are allowed.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    headers: HeaderMap,
    query: Query<AuthQuery>,
    request: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(request).await;
    }

    let key_from_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());

    match key_from_header.or_else(|| query.api_key.clone()) {
        Some(k) if auth.accepts(&k) => next.run(request).await,
        Some(_) => {
            warn!("Rejected request: invalid API key");
            unauthorized("Invalid API key")
        }
        None => {
            warn!("Rejected request: missing API key");
            unauthorized("API key required")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_disabled() {
        assert!(!AuthConfig::new(vec![]).is_enabled());
        assert!(!AuthConfig::new(vec!["  ".to_string()]).is_enabled());
    }

    #[test]
    fn test_auth_config_enabled() {
        let config = AuthConfig::new(vec![" key123 ".to_string()]);
        assert!(config.is_enabled());
        assert!(config.accepts("key123"));
        assert!(!config.accepts("key124"));
    }
}
