use thiserror::Error;

/// A convenience `Result` alias using [`DossierError`].
pub type DossierResult<T> = Result<T, DossierError>;

/// Top-level error type shared by every Dossier crate.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum DossierError {
    /// The upstream agent rejected or failed a task.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An outbound HTTP request failed (agent service, gateway client).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Config error: {0}")]
    Config(String),

    /// The HTTP gateway could not bind or serve.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// An event stream was malformed or ended unexpectedly.
    #[error("Stream error: {0}")]
    Stream(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DossierError {
    /// Returns true when the error text indicates an authentication or
    /// credential failure. Such failures repeat on every retry, so callers
    /// treat them as fatal.
    pub fn is_auth_failure(&self) -> bool {
        is_auth_failure_text(&self.to_string())
    }
}

/// Case-insensitive check for authentication failures in raw upstream error
/// text. Phrases match anywhere; status codes and "forbidden" only as whole
/// words, so "4013 records" is not an auth failure.
pub fn is_auth_failure_text(text: &str) -> bool {
    const PHRASES: &[&str] = &[
        "authentication",
        "unauthorized",
        "invalid api key",
        "invalid x-api-key",
        "api key",
        "credential",
    ];
    const WORDS: &[&str] = &["401", "403", "forbidden"];

    let lower = text.to_lowercase();
    PHRASES.iter().any(|p| lower.contains(p))
        || lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| WORDS.contains(&word))
}
