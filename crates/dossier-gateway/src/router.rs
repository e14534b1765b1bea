use crate::orchestrator::StreamOrchestrator;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub orchestrator: Arc<StreamOrchestrator>,
}

/// Pulls `personName` out of a research request body.
///
/// Rejects anything that is not a JSON object with a non-blank string
/// `personName`, returning the message for the 400 response.
pub fn parse_person_name(body: &[u8]) -> Result<String, &'static str> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| "Request body must be a JSON object")?;
    match value.get("personName") {
        Some(Value::String(name)) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        Some(Value::String(_)) => Err("personName must not be empty"),
        Some(_) => Err("personName must be a string"),
        None => Err("personName is required"),
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// `POST /api/research`: validates the body, then answers with an SSE
/// stream fed by the orchestrator.
pub async fn research_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let person_name = match parse_person_name(&body) {
        Ok(name) => name,
        Err(message) => {
            warn!(error = message, "Rejected research request");
            return bad_request(message);
        }
    };

    info!(person_name = %person_name, "Research request accepted");
    let frames = state.orchestrator.spawn(person_name);
    let stream = ReceiverStream::new(frames).map(Ok::<_, Infallible>);

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

/// `GET /health`
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "dossier",
        "agentReady": state.orchestrator.agent().is_ready(),
    }))
}
