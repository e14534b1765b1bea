//! HTTP gateway for Dossier.
//!
//! Accepts research queries, runs each through a [`StreamOrchestrator`] and
//! answers with a normalized Server-Sent Events stream.

pub mod middleware;
pub mod orchestrator;
pub mod router;
pub mod server;
pub mod settings;
pub mod writer;

pub use middleware::AuthConfig;
pub use orchestrator::{Phase, StreamOrchestrator};
pub use server::GatewayServer;
pub use settings::{StreamConfig, StreamSettings};
pub use writer::StreamWriter;
