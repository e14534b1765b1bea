pub mod http;
pub mod scripted;

use crate::prompt::TaskRequest;
use crate::stream::AgentEvent;
use async_trait::async_trait;
use dossier_core::DossierResult;
use tokio::sync::mpsc;

pub use http::HttpAgentBackend;
pub use scripted::{ScriptStep, ScriptedBackend};

/// Receiving half of one task's upstream event sequence. The sender is
/// dropped when the upstream stream ends.
pub type AgentEventStream = mpsc::Receiver<AgentEvent>;

/// Trait for upstream agent services.
///
/// A backend runs one research or conversational task per call and yields
/// the agent's raw lifecycle events in order. The gateway never talks to an
/// agent directly; it goes through an [`AgentHandle`](crate::AgentHandle)
/// wrapping one of these.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// One-time setup (session, tool and context registration). The handle
    /// guarantees this runs at most once per process.
    async fn initialize(&self) -> DossierResult<()> {
        Ok(())
    }

    /// Starts a task and returns its event stream.
    ///
    /// Errors returned here happen before any event is produced (connection
    /// refused, rejected credentials). Failures after the stream opened
    /// arrive as [`AgentEvent::Error`].
    async fn run_task(&self, task: TaskRequest) -> DossierResult<AgentEventStream>;
}
