use crate::backends::{AgentBackend, AgentEventStream};
use crate::prompt::TaskRequest;
use dossier_core::{DossierError, DossierResult};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Shared, cloneable access to the upstream agent.
///
/// The backend's `initialize` runs lazily on the first task and at most once
/// per process, even when several requests arrive together. A failed
/// initialization is not cached; the next task retries it.
#[derive(Clone)]
pub struct AgentHandle {
    backend: Arc<dyn AgentBackend>,
    ready: Arc<OnceCell<()>>,
}

impl AgentHandle {
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        Self {
            backend,
            ready: Arc::new(OnceCell::new()),
        }
    }

    /// Runs the backend's one-time initialization if it has not run yet.
    pub async fn ensure_initialized(&self) -> DossierResult<()> {
        self.ready
            .get_or_try_init(|| async {
                self.backend.initialize().await?;
                info!("Agent handle initialized");
                Ok::<(), DossierError>(())
            })
            .await
            .map(|_| ())
    }

    /// True once initialization has succeeded.
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Initializes if needed, then starts `task`.
    pub async fn run_task(&self, task: TaskRequest) -> DossierResult<AgentEventStream> {
        self.ensure_initialized().await?;
        self.backend.run_task(task).await
    }
}
