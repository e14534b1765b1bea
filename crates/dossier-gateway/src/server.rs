use crate::middleware::{auth_middleware, AuthConfig};
use crate::orchestrator::StreamOrchestrator;
use crate::router::{health_handler, research_handler, AppState};
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use dossier_core::{DossierError, DossierResult};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The HTTP gateway: `POST /api/research` and `GET /health`.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the gateway without auth.
    pub fn build(orchestrator: Arc<StreamOrchestrator>) -> Router {
        Self::build_with_auth(orchestrator, AuthConfig::default())
    }

    /// Build the gateway; the research route requires a key when `auth`
    /// has any configured. Health stays open.
    pub fn build_with_auth(orchestrator: Arc<StreamOrchestrator>, auth: AuthConfig) -> Router {
        let state = Arc::new(AppState { orchestrator });

        let mut research = Router::new().route("/api/research", post(research_handler));
        if auth.is_enabled() {
            research = research.route_layer(axum_mw::from_fn_with_state(
                Arc::new(auth),
                auth_middleware,
            ));
        }

        Router::new()
            .route("/health", get(health_handler))
            .merge(research)
            .with_state(state)
    }

    /// Serves `app` on `listener` until `shutdown` resolves. In-flight
    /// streams are allowed to finish.
    pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> DossierResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| DossierError::Gateway(e.to_string()))?;
        info!(%addr, "Gateway listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DossierError::Gateway(e.to_string()))?;
        info!("Gateway stopped");
        Ok(())
    }
}
