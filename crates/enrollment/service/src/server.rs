//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{ServiceConfig, StorageConfig};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::PostgresEnrollmentStore;
use enrollment_engine::{
    EnrollmentStore, MemoryDocumentStore, MemoryEnrollmentStore, MemoryFeeLedger, WorkflowEngine,
};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Enrollment service server
pub struct Server {
    config: ServiceConfig,
    engine: Arc<WorkflowEngine>,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let store: Arc<dyn EnrollmentStore> = match &config.storage {
            StorageConfig::Memory => Arc::new(MemoryEnrollmentStore::new()),
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => Arc::new(
                PostgresEnrollmentStore::new(url, *max_connections, *connect_timeout_secs)
                    .await
                    .map_err(|e| ServiceError::Storage(e.to_string()))?,
            ),
        };

        // Collaborator endpoints are owned by other campus systems; the
        // in-process implementations stand in until their HTTP clients
        // are wired up.
        let engine = Arc::new(WorkflowEngine::new(
            store,
            Arc::new(MemoryFeeLedger::new()),
            Arc::new(MemoryDocumentStore::new()),
        ));

        Ok(Self { config, engine })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> ServiceResult<()> {
        let addr = self.config.server.listen_addr;

        // Log committed domain events in the background
        let mut events = self.engine.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                tracing::debug!(?event, "domain event");
            }
        });

        let state = AppState::new(self.engine.clone());
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("enrolld listening on {}", addr);
        tracing::info!("storage backend: {}", self.config.storage.kind());

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServiceError::Server(e.to_string()))?;

        tracing::info!("enrolld shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
