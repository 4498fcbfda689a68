//! Chronicle Query HTTP API
//!
//! Axum front end over the [`DataService`](crate::service::DataService).
//!
//! # Endpoints
//!
//! ## RPC
//! - `POST /rpc/query` - Run a batch of SQL or structured queries
//! - `POST /rpc/range_limit` - First and last stored epochs of a bucket
//! - `POST /rpc/list_symbols` - Every stored symbol
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe (follows the query gate)
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,no_run
//! use chronicle_query::api::{serve, AppState};
//! use chronicle_query::config::ApiConfig;
//! use chronicle_query::pipeline::AggregateRegistry;
//! use chronicle_query::service::{DataService, ReadyState};
//! use chronicle_query::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::default());
//!     let service = DataService::new(
//!         store.clone(),
//!         store,
//!         Arc::new(AggregateRegistry::with_builtins()),
//!     );
//!     service.readiness().set(ReadyState::Ready);
//!
//!     let config = ApiConfig::default();
//!     serve(AppState::new(service, config.clone()), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use crate::config::ApiConfig;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let rpc_routes = Router::new()
        .route("/query", post(routes::query::query))
        .route("/range_limit", post(routes::query::range_limit))
        .route("/list_symbols", post(routes::query::list_symbols));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/rpc", rpc_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Chronicle Query API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Chronicle Query API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
