//! Axum router and server.

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use groundtruth_store::LedgerStore;

use crate::error::RpcError;
use crate::handlers;
use crate::AppState;

/// Build the API router.
pub fn router<S: LedgerStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route(
            "/reports",
            get(handlers::list_reports::<S>).post(handlers::submit_report::<S>),
        )
        .route("/reports/:id", get(handlers::get_report::<S>))
        .route(
            "/reports/:id/votes",
            get(handlers::list_votes::<S>).post(handlers::cast_vote::<S>),
        )
        .route("/reports/:id/archive", post(handlers::archive_report::<S>))
        .route("/reports/:id/status", post(handlers::set_status::<S>))
        .route("/reports/:id/moderation", get(handlers::moderation_log::<S>))
        .route("/users/:id/activity", get(handlers::user_activity::<S>))
        .route("/chain/verify", get(handlers::verify_chain::<S>))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics::<S>))
        // The static client is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct RpcServer<S> {
    pub addr: SocketAddr,
    pub state: AppState<S>,
}

impl<S: LedgerStore + 'static> RpcServer<S> {
    pub fn new(addr: SocketAddr, state: AppState<S>) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn start<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| RpcError::Bind {
                addr: self.addr.to_string(),
                source,
            })?;
        tracing::info!(addr = %self.addr, "HTTP API listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("HTTP API stopped");
        Ok(())
    }
}
