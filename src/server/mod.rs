//! HTTP surface - the platform API
//!
//! Thin JSON proxy over the data access facade, matching the contract
//! the remote backend speaks: `POST /api/query`, `POST /api/run`,
//! `POST /api/execute`, `GET /api/test`. Every failure is a 500 with
//! `{success: false, error}` carrying the raw message - acceptable for
//! an internal admin deployment, not for the public internet.

use crate::Database;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod routes;

/// Server state
pub struct AppState {
    pub db: Database,
}

/// The API router; split out so tests can serve it on an ephemeral
/// port.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/query", post(routes::query))
        .route("/api/run", post(routes::run))
        .route("/api/execute", post(routes::execute))
        .route("/api/test", get(routes::test_connection))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, db: Database) -> anyhow::Result<()> {
    let state = Arc::new(AppState { db });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("starting server on {}", addr);
    println!("🚀 Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
