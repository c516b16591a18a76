//! ==============================================================================
//! server.rs - chart view server
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     exposes the newest chart view over http so a browser chart (or curl)
//!     can poll it. read-only: the server never touches the buffer, it only
//!     reads the latest `DashboardState` the watch sink published.
//! ```
//!
//! routes:
//! ```text
//!     GET /             plain text index
//!     GET /api/series   {"connected": bool, "series": [...]}
//!     GET /api/latest   newest sample or null
//! ```
//!
//! ==============================================================================

use anyhow::{Context, Result};
use axum::{extract::State, response::Json, routing::get, Router};
use std::net::SocketAddr;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::domain::Sample;
use crate::sinks::DashboardState;

type ViewState = watch::Receiver<DashboardState>;

pub fn router(views: ViewState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/series", get(series_handler))
        .route("/api/latest", get(latest_handler))
        .layer(CorsLayer::permissive())
        .with_state(views)
}

pub async fn run_server(bind: SocketAddr, views: ViewState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind view server to {bind}"))?;
    tracing::info!(%bind, "chart view server listening");
    axum::serve(listener, router(views)).await?;
    Ok(())
}

async fn index_handler() -> &'static str {
    "smokedash\n\nGET /api/series  chart series\nGET /api/latest  newest sample\n"
}

async fn series_handler(State(views): State<ViewState>) -> Json<DashboardState> {
    Json(views.borrow().clone())
}

async fn latest_handler(State(views): State<ViewState>) -> Json<Option<Sample>> {
    Json(views.borrow().series.latest())
}
