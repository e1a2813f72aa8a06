//! HTTP scrape endpoint

use crate::collector::Collector;
use crate::error::Result;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Router serving `GET /metrics`.
pub fn router(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(collector)
}

/// Serve scrapes on `listener` until it fails.
///
/// # Errors
///
/// Returns an error if the listener stops accepting connections.
pub async fn serve(listener: TcpListener, collector: Arc<Collector>) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Serving metrics on http://{}/metrics", addr);
    }
    axum::serve(listener, router(collector)).await?;
    Ok(())
}

async fn metrics(State(collector): State<Arc<Collector>>) -> Response {
    match collector.scrape().await {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Could not encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
