//! Router configuration for the log pipeline service.

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Ingestion (API-key authenticated)
        .route("/api/ingest", post(handlers::ingest_events))
        .route("/api/syslog", post(handlers::ingest_syslog))
        // Bulk import (administrator-facing)
        .route("/api/import/csv", post(handlers::import_csv))
        // Read side
        .route("/api/logs", get(handlers::get_logs))
        .route("/api/logs/latest", get(handlers::get_latest_logs))
        .route("/api/daily-report", get(handlers::get_daily_report))
        // Source registry administration
        .route(
            "/api/sources",
            get(handlers::get_log_sources).post(handlers::create_log_source),
        )
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint_answers() {
        let state = AppState::new(Arc::new(MemoryStorage::new()));
        let app = create_router(state);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
