pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, put},
};
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
pub use state::AppState;

/// Build the HTTP router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Hospitals
    // ==========================================================================
    let hospital_routes = Router::new()
        .route(
            "/",
            get(handlers::list_hospitals).post(handlers::create_hospital),
        )
        .route("/audit", get(handlers::audit_occupancy))
        .route("/{id}", get(handlers::get_hospital))
        .route("/{id}/patients", get(handlers::get_hospital_patients))
        .route("/{id}/capacity", put(handlers::update_capacity))
        .route("/{id}/stats", get(handlers::get_hospital_stats));

    // ==========================================================================
    // Patients
    // ==========================================================================
    let patient_routes = Router::new()
        .route(
            "/",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route(
            "/stats/triage-distribution",
            get(handlers::triage_distribution),
        )
        .route("/mrn/{mrn}", get(handlers::get_patient_by_mrn))
        .route(
            "/{id}",
            get(handlers::get_patient).delete(handlers::discharge_patient),
        )
        .route("/{id}/triage", put(handlers::update_triage));

    // ==========================================================================
    // Transfers
    // ==========================================================================
    let transfer_routes = Router::new()
        .route(
            "/",
            get(handlers::list_transfers).post(handlers::create_transfer),
        )
        .route("/active", get(handlers::list_active_transfers))
        .route(
            "/patient/{patient_id}",
            get(handlers::get_patient_transfers),
        )
        .route(
            "/{id}",
            get(handlers::get_transfer).delete(handlers::cancel_transfer),
        )
        .route("/{id}/status", put(handlers::update_transfer_status));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/hospitals", hospital_routes)
        .nest("/api/patients", patient_routes)
        .nest("/api/transfers", transfer_routes)
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until the listener fails
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr} (port already in use?)"))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")
}
