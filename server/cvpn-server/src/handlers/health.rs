//! Health endpoints

use crate::error::ApiError;
use crate::server::CvpnServer;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /healthz — exercises a catalog listing against the backend, so a
/// broken session or unreachable Vault turns the probe red.
pub async fn healthz(State(server): State<CvpnServer>) -> Result<Json<HealthResponse>, ApiError> {
    server.catalog.list(&server.issuing_pki_path).await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// GET /readyz — process liveness only.
pub async fn readyz() -> &'static str {
    "OK"
}
