//! CRL endpoints

use crate::error::ApiError;
use crate::server::CvpnServer;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CrlResponse {
    pub crl: String,
}

/// GET /crl — the backend's current CRL.
pub async fn get_crl(State(server): State<CvpnServer>) -> Result<Json<CrlResponse>, ApiError> {
    let crl = server.reconciler.crl(&server.issuing_pki_path).await?;
    Ok(Json(CrlResponse { crl }))
}

/// POST /crl — reconcile revocations and the gateway's imported CRL.
pub async fn update_crl(State(server): State<CvpnServer>) -> Result<Json<CrlResponse>, ApiError> {
    let crl = server
        .reconciler
        .reconcile(
            &server.issuing_pki_path,
            &server.config.client_vpn_endpoint_id,
        )
        .await?;
    Ok(Json(CrlResponse { crl }))
}

/// POST /crl/rotate — regenerate the backend CRL, then reconcile.
pub async fn rotate_crl(State(server): State<CvpnServer>) -> Result<Json<CrlResponse>, ApiError> {
    let crl = server
        .reconciler
        .rotate(
            &server.issuing_pki_path,
            &server.config.client_vpn_endpoint_id,
        )
        .await?;
    Ok(Json(CrlResponse { crl }))
}
