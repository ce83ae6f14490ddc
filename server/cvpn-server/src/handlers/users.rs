//! User and certificate endpoints

use crate::error::ApiError;
use crate::server::CvpnServer;
use axum::extract::{Path, Query, State};
use axum::Json;
use pki_engine::{IssueRequest, UserCertificates};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct IssueParams {
    /// Overrides the configured issuing role for this request.
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssueResponse {
    pub result: String,
    pub config: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub result: String,
}

/// POST /issue/{user} — issue a certificate and return the rendered
/// client configuration.
pub async fn issue_certificate(
    State(server): State<CvpnServer>,
    Path(user): Path<String>,
    Query(params): Query<IssueParams>,
) -> Result<Json<IssueResponse>, ApiError> {
    let role = params
        .role
        .unwrap_or_else(|| server.config.vault_client_certificate_role.clone());

    let request = IssueRequest {
        username: user,
        role,
        pki_chain_paths: server.config.vault_pki_paths.clone(),
        endpoint_id: server.config.client_vpn_endpoint_id.clone(),
        kv_path: server.config.vault_kv_path.clone(),
        config_key: server.config.vault_kv_config_key.clone(),
    };

    let config = server.issuer.issue(&request).await?;

    Ok(Json(IssueResponse {
        result: "success".to_string(),
        config,
    }))
}

/// POST /revoke/{user} — revoke every certificate of one user.
pub async fn revoke_user(
    State(server): State<CvpnServer>,
    Path(user): Path<String>,
) -> Result<Json<RevokeResponse>, ApiError> {
    server
        .reconciler
        .revoke_user(
            &server.issuing_pki_path,
            &server.config.client_vpn_endpoint_id,
            &user,
        )
        .await?;

    Ok(Json(RevokeResponse {
        result: "success".to_string(),
    }))
}

/// GET /users — every user and their certificates, oldest first.
pub async fn list_users(
    State(server): State<CvpnServer>,
) -> Result<Json<UserCertificates>, ApiError> {
    let users = server.catalog.list(&server.issuing_pki_path).await?;
    Ok(Json(users))
}
