//! API error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use pki_engine::PkiError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error envelope returned to API clients.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error_type: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pki(#[from] PkiError),

    #[error("unauthenticated: {0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Each taxonomy kind maps to its own status code, so callers can
    /// tell a backend outage apart from bad stored data or a missing
    /// user.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Pki(err) => match err {
                PkiError::UserNotFound(_) => StatusCode::NOT_FOUND,
                PkiError::MalformedCertificate(_) | PkiError::MalformedCrl(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                PkiError::PartialRevocation { .. } => StatusCode::CONFLICT,
                PkiError::BackendUnavailable(_)
                | PkiError::AuthFailure(_)
                | PkiError::GatewayApi(_) => StatusCode::BAD_GATEWAY,
                PkiError::TemplateRender(_) | PkiError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Pki(err) => match err {
                PkiError::BackendUnavailable(_) => "backend_unavailable",
                PkiError::AuthFailure(_) => "auth_failure",
                PkiError::MalformedCertificate(_) => "malformed_certificate",
                PkiError::MalformedCrl(_) => "malformed_crl",
                PkiError::PartialRevocation { .. } => "partial_revocation",
                PkiError::GatewayApi(_) => "gateway_api_failure",
                PkiError::TemplateRender(_) => "template_render_failure",
                PkiError::UserNotFound(_) => "user_not_found",
                PkiError::Config(_) => "configuration",
            },
            ApiError::Unauthorized(_) => "unauthenticated",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        error!(
            error_type = %self.error_type(),
            status = %status_code.as_u16(),
            "{}", self
        );

        let body = ApiErrorResponse {
            error_type: self.error_type().to_string(),
            message: self.to_string(),
        };

        (status_code, Json(body)).into_response()
    }
}
