//! Error taxonomy for the certificate lifecycle engine

use thiserror::Error;
use vault_session::SessionError;
use vpn_gateway::GatewayError;

#[derive(Error, Debug)]
pub enum PkiError {
    /// The PKI backend could not be reached or rejected the call.
    #[error("PKI backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend rejected our credentials.
    #[error("PKI backend authentication failed: {0}")]
    AuthFailure(String),

    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    #[error("malformed CRL: {0}")]
    MalformedCrl(String),

    /// A revocation pass failed after some certificates were already
    /// revoked. Nothing is rolled back; retrying is safe because
    /// already-revoked certificates are skipped.
    #[error("revocation failed after {revoked} certificate(s) were revoked: {source}")]
    PartialRevocation {
        revoked: usize,
        #[source]
        source: Box<PkiError>,
    },

    #[error("gateway API failure: {0}")]
    GatewayApi(String),

    #[error("failed to render client configuration: {0}")]
    TemplateRender(String),

    #[error("no certificates found for user {0}")]
    UserNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<GatewayError> for PkiError {
    fn from(err: GatewayError) -> Self {
        PkiError::GatewayApi(err.to_string())
    }
}

impl From<SessionError> for PkiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AuthFailure(msg) => PkiError::AuthFailure(msg),
            other => PkiError::BackendUnavailable(other.to_string()),
        }
    }
}
