//! Error types for session management

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Vault authentication failed: {0}")]
    AuthFailure(String),

    #[error("Vault session unavailable: {0}")]
    Unavailable(String),

    #[error("Vault client configuration error: {0}")]
    Config(String),
}
