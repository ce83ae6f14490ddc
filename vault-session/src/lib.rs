//! Vault session management.
//!
//! Produces the authenticated Vault client handle the rest of the system
//! issues its backend calls through. Two interchangeable strategies sit
//! behind the [`SessionProvider`] capability: a static token that is
//! lazily wrapped into a client on first use, and AppRole credentials
//! kept alive by a supervised background login/renew loop.

pub mod error;

mod approle;
mod token;

pub use approle::{AppRoleConfig, AppRoleSession};
pub use error::SessionError;
pub use token::TokenSession;

use async_trait::async_trait;
use std::sync::Arc;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Capability to produce a usable authenticated Vault client.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the shared session handle, waiting for it to become
    /// available if the provider has not completed its first login yet.
    async fn session(&self) -> Result<Arc<VaultClient>>;
}

pub(crate) fn build_client(address: &str, token: &str) -> Result<VaultClient> {
    let settings = VaultClientSettingsBuilder::default()
        .address(address)
        .token(token)
        .build()
        .map_err(|e| SessionError::Config(e.to_string()))?;

    VaultClient::new(settings)
        .map_err(|e| SessionError::Config(format!("failed to create Vault client: {}", e)))
}
