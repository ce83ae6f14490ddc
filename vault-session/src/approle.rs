//! AppRole session strategy with background lease renewal

use crate::{build_client, Result, SessionError, SessionProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use vaultrs::client::VaultClient;

/// How long to wait before retrying a failed AppRole login.
const LOGIN_RETRY_DELAY: Duration = Duration::from_secs(5);

/// AppRole credentials and the mount path of the auth backend.
#[derive(Clone)]
pub struct AppRoleConfig {
    pub address: String,
    pub role_id: String,
    pub secret_id: String,
    pub mount: String,
}

/// Renewable-credential strategy. A supervised background task logs in
/// with AppRole credentials, publishes the authenticated client, and
/// keeps the token lease renewed until the shutdown signal fires.
///
/// [`SessionProvider::session`] blocks until the first login has
/// published a client, so a request arriving right after process start
/// never observes a missing session.
pub struct AppRoleSession {
    sessions: watch::Receiver<Option<Arc<VaultClient>>>,
}

impl AppRoleSession {
    /// Spawns the login/renew loop. The loop checks `shutdown` at every
    /// iteration and exits once it flips to `true`.
    pub fn start(config: AppRoleConfig, mut shutdown: watch::Receiver<bool>) -> Self {
        let (publish, sessions) = watch::channel(None);

        tokio::spawn(async move {
            loop {
                if *shutdown.borrow() || shutdown.has_changed().is_err() {
                    info!("Session renewal loop stopping");
                    return;
                }

                let login = match login(&config).await {
                    Ok(login) => login,
                    Err(e) => {
                        error!("Vault AppRole login failed: {}", e);
                        tokio::select! {
                            _ = tokio::time::sleep(LOGIN_RETRY_DELAY) => {}
                            result = shutdown.changed() => {
                                if result.is_err() {
                                    return;
                                }
                            }
                        }
                        continue;
                    }
                };

                info!("Logged into Vault using the AppRole auth backend");
                let client = Arc::new(login.client);
                if publish.send(Some(Arc::clone(&client))).is_err() {
                    // Every receiver is gone; nobody can use the session.
                    return;
                }

                if !login.renewable {
                    debug!("Vault token is not renewable, logging in again");
                    continue;
                }

                watch_lease(&client, login.lease_duration, &mut shutdown).await;
            }
        });

        Self { sessions }
    }
}

struct Login {
    client: VaultClient,
    renewable: bool,
    lease_duration: u64,
}

async fn login(config: &AppRoleConfig) -> Result<Login> {
    let login_client = build_client(&config.address, "")?;

    let auth = vaultrs::auth::approle::login(
        &login_client,
        &config.mount,
        &config.role_id,
        &config.secret_id,
    )
    .await
    .map_err(|e| SessionError::AuthFailure(e.to_string()))?;

    // Rebuild the client with the issued token.
    let client = build_client(&config.address, &auth.client_token)?;

    Ok(Login {
        client,
        renewable: auth.renewable,
        lease_duration: auth.lease_duration,
    })
}

/// Renews the token lease until a renewal fails or the lease stops being
/// extended, then returns so the caller can log in again.
async fn watch_lease(
    client: &VaultClient,
    mut lease_duration: u64,
    shutdown: &mut watch::Receiver<bool>,
) {
    loop {
        // Renew at two thirds of the lease, leaving room for a slow
        // Vault response.
        let wait = Duration::from_secs((lease_duration * 2 / 3).max(1));

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => return,
        }

        match vaultrs::token::renew_self(client, None).await {
            Ok(renewed) => {
                debug!("Renewed Vault token lease for {}s", renewed.lease_duration);
                if !renewed.renewable || renewed.lease_duration == 0 {
                    warn!("Vault token can no longer be renewed, logging in again");
                    return;
                }
                lease_duration = renewed.lease_duration;
            }
            Err(e) => {
                warn!("Failed to renew Vault token, logging in again: {}", e);
                return;
            }
        }
    }
}

#[async_trait]
impl SessionProvider for AppRoleSession {
    async fn session(&self) -> Result<Arc<VaultClient>> {
        let mut sessions = self.sessions.clone();

        // Readiness gate: wait for the first login to publish a client.
        loop {
            if let Some(client) = sessions.borrow_and_update().as_ref().map(Arc::clone) {
                return Ok(client);
            }
            sessions.changed().await.map_err(|_| {
                SessionError::Unavailable("session renewal loop has stopped".to_string())
            })?;
        }
    }
}
