//! CRL reconciliation between the PKI backend and the VPN gateway

use crate::backend::PkiBackend;
use crate::catalog::CertificateCatalog;
use crate::error::PkiError;
use crate::{revocation, Result};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vpn_gateway::VpnGateway;

/// Drives revocation across all users and converges the gateway's
/// imported CRL onto the backend's authoritative copy.
///
/// Every CRL-mutating operation is serialized per `(pki_path,
/// endpoint_id)` pair, so a scheduled rotation and a manual
/// reconciliation for the same endpoint cannot interleave.
pub struct CrlReconciler {
    backend: Arc<dyn PkiBackend>,
    gateway: Arc<dyn VpnGateway>,
    catalog: CertificateCatalog,
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl CrlReconciler {
    pub fn new(backend: Arc<dyn PkiBackend>, gateway: Arc<dyn VpnGateway>) -> Self {
        Self {
            catalog: CertificateCatalog::new(Arc::clone(&backend)),
            backend,
            gateway,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, pki_path: &str, endpoint_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry((pki_path.to_string(), endpoint_id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The backend's current CRL PEM, unreconciled.
    pub async fn crl(&self, pki_path: &str) -> Result<String> {
        self.backend.read_crl_pem(pki_path).await
    }

    /// Revokes every certificate except each user's newest, then imports
    /// the refreshed CRL into the gateway when it differs from the
    /// gateway's current copy. Returns the CRL PEM.
    pub async fn reconcile(&self, pki_path: &str, endpoint_id: &str) -> Result<String> {
        let lock = self.lock_for(pki_path, endpoint_id);
        let _guard = lock.lock().await;
        self.reconcile_locked(pki_path, endpoint_id).await
    }

    /// Forces the backend to regenerate its CRL regardless of pending
    /// revocations (refreshing its expiry), then reconciles.
    pub async fn rotate(&self, pki_path: &str, endpoint_id: &str) -> Result<String> {
        let lock = self.lock_for(pki_path, endpoint_id);
        let _guard = lock.lock().await;

        self.backend.rotate_crl(pki_path).await?;
        info!("Rotated backend CRL for {}", pki_path);

        self.reconcile_locked(pki_path, endpoint_id).await
    }

    /// Revokes every certificate of one user, newest included, then
    /// reconciles.
    pub async fn revoke_user(
        &self,
        pki_path: &str,
        endpoint_id: &str,
        username: &str,
    ) -> Result<String> {
        let lock = self.lock_for(pki_path, endpoint_id);
        let _guard = lock.lock().await;

        let users = self.catalog.list(pki_path).await?;
        let certs = users
            .get(username)
            .ok_or_else(|| PkiError::UserNotFound(username.to_string()))?;

        revocation::apply(self.backend.as_ref(), pki_path, certs, true).await?;

        self.reconcile_locked(pki_path, endpoint_id).await
    }

    async fn reconcile_locked(&self, pki_path: &str, endpoint_id: &str) -> Result<String> {
        let users = self.catalog.list(pki_path).await?;
        for certs in users.values() {
            revocation::apply(self.backend.as_ref(), pki_path, certs, false).await?;
        }

        let crl = self.backend.read_crl_pem(pki_path).await?;

        match self.gateway.export_crl(endpoint_id).await? {
            Some(current) if current == crl => {
                debug!("Gateway CRL is already up to date");
            }
            Some(_) => {
                self.gateway.import_crl(endpoint_id, &crl).await?;
                info!("Updated CRL in Client VPN endpoint {}", endpoint_id);
            }
            None => {
                self.gateway.import_crl(endpoint_id, &crl).await?;
                info!("First CRL import into Client VPN endpoint {}", endpoint_id);
            }
        }

        Ok(crl)
    }
}
