//! Vault implementation of the PKI backend

use crate::backend::{IssuedCertificate, PkiBackend};
use crate::error::PkiError;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use vault_session::SessionProvider;
use vaultrs::api::pki::requests::GenerateCertificateRequest;
use vaultrs::client::VaultClient;
use vaultrs::error::ClientError;
use vaultrs::{kv2, pki};

/// `PkiBackend` implementation over the Vault HTTP API. A session handle
/// is obtained from the provider on every call, so the backend observes
/// re-logins performed by the renewal loop.
pub struct VaultPkiBackend {
    sessions: Arc<dyn SessionProvider>,
}

impl VaultPkiBackend {
    pub fn new(sessions: Arc<dyn SessionProvider>) -> Self {
        Self { sessions }
    }

    async fn client(&self) -> Result<Arc<VaultClient>> {
        self.sessions.session().await.map_err(PkiError::from)
    }
}

fn backend_error(err: ClientError) -> PkiError {
    match err {
        ClientError::APIError { code: 403, errors } => PkiError::AuthFailure(errors.join("; ")),
        other => PkiError::BackendUnavailable(other.to_string()),
    }
}

#[async_trait]
impl PkiBackend for VaultPkiBackend {
    async fn list_certificates(&self, pki_path: &str) -> Result<Vec<String>> {
        let client = self.client().await?;
        pki::cert::list(client.as_ref(), pki_path)
            .await
            .map_err(backend_error)
    }

    async fn read_certificate(&self, pki_path: &str, key: &str) -> Result<String> {
        let client = self.client().await?;
        let response = pki::cert::read(client.as_ref(), pki_path, key)
            .await
            .map_err(backend_error)?;
        Ok(response.certificate)
    }

    async fn read_ca_pem(&self, pki_path: &str) -> Result<String> {
        let client = self.client().await?;
        let response = pki::cert::read(client.as_ref(), pki_path, "ca")
            .await
            .map_err(backend_error)?;
        Ok(response.certificate)
    }

    async fn read_crl_pem(&self, pki_path: &str) -> Result<String> {
        let client = self.client().await?;
        let response = pki::cert::read(client.as_ref(), pki_path, "crl")
            .await
            .map_err(backend_error)?;
        Ok(response.certificate)
    }

    async fn rotate_crl(&self, pki_path: &str) -> Result<()> {
        let client = self.client().await?;
        pki::cert::crl::rotate(client.as_ref(), pki_path)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn revoke(&self, pki_path: &str, serial_number: &str) -> Result<()> {
        let client = self.client().await?;
        pki::cert::revoke(client.as_ref(), pki_path, serial_number)
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn issue(
        &self,
        pki_path: &str,
        role: &str,
        common_name: &str,
    ) -> Result<IssuedCertificate> {
        debug!("Issuing certificate for {} from role {}", common_name, role);

        let client = self.client().await?;
        let mut opts = GenerateCertificateRequest::builder();
        opts.common_name(common_name);

        let response = pki::cert::generate(client.as_ref(), pki_path, role, Some(&mut opts))
            .await
            .map_err(backend_error)?;

        Ok(IssuedCertificate {
            certificate_pem: response.certificate,
            private_key_pem: response.private_key,
            serial_number: response.serial_number,
        })
    }

    async fn store_client_config(
        &self,
        kv_path: &str,
        username: &str,
        config_key: &str,
        content: &str,
    ) -> Result<()> {
        let client = self.client().await?;

        let mut data = HashMap::new();
        data.insert("content", content);

        kv2::set(
            client.as_ref(),
            kv_path,
            &format!("users/{}/{}", username, config_key),
            &data,
        )
        .await
        .map_err(backend_error)?;

        Ok(())
    }
}
