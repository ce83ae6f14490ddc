//! Capability trait over the PKI secrets backend

use crate::Result;
use async_trait::async_trait;

/// A freshly issued leaf certificate together with its private key.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate_pem: String,
    pub private_key_pem: String,
    /// Hyphenated hex serial, as rendered by the backend.
    pub serial_number: String,
}

/// Operations the engine consumes from the PKI secrets backend.
#[async_trait]
pub trait PkiBackend: Send + Sync {
    /// Keys of every certificate stored under the PKI path.
    async fn list_certificates(&self, pki_path: &str) -> Result<Vec<String>>;

    /// PEM of one stored certificate.
    async fn read_certificate(&self, pki_path: &str, key: &str) -> Result<String>;

    /// PEM of the CA certificate at the PKI path.
    async fn read_ca_pem(&self, pki_path: &str) -> Result<String>;

    /// PEM of the backend's current CRL.
    async fn read_crl_pem(&self, pki_path: &str) -> Result<String>;

    /// Forces the backend to regenerate its CRL.
    async fn rotate_crl(&self, pki_path: &str) -> Result<()>;

    /// Revokes one certificate by serial number.
    async fn revoke(&self, pki_path: &str, serial_number: &str) -> Result<()>;

    /// Issues a new leaf certificate for the common name from the role.
    async fn issue(&self, pki_path: &str, role: &str, common_name: &str)
        -> Result<IssuedCertificate>;

    /// Persists a rendered client configuration under the user's KV key.
    async fn store_client_config(
        &self,
        kv_path: &str,
        username: &str,
        config_key: &str,
        content: &str,
    ) -> Result<()>;
}
