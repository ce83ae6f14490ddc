//! Per-user view of the backend's leaf certificates

use crate::backend::PkiBackend;
use crate::x509::{parse_certificate, revoked_serials, username_from_cn};
use crate::{Certificate, Result, UserCertificates};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Builds the per-user certificate listing from raw backend state.
/// Read-only; cost is one backend read per stored certificate plus one
/// CRL fetch per call.
pub struct CertificateCatalog {
    backend: Arc<dyn PkiBackend>,
}

impl CertificateCatalog {
    pub fn new(backend: Arc<dyn PkiBackend>) -> Self {
        Self { backend }
    }

    /// Lists every leaf certificate under `pki_path`, grouped by user
    /// and ordered oldest to newest. CA certificates and certificates
    /// with server-auth extended key usage are not part of the listing.
    ///
    /// Any backend or parse failure aborts the call; no partial catalog
    /// is returned.
    pub async fn list(&self, pki_path: &str) -> Result<UserCertificates> {
        let keys = self.backend.list_certificates(pki_path).await?;
        debug!("Listing {} certificates under {}", keys.len(), pki_path);

        let crl = self.backend.read_crl_pem(pki_path).await?;
        let revoked = revoked_serials(&crl)?;

        let mut users: UserCertificates = BTreeMap::new();
        for key in keys {
            let pem = self.backend.read_certificate(pki_path, &key).await?;
            let parsed = parse_certificate(&pem)?;

            if parsed.is_ca || parsed.server_auth {
                continue;
            }

            let username = username_from_cn(&parsed.subject_cn).to_string();
            let is_revoked = revoked.contains(&parsed.serial_number);

            users.entry(username).or_default().push(Certificate {
                serial_number: parsed.serial_number,
                issuer_cn: parsed.issuer_cn,
                subject_cn: parsed.subject_cn,
                not_before: parsed.not_before,
                not_after: parsed.not_after,
                revoked: is_revoked,
                certificate_pem: pem,
            });
        }

        // notBefore is the issuance date, so this orders each user's
        // certificates oldest to newest.
        for certs in users.values_mut() {
            certs.sort_by_key(|cert| cert.not_before);
        }

        Ok(users)
    }
}
