//! Certificate lifecycle and CRL reconciliation engine for a client VPN
//! backed by a Vault PKI secrets engine.
//!
//! The engine maintains one invariant: after a reconciliation pass every
//! user has at most one unrevoked certificate — the one issued last —
//! and the gateway's imported CRL matches the backend's byte for byte.

pub mod backend;
pub mod catalog;
pub mod error;
pub mod issuer;
pub mod reconciler;
pub mod revocation;
pub mod template;
pub mod vault;

mod x509;

pub use backend::{IssuedCertificate, PkiBackend};
pub use catalog::CertificateCatalog;
pub use error::PkiError;
pub use issuer::{CertificateIssuer, IssueRequest};
pub use reconciler::CrlReconciler;
pub use template::{ClientConfigData, ClientConfigTemplate};
pub use vault::VaultPkiBackend;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, PkiError>;

/// Certificates grouped by user, each group ordered oldest to newest.
/// The last certificate of a group is the user's active one.
pub type UserCertificates = BTreeMap<String, Vec<Certificate>>;

/// A leaf certificate stored in the PKI backend, as observed at listing
/// time. `revoked` is recomputed from the CRL on every listing rather
/// than stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "serial")]
    pub serial_number: String,

    #[serde(rename = "issuerCN")]
    pub issuer_cn: String,

    #[serde(rename = "subjectCN")]
    pub subject_cn: String,

    #[serde(rename = "notBefore")]
    pub not_before: DateTime<Utc>,

    #[serde(rename = "notAfter")]
    pub not_after: DateTime<Utc>,

    pub revoked: bool,

    #[serde(rename = "certificate-pem")]
    pub certificate_pem: String,
}
