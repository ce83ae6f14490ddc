//! Shared application state

use crate::config::ServerOptions;
use pki_engine::{CertificateCatalog, CertificateIssuer, CrlReconciler};
use std::sync::Arc;

/// State handed to every handler: the configuration plus the core
/// engine components, all backed by the same session provider.
#[derive(Clone)]
pub struct CvpnServer {
    pub config: Arc<ServerOptions>,
    /// Resolved once at startup: the last configured PKI path.
    pub issuing_pki_path: String,
    pub catalog: Arc<CertificateCatalog>,
    pub reconciler: Arc<CrlReconciler>,
    pub issuer: Arc<CertificateIssuer>,
}
