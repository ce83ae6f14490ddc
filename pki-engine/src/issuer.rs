//! Leaf certificate issuance and client configuration delivery

use crate::backend::PkiBackend;
use crate::error::PkiError;
use crate::reconciler::CrlReconciler;
use crate::template::{ClientConfigData, ClientConfigTemplate};
use crate::Result;
use std::sync::Arc;
use tracing::info;
use vpn_gateway::VpnGateway;

/// Everything needed to issue one client certificate.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub username: String,
    pub role: String,
    /// PKI chain paths ordered root-most to leaf-issuer; certificates
    /// are issued against the last path.
    pub pki_chain_paths: Vec<String>,
    pub endpoint_id: String,
    pub kv_path: String,
    pub config_key: String,
}

/// Issues leaf certificates and delivers the rendered client
/// configuration to the secret store.
pub struct CertificateIssuer {
    backend: Arc<dyn PkiBackend>,
    gateway: Arc<dyn VpnGateway>,
    reconciler: Arc<CrlReconciler>,
    template: ClientConfigTemplate,
}

impl CertificateIssuer {
    pub fn new(
        backend: Arc<dyn PkiBackend>,
        gateway: Arc<dyn VpnGateway>,
        reconciler: Arc<CrlReconciler>,
        template: ClientConfigTemplate,
    ) -> Self {
        Self {
            backend,
            gateway,
            reconciler,
            template,
        }
    }

    /// Issues a new certificate for the user, stores the rendered client
    /// configuration, and reconciles the CRL so the user's previous
    /// certificates end up revoked. Returns the rendered configuration.
    ///
    /// Completed steps are not rolled back on failure; re-invoking the
    /// operation is safe and converges to the same state.
    pub async fn issue(&self, request: &IssueRequest) -> Result<String> {
        let issuing_path = request
            .pki_chain_paths
            .last()
            .ok_or_else(|| PkiError::Config("no PKI paths configured".to_string()))?;

        let issued = self
            .backend
            .issue(issuing_path, &request.role, &request.username)
            .await?;
        info!(
            "Issued certificate {} for {}",
            issued.serial_number, request.username
        );

        // The client configuration embeds the full chain up to the root CA.
        let mut ca_chain = Vec::with_capacity(request.pki_chain_paths.len());
        for path in &request.pki_chain_paths {
            ca_chain.push(self.backend.read_ca_pem(path).await?);
        }

        let dns_name = self.gateway.endpoint_dns_name(&request.endpoint_id).await?;
        let dns_name = strip_wildcard_label(&dns_name)?;

        let config = self.template.render(&ClientConfigData {
            dns_name,
            username: request.username.clone(),
            ca: ca_chain.join("\n"),
            certificate: issued.certificate_pem,
            private_key: issued.private_key_pem,
        })?;

        self.backend
            .store_client_config(
                &request.kv_path,
                &request.username,
                &request.config_key,
                &config,
            )
            .await?;

        // The new certificate is now the user's newest; reconciliation
        // revokes the previous ones.
        self.reconciler
            .reconcile(issuing_path, &request.endpoint_id)
            .await?;

        Ok(config)
    }
}

/// The cloud API returns the endpoint DNS name with a wildcard first
/// label; client configurations need the bare domain.
fn strip_wildcard_label(dns_name: &str) -> Result<String> {
    match dns_name.split_once('.') {
        Some(("*", rest)) => Ok(rest.to_string()),
        Some(_) => Ok(dns_name.to_string()),
        None => Err(PkiError::GatewayApi(format!(
            "unexpected endpoint DNS name: {}",
            dns_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_label_is_stripped() {
        assert_eq!(
            strip_wildcard_label("*.cvpn-endpoint-0123.prod.clientvpn.eu-west-1.amazonaws.com")
                .unwrap(),
            "cvpn-endpoint-0123.prod.clientvpn.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(
            strip_wildcard_label("vpn.example.com").unwrap(),
            "vpn.example.com"
        );
    }

    #[test]
    fn a_name_without_labels_is_rejected() {
        assert!(matches!(
            strip_wildcard_label("localhost"),
            Err(PkiError::GatewayApi(_))
        ));
    }
}
