//! AWS Client VPN endpoint adapter.
//!
//! The reconciliation engine consumes exactly three operations from the
//! gateway: the endpoint's public DNS name, the client certificate
//! revocation list it currently has imported, and a way to replace that
//! list. Everything else about the endpoint is out of scope.

pub mod error;

pub use error::GatewayError;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::Client;
use tracing::{debug, info};

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Operations the PKI manager consumes from the Client VPN endpoint.
#[async_trait]
pub trait VpnGateway: Send + Sync {
    /// Public DNS name of the endpoint, as returned by the cloud API
    /// (wildcard label included).
    async fn endpoint_dns_name(&self, endpoint_id: &str) -> Result<String>;

    /// The CRL currently imported into the endpoint. `None` when no CRL
    /// has been imported yet.
    async fn export_crl(&self, endpoint_id: &str) -> Result<Option<String>>;

    /// Replace the endpoint's imported CRL.
    async fn import_crl(&self, endpoint_id: &str, crl_pem: &str) -> Result<()>;
}

/// `VpnGateway` implementation backed by the AWS EC2 API.
pub struct Ec2VpnGateway {
    client: Client,
}

impl Ec2VpnGateway {
    /// Creates the gateway client from the default AWS credential chain.
    pub async fn new() -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        Self {
            client: Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl VpnGateway for Ec2VpnGateway {
    async fn endpoint_dns_name(&self, endpoint_id: &str) -> Result<String> {
        debug!("Describing Client VPN endpoint {}", endpoint_id);

        let response = self
            .client
            .describe_client_vpn_endpoints()
            .client_vpn_endpoint_ids(endpoint_id)
            .send()
            .await
            .map_err(|e| GatewayError::Api(format!("DescribeClientVpnEndpoints failed: {}", e)))?;

        let endpoint = response
            .client_vpn_endpoints()
            .first()
            .ok_or_else(|| GatewayError::EndpointNotFound(endpoint_id.to_string()))?;

        endpoint
            .dns_name()
            .map(|name| name.to_string())
            .ok_or_else(|| GatewayError::DnsName(format!("endpoint {} has no DNS name", endpoint_id)))
    }

    async fn export_crl(&self, endpoint_id: &str) -> Result<Option<String>> {
        debug!("Exporting CRL from Client VPN endpoint {}", endpoint_id);

        let response = self
            .client
            .export_client_vpn_client_certificate_revocation_list()
            .client_vpn_endpoint_id(endpoint_id)
            .send()
            .await
            .map_err(|e| {
                GatewayError::Api(format!(
                    "ExportClientVpnClientCertificateRevocationList failed: {}",
                    e
                ))
            })?;

        // The API omits the field entirely until a CRL has been imported.
        Ok(response
            .certificate_revocation_list()
            .filter(|crl| !crl.is_empty())
            .map(|crl| crl.to_string()))
    }

    async fn import_crl(&self, endpoint_id: &str, crl_pem: &str) -> Result<()> {
        self.client
            .import_client_vpn_client_certificate_revocation_list()
            .client_vpn_endpoint_id(endpoint_id)
            .certificate_revocation_list(crl_pem)
            .send()
            .await
            .map_err(|e| {
                GatewayError::Api(format!(
                    "ImportClientVpnClientCertificateRevocationList failed: {}",
                    e
                ))
            })?;

        info!("Imported CRL into Client VPN endpoint {}", endpoint_id);
        Ok(())
    }
}
