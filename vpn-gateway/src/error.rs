//! Error types for the gateway adapter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Client VPN API error: {0}")]
    Api(String),

    #[error("Client VPN endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("unexpected endpoint DNS name: {0}")]
    DnsName(String),
}
