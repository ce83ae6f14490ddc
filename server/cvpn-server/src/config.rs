//! Server configuration, loadable from flags or environment

use crate::auth::GithubAuthOptions;
use clap::Parser;

/// Options for the cvpn-server process.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cvpn-server",
    about = "Manages client VPN certificates against a Vault PKI backend"
)]
pub struct ServerOptions {
    /// Port to listen on.
    #[arg(long, env = "CVPN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// The AWS Client VPN endpoint ID.
    #[arg(long, env = "CVPN_CLIENT_VPN_ENDPOINT_ID")]
    pub client_vpn_endpoint_id: String,

    /// Vault server address.
    #[arg(long, env = "VAULT_ADDR")]
    pub vault_addr: String,

    /// The paths where the root CA and any intermediate CAs live in
    /// Vault. Must be sorted; the root CA PKI path has to be the first
    /// one.
    #[arg(
        long = "vault-pki-path",
        env = "CVPN_VAULT_PKI_PATHS",
        value_delimiter = ',',
        default_values_t = [String::from("root-pki"), String::from("cvpn-pki")]
    )]
    pub vault_pki_paths: Vec<String>,

    /// The Vault role used to issue VPN client certificates.
    #[arg(
        long,
        env = "CVPN_VAULT_CLIENT_CERTIFICATE_ROLE",
        default_value = "client"
    )]
    pub vault_client_certificate_role: String,

    /// The Vault path of the kv (v2) engine where VPN configs are stored.
    #[arg(long, env = "CVPN_VAULT_KV_PATH", default_value = "secret")]
    pub vault_kv_path: String,

    /// The key under each user's KV prefix for the rendered config.
    #[arg(long, env = "CVPN_VAULT_KV_CONFIG_KEY", default_value = "config.ovpn")]
    pub vault_kv_config_key: String,

    /// Path to the client VPN configuration template.
    #[arg(
        long,
        env = "CVPN_CONFIG_TEMPLATE_PATH",
        default_value = "./config.ovpn.tpl"
    )]
    pub config_template_path: String,

    /// The token to authenticate to the Vault server (static-token
    /// mode).
    #[arg(long, env = "VAULT_TOKEN")]
    pub vault_auth_token: Option<String>,

    /// The role id in Vault's AppRole backend to authenticate with.
    #[arg(long, env = "CVPN_VAULT_APPROLE_ROLE_ID")]
    pub vault_auth_approle_role_id: Option<String>,

    /// The secret id in Vault's AppRole backend to authenticate with.
    #[arg(long, env = "CVPN_VAULT_APPROLE_SECRET_ID")]
    pub vault_auth_approle_secret_id: Option<String>,

    /// The path where the AppRole auth backend is mounted.
    #[arg(
        long,
        env = "CVPN_VAULT_APPROLE_BACKEND_PATH",
        default_value = "approle"
    )]
    pub vault_auth_approle_backend_path: String,

    /// The GitHub organization whose members may call the API.
    /// Authorization is disabled when unset.
    #[arg(long, env = "CVPN_AUTH_GITHUB_ORG")]
    pub auth_github_org: Option<String>,

    /// GitHub users allowed to call the API.
    #[arg(long, env = "CVPN_AUTH_GITHUB_USERS", value_delimiter = ',')]
    pub auth_github_users: Vec<String>,

    /// GitHub teams allowed to call the API.
    #[arg(long, env = "CVPN_AUTH_GITHUB_TEAMS", value_delimiter = ',')]
    pub auth_github_teams: Vec<String>,
}

/// The Vault authentication mode selected by configuration.
pub enum VaultAuth {
    Token(String),
    AppRole {
        role_id: String,
        secret_id: String,
        mount: String,
    },
}

impl ServerOptions {
    /// Validates that one Vault authentication mode is configured. A
    /// token takes precedence when both are present.
    pub fn vault_auth(&self) -> anyhow::Result<VaultAuth> {
        if let Some(token) = &self.vault_auth_token {
            return Ok(VaultAuth::Token(token.clone()));
        }

        match (
            &self.vault_auth_approle_role_id,
            &self.vault_auth_approle_secret_id,
        ) {
            (Some(role_id), Some(secret_id)) => Ok(VaultAuth::AppRole {
                role_id: role_id.clone(),
                secret_id: secret_id.clone(),
                mount: self.vault_auth_approle_backend_path.clone(),
            }),
            _ => anyhow::bail!(
                "Vault auth config options missing: set --vault-auth-token, or both \
                 --vault-auth-approle-role-id and --vault-auth-approle-secret-id"
            ),
        }
    }

    /// The issuing (leaf) PKI path is the last of the chain.
    pub fn issuing_pki_path(&self) -> anyhow::Result<&str> {
        self.vault_pki_paths
            .last()
            .map(String::as_str)
            .ok_or_else(|| anyhow::anyhow!("at least one Vault PKI path must be configured"))
    }

    /// GitHub authorization options, when an organization is configured.
    pub fn github(&self) -> Option<GithubAuthOptions> {
        self.auth_github_org.as_ref().map(|org| GithubAuthOptions {
            organization: org.clone(),
            allowed_users: self.auth_github_users.clone(),
            allowed_teams: self.auth_github_teams.clone(),
            api_base: crate::auth::GITHUB_API.to_string(),
        })
    }
}
