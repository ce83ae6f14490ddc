//! cvpn-server binary: wires configuration, the Vault session, the
//! reconciliation engine and the HTTP surface together.

use anyhow::Context;
use clap::Parser;
use cvpn_server::config::{ServerOptions, VaultAuth};
use cvpn_server::{create_app, scheduler, CvpnServer};
use pki_engine::{
    CertificateCatalog, CertificateIssuer, ClientConfigTemplate, CrlReconciler, PkiBackend,
    VaultPkiBackend,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vault_session::{AppRoleConfig, AppRoleSession, SessionProvider, TokenSession};
use vpn_gateway::{Ec2VpnGateway, VpnGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = ServerOptions::parse();
    let issuing_pki_path = options.issuing_pki_path()?.to_string();

    // The renewal loop checks this signal at every iteration.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sessions: Arc<dyn SessionProvider> = match options.vault_auth()? {
        VaultAuth::Token(token) => {
            info!("Authenticating to Vault with a static token");
            Arc::new(TokenSession::new(&options.vault_addr, token))
        }
        VaultAuth::AppRole {
            role_id,
            secret_id,
            mount,
        } => {
            info!("Authenticating to Vault with AppRole credentials");
            Arc::new(AppRoleSession::start(
                AppRoleConfig {
                    address: options.vault_addr.clone(),
                    role_id,
                    secret_id,
                    mount,
                },
                shutdown_rx,
            ))
        }
    };

    let backend: Arc<dyn PkiBackend> = Arc::new(VaultPkiBackend::new(Arc::clone(&sessions)));
    let gateway: Arc<dyn VpnGateway> = Arc::new(Ec2VpnGateway::new().await);

    let template = ClientConfigTemplate::from_file(&options.config_template_path)
        .context("failed to load the client configuration template")?;

    let reconciler = Arc::new(CrlReconciler::new(
        Arc::clone(&backend),
        Arc::clone(&gateway),
    ));
    let issuer = Arc::new(CertificateIssuer::new(
        Arc::clone(&backend),
        Arc::clone(&gateway),
        Arc::clone(&reconciler),
        template,
    ));
    let catalog = Arc::new(CertificateCatalog::new(Arc::clone(&backend)));

    let server = CvpnServer {
        issuing_pki_path,
        config: Arc::new(options),
        catalog,
        reconciler,
        issuer,
    };

    let mut rotation = scheduler::start_daily_rotation(server.clone()).await?;

    let addr = format!("0.0.0.0:{}", server.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, create_app(server))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    // Stop the renewal loop and the rotation job before exiting.
    let _ = shutdown_tx.send(true);
    rotation.shutdown().await?;

    Ok(())
}
