//! HTTP surface for the client VPN PKI manager.
//!
//! Thin boundary over the engine crates: request routing, GitHub-based
//! authorization, configuration, and the scheduled daily CRL rotation.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod scheduler;
pub mod server;

pub use error::{ApiError, ApiErrorResponse};
pub use server::CvpnServer;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the application router with authorization middleware and
/// request tracing.
pub fn create_app(server: CvpnServer) -> Router {
    let github = server.config.github();

    routes::create_routes()
        .with_state(server)
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            let options = github.clone();
            async move { auth::authorize(options, request, next).await }
        }))
        .layer(TraceLayer::new_for_http())
}
