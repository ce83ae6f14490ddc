//! Route table. Every route maps 1:1 onto a core operation.

use crate::handlers::{crl, health, users};
use crate::server::CvpnServer;
use axum::routing::{get, post};
use axum::Router;

pub fn create_routes() -> Router<CvpnServer> {
    Router::new()
        .route("/crl", get(crl::get_crl).post(crl::update_crl))
        .route("/crl/rotate", post(crl::rotate_crl))
        .route("/issue/:user", post(users::issue_certificate))
        .route("/revoke/:user", post(users::revoke_user))
        .route("/users", get(users::list_users))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
}
