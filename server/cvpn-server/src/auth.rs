//! GitHub-backed authorization for the API surface.
//!
//! Requests must carry a personal access token belonging to a member of
//! the configured organization; user and team allow-lists narrow access
//! further. Probe endpoints (`/healthz`, `/readyz`) are always open.

use crate::error::ApiError;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::warn;

pub(crate) const GITHUB_API: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct GithubAuthOptions {
    pub organization: String,
    pub allowed_users: Vec<String>,
    pub allowed_teams: Vec<String>,
    pub api_base: String,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubOrg {
    id: u64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubTeam {
    name: String,
    slug: String,
    organization: GithubOrg,
}

/// Middleware entry point. With no options configured every request
/// passes through.
pub async fn authorize(
    options: Option<GithubAuthOptions>,
    request: Request,
    next: Next,
) -> Response {
    let Some(options) = options else {
        return next.run(request).await;
    };

    // Probe endpoints stay unauthenticated.
    if request.uri().path().ends_with('z') {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()) else {
        return ApiError::Unauthorized("missing bearer token".to_string()).into_response();
    };

    match check_membership(&options, &token).await {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            warn!("Rejected API request: {}", reason);
            ApiError::Unauthorized(reason).into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    value.strip_prefix("Bearer ").map(|token| token.to_string())
}

/// Checks org membership and the optional user/team allow-lists against
/// the GitHub API.
async fn check_membership(options: &GithubAuthOptions, token: &str) -> Result<(), String> {
    let client = reqwest::Client::new();

    let user: GithubUser = get_json(&client, token, &format!("{}/user", options.api_base)).await?;
    let orgs: Vec<GithubOrg> =
        get_paginated(&client, token, &format!("{}/user/orgs", options.api_base)).await?;

    let org = orgs
        .into_iter()
        .find(|org| org.login.eq_ignore_ascii_case(&options.organization))
        .ok_or_else(|| "user is not part of the required organization".to_string())?;

    let mut allowed_team = false;
    if !options.allowed_teams.is_empty() {
        let teams: Vec<GithubTeam> =
            get_paginated(&client, token, &format!("{}/user/teams", options.api_base)).await?;

        // Only teams of the configured organization count; both the
        // display name and the slug may appear in the allow-list.
        allowed_team = teams
            .iter()
            .filter(|team| team.organization.id == org.id)
            .any(|team| {
                options.allowed_teams.iter().any(|allowed| {
                    allowed.eq_ignore_ascii_case(&team.name)
                        || allowed.eq_ignore_ascii_case(&team.slug)
                })
            });
    }

    let allowed_user = !options.allowed_users.is_empty()
        && options
            .allowed_users
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&user.login));

    // Organization membership alone is enough when no allow-list is set.
    if options.allowed_users.is_empty() && options.allowed_teams.is_empty() {
        return Ok(());
    }
    if allowed_user || allowed_team {
        return Ok(());
    }

    Err("user does not match any of the allowed users or teams".to_string())
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    token: &str,
    url: &str,
) -> Result<T, String> {
    let response = client
        .get(url)
        .bearer_auth(token)
        .header(reqwest::header::USER_AGENT, "cvpn-pki-manager")
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| format!("GitHub API request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!(
            "GitHub API returned {} for {}",
            response.status(),
            url
        ));
    }

    response
        .json()
        .await
        .map_err(|e| format!("invalid GitHub API response: {}", e))
}

async fn get_paginated<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    token: &str,
    url: &str,
) -> Result<Vec<T>, String> {
    let mut all = Vec::new();
    let mut page = 1;

    loop {
        let page_url = format!("{}?per_page={}&page={}", url, PAGE_SIZE, page);
        let items: Vec<T> = get_json(client, token, &page_url).await?;
        let last_page = items.len() < PAGE_SIZE;
        all.extend(items);
        if last_page {
            break;
        }
        page += 1;
    }

    Ok(all)
}
