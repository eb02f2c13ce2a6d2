//! OAuth token lifecycle: cached token, refresh grant, interactive flow.

pub mod credentials;
pub mod flow;
pub mod token;

use std::path::Path;

use crate::error::Result;

use token::StoredToken;

/// OAuth scope requested for extraction. Read-only mailbox access.
pub const SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Obtain a usable access token, escalating as needed.
///
/// Order: the cached token when still valid, then a refresh grant, then
/// the interactive authorization flow (`on_auth_url` receives the URL the
/// user must open). Whatever succeeds is written back to `token_path`; a
/// failed write is only a warning since the token in hand still works.
pub fn authenticate(
    credentials_path: &Path,
    token_path: &Path,
    timeout_secs: u64,
    on_auth_url: impl FnOnce(&str),
) -> Result<StoredToken> {
    let creds = credentials::load_credentials(credentials_path)?;
    let http = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?;

    let cached = match StoredToken::load(token_path) {
        Ok(token) => Some(token),
        Err(e) => {
            if token_path.exists() {
                tracing::warn!(error = %e, "Could not load saved token, re-authenticating");
            }
            None
        }
    };

    if let Some(token) = &cached {
        if !token.is_expired() {
            tracing::debug!("Using cached access token");
            return Ok(token.clone());
        }
    }

    if let Some(refresh) = cached.and_then(|t| t.refresh_token) {
        match flow::refresh_token(&http, &creds, &refresh) {
            Ok(resp) => {
                let renewed = StoredToken::from_response(&resp, Some(refresh));
                save_token(&renewed, token_path);
                tracing::info!("Access token refreshed");
                return Ok(renewed);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, starting authorization flow");
            }
        }
    }

    let resp = flow::run_authorization_flow(&http, &creds, SCOPE, on_auth_url)?;
    let token = StoredToken::from_response(&resp, None);
    save_token(&token, token_path);
    Ok(token)
}

fn save_token(token: &StoredToken, path: &Path) {
    match token.save(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Saved authentication token"),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not save token, re-authentication will be needed next run"
            );
        }
    }
}
