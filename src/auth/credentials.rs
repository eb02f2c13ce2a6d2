//! Loading and validating the OAuth client credentials file.
//!
//! The file is the JSON downloaded from Google Cloud Console for an
//! OAuth 2.0 "Desktop app" client: a top-level `installed` (or `web`)
//! object carrying the client id, secret, and endpoint URIs.

use std::path::Path;

use serde::Deserialize;

use crate::error::{DumpError, Result};

/// Validated OAuth client definition.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Authorization endpoint URI.
    pub auth_uri: String,
    /// Token endpoint URI.
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<RawClient>,
    web: Option<RawClient>,
}

#[derive(Debug, Default, Deserialize)]
struct RawClient {
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

/// Read and validate the credentials file.
///
/// Every failure mode maps to [`DumpError::InvalidCredentials`] with a
/// reason precise enough to act on: missing file, invalid JSON, wrong
/// shape, or a list of the missing required fields.
pub fn load_credentials(path: &Path) -> Result<ClientCredentials> {
    let invalid = |reason: String| DumpError::InvalidCredentials {
        path: path.to_path_buf(),
        reason,
    };

    if !path.exists() {
        return Err(invalid("file not found".to_string()));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| DumpError::io(path, e))?;
    let file: CredentialsFile = serde_json::from_str(&contents)
        .map_err(|_| invalid("file is not valid JSON".to_string()))?;

    let raw = file.installed.or(file.web).ok_or_else(|| {
        invalid("must contain an 'installed' or 'web' OAuth 2.0 desktop-app client".to_string())
    })?;

    let mut missing = Vec::new();
    if raw.client_id.is_none() {
        missing.push("client_id");
    }
    if raw.client_secret.is_none() {
        missing.push("client_secret");
    }
    if raw.auth_uri.is_none() {
        missing.push("auth_uri");
    }
    if raw.token_uri.is_none() {
        missing.push("token_uri");
    }
    if !missing.is_empty() {
        return Err(invalid(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(ClientCredentials {
        client_id: raw.client_id.unwrap_or_default(),
        client_secret: raw.client_secret.unwrap_or_default(),
        auth_uri: raw.auth_uri.unwrap_or_default(),
        token_uri: raw.token_uri.unwrap_or_default(),
    })
}
