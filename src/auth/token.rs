//! Cached OAuth token set with expiry tracking.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{DumpError, Result};

use super::flow::TokenResponse;

/// Threshold in seconds: treat the token as expired if it expires within
/// this window, so a fetch started now cannot outlive it.
const REFRESH_THRESHOLD_SECS: i64 = 300;

/// Persisted OAuth token set (`token.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Current access token.
    pub access_token: String,
    /// Long-lived token used to obtain new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) when the access token expires.
    pub expires_at: i64,
    /// Space-separated scopes the token was granted.
    #[serde(default)]
    pub scopes: String,
}

impl StoredToken {
    /// Build an entry from a token endpoint response.
    ///
    /// `previous_refresh` is kept when the response omits a refresh token,
    /// as refresh-grant responses usually do.
    pub fn from_response(resp: &TokenResponse, previous_refresh: Option<String>) -> Self {
        Self {
            access_token: resp.access_token.clone(),
            refresh_token: resp.refresh_token.clone().or(previous_refresh),
            expires_at: unix_now() + resp.expires_in.unwrap_or(3600) as i64,
            scopes: resp.scope.clone().unwrap_or_default(),
        }
    }

    /// True if the token is expired or expires within the refresh window.
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.expires_at - REFRESH_THRESHOLD_SECS
    }

    /// Load a token set from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DumpError::io(path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the token set to disk as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| DumpError::io(path, e))
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_at: i64) -> StoredToken {
        StoredToken {
            access_token: "ya29.test".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expires_at,
            scopes: "https://www.googleapis.com/auth/gmail.readonly".to_string(),
        }
    }

    #[test]
    fn test_fresh_token_not_expired() {
        assert!(!token(unix_now() + 3600).is_expired());
    }

    #[test]
    fn test_token_within_threshold_is_expired() {
        assert!(token(unix_now() + 60).is_expired());
    }

    #[test]
    fn test_past_token_is_expired() {
        assert!(token(unix_now() - 10).is_expired());
    }

    #[test]
    fn test_json_roundtrip() {
        let original = token(1_900_000_000);
        let json = serde_json::to_string(&original).unwrap();
        let parsed: StoredToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let original = token(1_900_000_000);
        original.save(&path).unwrap();
        assert_eq!(StoredToken::load(&path).unwrap(), original);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(StoredToken::load(Path::new("/nonexistent/token.json")).is_err());
    }

    #[test]
    fn test_refresh_response_keeps_previous_refresh_token() {
        let resp = TokenResponse {
            access_token: "ya29.new".to_string(),
            refresh_token: None,
            expires_in: Some(3599),
            scope: None,
        };
        let renewed = StoredToken::from_response(&resp, Some("1//old".to_string()));
        assert_eq!(renewed.access_token, "ya29.new");
        assert_eq!(renewed.refresh_token.as_deref(), Some("1//old"));
        assert!(!renewed.is_expired());
    }

    #[test]
    fn test_response_refresh_token_wins() {
        let resp = TokenResponse {
            access_token: "a".to_string(),
            refresh_token: Some("1//fresh".to_string()),
            expires_in: None,
            scope: Some("scope-a".to_string()),
        };
        let stored = StoredToken::from_response(&resp, Some("1//old".to_string()));
        assert_eq!(stored.refresh_token.as_deref(), Some("1//fresh"));
        assert_eq!(stored.scopes, "scope-a");
    }
}
