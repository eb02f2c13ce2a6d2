//! OAuth2 authorization-code flow with PKCE for desktop use.
//!
//! 1. Generate PKCE code_verifier + code_challenge (S256) and a state nonce.
//! 2. Hand the authorization URL to the caller for the user to open.
//! 3. Receive the redirect on an ephemeral `http://localhost:{port}` listener.
//! 4. Exchange the authorization code for tokens at the token endpoint.
//!
//! Token refresh lives here too, as it posts to the same endpoint.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{DumpError, Result};

use super::credentials::ClientCredentials;

/// Token endpoint response for both the code exchange and refresh grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for API requests.
    pub access_token: String,
    /// Long-lived refresh token; refresh responses usually omit it.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Space-separated scopes actually granted.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Run the interactive authorization flow.
///
/// `on_auth_url` receives the URL the user must open in a browser. Blocks
/// until the provider redirects back to the local listener, then exchanges
/// the code for tokens.
pub fn run_authorization_flow(
    http: &reqwest::blocking::Client,
    credentials: &ClientCredentials,
    scope: &str,
    on_auth_url: impl FnOnce(&str),
) -> Result<TokenResponse> {
    let code_verifier = random_token(32);
    let code_challenge = s256_challenge(&code_verifier);
    let state = random_token(16);

    // Bind to a random available port on localhost.
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|e| DumpError::AuthFlow(format!("failed to bind localhost listener: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| DumpError::AuthFlow(format!("failed to get local address: {e}")))?
        .port();
    let redirect_uri = format!("http://localhost:{port}");

    let auth_url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&code_challenge={}&code_challenge_method=S256&state={}&access_type=offline&prompt=consent",
        credentials.auth_uri,
        encode(&credentials.client_id),
        encode(&redirect_uri),
        encode(scope),
        encode(&code_challenge),
        encode(&state),
    );
    on_auth_url(&auth_url);

    // Wait for the redirect callback.
    let (mut socket, _addr) = listener
        .accept()
        .map_err(|e| DumpError::AuthFlow(format!("failed to accept redirect connection: {e}")))?;
    let mut buf = vec![0u8; 8192];
    let n = socket
        .read(&mut buf)
        .map_err(|e| DumpError::AuthFlow(format!("failed to read redirect request: {e}")))?;
    let request = String::from_utf8_lossy(&buf[..n]).into_owned();

    if extract_query_param(&request, "state").as_deref() != Some(state.as_str()) {
        respond(
            &mut socket,
            "400 Bad Request",
            "Authorization failed",
            "State mismatch. Please try again.",
        );
        return Err(DumpError::AuthFlow("state mismatch in redirect".to_string()));
    }

    if let Some(error) = extract_query_param(&request, "error") {
        let desc =
            extract_query_param(&request, "error_description").unwrap_or_else(|| error.clone());
        respond(
            &mut socket,
            "200 OK",
            "Authorization failed",
            &html_escape(&desc),
        );
        return Err(DumpError::AuthFlow(desc));
    }

    let code = match extract_query_param(&request, "code") {
        Some(code) => code,
        None => {
            respond(
                &mut socket,
                "400 Bad Request",
                "Authorization failed",
                "The redirect carried no authorization code.",
            );
            return Err(DumpError::AuthFlow(
                "no 'code' parameter in redirect".to_string(),
            ));
        }
    };

    respond(
        &mut socket,
        "200 OK",
        "Authorization successful",
        "You can close this window and return to the terminal.",
    );
    drop(socket);

    exchange_code(http, credentials, &code, &redirect_uri, &code_verifier)
}

/// Exchange a refresh token for a new access token.
pub fn refresh_token(
    http: &reqwest::blocking::Client,
    credentials: &ClientCredentials,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
    ];
    post_token_request(http, &credentials.token_uri, &params)
}

/// Exchange the authorization code for tokens.
fn exchange_code(
    http: &reqwest::blocking::Client,
    credentials: &ClientCredentials,
    code: &str,
    redirect_uri: &str,
    code_verifier: &str,
) -> Result<TokenResponse> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("code_verifier", code_verifier),
    ];
    post_token_request(http, &credentials.token_uri, &params)
}

fn post_token_request(
    http: &reqwest::blocking::Client,
    token_uri: &str,
    params: &[(&str, &str)],
) -> Result<TokenResponse> {
    let resp = http.post(token_uri).form(params).send()?;
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(DumpError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Answer the browser's redirect with a minimal HTML page.
fn respond(socket: &mut TcpStream, status: &str, heading: &str, detail: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nConnection: close\r\n\r\n<html><body><h1>{heading}</h1><p>{detail}</p></body></html>"
    );
    let _ = socket.write_all(response.as_bytes());
}

// ── PKCE helpers ─────────────────────────────────────────────────

/// Random base64url token from `len` bytes of entropy.
fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `BASE64URL(SHA256(verifier))` per RFC 7636.
fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

// ── URL / query helpers ──────────────────────────────────────────

fn encode(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

/// Extract a query parameter from an HTTP GET request line.
///
/// Expects the first line to be `GET /path?key=val&... HTTP/1.1`.
fn extract_query_param(request: &str, param: &str) -> Option<String> {
    let first_line = request.lines().next()?;
    let path = first_line.split_whitespace().nth(1)?;
    let query = path.split('?').nth(1)?;
    for pair in query.split('&') {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next()?;
        let value = kv.next().unwrap_or("");
        if key == param {
            return Some(
                percent_encoding::percent_decode_str(value)
                    .decode_utf8_lossy()
                    .into_owned(),
            );
        }
    }
    None
}

/// Minimal HTML escaping for provider-supplied error messages.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s256_challenge_rfc7636_vector() {
        // RFC 7636 Appendix B test vector
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            s256_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_random_token_length_and_uniqueness() {
        let a = random_token(32);
        let b = random_token(32);
        // 32 bytes encode to 43 base64url characters without padding
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn test_extract_query_param() {
        let request = "GET /?code=abc123&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n";
        assert_eq!(
            extract_query_param(request, "code"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_query_param(request, "state"),
            Some("xyz".to_string())
        );
        assert_eq!(extract_query_param(request, "missing"), None);
    }

    #[test]
    fn test_extract_query_param_percent_decodes() {
        let request = "GET /?error_description=access%20denied HTTP/1.1\r\n\r\n";
        assert_eq!(
            extract_query_param(request, "error_description"),
            Some("access denied".to_string())
        );
    }

    #[test]
    fn test_token_response_deserializes() {
        let json = r#"{"access_token":"ya29.xxx","token_type":"Bearer","expires_in":3600,"refresh_token":"1//0abc","scope":"https://www.googleapis.com/auth/gmail.readonly"}"#;
        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access_token, "ya29.xxx");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//0abc"));
        assert_eq!(tokens.expires_in, Some(3600));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&\"x\"</b>"), "&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;");
    }
}
