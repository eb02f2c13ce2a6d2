//! HTTP client for the Gmail REST API.

use reqwest::blocking::Client;

use crate::error::{DumpError, Result};

use super::model::{Message, MessageList, PartBody, Profile};

/// Base URL of the Gmail REST API.
const API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Read access to a mailbox: search, fetch, attachment retrieval.
///
/// The extraction pipeline talks only to this trait, so tests can swap in
/// an in-memory implementation.
pub trait MessageStore {
    /// Collect every message id matching a search query, following
    /// pagination to exhaustion.
    fn list_message_ids(&self, query: &str) -> Result<Vec<String>>;

    /// Fetch one message with its full part tree.
    fn get_message(&self, id: &str) -> Result<Message>;

    /// Fetch an attachment payload by reference.
    ///
    /// Returns the payload still base64url-encoded, as the API sends it.
    fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String>;
}

/// A [`MessageStore`] backed by the live Gmail API.
pub struct GmailClient {
    client: Client,
    access_token: String,
}

impl GmailClient {
    /// Build a client that authorizes with the given bearer token.
    pub fn new(access_token: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            access_token,
        })
    }

    /// Fetch the authorized account's profile.
    pub fn profile(&self) -> Result<Profile> {
        self.get_json(&format!("{API_BASE}/users/me/profile"), &[])
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()?;
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
}

impl MessageStore for GmailClient {
    fn list_message_ids(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{API_BASE}/users/me/messages");
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", query)];
            if let Some(ref token) = page_token {
                params.push(("pageToken", token.as_str()));
            }
            let page: MessageList = self.get_json(&url, &params)?;
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(query, count = ids.len(), "Listed matching messages");
        Ok(ids)
    }

    fn get_message(&self, id: &str) -> Result<Message> {
        let url = format!("{API_BASE}/users/me/messages/{id}");
        self.get_json(&url, &[("format", "full")])
    }

    fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String> {
        let url = format!("{API_BASE}/users/me/messages/{message_id}/attachments/{attachment_id}");
        let body: PartBody = self.get_json(&url, &[])?;
        body.data.ok_or_else(|| DumpError::Api {
            status: 200,
            body: "attachment response carried no data".to_string(),
        })
    }
}
