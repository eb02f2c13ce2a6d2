//! Wire types for the Gmail REST API (v1).
//!
//! Field names follow the API's camelCase JSON; absent fields deserialize
//! to their defaults so partial payloads never fail.

use serde::{Deserialize, Serialize};

/// A full message as returned by `users/me/messages/{id}?format=full`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    /// Immutable message identifier.
    pub id: String,
    /// Identifier of the containing thread.
    pub thread_id: String,
    /// Root of the MIME part tree.
    pub payload: MessagePart,
    /// Server-rendered one-line preview.
    pub snippet: String,
}

/// One node of a message's MIME part tree.
///
/// A node with a non-empty `parts` list is a container; a childless node
/// with a non-empty `filename` is an attachment leaf; anything else is
/// body content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    /// MIME type, e.g. `text/html` or `multipart/alternative`.
    pub mime_type: String,
    /// Declared attachment filename; empty for body parts.
    pub filename: String,
    /// RFC 822 headers present on this part.
    pub headers: Vec<Header>,
    /// Payload of this part.
    pub body: PartBody,
    /// Nested child parts.
    pub parts: Vec<MessagePart>,
}

/// Payload of a single MIME part.
///
/// Large payloads omit `data` and carry `attachment_id` instead, to be
/// fetched separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartBody {
    /// Opaque reference for a separate attachment fetch.
    pub attachment_id: Option<String>,
    /// Payload size in bytes.
    pub size: u64,
    /// Inline payload, base64url-encoded.
    pub data: Option<String>,
}

/// A single message header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Header name as sent by the server.
    pub name: String,
    /// Header value, verbatim.
    pub value: String,
}

/// Reference entry in a message list response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageRef {
    /// Message identifier, usable with the get endpoint.
    pub id: String,
    /// Identifier of the containing thread.
    pub thread_id: String,
}

/// Paginated response of `users/me/messages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageList {
    /// Matches on this page.
    pub messages: Vec<MessageRef>,
    /// Continuation token; absent on the last page.
    pub next_page_token: Option<String>,
    /// Server estimate of the total result count.
    pub result_size_estimate: u64,
}

/// Response of `users/me/profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Address of the authorized account.
    pub email_address: String,
    /// Total number of messages in the mailbox.
    pub messages_total: u64,
}

impl Message {
    /// Look up a header on the payload by name, case-insensitively.
    pub fn header(&self, name: &str) -> &str {
        self.payload.header(name)
    }
}

impl MessagePart {
    /// Look up a header value by name, case-insensitively.
    ///
    /// Returns the first match, or the empty string when absent.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .unwrap_or("")
    }
}
