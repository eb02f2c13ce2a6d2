//! Choosing the HTML rendering of a message body.
//!
//! Preference order: the first `text/html` part with inline data, descending
//! into `multipart/alternative` groups as they are encountered; otherwise a
//! plain-text part wrapped in a minimal HTML shell; otherwise empty.

use crate::api::model::MessagePart;

use super::decode::decode_text;

/// Select the HTML body for a message payload.
///
/// Returns an empty string when the message carries no usable text at all.
pub fn select_html_body(payload: &MessagePart) -> String {
    let mut html = String::new();

    for part in &payload.parts {
        if part.mime_type == "text/html" {
            if let Some(text) = inline_text(part) {
                html = text;
                break;
            }
        } else if part.mime_type == "multipart/alternative" {
            // The nested group gets the full selection, fallback included.
            html = select_html_body(part);
            if !html.is_empty() {
                break;
            }
        }
    }

    if html.is_empty() {
        let text = plain_text_body(payload);
        if !text.is_empty() {
            html = format!("<html><body><pre>{text}</pre></body></html>");
        }
    }

    html
}

/// Find a plain-text body: first matching direct child, or the payload
/// itself when it is a childless `text/plain` message.
fn plain_text_body(payload: &MessagePart) -> String {
    if !payload.parts.is_empty() {
        for part in &payload.parts {
            if part.mime_type == "text/plain" {
                if let Some(text) = inline_text(part) {
                    return text;
                }
            }
        }
        String::new()
    } else if payload.mime_type == "text/plain" {
        inline_text(payload).unwrap_or_default()
    } else {
        String::new()
    }
}

/// Decode a part's inline data, if any.
fn inline_text(part: &MessagePart) -> Option<String> {
    let data = part.body.data.as_deref()?;
    match decode_text(data) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(
                mime_type = %part.mime_type,
                error = %e,
                "Failed to decode body part"
            );
            None
        }
    }
}
