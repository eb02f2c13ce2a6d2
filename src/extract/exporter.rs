//! Per-message export: headers, body, attachments, HTML file, manifest row.

use std::path::Path;

use chrono::DateTime;

use crate::api::client::MessageStore;
use crate::error::{DumpError, Result};

use super::attachments::{remove_empty_dirs, save_attachments};
use super::batch::ExtractOptions;
use super::body::select_html_body;
use super::html::{render_message, MessageMeta};
use super::manifest::ManifestRow;
use super::sanitize::sanitize_filename;

/// Filename stem for messages without a subject.
const NO_SUBJECT: &str = "no_subject";

/// Export one message into the address directory.
///
/// `seq` is the 1-based position within the batch; it prefixes the HTML
/// filename and the attachment folder so files sort in fetch order.
pub fn export_message(
    store: &dyn MessageStore,
    message_id: &str,
    seq: usize,
    address_dir: &Path,
    opts: &ExtractOptions,
) -> Result<ManifestRow> {
    let message = store.get_message(message_id)?;

    let meta = MessageMeta {
        subject: message.header("Subject").to_string(),
        from: message.header("From").to_string(),
        to: message.header("To").to_string(),
        cc: message.header("Cc").to_string(),
        date: format_date(message.header("Date"), &opts.date_format),
    };

    let body_html = select_html_body(&message.payload);

    let safe_subject = if meta.subject.is_empty() {
        NO_SUBJECT.to_string()
    } else {
        sanitize_filename(&meta.subject)
    };

    let mut attachment_names = Vec::new();
    if opts.download_attachments {
        let message_dir = address_dir.join(format!("{seq:04}_{safe_subject}"));
        let attachment_dir = message_dir.join("attachments");
        std::fs::create_dir_all(&attachment_dir)
            .map_err(|e| DumpError::io(&attachment_dir, e))?;

        attachment_names = save_attachments(store, &message.id, &message.payload, &attachment_dir);
        if attachment_names.is_empty() {
            remove_empty_dirs(&attachment_dir, &message_dir);
        }
    }

    let html_filename = format!("{seq:04}_{safe_subject}.html");
    let html_path = address_dir.join(&html_filename);
    let document = render_message(&meta, &body_html);
    std::fs::write(&html_path, document).map_err(|e| DumpError::io(&html_path, e))?;

    Ok(ManifestRow {
        filename: html_filename,
        subject: meta.subject,
        from: meta.from,
        to: meta.to,
        cc: meta.cc,
        date: meta.date,
        message_id: message_id.to_string(),
        attachments: attachment_names,
    })
}

/// Format a Date header, keeping the message's own timezone.
///
/// Unparseable values come back verbatim rather than failing the export.
fn format_date(raw: &str, format: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return dt.format(format).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format(format).to_string();
    }
    raw.to_string()
}
