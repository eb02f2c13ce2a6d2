//! Driving extraction across addresses.

use std::path::PathBuf;

use crate::api::client::MessageStore;
use crate::error::{DumpError, Result};

use super::exporter::export_message;
use super::manifest::{write_manifest, ManifestRow};
use super::sanitize::sanitize_filename;

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory receiving one subdirectory per address.
    pub output_root: PathBuf,
    /// Also download attachments.
    pub download_attachments: bool,
    /// `strftime` format for dates in exported files.
    pub date_format: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("extracted_emails"),
            download_attachments: false,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

/// Outcome of one address batch.
#[derive(Debug, Clone)]
pub struct AddressReport {
    /// Address the batch ran for.
    pub address: String,
    /// Message ids matched by the search.
    pub found: usize,
    /// Messages successfully exported.
    pub exported: usize,
    /// Attachments saved across all messages.
    pub attachments_saved: usize,
    /// Messages skipped after an error.
    pub failed: usize,
    /// Directory the batch wrote into.
    pub output_dir: PathBuf,
}

/// Search query matching the address in From, To, or Cc.
pub fn build_query(address: &str) -> String {
    format!("from:{address} OR to:{address} OR cc:{address}")
}

/// Extract every message exchanged with one address.
///
/// Returns `Ok(None)` when the search matches nothing; no directory is
/// created in that case. A failed search logs a warning and counts as no
/// matches. Individual message failures are logged, skipped, and tallied
/// in the report.
pub fn extract_address(
    store: &dyn MessageStore,
    address: &str,
    opts: &ExtractOptions,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<Option<AddressReport>> {
    let query = build_query(address);
    let ids = match store.list_message_ids(&query) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(address, error = %e, "Search failed, treating as no matches");
            Vec::new()
        }
    };

    if ids.is_empty() {
        tracing::info!(address, "No messages matched");
        return Ok(None);
    }

    let address_dir = opts.output_root.join(sanitize_filename(address));
    std::fs::create_dir_all(&address_dir).map_err(|e| DumpError::io(&address_dir, e))?;

    let total = ids.len();
    let mut rows: Vec<ManifestRow> = Vec::with_capacity(total);
    let mut failed = 0usize;

    for (i, id) in ids.iter().enumerate() {
        if let Some(progress) = progress {
            progress(i, total);
        }
        match export_message(store, id, i + 1, &address_dir, opts) {
            Ok(row) => rows.push(row),
            Err(e) => {
                failed += 1;
                tracing::warn!(message_id = %id, error = %e, "Failed to export message");
            }
        }
    }
    if let Some(progress) = progress {
        progress(total, total);
    }

    write_manifest(&rows, &address_dir.join("emails.csv"))?;

    let attachments_saved = rows.iter().map(|r| r.attachments.len()).sum();
    Ok(Some(AddressReport {
        address: address.to_string(),
        found: total,
        exported: rows.len(),
        attachments_saved,
        failed,
        output_dir: address_dir,
    }))
}
