//! The per-address CSV manifest of exported messages.

use std::io::Write;
use std::path::Path;

use crate::error::{DumpError, Result};

/// Column order of the manifest file.
const HEADER: &str = "Filename,Subject,From,To,Cc,Date,Message ID,Attachments";

/// One row per successfully exported message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestRow {
    /// Name of the exported HTML file.
    pub filename: String,
    /// Subject header, verbatim (may be empty).
    pub subject: String,
    /// From header, verbatim.
    pub from: String,
    /// To header, verbatim.
    pub to: String,
    /// Cc header, verbatim.
    pub cc: String,
    /// Formatted date, or the raw header when unparseable.
    pub date: String,
    /// Server-side message identifier.
    pub message_id: String,
    /// Saved attachment filenames, in discovery order.
    pub attachments: Vec<String>,
}

/// Write the manifest to `output_path`.
///
/// Nothing is written when `rows` is empty, so a fully failed batch leaves
/// no manifest behind.
pub fn write_manifest(rows: &[ManifestRow], output_path: &Path) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut file =
        std::fs::File::create(output_path).map_err(|e| DumpError::io(output_path, e))?;
    writeln!(file, "{HEADER}").map_err(|e| DumpError::io(output_path, e))?;

    for row in rows {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            csv_escape(&row.filename),
            csv_escape(&row.subject),
            csv_escape(&row.from),
            csv_escape(&row.to),
            csv_escape(&row.cc),
            csv_escape(&row.date),
            csv_escape(&row.message_id),
            csv_escape(&row.attachments.join(", ")),
        )
        .map_err(|e| DumpError::io(output_path, e))?;
    }

    Ok(())
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
