//! Loading the list of addresses to extract mail for.
//!
//! The address file is plain text: one address per line, `#` starts a
//! comment line, blank lines are ignored. Addresses are lowercased and
//! de-duplicated while preserving first-seen order.

use std::path::Path;

use crate::error::{DumpError, Result};

/// Read and normalize the address list file.
///
/// Fails if the file does not exist or yields no usable addresses.
pub fn load_addresses(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(DumpError::AddressFileNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| DumpError::io(path, e))?;
    let addresses = normalize_lines(&contents);

    if addresses.is_empty() {
        return Err(DumpError::NoAddresses(path.to_path_buf()));
    }

    tracing::debug!(count = addresses.len(), path = %path.display(), "Loaded address list");
    Ok(addresses)
}

/// Normalize raw file contents into a deduplicated, lowercase address list.
fn normalize_lines(contents: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut addresses = Vec::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let addr = line.to_lowercase();
        if seen.insert(addr.clone()) {
            addresses.push(addr);
        }
    }

    addresses
}
