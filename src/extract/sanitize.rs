//! Filesystem-safe names for exported files.

use std::path::{Path, PathBuf};

/// Characters rejected by common filesystems.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum length of a sanitized name, in characters.
const MAX_NAME_CHARS: usize = 200;

/// Replace invalid filename characters with `_` and cap the length.
///
/// Everything else, including spaces and non-ASCII, passes through.
/// No uniqueness guarantee; see [`unique_path`] for collision handling.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_NAME_CHARS)
        .collect()
}

/// If `path` already exists, append a counter to the stem to make it unique.
///
/// The counter always applies to the original stem (`doc_1.pdf`,
/// `doc_2.pdf`, never `doc_1_1.pdf`) and grows until a free name is found.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut i: u64 = 1;
    loop {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_all_invalid_chars() {
        assert_eq!(sanitize_filename(r#"<>:"/\|?*"#), "_________");
    }

    #[test]
    fn test_sanitize_mixed() {
        assert_eq!(
            sanitize_filename("Re: meeting notes 1/2"),
            "Re_ meeting notes 1_2"
        );
    }

    #[test]
    fn test_sanitize_valid_name_unchanged() {
        assert_eq!(sanitize_filename("report 2024.pdf"), "report 2024.pdf");
    }

    #[test]
    fn test_sanitize_preserves_unicode() {
        assert_eq!(sanitize_filename("résumé 草案.doc"), "résumé 草案.doc");
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_sanitize_truncates_to_200_chars() {
        let long: String = "é".repeat(250);
        let out = sanitize_filename(&long);
        assert_eq!(out.chars().count(), 200);
    }

    #[test]
    fn test_unique_path_no_collision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        assert_eq!(unique_path(&path), path);
    }

    #[test]
    fn test_unique_path_counter_does_not_compound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");

        std::fs::write(&path, b"x").unwrap();
        let first = unique_path(&path);
        assert_eq!(first, dir.path().join("doc_1.pdf"));

        std::fs::write(&first, b"x").unwrap();
        let second = unique_path(&path);
        assert_eq!(second, dir.path().join("doc_2.pdf"));
    }

    #[test]
    fn test_unique_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(unique_path(&path), dir.path().join("README_1"));
    }
}
