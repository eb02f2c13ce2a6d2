//! Attachment discovery and materialization.
//!
//! Attachments are found by a pre-order walk of the message's part tree:
//! a node with children is a container and is only descended into, a
//! childless node with a declared filename is an attachment leaf. Leaf
//! payloads arrive either inline or through a separate fetch by id.

use std::path::Path;

use crate::api::client::MessageStore;
use crate::api::model::MessagePart;
use crate::error::{DumpError, Result};

use super::decode::decode_bytes;
use super::sanitize::{sanitize_filename, unique_path};

/// Walk the payload tree and write every attachment into `dir`.
///
/// Returns the saved filenames in discovery order. A failure on one
/// attachment is logged and skipped; the rest of the message is still
/// processed. The caller owns directory creation and cleanup.
pub fn save_attachments(
    store: &dyn MessageStore,
    message_id: &str,
    payload: &MessagePart,
    dir: &Path,
) -> Vec<String> {
    let mut saved = Vec::new();
    walk_parts(store, message_id, &payload.parts, dir, &mut saved);
    saved
}

fn walk_parts(
    store: &dyn MessageStore,
    message_id: &str,
    parts: &[MessagePart],
    dir: &Path,
    saved: &mut Vec<String>,
) {
    for part in parts {
        // A container is never saved itself, even when it carries a filename.
        if !part.parts.is_empty() {
            walk_parts(store, message_id, &part.parts, dir, saved);
            continue;
        }
        if part.filename.is_empty() {
            continue;
        }
        match materialize(store, message_id, part, dir) {
            Ok(Some(filename)) => saved.push(filename),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    filename = %part.filename,
                    error = %e,
                    "Failed to save attachment"
                );
            }
        }
    }
}

/// Resolve one leaf's payload and write it under a collision-free name.
///
/// Returns `Ok(None)` for leaves that carry neither inline data nor a
/// fetch reference; there is nothing to materialize for those.
fn materialize(
    store: &dyn MessageStore,
    message_id: &str,
    part: &MessagePart,
    dir: &Path,
) -> Result<Option<String>> {
    let data = if let Some(id) = part.body.attachment_id.as_deref() {
        store.fetch_attachment(message_id, id)?
    } else if let Some(data) = part.body.data.as_deref() {
        data.to_string()
    } else {
        return Ok(None);
    };

    let bytes = decode_bytes(&data)?;
    let path = unique_path(&dir.join(sanitize_filename(&part.filename)));
    std::fs::write(&path, &bytes).map_err(|e| DumpError::io(&path, e))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::debug!(filename = %filename, size = bytes.len(), "Saved attachment");
    Ok(Some(filename))
}

/// Remove a message's attachment directory and its parent folder when
/// nothing was saved. Non-empty directories are left alone.
pub fn remove_empty_dirs(attachment_dir: &Path, message_dir: &Path) {
    let _ = std::fs::remove_dir(attachment_dir);
    let _ = std::fs::remove_dir(message_dir);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::{Message, PartBody};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use std::collections::HashMap;

    struct StubStore {
        attachments: HashMap<(String, String), String>,
    }

    impl StubStore {
        fn new() -> Self {
            Self {
                attachments: HashMap::new(),
            }
        }

        fn with_attachment(mut self, message_id: &str, attachment_id: &str, bytes: &[u8]) -> Self {
            self.attachments.insert(
                (message_id.to_string(), attachment_id.to_string()),
                URL_SAFE_NO_PAD.encode(bytes),
            );
            self
        }
    }

    impl MessageStore for StubStore {
        fn list_message_ids(&self, _query: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn get_message(&self, id: &str) -> Result<Message> {
            Err(DumpError::Api {
                status: 404,
                body: format!("no message {id}"),
            })
        }

        fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String> {
            self.attachments
                .get(&(message_id.to_string(), attachment_id.to_string()))
                .cloned()
                .ok_or_else(|| DumpError::Api {
                    status: 404,
                    body: "attachment not found".to_string(),
                })
        }
    }

    fn leaf_inline(filename: &str, bytes: &[u8]) -> MessagePart {
        MessagePart {
            mime_type: "application/octet-stream".to_string(),
            filename: filename.to_string(),
            body: PartBody {
                data: Some(URL_SAFE_NO_PAD.encode(bytes)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn leaf_by_id(filename: &str, attachment_id: &str) -> MessagePart {
        MessagePart {
            mime_type: "application/pdf".to_string(),
            filename: filename.to_string(),
            body: PartBody {
                attachment_id: Some(attachment_id.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn payload_with(parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: "multipart/mixed".to_string(),
            parts,
            ..Default::default()
        }
    }

    #[test]
    fn test_inline_attachment_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new();
        let payload = payload_with(vec![leaf_inline("notes.txt", b"hello")]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert_eq!(saved, vec!["notes.txt"]);
        assert_eq!(std::fs::read(dir.path().join("notes.txt")).unwrap(), b"hello");
    }

    #[test]
    fn test_referenced_attachment_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new().with_attachment("m1", "att9", b"%PDF-1.4");
        let payload = payload_with(vec![leaf_by_id("report.pdf", "att9")]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert_eq!(saved, vec!["report.pdf"]);
        assert_eq!(
            std::fs::read(dir.path().join("report.pdf")).unwrap(),
            b"%PDF-1.4"
        );
    }

    #[test]
    fn test_filename_sanitized_before_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new();
        let payload = payload_with(vec![leaf_inline("inv/oice:2024?.txt", b"x")]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert_eq!(saved, vec!["inv_oice_2024_.txt"]);
        assert!(dir.path().join("inv_oice_2024_.txt").exists());
    }

    #[test]
    fn test_duplicate_filenames_get_counters() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new();
        let payload = payload_with(vec![
            leaf_inline("document.pdf", b"one"),
            leaf_inline("document.pdf", b"two"),
        ]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert_eq!(saved, vec!["document.pdf", "document_1.pdf"]);
        assert_eq!(std::fs::read(dir.path().join("document.pdf")).unwrap(), b"one");
        assert_eq!(
            std::fs::read(dir.path().join("document_1.pdf")).unwrap(),
            b"two"
        );
    }

    #[test]
    fn test_nested_parts_discovered() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new();
        let payload = payload_with(vec![MessagePart {
            mime_type: "multipart/alternative".to_string(),
            parts: vec![leaf_inline("deep.bin", b"\x00\x01")],
            ..Default::default()
        }]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert_eq!(saved, vec!["deep.bin"]);
    }

    #[test]
    fn test_container_with_filename_is_descended_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new();
        let mut container = payload_with(vec![leaf_inline("inner.txt", b"inner")]);
        container.filename = "container.dat".to_string();
        let payload = payload_with(vec![container]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert_eq!(saved, vec!["inner.txt"]);
        assert!(!dir.path().join("container.dat").exists());
    }

    #[test]
    fn test_leaf_without_payload_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new();
        let payload = payload_with(vec![MessagePart {
            filename: "ghost.bin".to_string(),
            ..Default::default()
        }]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert!(saved.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_fetch_skips_only_that_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new().with_attachment("m1", "good", b"ok");
        let payload = payload_with(vec![
            leaf_by_id("broken.pdf", "missing"),
            leaf_by_id("fine.pdf", "good"),
        ]);

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert_eq!(saved, vec!["fine.pdf"]);
        assert!(!dir.path().join("broken.pdf").exists());
    }

    #[test]
    fn test_flat_payload_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = StubStore::new();
        let payload = MessagePart {
            mime_type: "text/plain".to_string(),
            ..Default::default()
        };

        let saved = save_attachments(&store, "m1", &payload, dir.path());
        assert!(saved.is_empty());
    }

    #[test]
    fn test_remove_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let message_dir = dir.path().join("0001_empty");
        let attachment_dir = message_dir.join("attachments");
        std::fs::create_dir_all(&attachment_dir).unwrap();

        remove_empty_dirs(&attachment_dir, &message_dir);
        assert!(!message_dir.exists());
    }

    #[test]
    fn test_remove_empty_dirs_keeps_populated() {
        let dir = tempfile::tempdir().unwrap();
        let message_dir = dir.path().join("0001_full");
        let attachment_dir = message_dir.join("attachments");
        std::fs::create_dir_all(&attachment_dir).unwrap();
        std::fs::write(attachment_dir.join("keep.txt"), b"x").unwrap();

        remove_empty_dirs(&attachment_dir, &message_dir);
        assert!(attachment_dir.join("keep.txt").exists());
    }
}
