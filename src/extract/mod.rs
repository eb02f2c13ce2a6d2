//! Extraction pipeline: from message search to files on disk.

pub mod attachments;
pub mod batch;
pub mod body;
pub mod decode;
pub mod exporter;
pub mod html;
pub mod manifest;
pub mod sanitize;
