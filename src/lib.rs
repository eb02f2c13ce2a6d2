//! `gmaildump`: export Gmail messages to local HTML files.
//!
//! This crate provides the core library for authorizing against the Gmail
//! REST API, searching messages by correspondent address, and writing each
//! match to disk as an HTML document with its attachments and a CSV
//! manifest per address.

pub mod addresses;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
