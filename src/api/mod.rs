//! Gmail REST API access: wire model and HTTP client.

pub mod client;
pub mod model;
