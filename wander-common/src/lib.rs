//! Shared pieces for the Wander crates.
//!
//! Kept deliberately small so every crate in the workspace can depend on it:
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`LogFormat`]: log encoding, shared by the config loader and the binary
//! - [`DEFAULT_USER_AGENT`] / [`DEFAULT_ACCEPT`]: identifying header pair sent
//!   on every outbound request
//!
//! ```rust
//! use wander_common::{LogFormat, DEFAULT_ACCEPT};
//!
//! assert_eq!(LogFormat::default(), LogFormat::Text);
//! assert!(DEFAULT_ACCEPT.starts_with("application/json"));
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Client identity string sent as `User-Agent`. Wikimedia rejects requests
/// without a descriptive agent.
pub const DEFAULT_USER_AGENT: &str =
    "Wander/0.1 (https://github.com/wander-rs/wander; wander@example.com)";

/// Accept preference: JSON first, HTML for the page-body endpoint.
pub const DEFAULT_ACCEPT: &str = "application/json, text/html;q=0.9";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
