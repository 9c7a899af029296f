//! Encyclopedia access for Wander.
//!
//! - [`WikiApi`]: summaries, article HTML, search and page-links listing on
//!   top of the retrying [`wander_http::HttpClient`]
//! - [`links`]: link extraction from rendered article HTML
//! - [`types`]: [`ArticleSummary`], [`LinkCandidate`] and the API payloads

pub mod client;
pub mod links;
pub mod types;

pub use client::{LinkSourceError, MAX_LINK_BATCHES, WikiApi, WikiEndpoints};
pub use links::{extract_links, normalize_title, ExtractError};
pub use types::{ArticleSummary, LinkCandidate, SummaryResponse};
pub use wander_http::{ClientSettings, FetchError};
