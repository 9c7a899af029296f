//! Domain records and the wire shapes they are decoded from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wander_http::encode_segment;

const UNTITLED: &str = "Untitled";
const NO_EXTRACT: &str = "(No summary available.)";

/// A short description of one article, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    /// Plain-text lead section.
    pub extract: String,
    /// Canonical desktop URL.
    pub url: String,
}

impl ArticleSummary {
    /// Build from a REST summary payload; `site_base` backs the URL when the
    /// payload carries none.
    ///
    /// ```
    /// use wander_wiki::{ArticleSummary, SummaryResponse};
    ///
    /// let resp: SummaryResponse = serde_json::from_str(r#"{"title":"Alan Turing"}"#).unwrap();
    /// let s = ArticleSummary::from_response(resp, "https://en.wikipedia.org");
    /// assert_eq!(s.url, "https://en.wikipedia.org/wiki/Alan_Turing");
    /// assert_eq!(s.extract, "(No summary available.)");
    /// ```
    pub fn from_response(resp: SummaryResponse, site_base: &str) -> Self {
        let title = resp
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let extract = resp
            .extract
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| NO_EXTRACT.to_string());
        let url = resp
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| d.page)
            .unwrap_or_else(|| {
                format!(
                    "{}/wiki/{}",
                    site_base.trim_end_matches('/'),
                    encode_segment(&title.replace(' ', "_"))
                )
            });
        Self {
            title,
            extract,
            url,
        }
    }
}

/// One navigable link out of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCandidate {
    /// Title to request next (decoded, may contain underscores).
    pub target_title: String,
    /// Text shown to the user.
    pub display_label: String,
}

// ==============================
// REST API
// ==============================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub content_urls: Option<ContentUrls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentUrls {
    #[serde(default)]
    pub desktop: Option<PageUrls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageUrls {
    #[serde(default)]
    pub page: Option<String>,
}

// ==============================
// Action API (formatversion=2)
// ==============================

/// `action=opensearch` answers with a bare array:
/// `[query, [titles], [descriptions], [urls]]`.
pub(crate) fn first_opensearch_title(v: &Value) -> Option<String> {
    v.get(1)?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub query: Option<SearchQuery>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    pub search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LinksResponse {
    #[serde(default)]
    pub query: Option<LinksQuery>,
    /// Parameters to send back for the next batch; absent on the last one.
    #[serde(default, rename = "continue")]
    pub continuation: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LinksQuery {
    #[serde(default)]
    pub pages: Vec<LinkedPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkedPage {
    pub title: String,
    #[serde(default)]
    pub ns: i64,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
}

impl LinkedPage {
    pub fn exists(&self) -> bool {
        self.ns == 0 && !self.missing && !self.invalid
    }
}
