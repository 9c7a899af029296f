//! Typed wrapper around the encyclopedia REST and Action APIs.
//!
//! REST calls (summaries, page HTML) go through paths relative to the REST
//! base; Action API calls (search, page links) use the absolute endpoint.
//! Fallback chains are composed here with plain `Result`s: direct lookup →
//! search, HTML links → page-links listing.

use crate::links::{self, ExtractError};
use crate::types::{
    first_opensearch_title, ArticleSummary, LinkCandidate, LinksResponse, SearchResponse,
    SummaryResponse,
};
use rand::Rng;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use wander_http::retry::Sleeper;
use wander_http::{encode_segment, ClientSettings, FetchError, HttpClient, RequestOpts};

/// Upper bound on `generator=links` batches fetched for one article.
pub const MAX_LINK_BATCHES: usize = 5;

/// Where the encyclopedia lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiEndpoints {
    /// REST base, e.g. `https://en.wikipedia.org/api/rest_v1`.
    pub rest_base: String,
    /// Action API endpoint, e.g. `https://en.wikipedia.org/w/api.php`.
    pub action_url: String,
    /// Site root used to build article URLs when a payload lacks one.
    pub site_base: String,
}

impl Default for WikiEndpoints {
    fn default() -> Self {
        Self {
            rest_base: "https://en.wikipedia.org/api/rest_v1".into(),
            action_url: "https://en.wikipedia.org/w/api.php".into(),
            site_base: "https://en.wikipedia.org".into(),
        }
    }
}

impl WikiEndpoints {
    /// All three endpoints under one origin, laid out like a MediaWiki site.
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            rest_base: format!("{origin}/api/rest_v1"),
            action_url: format!("{origin}/w/api.php"),
            site_base: origin.to_string(),
        }
    }
}

/// Titles travel in URLs in their underscore form.
fn title_segment(title: &str) -> String {
    encode_segment(&title.trim().replace(' ', "_"))
}

/// Link extraction can fail at the fetch or at the parse step.
#[derive(Debug, thiserror::Error)]
pub enum LinkSourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Clone, Debug)]
pub struct WikiApi {
    http: HttpClient,
    endpoints: WikiEndpoints,
}

impl WikiApi {
    pub fn new(endpoints: WikiEndpoints, settings: &ClientSettings) -> Result<Self, FetchError> {
        let http = HttpClient::from_settings(&endpoints.rest_base, settings)?;
        Ok(Self { http, endpoints })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.http = self.http.with_sleeper(sleeper);
        self
    }

    pub fn endpoints(&self) -> &WikiEndpoints {
        &self.endpoints
    }

    // ==============================
    // REST
    // ==============================

    pub async fn get_random_summary(&self) -> Result<ArticleSummary, FetchError> {
        let resp: SummaryResponse = self
            .http
            .get_json("page/random/summary", RequestOpts::default())
            .await?;
        let summary = ArticleSummary::from_response(resp, &self.endpoints.site_base);
        tracing::info!(target: "wiki", title = %summary.title, "wiki.summary.random");
        Ok(summary)
    }

    pub async fn get_summary_by_title(&self, title: &str) -> Result<ArticleSummary, FetchError> {
        let path = format!("page/summary/{}", title_segment(title));
        let resp: SummaryResponse = self.http.get_json(&path, RequestOpts::default()).await?;
        Ok(ArticleSummary::from_response(resp, &self.endpoints.site_base))
    }

    pub async fn get_article_html(&self, title: &str) -> Result<String, FetchError> {
        let path = format!("page/html/{}", title_segment(title));
        self.http.get_text(&path, RequestOpts::default()).await
    }

    // ==============================
    // Action API
    // ==============================

    async fn action<T: DeserializeOwned>(
        &self,
        params: Vec<(&str, Cow<'_, str>)>,
    ) -> Result<T, FetchError> {
        let mut query: Vec<(&str, Cow<'_, str>)> =
            vec![("format", "json".into()), ("formatversion", "2".into())];
        query.extend(params);
        self.http
            .get_json(
                &self.endpoints.action_url,
                RequestOpts {
                    query: Some(query),
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await
    }

    async fn opensearch_title(&self, query: &str) -> Result<Option<String>, FetchError> {
        let v: serde_json::Value = self
            .action(vec![
                ("action", "opensearch".into()),
                ("search", query.into()),
                ("limit", "1".into()),
                ("namespace", "0".into()),
            ])
            .await?;
        Ok(first_opensearch_title(&v))
    }

    async fn fulltext_title(&self, query: &str) -> Result<Option<String>, FetchError> {
        let resp: SearchResponse = self
            .action(vec![
                ("action", "query".into()),
                ("list", "search".into()),
                ("srsearch", query.into()),
                ("srlimit", "1".into()),
                ("srnamespace", "0".into()),
            ])
            .await?;
        Ok(resp
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title))
    }

    /// Best single article title for free-form keywords.
    ///
    /// The fuzzy prefix match is tried first; when it errors or finds
    /// nothing the full-text search decides. Only a failing full-text
    /// search is reported as an error.
    pub async fn search_best_title(&self, query: &str) -> Result<Option<String>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        match self.opensearch_title(query).await {
            Ok(Some(title)) => {
                tracing::debug!(target: "wiki", %query, %title, "wiki.search.opensearch_hit");
                return Ok(Some(title));
            }
            Ok(None) => tracing::debug!(target: "wiki", %query, "wiki.search.opensearch_empty"),
            Err(e) => tracing::warn!(
                target: "wiki",
                %query,
                kind = e.kind(),
                error = %e,
                "wiki.search.opensearch_failed"
            ),
        }
        let found = self.fulltext_title(query).await?;
        tracing::debug!(target: "wiki", %query, title = ?found, "wiki.search.fulltext");
        Ok(found)
    }

    /// Summary for a title, or for the best search match when the title
    /// does not resolve directly.
    ///
    /// If the search path yields nothing (or fails), the error from the
    /// direct lookup is returned.
    pub async fn safe_get_summary(&self, query: &str) -> Result<ArticleSummary, FetchError> {
        let direct = match self.get_summary_by_title(query).await {
            Ok(summary) => return Ok(summary),
            Err(e) => e,
        };
        tracing::info!(
            target: "wiki",
            %query,
            kind = direct.kind(),
            "wiki.summary.direct_failed"
        );

        let resolved = match self.search_best_title(query).await {
            Ok(Some(title)) => title,
            Ok(None) => return Err(direct),
            Err(e) => {
                tracing::warn!(target: "wiki", %query, kind = e.kind(), error = %e, "wiki.summary.search_failed");
                return Err(direct);
            }
        };

        match self.get_summary_by_title(&resolved).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::warn!(
                    target: "wiki",
                    %query,
                    %resolved,
                    kind = e.kind(),
                    error = %e,
                    "wiki.summary.resolved_failed"
                );
                Err(direct)
            }
        }
    }

    /// Titles of existing main-namespace pages linked from `title`.
    ///
    /// Follows `continue` for up to [`MAX_LINK_BATCHES`] batches. A failure
    /// after the first batch keeps the titles gathered so far.
    pub async fn get_page_links(&self, title: &str) -> Result<Vec<String>, FetchError> {
        let title = title.trim();
        let mut titles = Vec::new();
        let mut next: BTreeMap<String, String> = BTreeMap::new();

        for batch in 1..=MAX_LINK_BATCHES {
            let mut params: Vec<(&str, Cow<'_, str>)> = vec![
                ("action", "query".into()),
                ("generator", "links".into()),
                ("titles", title.into()),
                ("gplnamespace", "0".into()),
                ("gpllimit", "max".into()),
                ("redirects", "1".into()),
            ];
            params.extend(next.iter().map(|(k, v)| (k.as_str(), Cow::from(v.as_str()))));

            let resp: LinksResponse = match self.action(params).await {
                Ok(resp) => resp,
                Err(e) if batch > 1 => {
                    tracing::warn!(target: "wiki", %title, batch, kind = e.kind(), error = %e, "wiki.links.batch_failed");
                    return Ok(titles);
                }
                Err(e) => return Err(e),
            };
            if let Some(q) = resp.query {
                titles.extend(q.pages.into_iter().filter(|p| p.exists()).map(|p| p.title));
            }
            match resp.continuation {
                Some(more) if !more.is_empty() => next = more,
                _ => {
                    tracing::debug!(target: "wiki", %title, batch, count = titles.len(), "wiki.links.page_batches");
                    return Ok(titles);
                }
            }
        }

        tracing::debug!(target: "wiki", %title, count = titles.len(), "wiki.links.batches_capped");
        Ok(titles)
    }

    // ==============================
    // Link suggestions
    // ==============================

    /// Links scraped from the rendered article body.
    pub async fn html_links<R: Rng + ?Sized>(
        &self,
        title: &str,
        max_links: usize,
        rng: &mut R,
    ) -> Result<Vec<LinkCandidate>, LinkSourceError> {
        let html = self.get_article_html(title).await?;
        Ok(links::extract_links(&html, title, max_links, rng)?)
    }

    /// Up to `max_links` leads out of `title`. Never fails: when both the
    /// HTML path and the page-links listing fail, the list is empty.
    pub async fn suggest_links<R: Rng + ?Sized>(
        &self,
        title: &str,
        max_links: usize,
        rng: &mut R,
    ) -> Vec<LinkCandidate> {
        match self.html_links(title, max_links, rng).await {
            Ok(found) if !found.is_empty() => return found,
            Ok(_) => tracing::debug!(target: "wiki", %title, "wiki.links.html_empty"),
            Err(e) => tracing::warn!(target: "wiki", %title, error = %e, "wiki.links.html_failed"),
        }

        match self.get_page_links(title).await {
            Ok(titles) => {
                let found = links::sample_titles(titles, title, max_links, rng);
                tracing::info!(target: "wiki", %title, count = found.len(), "wiki.links.fallback");
                found
            }
            Err(e) => {
                tracing::warn!(
                    target: "wiki",
                    %title,
                    kind = e.kind(),
                    error = %e,
                    "wiki.links.fallback_failed"
                );
                Vec::new()
            }
        }
    }
}
