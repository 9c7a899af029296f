use crate::history::NavigationHistory;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use wander_wiki::{ArticleSummary, FetchError, LinkCandidate, WikiApi};

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fresh random article; the trail restarts from it.
    RandomStart,
    Back,
    /// Exact title or free-form keywords.
    Jump(String),
    /// Forget the trail, then start from a random article.
    Reset,
    /// Follow the suggestion at this index.
    Follow(usize),
    /// New set of suggestions for the current article.
    Reshuffle,
}

#[derive(Debug, Error)]
pub enum WanderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("nothing to go back to")]
    NothingToGoBackTo,
    #[error("no suggestion #{0}")]
    NoSuchLink(usize),
    #[error("empty search query")]
    EmptyQuery,
    #[error("no article open")]
    NotStarted,
}

impl WanderError {
    /// Short line suitable for a status bar.
    pub fn user_message(&self) -> String {
        match self {
            WanderError::Fetch(FetchError::NotFound { .. }) => "No article found.".into(),
            WanderError::Fetch(FetchError::RateLimited { .. }) => {
                "Wikipedia is rate limiting us, try again shortly.".into()
            }
            WanderError::Fetch(FetchError::Unavailable { .. }) => {
                "Wikipedia is unavailable right now.".into()
            }
            WanderError::Fetch(FetchError::Network(_)) => "Network error, check your connection.".into(),
            WanderError::Fetch(e) => format!("Request failed: {}", e.kind()),
            other => {
                let mut s = other.to_string();
                if let Some(first) = s.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                s.push('.');
                s
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub max_links: usize,
    pub history_cap: usize,
    pub breadcrumb_len: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_links: 5,
            history_cap: 50,
            breadcrumb_len: 6,
        }
    }
}

/// What the UI needs to draw one frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionView {
    pub current: Option<ArticleSummary>,
    pub links: Vec<LinkCandidate>,
    pub breadcrumbs: Vec<String>,
    pub can_go_back: bool,
    pub status: Option<String>,
}

/// Session state plus the actions that move it.
///
/// Every action either fully succeeds or leaves the displayed article, its
/// suggestions and the trail exactly as they were. Only the status line
/// changes on failure.
pub struct Wanderer<R = StdRng> {
    api: WikiApi,
    settings: SessionSettings,
    history: NavigationHistory,
    current: Option<ArticleSummary>,
    links: Vec<LinkCandidate>,
    status: Option<String>,
    rng: R,
}

impl Wanderer<StdRng> {
    pub fn new(api: WikiApi, settings: SessionSettings) -> Self {
        Self::with_rng(api, settings, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> Wanderer<R> {
    pub fn with_rng(api: WikiApi, settings: SessionSettings, rng: R) -> Self {
        Self {
            api,
            history: NavigationHistory::new(settings.history_cap),
            settings,
            current: None,
            links: Vec::new(),
            status: None,
            rng,
        }
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn current(&self) -> Option<&ArticleSummary> {
        self.current.as_ref()
    }

    pub fn links(&self) -> &[LinkCandidate] {
        &self.links
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            current: self.current.clone(),
            links: self.links.clone(),
            breadcrumbs: self
                .history
                .tail(self.settings.breadcrumb_len)
                .into_iter()
                .map(str::to_string)
                .collect(),
            can_go_back: self.history.can_go_back(),
            status: self.status.clone(),
        }
    }

    /// Run `action`, recording a user-facing status line on failure.
    pub async fn apply(&mut self, action: Action) -> Result<(), WanderError> {
        tracing::debug!(target: "session", ?action, "session.action");
        let result = match action.clone() {
            Action::RandomStart => self.start_random().await,
            Action::Back => self.back().await,
            Action::Jump(query) => self.jump(&query).await,
            Action::Reset => {
                self.reset();
                self.start_random().await
            }
            Action::Follow(idx) => self.follow(idx).await,
            Action::Reshuffle => self.reshuffle().await,
        };
        match &result {
            Ok(()) => self.status = None,
            Err(e) => {
                tracing::warn!(target: "session", ?action, error = %e, "session.action_failed");
                self.status = Some(e.user_message());
            }
        }
        result
    }

    /// Open a random article when nothing is displayed yet.
    pub async fn ensure_started(&mut self) -> Result<(), WanderError> {
        if self.current.is_some() {
            return Ok(());
        }
        self.apply(Action::RandomStart).await
    }

    pub async fn start_random(&mut self) -> Result<(), WanderError> {
        let summary = self.api.get_random_summary().await?;
        let links = self.suggest(&summary.title).await;
        self.history.reset_to(summary.title.clone());
        self.show(summary, links);
        Ok(())
    }

    pub async fn back(&mut self) -> Result<(), WanderError> {
        let prev = self
            .history
            .previous()
            .ok_or(WanderError::NothingToGoBackTo)?
            .to_string();
        let summary = self.api.get_summary_by_title(&prev).await?;
        let links = self.suggest(&summary.title).await;
        self.history.back();
        self.show(summary, links);
        Ok(())
    }

    pub async fn jump(&mut self, query: &str) -> Result<(), WanderError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WanderError::EmptyQuery);
        }
        let summary = self.api.safe_get_summary(query).await?;
        self.navigate_to(summary).await;
        Ok(())
    }

    pub async fn follow(&mut self, idx: usize) -> Result<(), WanderError> {
        let target = self
            .links
            .get(idx)
            .ok_or(WanderError::NoSuchLink(idx + 1))?
            .target_title
            .clone();
        let summary = self.api.get_summary_by_title(&target).await?;
        self.navigate_to(summary).await;
        Ok(())
    }

    pub async fn reshuffle(&mut self) -> Result<(), WanderError> {
        let title = self
            .current
            .as_ref()
            .ok_or(WanderError::NotStarted)?
            .title
            .clone();
        self.links = self.suggest(&title).await;
        Ok(())
    }

    /// Forget everything. The next [`ensure_started`](Self::ensure_started)
    /// opens a random article.
    pub fn reset(&mut self) {
        self.history.clear();
        self.current = None;
        self.links.clear();
        self.status = None;
    }

    async fn navigate_to(&mut self, summary: ArticleSummary) {
        let links = self.suggest(&summary.title).await;
        self.history.push(summary.title.clone());
        self.show(summary, links);
    }

    async fn suggest(&mut self, title: &str) -> Vec<LinkCandidate> {
        self.api
            .suggest_links(title, self.settings.max_links, &mut self.rng)
            .await
    }

    fn show(&mut self, summary: ArticleSummary, links: Vec<LinkCandidate>) {
        tracing::info!(
            target: "session",
            title = %summary.title,
            links = links.len(),
            depth = self.history.len(),
            "session.show"
        );
        self.current = Some(summary);
        self.links = links;
    }
}
