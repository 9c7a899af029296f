use anyhow::{Context, Result};
use std::time::Duration;
use wander_common::observability::LogConfig;
use wander_config::WanderConfig;
use wander_http::retry::RetryPolicy;
use wander_session::{SessionSettings, Wanderer};
use wander_wiki::{ClientSettings, WikiApi, WikiEndpoints};

pub fn log_config(cfg: &WanderConfig) -> LogConfig {
    LogConfig {
        app_name: "wander",
        log_dir: cfg.log.dir_path(),
        emit_stderr: false,
        format: cfg.log.format,
        default_filter: cfg.log.filter.clone(),
    }
}

pub fn client_settings(cfg: &WanderConfig) -> ClientSettings {
    let retry = &cfg.http.retry;
    ClientSettings {
        user_agent: cfg.http.user_agent.clone(),
        accept: cfg.http.accept.clone(),
        timeout: cfg.http.timeout(),
        retry: RetryPolicy {
            max_attempts: retry.max_attempts,
            status_backoff: Duration::from_millis(retry.status_backoff_ms),
            network_backoff: Duration::from_millis(retry.network_backoff_ms),
            max_retry_after: Duration::from_secs(retry.max_retry_after_secs),
        },
    }
}

pub fn endpoints(cfg: &WanderConfig) -> WikiEndpoints {
    WikiEndpoints {
        rest_base: cfg.wiki.rest_base.clone(),
        action_url: cfg.wiki.action_url.clone(),
        site_base: cfg.wiki.site_base.clone(),
    }
}

pub fn session_settings(cfg: &WanderConfig) -> SessionSettings {
    SessionSettings {
        max_links: cfg.session.max_links,
        history_cap: cfg.session.history_cap,
        breadcrumb_len: cfg.session.breadcrumb_len,
    }
}

pub fn build_wanderer(cfg: &WanderConfig) -> Result<Wanderer> {
    let api = WikiApi::new(endpoints(cfg), &client_settings(cfg))
        .with_context(|| format!("building client for {}", cfg.wiki.rest_base))?;
    Ok(Wanderer::new(api, session_settings(cfg)))
}
