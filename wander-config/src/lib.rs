//! Loader for Wander configuration with YAML + environment overlays.
//!
//! Every field has a default, so an empty source set yields a usable config.
//! Environment variables prefixed `WANDER__` override file values, using `__`
//! as the path separator (`WANDER__SESSION__MAX_LINKS=3`). `${VAR}`
//! placeholders in string values are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wander_common::{DEFAULT_ACCEPT, DEFAULT_USER_AGENT, LogFormat};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    pub version: Option<String>,
    pub wiki: WikiSection,
    pub http: HttpSection,
    pub session: SessionSection,
    pub log: LogSection,
}

/// Encyclopedia endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikiSection {
    pub rest_base: String,
    pub action_url: String,
    pub site_base: String,
}

impl Default for WikiSection {
    fn default() -> Self {
        Self {
            rest_base: "https://en.wikipedia.org/api/rest_v1".into(),
            action_url: "https://en.wikipedia.org/w/api.php".into(),
            site_base: "https://en.wikipedia.org".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub user_agent: String,
    pub accept: String,
    pub timeout_secs: u64,
    pub retry: RetrySection,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.into(),
            accept: DEFAULT_ACCEPT.into(),
            timeout_secs: 12,
            retry: RetrySection::default(),
        }
    }
}

impl HttpSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: usize,
    pub status_backoff_ms: u64,
    pub network_backoff_ms: u64,
    pub max_retry_after_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            status_backoff_ms: 1500,
            network_backoff_ms: 500,
            max_retry_after_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub max_links: usize,
    pub history_cap: usize,
    pub breadcrumb_len: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_links: 5,
            history_cap: 50,
            breadcrumb_len: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Directory for the rolling log file; `~` and `${VAR}` are expanded.
    pub dir: Option<String>,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            filter: "info".into(),
        }
    }
}

impl LogSection {
    pub fn dir_path(&self) -> Option<PathBuf> {
        self.dir
            .as_deref()
            .map(|d| PathBuf::from(shellexpand::tilde(d).into_owned()))
    }
}

impl WanderConfig {
    /// Reject values that would make the session unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.retry.max_attempts == 0 {
            return Err(ConfigError::Message(
                "http.retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.session.max_links == 0 || self.session.max_links > 9 {
            return Err(ConfigError::Message(format!(
                "session.max_links must be between 1 and 9, got {}",
                self.session.max_links
            )));
        }
        for (key, url) in [
            ("wiki.rest_base", &self.wiki.rest_base),
            ("wiki.action_url", &self.wiki.action_url),
            ("wiki.site_base", &self.wiki.site_base),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Message(format!(
                    "{key} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct WanderConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    with_env: bool,
}

impl Default for WanderConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WanderConfigLoader {
    /// Start from defaults with `WANDER__` env overrides applied last.
    ///
    /// ```
    /// use wander_config::WanderConfigLoader;
    ///
    /// let config = WanderConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nsession:\n  max_links: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.session.max_links, 3);
    /// assert_eq!(config.session.history_cap, 50);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            with_env: true,
        }
    }

    /// Skip the environment overlay; tests use this to stay hermetic.
    pub fn without_env(mut self) -> Self {
        self.with_env = false;
        self
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but a missing file is ignored.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge the sources, expand `${VAR}` placeholders and validate.
    ///
    /// ```
    /// use wander_config::WanderConfigLoader;
    ///
    /// unsafe { std::env::set_var("WANDER_DOC_SITE", "https://fr.wikipedia.org"); }
    ///
    /// let config = WanderConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// wiki:
    ///   site_base: "${WANDER_DOC_SITE}"
    ///   rest_base: "${WANDER_DOC_SITE}/api/rest_v1"
    ///   action_url: "${WANDER_DOC_SITE}/w/api.php"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.wiki.rest_base, "https://fr.wikipedia.org/api/rest_v1");
    ///
    /// unsafe { std::env::remove_var("WANDER_DOC_SITE"); }
    /// ```
    pub fn load(self) -> Result<WanderConfig, ConfigError> {
        let mut builder = self.builder;
        if self.with_env {
            builder = builder.add_source(
                Environment::with_prefix("WANDER")
                    .separator("__")
                    .try_parsing(true),
            );
        }
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: WanderConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}
