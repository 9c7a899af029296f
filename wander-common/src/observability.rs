//! `tracing` bootstrap for the `wander` binary and the integration tests.
//!
//! Events go to a daily rolling file, optionally mirrored to stderr. The
//! subscriber is global: the first [`init_logging`] call installs it and any
//! later call just returns the path chosen the first time.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub use crate::LogFormat;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Overrides the log directory when [`LogConfig::log_dir`] is `None`.
pub const LOG_DIR_ENV: &str = "WANDER_LOG_DIR";

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Names the log file and the default directory.
    pub app_name: &'static str,
    /// `None` means `$WANDER_LOG_DIR`, then `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    /// Keep off while the terminal UI owns the screen.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset or unparsable.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "wander",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Install the global subscriber and return today's log file.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let file_name = format!("{}.log", config.app_name);
    let path = dated_log_path(&dir, &file_name, &Local::now().format("%Y-%m-%d").to_string());

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &file_name));
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(output_layers(config.format, writer, config.emit_stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(path.clone());
    Ok(path)
}

/// File layer first, stderr mirror second. ANSI colours never reach the file.
fn output_layers(format: LogFormat, file: NonBlocking, emit_stderr: bool) -> Vec<BoxedLayer> {
    let mut layers = vec![match format {
        LogFormat::Text => fmt::layer().with_writer(file).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(file).boxed(),
    }];
    if emit_stderr {
        layers.push(match format {
            LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        });
    }
    layers
}

/// Name `tracing_appender::rolling::daily` gives the current file.
fn dated_log_path(dir: &Path, file_name: &str, day: &str) -> PathBuf {
    dir.join(format!("{file_name}.{day}"))
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from))
        .map(|dir| expand_home(&dir))
        .unwrap_or_else(|| default_data_dir(app_name))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".local/share"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = resolve_log_dir("wander", Some(tmp.path()));
        assert_eq!(dir, tmp.path());
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        let dir = default_data_dir("wander-test");
        assert!(dir.ends_with("wander-test"));
    }

    #[test]
    fn dated_path_matches_the_rolling_file_name() {
        let p = dated_log_path(Path::new("/var/log/wander"), "wander.log", "2024-05-01");
        assert_eq!(p, PathBuf::from("/var/log/wander/wander.log.2024-05-01"));
    }

    #[test]
    fn stderr_mirror_adds_a_layer() {
        let (writer, _guard) = tracing_appender::non_blocking(std::io::sink());
        assert_eq!(output_layers(LogFormat::Json, writer.clone(), false).len(), 1);
        assert_eq!(output_layers(LogFormat::Text, writer, true).len(), 2);
    }

    #[test]
    fn relative_paths_are_not_touched() {
        let p = expand_home(Path::new("logs/wander"));
        assert_eq!(p, PathBuf::from("logs/wander"));
    }
}
