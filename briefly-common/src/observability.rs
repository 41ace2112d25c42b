//! Shared observability helpers for the CLI and integration tests.
//!
//! [`init_logging`] installs one global `tracing` subscriber that writes to a
//! daily rolling file and, optionally, mirrors events to `stderr`. Only the
//! first call installs anything; later calls return the path resolved by the
//! first one.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Environment variable consulted when no explicit log directory is given.
pub const LOG_DIR_ENV: &str = "BRIEFLY_LOG_DIR";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical name of the component (used for defaults and file names).
    pub app_name: &'static str,
    /// Explicit directory for log output. If `None`, `BRIEFLY_LOG_DIR` is
    /// consulted, then `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    /// Whether to duplicate events to `stderr` in addition to the file sink.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "briefly",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Returns the log file path for the current day.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let resolved_dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&resolved_dir)
        .with_context(|| format!("failed to create log directory: {}", resolved_dir.display()))?;

    let log_filename = format!("{}.log", config.app_name);
    let today = Local::now().format("%Y-%m-%d").to_string();
    let full_path = resolved_dir.join(format!("{log_filename}.{today}"));

    let appender = rolling::daily(&resolved_dir, &log_filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let stderr_layer = config
        .emit_stderr
        .then(|| fmt::layer().with_writer(std::io::stderr));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    let installed = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(full_path.clone());
    Ok(full_path)
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return expand_home(dir);
    }

    if let Ok(env_dir) = std::env::var(LOG_DIR_ENV) {
        if !env_dir.trim().is_empty() {
            return expand_home(Path::new(&env_dir));
        }
    }

    default_data_dir(app_name)
}

fn expand_home(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

fn default_data_dir(app_name: &str) -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(app_name),
        Err(_) => PathBuf::from(".").join(app_name),
    }
}
