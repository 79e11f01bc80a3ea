//! Process-wide logging setup
//!
//! The binary calls [`init`] once at startup. Verbosity picks the level and
//! whether a log file is written next to the console output:
//!
//! | flags      | level   | sinks                       |
//! |------------|---------|-----------------------------|
//! | `-q`       | `error` | console                     |
//! | (none)     | `warn`  | console                     |
//! | `-v`       | `info`  | console + `<dir>/seoscan.log` |
//! | `-vv`      | `debug` | console + file              |
//! | `-vvv`     | `trace` | console + file              |
//!
//! `RUST_LOG`, when set and valid, replaces the level filter.
//! Library code only emits `tracing` events and never installs a subscriber.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

mod error;

pub use error::LoggingError;

pub const LOG_FILE_NAME: &str = "seoscan.log";

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

/// `[logging]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for `seoscan.log` when verbose.
    pub dir: PathBuf,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Also write to this file, without ANSI colors.
    pub file: Option<PathBuf>,
    pub use_color: bool,
    pub with_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            file: None,
            use_color: false,
            with_targets: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_verbosity(verbose: u8, quiet: bool, log_dir: &Path) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };
        let file = (!quiet && verbose > 0).then(|| log_dir.join(LOG_FILE_NAME));

        Self {
            level: level.to_string(),
            format: LogFormat::Text,
            file,
            use_color: atty::is(atty::Stream::Stderr),
            with_targets: verbose >= 3,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(cfg: &LoggingConfig) -> Result<(), LoggingError> {
    build_subscriber(cfg)?.try_init().map_err(|e| {
        if tracing::dispatcher::has_been_set() {
            LoggingError::AlreadyInitialized
        } else {
            LoggingError::InitializationFailed(e.to_string())
        }
    })
}

/// The subscriber [`init`] would install, for scoped use with
/// `tracing::subscriber::with_default`.
pub fn build_subscriber(cfg: &LoggingConfig) -> Result<Layered<Vec<BoxedLayer>, Registry>, LoggingError> {
    let mut layers: Vec<BoxedLayer> = vec![mk_filter(&cfg.level)?.boxed(), console_layer(cfg)];
    if let Some(path) = &cfg.file {
        layers.push(file_layer(cfg, path)?);
    }
    Ok(tracing_subscriber::registry().with(layers))
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|_| LoggingError::InvalidLevel(level.to_string()))
}

fn console_layer(cfg: &LoggingConfig) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(cfg.with_targets);
    match cfg.format {
        LogFormat::Text => layer.with_ansi(cfg.use_color).boxed(),
        LogFormat::Json => layer.json().with_ansi(false).boxed(),
    }
}

fn file_layer(cfg: &LoggingConfig, path: &Path) -> Result<BoxedLayer, LoggingError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| LOG_FILE_NAME.to_string());

    fs::create_dir_all(&dir).map_err(|source| LoggingError::FileSink {
        dir: dir.clone(),
        source,
    })?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;

    let layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(cfg.with_targets);
    Ok(match cfg.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    })
}
