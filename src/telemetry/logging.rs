//! Logging setup for the upload server
//!
//! The operator console gets compact lines by default. Deployments that ship
//! logs elsewhere switch to JSON, and a kiosk PC without a console can mirror
//! everything into a file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Level filter variable, checked before `RUST_LOG`
pub const LOG_ENV: &str = "PHOTOBOOTH_LOG";
/// Set to `json` for JSON console output
pub const LOG_FORMAT_ENV: &str = "PHOTOBOOTH_LOG_FORMAT";
/// When set, logs are also written to this file
pub const LOG_FILE_ENV: &str = "PHOTOBOOTH_LOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" | "text" | "" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Errors raised while installing the subscriber
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to open log file {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Mirror output into this file
    pub file: Option<PathBuf>,
    /// Filter used when neither `PHOTOBOOTH_LOG` nor `RUST_LOG` is set
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            file: None,
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Read `PHOTOBOOTH_LOG_FORMAT` and `PHOTOBOOTH_LOG_FILE`
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(LOG_FORMAT_ENV).ok().as_deref(),
            std::env::var(LOG_FILE_ENV).ok().as_deref(),
        )
    }

    fn from_vars(format: Option<&str>, file: Option<&str>) -> Self {
        let format = match format {
            Some(value) => LogFormat::parse(value).unwrap_or_else(|| {
                eprintln!("Unknown {}={:?}, using compact output", LOG_FORMAT_ENV, value);
                LogFormat::Compact
            }),
            None => LogFormat::Compact,
        };
        let file = file
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            format,
            file,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit when file output is enabled,
/// dropping it flushes the file writer.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, LogError> {
    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| LogError::File {
                path: path.clone(),
                source,
            })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let (compact, json) = match config.format {
        LogFormat::Compact => (Some(fmt::layer().with_target(true).compact()), None),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_target(true).with_current_span(true)),
        ),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(compact)
        .with(json)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        format = ?config.format,
        file = ?config.file,
        "Logging initialized"
    );
    Ok(guard)
}
