//! Logging configuration for flashgen
//!
//! Two sinks:
//! - `tracing` for diagnostics, to stderr and a daily-rolling file
//! - [`EventLog`], an append-only text file with one line per server
//!   event: `[2025-01-01T12:00:00.000Z] INFO: message {"key":"value"}`

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use chrono::SecondsFormat;
use chrono::Utc;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self as tracing_fmt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::AppConfig;
use crate::Result;

/// Initialize logging from configuration
pub fn init_logging_with_config(config: &AppConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    init_logging_with_level(level, &config.logging.directory)
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str, directory: &Path) -> Result<()> {
    std::fs::create_dir_all(directory)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},flashgen={level}")));

    let file_appender = tracing_appender::rolling::daily(directory, "flashgen.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = tracing_fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::FlashgenError::ConfigError(format!("logging already set: {e}")))?;

    tracing::debug!(
        "Logging initialized with level {level}, files in {}",
        directory.display()
    );

    // Keep the writer alive for the life of the process
    std::mem::forget(guard);

    Ok(())
}

/// Severity of an [`EventLog`] line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Error,
    Debug,
    Warn,
}

impl EventLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format one event line, newline included
pub fn format_event_line(
    timestamp: chrono::DateTime<Utc>,
    level: EventLevel,
    message: &str,
    data: Option<&Value>,
) -> String {
    let ts = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
    match data {
        Some(data) => format!("[{ts}] {level}: {message} {data}\n"),
        None => format!("[{ts}] {level}: {message}\n"),
    }
}

/// Append-only event log. Each event is also mirrored to `tracing`.
/// A failed write is reported and otherwise ignored.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// An event log that only mirrors to `tracing`
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn info(&self, message: &str, data: Option<Value>) {
        tracing::info!("{message} {}", display_data(data.as_ref()));
        self.write(EventLevel::Info, message, data.as_ref()).await;
    }

    pub async fn error(&self, message: &str, data: Option<Value>) {
        tracing::error!("{message} {}", display_data(data.as_ref()));
        self.write(EventLevel::Error, message, data.as_ref()).await;
    }

    pub async fn debug(&self, message: &str, data: Option<Value>) {
        tracing::debug!("{message} {}", display_data(data.as_ref()));
        self.write(EventLevel::Debug, message, data.as_ref()).await;
    }

    pub async fn warn(&self, message: &str, data: Option<Value>) {
        tracing::warn!("{message} {}", display_data(data.as_ref()));
        self.write(EventLevel::Warn, message, data.as_ref()).await;
    }

    async fn write(&self, level: EventLevel, message: &str, data: Option<&Value>) {
        let Some(path) = &self.path else {
            return;
        };
        let line = format_event_line(Utc::now(), level, message, data);
        if let Err(e) = append(path, &line).await {
            tracing::error!("Failed to write to log file {}: {e}", path.display());
        }
    }
}

fn display_data(data: Option<&Value>) -> String {
    data.map(Value::to_string).unwrap_or_default()
}

async fn append(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_event_line() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();

        assert_eq!(
            format_event_line(ts, EventLevel::Info, "API route called: generate-flashcards", None),
            "[2025-03-14T09:26:53.000Z] INFO: API route called: generate-flashcards\n"
        );
        assert_eq!(
            format_event_line(
                ts,
                EventLevel::Warn,
                "Request received for topic",
                Some(&json!({"topic": "Cells"}))
            ),
            "[2025-03-14T09:26:53.000Z] WARN: Request received for topic {\"topic\":\"Cells\"}\n"
        );
    }

    #[tokio::test]
    async fn test_event_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let log = EventLog::new(&path);

        log.info("first", None).await;
        log.error("second", Some(json!({"error": "boom"}))).await;
        log.debug("third", None).await;
        log.warn("fourth", None).await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("] INFO: first"));
        assert!(lines[1].ends_with("] ERROR: second {\"error\":\"boom\"}"));
        assert!(lines[2].contains("] DEBUG: third"));
        assert!(lines[3].contains("] WARN: fourth"));
        assert!(lines.iter().all(|line| line.starts_with('[')));
    }

    #[tokio::test]
    async fn test_event_log_swallows_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened for appending
        let log = EventLog::new(dir.path());
        log.info("lost", None).await;
        log.error("also lost", Some(json!({}))).await;
    }

    #[tokio::test]
    async fn test_disabled_event_log() {
        let log = EventLog::disabled();
        assert!(log.path().is_none());
        log.info("only traced", None).await;
    }
}
