//! Logging setup for bench tools
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! An optional daily-rolling file layer writes under the configured directory.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter producing `timestamp [LEVEL] message`
///
/// Example output: `2026-03-14T09:12:44.809120Z [WARN] Output voltage matches neither band`
pub struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m",
                Level::DEBUG => "\x1b[34m",
                Level::INFO => "\x1b[32m",
                Level::WARN => "\x1b[33m",
                Level::ERROR => "\x1b[31m",
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// Keeps file writers flushing until process exit
static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

/// Logger settings for one tool
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used as the log file name prefix
    pub service_name: String,
    pub log_dir: PathBuf,
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub file: bool,
}

impl LogConfig {
    /// Take level, directory and file switch from the bench configuration
    pub fn from_settings(service_name: impl Into<String>, settings: &LoggingConfig) -> Self {
        Self {
            service_name: service_name.into(),
            log_dir: PathBuf::from(&settings.dir),
            level: settings.level.clone(),
            file: settings.file,
        }
    }
}

/// Filter from `RUST_LOG` if set, otherwise from the configured level
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => EnvFilter::try_new(&env)
            .map_err(|e| Error::logging(format!("Invalid RUST_LOG '{}': {}", env, e))),
        _ => EnvFilter::try_new(level)
            .map_err(|e| Error::logging(format!("Invalid log level '{}': {}", level, e))),
    }
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed or the log directory cannot
/// be created.
pub fn init_with_config(config: &LogConfig) -> Result<()> {
    let filter = build_filter(&config.level)?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(BracketedLevelFormat)
        .boxed();

    let file_layer = if config.file {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(
            &config.log_dir,
            format!("{}.log", config.service_name),
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        if let Ok(mut guards) = GUARDS.get_or_init(|| Mutex::new(Vec::new())).lock() {
            guards.push(guard);
        }
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .event_format(BracketedLevelFormat)
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::logging(e.to_string()))?;

    if config.file {
        tracing::debug!("File logging enabled: {}", config.log_dir.display());
    }
    Ok(())
}
