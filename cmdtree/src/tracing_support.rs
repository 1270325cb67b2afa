//! Tracing subscriber setup for applications embedding the command engine.
//!
//! The engine itself only emits events through `tracing`. Binaries that want
//! to see them install a subscriber with [`init_subscriber`] or
//! [`init_subscriber_with_config`].
//!
//! # Environment Variables
//!
//! - `RUST_LOG=debug` - resolution results and executed commands
//! - `RUST_LOG=cmdtree=trace` - every node created and every failed parse

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{
    filter::ParseError,
    fmt::writer::BoxMakeWriter,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer, Registry,
};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingFormat {
    /// Multi-line, human readable
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Filter directive such as `info` or `cmdtree=trace`
    ///
    /// If None, uses RUST_LOG or defaults to "info".
    pub level: Option<String>,
    pub format: TracingFormat,
    pub timestamps: bool,
    pub target: bool,
    pub thread_ids: bool,
    /// Write to stderr instead of stdout
    pub stderr: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::Pretty,
            timestamps: true,
            target: true,
            thread_ids: false,
            stderr: false,
        }
    }
}

/// Subscriber installation failure
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn filter(config: &TracingConfig) -> Result<EnvFilter, ParseError> {
    match &config.level {
        Some(level) => EnvFilter::try_new(level),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

fn fmt_layer(config: &TracingConfig) -> BoxedLayer {
    let writer = if config.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(config.target)
        .with_thread_ids(config.thread_ids);

    match (config.format, config.timestamps) {
        (TracingFormat::Pretty, true) => layer.pretty().boxed(),
        (TracingFormat::Pretty, false) => layer.pretty().without_time().boxed(),
        (TracingFormat::Compact, true) => layer.compact().boxed(),
        (TracingFormat::Compact, false) => layer.compact().without_time().boxed(),
        (TracingFormat::Json, true) => layer.json().boxed(),
        (TracingFormat::Json, false) => layer.json().without_time().boxed(),
    }
}

/// Install a global subscriber described by `config`
pub fn try_init_subscriber(config: &TracingConfig) -> Result<(), TracingError> {
    let filter = filter(config)?;
    tracing_subscriber::registry()
        .with(fmt_layer(config))
        .with(filter)
        .try_init()?;
    Ok(())
}

/// Install the default subscriber, ignoring a subscriber that is already set
pub fn init_subscriber() {
    init_subscriber_with_config(&TracingConfig::default());
}

/// Install a subscriber for `config`, ignoring a subscriber that is already set
///
/// # Example
///
/// ```no_run
/// use cmdtree::tracing_support::{init_subscriber_with_config, TracingConfig, TracingFormat};
///
/// init_subscriber_with_config(&TracingConfig {
///     format: TracingFormat::Json,
///     level: Some("cmdtree=debug".into()),
///     ..Default::default()
/// });
/// ```
pub fn init_subscriber_with_config(config: &TracingConfig) {
    if let Err(err) = try_init_subscriber(config) {
        eprintln!("tracing: {}", err);
    }
}
