//! Subscriber setup for the structured logs emitted by the engines
//!
//! The engines log through `tracing`:
//!
//! - `info`: start and end of every run (engine, shape, iterations, final loss)
//! - `debug`: the loss of every iteration
//! - `trace`: individual factor updates
//! - `warn`: rejected warm-start factors
//!
//! Nothing is printed until a subscriber is installed. Applications can use
//! their own, or call [`init_tracing`] once at startup.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default `nmfrs_decomp=info,warn`)
//! - `NMFRS_LOG_FORMAT`: `pretty`, `json` or `compact` (default `pretty`)
//!
//! # Example
//!
//! ```no_run
//! use nmfrs::tracing_support::{init_tracing, TracingConfig, TracingFormat};
//!
//! init_tracing(TracingConfig {
//!     format: TracingFormat::Compact,
//!     filter: "nmfrs_decomp=debug".to_string(),
//!     ..TracingConfig::default()
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;
#[cfg(feature = "tracing")]
use anyhow::{anyhow, Context};
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "nmfrs_decomp=info,warn";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line, human-readable
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

impl TracingFormat {
    /// Parse a format name; unknown names fall back to `Pretty`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    /// `EnvFilter` directives, e.g. `nmfrs_decomp=debug`
    pub filter: String,
    pub with_ansi: bool,
    pub with_target: bool,
    /// Show source file and line of every event
    pub with_location: bool,
}

impl TracingConfig {
    /// Configuration from `NMFRS_LOG_FORMAT` and `RUST_LOG`
    pub fn from_env() -> Self {
        let format = std::env::var("NMFRS_LOG_FORMAT")
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or_default();
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_location: false,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Install a global subscriber built from `config`
///
/// # Errors
///
/// Fails if the filter directives do not parse or a global subscriber is
/// already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter '{}'", config.filter))?;

    let layer = match config.format {
        TracingFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        TracingFormat::Json => fmt::layer()
            .json()
            .with_target(config.with_target)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        TracingFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

/// No-op when the `tracing` feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}

/// Summarize a loss trace at `info` level
pub fn log_loss_summary(engine: &str, loss: &[f64]) {
    let (Some(&first), Some(&last)) = (loss.first(), loss.last()) else {
        tracing::info!(engine, iterations = 0usize, "empty loss trace");
        return;
    };
    let best = loss.iter().copied().fold(f64::INFINITY, f64::min);
    let increases = loss.windows(2).filter(|w| w[1] > w[0]).count();
    tracing::info!(
        engine,
        iterations = loss.len(),
        first,
        last,
        best,
        increases,
        "loss summary"
    );
}
