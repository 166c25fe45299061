//! Tracing subscriber configuration.
//!
//! [`TracingConfig`] collects the level, output format, filter and span
//! settings, and [`TracingConfig::init`] installs a matching
//! `tracing-subscriber` registry. Installing twice is harmless: the second
//! call leaves the first subscriber in place.

use core::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Output layer stacked on the filtered registry.
type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Environment variable holding the filter directive, e.g. `modelkit_model=debug`.
pub const LOG_ENV: &str = "MODELKIT_LOG";

/// Environment variable selecting the output format: `pretty`, `compact` or `json`.
pub const LOG_FORMAT_ENV: &str = "MODELKIT_LOG_FORMAT";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

/// Error parsing a [`TracingFormat`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tracing format '{0}': expected 'pretty', 'compact' or 'json'")]
pub struct ParseFormatError(String);

impl FromStr for TracingFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(TracingFormat::Pretty),
            "compact" => Ok(TracingFormat::Compact),
            "json" => Ok(TracingFormat::Json),
            _ => Err(ParseFormatError(s.to_owned())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing subscriber settings.
///
/// # Example
///
/// ```
/// use modelkit_core::{TracingConfig, TracingFormat};
/// use tracing::Level;
///
/// // Development: pretty output with span enter/exit
/// let dev = TracingConfig::new()
///     .with_level(Level::DEBUG)
///     .with_span_events(true);
///
/// // Production: JSON for log aggregation
/// let prod = TracingConfig::new()
///     .with_format(TracingFormat::Json)
///     .with_env_filter("modelkit_model=info");
///
/// assert_eq!(dev.format, TracingFormat::Pretty);
/// assert_eq!(prod.env_filter.as_deref(), Some("modelkit_model=info"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum log level, used when no filter is set or the filter is invalid.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
    /// Filter directive (e.g. `modelkit_model=debug,modelkit_events=trace`).
    pub env_filter: Option<String>,
    /// Whether to include span enter/exit events.
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `MODELKIT_LOG` and `MODELKIT_LOG_FORMAT` from the process
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from `lookup`, which maps variable names to
    /// values.
    ///
    /// A bare level such as `debug` in `MODELKIT_LOG` also sets
    /// [`level`](Self::level). An unknown format is logged and ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(filter) = lookup(LOG_ENV).filter(|filter| !filter.trim().is_empty()) {
            if let Ok(level) = filter.trim().parse::<Level>() {
                config.level = level;
            }
            config.env_filter = Some(filter);
        }

        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            match format.parse() {
                Ok(format) => config.format = format,
                Err(error) => tracing::warn!(%error, "ignoring {LOG_FORMAT_ENV}"),
            }
        }

        config
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a filter directive.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Builds the output layer for the configured format.
    fn fmt_layer(&self) -> BoxedLayer {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let layer = tracing_subscriber::fmt::layer().with_span_events(span_events);
        match self.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Does nothing if a global subscriber is already installed.
    pub fn init(&self) {
        let installed = tracing_subscriber::registry()
            .with(self.filter())
            .with(self.fmt_layer())
            .try_init()
            .is_ok();

        if !installed {
            return;
        }

        tracing::debug!(
            level = %self.level,
            format = ?self.format,
            filter = self.env_filter.as_deref(),
            "tracing initialized"
        );
    }
}
