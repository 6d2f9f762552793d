//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`], which installs a `tracing` subscriber and
//! exposes its configuration as a resource.
//!
//! # Lifecycle
//!
//! - **`build()`** registers [`TracingConfig`] so other plugins can read the
//!   intended configuration.
//! - **`ready()`** installs the subscriber. Installation is deferred so that
//!   plugins built later can still adjust `TracingConfig` first.
//! - **`cleanup()`** logs the shutdown.
//!
//! Everything else in cachet only emits events (`search` calls, cache hits,
//! captured search failures); this plugin decides where they go.

use cachet_system::plugin::Plugin;
use cachet_system::resource::GlobalResource;
use cachet_system::server::Server;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

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

/// Tracing configuration resource.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// The configured maximum log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
    /// Target-specific filter directives, e.g. `"cachet_content=debug"`.
    pub env_filter: Option<String>,
    /// Whether span enter/exit events are printed.
    pub span_events: bool,
}

impl GlobalResource for TracingConfig {}

impl TracingConfig {
    /// Builds the `EnvFilter` this configuration describes.
    ///
    /// Invalid directives fall back to the plain level.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives)
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str())),
            None => EnvFilter::new(self.level.as_str()),
        }
    }
}

/// Tracing and logging plugin.
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`TracingConfig`] | Global | Tracing configuration |
///
/// # Example
///
/// ```
/// use cachet_system::server::Server;
/// use cachet_core_plugins::{TracingFormat, TracingPlugin};
/// use tracing::Level;
///
/// let mut server = Server::new();
/// server.add_plugins(
///     TracingPlugin::default()
///         .with_level(Level::DEBUG)
///         .with_format(TracingFormat::Compact)
///         .with_env_filter("cachet_content=debug,cachet_cell=info"),
/// );
/// server.finish();
/// ```
#[derive(Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Sets target-specific filter directives (`target=level,...`).
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
}

impl Plugin for TracingPlugin {
    fn build(&self, server: &mut Server) {
        server.insert_global(TracingConfig {
            level: self.level,
            format: self.format,
            env_filter: self.env_filter.clone(),
            span_events: self.span_events,
        });
    }

    fn ready(&self, server: &mut Server) {
        let Some(config) = server.get_global::<TracingConfig>().map(|c| c.clone()) else {
            return;
        };

        let span_events = if config.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init() fails when a subscriber is already installed (another
        // server in the same process, or a test harness); that is fine.
        let registry = tracing_subscriber::registry().with(config.filter());
        match config.format {
            TracingFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .ok(),
            TracingFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .ok(),
            TracingFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .ok(),
        };

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            "TracingPlugin initialized"
        );
    }

    fn cleanup(&self, _server: &mut Server) {
        tracing::info!("TracingPlugin shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let plugin = TracingPlugin::default();
        assert_eq!(plugin.level, Level::INFO);
        assert_eq!(plugin.format, TracingFormat::Pretty);
        assert!(plugin.env_filter.is_none());
        assert!(!plugin.span_events);
    }

    #[test]
    fn builder_methods() {
        let plugin = TracingPlugin::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Json)
            .with_env_filter("cachet_content=debug")
            .with_span_events(true);

        assert_eq!(plugin.level, Level::DEBUG);
        assert_eq!(plugin.format, TracingFormat::Json);
        assert_eq!(plugin.env_filter.as_deref(), Some("cachet_content=debug"));
        assert!(plugin.span_events);
    }

    #[test]
    fn invalid_filter_falls_back_to_level() {
        let config = TracingConfig {
            level: Level::WARN,
            format: TracingFormat::Compact,
            env_filter: Some("=[not a filter".to_string()),
            span_events: false,
        };
        assert_eq!(config.filter().to_string(), "warn");
    }

    #[test]
    fn tracing_plugin_registers_config() {
        let mut server = Server::new();
        server.add_plugins(TracingPlugin::default().with_format(TracingFormat::Compact));
        server.finish();

        let config = server.get_global::<TracingConfig>().unwrap();
        assert_eq!(config.format, TracingFormat::Compact);
    }
}
