//! Core infrastructure plugins for cachet.
//!
//! This crate provides the plugins most cachet applications need:
//!
//! - [`TimePlugin`] - Wall-clock source used for cache freshness, mockable for testing
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//! - [`DefaultPlugins`] - Convenient bundle of both
//!
//! # Feature Flags
//!
//! - `test-utils` - Enables [`MockClock`] for deterministic time testing
//!
//! # Example
//!
//! ```
//! use cachet_system::server::Server;
//! use cachet_system::plugin::PluginGroup;
//! use cachet_core_plugins::{Clock, DefaultPlugins};
//!
//! let mut server = Server::new();
//! server.add_plugins(DefaultPlugins.build());
//! server.finish();
//!
//! assert!(server.contains_global::<Clock>());
//! ```
//!
//! # Individual Plugin Usage
//!
//! ```
//! use cachet_system::server::Server;
//! use cachet_core_plugins::{TimePlugin, TracingPlugin};
//! use tracing::Level;
//!
//! let mut server = Server::new();
//! server
//!     .add_plugins(TimePlugin::default())
//!     .add_plugins(TracingPlugin::default().with_level(Level::DEBUG));
//! server.finish();
//! ```

mod time;
mod tracing_plugin;

// Re-export plugins
pub use time::{Clock, ClockProvider, TimePlugin};
pub use tracing_plugin::{TracingFormat, TracingPlugin};

// Re-export test utilities
#[cfg(any(test, feature = "test-utils"))]
pub use time::MockClock;

// Re-export resources
pub use tracing_plugin::TracingConfig;

use cachet_system::plugin::{PluginGroup, PluginGroupBuilder};

/// Default plugins for most cachet applications.
///
/// Includes:
/// - [`TimePlugin`] - System clock
/// - [`TracingPlugin`] - Logging and observability
///
/// # Customization
///
/// ```
/// use cachet_system::plugin::PluginGroup;
/// use cachet_core_plugins::{DefaultPlugins, TracingPlugin};
///
/// let plugins = DefaultPlugins.build().disable::<TracingPlugin>();
/// assert_eq!(plugins.len(), 1);
/// ```
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(TimePlugin::default())
            .add(TracingPlugin::default())
    }
}

/// Minimal plugins for headless or testing scenarios.
///
/// Includes only [`TimePlugin`]. Does not install a subscriber, so tests can
/// bring their own.
pub struct MinimalPlugins;

impl PluginGroup for MinimalPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new().add(TimePlugin::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachet_system::server::Server;

    #[test]
    fn default_plugins_builds() {
        let builder = DefaultPlugins.build();
        assert_eq!(builder.len(), 2);
        assert!(builder.contains::<TracingPlugin>());
    }

    #[test]
    fn minimal_plugins_builds() {
        let builder = MinimalPlugins.build();
        assert_eq!(builder.len(), 1);
        assert!(!builder.contains::<TracingPlugin>());
    }

    #[test]
    fn server_with_minimal_plugins() {
        let mut server = Server::new();
        server.add_plugins(MinimalPlugins.build());
        server.finish();

        assert!(server.contains_global::<Clock>());
        assert!(!server.contains_global::<TracingConfig>());
    }
}
