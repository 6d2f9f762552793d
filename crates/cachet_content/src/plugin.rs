//! Provides the [`CellRegistry`] and [`ContentConfig`] global resources.

use cachet_cell::CellRegistry;
use cachet_core_plugins::TimePlugin;
use cachet_system::plugin::{Plugin, PluginId};
use cachet_system::resource::GlobalResource;
use cachet_system::server::Server;

use crate::cache::CacheTtl;

/// Content configuration resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentConfig {
    /// TTL for consumers built with `use_content_default`.
    pub default_ttl: CacheTtl,
}

impl GlobalResource for ContentConfig {}

/// Plugin that owns the shared content state of a server.
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`CellRegistry`] | Global | Cells shared by every consumer |
/// | [`ContentConfig`] | Global | Default TTL |
///
/// # Dependencies
///
/// - [`TimePlugin`] for the [`Clock`](cachet_core_plugins::Clock) cache
///   freshness is measured against
///
/// # Lifecycle
///
/// - **`build()`** inserts a fresh registry unless one was already
///   registered, then the configuration.
/// - **`cleanup()`** clears the registry. Consumers built earlier keep their
///   handles but stop sharing state with consumers built afterwards.
///
/// # Example
///
/// ```
/// use cachet_system::server::Server;
/// use cachet_core_plugins::TimePlugin;
/// use cachet_content::{ContentFactory, ContentPlugin, SearchContext, SearchError};
///
/// let mut server = Server::new();
/// server
///     .add_plugins(TimePlugin::default())
///     .add_plugins(ContentPlugin::default().with_default_ttl(30_000));
/// server.finish();
///
/// let factory = ContentFactory::from_server(&server, |_: SearchContext, id: u32| async move {
///     Ok::<_, SearchError>(vec![id])
/// })
/// .unwrap();
/// let cart = factory.use_content_default("cart").unwrap();
/// assert_eq!(cart.ttl().as_millis(), 30_000);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentPlugin {
    default_ttl: CacheTtl,
}

impl ContentPlugin {
    /// Creates a plugin whose consumers cache forever by default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default TTL.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: impl Into<CacheTtl>) -> Self {
        self.default_ttl = ttl.into();
        self
    }
}

impl Plugin for ContentPlugin {
    fn build(&self, server: &mut Server) {
        if !server.contains_global::<CellRegistry>() {
            server.insert_global(CellRegistry::new());
        }
        server.insert_global(ContentConfig {
            default_ttl: self.default_ttl,
        });
    }

    fn ready(&self, _server: &mut Server) {
        tracing::info!(default_ttl_ms = self.default_ttl.as_millis(), "ContentPlugin ready");
    }

    fn cleanup(&self, server: &mut Server) {
        if let Some(registry) = server.get_global::<CellRegistry>() {
            registry.clear();
        }
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<TimePlugin>()]
    }
}
