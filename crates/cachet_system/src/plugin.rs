//! Plugin system for composing a cachet application.
//!
//! Every piece of shared infrastructure (the cell registry, the clock, the
//! tracing subscriber) is installed by a plugin. Plugins declare their
//! dependencies and the [`Server`] drives them through a fixed lifecycle.
//!
//! # Example
//!
//! ```
//! use cachet_system::plugin::{Plugin, PluginId};
//! use cachet_system::server::Server;
//!
//! struct StorePlugin;
//! impl Plugin for StorePlugin {
//!     fn build(&self, _server: &mut Server) {}
//! }
//!
//! struct CatalogPlugin {
//!     endpoint: String,
//! }
//!
//! struct CatalogEndpoint(String);
//!
//! impl Plugin for CatalogPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(CatalogEndpoint(self.endpoint.clone()));
//!     }
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<StorePlugin>()]
//!     }
//! }
//!
//! # impl cachet_system::resource::GlobalResource for CatalogEndpoint {}
//! let mut server = Server::new();
//! server
//!     .add_plugins(StorePlugin)
//!     .add_plugins(CatalogPlugin { endpoint: "https://catalog.local".into() });
//! server.finish();
//! ```

use core::any::TypeId;

use crate::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Used for dependency resolution and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of installable functionality.
///
/// Plugins follow a strict lifecycle managed by the server:
///
/// 1. **Build Phase** - `build()` is called in dependency order
/// 2. **Ready Phase** - `ready()` is called in dependency order
/// 3. **Cleanup Phase** - `cleanup()` is called in reverse dependency order
///
/// The cleanup phase is the teardown boundary for whatever the plugin
/// installed: `ContentPlugin`, for instance, empties the cell registry there.
pub trait Plugin: Send + Sync + 'static {
    /// Configures the server. Called once, in dependency order.
    ///
    /// Register global resources here. Keep it lightweight; anything that
    /// depends on other plugins' resources belongs in [`ready()`](Self::ready).
    fn build(&self, server: &mut Server);

    /// Called after every plugin has been built.
    ///
    /// Use this for validation that required resources exist and for
    /// process-wide initialization (installing a tracing subscriber).
    fn ready(&self, _server: &mut Server) {}

    /// Called when the server is shutting down.
    ///
    /// Called in **reverse** dependency order (dependents before dependencies).
    fn cleanup(&self, _server: &mut Server) {}

    /// Returns the plugin's name for debugging and error messages.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares plugins that must be added before this one.
    ///
    /// The server panics in [`finish()`](Server::finish) if a dependency is
    /// missing.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if this plugin can only be added once.
    ///
    /// Default is `true`; adding the same plugin type twice panics.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait (for add_plugins polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Types that can be passed to [`Server::add_plugins`]: a single
/// [`Plugin`] or a [`PluginGroupBuilder`].
pub trait Plugins {
    /// Adds these plugins to the server.
    fn add_to_server(self, server: &mut Server);
}

impl<P: Plugin> Plugins for P {
    fn add_to_server(self, server: &mut Server) {
        // Capture the id while the concrete type is still known
        server.add_plugin_boxed(PluginId::of::<P>(), Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_server(self, server: &mut Server) {
        for boxed in self.plugins {
            server.add_plugin_boxed(boxed.id, boxed.plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup
// ─────────────────────────────────────────────────────────────────────────────

/// A bundle of plugins that are usually added together.
///
/// # Example
///
/// ```ignore
/// Server::new()
///     .add_plugins(DefaultPlugins.build().disable::<TracingPlugin>())
///     .finish();
/// ```
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin with the [`PluginId`] captured before boxing.
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

/// Builder for customizing plugin groups.
#[derive(Default)]
pub struct PluginGroupBuilder {
    pub(crate) plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates a new empty plugin group builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Adds a plugin to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        });
        self
    }

    /// Removes a plugin from the group by type.
    ///
    /// If the plugin is not found, this is a no-op.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let id = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != id);
        self
    }

    /// Returns true if the group contains a plugin of type `P`.
    #[must_use]
    pub fn contains<P: Plugin>(&self) -> bool {
        let id = PluginId::of::<P>();
        self.plugins.iter().any(|p| p.id == id)
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group contains no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
