//! Server runtime for plugin orchestration.
//!
//! The [`Server`] is the composition root of a cachet application. It owns
//! the global resources plugins install and drives the plugin lifecycle.
//!
//! # Lifecycle
//!
//! 1. **Dependency Resolution** - Validate and topologically sort plugins
//! 2. **Build Phase** - Call `plugin.build()` in dependency order
//! 3. **Ready Phase** - Call `plugin.ready()` in dependency order
//! 4. **Cleanup Phase** - Call `plugin.cleanup()` in reverse order
//!
//! ```ignore
//! let mut server = Server::new();
//! server
//!     .add_plugins(DefaultPlugins.build())
//!     .add_plugins(ContentPlugin::default());
//! server.finish();
//!
//! let products = ContentFactory::from_server(&server, search)?
//!     .use_content("productList", 60_000)?;
//!
//! // ... serve requests ...
//!
//! server.cleanup();
//! ```

use crate::plugin::{Plugin, PluginId, Plugins};
use crate::resource::{GlobalResource, ResourceRef, ResourceRefMut, Resources};
use hashbrown::{HashMap, HashSet};

/// Represents the lifecycle state of the server.
///
/// Progresses linearly: `NotStarted` → `Building` → `Built` → `ShutDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    /// `finish()` has not been called yet.
    #[default]
    NotStarted,
    /// `finish()` is executing.
    Building,
    /// `finish()` has returned.
    Built,
    /// `cleanup()` has run.
    ShutDown,
}

/// Internal entry for a registered plugin.
struct PluginEntry {
    id: PluginId,
    plugin: Box<dyn Plugin>,
    /// Cached for error messages.
    name: String,
}

/// The runtime that orchestrates plugins and owns global resources.
///
/// # Example
///
/// ```
/// use cachet_system::plugin::Plugin;
/// use cachet_system::resource::GlobalResource;
/// use cachet_system::server::Server;
///
/// struct Currency(&'static str);
/// impl GlobalResource for Currency {}
///
/// struct CurrencyPlugin;
/// impl Plugin for CurrencyPlugin {
///     fn build(&self, server: &mut Server) {
///         server.insert_global(Currency("EUR"));
///     }
/// }
///
/// let mut server = Server::new();
/// server.add_plugins(CurrencyPlugin);
/// server.finish();
///
/// assert_eq!(server.get_global::<Currency>().unwrap().0, "EUR");
/// server.cleanup();
/// ```
#[derive(Default)]
pub struct Server {
    /// Server-lifetime resources installed by plugins.
    global: Resources,

    /// Plugins pending build (not yet sorted).
    pending_plugins: Vec<PluginEntry>,

    /// Plugins that have been built, in dependency order.
    built_plugins: Vec<PluginEntry>,

    /// Set of plugin IDs that have been added (for duplicate detection).
    plugin_ids: HashSet<PluginId>,

    build_state: BuildState,
}

impl Server {
    /// Creates a new empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds one or more plugins to the server.
    ///
    /// Accepts either a single [`Plugin`] or a
    /// [`PluginGroupBuilder`](crate::plugin::PluginGroupBuilder).
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_server(self);
        self
    }

    /// Adds a boxed plugin with its captured ID.
    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{}' is unique and was already added.\n\
                 If you intended to add this plugin multiple times, \
                 set `is_unique()` to return `false`.",
                name
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry { id, plugin, name };

        // Plugins added from inside another plugin's build() are built
        // immediately.
        if self.build_state == BuildState::Building {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        } else {
            self.pending_plugins.push(entry);
        }
    }

    /// Returns true if a plugin of the given type has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        let id = PluginId::of::<P>();
        self.pending_plugins
            .iter()
            .chain(self.built_plugins.iter())
            .any(|p| p.id == id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Global Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a global resource into the server.
    ///
    /// If a resource of this type already exists, it is replaced and the
    /// old value is returned.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.global.insert(resource)
    }

    /// Returns true if a global resource of type `R` exists.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.global.contains::<R>()
    }

    /// Gets an immutable reference to a global resource.
    ///
    /// Returns `None` if the resource doesn't exist or is mutably borrowed.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<ResourceRef<'_, R>> {
        self.global.get::<R>().ok()
    }

    /// Gets a mutable reference to a global resource.
    ///
    /// Intended for plugins adjusting each other's configuration during the
    /// build phase. Returns `None` if the resource doesn't exist or is
    /// already borrowed.
    #[must_use]
    pub fn get_global_mut<R: GlobalResource>(&self) -> Option<ResourceRefMut<'_, R>> {
        self.global.get_mut::<R>().ok()
    }

    /// Removes a global resource from the server and returns it.
    pub fn remove_global<R: GlobalResource>(&mut self) -> Option<R> {
        self.global.remove::<R>()
    }

    /// Returns a reference to the global resources container.
    #[must_use]
    pub fn global_resources(&self) -> &Resources {
        &self.global
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns whether `finish()` has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.build_state == BuildState::Built
    }

    /// Returns whether `cleanup()` has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.build_state == BuildState::ShutDown
    }

    /// Builds all plugins and prepares the server for use.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not satisfied
    /// - If there is a circular dependency between plugins
    /// - If called more than once
    pub fn finish(&mut self) {
        if self.build_state != BuildState::NotStarted {
            panic!("Server::finish() was already called. Cannot build twice.");
        }

        let sorted_plugins = self.sort_plugins_by_dependencies();

        self.build_state = BuildState::Building;
        for entry in sorted_plugins {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        }

        // Take the list out so ready() can borrow the server mutably.
        let mut plugins = core::mem::take(&mut self.built_plugins);
        for entry in &plugins {
            entry.plugin.ready(self);
        }
        plugins.append(&mut self.built_plugins);
        self.built_plugins = plugins;

        self.build_state = BuildState::Built;
    }

    /// Cleans up all plugins in reverse dependency order.
    ///
    /// Calling `cleanup()` more than once, or before `finish()`, is a no-op.
    pub fn cleanup(&mut self) {
        if self.build_state != BuildState::Built {
            return;
        }

        let plugins = core::mem::take(&mut self.built_plugins);
        for entry in plugins.iter().rev() {
            entry.plugin.cleanup(self);
        }
        self.built_plugins = plugins;

        self.build_state = BuildState::ShutDown;
    }

    /// Sorts pending plugins by dependencies using Kahn's algorithm.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not found
    /// - If there is a circular dependency
    fn sort_plugins_by_dependencies(&mut self) -> Vec<PluginEntry> {
        let pending = core::mem::take(&mut self.pending_plugins);
        if pending.is_empty() {
            return Vec::new();
        }

        let index_of: HashMap<PluginId, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.id, i))
            .collect();

        let n = pending.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in pending.iter().enumerate() {
            for dep_id in entry.plugin.dependencies() {
                if let Some(&dep_idx) = index_of.get(&dep_id) {
                    dependents[dep_idx].push(i);
                    in_degree[i] += 1;
                } else if !self.built_plugins.iter().any(|p| p.id == dep_id) {
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.\n\
                         Add {} before {}, or use a plugin group that includes it.",
                        entry.name,
                        dep_id.type_name(),
                        dep_id.type_name(),
                        entry.name
                    );
                }
            }
        }

        // Seed in insertion order so independent plugins keep their order.
        let mut queue: std::collections::VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut sorted_indices: Vec<usize> = Vec::with_capacity(n);
        while let Some(idx) = queue.pop_front() {
            sorted_indices.push(idx);
            for &dependent_idx in &dependents[idx] {
                in_degree[dependent_idx] -= 1;
                if in_degree[dependent_idx] == 0 {
                    queue.push_back(dependent_idx);
                }
            }
        }

        if sorted_indices.len() != n {
            let in_cycle: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| pending[i].name.as_str())
                .collect();

            panic!(
                "Circular dependency detected among plugins: {:?}\n\
                 Break the cycle by extracting shared functionality into a separate plugin.",
                in_cycle
            );
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        sorted_indices
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}
