//! The composition root for cachet (Layer 1).
//!
//! `cachet_system` provides the primitives every cachet application is wired
//! together with:
//!
//! - [`plugin`] - Plugin trait and plugin groups
//! - [`resource`] - Type-keyed storage for server-lifetime state
//! - [`server`] - Server runtime driving the plugin lifecycle
//!
//! # Architecture
//!
//! - **Layer 1** (`cachet_system`, `cachet_cell`, `cachet_core_plugins`):
//!   composition root, observable cells, infrastructure plugins
//! - **Layer 2** (`cachet_content`): the shared content cache and the
//!   rendering projector
//!
//! Shared state is never ambient. Whatever a consumer needs (the cell
//! registry, the clock, configuration) is constructed by a plugin during the
//! build phase and handed out by the [`Server`](server::Server) that owns it.
//!
//! # Example
//!
//! ```
//! use cachet_system::plugin::Plugin;
//! use cachet_system::server::Server;
//! use cachet_system::resource::GlobalResource;
//!
//! #[derive(Default)]
//! struct CatalogConfig { page_size: usize }
//! impl GlobalResource for CatalogConfig {}
//!
//! struct CatalogPlugin;
//!
//! impl Plugin for CatalogPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(CatalogConfig::default());
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.add_plugins(CatalogPlugin);
//! server.finish();
//! assert!(server.contains_global::<CatalogConfig>());
//! ```

/// Plugin trait for extensible functionality.
pub mod plugin;

/// Resource container management.
pub mod resource;

/// Server runtime for plugin orchestration.
pub mod server;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::server::*;
}
