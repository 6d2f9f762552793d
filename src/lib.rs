//! Shared, TTL-cached content state for independent consumers.
//!
//! Re-exports the cachet crates:
//!
//! - [`cachet_system`] - server, plugins, global resources
//! - [`cachet_cell`] - observable cells and the keyed registry
//! - [`cachet_core_plugins`] - clock and tracing plugins
//! - [`cachet_content`] - the content lifecycle and render projection

/// Layer 1: composition root.
pub use cachet_system;

/// Layer 1: observable cells.
pub use cachet_cell;

/// Layer 1: infrastructure plugins.
pub use cachet_core_plugins;

/// Layer 2: shared content lifecycle.
pub use cachet_content;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use cachet_cell::{Cell, CellRegistry, CellView, Notification, Subscription};
    pub use cachet_content::{
        CacheTtl, Content, ContentError, ContentErrors, ContentFactory, ContentPlugin,
        ContentSearch, RenderComponent, RenderContentFactory, RenderNode, SearchContext,
        SearchError, UseContent,
    };
    pub use cachet_core_plugins::{
        Clock, ClockProvider, DefaultPlugins, MinimalPlugins, TimePlugin, TracingPlugin,
    };
    pub use cachet_system::prelude::*;
}
