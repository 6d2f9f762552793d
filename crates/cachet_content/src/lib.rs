//! Shared, TTL-cached content state for cachet (Layer 2).
//!
//! This crate exposes a remotely fetched resource as observable state shared
//! by every consumer of the same identity:
//!
//! - [`ContentFactory`] / [`UseContent`] - the fetch lifecycle: cache check,
//!   loading flag, search, success or failure capture
//! - [`is_cache_valid`] / [`CacheTtl`] - freshness rules
//! - [`ContentSearch`] - the injected fetch operation
//! - [`RenderContentFactory`] - projects content into a [`RenderNode`] tree
//! - [`ContentPlugin`] - registers the shared [`CellRegistry`](cachet_cell::CellRegistry)
//!
//! # Example
//!
//! ```
//! use cachet_cell::CellRegistry;
//! use cachet_content::{ContentFactory, SearchContext, SearchError};
//!
//! # tokio_test_block(async {
//! let factory = ContentFactory::new(
//!     CellRegistry::new(),
//!     |_: SearchContext, category: String| async move {
//!         Ok::<_, SearchError>(vec![format!("{category}/sneaker")])
//!     },
//! );
//!
//! let header = factory.use_content("productList", 60_000).unwrap();
//! let grid = factory.use_content("productList", 60_000).unwrap();
//!
//! header.search("shoes".to_string()).await;
//!
//! // The grid observes the header's fetch.
//! assert_eq!(grid.content().get(), vec!["shoes/sneaker".to_string()]);
//! assert!(grid.cache_timestamp().get().is_some());
//! # });
//! # fn tokio_test_block(f: impl core::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

mod cache;
mod content;
mod error;
mod factory;
mod plugin;
mod render;
mod search;

pub use cache::{CacheTimestamp, CacheTtl, cache_timestamp, is_cache_valid, is_cache_valid_with};
pub use content::Content;
pub use error::{ContentError, ContentErrors, RenderError, SearchError};
pub use factory::{ContentFactory, KEY_PREFIX, UseContent, cell_key};
pub use plugin::{ContentConfig, ContentPlugin};
pub use render::{CONTAINER_TAG, RenderComponent, RenderContentFactory, RenderNode};
pub use search::{ContentSearch, SearchContext};
