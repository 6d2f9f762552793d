//! Shared observable cells for cachet.
//!
//! - [`Cell`] - a value slot with listeners notified on every write
//! - [`CellView`] - read-only handle handed to consumers
//! - [`Subscription`] - RAII guard that unregisters a listener on drop
//! - [`Notification`] - listener delivery held back by [`Cell::stage`]
//! - [`CellRegistry`] - get-or-create access to cells by key
//!
//! Consumers that reference the same key through the same registry share
//! one slot, so a write made by one consumer is immediately visible to all
//! of them.
//!
//! # Example
//!
//! ```
//! use cachet_cell::CellRegistry;
//!
//! let registry = CellRegistry::new();
//!
//! // Two independent consumers of the same logical resource
//! let writer = registry.get_or_create("use-content/cart/loading", false);
//! let reader = registry.get_or_create("use-content/cart/loading", false).view();
//!
//! writer.set(true);
//! assert!(reader.get());
//! ```

mod cell;
mod registry;

pub use cell::{Cell, CellView, Notification, Subscription};
pub use registry::CellRegistry;
