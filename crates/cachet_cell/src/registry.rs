//! Keyed registry of shared cells.

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use cachet_system::resource::GlobalResource;

use crate::cell::Cell;

/// Registry key: the caller's string key plus the value type.
///
/// Keying by type as well means one string used with two value types yields
/// two independent cells instead of a failed downcast.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CellKey {
    key: Arc<str>,
    type_id: TypeId,
}

impl CellKey {
    fn of<T: 'static>(key: &str) -> Self {
        Self {
            key: Arc::from(key),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Get-or-create access to named, shared [`Cell`]s.
///
/// Every consumer built from the same registry that asks for the same key
/// receives a handle to the same cell. The table only grows; nothing is
/// evicted until [`clear()`](Self::clear), which is the registry's teardown
/// boundary.
///
/// `CellRegistry` is a cheap-clone handle. `ContentPlugin` publishes one as a
/// global resource; tests usually construct their own.
///
/// # Example
///
/// ```
/// use cachet_cell::CellRegistry;
///
/// let registry = CellRegistry::new();
///
/// let a = registry.get_or_create("cart/items", Vec::<u32>::new());
/// let b = registry.get_or_create("cart/items", vec![99]);
///
/// // The second seed is ignored; both handles share one slot.
/// assert!(a.ptr_eq(&b));
/// a.set(vec![1]);
/// assert_eq!(b.get(), vec![1]);
/// ```
#[derive(Clone, Default)]
pub struct CellRegistry {
    cells: Arc<RwLock<HashMap<CellKey, Arc<dyn Any + Send + Sync>>>>,
}

impl GlobalResource for CellRegistry {}

impl fmt::Debug for CellRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl CellRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell registered under `key`, creating it with `initial`
    /// if it does not exist yet.
    pub fn get_or_create<T>(&self, key: &str, initial: T) -> Cell<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_or_create_with(key, || initial)
    }

    /// Like [`get_or_create`](Self::get_or_create), but only builds the seed
    /// value when the cell is actually created.
    pub fn get_or_create_with<T>(&self, key: &str, init: impl FnOnce() -> T) -> Cell<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if let Some(cell) = self.get::<T>(key) {
            return cell;
        }

        let mut cells = self.cells.write();
        // Another handle may have created it between the read and the write.
        let entry = cells.entry(CellKey::of::<T>(key)).or_insert_with(|| {
            let created: Arc<dyn Any + Send + Sync> = Arc::new(Cell::new(key, init()));
            created
        });
        Self::downcast(entry)
    }

    /// Returns the cell registered under `key`, if any.
    #[must_use]
    pub fn get<T>(&self, key: &str) -> Option<Cell<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.cells
            .read()
            .get(&CellKey::of::<T>(key))
            .map(Self::downcast)
    }

    /// Returns true if a cell of type `T` is registered under `key`.
    #[must_use]
    pub fn contains<T: 'static>(&self, key: &str) -> bool {
        self.cells.read().contains_key(&CellKey::of::<T>(key))
    }

    /// Returns the number of registered cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// Returns true if no cells are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Returns the registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .cells
            .read()
            .keys()
            .map(|k| k.key.to_string())
            .collect();
        keys.sort();
        keys
    }

    /// Drops every registered cell.
    ///
    /// Handles obtained earlier keep working but no longer share state with
    /// cells created afterwards.
    pub fn clear(&self) {
        let dropped = {
            let mut cells = self.cells.write();
            let count = cells.len();
            cells.clear();
            count
        };
        tracing::debug!(cells = dropped, "cell registry cleared");
    }

    fn downcast<T>(entry: &Arc<dyn Any + Send + Sync>) -> Cell<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        // Entries are keyed by `TypeId::of::<T>()`, so the downcast cannot
        // fail.
        entry
            .downcast_ref::<Cell<T>>()
            .cloned()
            .expect("cell type mismatch (this is a bug)")
    }
}
