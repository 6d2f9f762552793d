//! Observable value cells.
//!
//! A [`Cell`] is a shared value slot plus a list of listeners that are
//! invoked, in registration order, after every write. Handles are cheap to
//! clone and all clones point at the same slot.
//!
//! Consumers that must not write receive a [`CellView`] instead.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

/// Callback invoked with the new value after each write.
type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    value: T,
    version: u64,
}

struct CellInner<T> {
    key: Arc<str>,
    slot: RwLock<Slot<T>>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    next_listener: AtomicU64,
}

/// A shared, observable value slot.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use cachet_cell::Cell;
///
/// let cart = Cell::new("cart", Vec::<String>::new());
///
/// let writes = Arc::new(AtomicUsize::new(0));
/// let seen = writes.clone();
/// let _subscription = cart.subscribe(move |items: &Vec<String>| {
///     seen.fetch_add(1, Ordering::SeqCst);
///     assert_eq!(items.len(), 1);
/// });
///
/// cart.set(vec!["sku-1".to_string()]);
/// assert_eq!(writes.load(Ordering::SeqCst), 1);
/// assert_eq!(cart.get(), vec!["sku-1".to_string()]);
/// ```
pub struct Cell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.inner.slot.read();
        f.debug_struct("Cell")
            .field("key", &self.inner.key)
            .field("value", &slot.value)
            .field("version", &slot.version)
            .finish()
    }
}

impl<T> Cell<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a standalone cell seeded with `initial`.
    ///
    /// Cells shared between consumers come from a
    /// [`CellRegistry`](crate::CellRegistry); this constructor is for cells
    /// that are not meant to be looked up by key.
    #[must_use]
    pub fn new(key: impl Into<Arc<str>>, initial: T) -> Self {
        Self {
            inner: Arc::new(CellInner {
                key: key.into(),
                slot: RwLock::new(Slot {
                    value: initial,
                    version: 0,
                }),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the key this cell was created under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.slot.read().value.clone()
    }

    /// Runs `f` against the current value without cloning it.
    ///
    /// The cell is read-locked while `f` runs; `f` must not write to the
    /// same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.slot.read().value)
    }

    /// Returns the number of writes this cell has seen.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.slot.read().version
    }

    /// Replaces the value and notifies listeners.
    pub fn set(&self, value: T) {
        self.replace(value);
    }

    /// Replaces the value, notifies listeners, and returns the old value.
    pub fn replace(&self, value: T) -> T {
        let (old, pending) = self.write(|slot| core::mem::replace(slot, value));
        pending.notify();
        old
    }

    /// Mutates the value in place and notifies listeners.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.write(f).1.notify();
    }

    /// Replaces the value but holds back listener notification.
    ///
    /// Listeners run when the returned [`Notification`] is notified or
    /// dropped. Staging several cells and notifying afterwards lets every
    /// listener observe all of the writes together.
    ///
    /// ```
    /// use cachet_cell::Cell;
    ///
    /// let items = Cell::new("items", 0u32);
    /// let stamp = Cell::new("stamp", 0u32);
    ///
    /// let reader = stamp.clone();
    /// let _sub = items.subscribe(move |_: &u32| assert_eq!(reader.get(), 7));
    ///
    /// let items_written = items.stage(3);
    /// let stamp_written = stamp.stage(7);
    /// items_written.notify();
    /// stamp_written.notify();
    /// ```
    pub fn stage(&self, value: T) -> Notification<T> {
        self.write(|slot| *slot = value).1
    }

    /// Mutates the value in place but holds back listener notification.
    ///
    /// See [`stage`](Self::stage).
    pub fn stage_update(&self, f: impl FnOnce(&mut T)) -> Notification<T> {
        self.write(f).1
    }

    /// Registers a listener invoked with the new value after every write.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped (or forever, after [`Subscription::detach`]).
    ///
    /// Listeners run on the writing thread once the write lock is released.
    /// Writes made from one thread are delivered in write order. Writers on
    /// different threads deliver independently, so their callbacks may
    /// arrive out of order; a listener that needs the latest value should
    /// read it back with [`get`](Self::get), which always sees the last
    /// committed write.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));

        let weak: Weak<CellInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.lock().retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Returns a read-only handle to this cell.
    #[must_use]
    pub fn view(&self) -> CellView<T> {
        CellView { cell: self.clone() }
    }

    /// Returns true if both handles point at the same slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Applies `f` under the write lock and bumps the version.
    fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> (R, Notification<T>) {
        let mut slot = self.inner.slot.write();
        let out = f(&mut slot.value);
        slot.version += 1;
        let snapshot = if self.inner.listeners.lock().is_empty() {
            None
        } else {
            Some(slot.value.clone())
        };
        drop(slot);
        (
            out,
            Notification {
                cell: self.clone(),
                snapshot,
            },
        )
    }

    /// Invokes listeners outside of every lock so they may read the cell
    /// or subscribe again.
    fn deliver(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

/// Listener notification held back by [`Cell::stage`].
///
/// Listeners see the value as it was when the write was staged. They run on
/// [`notify`](Self::notify), or when the notification is dropped.
#[must_use = "dropping a Notification notifies listeners immediately"]
pub struct Notification<T>
where
    T: Clone + Send + Sync + 'static,
{
    cell: Cell<T>,
    snapshot: Option<T>,
}

impl<T> Notification<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Runs the cell's listeners with the staged value.
    pub fn notify(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(value) = self.snapshot.take() {
            self.cell.deliver(&value);
        }
    }
}

impl<T> Drop for Notification<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.fire();
    }
}

impl<T> fmt::Debug for Notification<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("key", &self.cell.key())
            .field("pending", &self.snapshot.is_some())
            .finish()
    }
}

/// Read-only handle to a [`Cell`].
///
/// Views can read and observe a cell but never write it.
pub struct CellView<T> {
    cell: Cell<T>,
}

impl<T> Clone for CellView<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CellView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CellView").field(&self.cell).finish()
    }
}

impl<T> CellView<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Returns the key of the underlying cell.
    #[must_use]
    pub fn key(&self) -> &str {
        self.cell.key()
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// Returns the number of writes the underlying cell has seen.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Registers a listener; see [`Cell::subscribe`].
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    /// Returns true if both views observe the same slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.cell.ptr_eq(&other.cell)
    }
}

/// RAII handle for a listener registered on a [`Cell`].
///
/// Dropping the subscription unregisters the listener.
#[must_use = "dropping a Subscription immediately unregisters its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Unregisters the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keeps the listener registered for the lifetime of the cell.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
