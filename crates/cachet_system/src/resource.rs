//! Resource storage.
//!
//! This module provides the [`Resource`] trait, the [`GlobalResource`]
//! marker and the [`Resources`] container the [`Server`](crate::server::Server)
//! keeps its server-lifetime state in.
//!
//! Resources are keyed by type. Plugins publish things like the cell
//! registry, the clock or their own configuration here during `build()`,
//! and factories resolve them once the server is finished.

use core::any::{Any, TypeId};
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A value that can be stored in a [`Resources`] container.
///
/// Any type that is `Send + Sync + 'static` automatically implements
/// `Resource`.
pub trait Resource: Send + Sync + 'static {
    /// Returns the type name for debugging purposes.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl<T: Send + Sync + 'static> Resource for T {}

/// Marker trait for server-lifetime resources.
///
/// Global resources are:
/// - Inserted by plugins during the build phase
/// - Shared by every consumer created from the server
/// - Dropped when the server is dropped
///
/// # Example
///
/// ```
/// use cachet_system::resource::GlobalResource;
/// use cachet_system::server::Server;
///
/// struct StoreConfig {
///     locale: String,
/// }
///
/// impl GlobalResource for StoreConfig {}
///
/// let mut server = Server::new();
/// server.insert_global(StoreConfig { locale: "en".into() });
///
/// let config = server.get_global::<StoreConfig>().unwrap();
/// assert_eq!(config.locale, "en");
/// ```
pub trait GlobalResource: Resource {}

/// Unique identifier for a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(TypeId);

impl ResourceId {
    /// Creates a `ResourceId` for the given type.
    #[must_use]
    pub fn of<T: Resource>() -> Self {
        Self(TypeId::of::<T>())
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.0
    }
}

/// Errors that can occur during resource operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The requested resource type was not found in the container.
    #[error("resource not found: {0}")]
    NotFound(&'static str),

    /// The resource is currently borrowed mutably and cannot be accessed.
    #[error("resource already borrowed mutably: {0}")]
    BorrowConflict(&'static str),
}

/// Storage for a single resource behind its own lock.
struct ResourceEntry {
    data: RwLock<Box<dyn Any + Send + Sync>>,
}

impl ResourceEntry {
    fn new<T: Resource>(resource: T) -> Self {
        Self {
            data: RwLock::new(Box::new(resource)),
        }
    }

    fn into_inner(self) -> Box<dyn Any + Send + Sync> {
        self.data.into_inner()
    }
}

/// Container for storing and managing resources.
///
/// Resources are accessed through RAII guards; each resource type has its
/// own `RwLock`, so many readers or a single writer may hold it at once.
///
/// # Example
///
/// ```
/// use cachet_system::resource::Resources;
///
/// struct HitCounter { hits: u32 }
///
/// let mut resources = Resources::new();
/// resources.insert(HitCounter { hits: 0 });
///
/// {
///     let mut counter = resources.get_mut::<HitCounter>().unwrap();
///     counter.hits += 1;
/// }
///
/// assert_eq!(resources.get::<HitCounter>().unwrap().hits, 1);
/// ```
#[derive(Default)]
pub struct Resources {
    storage: HashMap<ResourceId, ResourceEntry>,
}

impl Resources {
    /// Creates a new empty resource container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }

    /// Inserts a resource into the container.
    ///
    /// If a resource of this type already exists, it is replaced and the
    /// old value is returned.
    pub fn insert<T: Resource>(&mut self, resource: T) -> Option<T> {
        self.storage
            .insert(ResourceId::of::<T>(), ResourceEntry::new(resource))
            .and_then(|old| old.into_inner().downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// Returns `true` if a resource of type `T` exists.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.storage.contains_key(&ResourceId::of::<T>())
    }

    /// Gets an immutable reference to a resource.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NotFound`] if the resource type is not registered
    /// - [`ResourceError::BorrowConflict`] if the resource is mutably borrowed
    pub fn get<T: Resource>(&self) -> Result<ResourceRef<'_, T>, ResourceError> {
        let type_name = core::any::type_name::<T>();

        let entry = self
            .storage
            .get(&ResourceId::of::<T>())
            .ok_or(ResourceError::NotFound(type_name))?;

        let guard = entry
            .data
            .try_read()
            .ok_or(ResourceError::BorrowConflict(type_name))?;

        Ok(ResourceRef {
            guard,
            _marker: core::marker::PhantomData,
        })
    }

    /// Gets a mutable reference to a resource.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NotFound`] if the resource type is not registered
    /// - [`ResourceError::BorrowConflict`] if the resource is already borrowed
    pub fn get_mut<T: Resource>(&self) -> Result<ResourceRefMut<'_, T>, ResourceError> {
        let type_name = core::any::type_name::<T>();

        let entry = self
            .storage
            .get(&ResourceId::of::<T>())
            .ok_or(ResourceError::NotFound(type_name))?;

        let guard = entry
            .data
            .try_write()
            .ok_or(ResourceError::BorrowConflict(type_name))?;

        Ok(ResourceRefMut {
            guard,
            _marker: core::marker::PhantomData,
        })
    }

    /// Removes a resource from the container and returns it.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.storage
            .remove(&ResourceId::of::<T>())
            .and_then(|entry| entry.into_inner().downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// Removes all resources from the container.
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// Returns the number of resources stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if no resources are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

/// RAII guard for immutable resource access.
pub struct ResourceRef<'a, T: Resource> {
    guard: RwLockReadGuard<'a, Box<dyn Any + Send + Sync>>,
    _marker: core::marker::PhantomData<&'a T>,
}

impl<T: Resource> core::ops::Deref for ResourceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Entries are keyed by `ResourceId::of::<T>()`, so the downcast
        // cannot fail.
        self.guard
            .downcast_ref::<T>()
            .expect("resource type mismatch (this is a bug)")
    }
}

/// RAII guard for mutable resource access.
pub struct ResourceRefMut<'a, T: Resource> {
    guard: RwLockWriteGuard<'a, Box<dyn Any + Send + Sync>>,
    _marker: core::marker::PhantomData<&'a mut T>,
}

impl<T: Resource> core::ops::Deref for ResourceRefMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.guard
            .downcast_ref::<T>()
            .expect("resource type mismatch (this is a bug)")
    }
}

impl<T: Resource> core::ops::DerefMut for ResourceRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard
            .downcast_mut::<T>()
            .expect("resource type mismatch (this is a bug)")
    }
}
