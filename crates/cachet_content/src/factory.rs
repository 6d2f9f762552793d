//! Consumer factory and the fetch lifecycle.
//!
//! A [`ContentFactory`] binds a search operation to a [`CellRegistry`].
//! Each call to [`ContentFactory::use_content`] hands out a [`UseContent`]
//! consumer whose four cells (content, loading, error, cache timestamp) are
//! shared with every other consumer of the same identity.
//!
//! # Fetch lifecycle
//!
//! 1. Without `force`, a valid cache returns immediately.
//! 2. The loading flag goes up.
//! 3. The search operation runs.
//! 4. Success replaces the content, clears the error and stamps the cache.
//!    All three are committed before any listener runs, so a subscriber to
//!    any of them never sees a half-applied result. Failure records the
//!    error and leaves content and timestamp alone.
//! 5. The loading flag goes down, even if the search panicked or the
//!    future was dropped.
//!
//! Overlapping searches on one identity are not de-duplicated. Each invokes
//! the search operation; the last to settle wins.

use core::fmt;
use std::sync::Arc;

use cachet_cell::{Cell, CellRegistry, CellView};
use cachet_core_plugins::Clock;
use cachet_system::server::Server;

use crate::cache::{self, CacheTimestamp, CacheTtl};
use crate::content::Content;
use crate::error::{ContentError, ContentErrors, SearchError};
use crate::plugin::ContentConfig;
use crate::search::{ContentSearch, SearchContext};

/// Prefix shared by every cell key the factory registers.
pub const KEY_PREFIX: &str = "use-content";

/// Builds the registry key of one of an identity's cells.
///
/// `slot` is one of `content`, `loading`, `error` or `cache`.
#[must_use]
pub fn cell_key(identity: &str, slot: &str) -> String {
    format!("{KEY_PREFIX}/{identity}/{slot}")
}

// ─────────────────────────────────────────────────────────────────────────────
// ContentFactory
// ─────────────────────────────────────────────────────────────────────────────

/// Produces [`UseContent`] consumers for one search operation.
///
/// # Example
///
/// ```
/// use cachet_cell::CellRegistry;
/// use cachet_content::{ContentFactory, SearchContext, SearchError};
///
/// let factory = ContentFactory::new(
///     CellRegistry::new(),
///     |_ctx: SearchContext, query: String| async move {
///         Ok::<_, SearchError>(vec![query])
///     },
/// );
///
/// let products = factory.use_content("productList", 60_000).unwrap();
/// assert!(products.content().get().is_empty());
/// assert!(!products.loading().get());
/// ```
pub struct ContentFactory<C, P, A = ()> {
    search: Arc<dyn ContentSearch<C, P, A>>,
    registry: CellRegistry,
    clock: Clock,
    api: Arc<A>,
    default_ttl: CacheTtl,
}

impl<C, P, A> Clone for ContentFactory<C, P, A> {
    fn clone(&self) -> Self {
        Self {
            search: Arc::clone(&self.search),
            registry: self.registry.clone(),
            clock: self.clock.clone(),
            api: Arc::clone(&self.api),
            default_ttl: self.default_ttl,
        }
    }
}

impl<C, P, A> fmt::Debug for ContentFactory<C, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentFactory")
            .field("registry", &self.registry)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl<C, P, A> ContentFactory<C, P, A>
where
    C: Content,
    P: Send + 'static,
    A: Send + Sync + 'static,
{
    /// Creates a factory over `registry` using the system clock.
    pub fn new(registry: CellRegistry, search: impl ContentSearch<C, P, A>) -> Self
    where
        A: Default,
    {
        Self {
            search: Arc::new(search),
            registry,
            clock: Clock::system(),
            api: Arc::new(A::default()),
            default_ttl: CacheTtl::Forever,
        }
    }

    /// Creates a factory from the resources registered on a finished server.
    ///
    /// Reads [`CellRegistry`], [`Clock`] and [`ContentConfig`], all of which
    /// `ContentPlugin` (with its `TimePlugin` dependency) provides.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::MissingResource`] if any of them is absent.
    pub fn from_server(
        server: &Server,
        search: impl ContentSearch<C, P, A>,
    ) -> Result<Self, ContentError>
    where
        A: Default,
    {
        let registry = server
            .get_global::<CellRegistry>()
            .map(|r| r.clone())
            .ok_or(ContentError::MissingResource("CellRegistry"))?;
        let clock = server
            .get_global::<Clock>()
            .map(|c| c.clone())
            .ok_or(ContentError::MissingResource("Clock"))?;
        let default_ttl = server
            .get_global::<ContentConfig>()
            .map(|c| c.default_ttl)
            .ok_or(ContentError::MissingResource("ContentConfig"))?;

        Ok(Self::new(registry, search)
            .with_clock(clock)
            .with_default_ttl(default_ttl))
    }

    /// Replaces the clock used for cache timestamps and freshness.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the platform API handle passed to every search.
    #[must_use]
    pub fn with_api(mut self, api: Arc<A>) -> Self {
        self.api = api;
        self
    }

    /// Sets the TTL used by [`use_content_default`](Self::use_content_default).
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: impl Into<CacheTtl>) -> Self {
        self.default_ttl = ttl.into();
        self
    }

    /// The registry this factory's consumers share.
    #[must_use]
    pub fn registry(&self) -> &CellRegistry {
        &self.registry
    }

    /// The TTL applied by [`use_content_default`](Self::use_content_default).
    #[must_use]
    pub fn default_ttl(&self) -> CacheTtl {
        self.default_ttl
    }

    /// Builds a consumer for `identity` with the given TTL.
    ///
    /// Consumers with the same identity share all state regardless of their
    /// TTLs; the TTL only affects this consumer's cache checks.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyIdentity`] if `identity` is empty.
    pub fn use_content(
        &self,
        identity: impl Into<String>,
        ttl: impl Into<CacheTtl>,
    ) -> Result<UseContent<C, P, A>, ContentError> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(ContentError::EmptyIdentity);
        }

        let content = self
            .registry
            .get_or_create_with(&cell_key(&identity, "content"), C::default);
        let loading = self.registry.get_or_create(&cell_key(&identity, "loading"), false);
        let error = self
            .registry
            .get_or_create_with(&cell_key(&identity, "error"), ContentErrors::default);
        let cache = cache::cache_timestamp(&self.registry, &cell_key(&identity, "cache"));

        let identity: Arc<str> = Arc::from(identity);
        Ok(UseContent {
            ctx: SearchContext::new(Arc::clone(&identity), Arc::clone(&self.api)),
            identity,
            ttl: ttl.into(),
            search: Arc::clone(&self.search),
            clock: self.clock.clone(),
            content,
            loading,
            error,
            cache,
        })
    }

    /// Builds a consumer for `identity` with the factory's default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyIdentity`] if `identity` is empty.
    pub fn use_content_default(
        &self,
        identity: impl Into<String>,
    ) -> Result<UseContent<C, P, A>, ContentError> {
        self.use_content(identity, self.default_ttl)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UseContent
// ─────────────────────────────────────────────────────────────────────────────

/// One consumer of a shared content identity.
///
/// Cloning yields another handle to the same consumer. Building a second
/// consumer for the same identity from the same registry also shares state:
/// a search through either is observed by both.
pub struct UseContent<C, P, A = ()> {
    identity: Arc<str>,
    ttl: CacheTtl,
    search: Arc<dyn ContentSearch<C, P, A>>,
    ctx: SearchContext<A>,
    clock: Clock,
    content: Cell<C>,
    loading: Cell<bool>,
    error: Cell<ContentErrors>,
    cache: Cell<CacheTimestamp>,
}

impl<C, P, A> Clone for UseContent<C, P, A> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            ttl: self.ttl,
            search: Arc::clone(&self.search),
            ctx: self.ctx.clone(),
            clock: self.clock.clone(),
            content: self.content.clone(),
            loading: self.loading.clone(),
            error: self.error.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<C, P, A> fmt::Debug for UseContent<C, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseContent")
            .field("identity", &self.identity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<C, P, A> UseContent<C, P, A>
where
    C: Content,
    P: fmt::Debug + Send + 'static,
    A: Send + Sync + 'static,
{
    /// Fetches content unless the cache is still valid.
    ///
    /// Never fails: a search error is recorded in [`error()`](Self::error).
    pub async fn search(&self, params: P) {
        self.run(params, false).await;
    }

    /// Fetches content, ignoring the cache.
    pub async fn force_search(&self, params: P) {
        self.run(params, true).await;
    }

    async fn run(&self, params: P, force: bool) {
        tracing::debug!(identity = %self.identity, ?params, force, "content search");

        if !force && self.is_cache_valid() {
            tracing::debug!(identity = %self.identity, "content served from cache");
            return;
        }

        let loading = LoadingGuard::raise(&self.loading);
        match self.search.search(&self.ctx, params).await {
            Ok(value) => self.settle_success(value),
            Err(err) => self.settle_failure(err),
        }
        drop(loading);
    }

    fn settle_success(&self, value: C) {
        let content = self.content.stage(value);
        let error = self.error.stage_update(|errors| errors.search = None);
        let cache = self.cache.stage(Some(self.clock.now()));
        content.notify();
        error.notify();
        cache.notify();
    }

    fn settle_failure(&self, err: SearchError) {
        tracing::error!(identity = %self.identity, error = %err, "content search failed");
        self.error.update(|errors| errors.search = Some(err));
    }
}

impl<C, P, A> UseContent<C, P, A>
where
    C: Content,
    A: Send + Sync + 'static,
{
    /// Returns true if the current content may be served without fetching.
    ///
    /// Freshness is judged against this consumer's own timestamp cell, the
    /// one successful searches stamp.
    #[must_use]
    pub fn is_cache_valid(&self) -> bool {
        self.content.with(|content| {
            cache::is_cache_valid_with(content, &self.cache, self.ttl, &self.clock)
        })
    }

    /// The last successfully fetched content.
    #[must_use]
    pub fn content(&self) -> CellView<C> {
        self.content.view()
    }

    /// True while a search is in flight.
    #[must_use]
    pub fn loading(&self) -> CellView<bool> {
        self.loading.view()
    }

    /// The failure of the latest search, if it failed.
    #[must_use]
    pub fn error(&self) -> CellView<ContentErrors> {
        self.error.view()
    }

    /// When content was last fetched successfully.
    #[must_use]
    pub fn cache_timestamp(&self) -> CellView<CacheTimestamp> {
        self.cache.view()
    }

    /// The identity this consumer is bound to.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// This consumer's TTL.
    #[must_use]
    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    /// The platform API handle passed to searches.
    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        self.ctx.api()
    }
}

/// Holds the loading flag up; lowers it on drop.
struct LoadingGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
