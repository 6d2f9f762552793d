//! The [`ContentSearch`] trait for injected fetch operations.

use core::fmt;
use core::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SearchError;

/// Context passed to every search invocation.
///
/// Carries the identity of the consumer that triggered the search and the
/// platform API handle the factory was configured with.
pub struct SearchContext<A = ()> {
    identity: Arc<str>,
    api: Arc<A>,
}

impl<A> SearchContext<A> {
    /// Creates a context for the given identity.
    pub fn new(identity: impl Into<Arc<str>>, api: Arc<A>) -> Self {
        Self {
            identity: identity.into(),
            api,
        }
    }

    /// Identity of the consumer that triggered the search.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The shared platform API handle.
    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }
}

impl<A> Clone for SearchContext<A> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            api: Arc::clone(&self.api),
        }
    }
}

impl<A> fmt::Debug for SearchContext<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Asynchronous operation that fetches content for a set of parameters.
///
/// Implemented directly by transport types, and by any closure of the shape
/// `Fn(SearchContext<A>, P) -> impl Future<Output = Result<C, SearchError>>`.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use cachet_content::{ContentSearch, SearchContext, SearchError};
///
/// struct Catalog;
///
/// #[async_trait]
/// impl ContentSearch<Vec<String>, String> for Catalog {
///     async fn search(
///         &self,
///         _ctx: &SearchContext,
///         query: String,
///     ) -> Result<Vec<String>, SearchError> {
///         Ok(vec![format!("{query}-1"), format!("{query}-2")])
///     }
/// }
/// ```
#[async_trait]
pub trait ContentSearch<C, P, A = ()>: Send + Sync + 'static {
    /// Fetches content for `params`.
    async fn search(&self, ctx: &SearchContext<A>, params: P) -> Result<C, SearchError>;
}

#[async_trait]
impl<C, P, A, F, Fut> ContentSearch<C, P, A> for F
where
    F: Fn(SearchContext<A>, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C, SearchError>> + Send + 'static,
    C: Send + 'static,
    P: Send + 'static,
    A: Send + Sync + 'static,
{
    async fn search(&self, ctx: &SearchContext<A>, params: P) -> Result<C, SearchError> {
        (self)(ctx.clone(), params).await
    }
}
