//! Error types for content lifecycle and rendering.

use core::error::Error;
use std::sync::Arc;

/// Failure reported by a search operation.
///
/// Search failures never propagate out of
/// [`UseContent::search`](crate::UseContent::search); they are captured into
/// the consumer's error cell as data. The type is `Clone` so that every
/// consumer sharing the identity can read the same failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SearchError {
    message: String,
    #[source]
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl SearchError {
    /// Creates a search error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a search error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a search error from an underlying cause, reusing its message.
    pub fn from_error(source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error slot shared by all consumers of one identity.
#[derive(Debug, Clone, Default)]
pub struct ContentErrors {
    /// Failure of the most recent search, cleared by the next success.
    pub search: Option<SearchError>,
}

impl ContentErrors {
    /// Returns true if no failure is recorded.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.search.is_none()
    }
}

/// Errors raised while constructing consumers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// A consumer was requested with an empty identity.
    #[error("content identity must not be empty")]
    EmptyIdentity,

    /// A global resource the factory needs was not registered on the server.
    #[error("missing global resource `{0}`; is ContentPlugin added and the server finished?")]
    MissingResource(&'static str),
}

/// Errors raised while projecting content into render nodes.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The extraction function rejected the content.
    #[error("failed to extract render components: {0}")]
    Extraction(String),

    /// The content could not be decoded into render components.
    #[error("invalid render payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct Transport;

    #[test]
    fn new_has_no_source() {
        let err = SearchError::new("catalog unavailable");
        assert_eq!(err.to_string(), "catalog unavailable");
        assert!(err.source().is_none());
    }

    #[test]
    fn with_source_keeps_cause() {
        let err = SearchError::with_source("catalog unavailable", Transport);
        assert_eq!(err.message(), "catalog unavailable");
        assert_eq!(err.source().unwrap().to_string(), "connection reset");
    }

    #[test]
    fn from_error_reuses_message() {
        let err = SearchError::from_error(Transport);
        assert_eq!(err.message(), "connection reset");
        assert!(err.source().is_some());
    }

    #[test]
    fn clones_share_cause() {
        let err = SearchError::with_source("boom", Transport);
        let copy = err.clone();
        assert_eq!(copy.to_string(), err.to_string());
        assert!(copy.source().is_some());
    }

    #[test]
    fn content_errors_default_is_clear() {
        let errors = ContentErrors::default();
        assert!(errors.is_clear());
    }
}
