//! Storefront demo built with cachet.
//!
//! A page header and a product grid both consume the `productList`
//! identity. Whichever widget searches first fetches from the
//! [`Storefront`] catalog; the other is served from the shared cache until
//! the TTL runs out.
//!
//! ```text
//! ┌────────────┐   search    ┌───────────────────┐   fetch   ┌────────────┐
//! │   Header   │────────────▶│ use-content/      │──────────▶│ Storefront │
//! └────────────┘             │   productList/*   │           └────────────┘
//! ┌────────────┐   reads     │ content, loading, │
//! │    Grid    │◀────────────│ error, cache      │
//! └────────────┘             └───────────────────┘
//! ```

use core::time::Duration;

use async_trait::async_trait;
use cachet_content::{
    CacheTtl, ContentSearch, RenderComponent, RenderError, SearchContext, SearchError,
};
use serde::{Deserialize, Serialize};

/// Environment variable holding the cache TTL in milliseconds.
pub const TTL_ENV: &str = "CACHET_TTL_MS";

/// TTL used when [`TTL_ENV`] is unset.
pub const DEFAULT_TTL_MS: i64 = 60_000;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Catalog category.
    pub category: String,
    /// Price in cents.
    pub price_cents: u32,
}

impl Product {
    fn new(sku: &str, name: &str, category: &str, price_cents: u32) -> Self {
        Self {
            sku: sku.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price_cents,
        }
    }
}

/// In-memory catalog standing in for a commerce backend.
#[derive(Debug, Clone)]
pub struct Storefront {
    products: Vec<Product>,
    latency: Duration,
}

impl Default for Storefront {
    fn default() -> Self {
        Self {
            products: vec![
                Product::new("SKU-100", "Trail Runner", "shoes", 8_999),
                Product::new("SKU-101", "City Sneaker", "shoes", 6_499),
                Product::new("SKU-200", "Rain Shell", "jackets", 12_900),
                Product::new("SKU-300", "Wool Beanie", "accessories", 1_999),
            ],
            latency: Duration::ZERO,
        }
    }
}

impl Storefront {
    /// Delays every lookup by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn categories(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|p| p.category.as_str())
    }
}

/// Catalog search parameters.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Restricts results to one category.
    pub category: Option<String>,
}

impl CatalogQuery {
    /// Matches every product.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches one category.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }
}

/// Search operation over the [`Storefront`] catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogSearch;

#[async_trait]
impl ContentSearch<Vec<Product>, CatalogQuery, Storefront> for CatalogSearch {
    async fn search(
        &self,
        ctx: &SearchContext<Storefront>,
        query: CatalogQuery,
    ) -> Result<Vec<Product>, SearchError> {
        let store = ctx.api();
        if !store.latency.is_zero() {
            tokio::time::sleep(store.latency).await;
        }

        let Some(category) = query.category else {
            return Ok(store.products.clone());
        };
        if !store.categories().any(|c| c == category) {
            return Err(SearchError::new(format!("unknown category `{category}`")));
        }

        Ok(store
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }
}

/// Maps products to `ProductCard` render components.
///
/// # Errors
///
/// Returns [`RenderError::Json`] if a product fails to serialize.
pub fn product_cards(products: &[Product]) -> Result<Vec<RenderComponent>, RenderError> {
    products
        .iter()
        .map(|product| Ok(RenderComponent::new("ProductCard", serde_json::to_value(product)?)))
        .collect()
}

/// Parses a TTL in milliseconds, falling back to [`DEFAULT_TTL_MS`].
///
/// Zero or negative values cache forever.
#[must_use]
pub fn parse_ttl(raw: Option<&str>) -> CacheTtl {
    let Some(raw) = raw else {
        return CacheTtl::from_millis(DEFAULT_TTL_MS);
    };
    match raw.trim().parse::<i64>() {
        Ok(millis) => CacheTtl::from_millis(millis),
        Err(err) => {
            tracing::warn!(value = raw, error = %err, "invalid {TTL_ENV}, using default");
            CacheTtl::from_millis(DEFAULT_TTL_MS)
        }
    }
}

/// Reads the TTL from [`TTL_ENV`].
#[must_use]
pub fn ttl_from_env() -> CacheTtl {
    parse_ttl(std::env::var(TTL_ENV).ok().as_deref())
}
