//! Storefront demo CLI.
//!
//! Wires a server with the default plugins and `ContentPlugin`, then drives
//! two widgets that share the `productList` identity.
//!
//! # Usage
//!
//! ```bash
//! CACHET_TTL_MS=5000 storefront
//! ```

use std::sync::Arc;
use std::time::Duration;

use cachet_content::{ContentFactory, ContentPlugin, RenderContentFactory, RenderNode};
use cachet_core_plugins::{DefaultPlugins, TracingFormat, TracingPlugin};
use cachet_system::plugin::PluginGroup;
use cachet_system::server::Server;
use example::{CatalogQuery, CatalogSearch, Product, Storefront, product_cards, ttl_from_env};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let mut server = Server::new();
    server
        .add_plugins(DefaultPlugins.build().disable::<TracingPlugin>())
        .add_plugins(
            TracingPlugin::default()
                .with_format(TracingFormat::Compact)
                .with_env_filter("info,cachet_content=debug"),
        )
        .add_plugins(ContentPlugin::default().with_default_ttl(ttl_from_env()));
    server.finish();

    let factory = match ContentFactory::from_server(&server, CatalogSearch) {
        Ok(factory) => factory.with_api(Arc::new(
            Storefront::default().with_latency(Duration::from_millis(50)),
        )),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let widgets = factory
        .use_content_default("productList")
        .and_then(|header| Ok((header, factory.use_content_default("productList")?)));
    let (header, grid) = match widgets {
        Ok(widgets) => widgets,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let _loading = grid.loading().subscribe(|loading: &bool| {
        tracing::info!(loading = *loading, "grid loading changed");
    });

    // The header fetches; the grid is served from the shared cache.
    header.search(CatalogQuery::all()).await;
    grid.search(CatalogQuery::all()).await;
    tracing::info!(
        products = grid.content().with(Vec::len),
        fetched_at = ?grid.cache_timestamp().get(),
        "grid ready"
    );

    // A failed refresh keeps the previous listing.
    grid.force_search(CatalogQuery::category("hats")).await;
    if let Some(err) = grid.error().get().search {
        tracing::warn!(error = %err, products = header.content().with(Vec::len), "refresh failed");
    }

    grid.force_search(CatalogQuery::category("shoes")).await;

    let cards = RenderContentFactory::new(|products: &Vec<Product>| product_cards(products));
    let add_to_cart = [RenderNode::element("AddToCartButton")];
    match cards
        .render_view(&header.content(), &add_to_cart)
        .map_err(|e| e.to_string())
        .and_then(|tree| serde_json::to_string_pretty(&tree).map_err(|e| e.to_string()))
    {
        Ok(json) => tracing::info!(tree = %json, "rendered product grid"),
        Err(e) => tracing::error!(error = %e, "render failed"),
    }

    server.cleanup();
}
