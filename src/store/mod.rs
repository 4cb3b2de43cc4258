//! Storage abstraction for the product catalog.
//!
//! The [`CatalogStore`] trait is the seam between the catalog and its
//! callers (the HTTP server and the CLI). Callers hold an
//! `Arc<dyn CatalogStore>` that was constructed explicitly at startup;
//! there is no process-global instance.
//!
//! [`JsonCatalog`] is the file-backed implementation: the whole catalog
//! lives in memory and is mirrored to a single pretty-printed JSON array
//! on every mutation.
//!
//! # Operations
//!
//! | Method | Misses |
//! |--------|--------|
//! | [`all_products`](CatalogStore::all_products) | — |
//! | [`product_by_id`](CatalogStore::product_by_id) | `Ok(None)` |
//! | [`product_by_slug`](CatalogStore::product_by_slug) | `Ok(None)` |
//! | [`create_product`](CatalogStore::create_product) | — |
//! | [`update_product`](CatalogStore::update_product) | `Ok(None)` |
//! | [`delete_product`](CatalogStore::delete_product) | `Ok(false)` |

pub mod json_file;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CatalogResult;
use crate::models::{NewProduct, Product, ProductUpdate};

pub use json_file::JsonCatalog;

/// What to do when the catalog file exists but cannot be read or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Log a warning, start from an empty catalog and overwrite the file.
    #[default]
    Reset,
    /// Refuse to start: every operation returns
    /// [`CatalogError::Corrupt`](crate::error::CatalogError::Corrupt) until
    /// the file is fixed.
    Fail,
}

/// Abstract product catalog.
///
/// Every operation waits for the backing data to be loaded first. Not
/// finding a record is never an error.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// The full catalog, in insertion order.
    async fn all_products(&self) -> CatalogResult<Vec<Product>>;

    /// Exact-match lookup by id.
    async fn product_by_id(&self, id: &str) -> CatalogResult<Option<Product>>;

    /// Exact-match lookup by slug.
    async fn product_by_slug(&self, slug: &str) -> CatalogResult<Option<Product>>;

    /// Creates a product, assigning its id, slug and timestamps.
    ///
    /// Fails with a validation error when the name is missing and with a
    /// conflict when the slug is taken.
    async fn create_product(&self, data: NewProduct) -> CatalogResult<Product>;

    /// Shallow-merges `updates` into the product with the given id.
    ///
    /// Returns `Ok(None)` when no product has that id.
    async fn update_product(
        &self,
        id: &str,
        updates: ProductUpdate,
    ) -> CatalogResult<Option<Product>>;

    /// Removes the product with the given id, returning whether one existed.
    async fn delete_product(&self, id: &str) -> CatalogResult<bool>;
}
