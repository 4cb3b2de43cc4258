//! File-backed [`CatalogStore`] implementation.
//!
//! The catalog is a single JSON array on disk. It is read once, the first
//! time any operation runs (or eagerly via [`JsonCatalog::open`]), and then
//! served from memory. Every successful mutation rewrites the whole file.
//!
//! The collection sits behind a `tokio::sync::OnceCell`, so concurrent
//! callers arriving before the load finishes all wait on the same load.
//! A failed load is not latched and the next call tries again.
//!
//! Entries are converted leniently (see [`Product::from_stored`]). An entry
//! that still cannot be used fails the load with
//! [`CatalogError::Corrupt`] whatever the [`LoadPolicy`], so valid JSON is
//! never replaced by an empty catalog. Under [`LoadPolicy::Reset`] an
//! unparseable file is copied to [`JsonCatalog::backup_path`] before the
//! reset.
//!
//! Mutations hold the write lock across validation, the file write and the
//! in-memory commit. If the write fails the in-memory change is rolled back.
//! There is no file locking: two processes pointed at the same file will
//! overwrite each other.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use super::{CatalogStore, LoadPolicy};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{self, NewProduct, Product, ProductUpdate};
use crate::slug;

/// Product catalog persisted as one pretty-printed JSON document.
pub struct JsonCatalog {
    path: PathBuf,
    policy: LoadPolicy,
    products: OnceCell<RwLock<Vec<Product>>>,
}

impl JsonCatalog {
    /// Creates a catalog backed by `path`. Nothing is read until the first
    /// operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: LoadPolicy::default(),
            products: OnceCell::new(),
        }
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a catalog and loads it immediately.
    ///
    /// If the file does not exist it is created holding an empty array.
    pub async fn open(path: impl Into<PathBuf>, policy: LoadPolicy) -> CatalogResult<Self> {
        let catalog = Self::new(path).with_policy(policy);
        catalog.ready().await?;
        Ok(catalog)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file has been loaded.
    pub fn is_ready(&self) -> bool {
        self.products.initialized()
    }

    async fn ready(&self) -> CatalogResult<&RwLock<Vec<Product>>> {
        self.products
            .get_or_try_init(|| async { self.load().await.map(RwLock::new) })
            .await
    }

    async fn load(&self) -> CatalogResult<Vec<Product>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "catalog file not found, creating empty catalog");
                self.persist(&[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => return self.recover(e.to_string()).await,
        };

        // Only an unparseable document goes to `recover`. Entries that parse
        // as JSON but not as products must never trigger a reset.
        let entries = match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(entries) => entries,
            Err(e) => return self.recover(e.to_string()).await,
        };

        let products = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                Product::from_stored(entry).map_err(|e| CatalogError::Corrupt {
                    path: self.path.clone(),
                    reason: format!("entry {}: {}", index, e),
                })
            })
            .collect::<CatalogResult<Vec<_>>>()?;

        warn_on_duplicate_slugs(&products);
        info!(
            path = %self.path.display(),
            count = products.len(),
            "catalog loaded"
        );
        Ok(products)
    }

    async fn recover(&self, reason: String) -> CatalogResult<Vec<Product>> {
        match self.policy {
            LoadPolicy::Fail => Err(CatalogError::Corrupt {
                path: self.path.clone(),
                reason,
            }),
            LoadPolicy::Reset => {
                let backup = self.backup_path();
                tokio::fs::copy(&self.path, &backup)
                    .await
                    .map_err(|source| CatalogError::Io {
                        path: backup.clone(),
                        source,
                    })?;
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    %reason,
                    "catalog file unreadable, resetting to an empty catalog"
                );
                self.persist(&[]).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Where an unreadable catalog is copied before being reset:
    /// `products.json` becomes `products.json.corrupt`.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    async fn persist(&self, products: &[Product]) -> CatalogResult<()> {
        let json = serde_json::to_string_pretty(products)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| self.io_error(source))?;
            }
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), count = products.len(), "catalog saved");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Normalizes `source` and rejects text with nothing slug-worthy in it.
fn slug_from(source: &str) -> CatalogResult<String> {
    let slug = slug::normalize(source);
    if slug.is_empty() {
        return Err(CatalogError::validation(format!(
            "'{}' does not contain any letters or digits to build a slug from",
            source
        )));
    }
    Ok(slug)
}

fn warn_on_duplicate_slugs(products: &[Product]) {
    let mut seen = std::collections::HashSet::new();
    for p in products {
        if !seen.insert(p.slug.as_str()) {
            warn!(slug = %p.slug, id = %p.id, "duplicate slug in catalog file");
        }
    }
}

#[async_trait]
impl CatalogStore for JsonCatalog {
    async fn all_products(&self) -> CatalogResult<Vec<Product>> {
        let products = self.ready().await?.read().await;
        Ok(products.clone())
    }

    async fn product_by_id(&self, id: &str) -> CatalogResult<Option<Product>> {
        let products = self.ready().await?.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_by_slug(&self, slug: &str) -> CatalogResult<Option<Product>> {
        let products = self.ready().await?.read().await;
        Ok(products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create_product(&self, data: NewProduct) -> CatalogResult<Product> {
        let mut products = self.ready().await?.write().await;

        let name = data.required_name()?;
        let slug = slug_from(data.explicit_slug().unwrap_or(name))?;
        if products.iter().any(|p| p.slug == slug) {
            return Err(CatalogError::conflict(slug));
        }

        let product = data.into_product(uuid::Uuid::new_v4().to_string(), slug, models::now())?;
        products.push(product.clone());
        if let Err(e) = self.persist(&products).await {
            products.pop();
            return Err(e);
        }

        info!(id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &str,
        updates: ProductUpdate,
    ) -> CatalogResult<Option<Product>> {
        let mut products = self.ready().await?.write().await;

        let Some(index) = products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        updates.validate()?;

        let current_slug = products[index].slug.clone();
        let slug = match updates.slug_source() {
            Some(source) => {
                let candidate = slug_from(source)?;
                if candidate != current_slug
                    && products.iter().any(|p| p.id != id && p.slug == candidate)
                {
                    return Err(CatalogError::conflict(candidate));
                }
                candidate
            }
            None => current_slug,
        };

        let mut updated = products[index].clone();
        updated.apply(updates, slug, models::now())?;

        let previous = std::mem::replace(&mut products[index], updated.clone());
        if let Err(e) = self.persist(&products).await {
            products[index] = previous;
            return Err(e);
        }

        info!(id = %updated.id, slug = %updated.slug, "product updated");
        Ok(Some(updated))
    }

    async fn delete_product(&self, id: &str) -> CatalogResult<bool> {
        let mut products = self.ready().await?.write().await;

        let Some(index) = products.iter().position(|p| p.id == id) else {
            debug!(%id, "delete requested for unknown product");
            return Ok(false);
        };

        let removed = products.remove(index);
        if let Err(e) = self.persist(&products).await {
            products.insert(index, removed);
            return Err(e);
        }

        info!(id = %removed.id, slug = %removed.slug, "product deleted");
        Ok(true)
    }
}
