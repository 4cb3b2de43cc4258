//! # Catalog Store
//!
//! A flat-file product catalog: an in-memory list of product records
//! mirrored to one pretty-printed JSON document, with slugs as a unique,
//! human-readable alternate key.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐
//! │   CLI    │   │   HTTP   │
//! │(catalog) │   │/products │
//! └────┬─────┘   └────┬─────┘
//!      └──────┬───────┘
//!             ▼
//!     ┌───────────────┐     ┌───────────────┐
//!     │ CatalogStore  │────▶│ products.json │
//!     │ (JsonCatalog) │     └───────────────┘
//!     └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catalog init                                   # create the catalog file
//! catalog create --data '{"name": "Mug", "price": 12}'
//! catalog list --format text
//! catalog slug mug
//! catalog serve                                  # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Product record and create/update payloads |
//! | [`slug`] | Slug normalization |
//! | [`error`] | Catalog error taxonomy |
//! | [`store`] | `CatalogStore` trait and the JSON file backend |
//! | [`server`] | JSON HTTP API |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod server;
pub mod slug;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use models::{NewProduct, Product, ProductUpdate};
pub use store::{CatalogStore, JsonCatalog, LoadPolicy};
