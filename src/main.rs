//! # Catalog CLI (`catalog`)
//!
//! Admin interface to the product catalog, and the entry point for the
//! HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! catalog --config ./config/catalog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog init` | Create the catalog file if it does not exist |
//! | `catalog list` | Print every product |
//! | `catalog get <id>` | Print one product by id |
//! | `catalog slug <slug>` | Print one product by slug |
//! | `catalog create --data '<json>'` | Create a product |
//! | `catalog update <id> --data '<json>'` | Partially update a product |
//! | `catalog delete <id>` | Delete a product |
//! | `catalog serve` | Start the HTTP server |

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use catalog_store::config::{self, Config};
use catalog_store::{logging, server};
use catalog_store::{CatalogStore, JsonCatalog, NewProduct, Product, ProductUpdate};

/// Catalog CLI: manage a flat-file product catalog and serve it over HTTP.
#[derive(Parser)]
#[command(
    name = "catalog",
    about = "Manage a flat-file product catalog and serve it over HTTP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    /// Catalog file to use instead of `[store].path`.
    ///
    /// When given and the config file does not exist, defaults are used for
    /// everything else.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog file if it does not exist yet.
    Init,

    /// Print every product.
    List {
        /// `json` (pretty-printed array) or `text` (one line per product).
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Print a product by id.
    Get {
        /// Product id.
        id: String,
    },

    /// Print a product by slug.
    Slug {
        /// Product slug, e.g. `hand-thrown-mug`.
        slug: String,
    },

    /// Create a product from a JSON object. Only `name` is required.
    Create {
        /// Product fields as JSON, e.g. `{"name": "Mug", "price": 12}`.
        #[arg(long)]
        data: String,
    },

    /// Merge a JSON object into an existing product.
    Update {
        /// Product id.
        id: String,

        /// Fields to change as JSON, e.g. `{"price": 15}`.
        #[arg(long)]
        data: String,
    },

    /// Delete a product by id.
    Delete {
        /// Product id.
        id: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.store {
        Some(store) if !cli.config.exists() => Ok(Config::with_store_path(store)),
        Some(store) => {
            let mut cfg = config::load_config(&cli.config)?;
            cfg.store.path = store.clone();
            Ok(cfg)
        }
        None => config::load_config(&cli.config),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_text(products: &[Product]) {
    if products.is_empty() {
        println!("No products.");
        return;
    }
    for p in products {
        println!(
            "{}  {:<32}  {:>10.2}  {}",
            p.id, p.slug, p.price, p.name
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;
    logging::init(&cfg.logging);

    let catalog = JsonCatalog::new(cfg.store.path.clone()).with_policy(cfg.store.on_corrupt);

    match cli.command {
        Commands::Init => {
            let count = catalog.all_products().await?.len();
            println!(
                "Catalog ready at {} ({} products).",
                catalog.path().display(),
                count
            );
        }
        Commands::List { format } => {
            let products = catalog.all_products().await?;
            match format {
                OutputFormat::Json => print_json(&products)?,
                OutputFormat::Text => print_text(&products),
            }
        }
        Commands::Get { id } => match catalog.product_by_id(&id).await? {
            Some(product) => print_json(&product)?,
            None => bail!("product not found: {}", id),
        },
        Commands::Slug { slug } => match catalog.product_by_slug(&slug).await? {
            Some(product) => print_json(&product)?,
            None => bail!("product not found: {}", slug),
        },
        Commands::Create { data } => {
            let data: NewProduct =
                serde_json::from_str(&data).context("--data must be a JSON object")?;
            let product = catalog.create_product(data).await?;
            print_json(&product)?;
        }
        Commands::Update { id, data } => {
            let updates: ProductUpdate =
                serde_json::from_str(&data).context("--data must be a JSON object")?;
            match catalog.update_product(&id, updates).await? {
                Some(product) => print_json(&product)?,
                None => bail!("product not found: {}", id),
            }
        }
        Commands::Delete { id } => {
            if catalog.delete_product(&id).await? {
                println!("Deleted {}.", id);
            } else {
                println!("No product with id {}.", id);
            }
        }
        Commands::Serve => {
            let catalog: Arc<dyn CatalogStore> = Arc::new(catalog);
            // Load before accepting traffic so a corrupt file fails at startup.
            catalog.all_products().await?;
            server::run_server(&cfg, catalog).await?;
        }
    }

    Ok(())
}
