//! JSON HTTP API over the catalog.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/products` | List every product |
//! | `GET`    | `/products/{id}` | Fetch one product by id |
//! | `GET`    | `/products/slug/{slug}` | Fetch one product by slug |
//! | `POST`   | `/products` | Create a product |
//! | `PATCH`  | `/products/{id}` | Partially update a product |
//! | `PUT`    | `/products/{id}` | Same as `PATCH` |
//! | `DELETE` | `/products/{id}` | Delete a product |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "conflict", "message": "slug 'mug' is already in use" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `conflict` (409),
//! `internal` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::CatalogError;
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::store::CatalogStore;

/// Shared state handed to every handler.
#[derive(Clone)]
struct AppState {
    catalog: Arc<dyn CatalogStore>,
}

/// Builds the router. Split out from [`run_server`] so tests and embedding
/// applications can mount it themselves.
pub fn router(catalog: Arc<dyn CatalogStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/products", get(handle_list).post(handle_create))
        .route("/products/slug/{slug}", get(handle_get_by_slug))
        .route(
            "/products/{id}",
            get(handle_get)
                .patch(handle_update)
                .put(handle_update)
                .delete(handle_delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { catalog })
}

/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config, catalog: Arc<dyn CatalogStore>) -> anyhow::Result<()> {
    let app = router(catalog);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "catalog server listening");
    println!("Catalog server listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let status = if !err.is_client_error() {
            error!(error = %err, "catalog operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        } else if matches!(err, CatalogError::Conflict { .. }) {
            StatusCode::CONFLICT
        } else {
            StatusCode::BAD_REQUEST
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /products ============

#[derive(Serialize)]
struct ProductListResponse {
    products: Vec<Product>,
}

async fn handle_list(State(state): State<AppState>) -> Result<Json<ProductListResponse>, AppError> {
    let products = state.catalog.all_products().await?;
    Ok(Json(ProductListResponse { products }))
}

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    state
        .catalog
        .product_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("product not found: {}", id)))
}

async fn handle_get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, AppError> {
    state
        .catalog
        .product_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("product not found: {}", slug)))
}

async fn handle_create(
    State(state): State<AppState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let Json(data) = payload?;
    let product = state.catalog.create_product(data).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let Json(updates) = payload?;
    state
        .catalog
        .update_product(&id, updates)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("product not found: {}", id)))
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    if state.catalog.delete_product(&id).await? {
        Ok(Json(DeleteResponse { deleted: true }))
    } else {
        Err(not_found(format!("product not found: {}", id)))
    }
}
