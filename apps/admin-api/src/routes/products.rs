//! # Product Administration
//!
//! Admin-only product endpoints.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PUT /api/products/{id}/sizes                                           │
//! │       │                                                                 │
//! │       ├── { "sizes": {"S": 3, "M": 0} } ──► ledger.set_size_inventory  │
//! │       └── { "inventory": 6 }            ──► ledger.set_unsized_inventory│
//! │                                                                         │
//! │  Descriptive edits (PUT /api/products/{id}) never touch stock.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Prices cross the wire as decimal strings (`"64.00"`).

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{self, ADMIN};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use swell_core::catalog::classify_product_type;
use swell_core::validation::{
    validate_item_number, validate_price_cents, validate_size_inventory, validate_title,
};
use swell_core::{Money, Product, ProductType, SizeInventory};
use swell_db::{ImportReport, ImportRow};

/// Product as the admin UI sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub product_type: ProductType,
    /// Decimal string, e.g. `"64.00"`.
    pub price: String,
    pub image_url: Option<String>,
    pub size_inventory: SizeInventory,
    pub inventory: u32,
    pub item_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            price: p.price().to_decimal_string(),
            id: p.id,
            title: p.title,
            description: p.description,
            product_type: p.product_type,
            image_url: p.image_url,
            size_inventory: p.size_inventory,
            inventory: p.inventory,
            item_number: p.item_number,
            updated_at: p.updated_at,
        }
    }
}

/// Create and edit payload.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Classified from the title when absent.
    pub product_type: Option<ProductType>,
    pub price: String,
    pub item_number: Option<String>,
    pub image_url: Option<String>,
}

struct ValidInput {
    title: String,
    description: String,
    product_type: ProductType,
    price: Money,
    item_number: Option<String>,
    image_url: Option<String>,
}

fn validate(input: ProductInput) -> ApiResult<ValidInput> {
    validate_title(&input.title)?;
    let price = Money::parse_decimal(&input.price)?;
    validate_price_cents(price.cents())?;

    let item_number = input
        .item_number
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(item_number) = &item_number {
        validate_item_number(item_number)?;
    }

    let title = input.title.trim().to_string();
    Ok(ValidInput {
        product_type: input
            .product_type
            .unwrap_or_else(|| classify_product_type(&title)),
        title,
        description: input.description.trim().to_string(),
        price,
        item_number,
        image_url: input.image_url.filter(|s| !s.trim().is_empty()),
    })
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<ProductDto>)> {
    auth::require(&state, &headers, ADMIN)?;
    let valid = validate(input)?;

    let mut product = Product::new(valid.title, valid.product_type, valid.price, Utc::now());
    product.description = valid.description;
    product.item_number = valid.item_number;
    product.image_url = valid.image_url;

    let product = state.db.products().insert(&product).await?;
    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ProductDto>>> {
    auth::require(&state, &headers, ADMIN)?;
    let products = state.db.products().list_active().await?;
    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

async fn load_live(state: &AppState, id: &str) -> ApiResult<Product> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// `GET /api/products/{id}`
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDto>> {
    auth::require(&state, &headers, ADMIN)?;
    Ok(Json(load_live(&state, &id).await?.into()))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<ProductDto>> {
    auth::require(&state, &headers, ADMIN)?;
    let valid = validate(input)?;

    let mut product = load_live(&state, &id).await?;
    product.title = valid.title;
    product.description = valid.description;
    product.product_type = valid.product_type;
    product.price_cents = valid.price.cents();
    product.item_number = valid.item_number;
    if valid.image_url.is_some() {
        product.image_url = valid.image_url;
    }

    let product = state.db.products().update_details(&product).await?;
    Ok(Json(product.into()))
}

/// Stock payload: a size map, or an aggregate for size-less products.
#[derive(Debug, Deserialize)]
pub struct StockInput {
    pub sizes: Option<SizeInventory>,
    pub inventory: Option<u32>,
}

/// `PUT /api/products/{id}/sizes`
pub async fn set_sizes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<StockInput>,
) -> ApiResult<Json<ProductDto>> {
    auth::require(&state, &headers, ADMIN)?;
    load_live(&state, &id).await?;

    let ledger = state.db.ledger();
    let product = match (input.sizes, input.inventory) {
        (Some(sizes), _) => {
            validate_size_inventory(&sizes)?;
            ledger.set_size_inventory(&id, sizes).await?
        }
        (None, Some(quantity)) => ledger.set_unsized_inventory(&id, quantity).await?,
        (None, None) => return Err(ApiError::validation("sizes or inventory is required")),
    };

    info!(product_id = %id, inventory = product.inventory, "Stock set");
    Ok(Json(product.into()))
}

/// `DELETE /api/products/{id}`
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    auth::require(&state, &headers, ADMIN)?;
    state.db.products().soft_delete(&id).await?;
    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/products/import`
///
/// The admin UI parses the spreadsheet and posts its rows as JSON.
pub async fn import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(rows): Json<Vec<ImportRow>>,
) -> ApiResult<Json<ImportReport>> {
    auth::require(&state, &headers, ADMIN)?;
    Ok(Json(state.db.importer().import(rows).await?))
}
