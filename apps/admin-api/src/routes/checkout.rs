//! # Order Front Doors
//!
//! Both entry points end in the same fulfillment call.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/checkout/complete  (web, after payment capture)             │
//! │  POST /api/pos/sales          (staff / admin at the counter)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate lines and sizes, freeze title + price from the product table │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderFulfillment::fulfill  ── decrement each line ──► insert order    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Prices always come from the product table, never from the request.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::auth::{self, STAFF};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use swell_core::validation::{validate_email, validate_line_count, validate_quantity};
use swell_core::{LineItem, Money, OrderChannel, OrderDraft, OrderItem};
use swell_db::FulfillmentResult;

#[derive(Debug, Deserialize)]
pub struct CheckoutInput {
    pub customer_name: String,
    pub customer_email: String,
    /// Decimal string; free shipping when absent.
    pub shipping_cost: Option<String>,
    pub payment_reference: Option<String>,
    pub items: Vec<LineItem>,
}

/// `POST /api/checkout/complete`
pub async fn complete(
    State(state): State<AppState>,
    Json(input): Json<CheckoutInput>,
) -> ApiResult<(StatusCode, Json<FulfillmentResult>)> {
    if input
        .payment_reference
        .as_deref()
        .map_or(true, |r| r.trim().is_empty())
    {
        return Err(ApiError::validation("payment_reference is required"));
    }
    place(&state, input, OrderChannel::Web).await
}

/// `POST /api/pos/sales`
pub async fn pos_sale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CheckoutInput>,
) -> ApiResult<(StatusCode, Json<FulfillmentResult>)> {
    auth::require(&state, &headers, STAFF)?;
    place(&state, input, OrderChannel::Pos).await
}

async fn place(
    state: &AppState,
    input: CheckoutInput,
    channel: OrderChannel,
) -> ApiResult<(StatusCode, Json<FulfillmentResult>)> {
    let draft = build_draft(state, input, channel).await?;
    let lines = draft.line_items();

    let result = state.db.fulfillment().fulfill(draft, lines).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn build_draft(
    state: &AppState,
    input: CheckoutInput,
    channel: OrderChannel,
) -> ApiResult<OrderDraft> {
    if input.items.is_empty() {
        return Err(ApiError::validation("order has no items"));
    }
    validate_line_count(input.items.len())?;
    validate_email(&input.customer_email)?;
    if input.customer_name.trim().is_empty() {
        return Err(ApiError::validation("customer_name is required"));
    }

    let shipping = match input.shipping_cost.as_deref() {
        Some(s) if !s.trim().is_empty() => Money::parse_decimal(s)?,
        _ => Money::zero(),
    };

    let products = state.db.products();
    let mut items = Vec::with_capacity(input.items.len());
    for line in input.items {
        validate_quantity(line.quantity)?;
        let product = products
            .get_by_id(&line.product_id)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| ApiError::not_found("Product", &line.product_id))?;

        let size = line.size.trim();
        let stocked = if product.has_sizes() {
            product.size_inventory.get(size).is_some()
        } else {
            size.is_empty()
        };
        if !stocked {
            return Err(ApiError::validation(format!(
                "{} has no size '{}'",
                product.title, size
            )));
        }

        items.push(OrderItem {
            product_id: product.id,
            title: product.title,
            quantity: line.quantity,
            price_cents: product.price_cents,
            size: size.to_string(),
            image: product.image_url,
        });
    }

    let draft = OrderDraft {
        customer_name: input.customer_name.trim().to_string(),
        customer_email: input.customer_email.trim().to_string(),
        shipping_cost_cents: shipping.cents(),
        channel,
        payment_reference: input.payment_reference,
        items,
    };
    draft.total()?;
    Ok(draft)
}
