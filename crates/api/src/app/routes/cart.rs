use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use chrono::Utc;

use velo_cart::CartItem;
use velo_core::{DomainError, Money, VariantId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", put(upsert_item))
        .route("/items/:variant_id", delete(remove_item))
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    let items = match services.cart_items(user.user_id()).await {
        Ok(items) => items,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // Subtotal is advisory: it reflects prices at read time, not the prices
    // a later checkout will snapshot.
    let mut subtotal = Money::ZERO;
    let mut rendered = Vec::with_capacity(items.len());
    for item in &items {
        let unit_price = match services.get_variant(item.variant_id()).await {
            Ok(variant) => Some(variant.unit_price()),
            Err(DomainError::NotFound) => None,
            Err(e) => return errors::domain_error_to_response(e),
        };
        if let Some(price) = unit_price {
            subtotal = match price
                .checked_mul(item.quantity())
                .and_then(|line| subtotal.checked_add(line))
            {
                Some(total) => total,
                None => {
                    return errors::domain_error_to_response(DomainError::validation(
                        "cart subtotal overflows",
                    ))
                }
            };
        }
        rendered.push(dto::cart_item_json(item, unit_price));
    }

    Json(serde_json::json!({
        "items": rendered,
        "subtotal": subtotal.minor_units(),
        "subtotal_display": subtotal.to_string(),
    }))
    .into_response()
}

pub async fn upsert_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::UpsertCartItemRequest>,
) -> axum::response::Response {
    // The variant must exist and be active to enter a cart; stock is only
    // checked at checkout.
    let variant = match services.get_variant(body.variant_id).await {
        Ok(v) => v,
        Err(DomainError::NotFound) => {
            return errors::domain_error_to_response(DomainError::VariantUnavailable(
                body.variant_id,
            ))
        }
        Err(e) => return errors::domain_error_to_response(e),
    };
    if !variant.is_active() {
        return errors::domain_error_to_response(DomainError::VariantUnavailable(body.variant_id));
    }

    let item = match CartItem::new(
        user.user_id(),
        body.variant_id,
        body.quantity,
        body.note,
        Utc::now(),
    ) {
        Ok(item) => item,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.upsert_cart_item(item).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(variant_id): Path<String>,
) -> axum::response::Response {
    let variant_id: VariantId = match variant_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id")
        }
    };

    match services.remove_cart_item(user.user_id(), variant_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn clear_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    match services.clear_cart(user.user_id()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
