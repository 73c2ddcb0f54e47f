use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use velo_core::{DomainError, OrderId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout", post(checkout))
        .route("/:id", get(get_order))
        .route("/:id/advance", post(advance_order))
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    match services.place_order(user.user_id()).await {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    match services.list_orders(user.user_id()).await {
        Ok(orders) => Json(orders.iter().map(dto::order_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    let order = match services.get_order(order_id).await {
        Ok(order) => order,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // Another user's order is indistinguishable from a missing one.
    if order.user_id() != user.user_id() && !user.is_admin() {
        return errors::domain_error_to_response(DomainError::NotFound);
    }

    Json(dto::order_json(&order)).into_response()
}

pub async fn advance_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdvanceOrderRequest>,
) -> axum::response::Response {
    if !user.is_admin() {
        return errors::forbidden();
    }

    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    match services.advance_order(order_id, body.status).await {
        Ok(order) => Json(dto::order_json(&order)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
