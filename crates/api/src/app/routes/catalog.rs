use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use velo_catalog::Variant;
use velo_core::{Money, VariantId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/variants", post(create_variant).get(list_variants))
        .route("/variants/:id", get(get_variant))
        .route("/variants/:id/adjust", post(adjust_stock))
}

pub async fn list_variants(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_variants().await {
        Ok(variants) => Json(
            variants
                .iter()
                .map(dto::variant_json)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let variant_id: VariantId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id")
        }
    };

    match services.get_variant(variant_id).await {
        Ok(variant) => Json(dto::variant_json(&variant)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateVariantRequest>,
) -> axum::response::Response {
    if !user.is_admin() {
        return errors::forbidden();
    }

    let variant = match Variant::new(
        VariantId::new(),
        body.sku,
        Money::from_minor_units(body.unit_price),
        body.stock_quantity,
        Utc::now(),
    ) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let payload = dto::variant_json(&variant);
    if let Err(e) = services.upsert_variant(variant).await {
        return errors::domain_error_to_response(e);
    }

    (StatusCode::CREATED, Json(payload)).into_response()
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    if !user.is_admin() {
        return errors::forbidden();
    }

    let variant_id: VariantId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id")
        }
    };

    match services.adjust_stock(variant_id, body.delta).await {
        Ok(variant) => Json(dto::variant_json(&variant)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
