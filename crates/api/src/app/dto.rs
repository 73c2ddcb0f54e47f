use serde::Deserialize;
use serde_json::{json, Value};

use velo_cart::CartItem;
use velo_catalog::Variant;
use velo_core::{Money, VariantId};
use velo_orders::{Order, OrderStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub sku: String,
    /// Minor currency units (cents).
    pub unit_price: i64,
    pub stock_quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpsertCartItemRequest {
    pub variant_id: VariantId,
    pub quantity: u32,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceOrderRequest {
    pub status: OrderStatus,
}

// -------------------------
// Response mapping
// -------------------------

pub fn variant_json(variant: &Variant) -> Value {
    json!({
        "id": variant.id().to_string(),
        "sku": variant.sku(),
        "unit_price": variant.unit_price().minor_units(),
        "unit_price_display": variant.unit_price().to_string(),
        "stock_quantity": variant.stock_quantity(),
        "is_active": variant.is_active(),
        "created_at": variant.created_at(),
    })
}

/// Cart item with the price attached when the variant still exists; a removed
/// variant renders with a null price and contributes nothing to the subtotal.
pub fn cart_item_json(item: &CartItem, unit_price: Option<Money>) -> Value {
    json!({
        "variant_id": item.variant_id().to_string(),
        "quantity": item.quantity(),
        "note": item.note(),
        "added_at": item.added_at(),
        "unit_price": unit_price.map(Money::minor_units),
    })
}

pub fn order_json(order: &Order) -> Value {
    json!({
        "id": order.id().to_string(),
        "status": order.status(),
        "total": order.total().minor_units(),
        "total_display": order.total().to_string(),
        "created_at": order.created_at(),
        "items": order.items().iter().map(|item| json!({
            "variant_id": item.variant_id().to_string(),
            "quantity": item.quantity(),
            "price_at_purchase": item.price_at_purchase().minor_units(),
            "note": item.note(),
        })).collect::<Vec<_>>(),
    })
}
