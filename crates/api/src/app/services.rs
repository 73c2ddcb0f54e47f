//! Store wiring and service facade.
//!
//! `AppServices` hides which store backend the process is running on: one
//! in-memory variant (default, used by tests and local dev) and one Postgres
//! variant (`USE_PERSISTENT_STORES=true` + `DATABASE_URL`). Handlers only ever
//! talk to the facade methods.

use std::sync::Arc;

use velo_cart::CartItem;
use velo_catalog::Variant;
use velo_checkout::CheckoutEngine;
use velo_core::{DomainResult, OrderId, UserId, VariantId};
use velo_infra::{
    ensure_schema, CartStore, InMemoryCartStore, InMemoryInventoryLedger, InMemoryOrderStore,
    InventoryLedger, OrderStore, PostgresCartStore, PostgresInventoryLedger, PostgresOrderStore,
};
use velo_orders::{Order, OrderStatus};

use sqlx::postgres::PgPoolOptions;

pub enum AppServices {
    InMemory {
        engine: CheckoutEngine<InMemoryInventoryLedger, InMemoryCartStore, InMemoryOrderStore>,
    },
    Persistent {
        engine: CheckoutEngine<PostgresInventoryLedger, PostgresCartStore, PostgresOrderStore>,
    },
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if use_persistent {
        build_persistent_services().await
    } else {
        build_in_memory_services()
    }
}

fn build_in_memory_services() -> AppServices {
    tracing::info!("using in-memory stores");
    AppServices::InMemory {
        engine: CheckoutEngine::new(
            Arc::new(InMemoryInventoryLedger::new()),
            Arc::new(InMemoryCartStore::new()),
            Arc::new(InMemoryOrderStore::new()),
        ),
    }
}

async fn build_persistent_services() -> AppServices {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("failed to connect to DATABASE_URL");

    ensure_schema(&pool)
        .await
        .expect("failed to ensure database schema");

    tracing::info!("using postgres stores");
    AppServices::Persistent {
        engine: CheckoutEngine::new(
            Arc::new(PostgresInventoryLedger::new(pool.clone())),
            Arc::new(PostgresCartStore::new(pool.clone())),
            Arc::new(PostgresOrderStore::new(pool)),
        ),
    }
}

impl AppServices {
    // ---- catalog ----

    pub async fn upsert_variant(&self, variant: Variant) -> DomainResult<()> {
        match self {
            AppServices::InMemory { engine } => engine.ledger().upsert(variant).await,
            AppServices::Persistent { engine } => engine.ledger().upsert(variant).await,
        }
    }

    pub async fn get_variant(&self, variant_id: VariantId) -> DomainResult<Variant> {
        match self {
            AppServices::InMemory { engine } => engine.ledger().get(variant_id).await,
            AppServices::Persistent { engine } => engine.ledger().get(variant_id).await,
        }
    }

    pub async fn list_variants(&self) -> DomainResult<Vec<Variant>> {
        match self {
            AppServices::InMemory { engine } => engine.ledger().list().await,
            AppServices::Persistent { engine } => engine.ledger().list().await,
        }
    }

    /// Admin stock adjustment, expressed through the same atomic ledger ops
    /// checkout uses: positive deltas release, negative deltas reserve (and
    /// fail like checkout does when stock cannot cover them).
    pub async fn adjust_stock(&self, variant_id: VariantId, delta: i64) -> DomainResult<Variant> {
        let quantity = u32::try_from(delta.unsigned_abs())
            .map_err(|_| velo_core::DomainError::validation("delta out of range"))?;
        match self {
            AppServices::InMemory { engine } => {
                if delta >= 0 {
                    engine.ledger().release(variant_id, quantity).await?;
                } else {
                    engine.ledger().reserve(variant_id, quantity).await?;
                }
                engine.ledger().get(variant_id).await
            }
            AppServices::Persistent { engine } => {
                if delta >= 0 {
                    engine.ledger().release(variant_id, quantity).await?;
                } else {
                    engine.ledger().reserve(variant_id, quantity).await?;
                }
                engine.ledger().get(variant_id).await
            }
        }
    }

    // ---- cart ----

    pub async fn cart_items(&self, user_id: UserId) -> DomainResult<Vec<CartItem>> {
        match self {
            AppServices::InMemory { engine } => engine.carts().items(user_id).await,
            AppServices::Persistent { engine } => engine.carts().items(user_id).await,
        }
    }

    pub async fn upsert_cart_item(&self, item: CartItem) -> DomainResult<()> {
        match self {
            AppServices::InMemory { engine } => engine.carts().upsert_item(item).await,
            AppServices::Persistent { engine } => engine.carts().upsert_item(item).await,
        }
    }

    pub async fn remove_cart_item(&self, user_id: UserId, variant_id: VariantId) -> DomainResult<()> {
        match self {
            AppServices::InMemory { engine } => engine.carts().remove_item(user_id, variant_id).await,
            AppServices::Persistent { engine } => {
                engine.carts().remove_item(user_id, variant_id).await
            }
        }
    }

    pub async fn clear_cart(&self, user_id: UserId) -> DomainResult<()> {
        match self {
            AppServices::InMemory { engine } => engine.carts().clear(user_id).await,
            AppServices::Persistent { engine } => engine.carts().clear(user_id).await,
        }
    }

    // ---- checkout / orders ----

    pub async fn place_order(&self, user_id: UserId) -> DomainResult<Order> {
        match self {
            AppServices::InMemory { engine } => engine.place_order(user_id).await,
            AppServices::Persistent { engine } => engine.place_order(user_id).await,
        }
    }

    pub async fn get_order(&self, order_id: OrderId) -> DomainResult<Order> {
        match self {
            AppServices::InMemory { engine } => engine.orders().get(order_id).await,
            AppServices::Persistent { engine } => engine.orders().get(order_id).await,
        }
    }

    pub async fn list_orders(&self, user_id: UserId) -> DomainResult<Vec<Order>> {
        match self {
            AppServices::InMemory { engine } => engine.orders().list_for_user(user_id).await,
            AppServices::Persistent { engine } => engine.orders().list_for_user(user_id).await,
        }
    }

    pub async fn advance_order(&self, order_id: OrderId, target: OrderStatus) -> DomainResult<Order> {
        match self {
            AppServices::InMemory { engine } => engine.advance(order_id, target).await,
            AppServices::Persistent { engine } => engine.advance(order_id, target).await,
        }
    }
}
