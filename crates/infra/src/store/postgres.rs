//! Postgres-backed stores.
//!
//! The stock invariant is enforced in SQL: `reserve` is a single conditional
//! `UPDATE ... WHERE stock_quantity >= $n`, so the check-and-decrement is
//! atomic at the row level and concurrent checkouts contending for the last
//! unit serialize on the row lock. Order insert wraps the order row and its
//! item rows in one transaction.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use velo_cart::CartItem;
use velo_catalog::Variant;
use velo_core::{DomainError, DomainResult, Money, OrderId, UserId, VariantId};
use velo_orders::{Order, OrderItem, OrderStatus};

use super::r#trait::{CartStore, InventoryLedger, OrderStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS variants (
    id UUID PRIMARY KEY,
    sku TEXT NOT NULL UNIQUE,
    unit_price_minor BIGINT NOT NULL CHECK (unit_price_minor >= 0),
    stock_quantity BIGINT NOT NULL CHECK (stock_quantity >= 0),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS cart_items (
    user_id UUID NOT NULL,
    variant_id UUID NOT NULL,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    note TEXT,
    added_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (user_id, variant_id)
);

CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    total_minor BIGINT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS orders_user_created_idx ON orders (user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS order_items (
    order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
    position INT NOT NULL,
    variant_id UUID NOT NULL,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    price_at_purchase_minor BIGINT NOT NULL,
    note TEXT,
    PRIMARY KEY (order_id, position)
);
"#;

/// Create the velo tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> DomainResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

fn map_sqlx_error(op: &str, err: sqlx::Error) -> DomainError {
    DomainError::storage(format!("{op}: {err}"))
}

fn quantity_from_row(row: &PgRow, column: &str) -> DomainResult<u32> {
    let raw: i64 = row
        .try_get(column)
        .map_err(|e| map_sqlx_error("decode quantity", e))?;
    u32::try_from(raw).map_err(|_| DomainError::storage(format!("{column} out of range: {raw}")))
}

fn variant_from_row(row: &PgRow) -> DomainResult<Variant> {
    let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error("decode variant", e))?;
    let sku: String = row.try_get("sku").map_err(|e| map_sqlx_error("decode variant", e))?;
    let price: i64 = row
        .try_get("unit_price_minor")
        .map_err(|e| map_sqlx_error("decode variant", e))?;
    let stock = quantity_from_row(row, "stock_quantity")?;
    let is_active: bool = row
        .try_get("is_active")
        .map_err(|e| map_sqlx_error("decode variant", e))?;
    let created_at = row
        .try_get("created_at")
        .map_err(|e| map_sqlx_error("decode variant", e))?;
    Ok(Variant::from_parts(
        VariantId::from_uuid(id),
        sku,
        Money::from_minor_units(price),
        stock,
        is_active,
        created_at,
    ))
}

/// Postgres inventory ledger.
#[derive(Debug, Clone)]
pub struct PostgresInventoryLedger {
    pool: PgPool,
}

impl PostgresInventoryLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryLedger for PostgresInventoryLedger {
    async fn upsert(&self, variant: Variant) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO variants (id, sku, unit_price_minor, stock_quantity, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                sku = EXCLUDED.sku,
                unit_price_minor = EXCLUDED.unit_price_minor,
                stock_quantity = EXCLUDED.stock_quantity,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(*variant.id().as_uuid())
        .bind(variant.sku())
        .bind(variant.unit_price().minor_units())
        .bind(i64::from(variant.stock_quantity()))
        .bind(variant.is_active())
        .bind(variant.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("variant upsert", e))?;
        Ok(())
    }

    async fn get(&self, variant_id: VariantId) -> DomainResult<Variant> {
        let row = sqlx::query("SELECT * FROM variants WHERE id = $1")
            .bind(*variant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("variant get", e))?
            .ok_or(DomainError::NotFound)?;
        variant_from_row(&row)
    }

    async fn list(&self) -> DomainResult<Vec<Variant>> {
        let rows = sqlx::query("SELECT * FROM variants ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("variant list", e))?;
        rows.iter().map(variant_from_row).collect()
    }

    async fn check_availability(&self, variant_id: VariantId, quantity: u32) -> DomainResult<bool> {
        let row = sqlx::query("SELECT stock_quantity FROM variants WHERE id = $1")
            .bind(*variant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("availability check", e))?
            .ok_or(DomainError::NotFound)?;
        let stock: i64 = row
            .try_get("stock_quantity")
            .map_err(|e| map_sqlx_error("availability check", e))?;
        Ok(stock >= i64::from(quantity))
    }

    async fn reserve(&self, variant_id: VariantId, quantity: u32) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE variants
            SET stock_quantity = stock_quantity - $2
            WHERE id = $1 AND is_active AND stock_quantity >= $2
            "#,
        )
        .bind(*variant_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("reserve", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing updated: missing/inactive variant vs. short stock.
        let row = sqlx::query("SELECT is_active FROM variants WHERE id = $1")
            .bind(*variant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("reserve", e))?;
        match row {
            None => Err(DomainError::VariantUnavailable(variant_id)),
            Some(row) => {
                let is_active: bool = row
                    .try_get("is_active")
                    .map_err(|e| map_sqlx_error("reserve", e))?;
                if is_active {
                    Err(DomainError::InsufficientStock(variant_id))
                } else {
                    Err(DomainError::VariantUnavailable(variant_id))
                }
            }
        }
    }

    async fn release(&self, variant_id: VariantId, quantity: u32) -> DomainResult<()> {
        // No-op when the variant is gone; the snapshot outlives the catalog.
        sqlx::query("UPDATE variants SET stock_quantity = stock_quantity + $2 WHERE id = $1")
            .bind(*variant_id.as_uuid())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("release", e))?;
        Ok(())
    }
}

/// Postgres cart store.
#[derive(Debug, Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn cart_item_from_row(row: &PgRow) -> DomainResult<CartItem> {
    let user_id: Uuid = row
        .try_get("user_id")
        .map_err(|e| map_sqlx_error("decode cart item", e))?;
    let variant_id: Uuid = row
        .try_get("variant_id")
        .map_err(|e| map_sqlx_error("decode cart item", e))?;
    let quantity = quantity_from_row(row, "quantity")?;
    let note: Option<String> = row
        .try_get("note")
        .map_err(|e| map_sqlx_error("decode cart item", e))?;
    let added_at = row
        .try_get("added_at")
        .map_err(|e| map_sqlx_error("decode cart item", e))?;
    CartItem::new(
        UserId::from_uuid(user_id),
        VariantId::from_uuid(variant_id),
        quantity,
        note,
        added_at,
    )
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn items(&self, user_id: UserId) -> DomainResult<Vec<CartItem>> {
        let rows = sqlx::query(
            "SELECT * FROM cart_items WHERE user_id = $1 ORDER BY added_at, variant_id",
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("cart items", e))?;
        rows.iter().map(cart_item_from_row).collect()
    }

    async fn upsert_item(&self, item: CartItem) -> DomainResult<()> {
        // added_at is kept on conflict so the item holds its cart position.
        sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, variant_id, quantity, note, added_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, variant_id) DO UPDATE SET
                quantity = EXCLUDED.quantity,
                note = EXCLUDED.note
            "#,
        )
        .bind(*item.user_id().as_uuid())
        .bind(*item.variant_id().as_uuid())
        .bind(i64::from(item.quantity()))
        .bind(item.note())
        .bind(item.added_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("cart upsert", e))?;
        Ok(())
    }

    async fn remove_item(&self, user_id: UserId, variant_id: VariantId) -> DomainResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND variant_id = $2")
            .bind(*user_id.as_uuid())
            .bind(*variant_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("cart remove", e))?;
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> DomainResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(*user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("cart clear", e))?;
        Ok(())
    }
}

/// Postgres order store.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for(&self, order_id: Uuid) -> DomainResult<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("order items", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let variant_id: Uuid = row
                .try_get("variant_id")
                .map_err(|e| map_sqlx_error("decode order item", e))?;
            let quantity = quantity_from_row(row, "quantity")?;
            let price: i64 = row
                .try_get("price_at_purchase_minor")
                .map_err(|e| map_sqlx_error("decode order item", e))?;
            let note: Option<String> = row
                .try_get("note")
                .map_err(|e| map_sqlx_error("decode order item", e))?;
            items.push(OrderItem::new(
                VariantId::from_uuid(variant_id),
                quantity,
                Money::from_minor_units(price),
                note,
            )?);
        }
        Ok(items)
    }

    async fn order_from_row(&self, row: &PgRow) -> DomainResult<Order> {
        let id: Uuid = row.try_get("id").map_err(|e| map_sqlx_error("decode order", e))?;
        let user_id: Uuid = row
            .try_get("user_id")
            .map_err(|e| map_sqlx_error("decode order", e))?;
        let total: i64 = row
            .try_get("total_minor")
            .map_err(|e| map_sqlx_error("decode order", e))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| map_sqlx_error("decode order", e))?;
        let created_at = row
            .try_get("created_at")
            .map_err(|e| map_sqlx_error("decode order", e))?;
        let items = self.items_for(id).await?;
        Ok(Order::from_parts(
            OrderId::from_uuid(id),
            UserId::from_uuid(user_id),
            items,
            Money::from_minor_units(total),
            status.parse()?,
            created_at,
        ))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: Order) -> DomainResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("order insert", e))?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, total_minor, status, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*order.id().as_uuid())
        .bind(*order.user_id().as_uuid())
        .bind(order.total().minor_units())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("order insert", e))?;

        for (position, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, variant_id, quantity, price_at_purchase_minor, note)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(*order.id().as_uuid())
            .bind(position as i32)
            .bind(*item.variant_id().as_uuid())
            .bind(i64::from(item.quantity()))
            .bind(item.price_at_purchase().minor_units())
            .bind(item.note())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("order insert", e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx_error("order insert", e))
    }

    async fn get(&self, order_id: OrderId) -> DomainResult<Order> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(*order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order get", e))?
            .ok_or(DomainError::NotFound)?;
        self.order_from_row(&row).await
    }

    async fn list_for_user(&self, user_id: UserId) -> DomainResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(*user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order list", e))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(self.order_from_row(row).await?);
        }
        Ok(orders)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DomainResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(*order_id.as_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order status update", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let row = sqlx::query("SELECT status FROM orders WHERE id = $1")
            .bind(*order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("order status update", e))?
            .ok_or(DomainError::NotFound)?;
        let current: String = row
            .try_get("status")
            .map_err(|e| map_sqlx_error("order status update", e))?;
        let current: OrderStatus = current.parse()?;
        Err(DomainError::invalid_transition(current.as_str(), to.as_str()))
    }
}
