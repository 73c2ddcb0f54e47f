use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use velo_cart::CartItem;
use velo_catalog::Variant;
use velo_core::{DomainError, DomainResult, OrderId, UserId, VariantId};
use velo_orders::{Order, OrderStatus};

use super::r#trait::{CartStore, InventoryLedger, OrderStore};

/// In-memory inventory ledger.
///
/// Intended for tests/dev. `reserve` holds the write lock across the whole
/// check-and-decrement, which is the per-variant mutual exclusion the trait
/// demands.
#[derive(Debug, Default)]
pub struct InMemoryInventoryLedger {
    variants: RwLock<HashMap<VariantId, Variant>>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> DomainError {
    DomainError::storage(format!("{what} lock poisoned"))
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn upsert(&self, variant: Variant) -> DomainResult<()> {
        let mut variants = self.variants.write().map_err(|_| poisoned("ledger"))?;
        variants.insert(variant.id(), variant);
        Ok(())
    }

    async fn get(&self, variant_id: VariantId) -> DomainResult<Variant> {
        let variants = self.variants.read().map_err(|_| poisoned("ledger"))?;
        variants.get(&variant_id).cloned().ok_or(DomainError::NotFound)
    }

    async fn list(&self) -> DomainResult<Vec<Variant>> {
        let variants = self.variants.read().map_err(|_| poisoned("ledger"))?;
        let mut all: Vec<Variant> = variants.values().cloned().collect();
        all.sort_by_key(Variant::id);
        Ok(all)
    }

    async fn check_availability(&self, variant_id: VariantId, quantity: u32) -> DomainResult<bool> {
        let variants = self.variants.read().map_err(|_| poisoned("ledger"))?;
        let variant = variants.get(&variant_id).ok_or(DomainError::NotFound)?;
        Ok(variant.stock_quantity() >= quantity)
    }

    async fn reserve(&self, variant_id: VariantId, quantity: u32) -> DomainResult<()> {
        let mut variants = self.variants.write().map_err(|_| poisoned("ledger"))?;
        let variant = variants
            .get_mut(&variant_id)
            .ok_or(DomainError::VariantUnavailable(variant_id))?;
        variant.reserve(quantity)
    }

    async fn release(&self, variant_id: VariantId, quantity: u32) -> DomainResult<()> {
        let mut variants = self.variants.write().map_err(|_| poisoned("ledger"))?;
        if let Some(variant) = variants.get_mut(&variant_id) {
            variant.release(quantity);
        }
        Ok(())
    }
}

/// In-memory cart store. The per-user `Vec` keeps insertion order; upserts
/// replace in place so an item keeps its position.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<UserId, Vec<CartItem>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn items(&self, user_id: UserId) -> DomainResult<Vec<CartItem>> {
        let carts = self.carts.read().map_err(|_| poisoned("cart store"))?;
        Ok(carts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn upsert_item(&self, item: CartItem) -> DomainResult<()> {
        let mut carts = self.carts.write().map_err(|_| poisoned("cart store"))?;
        let cart = carts.entry(item.user_id()).or_default();
        match cart.iter_mut().find(|i| i.variant_id() == item.variant_id()) {
            Some(existing) => *existing = item,
            None => cart.push(item),
        }
        Ok(())
    }

    async fn remove_item(&self, user_id: UserId, variant_id: VariantId) -> DomainResult<()> {
        let mut carts = self.carts.write().map_err(|_| poisoned("cart store"))?;
        if let Some(cart) = carts.get_mut(&user_id) {
            cart.retain(|i| i.variant_id() != variant_id);
        }
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> DomainResult<()> {
        let mut carts = self.carts.write().map_err(|_| poisoned("cart store"))?;
        carts.remove(&user_id);
        Ok(())
    }
}

/// In-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> DomainResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned("order store"))?;
        if orders.contains_key(&order.id()) {
            return Err(DomainError::storage(format!(
                "order {} already exists",
                order.id()
            )));
        }
        orders.insert(order.id(), order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> DomainResult<Order> {
        let orders = self.orders.read().map_err(|_| poisoned("order store"))?;
        orders.get(&order_id).cloned().ok_or(DomainError::NotFound)
    }

    async fn list_for_user(&self, user_id: UserId) -> DomainResult<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned("order store"))?;
        let mut own: Vec<Order> = orders
            .values()
            .filter(|o| o.user_id() == user_id)
            .cloned()
            .collect();
        // Most recent first; OrderId is a v7 uuid, so id order is creation order.
        own.sort_by_key(|o| std::cmp::Reverse(o.id()));
        Ok(own)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DomainResult<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned("order store"))?;
        let order = orders.get_mut(&order_id).ok_or(DomainError::NotFound)?;
        if order.status() != from {
            return Err(DomainError::invalid_transition(
                order.status().as_str(),
                to.as_str(),
            ));
        }
        *order = Order::from_parts(
            order.id(),
            order.user_id(),
            order.items().to_vec(),
            order.total(),
            to,
            order.created_at(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use velo_core::Money;

    use super::*;

    fn variant(stock: u32) -> Variant {
        Variant::new(
            VariantId::new(),
            format!("SKU-{}", VariantId::new()),
            Money::from_minor_units(999),
            stock,
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn reserve_decrements_and_release_restores() {
        let ledger = InMemoryInventoryLedger::new();
        let v = variant(5);
        let id = v.id();
        ledger.upsert(v).await.unwrap();

        ledger.reserve(id, 3).await.unwrap();
        assert_eq!(ledger.get(id).await.unwrap().stock_quantity(), 2);

        ledger.release(id, 3).await.unwrap();
        assert_eq!(ledger.get(id).await.unwrap().stock_quantity(), 5);
    }

    #[tokio::test]
    async fn reserve_more_than_stock_fails_without_mutation() {
        let ledger = InMemoryInventoryLedger::new();
        let v = variant(2);
        let id = v.id();
        ledger.upsert(v).await.unwrap();

        assert_eq!(
            ledger.reserve(id, 3).await.unwrap_err(),
            DomainError::InsufficientStock(id)
        );
        assert_eq!(ledger.get(id).await.unwrap().stock_quantity(), 2);
    }

    #[tokio::test]
    async fn reserve_unknown_variant_is_unavailable() {
        let ledger = InMemoryInventoryLedger::new();
        let id = VariantId::new();
        assert_eq!(
            ledger.reserve(id, 1).await.unwrap_err(),
            DomainError::VariantUnavailable(id)
        );
    }

    #[tokio::test]
    async fn release_on_deleted_variant_is_a_noop_success() {
        let ledger = InMemoryInventoryLedger::new();
        ledger.release(VariantId::new(), 10).await.unwrap();
    }

    #[tokio::test]
    async fn availability_is_read_only() {
        let ledger = InMemoryInventoryLedger::new();
        let v = variant(2);
        let id = v.id();
        ledger.upsert(v).await.unwrap();

        assert!(ledger.check_availability(id, 2).await.unwrap());
        assert!(!ledger.check_availability(id, 3).await.unwrap());
        assert_eq!(ledger.get(id).await.unwrap().stock_quantity(), 2);
        assert_eq!(
            ledger.check_availability(VariantId::new(), 1).await.unwrap_err(),
            DomainError::NotFound
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_reserves_for_last_unit_admit_exactly_one() {
        let ledger = Arc::new(InMemoryInventoryLedger::new());
        let v = variant(1);
        let id = v.id();
        ledger.upsert(v).await.unwrap();

        let n = 8;
        let barrier = Arc::new(tokio::sync::Barrier::new(n));
        let mut handles = Vec::new();
        for _ in 0..n {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                ledger.reserve(id, 1).await
            }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(DomainError::InsufficientStock(failed)) => {
                    assert_eq!(failed, id);
                    insufficient += 1;
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(insufficient, n - 1);
        assert_eq!(ledger.get(id).await.unwrap().stock_quantity(), 0);
    }

    #[tokio::test]
    async fn cart_upsert_replaces_quantity_in_place() {
        let carts = InMemoryCartStore::new();
        let user = UserId::new();
        let first = VariantId::new();
        let second = VariantId::new();

        carts
            .upsert_item(CartItem::new(user, first, 1, None, Utc::now()).unwrap())
            .await
            .unwrap();
        carts
            .upsert_item(CartItem::new(user, second, 2, None, Utc::now()).unwrap())
            .await
            .unwrap();
        carts
            .upsert_item(
                CartItem::new(user, first, 5, Some("rush".into()), Utc::now()).unwrap(),
            )
            .await
            .unwrap();

        let items = carts.items(user).await.unwrap();
        assert_eq!(items.len(), 2);
        // Replacement keeps insertion order.
        assert_eq!(items[0].variant_id(), first);
        assert_eq!(items[0].quantity(), 5);
        assert_eq!(items[0].note(), Some("rush"));
        assert_eq!(items[1].variant_id(), second);
    }

    #[tokio::test]
    async fn cart_removal_and_clear_are_idempotent() {
        let carts = InMemoryCartStore::new();
        let user = UserId::new();
        let variant_id = VariantId::new();

        // Nothing there yet: still success.
        carts.remove_item(user, variant_id).await.unwrap();
        carts.clear(user).await.unwrap();

        carts
            .upsert_item(CartItem::new(user, variant_id, 1, None, Utc::now()).unwrap())
            .await
            .unwrap();
        carts.remove_item(user, variant_id).await.unwrap();
        carts.remove_item(user, variant_id).await.unwrap();
        assert!(carts.items(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn order_status_update_is_compare_and_set() {
        use velo_orders::{OrderItem, OrderStatus};

        let orders = InMemoryOrderStore::new();
        let order = Order::from_snapshot(
            OrderId::new(),
            UserId::new(),
            vec![OrderItem::new(VariantId::new(), 1, Money::from_minor_units(100), None).unwrap()],
            Utc::now(),
        )
        .unwrap();
        let id = order.id();
        orders.insert(order).await.unwrap();

        orders
            .update_status(id, OrderStatus::Pending, OrderStatus::Confirmed)
            .await
            .unwrap();

        // Stale expectation loses the race.
        let err = orders
            .update_status(id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "confirmed",
                to: "cancelled"
            }
        );
        assert_eq!(orders.get(id).await.unwrap().status(), OrderStatus::Confirmed);
    }
}
