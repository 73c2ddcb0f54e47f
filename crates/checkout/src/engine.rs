//! Checkout engine and order lifecycle manager.
//!
//! `place_order` is structured as reserve-then-persist with compensating
//! releases:
//!
//! 1. read the cart; empty cart fails fast
//! 2. snapshot each variant's current price (missing or inactive variant
//!    fails the whole checkout)
//! 3. reserve stock per line, in ascending `VariantId` order so overlapping
//!    checkouts acquire variants in a consistent order
//! 4. on any reservation failure, release every reservation made so far and
//!    return the error untouched
//! 5. persist the order (status `pending`); a persist failure also releases
//!    all reservations
//! 6. clear the cart
//!
//! There is no retry anywhere in this flow: a failed checkout leaves ledger
//! and cart exactly as they were, and the caller decides what to do next.

use std::sync::Arc;

use chrono::Utc;

use velo_core::{DomainError, DomainResult, OrderId, UserId, VariantId};
use velo_infra::{CartStore, InventoryLedger, OrderStore};
use velo_orders::{validate_transition, CancellationPolicy, Order, OrderItem, OrderStatus};

/// Converts carts into orders and drives orders through the status graph.
///
/// Generic over the store traits; the API wires in either the in-memory or
/// the Postgres implementations.
pub struct CheckoutEngine<L, C, O>
where
    L: InventoryLedger,
    C: CartStore,
    O: OrderStore,
{
    ledger: Arc<L>,
    carts: Arc<C>,
    orders: Arc<O>,
    policy: CancellationPolicy,
}

impl<L, C, O> CheckoutEngine<L, C, O>
where
    L: InventoryLedger,
    C: CartStore,
    O: OrderStore,
{
    pub fn new(ledger: Arc<L>, carts: Arc<C>, orders: Arc<O>) -> Self {
        Self::with_policy(ledger, carts, orders, CancellationPolicy::default())
    }

    pub fn with_policy(
        ledger: Arc<L>,
        carts: Arc<C>,
        orders: Arc<O>,
        policy: CancellationPolicy,
    ) -> Self {
        Self {
            ledger,
            carts,
            orders,
            policy,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn carts(&self) -> &C {
        &self.carts
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Convert the user's cart into a `pending` order.
    ///
    /// All-or-nothing: either an order is persisted with all its stock
    /// reserved and the cart cleared, or nothing changed. The one documented
    /// exception is a cart-clear failure after a successful persist, which
    /// surfaces as `Storage` but leaves the order (and its reservations)
    /// standing.
    pub async fn place_order(&self, user_id: UserId) -> DomainResult<Order> {
        let items = self.carts.items(user_id).await?;
        if items.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        // Price snapshot, in cart order. Prices read here are the prices the
        // order keeps forever.
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let variant = match self.ledger.get(item.variant_id()).await {
                Ok(variant) => variant,
                Err(DomainError::NotFound) => {
                    return Err(DomainError::VariantUnavailable(item.variant_id()));
                }
                Err(err) => return Err(err),
            };
            if !variant.is_active() {
                return Err(DomainError::VariantUnavailable(variant.id()));
            }
            lines.push(OrderItem::new(
                item.variant_id(),
                item.quantity(),
                variant.unit_price(),
                item.note().map(str::to_owned),
            )?);
        }

        // Reserve in ascending variant id order.
        let mut plan: Vec<(VariantId, u32)> = lines
            .iter()
            .map(|line| (line.variant_id(), line.quantity()))
            .collect();
        plan.sort_by_key(|(variant_id, _)| *variant_id);

        let mut reserved: Vec<(VariantId, u32)> = Vec::with_capacity(plan.len());
        for (variant_id, quantity) in plan {
            if let Err(err) = self.ledger.reserve(variant_id, quantity).await {
                tracing::warn!(
                    "Checkout for user {} failed reserving variant {}: {}; releasing {} reservation(s)",
                    user_id,
                    variant_id,
                    err,
                    reserved.len()
                );
                self.release_all(&reserved).await;
                return Err(err);
            }
            reserved.push((variant_id, quantity));
        }

        let order = match Order::from_snapshot(OrderId::new(), user_id, lines, Utc::now()) {
            Ok(order) => order,
            Err(err) => {
                self.release_all(&reserved).await;
                return Err(err);
            }
        };

        if let Err(err) = self.orders.insert(order.clone()).await {
            tracing::warn!(
                "Order persist failed for user {}: {}; releasing {} reservation(s)",
                user_id,
                err,
                reserved.len()
            );
            self.release_all(&reserved).await;
            return Err(err);
        }

        // The order exists from here on. A failed cart clear is surfaced but
        // releases nothing: the stock is genuinely sold.
        self.carts.clear(user_id).await?;

        tracing::info!(
            "Placed order {} for user {}: {} item(s), total {}",
            order.id(),
            user_id,
            order.items().len(),
            order.total()
        );
        Ok(order)
    }

    /// Move an order to `target`, enforcing the status graph and the
    /// cancellation policy. Cancelling releases the order's stock back to the
    /// ledger.
    ///
    /// The status change itself is a compare-and-set against the status read
    /// here, so two concurrent cancels admit exactly one; only the winner
    /// releases stock. The releases are attempted once per item even when one
    /// of them fails mid-loop: skipping the rest would strand their stock
    /// forever, since the CAS blocks a second cancel.
    pub async fn advance(&self, order_id: OrderId, target: OrderStatus) -> DomainResult<Order> {
        let order = self.orders.get(order_id).await?;
        let from = order.status();
        validate_transition(from, target, &self.policy)?;
        self.orders.update_status(order_id, from, target).await?;

        if target == OrderStatus::Cancelled {
            let restock: Vec<(VariantId, u32)> = order
                .items()
                .iter()
                .map(|item| (item.variant_id(), item.quantity()))
                .collect();
            self.release_all(&restock).await;
            tracing::info!(
                "Cancelled order {}; released stock for {} item(s)",
                order_id,
                order.items().len()
            );
        } else {
            tracing::info!("Order {} moved {} -> {}", order_id, from, target);
        }

        self.orders.get(order_id).await
    }

    /// Best-effort compensation for both checkout rollback and cancellation;
    /// a release that fails is logged, not propagated, and the remaining
    /// releases still run.
    async fn release_all(&self, reserved: &[(VariantId, u32)]) {
        for (variant_id, quantity) in reserved {
            if let Err(err) = self.ledger.release(*variant_id, *quantity).await {
                tracing::error!(
                    "Failed to release {} unit(s) of variant {} during rollback: {}",
                    quantity,
                    variant_id,
                    err
                );
            }
        }
    }
}
