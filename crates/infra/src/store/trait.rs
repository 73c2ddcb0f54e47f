use async_trait::async_trait;

use velo_cart::CartItem;
use velo_catalog::Variant;
use velo_core::{DomainResult, OrderId, UserId, VariantId};
use velo_orders::{Order, OrderStatus};

/// Owns variant rows and their stock quantities.
///
/// `reserve` is the one operation in the system that needs strict mutual
/// exclusion per variant: implementations must make the check-and-decrement a
/// single atomic step (write lock, conditional UPDATE, ...) so that two
/// concurrent reservations can never drive stock negative.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Insert a variant, replacing an existing variant with the same id
    /// (admin catalog management).
    async fn upsert(&self, variant: Variant) -> DomainResult<()>;

    /// `NotFound` if the variant does not exist.
    async fn get(&self, variant_id: VariantId) -> DomainResult<Variant>;

    /// All variants, ascending by id.
    async fn list(&self) -> DomainResult<Vec<Variant>>;

    /// True iff current stock >= `quantity`. Read-only, never mutates.
    async fn check_availability(&self, variant_id: VariantId, quantity: u32) -> DomainResult<bool>;

    /// Atomically decrement stock by `quantity` only if current stock covers
    /// it. Fails with `InsufficientStock` (no mutation) otherwise, and with
    /// `VariantUnavailable` if the variant is missing or inactive. Never
    /// retries internally; failure is immediate.
    async fn reserve(&self, variant_id: VariantId, quantity: u32) -> DomainResult<()>;

    /// Compensating increment for a prior reservation. Releasing against a
    /// variant that has since been deleted is a no-op success: cancellation
    /// of an old order must not fail because the catalog moved on.
    async fn release(&self, variant_id: VariantId, quantity: u32) -> DomainResult<()>;
}

/// Owns the mapping from a user to their current cart line items.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's items in insertion order (stable across upserts, so order
    /// snapshots are deterministic).
    async fn items(&self, user_id: UserId) -> DomainResult<Vec<CartItem>>;

    /// Insert the item, or replace quantity/note of the user's existing item
    /// for the same variant. Replacement keeps the original cart position.
    async fn upsert_item(&self, item: CartItem) -> DomainResult<()>;

    /// Idempotent: removing an item that is not in the cart is a no-op
    /// success.
    async fn remove_item(&self, user_id: UserId, variant_id: VariantId) -> DomainResult<()>;

    /// Idempotent: clearing an empty (or unknown) cart succeeds.
    async fn clear(&self, user_id: UserId) -> DomainResult<()>;
}

/// Owns persisted orders. Order items and totals are write-once; only the
/// status column ever changes after insert.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> DomainResult<()>;

    /// `NotFound` for unknown ids.
    async fn get(&self, order_id: OrderId) -> DomainResult<Order>;

    /// The user's orders, most recent first.
    async fn list_for_user(&self, user_id: UserId) -> DomainResult<Vec<Order>>;

    /// Compare-and-set status change: succeeds only if the stored status is
    /// still `from`. A concurrent transition that got there first surfaces as
    /// `InvalidTransition`, which is what makes cancellation (and its stock
    /// release) exactly-once.
    async fn update_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DomainResult<()>;
}
