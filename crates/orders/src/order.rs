use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use velo_core::{DomainError, DomainResult, Money, OrderId, UserId, VariantId};

use crate::status::{self, CancellationPolicy, OrderStatus};

/// A snapshot of one cart line at the time of purchase.
///
/// Holds the variant by reference (id), not ownership: the variant may later
/// change price or be deleted without touching this record. `price_at_purchase`
/// is the price read during checkout validation, never a later one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    variant_id: VariantId,
    quantity: u32,
    price_at_purchase: Money,
    note: Option<String>,
}

impl OrderItem {
    pub fn new(
        variant_id: VariantId,
        quantity: u32,
        price_at_purchase: Money,
        note: Option<String>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            variant_id,
            quantity,
            price_at_purchase,
            note,
        })
    }

    pub fn variant_id(&self) -> VariantId {
        self.variant_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price_at_purchase(&self) -> Money {
        self.price_at_purchase
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn line_total(&self) -> DomainResult<Money> {
        self.price_at_purchase
            .checked_mul(self.quantity)
            .ok_or_else(|| DomainError::validation("line total overflows"))
    }
}

/// An order: an immutable snapshot of cart contents and prices at purchase
/// time, plus a mutable status.
///
/// Items and total have no public mutators; after construction only `advance`
/// changes anything, and it only touches `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Build a new `pending` order from snapshot items, computing the total
    /// as the exact sum of line totals.
    pub fn from_snapshot(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        let mut total = Money::ZERO;
        for item in &items {
            total = total
                .checked_add(item.line_total()?)
                .ok_or_else(|| DomainError::validation("order total overflows"))?;
        }
        Ok(Self {
            id,
            user_id,
            items,
            total,
            status: OrderStatus::Pending,
            created_at,
        })
    }

    /// Rehydrate from storage. Stores are trusted to hand back exactly what
    /// was persisted; no re-validation happens here.
    pub fn from_parts(
        id: OrderId,
        user_id: UserId,
        items: Vec<OrderItem>,
        total: Money,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total,
            status,
            created_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Move to `target` if that is a legal transition under the policy.
    pub fn advance(&mut self, target: OrderStatus, policy: &CancellationPolicy) -> DomainResult<()> {
        status::validate_transition(self.status, target, policy)?;
        self.status = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price_minor: i64, quantity: u32) -> OrderItem {
        OrderItem::new(
            VariantId::new(),
            quantity,
            Money::from_minor_units(price_minor),
            None,
        )
        .unwrap()
    }

    #[test]
    fn total_is_the_exact_sum_of_line_totals() {
        let order = Order::from_snapshot(
            OrderId::new(),
            UserId::new(),
            vec![item(999, 2), item(500, 1)],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(order.total(), Money::from_minor_units(2498));
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn snapshot_preserves_item_order() {
        let first = item(100, 1);
        let second = item(200, 2);
        let order = Order::from_snapshot(
            OrderId::new(),
            UserId::new(),
            vec![first.clone(), second.clone()],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(order.items(), &[first, second]);
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        let err =
            Order::from_snapshot(OrderId::new(), UserId::new(), vec![], Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::EmptyCart);
    }

    #[test]
    fn advance_walks_the_lifecycle_and_rejects_skips() {
        let policy = CancellationPolicy::default();
        let mut order = Order::from_snapshot(
            OrderId::new(),
            UserId::new(),
            vec![item(999, 1)],
            Utc::now(),
        )
        .unwrap();

        assert!(order.advance(OrderStatus::Shipped, &policy).is_err());
        assert_eq!(order.status(), OrderStatus::Pending);

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            order.advance(next, &policy).unwrap();
        }
        assert!(order.advance(OrderStatus::Cancelled, &policy).is_err());
    }

    #[test]
    fn zero_quantity_item_is_rejected() {
        assert_eq!(
            OrderItem::new(VariantId::new(), 0, Money::ZERO, None).unwrap_err(),
            DomainError::InvalidQuantity
        );
    }
}
