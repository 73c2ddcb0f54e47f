use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use velo_core::{DomainError, DomainResult, Money, VariantId};

/// A purchasable SKU-level unit of a product.
///
/// Stock is a `u32`, so a negative quantity is unrepresentable; on top of
/// that, [`Variant::reserve`] only decrements after a guard check. All stock
/// mutation goes through the inventory ledger, which calls `reserve`/`release`
/// while holding whatever exclusion the backing store provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    id: VariantId,
    sku: String,
    unit_price: Money,
    stock_quantity: u32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl Variant {
    pub fn new(
        id: VariantId,
        sku: impl Into<String>,
        unit_price: Money,
        stock_quantity: u32,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        Ok(Self {
            id,
            sku,
            unit_price,
            stock_quantity,
            is_active: true,
            created_at,
        })
    }

    /// Rehydrate from storage without re-validating.
    pub fn from_parts(
        id: VariantId,
        sku: String,
        unit_price: Money,
        stock_quantity: u32,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sku,
            unit_price,
            stock_quantity,
            is_active,
            created_at,
        }
    }

    pub fn id(&self) -> VariantId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn set_unit_price(&mut self, unit_price: Money) -> DomainResult<()> {
        if unit_price.is_negative() {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        self.unit_price = unit_price;
        Ok(())
    }

    /// Check-and-decrement. No mutation on failure.
    pub fn reserve(&mut self, quantity: u32) -> DomainResult<()> {
        if !self.is_active {
            return Err(DomainError::VariantUnavailable(self.id));
        }
        if self.stock_quantity < quantity {
            return Err(DomainError::InsufficientStock(self.id));
        }
        self.stock_quantity -= quantity;
        Ok(())
    }

    /// Compensating increment (rollback or cancellation path).
    pub fn release(&mut self, quantity: u32) {
        self.stock_quantity = self.stock_quantity.saturating_add(quantity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn variant(stock: u32) -> Variant {
        Variant::new(
            VariantId::new(),
            "TEE-M-BLK",
            Money::from_minor_units(999),
            stock,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_blank_sku_and_negative_price() {
        let id = VariantId::new();
        assert!(matches!(
            Variant::new(id, "  ", Money::ZERO, 0, Utc::now()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Variant::new(id, "SKU", Money::from_minor_units(-1), 0, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn reserve_fails_without_mutation_when_stock_is_short() {
        let mut v = variant(1);
        let err = v.reserve(2).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock(v.id()));
        assert_eq!(v.stock_quantity(), 1);
    }

    #[test]
    fn reserve_fails_for_inactive_variant() {
        let mut v = variant(5);
        v.set_active(false);
        assert_eq!(v.reserve(1).unwrap_err(), DomainError::VariantUnavailable(v.id()));
        assert_eq!(v.stock_quantity(), 5);
    }

    #[test]
    fn release_restores_reserved_stock() {
        let mut v = variant(3);
        v.reserve(3).unwrap();
        assert!(!v.in_stock());
        v.release(3);
        assert_eq!(v.stock_quantity(), 3);
    }

    proptest! {
        /// Stock can never go negative, whatever sequence of reserve/release
        /// calls is thrown at a variant (failed reserves must not mutate).
        #[test]
        fn stock_never_negative(
            initial in 0u32..1_000,
            ops in proptest::collection::vec((any::<bool>(), 0u32..2_000), 0..64),
        ) {
            let mut v = variant(initial);
            let mut expected = u64::from(initial);
            for (is_reserve, qty) in ops {
                if is_reserve {
                    if v.reserve(qty).is_ok() {
                        expected -= u64::from(qty);
                    }
                } else {
                    v.release(qty);
                    expected = expected.saturating_add(u64::from(qty)).min(u64::from(u32::MAX));
                }
                prop_assert_eq!(u64::from(v.stock_quantity()), expected);
            }
        }
    }
}
