use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use velo_core::{DomainError, DomainResult, UserId, VariantId};

/// A single line item in a user's cart: (variant, quantity, optional note).
///
/// Each user has at most one item per variant; upserting the same variant
/// replaces quantity and note rather than summing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    user_id: UserId,
    variant_id: VariantId,
    quantity: u32,
    note: Option<String>,
    added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(
        user_id: UserId,
        variant_id: VariantId,
        quantity: u32,
        note: Option<String>,
        added_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        Ok(Self {
            user_id,
            variant_id,
            quantity,
            note,
            added_at,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn variant_id(&self) -> VariantId {
        self.variant_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_is_rejected() {
        let err = CartItem::new(UserId::new(), VariantId::new(), 0, None, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::InvalidQuantity);
    }

    #[test]
    fn keeps_note_and_quantity() {
        let item = CartItem::new(
            UserId::new(),
            VariantId::new(),
            2,
            Some("gift wrap".to_string()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.note(), Some("gift wrap"));
    }
}
