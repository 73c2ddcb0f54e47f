//! Domain error model.

use thiserror::Error;

use crate::id::VariantId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a recoverable, caller-facing failure; none represent
/// corruption. `Storage` is the one escape hatch for unexpected persistence
/// failures and must still leave the system in a rolled-back state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A quantity was zero (or otherwise not strictly positive).
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    /// Checkout was attempted against a cart with no items.
    #[error("cart is empty")]
    EmptyCart,

    /// The variant no longer exists or is no longer sold.
    #[error("variant {0} is unavailable")]
    VariantUnavailable(VariantId),

    /// Stock is lower than the requested reservation quantity.
    #[error("insufficient stock for variant {0}")]
    InsufficientStock(VariantId),

    /// The requested order status change is not a legal transition.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// A requested resource was not found (unknown user/order/variant).
    #[error("not found")]
    NotFound,

    /// A value failed validation (e.g. malformed input, empty SKU).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unexpected persistence failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn invalid_transition(from: &'static str, to: &'static str) -> Self {
        Self::InvalidTransition { from, to }
    }
}
