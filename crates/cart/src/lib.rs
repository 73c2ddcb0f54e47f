//! `velo-cart` — per-user shopping cart line items.
//!
//! A cart is implicit: it is the set of a user's [`CartItem`]s. The storage
//! contract (insertion order, idempotent removal) lives with the cart store
//! in `velo-infra`; this crate owns the line-item type and its validation.

pub mod item;

pub use item::CartItem;
