//! `velo-checkout` — cart-to-order conversion and the order lifecycle.
//!
//! This crate contains the one multi-store workflow in the system: turning a
//! cart into a persisted order while never letting stock go negative or a cart
//! produce two orders' worth of inventory. Everything else here is plumbing
//! around that workflow.

pub mod engine;

pub use engine::CheckoutEngine;
