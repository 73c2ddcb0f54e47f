//! Store boundaries for the checkout core.
//!
//! The trait contracts here are what the checkout engine programs against;
//! they make no storage assumptions beyond the atomicity notes on each
//! operation.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;
