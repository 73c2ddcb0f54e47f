//! `velo-infra` — storage backends for the inventory ledger, cart store, and
//! order store.
//!
//! Each store has a trait boundary, an in-memory implementation (tests/dev)
//! and a Postgres implementation (production).

pub mod store;

pub use store::r#trait::{CartStore, InventoryLedger, OrderStore};
pub use store::in_memory::{InMemoryCartStore, InMemoryInventoryLedger, InMemoryOrderStore};
pub use store::postgres::{
    ensure_schema, PostgresCartStore, PostgresInventoryLedger, PostgresOrderStore,
};
