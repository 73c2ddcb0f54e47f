//! `velo-orders` — immutable order snapshots and the status lifecycle.

pub mod order;
pub mod status;

pub use order::{Order, OrderItem};
pub use status::{validate_transition, CancellationPolicy, OrderStatus};
