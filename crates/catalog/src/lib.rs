//! `velo-catalog` — purchasable product variants.

pub mod variant;

pub use variant::Variant;
