//! `velo-auth` — authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models JWT
//! claims, validates them deterministically against a clock passed in by the
//! caller, and verifies HS256 signatures. Issuing tokens is someone else's
//! job.

pub mod claims;
pub mod roles;
pub mod validator;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use roles::Role;
pub use validator::{Hs256JwtValidator, JwtValidator};
