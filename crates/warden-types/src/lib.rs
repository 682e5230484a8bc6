//! Warden Types - Shared domain types
//!
//! This crate contains domain types used across Warden crates:
//! - User identity records and their OIDC profile claims
//! - Issued token envelopes
//! - Field-level validation errors

pub mod claims;
pub mod error;
pub mod token;
pub mod user;

pub use claims::*;
pub use error::*;
pub use token::*;
pub use user::*;
