//! Warden DB - User store abstractions
//!
//! The auth core only talks to storage through [`UserRepository`]. An
//! in-memory backend is provided for single-node deployments and tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_db::{InMemoryUserRepository, UserRepository};
//!
//! let repo = Arc::new(InMemoryUserRepository::new());
//! let user = repo.find_by_subject("alice").await?;
//! ```

pub mod error;
pub mod memory;
pub mod repo;

pub use error::{DbError, DbResult};
pub use memory::InMemoryUserRepository;
pub use repo::*;
