//! Common test utilities for warden-auth-core integration tests

pub mod oidc_mock;

#[allow(unused_imports)]
pub use oidc_mock::{auth_config, OidcMockServer, CLIENT_ID, CLIENT_SECRET};
