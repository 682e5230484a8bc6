//! Issued token envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed token together with its expiry, as handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedToken {
    pub token: String,
    pub expiry: DateTime<Utc>,
}
