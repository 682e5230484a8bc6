//! HTTP handlers

mod auth;
mod health;
mod permissions;
mod users;

pub use auth::{callback, login, logout, me, token};
pub use health::{health, ready};
pub use permissions::list_permissions;
pub use users::{create_user, delete_user, get_user, list_users, update_user};
