//! Request middleware.

pub mod auth;

pub use auth::{CurrentPrincipal, optional_auth_middleware};
