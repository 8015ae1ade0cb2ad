//! Request middleware: tenant authentication.

pub mod auth;

pub use auth::{Tenant, mint_token, verify_token};
