//! Storedeck Core - Shared types library.
//!
//! This crate provides common types used across all Storedeck components:
//! - `gateway` - Multi-tenant commerce-integration gateway
//! - `integration-tests` - End-to-end tests against mock collaborators
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
