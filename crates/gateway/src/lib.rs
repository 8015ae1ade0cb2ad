//! Storedeck gateway library.
//!
//! Multi-tenant backend for the Storedeck operator dashboard. Tenants
//! authenticate with a signed session token, register store connections
//! in the tenant directory, and operate their stores (products, orders,
//! shipment tracking, catalog) through a normalized HTTP API that the
//! gateway proxies to each store's commerce platform.
//!
//! Split into a library so the integration tests can build the router
//! in-process against mock services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod directory;
pub mod error;
pub mod fallback;
pub mod middleware;
pub mod retry;
pub mod routes;
pub mod state;
pub mod upstream;
