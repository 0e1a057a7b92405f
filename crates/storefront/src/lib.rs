//! Fasatina storefront library.
//!
//! The public shop as a library, so the binary stays thin and the
//! integration tests can reach the cart adapter and handoff service.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;
