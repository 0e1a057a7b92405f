//! Fasatina admin console library.
//!
//! The console as a library, so the binary stays thin and the integration
//! tests can build the router and drive the authentication gate.
//!
//! # Security
//!
//! The console holds only the public anon key. Every read and write runs
//! with the signed-in admin's access token, so the database's row-level
//! security is what actually grants catalog writes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;
