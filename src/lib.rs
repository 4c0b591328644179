//! Recipe Explorer Library
//!
//! Exposes the cache, API client, favorites store and menu for use by the
//! binary and by integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod favorites;
pub mod format;
pub mod resilience;
