//! HTTP surface over the channel history store.
//!
//! Thin by design: handlers parse the query, consult the store, and hand off
//! to a resolution driver when the answer is missing or stale. All state
//! machinery lives in the store and the drivers.

pub mod server;

pub use server::{AppState, build_app, start_gateway};
