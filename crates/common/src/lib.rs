//! Shared error plumbing and time utilities used across all beacon crates.

pub mod error;
pub mod time;

pub use {
    error::FromMessage,
    time::{age, unix_now},
};
