//! Channel history: the latest known state per tracked channel.
//!
//! Records live in memory as schema-less field maps and are persisted as one
//! JSON document per grouping under the store's data directory. All store
//! access goes through one lock; resolution of remote documents happens
//! before calling in, so nothing blocks on network I/O while holding it.

pub mod error;
pub mod field;
pub mod record;
pub mod store;

pub use {
    error::{Error, Result},
    field::{Field, FieldValue},
    record::{ChannelRecord, ChannelSnapshot, UNGROUPED},
    store::HistoryStore,
};
