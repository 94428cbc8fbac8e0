//! Schema-less search over nested JSON documents.
//!
//! The documents this crate walks are script payloads scraped from
//! third-party pages: deeply nested, unversioned, and reshaped without
//! notice. Both entry points therefore never fail: a lookup that does not
//! resolve degrades to an empty result or a typed zero value instead.

pub mod find;
pub mod path;

pub use {
    find::find_by_key,
    path::{Kind, Step, path_query},
};
