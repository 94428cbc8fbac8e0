//! Resolution drivers: fetch a channel or video page, pull the live-video
//! fields out of its embedded initial-data document, and commit them to the
//! history store as a single upsert.
//!
//! Drivers own the whole failure surface of remote resolution. A fetch or
//! document-shape failure returns an error and leaves the store untouched;
//! partial data is never committed.

pub mod error;
pub mod id;
pub mod page;
pub mod youtube;

pub use {
    error::{Error, Result},
    id::IdKind,
    youtube::{Resolve, YoutubeResolver},
};
