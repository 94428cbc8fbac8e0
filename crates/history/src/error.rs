use {beacon_common::FromMessage, thiserror::Error};

use crate::field::Field;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("predicate matched {matches} records; an identity predicate must match at most one")]
    AmbiguousIdentity { matches: usize },

    #[error("{field} value already belongs to another channel")]
    IdentityCollision { field: Field },

    #[error("{0}")]
    Message(String),
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

beacon_common::impl_context!();
