use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} fetching {path}")]
    Status { status: u16, path: String },

    #[error("document has no {missing}; the page layout may have changed")]
    UnexpectedDocument { missing: &'static str },

    #[error(transparent)]
    History(#[from] beacon_history::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
