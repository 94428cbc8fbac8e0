use std::{fmt, str::FromStr};

use {beacon_history::Field, thiserror::Error};

/// The identifier namespaces a caller can resolve a channel through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    VideoId,
    YtId,
    YtHandle,
    YtOldHandle,
}

impl IdKind {
    /// The record field this namespace is stored under, used both as a
    /// lookup predicate and to preserve the queried id on the record.
    pub fn field(self) -> Field {
        match self {
            Self::VideoId => Field::VideoId,
            Self::YtId => Field::YtId,
            Self::YtHandle => Field::YtHandle,
            Self::YtOldHandle => Field::YtOldHandle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VideoId => "video_id",
            Self::YtId => "yt_id",
            Self::YtHandle => "yt_handle",
            Self::YtOldHandle => "yt_old_handle",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown id kind: {0}")]
pub struct UnknownIdKind(pub String);

impl FromStr for IdKind {
    type Err = UnknownIdKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video_id" => Ok(Self::VideoId),
            "yt_id" => Ok(Self::YtId),
            "yt_handle" => Ok(Self::YtHandle),
            "yt_old_handle" => Ok(Self::YtOldHandle),
            other => Err(UnknownIdKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_namespace() {
        assert_eq!("video_id".parse::<IdKind>().unwrap(), IdKind::VideoId);
        assert_eq!("yt_id".parse::<IdKind>().unwrap(), IdKind::YtId);
        assert_eq!("yt_handle".parse::<IdKind>().unwrap(), IdKind::YtHandle);
        assert_eq!(
            "yt_old_handle".parse::<IdKind>().unwrap(),
            IdKind::YtOldHandle
        );
        assert!("ttv_handle".parse::<IdKind>().is_err());
    }

    #[test]
    fn maps_to_record_fields() {
        assert_eq!(IdKind::YtId.field(), Field::YtId);
        assert_eq!(IdKind::VideoId.field(), Field::VideoId);
    }
}
