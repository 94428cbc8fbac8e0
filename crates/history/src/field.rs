use std::{fmt, str::FromStr};

use {
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

/// The complete set of fields a channel record can carry.
///
/// Enumerated explicitly so the persisted/live split is a property of the
/// field itself rather than of whoever happens to write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Grouping,
    Aliases,
    YtId,
    YtHandle,
    YtOldHandle,
    TtvHandle,
    Live,
    VideoId,
    VideoName,
    StartTime,
}

impl Field {
    /// Live-status fields form the video snapshot. They are excluded from
    /// durable storage and mutating one refreshes the staleness timestamp.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            Self::Live | Self::VideoId | Self::VideoName | Self::StartTime
        )
    }

    /// Persisted fields are written to the group documents and drive dirty
    /// tracking.
    pub fn is_persisted(self) -> bool {
        !self.is_live()
    }

    /// Identity fields are distinct identifier namespaces for the same
    /// logical channel; a value in one may belong to at most one record.
    pub fn is_identity(self) -> bool {
        matches!(
            self,
            Self::YtId | Self::YtHandle | Self::YtOldHandle | Self::TtvHandle
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Grouping => "grouping",
            Self::Aliases => "aliases",
            Self::YtId => "yt_id",
            Self::YtHandle => "yt_handle",
            Self::YtOldHandle => "yt_old_handle",
            Self::TtvHandle => "ttv_handle",
            Self::Live => "live",
            Self::VideoId => "video_id",
            Self::VideoName => "video_name",
            Self::StartTime => "start_time",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "grouping" => Ok(Self::Grouping),
            "aliases" => Ok(Self::Aliases),
            "yt_id" => Ok(Self::YtId),
            "yt_handle" => Ok(Self::YtHandle),
            "yt_old_handle" => Ok(Self::YtOldHandle),
            "ttv_handle" => Ok(Self::TtvHandle),
            "live" => Ok(Self::Live),
            "video_id" => Ok(Self::VideoId),
            "video_name" => Ok(Self::VideoName),
            "start_time" => Ok(Self::StartTime),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// A field's value: the source documents only ever yield strings, booleans,
/// integer timestamps, and lists of alias strings.
///
/// The absent case is represented by the field not being stored at all;
/// records never carry explicit nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}
