use std::collections::BTreeMap;

use {beacon_common::unix_now, serde::Serialize};

use crate::field::{Field, FieldValue};

/// Sentinel grouping for records that were never assigned one.
pub const UNGROUPED: &str = "Ungrouped";

/// One tracked channel's current known state: identity and descriptive
/// fields plus the most recently observed live-video snapshot.
///
/// Records are only ever mutated through the store's upsert; callers get
/// [`ChannelSnapshot`] copies.
#[derive(Debug, Clone)]
pub struct ChannelRecord {
    fields: BTreeMap<Field, FieldValue>,
    dirty: bool,
    last_video_update: u64,
}

impl ChannelRecord {
    /// Build a record by running every pair through [`set`](Self::set), then
    /// defaulting the grouping if none was supplied.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (Field, Option<FieldValue>)>,
    {
        let mut record = Self {
            fields: BTreeMap::new(),
            dirty: false,
            last_video_update: 0,
        };
        for (field, value) in fields {
            record.set(field, value);
        }
        if record.get(Field::Grouping).is_none() {
            record.set(Field::Grouping, Some(UNGROUPED.into()));
        }
        record
    }

    /// Apply one field update.
    ///
    /// A live-status field refreshes the staleness timestamp before anything
    /// else, even when the value is unchanged. A value equal to the stored
    /// one is otherwise a no-op; a changed persisted field marks the record
    /// dirty. `None` removes the field entirely.
    pub fn set(&mut self, field: Field, value: Option<FieldValue>) {
        if field.is_live() {
            self.last_video_update = unix_now();
        }
        if self.fields.get(&field) == value.as_ref() {
            return;
        }
        if field.is_persisted() {
            self.dirty = true;
        }
        match value {
            Some(value) => {
                self.fields.insert(field, value);
            },
            None => {
                self.fields.remove(&field);
            },
        }
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// The grouping label used to partition durable storage.
    pub fn grouping(&self) -> &str {
        self.fields
            .get(&Field::Grouping)
            .and_then(FieldValue::as_str)
            .unwrap_or(UNGROUPED)
    }

    /// True when every predicate pair is present and equal in this record.
    pub fn matches(&self, predicate: &[(Field, FieldValue)]) -> bool {
        predicate
            .iter()
            .all(|(field, value)| self.fields.get(field) == Some(value))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the record to be written out on the next flush of its group.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read and reset the dirty flag.
    pub fn clear_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn last_video_update(&self) -> u64 {
        self.last_video_update
    }

    /// Full field map plus the staleness timestamp, for API responses.
    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            fields: self.fields.clone(),
            last_video_update: self.last_video_update,
        }
    }

    /// Only the persisted fields, for durable storage. Live-status fields
    /// are excluded entirely.
    pub fn persisted_view(&self) -> BTreeMap<Field, FieldValue> {
        self.fields
            .iter()
            .filter(|(field, _)| field.is_persisted())
            .map(|(field, value)| (*field, value.clone()))
            .collect()
    }
}

/// An owned copy of a record's state, handed out by store lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSnapshot {
    #[serde(flatten)]
    pub fields: BTreeMap<Field, FieldValue>,
    pub last_video_update: u64,
}

impl ChannelSnapshot {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Staleness check against a caller-supplied max age, in seconds.
    pub fn is_stale(&self, max_age: u64) -> bool {
        beacon_common::age(self.last_video_update) > max_age
    }
}
