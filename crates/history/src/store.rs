use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use {
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::{
    error::{Context, Error, Result},
    field::{Field, FieldValue},
    record::{ChannelRecord, ChannelSnapshot},
};

/// In-memory collection of channel records with group-partitioned JSON
/// persistence.
///
/// One mutex guards the whole record list for the full duration of every
/// public operation, including the group flush an upsert triggers. Internal
/// helpers take the already-locked guard so nested steps never re-acquire.
pub struct HistoryStore {
    data_dir: PathBuf,
    records: Mutex<Vec<ChannelRecord>>,
}

impl HistoryStore {
    /// Open a store over `data_dir`: load every group document found there,
    /// then force-flush to normalize the on-disk layout.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        let records = load_groups(&data_dir)?;
        let store = Self {
            data_dir,
            records: Mutex::new(records),
        };
        store.flush_all(true)?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChannelRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// First record (insertion order) whose fields are a superset of the
    /// predicate pairs.
    pub fn find_one(&self, predicate: &[(Field, FieldValue)]) -> Option<ChannelSnapshot> {
        self.lock()
            .iter()
            .find(|record| record.matches(predicate))
            .map(ChannelRecord::snapshot)
    }

    /// Every record matching the predicate, in insertion order.
    pub fn find_all(&self, predicate: &[(Field, FieldValue)]) -> Vec<ChannelSnapshot> {
        self.lock()
            .iter()
            .filter(|record| record.matches(predicate))
            .map(ChannelRecord::snapshot)
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }

    /// Resolve an update against the existing records.
    ///
    /// An existing match gets `preserve` applied first-write-wins and then
    /// `overwrite` unconditionally (`None` removes a field). With no match, a
    /// new record is built from predicate, preserve, and overwrite merged in
    /// that order and is dirty regardless of field-level tracking. Either
    /// way the resolved record's group is flushed before returning.
    ///
    /// Identity is enforced at write time: a predicate matching several
    /// records and a new record colliding with another record's identity
    /// field are both errors.
    pub fn upsert(
        &self,
        predicate: &[(Field, FieldValue)],
        preserve: &[(Field, FieldValue)],
        overwrite: &[(Field, Option<FieldValue>)],
    ) -> Result<ChannelSnapshot> {
        let mut records = self.lock();

        let matched: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matches(predicate))
            .map(|(index, _)| index)
            .collect();
        if matched.len() > 1 {
            return Err(Error::AmbiguousIdentity {
                matches: matched.len(),
            });
        }

        let index = match matched.first() {
            Some(&index) => {
                let record = &mut records[index];
                for (field, value) in preserve {
                    if record.get(*field).is_none() {
                        record.set(*field, Some(value.clone()));
                    }
                }
                for (field, value) in overwrite {
                    record.set(*field, value.clone());
                }
                index
            },
            None => {
                let mut combined: BTreeMap<Field, Option<FieldValue>> = BTreeMap::new();
                for (field, value) in predicate {
                    combined.insert(*field, Some(value.clone()));
                }
                for (field, value) in preserve {
                    combined.insert(*field, Some(value.clone()));
                }
                for (field, value) in overwrite {
                    combined.insert(*field, value.clone());
                }
                let mut record = ChannelRecord::from_fields(combined);
                check_identity_collision(&records, &record)?;
                record.mark_dirty();
                records.push(record);
                records.len() - 1
            },
        };

        let group = records[index].grouping().to_string();
        self.flush_group_locked(&mut records, &group)?;
        Ok(records[index].snapshot())
    }

    /// Flush one group: reset every member's dirty flag and, if any was
    /// dirty, rewrite the group document wholesale.
    pub fn flush_group(&self, group: &str) -> Result<()> {
        let mut records = self.lock();
        self.flush_group_locked(&mut records, group)
    }

    /// Flush every group present in the store. `force` marks all records
    /// dirty first, rewriting every group document.
    pub fn flush_all(&self, force: bool) -> Result<()> {
        let mut records = self.lock();
        self.flush_all_locked(&mut records, force)
    }

    fn flush_group_locked(&self, records: &mut [ChannelRecord], group: &str) -> Result<()> {
        let mut any_dirty = false;
        let mut views = Vec::new();
        for record in records.iter_mut().filter(|r| r.grouping() == group) {
            any_dirty |= record.clear_dirty();
            views.push(record.persisted_view());
        }
        if !any_dirty {
            return Ok(());
        }

        let path = self.group_path(group);
        let data = serde_json::to_string_pretty(&views)?;
        fs::write(&path, data)
            .with_context(|| format!("failed to write group document {}", path.display()))?;
        debug!(group, records = views.len(), "flushed group");
        Ok(())
    }

    fn flush_all_locked(&self, records: &mut [ChannelRecord], force: bool) -> Result<()> {
        if force {
            for record in records.iter_mut() {
                record.mark_dirty();
            }
        }
        let mut groups: Vec<String> = Vec::new();
        for record in records.iter() {
            let group = record.grouping();
            if !groups.iter().any(|g| g == group) {
                groups.push(group.to_string());
            }
        }
        for group in groups {
            self.flush_group_locked(records, &group)?;
        }
        Ok(())
    }

    fn group_path(&self, group: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", group_filename(group)))
    }
}

/// Sanitize a grouping label for use as a filename.
fn group_filename(group: &str) -> String {
    group.replace(['/', '\\'], "_")
}

fn check_identity_collision(records: &[ChannelRecord], candidate: &ChannelRecord) -> Result<()> {
    for field in [
        Field::YtId,
        Field::YtHandle,
        Field::YtOldHandle,
        Field::TtvHandle,
    ] {
        let Some(value) = candidate.get(field) else {
            continue;
        };
        if records.iter().any(|record| record.get(field) == Some(value)) {
            return Err(Error::IdentityCollision { field });
        }
    }
    Ok(())
}

/// Load every `<group>.json` document under `dir` into records.
///
/// The filename stem is authoritative for the grouping, overriding whatever
/// the document itself claims. Unreadable documents and unknown or malformed
/// fields are skipped with a warning; the source of truth for this data is
/// the store's own flushes, but hand-edited files should not take the
/// process down.
fn load_groups(dir: &Path) -> Result<Vec<ChannelRecord>> {
    let mut records = Vec::new();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json") && path.is_file())
        .collect();
    paths.sort();

    for path in paths {
        let Some(group) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let raw = fs::read_to_string(&path)?;
        let docs: Vec<serde_json::Map<String, Value>> = match serde_json::from_str(&raw) {
            Ok(docs) => docs,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping malformed group document");
                continue;
            },
        };

        for doc in docs {
            let mut fields: Vec<(Field, Option<FieldValue>)> = Vec::new();
            for (key, value) in doc {
                let Ok(field) = key.parse::<Field>() else {
                    warn!(group, key = %key, "skipping unknown field in group document");
                    continue;
                };
                match field_value(&value) {
                    Some(value) => fields.push((field, Some(value))),
                    None if value.is_null() => {},
                    None => {
                        warn!(group, field = %field, "skipping malformed value in group document");
                    },
                }
            }
            let mut record = ChannelRecord::from_fields(fields);
            if record.grouping() != group {
                debug!(group, stored = record.grouping(), "reconciling grouping to document name");
                record.set(Field::Grouping, Some(group.into()));
            }
            records.push(record);
        }
    }

    Ok(records)
}

fn field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => n.as_i64().map(FieldValue::Int),
        Value::String(s) => Some(FieldValue::Str(s.clone())),
        Value::Array(items) => {
            let strings: Option<Vec<String>> = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect();
            strings.map(FieldValue::List)
        },
        _ => None,
    }
}
