//! The mutation pipeline: inserts, updates, removals and upserts.
//!
//! Every mutation maintains the ordered-index invariant before returning:
//! each record sits in the primary index under its own primary-key value and
//! in exactly the buckets its current field values select. Batch operations
//! abort on the first failing element; elements committed earlier in the
//! same batch stay committed (no rollback).

use super::Table;
use crate::error::{EngineError, EngineResult};
use crate::events::{ChangeEvent, UpdatedPair};
use crate::hooks::{HookAction, HookArgs, HookOutcome};
use crate::query::filter::Filter;
use crate::record::{Patch, Record};
use crate::value::Value;

impl Table {
    /// Inserts a new record.
    ///
    /// Errors with [`EngineError::InvalidPrimaryKey`] when the primary-key
    /// field is missing or null, and [`EngineError::DuplicateKey`] when a
    /// record with the same primary key exists.
    pub fn insert(&self, record: Record) -> EngineResult<Value> {
        let outcome = self.dispatch(HookAction::Insert, HookArgs::Record(record), &|args| {
            let HookArgs::Record(record) = args else {
                return Err(EngineError::HookArgsMismatch { action: "insert" });
            };
            let mut keys = self.insert_records(vec![record])?;
            Ok(HookOutcome::Key(keys.remove(0)))
        })?;
        match outcome {
            HookOutcome::Key(key) => Ok(key),
            _ => Err(EngineError::HookOutcomeMismatch { action: "insert" }),
        }
    }

    /// Inserts a batch of records, returning their primary keys in order.
    pub fn insert_many(&self, records: Vec<Record>) -> EngineResult<Vec<Value>> {
        let outcome = self.dispatch(
            HookAction::InsertMany,
            HookArgs::Records(records),
            &|args| {
                let HookArgs::Records(records) = args else {
                    return Err(EngineError::HookArgsMismatch {
                        action: "insert_many",
                    });
                };
                Ok(HookOutcome::Keys(self.insert_records(records)?))
            },
        )?;
        match outcome {
            HookOutcome::Keys(keys) => Ok(keys),
            _ => Err(EngineError::HookOutcomeMismatch {
                action: "insert_many",
            }),
        }
    }

    /// Applies a patch to the record it names.
    ///
    /// Errors with [`EngineError::ItemNotFound`] when no record exists under
    /// the patch's primary key.
    pub fn update(&self, patch: Patch) -> EngineResult<Value> {
        let outcome = self.dispatch(HookAction::Update, HookArgs::Patch(patch), &|args| {
            let HookArgs::Patch(patch) = args else {
                return Err(EngineError::HookArgsMismatch { action: "update" });
            };
            let mut keys = self.update_records(vec![patch])?;
            Ok(HookOutcome::Key(keys.remove(0)))
        })?;
        match outcome {
            HookOutcome::Key(key) => Ok(key),
            _ => Err(EngineError::HookOutcomeMismatch { action: "update" }),
        }
    }

    /// Applies a batch of patches, returning the patched primary keys.
    pub fn update_many(&self, patches: Vec<Patch>) -> EngineResult<Vec<Value>> {
        let outcome = self.dispatch(
            HookAction::UpdateMany,
            HookArgs::Patches(patches),
            &|args| {
                let HookArgs::Patches(patches) = args else {
                    return Err(EngineError::HookArgsMismatch {
                        action: "update_many",
                    });
                };
                Ok(HookOutcome::Keys(self.update_records(patches)?))
            },
        )?;
        match outcome {
            HookOutcome::Keys(keys) => Ok(keys),
            _ => Err(EngineError::HookOutcomeMismatch {
                action: "update_many",
            }),
        }
    }

    /// Transforms every record matching `filter` and applies the results as
    /// one batch update.
    ///
    /// Transforms receive owned snapshots and all run before any index
    /// change is applied. A transform that alters the primary key fails the
    /// whole operation with [`EngineError::PrimaryKeyModified`] without
    /// applying anything.
    pub fn update_where<F>(&self, filter: &Filter, transform: F) -> EngineResult<Vec<Value>>
    where
        F: FnMut(Record) -> Record,
    {
        let transform = std::cell::RefCell::new(transform);
        let outcome = self.dispatch(
            HookAction::UpdateWhere,
            HookArgs::Filter(Some(filter.clone())),
            &|args| {
                let HookArgs::Filter(Some(filter)) = args else {
                    return Err(EngineError::HookArgsMismatch {
                        action: "update_where",
                    });
                };
                let candidates = self.read_many(Some(&filter));
                let mut patches = Vec::with_capacity(candidates.len());
                let mut transform = transform.borrow_mut();
                for record in candidates {
                    let key = self.primary_key_of(&record)?;
                    let updated = (*transform)(record);
                    if updated.get(&self.options.primary_field) != Some(&key) {
                        return Err(EngineError::PrimaryKeyModified { key });
                    }
                    patches.push(Patch::from_record(updated));
                }
                drop(transform);
                Ok(HookOutcome::Keys(self.update_records(patches)?))
            },
        )?;
        match outcome {
            HookOutcome::Keys(keys) => Ok(keys),
            _ => Err(EngineError::HookOutcomeMismatch {
                action: "update_where",
            }),
        }
    }

    /// Removes the record under `key`.
    ///
    /// Returns whether a record was removed; an absent key is a no-op, not
    /// an error.
    pub fn remove(&self, key: Value) -> EngineResult<bool> {
        let outcome = self.dispatch(HookAction::Remove, HookArgs::Key(key), &|args| {
            let HookArgs::Key(key) = args else {
                return Err(EngineError::HookArgsMismatch { action: "remove" });
            };
            Ok(HookOutcome::Removed(self.remove_records(vec![key]) == 1))
        })?;
        match outcome {
            HookOutcome::Removed(removed) => Ok(removed),
            _ => Err(EngineError::HookOutcomeMismatch { action: "remove" }),
        }
    }

    /// Removes the records under `keys`, skipping absent ones.
    ///
    /// Returns how many records were removed.
    pub fn remove_many(&self, keys: Vec<Value>) -> EngineResult<usize> {
        let outcome = self.dispatch(HookAction::RemoveMany, HookArgs::Keys(keys), &|args| {
            let HookArgs::Keys(keys) = args else {
                return Err(EngineError::HookArgsMismatch {
                    action: "remove_many",
                });
            };
            Ok(HookOutcome::Count(self.remove_records(keys)))
        })?;
        match outcome {
            HookOutcome::Count(count) => Ok(count),
            _ => Err(EngineError::HookOutcomeMismatch {
                action: "remove_many",
            }),
        }
    }

    /// Removes every record matching `filter`, returning how many were
    /// removed.
    pub fn remove_where(&self, filter: &Filter) -> EngineResult<usize> {
        let outcome = self.dispatch(
            HookAction::RemoveWhere,
            HookArgs::Filter(Some(filter.clone())),
            &|args| {
                let HookArgs::Filter(Some(filter)) = args else {
                    return Err(EngineError::HookArgsMismatch {
                        action: "remove_where",
                    });
                };
                let keys = self
                    .read_many(Some(&filter))
                    .iter()
                    .filter_map(|record| record.get(&self.options.primary_field).cloned())
                    .collect();
                Ok(HookOutcome::Count(self.remove_records(keys)))
            },
        )?;
        match outcome {
            HookOutcome::Count(count) => Ok(count),
            _ => Err(EngineError::HookOutcomeMismatch {
                action: "remove_where",
            }),
        }
    }

    /// Inserts `record`, or updates the stored record when its primary key
    /// already exists.
    pub fn upsert(&self, record: Record) -> EngineResult<Value> {
        let outcome = self.dispatch(HookAction::Upsert, HookArgs::Record(record), &|args| {
            let HookArgs::Record(record) = args else {
                return Err(EngineError::HookArgsMismatch { action: "upsert" });
            };
            let mut keys = self.upsert_records(vec![record])?;
            Ok(HookOutcome::Key(keys.remove(0)))
        })?;
        match outcome {
            HookOutcome::Key(key) => Ok(key),
            _ => Err(EngineError::HookOutcomeMismatch { action: "upsert" }),
        }
    }

    /// Upserts a batch of records, returning their primary keys in order.
    pub fn upsert_many(&self, records: Vec<Record>) -> EngineResult<Vec<Value>> {
        let outcome = self.dispatch(
            HookAction::UpsertMany,
            HookArgs::Records(records),
            &|args| {
                let HookArgs::Records(records) = args else {
                    return Err(EngineError::HookArgsMismatch {
                        action: "upsert_many",
                    });
                };
                Ok(HookOutcome::Keys(self.upsert_records(records)?))
            },
        )?;
        match outcome {
            HookOutcome::Keys(keys) => Ok(keys),
            _ => Err(EngineError::HookOutcomeMismatch {
                action: "upsert_many",
            }),
        }
    }

    /// Extracts and validates a record's primary key.
    fn primary_key_of(&self, record: &Record) -> EngineResult<Value> {
        match record.get(&self.options.primary_field) {
            None => Err(EngineError::missing_primary_key()),
            Some(Value::Null) => Err(EngineError::InvalidPrimaryKey {
                key: Some(Value::Null),
            }),
            Some(key) => Ok(key.clone()),
        }
    }

    /// Inserts records one by one under the write lock; the batch event is
    /// dispatched only after every element committed.
    fn insert_records(&self, records: Vec<Record>) -> EngineResult<Vec<Value>> {
        let mut guard = self.storage.write();
        let storage = &mut *guard;
        let mut keys = Vec::with_capacity(records.len());
        let mut inserted = Vec::with_capacity(records.len());

        for record in records {
            let key = self.primary_key_of(&record)?;
            if storage.primary.contains(&key) {
                return Err(EngineError::DuplicateKey { key });
            }
            for index in storage.indexes.iter_mut() {
                // A record without the indexed field buckets under null, so
                // the invariant stays total.
                let value = record.get(index.field()).cloned().unwrap_or(Value::Null);
                index.insert(value, key.clone());
            }
            storage.primary.insert(key.clone(), record.clone());
            inserted.push(record);
            keys.push(key);
        }
        drop(guard);

        tracing::debug!(table = %self.name, count = keys.len(), "inserted records");
        if !inserted.is_empty() {
            self.feed.emit(ChangeEvent::Insert { records: inserted });
            self.refresh_watchers();
        }
        Ok(keys)
    }

    /// Applies patches one by one under the write lock.
    ///
    /// Each changed field that participates in a secondary index moves the
    /// record's bucket entry from the old key to the new one; removal is by
    /// primary-key identity and tolerates an already-missing entry. The
    /// update event carries both snapshots and is dispatched once per batch.
    fn update_records(&self, patches: Vec<Patch>) -> EngineResult<Vec<Value>> {
        let primary_field = self.options.primary_field.clone();
        let mut guard = self.storage.write();
        let storage = &mut *guard;
        let mut keys = Vec::with_capacity(patches.len());
        let mut changes = Vec::with_capacity(patches.len());

        for patch in patches {
            let key = match patch.get(&primary_field) {
                None => return Err(EngineError::missing_primary_key()),
                Some(Value::Null) => {
                    return Err(EngineError::InvalidPrimaryKey {
                        key: Some(Value::Null),
                    })
                }
                Some(key) => key.clone(),
            };
            let Some(record) = storage.primary.get_mut(&key) else {
                return Err(EngineError::ItemNotFound { key });
            };

            let before = record.clone();
            for (field, value) in patch.fields() {
                if field == primary_field {
                    continue;
                }
                if before.get(field) != Some(value) {
                    record.set(field, value.clone());
                }
            }
            let after = record.clone();

            for index in storage.indexes.iter_mut() {
                let old = before.get(index.field()).cloned().unwrap_or(Value::Null);
                let new = after.get(index.field()).cloned().unwrap_or(Value::Null);
                if old != new {
                    index.remove(&old, &key);
                    index.insert(new, key.clone());
                }
            }

            keys.push(key);
            changes.push(UpdatedPair { before, after });
        }
        drop(guard);

        tracing::debug!(table = %self.name, count = keys.len(), "updated records");
        if !changes.is_empty() {
            self.feed.emit(ChangeEvent::Update { changes });
            self.refresh_watchers();
        }
        Ok(keys)
    }

    /// Removes records by primary key, detaching each from the primary index
    /// and from every bucket it participates in. Absent keys are skipped.
    fn remove_records(&self, keys: Vec<Value>) -> usize {
        let mut guard = self.storage.write();
        let storage = &mut *guard;
        let mut removed = Vec::new();

        for key in keys {
            if let Some(record) = storage.primary.remove(&key) {
                for index in storage.indexes.iter_mut() {
                    let value = record.get(index.field()).cloned().unwrap_or(Value::Null);
                    index.remove(&value, &key);
                }
                removed.push(record);
            }
        }
        drop(guard);

        let count = removed.len();
        tracing::debug!(table = %self.name, count, "removed records");
        if count > 0 {
            self.feed.emit(ChangeEvent::Remove { records: removed });
            self.refresh_watchers();
        }
        count
    }

    /// Routes each record to the insert or update path by key presence,
    /// preserving batch order. Neither path duplicates index entries.
    fn upsert_records(&self, records: Vec<Record>) -> EngineResult<Vec<Value>> {
        let mut keys = Vec::with_capacity(records.len());
        for record in records {
            let key = self.primary_key_of(&record)?;
            let exists = self.storage.read().primary.contains(&key);
            if exists {
                self.update_records(vec![Patch::from_record(record)])?;
            } else {
                self.insert_records(vec![record])?;
            }
            keys.push(key);
        }
        Ok(keys)
    }
}
