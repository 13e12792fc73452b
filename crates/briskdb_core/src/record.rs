//! Records and patches.

use crate::error::EngineResult;
use crate::value::Value;
use std::collections::BTreeMap;

/// A stored record: an ordered map from field name to [`Value`].
///
/// Records carry no schema; the table's options decide which field is the
/// primary key and which fields are indexed. Identity of a record within a
/// table is the value of its primary-key field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns true if the record has the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates over the fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a record from a JSON object.
    pub fn from_json(json: &serde_json::Value) -> EngineResult<Self> {
        match Value::from_json(json)? {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(crate::error::EngineError::invalid_value(format!(
                "expected a JSON object for a record, got {other}"
            ))),
        }
    }

    /// Converts this record into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        Value::Map(self.fields.clone()).to_json()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// A partial record used by the update pipeline.
///
/// A patch must carry the table's primary-key field unchanged; every other
/// field it names is written over the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    fields: BTreeMap<String, Value>,
}

impl Patch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Iterates over the fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a patch that carries every field of `record`.
    ///
    /// Used by the upsert path, where the incoming record doubles as a diff
    /// against the stored one.
    pub fn from_record(record: Record) -> Self {
        Self {
            fields: record.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_and_access() {
        let record = Record::new()
            .with("id", 1)
            .with("name", "Alice")
            .with("age", 23);

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("name"), Some(&Value::from("Alice")));
        assert!(record.contains("age"));
        assert!(!record.contains("email"));
    }

    #[test]
    fn set_overwrites() {
        let mut record = Record::new().with("age", 23);
        record.set("age", 24);
        assert_eq!(record.get("age"), Some(&Value::Int(24)));
    }

    #[test]
    fn from_json_object() {
        let record = Record::from_json(&serde_json::json!({"id": 1, "name": "Bob"})).unwrap();
        assert_eq!(record.get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn from_json_non_object_rejected() {
        assert!(Record::from_json(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn patch_from_record() {
        let record = Record::new().with("id", 1).with("age", 30);
        let patch = Patch::from_record(record);
        assert_eq!(patch.get("age"), Some(&Value::Int(30)));
    }
}
