//! Error types for the BriskDB engine.

use crate::value::Value;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in BriskDB engine operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// The primary key of a record is missing or null.
    #[error("invalid primary key: {key:?}")]
    InvalidPrimaryKey {
        /// The offending key value. `None` when the field was absent entirely.
        key: Option<Value>,
    },

    /// A transform attempted to change a record's primary key.
    #[error("primary key {key} cannot be modified")]
    PrimaryKeyModified {
        /// The primary key of the record the transform received.
        key: Value,
    },

    /// An update or removal targeted a primary key absent from the table.
    #[error("no record with primary key {key}")]
    ItemNotFound {
        /// The primary key that was not found.
        key: Value,
    },

    /// An insert targeted a primary key already present in the table.
    #[error("a record with primary key {key} already exists")]
    DuplicateKey {
        /// The primary key that collided.
        key: Value,
    },

    /// `one` found no matching record.
    #[error("no record on table {table} matches the filter")]
    NoMatchingRecord {
        /// Name of the queried table.
        table: String,
    },

    /// `one` matched more than one record.
    #[error("filter on table {table} matched {count} records, expected exactly one")]
    NotUnique {
        /// Name of the queried table.
        table: String,
        /// How many records matched.
        count: usize,
    },

    /// A table name was not found in the database.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Name of the table.
        name: String,
    },

    /// A table with the same name is already registered.
    #[error("table already exists: {name}")]
    DuplicateTable {
        /// Name of the table.
        name: String,
    },

    /// A dynamic value cannot be represented in the engine's value model.
    #[error("invalid value: {message}")]
    InvalidValue {
        /// Description of the problem.
        message: String,
    },

    /// A hook rewrote an operation's parameters to an incompatible shape.
    #[error("hook rewrote {action} parameters to an incompatible shape")]
    HookArgsMismatch {
        /// The intercepted action.
        action: &'static str,
    },

    /// A hook short-circuited with a result of the wrong shape.
    #[error("hook for {action} returned a result of the wrong shape")]
    HookOutcomeMismatch {
        /// The intercepted action.
        action: &'static str,
    },
}

impl EngineError {
    /// Creates an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Creates an invalid primary key error for a missing field.
    pub fn missing_primary_key() -> Self {
        Self::InvalidPrimaryKey { key: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_key() {
        let err = EngineError::DuplicateKey {
            key: Value::Int(7),
        };
        assert_eq!(err.to_string(), "a record with primary key 7 already exists");
    }

    #[test]
    fn errors_are_distinguishable() {
        let not_found = EngineError::ItemNotFound {
            key: Value::Int(1),
        };
        let duplicate = EngineError::DuplicateKey {
            key: Value::Int(1),
        };
        assert_ne!(not_found, duplicate);
    }
}
