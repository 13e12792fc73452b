//! Ordered index structures.
//!
//! A table owns one [`PrimaryIndex`] (unique key, one record per key) and
//! zero or more [`SecondaryIndex`]es (non-unique key, bucket of primary keys
//! per key). The mutation pipeline keeps them consistent; the query executor
//! reads them for candidate selection.

mod primary;
mod secondary;

pub use primary::PrimaryIndex;
pub use secondary::SecondaryIndex;

use crate::config::TableOptions;

/// The index storage of one table: the primary index plus the declared
/// secondary indexes, in declaration order.
#[derive(Debug)]
pub(crate) struct TableStorage {
    pub(crate) primary: PrimaryIndex,
    pub(crate) indexes: Vec<SecondaryIndex>,
}

impl TableStorage {
    /// Creates storage for the given options.
    ///
    /// An index declaration naming the primary-key field, or repeating an
    /// earlier declaration, is dropped: the primary index already covers it.
    pub(crate) fn new(options: &TableOptions) -> Self {
        let mut indexes: Vec<SecondaryIndex> = Vec::new();
        for field in &options.indexed_fields {
            if field == &options.primary_field || indexes.iter().any(|i| i.field() == field) {
                continue;
            }
            indexes.push(SecondaryIndex::new(field.clone()));
        }
        Self {
            primary: PrimaryIndex::new(),
            indexes,
        }
    }

    /// Returns the secondary index on `field`, if one is declared.
    pub(crate) fn index_for(&self, field: &str) -> Option<&SecondaryIndex> {
        self.indexes.iter().find(|i| i.field() == field)
    }

    /// Drops all records and index entries.
    pub(crate) fn clear(&mut self) {
        self.primary.clear();
        for index in &mut self.indexes {
            index.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_field_is_not_doubly_indexed() {
        let options = TableOptions::new("id").index("id").index("age").index("age");
        let storage = TableStorage::new(&options);
        assert_eq!(storage.indexes.len(), 1);
        assert!(storage.index_for("age").is_some());
        assert!(storage.index_for("id").is_none());
    }
}
