//! Table configuration.

/// Options fixed at table construction time.
///
/// The engine treats these as immutable inputs: the primary-key field names
/// the identity of every record, and `indexed_fields` declares the secondary
/// indexes in the order the query executor will consider them.
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Name of the primary-key field.
    pub primary_field: String,

    /// Secondary-indexed fields, in declaration order.
    pub indexed_fields: Vec<String>,

    /// Emit a warning when a full table scan touches more records than this.
    pub scan_warning_threshold: usize,
}

impl TableOptions {
    /// Creates options with the given primary-key field and no secondary
    /// indexes.
    #[must_use]
    pub fn new(primary_field: impl Into<String>) -> Self {
        Self {
            primary_field: primary_field.into(),
            indexed_fields: Vec::new(),
            scan_warning_threshold: 1000,
        }
    }

    /// Declares a secondary index on `field`.
    ///
    /// Declaration order is significant: the executor uses the first declared
    /// index whose field appears in a filter.
    #[must_use]
    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indexed_fields.push(field.into());
        self
    }

    /// Sets the full-scan warning threshold.
    #[must_use]
    pub const fn scan_warning_threshold(mut self, records: usize) -> Self {
        self.scan_warning_threshold = records;
        self
    }
}
