//! Table and index statistics.

/// Statistics for one secondary index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    /// The indexed field.
    pub field: String,
    /// Number of distinct keys.
    pub distinct_keys: usize,
    /// Total entries across all buckets.
    pub total_entries: usize,
    /// Average bucket size, `total_entries / distinct_keys`.
    pub fan_out: f64,
}

/// Statistics for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    /// Number of stored records.
    pub records: usize,
    /// Per-index statistics, in index declaration order.
    pub indexes: Vec<IndexStats>,
}
