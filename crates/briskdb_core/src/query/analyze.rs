//! Cost analysis: relative scan-cost estimation for filters.
//!
//! The analyzer reports how many records a filter would plausibly touch
//! given the available indexes. The estimate is relative and un-normalized;
//! it exists for introspection and diagnostics. The executor deliberately
//! does not consult it — it selects indexes by a fixed heuristic (see
//! [`select`](crate::query::select)).

use crate::index::TableStorage;
use crate::query::filter::{Filter, WhereClause};

/// Estimates the relative scan cost of `filter`.
///
/// Returns `None` when the cost is not computable — no property of the
/// filter is indexed, so any answer would be a guess. Callers must treat
/// that as "unknown", not as zero.
pub(crate) fn analyze(
    storage: &TableStorage,
    primary_field: &str,
    filter: &Filter,
) -> Option<u64> {
    match filter {
        Filter::Where(clause) => analyze_where(storage, primary_field, clause),
        Filter::And(children) => analyze_and(storage, primary_field, children),
        Filter::Or(children) => analyze_or(storage, primary_field, children),
    }
}

/// Cheapest viable path across the clause's indexed properties.
///
/// A point lookup costs 1; a bound costs the key count on its matching
/// side. Secondary-index key counts are scaled by the index fan-out to
/// approximate record counts, rounded to nearest. A zero estimate is not
/// considered a viable path and does not participate in the minimum.
fn analyze_where(
    storage: &TableStorage,
    primary_field: &str,
    clause: &WhereClause,
) -> Option<u64> {
    if clause.is_empty() {
        return Some(0);
    }

    let mut cheapest: Option<u64> = None;
    for (property, matcher) in clause.properties() {
        let cost = if property == primary_field {
            Some(storage.primary.estimate(matcher))
        } else {
            storage.index_for(property).map(|index| {
                let keys = index.estimate(matcher);
                (keys as f64 * index.fan_out()).round() as u64
            })
        };

        if let Some(cost) = cost {
            if cost > 0 && cheapest.is_none_or(|min| cost < min) {
                cheapest = Some(cost);
            }
        }
    }
    cheapest
}

/// The executor intersects `And` children, so the cheapest computable child
/// bounds the work; children with unknown cost contribute nothing.
fn analyze_and(storage: &TableStorage, primary_field: &str, children: &[Filter]) -> Option<u64> {
    children
        .iter()
        .filter_map(|child| analyze(storage, primary_field, child))
        .min()
}

/// A union must touch every branch, so `Or` costs the sum of its children.
/// One unknown child makes the whole union unknown.
fn analyze_or(storage: &TableStorage, primary_field: &str, children: &[Filter]) -> Option<u64> {
    let mut total: u64 = 0;
    for child in children {
        total = total.saturating_add(analyze(storage, primary_field, child)?);
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableOptions;
    use crate::query::matcher::{eq, gte, lt};
    use crate::record::Record;
    use crate::value::Value;

    /// Ages 20..=29 twice over: two records per age, pk 0..20.
    fn storage_with_ages() -> TableStorage {
        let options = TableOptions::new("id").index("age");
        let mut storage = TableStorage::new(&options);
        for pk in 0..20i64 {
            let age = 20 + pk % 10;
            let record = Record::new().with("id", pk).with("age", age);
            storage.indexes[0].insert(Value::Int(age), Value::Int(pk));
            storage.primary.insert(Value::Int(pk), record);
        }
        storage
    }

    #[test]
    fn primary_point_lookup_costs_one() {
        let storage = storage_with_ages();
        let filter = Filter::field("id", eq(3));
        assert_eq!(analyze(&storage, "id", &filter), Some(1));
    }

    #[test]
    fn primary_range_counts_keys() {
        let storage = storage_with_ages();
        let filter = Filter::field("id", gte(15));
        assert_eq!(analyze(&storage, "id", &filter), Some(5));
    }

    #[test]
    fn secondary_scales_by_fan_out() {
        let storage = storage_with_ages();
        // 4 keys >= 26, two records per key.
        let filter = Filter::field("age", gte(26));
        assert_eq!(analyze(&storage, "id", &filter), Some(8));
        // Point lookup on a secondary approximates one bucket.
        let filter = Filter::field("age", eq(25));
        assert_eq!(analyze(&storage, "id", &filter), Some(2));
    }

    #[test]
    fn where_takes_cheapest_path() {
        let storage = storage_with_ages();
        let clause = WhereClause::new().field("id", eq(3)).field("age", gte(20));
        assert_eq!(analyze(&storage, "id", &Filter::Where(clause)), Some(1));
    }

    #[test]
    fn unindexed_property_is_unknown() {
        let storage = storage_with_ages();
        let filter = Filter::field("name", eq("Alice"));
        assert_eq!(analyze(&storage, "id", &filter), None);
    }

    #[test]
    fn zero_estimates_are_not_viable_paths() {
        let storage = storage_with_ages();
        // No key is below 20: the age path estimates 0 and is skipped, and
        // with no other indexed property the cost is unknown.
        let filter = Filter::field("age", lt(20));
        assert_eq!(analyze(&storage, "id", &filter), None);
    }

    #[test]
    fn and_takes_cheapest_child() {
        let storage = storage_with_ages();
        let filter = Filter::and(vec![
            Filter::field("age", gte(26)),
            Filter::field("id", eq(3)),
            Filter::field("name", eq("Alice")),
        ]);
        assert_eq!(analyze(&storage, "id", &filter), Some(1));
    }

    #[test]
    fn or_sums_children() {
        let storage = storage_with_ages();
        let filter = Filter::or(vec![
            Filter::field("id", eq(3)),
            Filter::field("age", gte(26)),
        ]);
        assert_eq!(analyze(&storage, "id", &filter), Some(9));
    }

    #[test]
    fn or_with_unknown_child_is_unknown() {
        let storage = storage_with_ages();
        let filter = Filter::or(vec![
            Filter::field("id", eq(3)),
            Filter::field("name", eq("Alice")),
        ]);
        assert_eq!(analyze(&storage, "id", &filter), None);
    }

    #[test]
    fn empty_where_costs_nothing() {
        let storage = storage_with_ages();
        let filter = Filter::Where(WhereClause::new());
        assert_eq!(analyze(&storage, "id", &filter), Some(0));
    }
}
