//! Candidate selection: picking an index access path for a filter.
//!
//! Selection produces a candidate *superset* of the matching records, or
//! signals that a full table scan is required. Either way the caller must
//! re-apply the filter evaluator — the index lookup is an acceleration, not
//! a proof.

use crate::index::TableStorage;
use crate::query::filter::{Filter, WhereClause};
use crate::record::Record;
use crate::value::Value;
use std::collections::BTreeMap;
use std::collections::HashSet;

/// The result of candidate selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Candidate records selected through an index.
    Rows(Vec<Record>),
    /// No applicable index: the caller must iterate every record.
    FullScan,
}

/// Selects candidate records for `filter`.
pub(crate) fn select(storage: &TableStorage, primary_field: &str, filter: &Filter) -> Selection {
    match filter {
        Filter::Where(clause) => select_where(storage, primary_field, clause),
        Filter::And(children) => select_and(storage, primary_field, children),
        Filter::Or(children) => select_or(storage, primary_field, children),
    }
}

/// Access-path choice for a where-clause.
///
/// The primary key wins whenever it appears in the clause, regardless of
/// analyzed cost; otherwise the first *declared* secondary index with a
/// constrained field is used. This fixed heuristic intentionally diverges
/// from the analyzer's minimum-cost estimate.
fn select_where(storage: &TableStorage, primary_field: &str, clause: &WhereClause) -> Selection {
    if clause.is_empty() {
        return Selection::FullScan;
    }

    if let Some(matcher) = clause.get(primary_field) {
        return Selection::Rows(storage.primary.select(matcher));
    }

    for index in &storage.indexes {
        if let Some(matcher) = clause.get(index.field()) {
            let rows = index
                .select(matcher)
                .iter()
                .filter_map(|primary_key| storage.primary.get(primary_key).cloned())
                .collect();
            return Selection::Rows(rows);
        }
    }

    Selection::FullScan
}

/// Intersection of child selections by primary-key identity.
///
/// A child that requires a full scan contributes no constraint. A concrete
/// child with an empty candidate set short-circuits the whole conjunction
/// to empty. An `And` with no children yields an empty set — logically "no
/// constraints" would match everything, but this behavior is preserved
/// deliberately.
fn select_and(storage: &TableStorage, primary_field: &str, children: &[Filter]) -> Selection {
    if children.is_empty() {
        return Selection::Rows(Vec::new());
    }
    if let [child] = children {
        return select(storage, primary_field, child);
    }

    let mut intersection: Option<Vec<Record>> = None;
    for child in children {
        let rows = match select(storage, primary_field, child) {
            Selection::FullScan => continue,
            Selection::Rows(rows) => rows,
        };
        if rows.is_empty() {
            return Selection::Rows(Vec::new());
        }
        intersection = Some(match intersection {
            None => rows,
            Some(current) => {
                let keep: HashSet<&Value> = rows
                    .iter()
                    .filter_map(|record| record.get(primary_field))
                    .collect();
                current
                    .into_iter()
                    .filter(|record| {
                        record
                            .get(primary_field)
                            .is_some_and(|key| keep.contains(key))
                    })
                    .collect()
            }
        });
    }

    match intersection {
        Some(rows) => Selection::Rows(rows),
        None => Selection::FullScan,
    }
}

/// Union of child selections, de-duplicated by primary key.
///
/// If any child requires a full scan the whole union does: it cannot be
/// assembled from a partial lookup plus an unscanned remainder.
fn select_or(storage: &TableStorage, primary_field: &str, children: &[Filter]) -> Selection {
    let mut union: BTreeMap<Value, Record> = BTreeMap::new();
    for child in children {
        match select(storage, primary_field, child) {
            Selection::FullScan => return Selection::FullScan,
            Selection::Rows(rows) => {
                for record in rows {
                    if let Some(key) = record.get(primary_field).cloned() {
                        union.entry(key).or_insert(record);
                    }
                }
            }
        }
    }
    Selection::Rows(union.into_values().collect())
}
