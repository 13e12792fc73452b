//! Tables: record storage, indexes, reads and hook dispatch.

mod write;

use crate::config::TableOptions;
use crate::error::{EngineError, EngineResult};
use crate::events::{ChangeEvent, ChangeFeed};
use crate::hooks::{self, Hook, HookAction, HookArgs, HookContext, HookOutcome, HookResult};
use crate::index::TableStorage;
use crate::query::analyze;
use crate::query::filter::{self, Filter};
use crate::query::select::{self, Selection};
use crate::record::Record;
use crate::stats::{IndexStats, TableStats};
use parking_lot::RwLock;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// A table of records with one primary and any number of secondary indexes.
///
/// All reads and writes run through the middleware chain: database-scoped
/// hooks first, then table-scoped hooks, then the built-in implementation.
/// Reads hand out owned copies of stored records; mutating a returned record
/// never touches the table.
pub struct Table {
    name: String,
    options: TableOptions,
    storage: RwLock<TableStorage>,
    hooks: RwLock<Vec<Arc<Hook>>>,
    database_hooks: Arc<RwLock<Vec<Arc<Hook>>>>,
    feed: ChangeFeed,
}

impl Table {
    /// Creates a standalone table (no database-scoped hooks).
    pub fn new(name: impl Into<String>, options: TableOptions) -> Self {
        Self::with_database_hooks(name, options, Arc::default())
    }

    /// Creates a table sharing a database's hook list.
    pub(crate) fn with_database_hooks(
        name: impl Into<String>,
        options: TableOptions,
        database_hooks: Arc<RwLock<Vec<Arc<Hook>>>>,
    ) -> Self {
        let storage = TableStorage::new(&options);
        Self {
            name: name.into(),
            options,
            storage: RwLock::new(storage),
            hooks: RwLock::new(Vec::new()),
            database_hooks,
            feed: ChangeFeed::new(),
        }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The construction-time options.
    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.storage.read().primary.len()
    }

    /// Returns true if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.storage.read().primary.is_empty()
    }

    /// Registers a table-scoped hook. Hooks run in registration order,
    /// after all database-scoped hooks.
    pub fn use_hook<F>(&self, hook: F)
    where
        F: Fn(HookContext<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.write().push(Arc::new(hook));
    }

    /// Subscribes to this table's change events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    /// Returns all records matching `filter`, or every record when `None`.
    pub fn many(&self, filter: Option<&Filter>) -> EngineResult<Vec<Record>> {
        let outcome = self.dispatch(HookAction::Many, HookArgs::Filter(filter.cloned()), &|args| {
            let HookArgs::Filter(filter) = args else {
                return Err(EngineError::HookArgsMismatch { action: "many" });
            };
            Ok(HookOutcome::Records(self.read_many(filter.as_ref())))
        })?;
        match outcome {
            HookOutcome::Records(records) => Ok(records),
            _ => Err(EngineError::HookOutcomeMismatch { action: "many" }),
        }
    }

    /// Counts the records matching `filter`, or all records when `None`.
    pub fn count(&self, filter: Option<&Filter>) -> EngineResult<usize> {
        let outcome = self.dispatch(
            HookAction::Count,
            HookArgs::Filter(filter.cloned()),
            &|args| {
                let HookArgs::Filter(filter) = args else {
                    return Err(EngineError::HookArgsMismatch { action: "count" });
                };
                Ok(HookOutcome::Count(self.read_many(filter.as_ref()).len()))
            },
        )?;
        match outcome {
            HookOutcome::Count(count) => Ok(count),
            _ => Err(EngineError::HookOutcomeMismatch { action: "count" }),
        }
    }

    /// Returns the first matching record in primary-key order, or `None`.
    pub fn first(&self, filter: Option<&Filter>) -> EngineResult<Option<Record>> {
        let outcome = self.dispatch(
            HookAction::First,
            HookArgs::Filter(filter.cloned()),
            &|args| {
                let HookArgs::Filter(filter) = args else {
                    return Err(EngineError::HookArgsMismatch { action: "first" });
                };
                let primary_field = self.options.primary_field.as_str();
                let first = self
                    .read_many(filter.as_ref())
                    .into_iter()
                    .min_by(|a, b| a.get(primary_field).cmp(&b.get(primary_field)));
                Ok(HookOutcome::Record(first))
            },
        )?;
        match outcome {
            HookOutcome::Record(record) => Ok(record),
            _ => Err(EngineError::HookOutcomeMismatch { action: "first" }),
        }
    }

    /// Returns the single record matching `filter`.
    ///
    /// Errors with [`EngineError::NoMatchingRecord`] on zero matches and
    /// [`EngineError::NotUnique`] on more than one.
    pub fn one(&self, filter: &Filter) -> EngineResult<Record> {
        let outcome = self.dispatch(
            HookAction::One,
            HookArgs::Filter(Some(filter.clone())),
            &|args| {
                let HookArgs::Filter(Some(filter)) = args else {
                    return Err(EngineError::HookArgsMismatch { action: "one" });
                };
                let mut matches = self.read_many(Some(&filter));
                match matches.len() {
                    1 => Ok(HookOutcome::Record(Some(matches.remove(0)))),
                    0 => Err(EngineError::NoMatchingRecord {
                        table: self.name.clone(),
                    }),
                    count => Err(EngineError::NotUnique {
                        table: self.name.clone(),
                        count,
                    }),
                }
            },
        )?;
        match outcome {
            HookOutcome::Record(Some(record)) => Ok(record),
            HookOutcome::Record(None) => Err(EngineError::NoMatchingRecord {
                table: self.name.clone(),
            }),
            _ => Err(EngineError::HookOutcomeMismatch { action: "one" }),
        }
    }

    /// Subscribes to the result stream `many` would produce for `filter`.
    ///
    /// The receiver gets the current result set immediately and a refreshed
    /// set after every mutation of this table.
    pub fn watch(&self, filter: Option<Filter>) -> EngineResult<Receiver<Vec<Record>>> {
        let outcome = self.dispatch(HookAction::Watch, HookArgs::Filter(filter), &|args| {
            let HookArgs::Filter(filter) = args else {
                return Err(EngineError::HookArgsMismatch { action: "watch" });
            };
            let initial = self.read_many(filter.as_ref());
            Ok(HookOutcome::Subscription(self.feed.watch(filter, initial)))
        })?;
        match outcome {
            HookOutcome::Subscription(receiver) => Ok(receiver),
            _ => Err(EngineError::HookOutcomeMismatch { action: "watch" }),
        }
    }

    /// Removes every record and all index entries.
    pub fn clear(&self) -> EngineResult<()> {
        let outcome = self.dispatch(HookAction::Clear, HookArgs::None, &|args| {
            let HookArgs::None = args else {
                return Err(EngineError::HookArgsMismatch { action: "clear" });
            };
            self.storage.write().clear();
            self.feed.emit(ChangeEvent::Clear);
            self.refresh_watchers();
            Ok(HookOutcome::Done)
        })?;
        match outcome {
            HookOutcome::Done => Ok(()),
            _ => Err(EngineError::HookOutcomeMismatch { action: "clear" }),
        }
    }

    /// Estimates the relative scan cost of `filter` (see
    /// [`query::analyze`](crate::query::analyze)). `None` means no indexed
    /// property makes the cost computable.
    pub fn analyze(&self, filter: &Filter) -> Option<u64> {
        analyze::analyze(&self.storage.read(), &self.options.primary_field, filter)
    }

    /// Runs candidate selection for `filter` without the final filter pass.
    ///
    /// The rows are a candidate *superset*; `many` re-applies the filter
    /// evaluator before returning anything to a caller. Exposed for
    /// introspection and testing of access-path choice.
    pub fn select(&self, filter: &Filter) -> Selection {
        select::select(&self.storage.read(), &self.options.primary_field, filter)
    }

    /// Record count and per-index statistics.
    pub fn stats(&self) -> TableStats {
        let storage = self.storage.read();
        TableStats {
            records: storage.primary.len(),
            indexes: storage
                .indexes
                .iter()
                .map(|index| IndexStats {
                    field: index.field().to_string(),
                    distinct_keys: index.len(),
                    total_entries: index.total_entries(),
                    fan_out: index.fan_out(),
                })
                .collect(),
        }
    }

    /// Runs an operation through the combined hook chain.
    ///
    /// The chain is snapshotted up front and the registration locks are
    /// released before any hook runs, so hooks may freely call back into
    /// the table.
    pub(crate) fn dispatch(
        &self,
        action: HookAction,
        args: HookArgs,
        terminal: &dyn Fn(HookArgs) -> HookResult,
    ) -> HookResult {
        let chain: Vec<Arc<Hook>> = {
            let database_hooks = self.database_hooks.read();
            let table_hooks = self.hooks.read();
            database_hooks
                .iter()
                .chain(table_hooks.iter())
                .cloned()
                .collect()
        };
        hooks::run(&chain, action, &self.name, args, terminal)
    }

    /// The read path: select candidates through an index, then re-apply the
    /// filter evaluator. Index acceleration never changes the result, only
    /// how many records are touched.
    pub(crate) fn read_many(&self, filter: Option<&Filter>) -> Vec<Record> {
        let storage = self.storage.read();
        match filter {
            None => storage.primary.records(),
            Some(filter) => {
                match select::select(&storage, &self.options.primary_field, filter) {
                    Selection::Rows(candidates) => filter::apply(candidates, filter),
                    Selection::FullScan => {
                        let records = storage.primary.len();
                        if records > self.options.scan_warning_threshold {
                            tracing::warn!(table = %self.name, records, "full table scan");
                        }
                        filter::apply(storage.primary.records(), filter)
                    }
                }
            }
        }
    }

    pub(crate) fn refresh_watchers(&self) {
        self.feed.refresh_watchers(|filter| self.read_many(filter));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::matcher::{eq, gt, gte};
    use crate::value::Value;

    fn user(id: i64, name: &str, age: i64) -> Record {
        Record::new().with("id", id).with("name", name).with("age", age)
    }

    fn users_table() -> Table {
        let table = Table::new("users", TableOptions::new("id").index("age"));
        table
            .insert_many(vec![
                user(1, "Alice", 23),
                user(2, "Bob", 45),
                user(3, "Charlie", 34),
            ])
            .unwrap();
        table
    }

    #[test]
    fn many_without_filter_returns_everything() {
        let table = users_table();
        assert_eq!(table.many(None).unwrap().len(), 3);
    }

    #[test]
    fn many_with_indexed_filter() {
        let table = users_table();
        let result = table.many(Some(&Filter::field("age", gte(30)))).unwrap();
        let mut names: Vec<_> = result
            .iter()
            .map(|r| r.get("name").unwrap().as_text().unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Bob", "Charlie"]);
    }

    #[test]
    fn indexed_and_unindexed_filters_agree() {
        let indexed = users_table();
        let unindexed = Table::new("users", TableOptions::new("id"));
        unindexed
            .insert_many(vec![
                user(1, "Alice", 23),
                user(2, "Bob", 45),
                user(3, "Charlie", 34),
            ])
            .unwrap();

        let filter = Filter::field("age", gt(25));
        let mut a = indexed.many(Some(&filter)).unwrap();
        let mut b = unindexed.many(Some(&filter)).unwrap();
        a.sort_by(|x, y| x.get("id").cmp(&y.get("id")));
        b.sort_by(|x, y| x.get("id").cmp(&y.get("id")));
        assert_eq!(a, b);
    }

    #[test]
    fn count_and_first() {
        let table = users_table();
        assert_eq!(table.count(None).unwrap(), 3);
        assert_eq!(table.count(Some(&Filter::field("age", gt(30)))).unwrap(), 2);

        let first = table.first(None).unwrap().unwrap();
        assert_eq!(first.get("id"), Some(&Value::Int(1)));
        assert!(table
            .first(Some(&Filter::field("age", gt(100))))
            .unwrap()
            .is_none());
    }

    #[test]
    fn one_requires_exactly_one_match() {
        let table = users_table();

        let bob = table.one(&Filter::field("name", eq("Bob"))).unwrap();
        assert_eq!(bob.get("id"), Some(&Value::Int(2)));

        assert!(matches!(
            table.one(&Filter::field("name", eq("Dora"))),
            Err(EngineError::NoMatchingRecord { .. })
        ));
        assert!(matches!(
            table.one(&Filter::field("age", gt(0))),
            Err(EngineError::NotUnique { count: 3, .. })
        ));
    }

    #[test]
    fn returned_records_are_owned_copies() {
        let table = users_table();
        let mut record = table.one(&Filter::field("id", eq(1))).unwrap();
        record.set("name", "Mallory");

        let stored = table.one(&Filter::field("id", eq(1))).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::from("Alice")));
    }

    #[test]
    fn clear_empties_table_and_indexes() {
        let table = users_table();
        table.clear().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.many(Some(&Filter::field("age", gte(0)))).unwrap(), Vec::new());
        assert_eq!(table.stats().indexes[0].total_entries, 0);
    }

    #[test]
    fn watch_streams_result_sets() {
        let table = users_table();
        let rx = table.watch(Some(Filter::field("age", gte(30)))).unwrap();

        assert_eq!(rx.try_recv().unwrap().len(), 2);

        table.insert(user(4, "Dora", 52)).unwrap();
        assert_eq!(rx.try_recv().unwrap().len(), 3);

        table.remove(Value::Int(2)).unwrap();
        assert_eq!(rx.try_recv().unwrap().len(), 2);
    }

    #[test]
    fn stats_report_fan_out() {
        let table = users_table();
        table.insert(user(4, "Dora", 34)).unwrap();

        let stats = table.stats();
        assert_eq!(stats.records, 4);
        assert_eq!(stats.indexes[0].field, "age");
        assert_eq!(stats.indexes[0].distinct_keys, 3);
        assert_eq!(stats.indexes[0].total_entries, 4);
    }

    #[test]
    fn table_hooks_intercept_reads() {
        let table = users_table();
        table.use_hook(|ctx| {
            if ctx.action == HookAction::Count {
                return Ok(HookOutcome::Count(7));
            }
            ctx.proceed()
        });

        assert_eq!(table.count(None).unwrap(), 7);
        // Other actions pass through untouched.
        assert_eq!(table.many(None).unwrap().len(), 3);
    }
}
