//! Database facade: named tables and database-scoped hooks.

use crate::config::TableOptions;
use crate::error::{EngineError, EngineResult};
use crate::hooks::{Hook, HookContext, HookResult};
use crate::table::Table;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A set of named tables sharing a database-scoped hook list.
///
/// Hooks registered here run ahead of every table's own hooks, for every
/// operation on every table — including tables created after the hook was
/// registered.
///
/// # Example
///
/// ```rust,ignore
/// use briskdb_core::{Database, Record, TableOptions};
///
/// let db = Database::new();
/// let users = db.create_table("users", TableOptions::new("id").index("age"))?;
/// users.insert(Record::new().with("id", 1).with("age", 23))?;
/// ```
#[derive(Default)]
pub struct Database {
    tables: RwLock<HashMap<String, Arc<Table>>>,
    hooks: Arc<RwLock<Vec<Arc<Hook>>>>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a table.
    ///
    /// Errors with [`EngineError::DuplicateTable`] if the name is taken.
    pub fn create_table(
        &self,
        name: impl Into<String>,
        options: TableOptions,
    ) -> EngineResult<Arc<Table>> {
        let name = name.into();
        let mut tables = self.tables.write();
        if tables.contains_key(&name) {
            return Err(EngineError::DuplicateTable { name });
        }
        let table = Arc::new(Table::with_database_hooks(
            name.clone(),
            options,
            Arc::clone(&self.hooks),
        ));
        tables.insert(name, Arc::clone(&table));
        Ok(table)
    }

    /// Looks up a registered table.
    pub fn table(&self, name: &str) -> EngineResult<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Unregisters a table, returning whether it existed.
    ///
    /// Existing handles to the table keep working; the database simply
    /// forgets the name.
    pub fn drop_table(&self, name: &str) -> bool {
        self.tables.write().remove(name).is_some()
    }

    /// Registered table names, unordered.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Registers a database-scoped hook.
    ///
    /// Database hooks run before table hooks, in registration order.
    pub fn use_hook<F>(&self, hook: F)
    where
        F: Fn(HookContext<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.write().push(Arc::new(hook));
    }
}
