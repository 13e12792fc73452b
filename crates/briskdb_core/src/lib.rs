//! # BriskDB Core
//!
//! An embedded, in-memory record engine.
//!
//! This crate provides:
//! - Tables of dynamic records with one primary and any number of secondary
//!   ordered indexes
//! - A composable filter language (where-clauses, `AND`/`OR`) with
//!   per-property matchers
//! - Index-accelerated query execution with a full-scan fallback, plus a
//!   cost analyzer for introspection
//! - A mutation pipeline (insert/update/remove/upsert, single and batch)
//!   that keeps indexes consistent and emits change events
//! - A continuation-passing middleware chain around every operation
//!
//! ```rust
//! use briskdb_core::{gte, Database, Filter, Record, TableOptions};
//!
//! # fn main() -> briskdb_core::EngineResult<()> {
//! let db = Database::new();
//! let users = db.create_table("users", TableOptions::new("id").index("age"))?;
//!
//! users.insert(Record::new().with("id", 1).with("name", "Alice").with("age", 23))?;
//! users.insert(Record::new().with("id", 2).with("name", "Bob").with("age", 45))?;
//! users.insert(Record::new().with("id", 3).with("name", "Charlie").with("age", 34))?;
//!
//! let adults = users.many(Some(&Filter::field("age", gte(30))))?;
//! assert_eq!(adults.len(), 2);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod hooks;
pub mod index;
pub mod query;
pub mod record;
pub mod stats;
pub mod table;
pub mod value;

pub use config::TableOptions;
pub use database::Database;
pub use error::{EngineError, EngineResult};
pub use events::{ChangeEvent, UpdatedPair};
pub use hooks::{HookAction, HookArgs, HookContext, HookOutcome, HookResult};
pub use query::filter::{Filter, WhereClause};
pub use query::matcher::{eq, gt, gte, lt, lte, Matcher};
pub use query::select::Selection;
pub use record::{Patch, Record};
pub use stats::{IndexStats, TableStats};
pub use table::Table;
pub use value::Value;
