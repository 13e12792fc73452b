//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases and common
//! test scenarios.

use briskdb_core::{Database, Record, Table, TableOptions};
use std::sync::Arc;
use uuid::Uuid;

/// Runs a test against a fresh database.
///
/// # Example
///
/// ```rust,ignore
/// use briskdb_testkit::with_test_db;
///
/// #[test]
/// fn my_test() {
///     with_test_db(|db| {
///         let users = users_table(db);
///         // ... test operations
///     });
/// }
/// ```
pub fn with_test_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let db = Database::new();
    f(&db)
}

/// Creates the standard `users` table: primary key `id`, `age` indexed.
pub fn users_table(db: &Database) -> Arc<Table> {
    db.create_table("users", TableOptions::new("id").index("age"))
        .expect("users table should not exist yet")
}

/// Generates a fresh string primary key.
pub fn new_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a user record with a generated primary key.
pub fn user(name: &str, age: i64) -> Record {
    Record::from_json(&serde_json::json!({
        "id": new_user_id(),
        "name": name,
        "age": age,
    }))
    .expect("a user literal is a valid record")
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a database with a `users` table holding `count` records with
    /// ages spread over 20..=59.
    pub fn populated_users(count: usize) -> (Database, Arc<Table>) {
        let db = Database::new();
        let users = users_table(&db);

        let records = (0..count)
            .map(|i| user(&format!("user_{i}"), 20 + (i as i64) % 40))
            .collect();
        users
            .insert_many(records)
            .expect("generated users have unique ids");

        (db, users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briskdb_core::{gte, Filter};

    #[test]
    fn with_test_db_runs_closure() {
        let count = with_test_db(|db| {
            let users = users_table(db);
            users.insert(user("Alice", 23)).unwrap();
            users.count(None).unwrap()
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(new_user_id(), new_user_id());
    }

    #[test]
    fn populated_scenario() {
        let (_db, users) = scenarios::populated_users(10);
        assert_eq!(users.count(None).unwrap(), 10);

        let older = users.many(Some(&Filter::field("age", gte(25)))).unwrap();
        assert_eq!(older.len(), 5);
    }
}
