//! Middleware hook chain.
//!
//! Every public operation runs through an ordered chain of hooks: all
//! database-scoped hooks in registration order, then all table-scoped hooks
//! in registration order, then the built-in implementation. Each hook
//! receives the operation context plus a continuation; it may inspect or
//! rewrite the parameters, short-circuit with its own result, or proceed.
//! The chain is rebuilt per invocation from the registered lists — there is
//! no shared mutable chain object, so concurrent invocations are
//! independent.

use crate::error::EngineResult;
use crate::query::filter::Filter;
use crate::record::{Patch, Record};
use crate::value::Value;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// The operation a hook is intercepting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookAction {
    /// Single insert.
    Insert,
    /// Batch insert.
    InsertMany,
    /// Single update by patch.
    Update,
    /// Batch update by patches.
    UpdateMany,
    /// Filtered update with a transform.
    UpdateWhere,
    /// Single removal by key.
    Remove,
    /// Batch removal by keys.
    RemoveMany,
    /// Filtered removal.
    RemoveWhere,
    /// Single upsert.
    Upsert,
    /// Batch upsert.
    UpsertMany,
    /// Filtered read.
    Many,
    /// First matching record.
    First,
    /// Exactly one matching record.
    One,
    /// Count of matching records.
    Count,
    /// Drop all records.
    Clear,
    /// Live query subscription.
    Watch,
}

impl HookAction {
    /// Stable name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            HookAction::Insert => "insert",
            HookAction::InsertMany => "insert_many",
            HookAction::Update => "update",
            HookAction::UpdateMany => "update_many",
            HookAction::UpdateWhere => "update_where",
            HookAction::Remove => "remove",
            HookAction::RemoveMany => "remove_many",
            HookAction::RemoveWhere => "remove_where",
            HookAction::Upsert => "upsert",
            HookAction::UpsertMany => "upsert_many",
            HookAction::Many => "many",
            HookAction::First => "first",
            HookAction::One => "one",
            HookAction::Count => "count",
            HookAction::Clear => "clear",
            HookAction::Watch => "watch",
        }
    }
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an intercepted operation.
///
/// Hooks may rewrite these before proceeding; the shape must stay
/// compatible with the action or the implementation fails with
/// [`HookArgsMismatch`](crate::EngineError::HookArgsMismatch). The
/// `update_where` transform itself is not carried here — it stays bound to
/// the implementation; hooks rewrite the filter.
#[derive(Debug, Clone, PartialEq)]
pub enum HookArgs {
    /// A record (insert, upsert).
    Record(Record),
    /// A batch of records (insert_many, upsert_many).
    Records(Vec<Record>),
    /// A patch (update).
    Patch(Patch),
    /// A batch of patches (update_many).
    Patches(Vec<Patch>),
    /// A primary key (remove).
    Key(Value),
    /// A batch of primary keys (remove_many).
    Keys(Vec<Value>),
    /// An optional filter (reads, update_where, remove_where, watch).
    Filter(Option<Filter>),
    /// No parameters (clear).
    None,
}

/// Result of an intercepted operation.
pub enum HookOutcome {
    /// The affected primary key.
    Key(Value),
    /// The affected primary keys.
    Keys(Vec<Value>),
    /// The resulting records.
    Records(Vec<Record>),
    /// At most one resulting record.
    Record(Option<Record>),
    /// A count of affected or matching records.
    Count(usize),
    /// Whether a single removal took effect.
    Removed(bool),
    /// A live query subscription.
    Subscription(Receiver<Vec<Record>>),
    /// Completed with nothing to report.
    Done,
}

impl fmt::Debug for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOutcome::Key(key) => f.debug_tuple("Key").field(key).finish(),
            HookOutcome::Keys(keys) => f.debug_tuple("Keys").field(keys).finish(),
            HookOutcome::Records(records) => f.debug_tuple("Records").field(records).finish(),
            HookOutcome::Record(record) => f.debug_tuple("Record").field(record).finish(),
            HookOutcome::Count(count) => f.debug_tuple("Count").field(count).finish(),
            HookOutcome::Removed(removed) => f.debug_tuple("Removed").field(removed).finish(),
            HookOutcome::Subscription(_) => f.write_str("Subscription(..)"),
            HookOutcome::Done => f.write_str("Done"),
        }
    }
}

/// Result type returned through the hook chain.
pub type HookResult = EngineResult<HookOutcome>;

/// A registered hook.
pub type Hook = dyn Fn(HookContext<'_>) -> HookResult + Send + Sync;

/// Context handed to a hook, carrying the continuation.
pub struct HookContext<'a> {
    /// The intercepted action.
    pub action: HookAction,
    /// Name of the table the operation targets.
    pub table: &'a str,
    /// Parameters of the operation, possibly rewritten by earlier hooks.
    pub args: HookArgs,
    next: Next<'a>,
}

impl HookContext<'_> {
    /// Invokes the rest of the chain with the current parameters.
    pub fn proceed(self) -> HookResult {
        let args = self.args;
        self.next.run(args)
    }

    /// Invokes the rest of the chain with rewritten parameters.
    pub fn proceed_with(self, args: HookArgs) -> HookResult {
        self.next.run(args)
    }
}

/// The continuation: the remaining hooks plus the terminal implementation.
struct Next<'a> {
    rest: &'a [Arc<Hook>],
    action: HookAction,
    table: &'a str,
    terminal: &'a dyn Fn(HookArgs) -> HookResult,
}

impl Next<'_> {
    fn run(self, args: HookArgs) -> HookResult {
        match self.rest.split_first() {
            Some((hook, rest)) => {
                tracing::trace!(action = self.action.as_str(), table = self.table, "hook");
                hook(HookContext {
                    action: self.action,
                    table: self.table,
                    args,
                    next: Next {
                        rest,
                        action: self.action,
                        table: self.table,
                        terminal: self.terminal,
                    },
                })
            }
            None => (self.terminal)(args),
        }
    }
}

/// Runs `args` through `hooks` and, if no hook short-circuits, `terminal`.
pub(crate) fn run(
    hooks: &[Arc<Hook>],
    action: HookAction,
    table: &str,
    args: HookArgs,
    terminal: &dyn Fn(HookArgs) -> HookResult,
) -> HookResult {
    Next {
        rest: hooks,
        action,
        table,
        terminal,
    }
    .run(args)
}
