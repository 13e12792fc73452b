//! Change events and live query subscriptions.
//!
//! Every mutation dispatches one [`ChangeEvent`] per operation batch after
//! index maintenance completes. Two kinds of consumers hang off the feed:
//! raw event subscribers, and watchers — live queries that receive the full
//! result set their filter currently selects, refreshed after each
//! mutation.

use crate::query::filter::Filter;
use crate::record::Record;
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// Before/after snapshots of one updated record.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedPair {
    /// The record before the update.
    pub before: Record,
    /// The record after the update.
    pub after: Record,
}

/// A change to a table, batched per operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// Records were inserted.
    Insert {
        /// The inserted records.
        records: Vec<Record>,
    },
    /// Records were updated.
    Update {
        /// Old and new snapshots, one per updated record.
        changes: Vec<UpdatedPair>,
    },
    /// Records were removed.
    Remove {
        /// The removed records.
        records: Vec<Record>,
    },
    /// The table was cleared.
    Clear,
}

/// A live query registered through `watch`.
struct Watcher {
    filter: Option<Filter>,
    sender: Sender<Vec<Record>>,
}

/// Distributes change events and watch refreshes for one table.
///
/// Disconnected consumers are pruned on the next dispatch.
#[derive(Default)]
pub(crate) struct ChangeFeed {
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
    watchers: RwLock<Vec<Watcher>>,
}

impl ChangeFeed {
    /// Creates an empty feed.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Subscribes to raw change events.
    pub(crate) fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to all subscribers, dropping disconnected ones.
    pub(crate) fn emit(&self, event: ChangeEvent) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Registers a watcher and delivers its initial result set.
    pub(crate) fn watch(
        &self,
        filter: Option<Filter>,
        initial: Vec<Record>,
    ) -> Receiver<Vec<Record>> {
        let (tx, rx) = mpsc::channel();
        // The receiver is still in scope, so the initial send cannot fail.
        let _ = tx.send(initial);
        self.watchers.write().push(Watcher { filter, sender: tx });
        rx
    }

    /// Re-evaluates every watcher and pushes fresh result sets, dropping
    /// disconnected watchers.
    pub(crate) fn refresh_watchers<F>(&self, evaluate: F)
    where
        F: Fn(Option<&Filter>) -> Vec<Record>,
    {
        let mut watchers = self.watchers.write();
        watchers.retain(|watcher| {
            let results = evaluate(watcher.filter.as_ref());
            watcher.sender.send(results).is_ok()
        });
    }

    /// Number of live event subscribers.
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Number of live watchers.
    pub(crate) fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::matcher::gt;

    fn record(id: i64) -> Record {
        Record::new().with("id", id)
    }

    #[test]
    fn emit_and_receive() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();

        let event = ChangeEvent::Insert {
            records: vec![record(1)],
        };
        feed.emit(event.clone());

        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn multiple_subscribers() {
        let feed = ChangeFeed::new();
        let rx1 = feed.subscribe();
        let rx2 = feed.subscribe();

        feed.emit(ChangeEvent::Clear);

        assert_eq!(rx1.try_recv().unwrap(), ChangeEvent::Clear);
        assert_eq!(rx2.try_recv().unwrap(), ChangeEvent::Clear);
    }

    #[test]
    fn disconnected_subscribers_are_pruned() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);
        feed.emit(ChangeEvent::Clear);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn watcher_gets_initial_and_refreshed_results() {
        let feed = ChangeFeed::new();
        let rx = feed.watch(Some(Filter::field("id", gt(0))), vec![record(1)]);

        assert_eq!(rx.try_recv().unwrap(), vec![record(1)]);

        feed.refresh_watchers(|_filter| vec![record(1), record(2)]);
        assert_eq!(rx.try_recv().unwrap(), vec![record(1), record(2)]);
    }

    #[test]
    fn dropped_watchers_are_pruned() {
        let feed = ChangeFeed::new();
        let rx = feed.watch(None, Vec::new());
        assert_eq!(feed.watcher_count(), 1);

        drop(rx);
        feed.refresh_watchers(|_| Vec::new());
        assert_eq!(feed.watcher_count(), 0);
    }
}
