//! The navigation-history contract the aggregator wraps and implements.

use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::codec;
use crate::error::HistoryError;
use crate::location::{Action, Location, LocationDescriptor};

/// Change callback: the new location and the transition that produced it.
pub type Listener = Arc<dyn Fn(&Location, Action) + Send + Sync>;

/// A navigation history: a current location, a stack to move through, and
/// change notifications.
///
/// Listeners are invoked synchronously from inside `push`, `replace` and
/// `go`, so a caller observes the new location before the call returns.
pub trait History: Send + Sync {
    fn location(&self) -> Location;

    /// Navigates to a new entry. `state`, when given, replaces the state
    /// carried by `location`.
    fn push(&self, location: LocationDescriptor, state: Option<Value>) -> Result<(), HistoryError>;

    /// Overwrites the current entry.
    fn replace(&self, location: LocationDescriptor, state: Option<Value>)
    -> Result<(), HistoryError>;

    fn go(&self, delta: isize) -> Result<(), HistoryError>;

    fn go_back(&self) -> Result<(), HistoryError> {
        self.go(-1)
    }

    fn go_forward(&self) -> Result<(), HistoryError> {
        self.go(1)
    }

    fn listen(&self, listener: Listener) -> Result<Subscription, HistoryError>;

    fn create_href(&self, location: &Location) -> String {
        codec::create_path(location)
    }
}

/// Handle to a listener registration. Dropping it unsubscribes.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription that is not attached to anything.
    pub fn inert() -> Self {
        Self { release: None }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    /// Keeps the listener registered for as long as the history lives.
    pub fn detach(mut self) {
        self.release = None;
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Ordered listener registry.
///
/// The table lock is never held while a listener runs, so listeners may
/// navigate or (un)subscribe re-entrantly.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    table: Arc<Mutex<ListenerTable>>,
}

impl Listeners {
    pub(crate) fn add(&self, listener: Listener) -> Subscription {
        let id = {
            let mut table = lock(&self.table);
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push((id, listener));
            id
        };
        let table: Weak<Mutex<ListenerTable>> = Arc::downgrade(&self.table);
        Subscription::new(move || {
            if let Some(table) = table.upgrade() {
                lock(&table).entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub(crate) fn notify(&self, location: &Location, action: Action) {
        let snapshot: Vec<Listener> = lock(&self.table)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(location, action);
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.table).entries.len()
    }

    pub(crate) fn clear(&self) {
        lock(&self.table).entries.clear();
    }
}
