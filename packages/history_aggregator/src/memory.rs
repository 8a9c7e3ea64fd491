//! In-memory [`History`]: an entry stack and a cursor, with no browser behind it.

use serde_json::Value;
use std::sync::Mutex;
use tracing::debug;

use crate::codec;
use crate::error::HistoryError;
use crate::history::{History, Listener, Listeners, Subscription, lock};
use crate::location::{Action, Location, LocationDescriptor};

struct MemoryState {
    entries: Vec<Location>,
    index: usize,
    closed: bool,
}

pub struct MemoryHistory {
    state: Mutex<MemoryState>,
    listeners: Listeners,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}

impl MemoryHistory {
    /// Starts at `entries[index]` (clamped). An empty list starts at `/`.
    pub fn new(entries: Vec<Location>, index: usize) -> Self {
        let entries = if entries.is_empty() {
            vec![Location::new("/")]
        } else {
            entries
        };
        let index = index.min(entries.len() - 1);
        Self {
            state: Mutex::new(MemoryState {
                entries,
                index,
                closed: false,
            }),
            listeners: Listeners::default(),
        }
    }

    /// Single-entry history at `location`.
    pub fn at(location: impl Into<LocationDescriptor>) -> Self {
        Self::new(vec![codec::normalize(location)], 0)
    }

    pub fn length(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn index(&self) -> usize {
        lock(&self.state).index
    }

    pub fn entries(&self) -> Vec<Location> {
        lock(&self.state).entries.clone()
    }

    pub fn can_go(&self, delta: isize) -> bool {
        let state = lock(&self.state);
        let target = (state.index as isize).saturating_add(delta);
        target >= 0 && (target as usize) < state.entries.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Rejects all further navigation and drops every listener.
    pub fn close(&self) {
        lock(&self.state).closed = true;
        self.listeners.clear();
    }

    fn navigate(
        &self,
        location: LocationDescriptor,
        state: Option<Value>,
        action: Action,
    ) -> Result<(), HistoryError> {
        let mut next = codec::normalize(location);
        if state.is_some() {
            next.state = state;
        }
        {
            let mut history = lock(&self.state);
            if history.closed {
                return Err(HistoryError::Closed);
            }
            let index = history.index;
            match action {
                Action::Push => {
                    history.entries.truncate(index + 1);
                    history.entries.push(next.clone());
                    history.index = index + 1;
                }
                _ => history.entries[index] = next.clone(),
            }
        }
        debug!(action = %action, path = %next, "memory history navigated");
        self.listeners.notify(&next, action);
        Ok(())
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Location {
        let state = lock(&self.state);
        state.entries[state.index].clone()
    }

    fn push(&self, location: LocationDescriptor, state: Option<Value>) -> Result<(), HistoryError> {
        self.navigate(location, state, Action::Push)
    }

    fn replace(
        &self,
        location: LocationDescriptor,
        state: Option<Value>,
    ) -> Result<(), HistoryError> {
        self.navigate(location, state, Action::Replace)
    }

    /// Moves the cursor, clamped to the stack. Moving nowhere notifies no one.
    fn go(&self, delta: isize) -> Result<(), HistoryError> {
        let current = {
            let mut state = lock(&self.state);
            if state.closed {
                return Err(HistoryError::Closed);
            }
            let last = state.entries.len() as isize - 1;
            let target = (state.index as isize).saturating_add(delta).clamp(0, last) as usize;
            if target == state.index {
                return Ok(());
            }
            state.index = target;
            state.entries[target].clone()
        };
        debug!(delta, path = %current, "memory history moved");
        self.listeners.notify(&current, Action::Pop);
        Ok(())
    }

    fn listen(&self, listener: Listener) -> Result<Subscription, HistoryError> {
        if lock(&self.state).closed {
            return Err(HistoryError::Closed);
        }
        Ok(self.listeners.add(listener))
    }
}
