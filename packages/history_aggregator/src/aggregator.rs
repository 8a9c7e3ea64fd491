//! Role-scoped view over a shared [`History`].
//!
//! Two [`AggregatedHistory`] values, one per [`Role`], wrap the same
//! underlying history and the same parameter name. Each one reads and
//! writes only its own half of the shared location; the codec keeps the
//! other half intact.
//!
//! Every view holds exactly one upstream subscription. Each upstream change
//! is decoded once, recorded as the view's current value, broadcast to every
//! [`LocationObservable`] and then handed to the view's own listeners.

use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::codec;
use crate::config::AggregatorConfig;
use crate::error::HistoryError;
use crate::history::{History, Listener, Listeners, Subscription, lock};
use crate::location::{Action, Location, LocationDescriptor, Role};

/// Buffered changes per observable before it starts lagging.
const OBSERVABLE_CAPACITY: usize = 1024;

/// Latest decoded value plus the channel that carries every change.
/// Kept under one lock so a new subscriber's replayed value and its first
/// received change never overlap or leave a gap.
struct LocationBroadcast {
    current: Location,
    tx: broadcast::Sender<Location>,
}

struct ViewShared {
    role: Role,
    param: String,
    listeners: Listeners,
    broadcast: Mutex<Option<LocationBroadcast>>,
}

impl ViewShared {
    fn on_change(&self, full: &Location, action: Action) {
        let partial = codec::decode(full, self.role, &self.param);
        trace!(role = %self.role, action = %action, path = %partial, "fan out location change");
        if let Some(broadcast) = lock(&self.broadcast).as_mut() {
            broadcast.current = partial.clone();
            // No receivers is fine
            let _ = broadcast.tx.send(partial.clone());
        }
        self.listeners.notify(&partial, action);
    }
}

/// A [`History`] that exposes one role's half of a shared location.
///
/// `go`, `go_back` and `go_forward` act on the shared stack as a whole; they
/// cannot be scoped to a role.
///
/// Using two views with the same role and parameter over one history is a
/// caller error and is not checked.
pub struct AggregatedHistory {
    history: Arc<dyn History>,
    shared: Arc<ViewShared>,
    upstream: Mutex<Option<Subscription>>,
}

impl AggregatedHistory {
    /// Attaches a view for `role` to `history`, using `param` as the query
    /// key that carries the secondary location.
    pub fn new(
        history: Arc<dyn History>,
        role: Role,
        param: impl Into<String>,
    ) -> Result<Self, HistoryError> {
        let param = param.into();
        let current = codec::decode(&history.location(), role, &param);
        let (tx, _) = broadcast::channel(OBSERVABLE_CAPACITY);
        let shared = Arc::new(ViewShared {
            role,
            param,
            listeners: Listeners::default(),
            broadcast: Mutex::new(Some(LocationBroadcast { current, tx })),
        });

        let weak = Arc::downgrade(&shared);
        let upstream = history.listen(Arc::new(move |full: &Location, action| {
            if let Some(shared) = weak.upgrade() {
                shared.on_change(full, action);
            }
        }))?;

        debug!(role = %shared.role, param = %shared.param, "aggregated history attached");
        Ok(Self {
            history,
            shared,
            upstream: Mutex::new(Some(upstream)),
        })
    }

    pub fn from_config(
        history: Arc<dyn History>,
        role: Role,
        config: &AggregatorConfig,
    ) -> Result<Self, HistoryError> {
        Self::new(history, role, config.param.clone())
    }

    /// The main and secondary views over one history.
    pub fn pair(
        history: Arc<dyn History>,
        param: impl Into<String>,
    ) -> Result<(Self, Self), HistoryError> {
        let param = param.into();
        let main = Self::new(Arc::clone(&history), Role::Main, param.clone())?;
        let secondary = Self::new(history, Role::Secondary, param)?;
        Ok((main, secondary))
    }

    pub fn role(&self) -> Role {
        self.shared.role
    }

    pub fn param(&self) -> &str {
        &self.shared.param
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.upstream).is_none()
    }

    /// Stream of this role's location. The current value is delivered first,
    /// then one value per upstream change, in order; it ends once the view is
    /// disposed.
    pub fn location_observable(&self) -> LocationObservable {
        let (initial, rx) = match lock(&self.shared.broadcast).as_ref() {
            Some(broadcast) => (broadcast.current.clone(), broadcast.tx.subscribe()),
            None => {
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                (self.location(), rx)
            }
        };
        LocationObservable {
            initial: Some(initial),
            rx,
        }
    }

    /// Detaches from the underlying history and closes every observable.
    /// Calling it again does nothing.
    pub fn dispose(&self) {
        let Some(upstream) = lock(&self.upstream).take() else {
            return;
        };
        upstream.unsubscribe();
        lock(&self.shared.broadcast).take();
        self.shared.listeners.clear();
        debug!(role = %self.shared.role, param = %self.shared.param, "aggregated history disposed");
    }

    /// Full location a navigation of this role to `location` would produce.
    fn resolve(&self, location: LocationDescriptor, state: Option<Value>) -> Location {
        let partial = codec::normalize(location);
        let state = state.or_else(|| partial.state.clone());
        let current = self.history.location();
        let mut full = codec::encode(&partial, &current, self.shared.role, &self.shared.param);
        full.state = state;
        full
    }
}

impl History for AggregatedHistory {
    fn location(&self) -> Location {
        codec::decode(&self.history.location(), self.shared.role, &self.shared.param)
    }

    fn push(&self, location: LocationDescriptor, state: Option<Value>) -> Result<(), HistoryError> {
        let full = self.resolve(location, state);
        debug!(role = %self.shared.role, path = %full, "push");
        self.history.push(full.into(), None)
    }

    fn replace(
        &self,
        location: LocationDescriptor,
        state: Option<Value>,
    ) -> Result<(), HistoryError> {
        let full = self.resolve(location, state);
        debug!(role = %self.shared.role, path = %full, "replace");
        self.history.replace(full.into(), None)
    }

    fn go(&self, delta: isize) -> Result<(), HistoryError> {
        self.history.go(delta)
    }

    fn go_back(&self) -> Result<(), HistoryError> {
        self.history.go_back()
    }

    fn go_forward(&self) -> Result<(), HistoryError> {
        self.history.go_forward()
    }

    /// Registers `listener` for this role's decoded changes. After disposal
    /// the returned subscription is inert and the listener never fires.
    fn listen(&self, listener: Listener) -> Result<Subscription, HistoryError> {
        if self.is_disposed() {
            warn!(role = %self.shared.role, "listen on disposed aggregated history");
            return Ok(Subscription::inert());
        }
        Ok(self.shared.listeners.add(listener))
    }

    fn create_href(&self, location: &Location) -> String {
        let full = codec::encode(
            location,
            &self.history.location(),
            self.shared.role,
            &self.shared.param,
        );
        self.history.create_href(&full)
    }
}

impl Drop for AggregatedHistory {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Replaying stream of one role's decoded location.
pub struct LocationObservable {
    initial: Option<Location>,
    rx: broadcast::Receiver<Location>,
}

impl LocationObservable {
    /// The value current at subscription on the first call, then each change
    /// in the order it happened. `None` once the view has been disposed and
    /// every buffered change has been returned.
    pub async fn next(&mut self) -> Option<Location> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        loop {
            match self.rx.recv().await {
                Ok(location) => return Some(location),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "location observable lagged, oldest changes dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Whether a value is waiting that `next` has not returned yet.
    pub fn has_pending(&self) -> bool {
        self.initial.is_some() || !self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHistory;

    const PARAM: &str = "__sc";

    fn shared_history() -> Arc<MemoryHistory> {
        Arc::new(MemoryHistory::at(
            "/a/logs-app/logs?id=12345&namespace=default&__sc=%2Fa%2Ftraces-app%2Ftrace",
        ))
    }

    #[test]
    fn location_is_role_scoped() {
        let history = shared_history();
        let (main, secondary) = AggregatedHistory::pair(history, PARAM).unwrap();
        assert_eq!(main.location().path(), "/a/logs-app/logs?id=12345&namespace=default");
        assert_eq!(secondary.location().path(), "/a/traces-app/trace");
        assert_eq!(main.role(), Role::Main);
        assert_eq!(secondary.param(), PARAM);
    }

    #[test]
    fn push_forwards_exactly_once() {
        let history = shared_history();
        let secondary = AggregatedHistory::new(history.clone(), Role::Secondary, PARAM).unwrap();
        secondary.push("/x".into(), None).unwrap();
        assert_eq!(history.length(), 2);
        secondary.replace("/y".into(), None).unwrap();
        assert_eq!(history.length(), 2);
        assert_eq!(secondary.location().path(), "/y");
    }

    #[test]
    fn push_carries_only_caller_state() {
        let history = shared_history();
        let (main, secondary) = AggregatedHistory::pair(history.clone(), PARAM).unwrap();
        main.push("/m".into(), Some(serde_json::json!({ "tab": 2 })))
            .unwrap();
        assert_eq!(history.location().state, Some(serde_json::json!({ "tab": 2 })));

        secondary.push("/s".into(), None).unwrap();
        assert_eq!(history.location().state, None);
    }

    #[test]
    fn go_passes_through() {
        let history = shared_history();
        let (main, secondary) = AggregatedHistory::pair(history.clone(), PARAM).unwrap();
        secondary.push("/s".into(), None).unwrap();
        main.go_back().unwrap();
        assert_eq!(secondary.location().path(), "/a/traces-app/trace");
        secondary.go_forward().unwrap();
        assert_eq!(secondary.location().path(), "/s");
        main.go(-1).unwrap();
        assert_eq!(history.index(), 0);
        secondary.go(isize::MAX).unwrap();
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn create_href_encodes_against_current() {
        let history = shared_history();
        let (main, secondary) = AggregatedHistory::pair(history, PARAM).unwrap();
        assert_eq!(
            main.create_href(&Location::new("/m")),
            "/m?__sc=%2Fa%2Ftraces-app%2Ftrace"
        );
        assert_eq!(
            secondary.create_href(&Location::new("/s")),
            "/a/logs-app/logs?id=12345&namespace=default&__sc=%2Fs"
        );
    }

    #[test]
    fn dispose_is_idempotent_and_releases_upstream() {
        let history = shared_history();
        let view = AggregatedHistory::new(history.clone(), Role::Main, PARAM).unwrap();
        assert_eq!(history.listener_count(), 1);
        view.dispose();
        view.dispose();
        assert!(view.is_disposed());
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn drop_releases_upstream() {
        let history = shared_history();
        {
            let _pair = AggregatedHistory::pair(history.clone(), PARAM).unwrap();
            assert_eq!(history.listener_count(), 2);
        }
        assert_eq!(history.listener_count(), 0);
    }

    #[test]
    fn listen_after_dispose_is_inert() {
        let history = shared_history();
        let view = AggregatedHistory::new(history.clone(), Role::Main, PARAM).unwrap();
        view.dispose();
        let sub = view.listen(Arc::new(|_, _| {})).unwrap();
        assert!(!sub.is_active());
    }

    #[test]
    fn attach_to_closed_history_fails() {
        let history = shared_history();
        history.close();
        let err = AggregatedHistory::new(history, Role::Main, PARAM).err();
        assert_eq!(err, Some(HistoryError::Closed));
    }

    #[test]
    fn from_config_uses_param() {
        let history = Arc::new(MemoryHistory::at("/?side=%2Fpanel"));
        let config = AggregatorConfig {
            param: "side".to_string(),
        };
        let view = AggregatedHistory::from_config(history, Role::Secondary, &config).unwrap();
        assert_eq!(view.location().path(), "/panel");
    }
}
