//! History Aggregator - two navigators sharing one URL
//!
//! A "main" and a "secondary" navigator each get their own [`History`], but
//! only one real location exists. The main navigator owns the literal URL;
//! the secondary navigator's whole location (path, query and hash) is
//! encoded into a single query parameter of it. Each [`AggregatedHistory`]
//! reads and writes only its own half, so neither navigator can clobber the
//! other.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use history_aggregator::{AggregatedHistory, History, MemoryHistory};
//!
//! let history = Arc::new(MemoryHistory::at("/a/logs-app/logs?id=12345"));
//! let (main, secondary) = AggregatedHistory::pair(history.clone(), "__sc").unwrap();
//!
//! secondary.push("/a/traces-app/trace".into(), None).unwrap();
//! assert_eq!(
//!     history.location().path(),
//!     "/a/logs-app/logs?id=12345&__sc=%2Fa%2Ftraces-app%2Ftrace"
//! );
//!
//! main.push("/a/profiles-app/profiles?namespace=app".into(), None).unwrap();
//! assert_eq!(main.location().path(), "/a/profiles-app/profiles?namespace=app");
//! assert_eq!(secondary.location().path(), "/a/traces-app/trace");
//! ```
//!
//! Malformed or foreign values in the parameter never fail navigation; the
//! secondary navigator simply sees an empty location.

pub mod aggregator;
pub mod codec;
pub mod config;
mod error;
pub mod history;
pub mod location;
pub mod memory;

pub use aggregator::{AggregatedHistory, LocationObservable};
pub use config::AggregatorConfig;
pub use error::HistoryError;
pub use history::{History, Listener, Subscription};
pub use location::{Action, Location, LocationDescriptor, LocationParts, Role};
pub use memory::MemoryHistory;
