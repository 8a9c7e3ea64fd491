//! Location values shared by the codec, the underlying history and the
//! aggregated views.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A navigable location: `pathname`, `search`, `hash` and an opaque `state`.
///
/// The same shape is used for the full location held by the underlying
/// history and for the partial location owned by one [`Role`].
/// `search` is empty or starts with `?`, `hash` is empty or starts with `#`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = with_prefix('?', search.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = with_prefix('#', hash.into());
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// An empty pathname means "no location"; for the secondary role this is
    /// how an absent parameter is represented.
    pub fn is_empty(&self) -> bool {
        self.pathname.is_empty()
    }

    /// `pathname + search + hash`, in that order.
    pub fn path(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Adds `prefix` to a non-empty component that lacks it. A lone prefix
/// collapses to the empty string.
pub(crate) fn with_prefix(prefix: char, component: String) -> String {
    let bare = component.strip_prefix(prefix).unwrap_or(&component);
    if bare.is_empty() {
        String::new()
    } else {
        format!("{prefix}{bare}")
    }
}

/// Loosely-typed location object; any field may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationParts {
    #[serde(default)]
    pub pathname: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub state: Option<Value>,
}

/// Anything a caller may navigate to: a raw path string, a partial object,
/// or an already complete [`Location`].
#[derive(Clone, Debug, PartialEq)]
pub enum LocationDescriptor {
    Path(String),
    Parts(LocationParts),
    Location(Location),
}

impl From<&str> for LocationDescriptor {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for LocationDescriptor {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<LocationParts> for LocationDescriptor {
    fn from(parts: LocationParts) -> Self {
        Self::Parts(parts)
    }
}

impl From<Location> for LocationDescriptor {
    fn from(location: Location) -> Self {
        Self::Location(location)
    }
}

impl From<&Location> for LocationDescriptor {
    fn from(location: &Location) -> Self {
        Self::Location(location.clone())
    }
}

/// The kind of transition reported to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Push,
    Replace,
    Pop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Push => write!(f, "push"),
            Action::Replace => write!(f, "replace"),
            Action::Pop => write!(f, "pop"),
        }
    }
}

/// Which half of the shared location a view owns.
///
/// `Main` owns the literal URL; `Secondary` owns the location encoded inside
/// one query parameter of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Main,
    Secondary,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Main => write!(f, "main"),
            Role::Secondary => write!(f, "secondary"),
        }
    }
}
