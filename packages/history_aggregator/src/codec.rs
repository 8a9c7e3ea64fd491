//! Pure transforms between the full location held by the underlying history
//! and the partial location owned by one role.
//!
//! The secondary location travels inside one query parameter of the main
//! URL, as `application/x-www-form-urlencoded` text of its
//! `pathname + search + hash`:
//!
//! ```text
//! /a/logs-app/logs?id=12345&__sc=%2Fa%2Ftraces-app%2Ftrace
//! \______________/ \______/ \____________________________/
//!   main pathname  main query   secondary: /a/traces-app/trace
//! ```
//!
//! Query edits work on raw `&`-separated segments, so parameters the codec
//! does not touch keep their exact bytes.

use tracing::debug;
use url::{Url, form_urlencoded};

use crate::location::{Location, LocationDescriptor, LocationParts, Role, with_prefix};

/// Relative values are resolved against this base and stripped back off.
const SYNTHETIC_BASE: &str = "http://localhost/";

/// Decodes the partial location `role` owns out of `full`.
///
/// Never fails: a missing, empty or malformed secondary parameter decodes to
/// the empty location.
pub fn decode(full: &Location, role: Role, param: &str) -> Location {
    match role {
        Role::Main => Location {
            search: remove_param(&full.search, param),
            ..full.clone()
        },
        Role::Secondary => match get_param(&full.search, param) {
            Some(value) if !value.is_empty() => parse_path(&value).unwrap_or_else(|| {
                debug!(param, value = %value, "malformed secondary location, using empty");
                Location::default()
            }),
            _ => Location::default(),
        },
    }
}

/// Builds the full location that results from `role` navigating to
/// `partial` while the history currently shows `current`.
///
/// The other role's state is carried over untouched. An empty secondary
/// pathname removes the parameter instead of writing an empty value.
pub fn encode(partial: &Location, current: &Location, role: Role, param: &str) -> Location {
    match role {
        Role::Main => {
            let mut next = Location {
                search: remove_param(&partial.search, param),
                ..partial.clone()
            };
            let secondary = decode(current, Role::Secondary, param);
            if !secondary.is_empty() {
                next.search = set_param(&next.search, param, &secondary.path());
            }
            next
        }
        Role::Secondary => {
            let search = if partial.is_empty() {
                remove_param(&current.search, param)
            } else {
                set_param(&current.search, param, &partial.path())
            };
            Location {
                search,
                ..current.clone()
            }
        }
    }
}

/// Turns any [`LocationDescriptor`] into a fully populated [`Location`].
///
/// Path strings are parsed like secondary parameter values; an empty or
/// unparseable string yields the empty location.
pub fn normalize(input: impl Into<LocationDescriptor>) -> Location {
    match input.into() {
        LocationDescriptor::Path(path) if path.is_empty() => Location::default(),
        LocationDescriptor::Path(path) => parse_path(&path).unwrap_or_else(|| {
            debug!(path = %path, "unparseable path, using empty location");
            Location::default()
        }),
        LocationDescriptor::Parts(LocationParts {
            pathname,
            search,
            hash,
            state,
        }) => Location {
            pathname: pathname.unwrap_or_default(),
            search: with_prefix('?', search.unwrap_or_default()),
            hash: with_prefix('#', hash.unwrap_or_default()),
            state,
        },
        LocationDescriptor::Location(location) => location,
    }
}

/// `pathname + search + hash`.
pub fn create_path(location: &Location) -> String {
    location.path()
}

/// Parses a relative `path?query#hash` string.
///
/// Returns `None` when the URL parser rejects it or when it resolves outside
/// the synthetic origin (`//host/x`, `javascript:...`).
pub fn parse_path(value: &str) -> Option<Location> {
    let base = Url::parse(SYNTHETIC_BASE).ok()?;
    let url = base.join(value).ok()?;
    if url.origin() != base.origin() {
        return None;
    }
    Some(Location {
        pathname: url.path().to_string(),
        search: url
            .query()
            .filter(|q| !q.is_empty())
            .map(|q| format!("?{q}"))
            .unwrap_or_default(),
        hash: url
            .fragment()
            .filter(|f| !f.is_empty())
            .map(|f| format!("#{f}"))
            .unwrap_or_default(),
        state: None,
    })
}

/// Decoded value of the first `name` entry in `search`.
pub fn get_param(search: &str, name: &str) -> Option<String> {
    segments(search)
        .filter_map(decode_segment)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Sets `name` to `value`: the first existing entry is replaced in place,
/// later duplicates are dropped, otherwise the entry is appended.
pub fn set_param(search: &str, name: &str, value: &str) -> String {
    let entry = format!("{}={}", encode_component(name), encode_component(value));
    let mut placed = false;
    let mut parts = Vec::new();
    for segment in segments(search) {
        if segment_key(segment).as_deref() == Some(name) {
            if !placed {
                parts.push(entry.clone());
                placed = true;
            }
        } else {
            parts.push(segment.to_string());
        }
    }
    if !placed {
        parts.push(entry);
    }
    join_search(&parts)
}

/// Removes every `name` entry. `search` is returned unchanged when it has none.
pub fn remove_param(search: &str, name: &str) -> String {
    if !segments(search).any(|s| segment_key(s).as_deref() == Some(name)) {
        return search.to_string();
    }
    let parts: Vec<String> = segments(search)
        .filter(|s| segment_key(s).as_deref() != Some(name))
        .map(str::to_string)
        .collect();
    join_search(&parts)
}

fn segments(search: &str) -> impl Iterator<Item = &str> {
    search
        .strip_prefix('?')
        .unwrap_or(search)
        .split('&')
        .filter(|s| !s.is_empty())
}

fn decode_segment(segment: &str) -> Option<(String, String)> {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
}

fn segment_key(segment: &str) -> Option<String> {
    decode_segment(segment).map(|(key, _)| key)
}

fn encode_component(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn join_search(parts: &[String]) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}
