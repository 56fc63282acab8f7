//! Path parsing and parameter binding.
//!
//! # Responsibilities
//! - Split slash-delimited paths into segments
//! - Classify segments as literal or parameter by sigil
//! - Carry bound parameter values out of a lookup
//!
//! # Design Decisions
//! - Empty segments are ignored: `"/a//b/"` and `"a/b"` are the same path
//! - A lone sigil (`":"`) is a parameter with an empty name

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Default parameter sigil.
pub const DEFAULT_SIGIL: char = ':';

/// A single path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Matches exactly this token.
    Literal(&'a str),
    /// Matches any token, binding it under this name.
    Param(&'a str),
}

/// Splits `path` into segments, treating tokens starting with `sigil` as parameters.
pub fn segments(path: &str, sigil: char) -> impl Iterator<Item = Segment<'_>> {
    path.split('/').filter(|s| !s.is_empty()).map(move |s| {
        match s.strip_prefix(sigil) {
            Some(name) => Segment::Param(name),
            None => Segment::Literal(s),
        }
    })
}

/// Parameters bound while resolving a concrete path.
///
/// Values are kept in the order their segments appear. When two parameters
/// share a name the later one shadows the earlier for [`Params::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub(crate) fn pop(&mut self) {
        self.entries.pop();
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates `(name, value)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Converts into a JSON object, later names overwriting earlier ones.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(n, v)| (n.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
