//! Point observations and the tags that identify them.

use std::collections::BTreeMap;
use std::string::String;

use crate::Timestamp;

/// The set of string tags identifying the source of an observation.
///
/// Tags are kept sorted by key so two tag sets with the same content
/// compare and serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, replacing any previous value for the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a tag in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a tag value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The payload of an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Value {
    /// Unsigned integer sample (byte counters and the like).
    Integer(u64),

    /// Free-form text sample.
    Text(String),
}

impl Value {
    /// The integer payload, if this is an integer sample.
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// The text payload, if this is a text sample.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Integer(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

/// A single tagged, timestamped sample bound for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// Tags identifying the source.
    pub tags: Tags,

    /// Nanoseconds since the Unix epoch.
    pub timestamp: Timestamp,

    /// The sample itself.
    pub value: Value,
}

impl Observation {
    /// Create an integer observation.
    pub fn integer(tags: Tags, value: u64, timestamp: Timestamp) -> Self {
        Self {
            tags,
            timestamp,
            value: Value::Integer(value),
        }
    }

    /// Create a text observation.
    pub fn text(tags: Tags, value: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            tags,
            timestamp,
            value: Value::Text(value.into()),
        }
    }
}
