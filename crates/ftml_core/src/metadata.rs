use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;

/// Key under which a document's `<title>` text is stored.
pub const TITLE_KEY: &str = "ft:title";

/// A metadata value: one string, or several once a key has been seen again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Single(String),
    Multiple(Vec<String>),
}

impl MetaValue {
    pub fn values(&self) -> &[String] {
        match self {
            MetaValue::Single(value) => std::slice::from_ref(value),
            MetaValue::Multiple(values) => values,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Single(value) => write!(f, "{value}"),
            MetaValue::Multiple(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata invariant violated for key {key}: {detail}")]
    Invariant { key: String, detail: String },
}

/// Ordered key -> value(s) mapping. Keys keep their first insertion position.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: IndexMap<String, MetaValue>,
}

// Order is part of the mapping: two documents listing the same metas in a
// different order produce different maps.
impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for Metadata {}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping seeded with the document title under [`TITLE_KEY`].
    pub fn with_title(title: impl Into<String>) -> Self {
        let mut metadata = Self::new();
        metadata.set(TITLE_KEY, MetaValue::Single(title.into()));
        metadata
    }

    /// Accumulates a value: a new key stores a scalar, a repeated key is
    /// promoted to a list or appended to the existing list.
    pub fn append(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), MetadataError> {
        let value = value.into();
        let mut slot = match self.entries.entry(key.into()) {
            Entry::Vacant(vacant) => {
                vacant.insert(MetaValue::Single(value));
                return Ok(());
            }
            Entry::Occupied(occupied) => occupied,
        };
        let promoted = match slot.get_mut() {
            MetaValue::Single(existing) => MetaValue::Multiple(vec![std::mem::take(existing), value]),
            MetaValue::Multiple(values) if values.len() >= 2 => {
                values.push(value);
                return Ok(());
            }
            MetaValue::Multiple(values) => {
                let held = values.len();
                return Err(MetadataError::Invariant {
                    key: slot.key().clone(),
                    detail: format!("list holds {held} value(s), expected at least 2"),
                });
            }
        };
        slot.insert(promoted);
        Ok(())
    }

    /// Inserts or replaces `key`, keeping its original position when replaced.
    pub fn set(&mut self, key: impl Into<String>, value: MetaValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// First value stored under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::first)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this mapping without the listed keys.
    pub fn without<S: AsRef<str>>(&self, excluded: &[S]) -> Metadata {
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| !excluded.iter().any(|e| e.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Metadata { entries }
    }
}
