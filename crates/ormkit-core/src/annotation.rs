//! Ordered, source-guarded annotation store.
//!
//! Providers keep their metadata here under a namespaced key
//! (`"SqlServer:ValueGeneration"`, `"Relational:TableName"`, ...).
//! Enumeration follows insertion order; updating an annotation keeps its slot.

use serde::{Deserialize, Serialize};

use crate::source::ConfigurationSource;

/// A single named annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Namespaced key.
    pub name: String,
    /// Value.
    pub value: String,
    /// Source that last set the value.
    pub source: ConfigurationSource,
}

/// Insertion-ordered annotation map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    entries: Vec<Annotation>,
}

impl Annotations {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value` at `source`.
    ///
    /// Returns `false` when an existing value was set at a stronger source.
    pub fn try_set(
        &mut self,
        name: &str,
        value: impl Into<String>,
        source: ConfigurationSource,
    ) -> bool {
        if let Some(existing) = self.entries.iter_mut().find(|a| a.name == name) {
            if !source.overrides(Some(existing.source)) {
                tracing::trace!(
                    annotation = name,
                    current = %existing.source,
                    attempted = %source,
                    "Annotation write rejected"
                );
                return false;
            }
            existing.value = value.into();
            existing.source = source;
            return true;
        }
        self.entries.push(Annotation {
            name: name.to_string(),
            value: value.into(),
            source,
        });
        true
    }

    /// Whether a write of `name` at `source` would be accepted.
    #[must_use]
    pub fn can_set(&self, name: &str, source: ConfigurationSource) -> bool {
        self.get(name)
            .is_none_or(|existing| source.overrides(Some(existing.source)))
    }

    /// Remove `name` if it was not set at a stronger source than `source`.
    pub fn try_remove(&mut self, name: &str, source: ConfigurationSource) -> bool {
        let Some(idx) = self.entries.iter().position(|a| a.name == name) else {
            return false;
        };
        if !source.overrides(Some(self.entries[idx].source)) {
            return false;
        }
        self.entries.remove(idx);
        true
    }

    /// Look up an annotation.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.entries.iter().find(|a| a.name == name)
    }

    /// Look up an annotation value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|a| a.value.as_str())
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.entries.iter()
    }

    /// Number of annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
