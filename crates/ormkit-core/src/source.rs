//! Configuration source ranking and source-guarded values.
//!
//! Every configurable piece of metadata remembers *how* it was configured.
//! A later write only takes effect when it was asserted at least as strongly
//! as the value it would replace:
//!
//! ```
//! use ormkit_core::{ConfigurationSource, Configured};
//!
//! let mut nullable = Configured::new(true);
//! assert!(nullable.try_set(false, ConfigurationSource::DataAnnotation));
//! assert!(!nullable.try_set(true, ConfigurationSource::Convention));
//! assert!(!*nullable.value());
//! ```

use serde::{Deserialize, Serialize};

/// How strongly a piece of metadata was asserted.
///
/// The derived ordering is the precedence order:
/// `Convention < DataAnnotation < Explicit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigurationSource {
    /// Inferred by a convention.
    Convention,
    /// Read from a declarative marker on the shape or member.
    DataAnnotation,
    /// Set through a direct builder call.
    Explicit,
}

impl ConfigurationSource {
    /// Whether a write at `self` may replace a value recorded at `current`.
    ///
    /// An unset value (`None`) can always be replaced. Equal sources overwrite,
    /// so re-applying a convention is idempotent.
    #[must_use]
    pub fn overrides(self, current: Option<ConfigurationSource>) -> bool {
        current.is_none_or(|current| self >= current)
    }

    /// The stronger of two optional sources.
    #[must_use]
    pub fn max_of(
        a: Option<ConfigurationSource>,
        b: Option<ConfigurationSource>,
    ) -> Option<ConfigurationSource> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Short lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ConfigurationSource::Convention => "convention",
            ConfigurationSource::DataAnnotation => "data_annotation",
            ConfigurationSource::Explicit => "explicit",
        }
    }
}

impl std::fmt::Display for ConfigurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value paired with the configuration source that last set it.
///
/// A freshly created value carries a default but no source; the first write at
/// any source wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configured<T> {
    value: T,
    source: Option<ConfigurationSource>,
}

impl<T> Configured<T> {
    /// A default value that has not been configured yet.
    pub const fn new(default: T) -> Self {
        Self {
            value: default,
            source: None,
        }
    }

    /// A value that was already configured at `source`.
    pub const fn with_source(value: T, source: ConfigurationSource) -> Self {
        Self {
            value,
            source: Some(source),
        }
    }

    /// Current value.
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Source of the current value, `None` while still at the default.
    pub const fn source(&self) -> Option<ConfigurationSource> {
        self.source
    }

    /// Whether a write at `source` would be accepted.
    pub fn can_set(&self, source: ConfigurationSource) -> bool {
        source.overrides(self.source)
    }

    /// Write `value` at `source` if `source` is not weaker than the recorded one.
    ///
    /// Returns `false` (and leaves value and source untouched) when rejected.
    pub fn try_set(&mut self, value: T, source: ConfigurationSource) -> bool {
        if !self.can_set(source) {
            return false;
        }
        self.value = value;
        self.source = Some(source);
        true
    }
}

impl<T: Copy> Configured<T> {
    /// Copy of the current value.
    pub const fn get(&self) -> T {
        self.value
    }
}

impl<T: Default> Default for Configured<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
