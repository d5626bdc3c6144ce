//! Declarative markers attached to entity shapes and their members.
//!
//! Markers are the attribute-equivalent metadata that the data-annotation
//! conventions read. They are plain data; how they get attached (hand-written
//! tables, generated code) is up to whoever builds the [`EntityShape`].
//!
//! [`EntityShape`]: crate::shape::EntityShape

use serde::{Deserialize, Serialize};

use crate::types::StoreGeneratedPattern;

/// Store generation requested by a `DatabaseGenerated` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseGeneratedOption {
    /// The application supplies the value.
    None,
    /// Generated on insert.
    Identity,
    /// Generated on insert and update.
    Computed,
}

impl From<DatabaseGeneratedOption> for StoreGeneratedPattern {
    fn from(option: DatabaseGeneratedOption) -> Self {
        match option {
            DatabaseGeneratedOption::None => StoreGeneratedPattern::None,
            DatabaseGeneratedOption::Identity => StoreGeneratedPattern::Identity,
            DatabaseGeneratedOption::Computed => StoreGeneratedPattern::Computed,
        }
    }
}

/// A declarative marker record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Marker {
    /// The property takes part in optimistic concurrency checks.
    ConcurrencyCheck,
    /// The store generates the property's value.
    DatabaseGenerated {
        /// Requested generation mode
        mode: DatabaseGeneratedOption,
    },
    /// The property must have a value.
    Required,
    /// The property is (part of) the primary key.
    Key,
    /// The entity type maps to the named table.
    Table {
        /// Table name
        name: String,
        /// Optional schema
        schema: Option<String>,
    },
}

impl Marker {
    /// Create a `DatabaseGenerated` marker.
    #[must_use]
    pub const fn database_generated(mode: DatabaseGeneratedOption) -> Self {
        Marker::DatabaseGenerated { mode }
    }

    /// Create a `Table` marker without a schema.
    pub fn table(name: impl Into<String>) -> Self {
        Marker::Table {
            name: name.into(),
            schema: None,
        }
    }

    /// Create a `Table` marker with a schema.
    pub fn table_in_schema(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Marker::Table {
            name: name.into(),
            schema: Some(schema.into()),
        }
    }

    /// The kind of this marker.
    #[must_use]
    pub const fn kind(&self) -> MarkerKind {
        match self {
            Marker::ConcurrencyCheck => MarkerKind::ConcurrencyCheck,
            Marker::DatabaseGenerated { .. } => MarkerKind::DatabaseGenerated,
            Marker::Required => MarkerKind::Required,
            Marker::Key => MarkerKind::Key,
            Marker::Table { .. } => MarkerKind::Table,
        }
    }
}

/// Discriminant of a [`Marker`], used for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// See [`Marker::ConcurrencyCheck`].
    ConcurrencyCheck,
    /// See [`Marker::DatabaseGenerated`].
    DatabaseGenerated,
    /// See [`Marker::Required`].
    Required,
    /// See [`Marker::Key`].
    Key,
    /// See [`Marker::Table`].
    Table,
}

/// Lookup of declarative markers for one entity shape.
///
/// The data-annotation conventions depend only on this capability.
pub trait MarkerProvider: std::fmt::Debug + Send + Sync {
    /// Markers on the entity type itself.
    fn entity_markers(&self) -> &[Marker];

    /// Markers on the named member; empty when the member is unknown.
    fn member_markers(&self, member: &str) -> &[Marker];

    /// First marker of `kind` on the entity type.
    fn find_entity_marker(&self, kind: MarkerKind) -> Option<&Marker> {
        self.entity_markers().iter().find(|m| m.kind() == kind)
    }

    /// First marker of `kind` on the named member.
    fn find_member_marker(&self, member: &str, kind: MarkerKind) -> Option<&Marker> {
        self.member_markers(member).iter().find(|m| m.kind() == kind)
    }
}
