//! Entity type metadata.

use std::sync::Arc;

use super::{ForeignKeyId, KeyId, NavigationId, PropertyId};
use crate::annotation::Annotations;
use crate::marker::MarkerProvider;
use crate::shape::EntityShape;
use crate::source::ConfigurationSource;

/// A mapped entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: String,
    shape: Option<Arc<EntityShape>>,
    source: ConfigurationSource,
    pub(crate) properties: Vec<PropertyId>,
    pub(crate) primary_key: Option<KeyId>,
    pub(crate) primary_key_source: Option<ConfigurationSource>,
    pub(crate) keys: Vec<KeyId>,
    pub(crate) foreign_keys: Vec<ForeignKeyId>,
    pub(crate) referencing_foreign_keys: Vec<ForeignKeyId>,
    pub(crate) navigations: Vec<NavigationId>,
    annotations: Annotations,
}

impl EntityType {
    pub(crate) fn new(
        name: String,
        shape: Option<Arc<EntityShape>>,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            name,
            shape,
            source,
            properties: Vec::new(),
            primary_key: None,
            primary_key_source: None,
            keys: Vec::new(),
            foreign_keys: Vec::new(),
            referencing_foreign_keys: Vec::new(),
            navigations: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    /// Entity type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Source-level shape, absent for synthetic entity types.
    pub fn shape(&self) -> Option<&Arc<EntityShape>> {
        self.shape.as_ref()
    }

    /// Declarative marker lookup for this entity type.
    pub fn markers(&self) -> Option<&dyn MarkerProvider> {
        self.shape.as_deref().map(|s| s as &dyn MarkerProvider)
    }

    /// Source that created (or last re-asserted) this entity type.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    pub(crate) fn update_source(&mut self, source: ConfigurationSource) {
        self.source = self.source.max(source);
    }

    /// Properties in discovery order.
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Primary key, if one has been set.
    pub fn primary_key(&self) -> Option<KeyId> {
        self.primary_key
    }

    /// Source of the primary key assignment.
    pub fn primary_key_source(&self) -> Option<ConfigurationSource> {
        self.primary_key_source
    }

    /// All keys, primary and alternate.
    pub fn keys(&self) -> &[KeyId] {
        &self.keys
    }

    /// Outgoing foreign keys.
    pub fn foreign_keys(&self) -> &[ForeignKeyId] {
        &self.foreign_keys
    }

    /// Incoming foreign keys (back-references).
    pub fn referencing_foreign_keys(&self) -> &[ForeignKeyId] {
        &self.referencing_foreign_keys
    }

    /// Navigations declared on this entity type.
    pub fn navigations(&self) -> &[NavigationId] {
        &self.navigations
    }

    /// Entity-level annotations.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Mutable entity-level annotations.
    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }
}
