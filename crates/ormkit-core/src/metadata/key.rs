//! Key metadata.

use super::{EntityTypeId, PropertyId};
use crate::source::ConfigurationSource;

/// An ordered, non-empty set of properties that uniquely identifies an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    entity_type: EntityTypeId,
    properties: Vec<PropertyId>,
    source: ConfigurationSource,
}

impl Key {
    pub(crate) fn new(
        entity_type: EntityTypeId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            entity_type,
            properties,
            source,
        }
    }

    /// Owning entity type.
    pub fn entity_type(&self) -> EntityTypeId {
        self.entity_type
    }

    /// Key properties in key order.
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Source that created (or last re-asserted) this key.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    /// Whether the key consists of more than one property.
    pub fn is_composite(&self) -> bool {
        self.properties.len() > 1
    }

    pub(crate) fn update_source(&mut self, source: ConfigurationSource) {
        self.source = self.source.max(source);
    }
}
