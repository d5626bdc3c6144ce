//! Property metadata.

use super::EntityTypeId;
use crate::source::{ConfigurationSource, Configured};
use crate::types::{StoreGeneratedPattern, ValueType};

/// A scalar property of an entity type.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    entity_type: EntityTypeId,
    value_type: ValueType,
    shadow: bool,
    source: ConfigurationSource,
    nullable: Configured<bool>,
    concurrency_token: Configured<bool>,
    store_generated: Configured<StoreGeneratedPattern>,
}

impl Property {
    pub(crate) fn new(
        name: String,
        entity_type: EntityTypeId,
        value_type: ValueType,
        nullable: bool,
        shadow: bool,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            name,
            entity_type,
            value_type,
            shadow,
            source,
            nullable: Configured::new(nullable),
            concurrency_token: Configured::new(false),
            store_generated: Configured::new(StoreGeneratedPattern::None),
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning entity type.
    pub fn entity_type(&self) -> EntityTypeId {
        self.entity_type
    }

    /// Value type tag.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether this property has no source-level member.
    pub fn is_shadow(&self) -> bool {
        self.shadow
    }

    /// Source that created (or last re-asserted) this property.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    pub(crate) fn update_source(&mut self, source: ConfigurationSource) {
        self.source = self.source.max(source);
    }

    pub(crate) fn set_shadow(&mut self, shadow: bool) {
        self.shadow = shadow;
    }

    /// Whether the property accepts "no value".
    pub fn is_nullable(&self) -> bool {
        self.nullable.get()
    }

    /// Whether the property is an optimistic concurrency token.
    pub fn is_concurrency_token(&self) -> bool {
        self.concurrency_token.get()
    }

    /// Store generation policy.
    pub fn store_generated_pattern(&self) -> StoreGeneratedPattern {
        self.store_generated.get()
    }

    /// Source of the nullability setting.
    pub fn nullable_source(&self) -> Option<ConfigurationSource> {
        self.nullable.source()
    }

    /// Source of the concurrency-token setting.
    pub fn concurrency_token_source(&self) -> Option<ConfigurationSource> {
        self.concurrency_token.source()
    }

    /// Source of the store generation setting.
    pub fn store_generated_pattern_source(&self) -> Option<ConfigurationSource> {
        self.store_generated.source()
    }

    /// Guarded nullability write.
    pub fn set_nullable(&mut self, nullable: bool, source: ConfigurationSource) -> bool {
        let applied = self.nullable.try_set(nullable, source);
        self.trace_write("nullable", applied, source);
        applied
    }

    /// Guarded concurrency-token write.
    pub fn set_concurrency_token(&mut self, token: bool, source: ConfigurationSource) -> bool {
        let applied = self.concurrency_token.try_set(token, source);
        self.trace_write("concurrency_token", applied, source);
        applied
    }

    /// Guarded store generation write.
    pub fn set_store_generated_pattern(
        &mut self,
        pattern: StoreGeneratedPattern,
        source: ConfigurationSource,
    ) -> bool {
        let applied = self.store_generated.try_set(pattern, source);
        self.trace_write("store_generated_pattern", applied, source);
        applied
    }

    fn trace_write(&self, attribute: &'static str, applied: bool, source: ConfigurationSource) {
        if !applied {
            tracing::trace!(
                property = %self.name,
                attribute,
                attempted = %source,
                "Property write rejected by a stronger configuration source"
            );
        }
    }
}
