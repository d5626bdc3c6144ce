//! Dispatch of structural events to convention lists.
//!
//! Dispatch is synchronous and re-entrant: a convention that mutates the
//! model through the builder triggers the conventions for that mutation on the
//! same call stack, before its own `apply` returns. Termination relies on
//! conventions being idempotent under the source guard.

use std::sync::Arc;

use ormkit_core::{EntityTypeId, ForeignKey, ForeignKeyId, KeyId, PropertyId, Result};

use crate::LOG_TARGET;
use crate::builder::InternalModelBuilder;
use crate::convention_set::ConventionSet;

/// Runs the conventions registered for each event, in registration order.
#[derive(Debug, Clone)]
pub struct ConventionDispatcher {
    conventions: Arc<ConventionSet>,
}

impl ConventionDispatcher {
    /// Dispatcher over `conventions`.
    pub fn new(conventions: Arc<ConventionSet>) -> Self {
        Self { conventions }
    }

    /// The registered conventions.
    pub fn conventions(&self) -> &Arc<ConventionSet> {
        &self.conventions
    }

    /// Runs the model-initialized conventions once, before any entity type exists.
    pub fn on_model_initialized(&self, builder: &mut InternalModelBuilder) -> Result<()> {
        for convention in &self.conventions.model_initialized {
            tracing::trace!(target: LOG_TARGET, convention = convention.name(), "ModelInitialized");
            convention.apply(builder)?;
        }
        Ok(())
    }

    /// Runs the entity-type-added conventions. Returns `None` once a convention
    /// removes or replaces the entity type out from under the chain.
    pub fn on_entity_type_added(
        &self,
        builder: &mut InternalModelBuilder,
        entity_type: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        let mut current = entity_type;
        for convention in &self.conventions.entity_type_added {
            tracing::trace!(
                target: LOG_TARGET,
                convention = convention.name(),
                entity_type = current.index(),
                "EntityTypeAdded"
            );
            match convention.apply(builder, current)? {
                Some(next) if builder.model().entity_type(next).is_some() => current = next,
                _ => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Runs the property-added conventions; `None` if the property is gone.
    pub fn on_property_added(
        &self,
        builder: &mut InternalModelBuilder,
        property: PropertyId,
    ) -> Result<Option<PropertyId>> {
        let mut current = property;
        for convention in &self.conventions.property_added {
            tracing::trace!(
                target: LOG_TARGET,
                convention = convention.name(),
                property = current.index(),
                "PropertyAdded"
            );
            match convention.apply(builder, current)? {
                Some(next) if builder.model().property(next).is_some() => current = next,
                _ => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Runs the key-added conventions; `None` if the key is gone.
    pub fn on_key_added(
        &self,
        builder: &mut InternalModelBuilder,
        key: KeyId,
    ) -> Result<Option<KeyId>> {
        let mut current = key;
        for convention in &self.conventions.key_added {
            tracing::trace!(
                target: LOG_TARGET,
                convention = convention.name(),
                key = current.index(),
                "KeyAdded"
            );
            match convention.apply(builder, current)? {
                Some(next) if builder.model().key(next).is_some() => current = next,
                _ => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Runs the foreign-key-added conventions; `None` if the foreign key is gone.
    pub fn on_foreign_key_added(
        &self,
        builder: &mut InternalModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        let mut current = foreign_key;
        for convention in &self.conventions.foreign_key_added {
            tracing::trace!(
                target: LOG_TARGET,
                convention = convention.name(),
                foreign_key = current.index(),
                "ForeignKeyAdded"
            );
            match convention.apply(builder, current)? {
                Some(next) if builder.model().foreign_key(next).is_some() => current = next,
                _ => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Runs the foreign-key-removed conventions against the detached `foreign_key`.
    /// Stops early if `dependent` itself has been removed.
    pub fn on_foreign_key_removed(
        &self,
        builder: &mut InternalModelBuilder,
        dependent: EntityTypeId,
        foreign_key: &ForeignKey,
    ) -> Result<()> {
        for convention in &self.conventions.foreign_key_removed {
            if builder.model().entity_type(dependent).is_none() {
                break;
            }
            tracing::trace!(
                target: LOG_TARGET,
                convention = convention.name(),
                entity_type = dependent.index(),
                "ForeignKeyRemoved"
            );
            convention.apply(builder, dependent, foreign_key)?;
        }
        Ok(())
    }

    /// Runs the model-built conventions.
    pub fn on_model_built(&self, builder: &mut InternalModelBuilder) -> Result<()> {
        for convention in &self.conventions.model_built {
            tracing::trace!(target: LOG_TARGET, convention = convention.name(), "ModelBuilt");
            convention.apply(builder)?;
        }
        Ok(())
    }
}
