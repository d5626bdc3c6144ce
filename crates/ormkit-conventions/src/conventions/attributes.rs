//! Conventions driven by declarative member markers.

use ormkit_core::{
    ConfigurationSource, Error, Marker, MarkerKind, PropertyId, Result, StoreGeneratedPattern,
};

use super::property_marker;
use crate::LOG_TARGET;
use crate::builder::InternalModelBuilder;
use crate::convention::{ModelBuiltConvention, PropertyAddedConvention};

/// `ConcurrencyCheck` marks the property as a concurrency token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrencyCheckAttributeConvention;

impl PropertyAddedConvention for ConcurrencyCheckAttributeConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        property: PropertyId,
    ) -> Result<Option<PropertyId>> {
        if property_marker(builder.model(), property, MarkerKind::ConcurrencyCheck).is_some() {
            builder.concurrency_token(property, true, ConfigurationSource::DataAnnotation);
        }
        Ok(Some(property))
    }
}

/// `DatabaseGenerated(mode)` sets the store generation policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseGeneratedAttributeConvention;

impl PropertyAddedConvention for DatabaseGeneratedAttributeConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        property: PropertyId,
    ) -> Result<Option<PropertyId>> {
        if let Some(Marker::DatabaseGenerated { mode }) =
            property_marker(builder.model(), property, MarkerKind::DatabaseGenerated)
        {
            builder.store_generated_pattern(
                property,
                StoreGeneratedPattern::from(mode),
                ConfigurationSource::DataAnnotation,
            );
        }
        Ok(Some(property))
    }
}

/// `Required` makes the property non-nullable.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredAttributeConvention;

impl PropertyAddedConvention for RequiredAttributeConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        property: PropertyId,
    ) -> Result<Option<PropertyId>> {
        if property_marker(builder.model(), property, MarkerKind::Required).is_some() {
            builder.required(property, true, ConfigurationSource::DataAnnotation);
        }
        Ok(Some(property))
    }
}

/// `Key` markers define the primary key.
///
/// Every time a marked property is added, all marked properties of the entity
/// type, in declaration order, are set as the primary key at data-annotation
/// source. A composite key obtained this way is rejected when the model is
/// built: markers on separate members cannot express key order, so a
/// composite key has to be configured explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyAttributeConvention;

impl PropertyAddedConvention for KeyAttributeConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        property: PropertyId,
    ) -> Result<Option<PropertyId>> {
        let model = builder.model();
        if property_marker(model, property, MarkerKind::Key).is_none() {
            return Ok(Some(property));
        }
        let Some(entity_type) = model.property(property).map(|p| p.entity_type()) else {
            return Ok(None);
        };
        let Some(owner) = model.entity_type(entity_type) else {
            return Ok(None);
        };

        let mut marked: Vec<(usize, PropertyId)> = owner
            .properties()
            .iter()
            .copied()
            .filter(|p| property_marker(model, *p, MarkerKind::Key).is_some())
            .filter_map(|p| {
                let name = model.property(p)?.name();
                let index = owner.shape()?.member_index(name)?;
                Some((index, p))
            })
            .collect();
        marked.sort_by_key(|(index, _)| *index);
        let properties: Vec<_> = marked.into_iter().map(|(_, p)| p).collect();

        builder.primary_key(entity_type, &properties, ConfigurationSource::DataAnnotation)?;
        Ok(builder.model().property(property).map(|_| property))
    }
}

impl ModelBuiltConvention for KeyAttributeConvention {
    fn apply(&self, builder: &mut InternalModelBuilder) -> Result<()> {
        let model = builder.model();
        for (_, entity_type) in model.entity_types() {
            if entity_type.primary_key_source() != Some(ConfigurationSource::DataAnnotation) {
                continue;
            }
            let composite = entity_type
                .primary_key()
                .and_then(|k| model.key(k))
                .is_some_and(|k| k.is_composite());
            if composite {
                tracing::debug!(
                    target: LOG_TARGET,
                    entity_type = entity_type.name(),
                    "Composite primary key from Key markers"
                );
                return Err(Error::CompositePrimaryKeyFromDataAnnotation {
                    entity_type: entity_type.display_name().to_string(),
                });
            }
        }
        Ok(())
    }
}
