use ormkit_core::{ConfigurationSource, EntityTypeId, Model, PropertyId, Result};

use crate::LOG_TARGET;
use crate::builder::InternalModelBuilder;
use crate::convention::EntityTypeAddedConvention;
use crate::naming;

/// Picks `Id` or `{EntityType}Id` as the primary key when none is set.
///
/// Properties already used by a foreign key are not candidates. `Id` wins
/// over `{EntityType}Id`; several equally good candidates leave the entity
/// type without a key.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDiscoveryConvention;

impl KeyDiscoveryConvention {
    /// The property key discovery would choose.
    pub fn find_key_property(model: &Model, entity_type: EntityTypeId) -> Option<PropertyId> {
        let owner = model.entity_type(entity_type)?;
        let candidates: Vec<_> = owner
            .properties()
            .iter()
            .copied()
            .filter(|p| !model.is_foreign_key_property(*p))
            .filter_map(|p| model.property(p).map(|prop| (p, prop.name())))
            .filter(|(_, name)| naming::is_key_name(owner.name(), name))
            .collect();

        let (plain, prefixed): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|(_, name)| naming::is_plain_id(name));
        let chosen = if plain.is_empty() { prefixed } else { plain };
        match chosen.as_slice() {
            [(id, _)] => Some(*id),
            [] => None,
            several => {
                tracing::debug!(
                    target: LOG_TARGET,
                    entity_type = owner.name(),
                    candidates = ?several.iter().map(|(_, n)| *n).collect::<Vec<_>>(),
                    "Several key candidates, no primary key discovered"
                );
                None
            }
        }
    }

    /// Set the discovered key on `entity_type` if it has no primary key.
    pub fn discover(builder: &mut InternalModelBuilder, entity_type: EntityTypeId) -> Result<()> {
        if builder.model().primary_key(entity_type).is_some() {
            return Ok(());
        }
        if let Some(property) = Self::find_key_property(builder.model(), entity_type) {
            builder.primary_key(entity_type, &[property], ConfigurationSource::Convention)?;
        }
        Ok(())
    }
}

impl EntityTypeAddedConvention for KeyDiscoveryConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        entity_type: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        Self::discover(builder, entity_type)?;
        Ok(Some(entity_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conventions::PropertyDiscoveryConvention;
    use crate::convention_set::ConventionSet;
    use ormkit_core::{EntityShape, MemberInfo, ValueType};
    use std::sync::Arc;

    fn builder() -> InternalModelBuilder {
        let mut set = ConventionSet::new();
        set.entity_type_added.push(Arc::new(PropertyDiscoveryConvention));
        set.entity_type_added.push(Arc::new(KeyDiscoveryConvention));
        InternalModelBuilder::new(set).unwrap()
    }

    fn primary_key_names(builder: &InternalModelBuilder, entity_type: EntityTypeId) -> Vec<String> {
        let model = builder.model();
        model
            .primary_key(entity_type)
            .map(|k| {
                model
                    .property_names(k.properties())
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_discovers_id() {
        let mut b = builder();
        let id = b
            .entity(
                EntityShape::new("Blog")
                    .member(MemberInfo::scalar("Title", ValueType::Text))
                    .member(MemberInfo::scalar("Id", ValueType::Int)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        assert_eq!(primary_key_names(&b, id), vec!["Id"]);
        assert_eq!(
            b.model().entity_type(id).unwrap().primary_key_source(),
            Some(ConfigurationSource::Convention)
        );
    }

    #[test]
    fn test_discovers_type_prefixed_id_case_insensitively() {
        let mut b = builder();
        let id = b
            .entity(
                EntityShape::new("Blog").member(MemberInfo::scalar("BLOGID", ValueType::Int)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        assert_eq!(primary_key_names(&b, id), vec!["BLOGID"]);
    }

    #[test]
    fn test_plain_id_wins_over_prefixed() {
        let mut b = builder();
        let id = b
            .entity(
                EntityShape::new("Blog")
                    .member(MemberInfo::scalar("BlogId", ValueType::Int))
                    .member(MemberInfo::scalar("Id", ValueType::Int)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        assert_eq!(primary_key_names(&b, id), vec!["Id"]);
    }

    #[test]
    fn test_no_candidate_no_key() {
        let mut b = builder();
        let id = b
            .entity(
                EntityShape::new("Blog").member(MemberInfo::scalar("Title", ValueType::Text)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        assert!(b.model().primary_key(id).is_none());
    }
}
