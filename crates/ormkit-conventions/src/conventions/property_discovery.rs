use ormkit_core::{ConfigurationSource, EntityTypeId, Result};

use crate::builder::InternalModelBuilder;
use crate::convention::EntityTypeAddedConvention;

/// Adds a property for every scalar member of the entity shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyDiscoveryConvention;

impl EntityTypeAddedConvention for PropertyDiscoveryConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        entity_type: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        let Some(shape) = builder
            .model()
            .entity_type(entity_type)
            .and_then(|e| e.shape())
            .cloned()
        else {
            return Ok(Some(entity_type));
        };

        for member in shape.scalar_members() {
            if builder.model().find_property(entity_type, &member.name).is_some() {
                continue;
            }
            builder.property(entity_type, &member.name, ConfigurationSource::Convention)?;
            if builder.model().entity_type(entity_type).is_none() {
                return Ok(None);
            }
        }
        Ok(Some(entity_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention_set::ConventionSet;
    use ormkit_core::{EntityShape, MemberInfo, ValueType};
    use std::sync::Arc;

    fn shape() -> EntityShape {
        EntityShape::new("Order")
            .member(MemberInfo::scalar("Id", ValueType::Int))
            .member(MemberInfo::reference("Customer", "Customer"))
            .member(MemberInfo::scalar("Number", ValueType::Text))
            .member(MemberInfo::optional("ShippedAt", ValueType::DateTime))
    }

    fn discovered_names() -> Vec<String> {
        let mut set = ConventionSet::new();
        set.entity_type_added.push(Arc::new(PropertyDiscoveryConvention));
        let mut builder = InternalModelBuilder::new(set).unwrap();
        let id = builder
            .entity(shape(), ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let model = builder.model();
        model
            .property_names(model.entity_type(id).unwrap().properties())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_scalar_members_in_declaration_order() {
        assert_eq!(discovered_names(), vec!["Id", "Number", "ShippedAt"]);
    }

    #[test]
    fn test_discovery_is_deterministic() {
        assert_eq!(discovered_names(), discovered_names());
    }

    #[test]
    fn test_nullability_follows_member() {
        let mut set = ConventionSet::new();
        set.entity_type_added.push(Arc::new(PropertyDiscoveryConvention));
        let mut builder = InternalModelBuilder::new(set).unwrap();
        let id = builder
            .entity(shape(), ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let model = builder.model();
        let nullable = |name: &str| {
            model
                .property(model.find_property(id, name).unwrap())
                .unwrap()
                .is_nullable()
        };
        assert!(!nullable("Id"));
        assert!(nullable("Number"));
        assert!(nullable("ShippedAt"));
    }
}
