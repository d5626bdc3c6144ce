use ormkit_core::{ConfigurationSource, EntityTypeId, Marker, MarkerKind, Result};

use crate::builder::InternalModelBuilder;
use crate::convention::EntityTypeAddedConvention;

/// `Table(name, schema)` on the entity type sets its table mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalTableAttributeConvention;

impl EntityTypeAddedConvention for RelationalTableAttributeConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        entity_type: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        let marker = builder
            .model()
            .entity_type(entity_type)
            .and_then(|e| e.markers())
            .and_then(|m| m.find_entity_marker(MarkerKind::Table))
            .cloned();
        if let Some(Marker::Table { name, schema }) = marker {
            builder.to_table(
                entity_type,
                &name,
                schema.as_deref(),
                ConfigurationSource::DataAnnotation,
            )?;
        }
        Ok(Some(entity_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention_set::ConventionSet;
    use crate::conventions::PropertyDiscoveryConvention;
    use ormkit_core::providers::RelationalNames;
    use ormkit_core::{EntityShape, MemberInfo, RelationalEntityTypeExt, ValueType};
    use std::sync::Arc;

    fn a() -> EntityShape {
        EntityShape::new("A")
            .marker(Marker::table_in_schema("MyTable", "MySchema"))
            .member(MemberInfo::scalar("Id", ValueType::Int))
            .member(MemberInfo::scalar("Name", ValueType::Text))
    }

    fn builder_with_a() -> (InternalModelBuilder, EntityTypeId) {
        let mut set = ConventionSet::new();
        set.entity_type_added.push(Arc::new(PropertyDiscoveryConvention));
        let mut builder = InternalModelBuilder::new(set).unwrap();
        let e = builder.entity(a(), ConfigurationSource::Explicit).unwrap().unwrap();
        (builder, e)
    }

    #[test]
    fn test_overrides_convention_source() {
        let (mut builder, e) = builder_with_a();
        builder
            .entity_annotation(e, RelationalNames::TABLE_NAME, "ConventionalName", ConfigurationSource::Convention)
            .unwrap();
        builder
            .entity_annotation(e, RelationalNames::SCHEMA, "ConventionalSchema", ConfigurationSource::Convention)
            .unwrap();

        RelationalTableAttributeConvention.apply(&mut builder, e).unwrap();

        let mapping = builder.model().entity_type(e).unwrap().relational();
        assert_eq!(mapping.table(), "MyTable");
        assert_eq!(mapping.schema(), Some("MySchema"));
    }

    #[test]
    fn test_does_not_override_explicit_source() {
        let (mut builder, e) = builder_with_a();
        builder
            .entity_annotation(e, RelationalNames::TABLE_NAME, "ExplicitName", ConfigurationSource::Explicit)
            .unwrap();
        builder
            .entity_annotation(e, RelationalNames::SCHEMA, "ExplicitName", ConfigurationSource::Explicit)
            .unwrap();

        RelationalTableAttributeConvention.apply(&mut builder, e).unwrap();

        let mapping = builder.model().entity_type(e).unwrap().relational();
        assert_eq!(mapping.table(), "ExplicitName");
        assert_eq!(mapping.schema(), Some("ExplicitName"));
    }
}
