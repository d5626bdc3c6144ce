//! Relational table mapping annotations.

use crate::annotation::Annotations;
use crate::metadata::EntityType;
use crate::source::ConfigurationSource;

/// Annotation names used by relational providers.
pub struct RelationalNames;

impl RelationalNames {
    /// Namespace prefix.
    pub const PREFIX: &'static str = "Relational:";
    /// Storage table name.
    pub const TABLE_NAME: &'static str = "Relational:TableName";
    /// Storage schema.
    pub const SCHEMA: &'static str = "Relational:Schema";
}

/// Table/schema view of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMapping<'a> {
    entity_type: &'a EntityType,
}

impl<'a> TableMapping<'a> {
    /// Table name: the annotation, or the entity type name when unset.
    pub fn table(&self) -> &'a str {
        self.entity_type
            .annotations()
            .value(RelationalNames::TABLE_NAME)
            .unwrap_or_else(|| self.entity_type.name())
    }

    /// Schema, if one was configured.
    pub fn schema(&self) -> Option<&'a str> {
        self.entity_type.annotations().value(RelationalNames::SCHEMA)
    }

    /// Schema-qualified name (`schema.table` or `table`).
    pub fn qualified_name(&self) -> String {
        match self.schema() {
            Some(schema) => format!("{}.{}", schema, self.table()),
            None => self.table().to_string(),
        }
    }
}

/// Relational accessors on [`EntityType`].
pub trait RelationalEntityTypeExt {
    /// Read-only table mapping.
    fn relational(&self) -> TableMapping<'_>;
}

impl RelationalEntityTypeExt for EntityType {
    fn relational(&self) -> TableMapping<'_> {
        TableMapping { entity_type: self }
    }
}

/// Guarded write of the table name and optional schema.
///
/// Both are written or neither is; returns `false` when either write would be
/// rejected. A `None` schema leaves any existing schema untouched.
pub fn set_table(
    annotations: &mut Annotations,
    table: &str,
    schema: Option<&str>,
    source: ConfigurationSource,
) -> bool {
    let allowed = annotations.can_set(RelationalNames::TABLE_NAME, source)
        && schema.is_none_or(|_| annotations.can_set(RelationalNames::SCHEMA, source));
    if !allowed {
        return false;
    }
    annotations.try_set(RelationalNames::TABLE_NAME, table, source);
    if let Some(schema) = schema {
        annotations.try_set(RelationalNames::SCHEMA, schema, source);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Model;

    #[test]
    fn test_table_defaults_to_entity_name() {
        let mut model = Model::new();
        let id = model.add_entity_type("Customer", None, ConfigurationSource::Explicit);
        let entity_type = model.entity_type(id).unwrap();
        assert_eq!(entity_type.relational().table(), "Customer");
        assert_eq!(entity_type.relational().schema(), None);
        assert_eq!(entity_type.relational().qualified_name(), "Customer");
    }

    #[test]
    fn test_set_table_respects_source() {
        let mut model = Model::new();
        let id = model.add_entity_type("Customer", None, ConfigurationSource::Explicit);
        let annotations = model.entity_type_mut(id).unwrap().annotations_mut();
        assert!(set_table(annotations, "Customers", Some("sales"), ConfigurationSource::Explicit));
        assert!(!set_table(
            annotations,
            "Other",
            Some("dbo"),
            ConfigurationSource::DataAnnotation
        ));

        let mapping = model.entity_type(id).unwrap().relational();
        assert_eq!(mapping.table(), "Customers");
        assert_eq!(mapping.qualified_name(), "sales.Customers");
    }

    #[test]
    fn test_set_table_is_all_or_nothing() {
        let mut annotations = Annotations::new();
        annotations.try_set(RelationalNames::SCHEMA, "sales", ConfigurationSource::Explicit);
        assert!(!set_table(
            &mut annotations,
            "Customers",
            Some("dbo"),
            ConfigurationSource::DataAnnotation
        ));
        assert!(annotations.get(RelationalNames::TABLE_NAME).is_none());
        assert_eq!(annotations.value(RelationalNames::SCHEMA), Some("sales"));

        assert!(set_table(
            &mut annotations,
            "Customers",
            None,
            ConfigurationSource::DataAnnotation
        ));
        assert_eq!(annotations.value(RelationalNames::TABLE_NAME), Some("Customers"));
    }
}
