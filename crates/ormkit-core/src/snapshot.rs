//! Serializable export of a built model.

use serde::Serialize;

use crate::annotation::Annotation;
use crate::error::Result;
use crate::metadata::{EntityType, EntityTypeId, KeyId, Model, PropertyId};
use crate::providers::RelationalEntityTypeExt;
use crate::source::ConfigurationSource;
use crate::types::{StoreGeneratedPattern, ValueType};

/// Read-only, name-based copy of a [`Model`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSnapshot {
    /// Entity types in insertion order.
    pub entity_types: Vec<EntityTypeSnapshot>,
    /// Model annotations in insertion order.
    pub annotations: Vec<Annotation>,
}

/// Exported entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTypeSnapshot {
    pub name: String,
    pub source: ConfigurationSource,
    pub table: String,
    pub schema: Option<String>,
    pub properties: Vec<PropertySnapshot>,
    pub primary_key: Option<KeySnapshot>,
    pub alternate_keys: Vec<KeySnapshot>,
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    pub navigations: Vec<NavigationSnapshot>,
    pub annotations: Vec<Annotation>,
}

/// Exported property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySnapshot {
    pub name: String,
    pub value_type: ValueType,
    pub shadow: bool,
    pub nullable: bool,
    pub nullable_source: Option<ConfigurationSource>,
    pub concurrency_token: bool,
    pub concurrency_token_source: Option<ConfigurationSource>,
    pub store_generated: StoreGeneratedPattern,
    pub store_generated_source: Option<ConfigurationSource>,
}

/// Exported key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySnapshot {
    pub properties: Vec<String>,
    pub source: ConfigurationSource,
}

/// Exported foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeySnapshot {
    pub properties: Vec<String>,
    pub principal: String,
    pub principal_key: Vec<String>,
    pub unique: bool,
    pub source: ConfigurationSource,
}

/// Exported navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSnapshot {
    pub name: String,
    pub target: String,
    pub points_to_principal: bool,
}

impl ModelSnapshot {
    /// Capture `model`.
    pub fn capture(model: &Model) -> Self {
        Self {
            entity_types: model
                .entity_types()
                .map(|(_, e)| capture_entity_type(model, e))
                .collect(),
            annotations: model.annotations().iter().cloned().collect(),
        }
    }

    /// Find an exported entity type by name.
    pub fn entity_type(&self, name: &str) -> Option<&EntityTypeSnapshot> {
        self.entity_types.iter().find(|e| e.name == name)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn capture_entity_type(model: &Model, entity_type: &EntityType) -> EntityTypeSnapshot {
    let key = |key: KeyId| {
        model.key(key).map(|k| KeySnapshot {
            properties: names(model, k.properties()),
            source: k.source(),
        })
    };
    let entity_name = |id: EntityTypeId| {
        model
            .entity_type(id)
            .map(|e| e.name().to_string())
            .unwrap_or_default()
    };

    let properties = entity_type
        .properties()
        .iter()
        .filter_map(|p| model.property(*p))
        .map(|p| PropertySnapshot {
            name: p.name().to_string(),
            value_type: p.value_type(),
            shadow: p.is_shadow(),
            nullable: p.is_nullable(),
            nullable_source: p.nullable_source(),
            concurrency_token: p.is_concurrency_token(),
            concurrency_token_source: p.concurrency_token_source(),
            store_generated: p.store_generated_pattern(),
            store_generated_source: p.store_generated_pattern_source(),
        })
        .collect();

    let foreign_keys = entity_type
        .foreign_keys()
        .iter()
        .filter_map(|fk| model.foreign_key(*fk))
        .map(|fk| ForeignKeySnapshot {
            properties: names(model, fk.properties()),
            principal: entity_name(fk.principal()),
            principal_key: model
                .key(fk.principal_key())
                .map(|k| names(model, k.properties()))
                .unwrap_or_default(),
            unique: fk.is_unique(),
            source: fk.source(),
        })
        .collect();

    let navigations = entity_type
        .navigations()
        .iter()
        .filter_map(|n| model.navigation(*n))
        .filter_map(|n| {
            let fk = model.foreign_key(n.foreign_key())?;
            let target = if n.points_to_principal() {
                fk.principal()
            } else {
                fk.dependent()
            };
            Some(NavigationSnapshot {
                name: n.name().to_string(),
                target: entity_name(target),
                points_to_principal: n.points_to_principal(),
            })
        })
        .collect();

    let mapping = entity_type.relational();
    EntityTypeSnapshot {
        name: entity_type.name().to_string(),
        source: entity_type.source(),
        table: mapping.table().to_string(),
        schema: mapping.schema().map(str::to_string),
        properties,
        primary_key: entity_type.primary_key().and_then(key),
        alternate_keys: entity_type
            .keys()
            .iter()
            .filter(|k| Some(**k) != entity_type.primary_key())
            .filter_map(|k| key(*k))
            .collect(),
        foreign_keys,
        navigations,
        annotations: entity_type.annotations().iter().cloned().collect(),
    }
}

fn names(model: &Model, properties: &[PropertyId]) -> Vec<String> {
    model
        .property_names(properties)
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_exports_names_and_sources() {
        let mut model = Model::new();
        let blog = model.add_entity_type("Blog", None, ConfigurationSource::Explicit);
        let id = model
            .add_property(blog, "Id", ValueType::Int, false, false, ConfigurationSource::Convention)
            .unwrap();
        let pk = model
            .add_key(blog, vec![id], ConfigurationSource::Convention)
            .unwrap();
        model.set_primary_key(blog, Some(pk), ConfigurationSource::Convention);

        let snapshot = ModelSnapshot::capture(&model);
        let exported = snapshot.entity_type("Blog").unwrap();
        assert_eq!(exported.table, "Blog");
        assert_eq!(
            exported.primary_key,
            Some(KeySnapshot {
                properties: vec!["Id".to_string()],
                source: ConfigurationSource::Convention,
            })
        );
        assert!(exported.alternate_keys.is_empty());

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"name\": \"Blog\""));
        assert!(json.contains("\"value_type\": \"Int\""));
    }
}
