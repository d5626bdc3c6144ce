//! The root of the metadata graph.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    Arena, EntityType, EntityTypeId, ForeignKey, ForeignKeyId, Key, KeyId, Navigation,
    NavigationId, Property, PropertyId,
};
use crate::annotation::Annotations;
use crate::error::{Error, Result};
use crate::shape::EntityShape;
use crate::source::ConfigurationSource;
use crate::types::ValueType;

/// Owner of every entity type and of all metadata hanging off them.
///
/// Built once per build session and mutated only while building; afterwards it
/// is a read-only snapshot that can be shared freely (`Model` is `Send + Sync`).
#[derive(Debug, Clone, Default)]
pub struct Model {
    entity_types: Arena<EntityType>,
    properties: Arena<Property>,
    keys: Arena<Key>,
    foreign_keys: Arena<ForeignKey>,
    navigations: Arena<Navigation>,
    names: HashMap<String, EntityTypeId>,
    order: Vec<EntityTypeId>,
    annotations: Annotations,
}

impl Model {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Get an entity type by id.
    pub fn entity_type(&self, id: EntityTypeId) -> Option<&EntityType> {
        self.entity_types.get(id.index())
    }

    /// Get an entity type by id, mutably.
    pub fn entity_type_mut(&mut self, id: EntityTypeId) -> Option<&mut EntityType> {
        self.entity_types.get_mut(id.index())
    }

    /// Get an entity type by id or fail.
    pub fn require_entity_type(&self, id: EntityTypeId) -> Result<&EntityType> {
        self.entity_type(id)
            .ok_or_else(|| Error::EntityTypeNotFound(format!("#{}", id.index())))
    }

    /// Find an entity type by name.
    pub fn find_entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entity_type_id(name).and_then(|id| self.entity_type(id))
    }

    /// Resolve an entity type name to its id.
    pub fn entity_type_id(&self, name: &str) -> Option<EntityTypeId> {
        self.names.get(name).copied()
    }

    /// Entity types in insertion order.
    pub fn entity_types(&self) -> impl Iterator<Item = (EntityTypeId, &EntityType)> {
        self.order
            .iter()
            .filter_map(|id| self.entity_type(*id).map(|e| (*id, e)))
    }

    /// Ids of all entity types in insertion order.
    pub fn entity_type_ids(&self) -> Vec<EntityTypeId> {
        self.order.clone()
    }

    /// Get a property by id.
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(id.index())
    }

    /// Get a property by id, mutably. Attribute setters on [`Property`] are guarded.
    pub fn property_mut(&mut self, id: PropertyId) -> Option<&mut Property> {
        self.properties.get_mut(id.index())
    }

    /// Find a property of `entity_type` by name.
    pub fn find_property(&self, entity_type: EntityTypeId, name: &str) -> Option<PropertyId> {
        self.entity_type(entity_type)?
            .properties
            .iter()
            .copied()
            .find(|p| self.property(*p).is_some_and(|p| p.name() == name))
    }

    /// Names of the given properties, in order.
    pub fn property_names(&self, properties: &[PropertyId]) -> Vec<&str> {
        properties
            .iter()
            .filter_map(|p| self.property(*p).map(Property::name))
            .collect()
    }

    /// Get a key by id.
    pub fn key(&self, id: KeyId) -> Option<&Key> {
        self.keys.get(id.index())
    }

    /// Primary key of an entity type.
    pub fn primary_key(&self, entity_type: EntityTypeId) -> Option<&Key> {
        self.entity_type(entity_type)?
            .primary_key
            .and_then(|k| self.key(k))
    }

    /// Find an existing key over exactly these properties.
    pub fn find_key(&self, entity_type: EntityTypeId, properties: &[PropertyId]) -> Option<KeyId> {
        self.entity_type(entity_type)?
            .keys
            .iter()
            .copied()
            .find(|k| self.key(*k).is_some_and(|k| k.properties() == properties))
    }

    /// Get a foreign key by id.
    pub fn foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKey> {
        self.foreign_keys.get(id.index())
    }

    /// Get a navigation by id.
    pub fn navigation(&self, id: NavigationId) -> Option<&Navigation> {
        self.navigations.get(id.index())
    }

    /// Find a navigation declared on `entity_type` by name.
    pub fn find_navigation(&self, entity_type: EntityTypeId, name: &str) -> Option<NavigationId> {
        self.entity_type(entity_type)?
            .navigations
            .iter()
            .copied()
            .find(|n| self.navigation(*n).is_some_and(|n| n.name() == name))
    }

    /// Whether `property` is used by any outgoing foreign key of its entity type.
    pub fn is_foreign_key_property(&self, property: PropertyId) -> bool {
        let Some(entity_type) = self
            .property(property)
            .and_then(|p| self.entity_type(p.entity_type()))
        else {
            return false;
        };
        entity_type
            .foreign_keys
            .iter()
            .filter_map(|fk| self.foreign_key(*fk))
            .any(|fk| fk.contains_property(property))
    }

    /// Whether `property` is part of any key of its entity type.
    pub fn is_key_property(&self, property: PropertyId) -> bool {
        let Some(entity_type) = self
            .property(property)
            .and_then(|p| self.entity_type(p.entity_type()))
        else {
            return false;
        };
        entity_type
            .keys
            .iter()
            .filter_map(|k| self.key(*k))
            .any(|k| k.properties().contains(&property))
    }

    /// Model-level annotations.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Mutable model-level annotations.
    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    // ========================================================================
    // Raw graph mutations
    // ========================================================================

    /// Add an entity type, or raise the source of an existing one.
    pub fn add_entity_type(
        &mut self,
        name: &str,
        shape: Option<Arc<EntityShape>>,
        source: ConfigurationSource,
    ) -> EntityTypeId {
        if let Some(id) = self.entity_type_id(name) {
            if let Some(existing) = self.entity_type_mut(id) {
                existing.update_source(source);
            }
            return id;
        }
        let id = EntityTypeId::new(
            self.entity_types
                .insert(EntityType::new(name.to_string(), shape, source)),
        );
        self.names.insert(name.to_string(), id);
        self.order.push(id);
        id
    }

    /// Remove an entity type together with everything it owns and every
    /// foreign key that references it.
    pub fn remove_entity_type(&mut self, id: EntityTypeId) -> Option<EntityType> {
        let entity_type = self.entity_type(id)?;
        let foreign_keys: Vec<_> = entity_type
            .foreign_keys
            .iter()
            .chain(entity_type.referencing_foreign_keys.iter())
            .copied()
            .collect();
        for fk in foreign_keys {
            self.remove_foreign_key(fk);
        }

        let removed = self.entity_types.remove(id.index())?;
        for key in &removed.keys {
            self.keys.remove(key.index());
        }
        for property in &removed.properties {
            self.properties.remove(property.index());
        }
        self.names.remove(removed.name());
        self.order.retain(|e| *e != id);
        Some(removed)
    }

    /// Add a property to an entity type.
    pub fn add_property(
        &mut self,
        entity_type: EntityTypeId,
        name: &str,
        value_type: ValueType,
        nullable: bool,
        shadow: bool,
        source: ConfigurationSource,
    ) -> Result<PropertyId> {
        self.require_entity_type(entity_type)?;
        let id = PropertyId::new(self.properties.insert(Property::new(
            name.to_string(),
            entity_type,
            value_type,
            nullable,
            shadow,
            source,
        )));
        if let Some(e) = self.entity_type_mut(entity_type) {
            e.properties.push(id);
        }
        Ok(id)
    }

    /// Raise the recorded source of a property.
    pub fn update_property_source(&mut self, id: PropertyId, source: ConfigurationSource) {
        if let Some(p) = self.property_mut(id) {
            p.update_source(source);
        }
    }

    /// Turn a shadow property into a member-backed one (or back).
    pub fn set_property_shadow(&mut self, id: PropertyId, shadow: bool) {
        if let Some(p) = self.property_mut(id) {
            p.set_shadow(shadow);
        }
    }

    /// Remove a property. Keys and foreign keys using it must be removed first.
    pub fn remove_property(&mut self, id: PropertyId) -> Option<Property> {
        let property = self.properties.remove(id.index())?;
        if let Some(e) = self.entity_type_mut(property.entity_type()) {
            e.properties.retain(|p| *p != id);
        }
        Some(property)
    }

    /// Add a key, or raise the source of an identical existing key.
    pub fn add_key(
        &mut self,
        entity_type: EntityTypeId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> Result<KeyId> {
        let owner = self.require_entity_type(entity_type)?;
        if properties.is_empty() {
            return Err(Error::invalid_argument(
                "properties",
                format!("key on '{}' must have at least one property", owner.name()),
            ));
        }
        for property in &properties {
            let belongs = self
                .property(*property)
                .is_some_and(|p| p.entity_type() == entity_type);
            if !belongs {
                return Err(Error::invalid_argument(
                    "properties",
                    format!(
                        "key property #{} does not belong to '{}'",
                        property.index(),
                        owner.name()
                    ),
                ));
            }
        }
        for (i, property) in properties.iter().enumerate() {
            if properties[..i].contains(property) {
                return Err(Error::invalid_argument(
                    "properties",
                    format!("key on '{}' lists a property twice", owner.name()),
                ));
            }
        }

        if let Some(existing) = self.find_key(entity_type, &properties) {
            if let Some(k) = self.keys.get_mut(existing.index()) {
                k.update_source(source);
            }
            return Ok(existing);
        }
        let id = KeyId::new(self.keys.insert(Key::new(entity_type, properties, source)));
        if let Some(e) = self.entity_type_mut(entity_type) {
            e.keys.push(id);
        }
        Ok(id)
    }

    /// Point the entity type's primary key at `key` (or clear it).
    ///
    /// This is the raw assignment; precedence checks happen in the builder.
    pub fn set_primary_key(
        &mut self,
        entity_type: EntityTypeId,
        key: Option<KeyId>,
        source: ConfigurationSource,
    ) {
        if let Some(e) = self.entity_type_mut(entity_type) {
            e.primary_key = key;
            e.primary_key_source = key.map(|_| source);
        }
    }

    /// Remove a key. Foreign keys referencing it must be removed first.
    pub fn remove_key(&mut self, id: KeyId) -> Option<Key> {
        let key = self.keys.remove(id.index())?;
        if let Some(e) = self.entity_type_mut(key.entity_type()) {
            e.keys.retain(|k| *k != id);
            if e.primary_key == Some(id) {
                e.primary_key = None;
                e.primary_key_source = None;
            }
        }
        Some(key)
    }

    /// Add a foreign key without properties; associate them afterwards with
    /// [`Model::set_foreign_key_properties`].
    pub fn add_foreign_key(
        &mut self,
        dependent: EntityTypeId,
        principal: EntityTypeId,
        principal_key: KeyId,
        unique: bool,
        source: ConfigurationSource,
    ) -> Result<ForeignKeyId> {
        self.require_entity_type(dependent)?;
        self.require_entity_type(principal)?;
        let key_owner = self.key(principal_key).map(Key::entity_type);
        if key_owner != Some(principal) {
            return Err(Error::MissingPrincipalKey {
                principal: self.require_entity_type(principal)?.name().to_string(),
            });
        }

        let id = ForeignKeyId::new(self.foreign_keys.insert(ForeignKey::new(
            dependent,
            principal,
            principal_key,
            unique,
            source,
        )));
        if let Some(e) = self.entity_type_mut(dependent) {
            e.foreign_keys.push(id);
        }
        if let Some(e) = self.entity_type_mut(principal) {
            e.referencing_foreign_keys.push(id);
        }
        Ok(id)
    }

    /// Guarded association of dependent properties with a foreign key.
    pub fn set_foreign_key_properties(
        &mut self,
        id: ForeignKeyId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> bool {
        self.foreign_keys
            .get_mut(id.index())
            .is_some_and(|fk| fk.try_set_properties(properties, source))
    }

    /// Re-target a foreign key at another key of the same principal.
    pub fn set_foreign_key_principal_key(&mut self, id: ForeignKeyId, key: KeyId) {
        if let Some(fk) = self.foreign_keys.get_mut(id.index()) {
            fk.set_principal_key(key);
        }
    }

    /// Set whether a foreign key is unique (one-to-one).
    pub fn set_foreign_key_unique(&mut self, id: ForeignKeyId, unique: bool) {
        if let Some(fk) = self.foreign_keys.get_mut(id.index()) {
            fk.set_unique(unique);
        }
    }

    /// Raise the recorded source of a foreign key.
    pub fn update_foreign_key_source(&mut self, id: ForeignKeyId, source: ConfigurationSource) {
        if let Some(fk) = self.foreign_keys.get_mut(id.index()) {
            fk.update_source(source);
        }
    }

    /// Raise the recorded source of an entity type.
    pub fn update_entity_type_source(&mut self, id: EntityTypeId, source: ConfigurationSource) {
        if let Some(e) = self.entity_type_mut(id) {
            e.update_source(source);
        }
    }

    /// Remove a foreign key and its navigations.
    pub fn remove_foreign_key(&mut self, id: ForeignKeyId) -> Option<ForeignKey> {
        let fk = self.foreign_keys.get(id.index())?;
        let navigations: Vec<_> = fk
            .dependent_to_principal()
            .into_iter()
            .chain(fk.principal_to_dependent())
            .collect();
        for navigation in navigations {
            self.remove_navigation(navigation);
        }

        let fk = self.foreign_keys.remove(id.index())?;
        if let Some(e) = self.entity_type_mut(fk.dependent()) {
            e.foreign_keys.retain(|f| *f != id);
        }
        if let Some(e) = self.entity_type_mut(fk.principal()) {
            e.referencing_foreign_keys.retain(|f| *f != id);
        }
        Some(fk)
    }

    /// Attach a navigation to a foreign key.
    ///
    /// Dependent-to-principal navigations are declared on the dependent,
    /// the inverse on the principal.
    pub fn add_navigation(
        &mut self,
        foreign_key: ForeignKeyId,
        name: &str,
        points_to_principal: bool,
    ) -> Result<NavigationId> {
        let fk = self
            .foreign_key(foreign_key)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        let declaring = if points_to_principal {
            fk.dependent()
        } else {
            fk.principal()
        };
        if self.find_navigation(declaring, name).is_some() {
            return Err(Error::invalid_argument(
                "navigation",
                format!(
                    "navigation '{}' already exists on '{}'",
                    name,
                    self.require_entity_type(declaring)?.name()
                ),
            ));
        }

        let id = NavigationId::new(self.navigations.insert(Navigation::new(
            name.to_string(),
            declaring,
            foreign_key,
            points_to_principal,
        )));
        if let Some(fk) = self.foreign_keys.get_mut(foreign_key.index()) {
            fk.set_navigation(id, points_to_principal);
        }
        if let Some(e) = self.entity_type_mut(declaring) {
            e.navigations.push(id);
        }
        Ok(id)
    }

    /// Remove a navigation.
    pub fn remove_navigation(&mut self, id: NavigationId) -> Option<Navigation> {
        let navigation = self.navigations.remove(id.index())?;
        if let Some(fk) = self.foreign_keys.get_mut(navigation.foreign_key().index()) {
            fk.clear_navigation(id);
        }
        if let Some(e) = self.entity_type_mut(navigation.declaring_entity_type()) {
            e.navigations.retain(|n| *n != id);
        }
        Some(navigation)
    }

    /// Check that a foreign key's properties match its principal key.
    pub fn validate_foreign_key(&self, id: ForeignKeyId) -> Result<()> {
        let fk = self
            .foreign_key(id)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        self.check_foreign_key_shape(id, fk.properties(), fk.principal_key())
    }

    /// Check that `properties` could serve as the dependent side of `id`
    /// when it references `principal_key`, without changing anything.
    pub fn check_foreign_key_shape(
        &self,
        id: ForeignKeyId,
        properties: &[PropertyId],
        principal_key: KeyId,
    ) -> Result<()> {
        let fk = self
            .foreign_key(id)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        let dependent = self.require_entity_type(fk.dependent())?.name().to_string();
        let principal = self.require_entity_type(fk.principal())?.name().to_string();
        let incompatible = |reason: String| Error::IncompatibleForeignKey {
            dependent: dependent.clone(),
            principal: principal.clone(),
            reason,
        };

        let principal_key = self
            .key(principal_key)
            .ok_or_else(|| Error::MissingPrincipalKey {
                principal: principal.clone(),
            })?;
        if properties.len() != principal_key.properties().len() {
            return Err(incompatible(format!(
                "{} foreign key properties for {} principal key properties",
                properties.len(),
                principal_key.properties().len()
            )));
        }
        for (dep, prin) in properties.iter().zip(principal_key.properties()) {
            let (Some(dep), Some(prin)) = (self.property(*dep), self.property(*prin)) else {
                return Err(incompatible("a property no longer exists".to_string()));
            };
            if !dep.value_type().is_compatible_with(prin.value_type()) {
                return Err(incompatible(format!(
                    "'{}' ({}) cannot reference '{}' ({})",
                    dep.name(),
                    dep.value_type(),
                    prin.name(),
                    prin.value_type()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_blog_and_post() -> (Model, EntityTypeId, EntityTypeId) {
        let mut model = Model::new();
        let blog = model.add_entity_type("Blog", None, ConfigurationSource::Explicit);
        let post = model.add_entity_type("Post", None, ConfigurationSource::Explicit);
        (model, blog, post)
    }

    #[test]
    fn test_entity_types_keep_insertion_order() {
        let (model, blog, post) = model_with_blog_and_post();
        let ids: Vec<_> = model.entity_types().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![blog, post]);
        assert_eq!(model.entity_type_id("Post"), Some(post));
    }

    #[test]
    fn test_add_entity_type_twice_raises_source() {
        let mut model = Model::new();
        let a = model.add_entity_type("A", None, ConfigurationSource::Convention);
        let again = model.add_entity_type("A", None, ConfigurationSource::Explicit);
        assert_eq!(a, again);
        assert_eq!(
            model.entity_type(a).unwrap().source(),
            ConfigurationSource::Explicit
        );
    }

    #[test]
    fn test_key_rejects_empty_and_foreign_properties() {
        let (mut model, blog, post) = model_with_blog_and_post();
        let post_id = model
            .add_property(post, "Id", ValueType::Int, false, false, ConfigurationSource::Explicit)
            .unwrap();
        assert!(matches!(
            model.add_key(blog, vec![], ConfigurationSource::Explicit),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            model.add_key(blog, vec![post_id], ConfigurationSource::Explicit),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_identical_key_is_reused() {
        let (mut model, blog, _) = model_with_blog_and_post();
        let id = model
            .add_property(blog, "Id", ValueType::Int, false, false, ConfigurationSource::Explicit)
            .unwrap();
        let k1 = model
            .add_key(blog, vec![id], ConfigurationSource::Convention)
            .unwrap();
        let k2 = model
            .add_key(blog, vec![id], ConfigurationSource::Explicit)
            .unwrap();
        assert_eq!(k1, k2);
        assert_eq!(model.key(k1).unwrap().source(), ConfigurationSource::Explicit);
    }

    #[test]
    fn test_foreign_key_shape_validation() {
        let (mut model, blog, post) = model_with_blog_and_post();
        let blog_id = model
            .add_property(blog, "Id", ValueType::Int, false, false, ConfigurationSource::Explicit)
            .unwrap();
        let pk = model
            .add_key(blog, vec![blog_id], ConfigurationSource::Explicit)
            .unwrap();
        model.set_primary_key(blog, Some(pk), ConfigurationSource::Explicit);
        let blog_name = model
            .add_property(post, "BlogName", ValueType::Text, true, false, ConfigurationSource::Explicit)
            .unwrap();

        let fk = model
            .add_foreign_key(post, blog, pk, false, ConfigurationSource::Explicit)
            .unwrap();
        assert!(matches!(
            model.validate_foreign_key(fk),
            Err(Error::IncompatibleForeignKey { .. })
        ));

        model.set_foreign_key_properties(fk, vec![blog_name], ConfigurationSource::Explicit);
        let err = model.validate_foreign_key(fk).unwrap_err();
        assert!(err.to_string().contains("BlogName"));

        let blog_ref = model
            .add_property(post, "BlogId", ValueType::Int, true, false, ConfigurationSource::Explicit)
            .unwrap();
        model.set_foreign_key_properties(fk, vec![blog_ref], ConfigurationSource::Explicit);
        assert!(model.validate_foreign_key(fk).is_ok());
        assert!(model.is_foreign_key_property(blog_ref));
        assert_eq!(model.entity_type(blog).unwrap().referencing_foreign_keys(), &[fk]);
    }

    #[test]
    fn test_remove_entity_type_drops_incoming_foreign_keys() {
        let (mut model, blog, post) = model_with_blog_and_post();
        let blog_id = model
            .add_property(blog, "Id", ValueType::Int, false, false, ConfigurationSource::Explicit)
            .unwrap();
        let pk = model
            .add_key(blog, vec![blog_id], ConfigurationSource::Explicit)
            .unwrap();
        model.set_primary_key(blog, Some(pk), ConfigurationSource::Explicit);
        let fk = model
            .add_foreign_key(post, blog, pk, false, ConfigurationSource::Explicit)
            .unwrap();
        let nav = model.add_navigation(fk, "Blog", true).unwrap();

        model.remove_entity_type(blog);
        assert!(model.foreign_key(fk).is_none());
        assert!(model.navigation(nav).is_none());
        assert!(model.entity_type(post).unwrap().foreign_keys().is_empty());
        assert!(model.find_entity_type("Blog").is_none());
    }

    #[test]
    fn test_remove_key_clears_primary_key() {
        let (mut model, blog, _) = model_with_blog_and_post();
        let id = model
            .add_property(blog, "Id", ValueType::Int, false, false, ConfigurationSource::Explicit)
            .unwrap();
        let pk = model
            .add_key(blog, vec![id], ConfigurationSource::Explicit)
            .unwrap();
        model.set_primary_key(blog, Some(pk), ConfigurationSource::Explicit);
        model.remove_key(pk);
        assert!(model.primary_key(blog).is_none());
        assert_eq!(model.entity_type(blog).unwrap().primary_key_source(), None);
    }
}
