//! Source-aware model mutations that trigger conventions.
//!
//! Every mutation takes the [`ConfigurationSource`] it is made at. A mutation
//! that loses against a stronger recorded source is a no-op reported through
//! the return value (`false` or `None`), never an error.

use std::collections::HashMap;
use std::sync::Arc;

use ormkit_core::providers::relational;
use ormkit_core::{
    ConfigurationSource, EntityShape, EntityTypeId, Error, ForeignKeyId, KeyId, MemberInfo, Model,
    PropertyId, Result, StoreGeneratedPattern, ValueType,
};

use crate::LOG_TARGET;
use crate::convention_set::ConventionSet;
use crate::dispatcher::ConventionDispatcher;

/// Convention-aware builder over a [`Model`].
#[derive(Debug)]
pub struct InternalModelBuilder {
    model: Model,
    dispatcher: ConventionDispatcher,
    ignored: HashMap<String, ConfigurationSource>,
}

impl InternalModelBuilder {
    /// Create a builder and run the model-initialized conventions.
    pub fn new(conventions: ConventionSet) -> Result<Self> {
        Self::with_conventions(Arc::new(conventions))
    }

    /// Create a builder over a shared convention set.
    pub fn with_conventions(conventions: Arc<ConventionSet>) -> Result<Self> {
        let mut builder = Self {
            model: Model::new(),
            dispatcher: ConventionDispatcher::new(conventions),
            ignored: HashMap::new(),
        };
        builder.dispatcher().on_model_initialized(&mut builder)?;
        Ok(builder)
    }

    /// The model being built.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Raw access to the model. Mutations made here do not run conventions.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// The conventions this builder runs.
    pub fn conventions(&self) -> &Arc<ConventionSet> {
        self.dispatcher.conventions()
    }

    fn dispatcher(&self) -> ConventionDispatcher {
        self.dispatcher.clone()
    }

    // ========================================================================
    // Entity types
    // ========================================================================

    /// Add (or re-assert) an entity type backed by `shape`.
    pub fn entity(
        &mut self,
        shape: impl Into<Arc<EntityShape>>,
        source: ConfigurationSource,
    ) -> Result<Option<EntityTypeId>> {
        let shape = shape.into();
        let name = shape.name().to_string();
        self.add_entity_type(&name, Some(shape), source)
    }

    /// Add (or re-assert) an entity type with no source shape.
    pub fn entity_by_name(
        &mut self,
        name: &str,
        source: ConfigurationSource,
    ) -> Result<Option<EntityTypeId>> {
        self.add_entity_type(name, None, source)
    }

    fn add_entity_type(
        &mut self,
        name: &str,
        shape: Option<Arc<EntityShape>>,
        source: ConfigurationSource,
    ) -> Result<Option<EntityTypeId>> {
        if name.is_empty() {
            return Err(Error::invalid_argument(
                "name",
                "entity type name must not be empty",
            ));
        }
        if let Some(id) = self.model.entity_type_id(name) {
            self.model.update_entity_type_source(id, source);
            return Ok(Some(id));
        }
        if let Some(ignored_at) = self.ignored.get(name).copied() {
            if !source.overrides(Some(ignored_at)) {
                tracing::trace!(
                    target: LOG_TARGET,
                    entity_type = name,
                    ignored_at = %ignored_at,
                    attempted = %source,
                    "Entity type is ignored"
                );
                return Ok(None);
            }
            self.ignored.remove(name);
        }

        let id = self.model.add_entity_type(name, shape, source);
        tracing::debug!(
            target: LOG_TARGET,
            entity_type = name,
            source = %source,
            "Entity type added"
        );
        self.dispatcher().on_entity_type_added(self, id)
    }

    /// Exclude `name` from the model.
    ///
    /// Removes an existing entity type unless it was added at a stronger
    /// source, and blocks later additions below `source`.
    pub fn ignore(&mut self, name: &str, source: ConfigurationSource) -> Result<bool> {
        if let Some(id) = self.model.entity_type_id(name) {
            let existing = self.model.require_entity_type(id)?.source();
            if !source.overrides(Some(existing)) {
                tracing::trace!(
                    target: LOG_TARGET,
                    entity_type = name,
                    current = %existing,
                    attempted = %source,
                    "Ignore rejected"
                );
                return Ok(false);
            }
            self.remove_entity_type(id)?;
        }
        let entry = self.ignored.entry(name.to_string()).or_insert(source);
        *entry = (*entry).max(source);
        tracing::debug!(target: LOG_TARGET, entity_type = name, source = %source, "Entity type ignored");
        Ok(true)
    }

    /// Whether `name` is currently ignored.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains_key(name)
    }

    fn remove_entity_type(&mut self, id: EntityTypeId) -> Result<()> {
        let entity_type = self.model.require_entity_type(id)?;
        let foreign_keys: Vec<_> = entity_type
            .foreign_keys()
            .iter()
            .chain(entity_type.referencing_foreign_keys())
            .copied()
            .collect();
        for fk in foreign_keys {
            if self.model.foreign_key(fk).is_some() {
                self.detach_foreign_key(fk)?;
            }
        }
        self.model.remove_entity_type(id);
        Ok(())
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Add (or re-assert) the property backed by scalar member `name`.
    pub fn property(
        &mut self,
        entity_type: EntityTypeId,
        name: &str,
        source: ConfigurationSource,
    ) -> Result<Option<PropertyId>> {
        let owner = self.model.require_entity_type(entity_type)?;
        let member = owner
            .shape()
            .and_then(|s| s.find_member(name))
            .and_then(MemberInfo::scalar_type);
        let Some((value_type, nullable)) = member else {
            if let Some(existing) = self.model.find_property(entity_type, name) {
                self.model.update_property_source(existing, source);
                return Ok(Some(existing));
            }
            return Err(Error::PropertyNotFound {
                entity_type: owner.display_name().to_string(),
                property: name.to_string(),
            });
        };
        self.add_property(entity_type, name, value_type, nullable, false, source)
    }

    /// Add (or re-assert) a property with no source member.
    pub fn shadow_property(
        &mut self,
        entity_type: EntityTypeId,
        name: &str,
        value_type: ValueType,
        nullable: bool,
        source: ConfigurationSource,
    ) -> Result<Option<PropertyId>> {
        self.add_property(entity_type, name, value_type, nullable, true, source)
    }

    fn add_property(
        &mut self,
        entity_type: EntityTypeId,
        name: &str,
        value_type: ValueType,
        nullable: bool,
        shadow: bool,
        source: ConfigurationSource,
    ) -> Result<Option<PropertyId>> {
        if name.is_empty() {
            return Err(Error::invalid_argument(
                "name",
                "property name must not be empty",
            ));
        }
        if let Some(existing) = self.model.find_property(entity_type, name) {
            let current = self
                .model
                .property(existing)
                .map(|p| p.value_type())
                .unwrap_or(value_type);
            if current != value_type {
                return Err(Error::invalid_argument(
                    "value_type",
                    format!(
                        "property '{}' already exists with type {}, not {}",
                        name, current, value_type
                    ),
                ));
            }
            let was_shadow = self.model.property(existing).is_some_and(|p| p.is_shadow());
            self.model.update_property_source(existing, source);
            if was_shadow && !shadow {
                self.model.set_property_shadow(existing, false);
                return self.dispatcher().on_property_added(self, existing);
            }
            return Ok(Some(existing));
        }

        let id = self
            .model
            .add_property(entity_type, name, value_type, nullable, shadow, source)?;
        tracing::trace!(
            target: LOG_TARGET,
            property = name,
            value_type = %value_type,
            shadow,
            source = %source,
            "Property added"
        );
        self.dispatcher().on_property_added(self, id)
    }

    /// Resolve property names, adding member-backed properties on demand.
    pub fn resolve_properties(
        &mut self,
        entity_type: EntityTypeId,
        names: &[&str],
        source: ConfigurationSource,
    ) -> Result<Vec<PropertyId>> {
        if names.is_empty() {
            return Err(Error::invalid_argument(
                "property_names",
                "at least one property name is required",
            ));
        }
        let mut properties = Vec::with_capacity(names.len());
        for name in names {
            let id = match self.model.find_property(entity_type, name) {
                Some(id) => id,
                None => self.property(entity_type, name, source)?.ok_or_else(|| {
                    Error::PropertyNotFound {
                        entity_type: self
                            .model
                            .entity_type(entity_type)
                            .map(|e| e.display_name().to_string())
                            .unwrap_or_default(),
                        property: (*name).to_string(),
                    }
                })?,
            };
            properties.push(id);
        }
        Ok(properties)
    }

    /// Guarded nullability write: `required` means not nullable.
    pub fn required(
        &mut self,
        property: PropertyId,
        required: bool,
        source: ConfigurationSource,
    ) -> bool {
        self.model
            .property_mut(property)
            .is_some_and(|p| p.set_nullable(!required, source))
    }

    /// Guarded concurrency-token write.
    pub fn concurrency_token(
        &mut self,
        property: PropertyId,
        token: bool,
        source: ConfigurationSource,
    ) -> bool {
        self.model
            .property_mut(property)
            .is_some_and(|p| p.set_concurrency_token(token, source))
    }

    /// Guarded store generation write.
    pub fn store_generated_pattern(
        &mut self,
        property: PropertyId,
        pattern: StoreGeneratedPattern,
        source: ConfigurationSource,
    ) -> bool {
        self.model
            .property_mut(property)
            .is_some_and(|p| p.set_store_generated_pattern(pattern, source))
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Set the primary key of `entity_type`.
    ///
    /// Replacing an existing primary key removes the old key together with
    /// every foreign key that referenced it.
    pub fn primary_key(
        &mut self,
        entity_type: EntityTypeId,
        properties: &[PropertyId],
        source: ConfigurationSource,
    ) -> Result<Option<KeyId>> {
        let owner = self.model.require_entity_type(entity_type)?;
        let current = owner.primary_key();
        let current_source = owner.primary_key_source();
        if !source.overrides(current_source) {
            tracing::trace!(
                target: LOG_TARGET,
                entity_type = owner.name(),
                current = ?current_source,
                attempted = %source,
                "Primary key write rejected"
            );
            return Ok(None);
        }

        let key = self.model.add_key(entity_type, properties.to_vec(), source)?;
        if current == Some(key) {
            self.model.set_primary_key(entity_type, Some(key), source);
            return Ok(Some(key));
        }
        if let Some(old) = current {
            self.detach_primary_key(entity_type, old)?;
        }
        self.model.set_primary_key(entity_type, Some(key), source);
        for property in properties {
            self.required(*property, true, ConfigurationSource::Convention);
        }
        tracing::debug!(
            target: LOG_TARGET,
            entity_type = self.model.require_entity_type(entity_type)?.name(),
            properties = ?self.model.property_names(properties),
            source = %source,
            "Primary key set"
        );
        self.dispatcher().on_key_added(self, key)
    }

    /// [`InternalModelBuilder::primary_key`] by property names.
    pub fn primary_key_by_names(
        &mut self,
        entity_type: EntityTypeId,
        names: &[&str],
        source: ConfigurationSource,
    ) -> Result<Option<KeyId>> {
        let properties = self.resolve_properties(entity_type, names, source)?;
        self.primary_key(entity_type, &properties, source)
    }

    /// Add an alternate key.
    pub fn key(
        &mut self,
        entity_type: EntityTypeId,
        properties: &[PropertyId],
        source: ConfigurationSource,
    ) -> Result<Option<KeyId>> {
        if let Some(existing) = self.model.find_key(entity_type, properties) {
            self.model.add_key(entity_type, properties.to_vec(), source)?;
            return Ok(Some(existing));
        }
        let key = self.model.add_key(entity_type, properties.to_vec(), source)?;
        self.dispatcher().on_key_added(self, key)
    }

    fn detach_primary_key(&mut self, entity_type: EntityTypeId, old: KeyId) -> Result<()> {
        let referencing: Vec<_> = self
            .model
            .require_entity_type(entity_type)?
            .referencing_foreign_keys()
            .iter()
            .copied()
            .filter(|fk| {
                self.model
                    .foreign_key(*fk)
                    .is_some_and(|fk| fk.principal_key() == old)
            })
            .collect();
        for fk in referencing {
            if let Some(foreign_key) = self.model.foreign_key(fk) {
                let dependent = self.model.require_entity_type(foreign_key.dependent())?;
                let principal = self.model.require_entity_type(entity_type)?;
                tracing::debug!(
                    target: LOG_TARGET,
                    foreign_key = fk.index(),
                    dependent = dependent.name(),
                    principal = principal.name(),
                    source = %foreign_key.source(),
                    "Foreign key dropped with replaced primary key"
                );
            }
            self.detach_foreign_key(fk)?;
        }

        let old_properties = self
            .model
            .key(old)
            .map(|k| k.properties().to_vec())
            .unwrap_or_default();
        for property in old_properties {
            let conventional = self.model.property(property).is_some_and(|p| {
                p.store_generated_pattern_source() == Some(ConfigurationSource::Convention)
            });
            if conventional {
                self.store_generated_pattern(
                    property,
                    StoreGeneratedPattern::None,
                    ConfigurationSource::Convention,
                );
            }
        }

        self.model
            .set_primary_key(entity_type, None, ConfigurationSource::Convention);
        self.model.remove_key(old);
        Ok(())
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    /// Create a relationship from `dependent` to the primary key of `principal`.
    ///
    /// Existing relationships that use either navigation are replaced when
    /// `source` is at least as strong as theirs; otherwise nothing changes and
    /// `None` is returned.
    pub fn relationship(
        &mut self,
        dependent: EntityTypeId,
        principal: EntityTypeId,
        dependent_to_principal: Option<&str>,
        principal_to_dependent: Option<&str>,
        unique: bool,
        source: ConfigurationSource,
    ) -> Result<Option<ForeignKeyId>> {
        self.model.require_entity_type(dependent)?;
        let principal_type = self.model.require_entity_type(principal)?;
        let principal_key = principal_type
            .primary_key()
            .ok_or_else(|| Error::MissingPrincipalKey {
                principal: principal_type.display_name().to_string(),
            })?;

        let mut existing = Vec::new();
        if let Some(nav) = dependent_to_principal.and_then(|n| self.model.find_navigation(dependent, n))
        {
            existing.extend(self.model.navigation(nav).map(|n| n.foreign_key()));
        }
        if let Some(nav) = principal_to_dependent.and_then(|n| self.model.find_navigation(principal, n))
        {
            existing.extend(self.model.navigation(nav).map(|n| n.foreign_key()));
        }
        existing.dedup();

        if let [fk] = existing.as_slice() {
            if self.is_same_relationship(
                *fk,
                dependent,
                principal,
                dependent_to_principal,
                principal_to_dependent,
            ) {
                let fk = *fk;
                if source.overrides(self.model.foreign_key(fk).map(|f| f.source())) {
                    self.model.update_foreign_key_source(fk, source);
                    self.model.set_foreign_key_unique(fk, unique);
                }
                return Ok(Some(fk));
            }
        }
        for fk in existing {
            if !self.remove_foreign_key(fk, source)? {
                return Ok(None);
            }
        }

        let fk = self
            .model
            .add_foreign_key(dependent, principal, principal_key, unique, source)?;
        if let Some(name) = dependent_to_principal {
            self.model.add_navigation(fk, name, true)?;
        }
        if let Some(name) = principal_to_dependent {
            self.model.add_navigation(fk, name, false)?;
        }
        tracing::debug!(
            target: LOG_TARGET,
            dependent = self.model.require_entity_type(dependent)?.name(),
            principal = self.model.require_entity_type(principal)?.name(),
            dependent_to_principal,
            principal_to_dependent,
            source = %source,
            "Relationship added"
        );

        let Some(fk) = self.dispatcher().on_foreign_key_added(self, fk)? else {
            return Ok(None);
        };
        self.finalize_foreign_key(fk)?;
        Ok(Some(fk))
    }

    fn is_same_relationship(
        &self,
        fk: ForeignKeyId,
        dependent: EntityTypeId,
        principal: EntityTypeId,
        dependent_to_principal: Option<&str>,
        principal_to_dependent: Option<&str>,
    ) -> bool {
        let Some(foreign_key) = self.model.foreign_key(fk) else {
            return false;
        };
        let nav_name = |nav: Option<ormkit_core::NavigationId>| {
            nav.and_then(|n| self.model.navigation(n)).map(|n| n.name())
        };
        foreign_key.dependent() == dependent
            && foreign_key.principal() == principal
            && nav_name(foreign_key.dependent_to_principal()) == dependent_to_principal
            && nav_name(foreign_key.principal_to_dependent()) == principal_to_dependent
    }

    fn finalize_foreign_key(&mut self, fk: ForeignKeyId) -> Result<()> {
        let empty = self
            .model
            .foreign_key(fk)
            .is_some_and(|f| f.properties().is_empty());
        if empty {
            self.shadow_foreign_key_properties(fk, ConfigurationSource::Convention)?;
        }
        if self.model.foreign_key(fk).is_some() {
            self.model.validate_foreign_key(fk)?;
        }
        Ok(())
    }

    /// Guarded association of dependent properties with a foreign key.
    ///
    /// Conventional shadow properties the foreign key no longer uses are removed.
    pub fn foreign_key_properties(
        &mut self,
        fk: ForeignKeyId,
        properties: &[PropertyId],
        source: ConfigurationSource,
    ) -> Result<bool> {
        let foreign_key = self
            .model
            .foreign_key(fk)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        let dependent = foreign_key.dependent();
        let old = foreign_key.properties().to_vec();
        if properties.is_empty() {
            return Err(Error::invalid_argument(
                "properties",
                "foreign key must have at least one property",
            ));
        }
        for property in properties {
            let belongs = self
                .model
                .property(*property)
                .is_some_and(|p| p.entity_type() == dependent);
            if !belongs {
                return Err(Error::invalid_argument(
                    "properties",
                    "foreign key properties must belong to the dependent entity type",
                ));
            }
        }
        if old == properties {
            if source.overrides(foreign_key.properties_source()) {
                self.model
                    .set_foreign_key_properties(fk, properties.to_vec(), source);
            }
            return Ok(true);
        }
        if !source.overrides(foreign_key.properties_source()) {
            tracing::trace!(
                target: LOG_TARGET,
                foreign_key = fk.index(),
                attempted = %source,
                "Foreign key properties write rejected"
            );
            return Ok(false);
        }
        self.model
            .check_foreign_key_shape(fk, properties, foreign_key.principal_key())?;
        self.model
            .set_foreign_key_properties(fk, properties.to_vec(), source);
        self.remove_unused_shadow_properties(&old);
        Ok(true)
    }

    /// [`InternalModelBuilder::foreign_key_properties`] by property names.
    pub fn foreign_key_properties_by_names(
        &mut self,
        fk: ForeignKeyId,
        names: &[&str],
        source: ConfigurationSource,
    ) -> Result<bool> {
        let dependent = self
            .model
            .foreign_key(fk)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?
            .dependent();
        let properties = self.resolve_properties(dependent, names, source)?;
        self.foreign_key_properties(fk, &properties, source)
    }

    /// Create shadow properties for `fk`, one per principal key property.
    ///
    /// Names follow `{navigation}{key property}`, or `{principal}{key property}`
    /// when the dependent has no navigation; a numeric suffix resolves clashes.
    pub fn shadow_foreign_key_properties(
        &mut self,
        fk: ForeignKeyId,
        source: ConfigurationSource,
    ) -> Result<bool> {
        let foreign_key = self
            .model
            .foreign_key(fk)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        let dependent = foreign_key.dependent();
        let prefix = match foreign_key
            .dependent_to_principal()
            .and_then(|n| self.model.navigation(n))
        {
            Some(nav) => nav.name().to_string(),
            None => self.model.require_entity_type(foreign_key.principal())?.name().to_string(),
        };
        let principal_properties: Vec<(String, ValueType)> = self
            .model
            .key(foreign_key.principal_key())
            .map(|k| {
                k.properties()
                    .iter()
                    .filter_map(|p| self.model.property(*p))
                    .map(|p| (p.name().to_string(), p.value_type()))
                    .collect()
            })
            .unwrap_or_default();

        let mut properties = Vec::with_capacity(principal_properties.len());
        for (key_name, value_type) in principal_properties {
            let base = format!("{}{}", prefix, key_name);
            let mut name = base.clone();
            let mut suffix = 0;
            loop {
                match self.model.find_property(dependent, &name) {
                    None => break,
                    Some(existing)
                        if self.model.property(existing).is_some_and(|p| {
                            p.is_shadow() && p.value_type() == value_type
                        }) && !self.model.is_foreign_key_property(existing) =>
                    {
                        break;
                    }
                    Some(_) => {
                        suffix += 1;
                        name = format!("{}{}", base, suffix);
                    }
                }
            }
            let Some(property) =
                self.shadow_property(dependent, &name, value_type, true, source)?
            else {
                return Ok(false);
            };
            properties.push(property);
        }
        self.foreign_key_properties(fk, &properties, source)
    }

    /// Point `fk` at an alternate key of its principal.
    ///
    /// Foreign key properties that were not explicitly configured are
    /// rediscovered against the new key.
    pub fn principal_key(
        &mut self,
        fk: ForeignKeyId,
        properties: &[PropertyId],
        source: ConfigurationSource,
    ) -> Result<bool> {
        let foreign_key = self
            .model
            .foreign_key(fk)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        if !source.overrides(Some(foreign_key.source())) {
            return Ok(false);
        }
        let principal = foreign_key.principal();
        let dependent_properties = foreign_key.properties().to_vec();
        let keep_properties =
            !ConfigurationSource::Convention.overrides(foreign_key.properties_source());
        let existed = self.model.find_key(principal, properties).is_some();
        let Some(key) = self.key(principal, properties, source)? else {
            return Ok(false);
        };
        if keep_properties {
            if let Err(e) = self
                .model
                .check_foreign_key_shape(fk, &dependent_properties, key)
            {
                if !existed {
                    self.model.remove_key(key);
                }
                return Err(e);
            }
        }
        self.model.set_foreign_key_principal_key(fk, key);
        self.model.update_foreign_key_source(fk, source);

        let rediscover = self
            .model
            .foreign_key(fk)
            .is_some_and(|f| ConfigurationSource::Convention.overrides(f.properties_source()));
        if rediscover && self.dispatcher().on_foreign_key_added(self, fk)?.is_none() {
            return Ok(true);
        }
        self.finalize_foreign_key(fk)?;
        Ok(true)
    }

    /// [`InternalModelBuilder::principal_key`] by property names.
    pub fn principal_key_by_names(
        &mut self,
        fk: ForeignKeyId,
        names: &[&str],
        source: ConfigurationSource,
    ) -> Result<bool> {
        let principal = self
            .model
            .foreign_key(fk)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?
            .principal();
        let properties = self.resolve_properties(principal, names, source)?;
        self.principal_key(fk, &properties, source)
    }

    /// Remove `fk` unless it was configured at a stronger source.
    pub fn remove_foreign_key(
        &mut self,
        fk: ForeignKeyId,
        source: ConfigurationSource,
    ) -> Result<bool> {
        let Some(foreign_key) = self.model.foreign_key(fk) else {
            return Ok(false);
        };
        if !source.overrides(Some(foreign_key.source())) {
            tracing::trace!(
                target: LOG_TARGET,
                foreign_key = fk.index(),
                current = %foreign_key.source(),
                attempted = %source,
                "Foreign key removal rejected"
            );
            return Ok(false);
        }
        self.detach_foreign_key(fk)?;
        Ok(true)
    }

    fn detach_foreign_key(&mut self, fk: ForeignKeyId) -> Result<()> {
        let Some(removed) = self.model.remove_foreign_key(fk) else {
            return Ok(());
        };
        self.remove_unused_shadow_properties(removed.properties());
        tracing::debug!(
            target: LOG_TARGET,
            dependent = removed.dependent().index(),
            principal = removed.principal().index(),
            "Foreign key removed"
        );
        self.dispatcher()
            .on_foreign_key_removed(self, removed.dependent(), &removed)
    }

    fn remove_unused_shadow_properties(&mut self, properties: &[PropertyId]) {
        for property in properties {
            let removable = self.model.property(*property).is_some_and(|p| {
                p.is_shadow() && p.source() == ConfigurationSource::Convention
            }) && !self.model.is_foreign_key_property(*property)
                && !self.model.is_key_property(*property);
            if removable {
                self.model.remove_property(*property);
            }
        }
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    /// Guarded model annotation write.
    pub fn model_annotation(&mut self, name: &str, value: &str, source: ConfigurationSource) -> bool {
        self.model.annotations_mut().try_set(name, value, source)
    }

    /// Guarded entity type annotation write.
    pub fn entity_annotation(
        &mut self,
        entity_type: EntityTypeId,
        name: &str,
        value: &str,
        source: ConfigurationSource,
    ) -> Result<bool> {
        self.model.require_entity_type(entity_type)?;
        Ok(self
            .model
            .entity_type_mut(entity_type)
            .is_some_and(|e| e.annotations_mut().try_set(name, value, source)))
    }

    /// Guarded table (and optional schema) mapping.
    pub fn to_table(
        &mut self,
        entity_type: EntityTypeId,
        table: &str,
        schema: Option<&str>,
        source: ConfigurationSource,
    ) -> Result<bool> {
        if table.is_empty() {
            return Err(Error::invalid_argument("table", "table name must not be empty"));
        }
        self.model.require_entity_type(entity_type)?;
        Ok(self.model.entity_type_mut(entity_type).is_some_and(|e| {
            relational::set_table(e.annotations_mut(), table, schema, source)
        }))
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Check every foreign key against its principal key.
    pub fn validate(&self) -> Result<()> {
        for (_, entity_type) in self.model.entity_types() {
            for fk in entity_type.foreign_keys() {
                self.model.validate_foreign_key(*fk)?;
            }
        }
        Ok(())
    }

    /// Run the model-built conventions and hand out the finished model.
    ///
    /// Fails if any foreign key does not match its principal key.
    pub fn finish(mut self) -> Result<Model> {
        self.dispatcher().on_model_built(&mut self)?;
        self.validate()?;
        tracing::debug!(
            target: LOG_TARGET,
            entity_types = self.model.entity_type_ids().len(),
            "Model built"
        );
        Ok(self.model)
    }

    /// Hand out the model without running the model-built conventions.
    pub fn into_model(self) -> Model {
        self.model
    }
}
