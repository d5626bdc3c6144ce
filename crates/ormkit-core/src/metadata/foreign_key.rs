//! Foreign keys and navigations.

use super::{EntityTypeId, ForeignKeyId, KeyId, NavigationId, PropertyId};
use crate::source::ConfigurationSource;

/// A relationship between a dependent entity type and a principal key.
///
/// The property list may be empty while the foreign key is still being
/// configured by conventions; it is filled before the relationship is
/// finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    dependent: EntityTypeId,
    properties: Vec<PropertyId>,
    properties_source: Option<ConfigurationSource>,
    principal: EntityTypeId,
    principal_key: KeyId,
    unique: bool,
    source: ConfigurationSource,
    dependent_to_principal: Option<NavigationId>,
    principal_to_dependent: Option<NavigationId>,
}

impl ForeignKey {
    pub(crate) fn new(
        dependent: EntityTypeId,
        principal: EntityTypeId,
        principal_key: KeyId,
        unique: bool,
        source: ConfigurationSource,
    ) -> Self {
        Self {
            dependent,
            properties: Vec::new(),
            properties_source: None,
            principal,
            principal_key,
            unique,
            source,
            dependent_to_principal: None,
            principal_to_dependent: None,
        }
    }

    /// Dependent (referencing) entity type.
    pub fn dependent(&self) -> EntityTypeId {
        self.dependent
    }

    /// Dependent properties, in principal key order.
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Source of the property association, `None` until associated.
    pub fn properties_source(&self) -> Option<ConfigurationSource> {
        self.properties_source
    }

    /// Principal (referenced) entity type.
    pub fn principal(&self) -> EntityTypeId {
        self.principal
    }

    /// Referenced key on the principal.
    pub fn principal_key(&self) -> KeyId {
        self.principal_key
    }

    /// Whether at most one dependent may reference a principal.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Source that created (or last re-asserted) this foreign key.
    pub fn source(&self) -> ConfigurationSource {
        self.source
    }

    /// Navigation on the dependent pointing at the principal.
    pub fn dependent_to_principal(&self) -> Option<NavigationId> {
        self.dependent_to_principal
    }

    /// Navigation on the principal pointing at the dependent(s).
    pub fn principal_to_dependent(&self) -> Option<NavigationId> {
        self.principal_to_dependent
    }

    /// Whether the foreign key uses `property`.
    pub fn contains_property(&self, property: PropertyId) -> bool {
        self.properties.contains(&property)
    }

    pub(crate) fn try_set_properties(
        &mut self,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> bool {
        if !source.overrides(self.properties_source) {
            return false;
        }
        self.properties = properties;
        self.properties_source = Some(source);
        true
    }

    pub(crate) fn set_navigation(&mut self, navigation: NavigationId, points_to_principal: bool) {
        if points_to_principal {
            self.dependent_to_principal = Some(navigation);
        } else {
            self.principal_to_dependent = Some(navigation);
        }
    }

    pub(crate) fn clear_navigation(&mut self, navigation: NavigationId) {
        if self.dependent_to_principal == Some(navigation) {
            self.dependent_to_principal = None;
        }
        if self.principal_to_dependent == Some(navigation) {
            self.principal_to_dependent = None;
        }
    }

    pub(crate) fn update_source(&mut self, source: ConfigurationSource) {
        self.source = self.source.max(source);
    }

    pub(crate) fn set_principal_key(&mut self, principal_key: KeyId) {
        self.principal_key = principal_key;
    }

    pub(crate) fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }
}

/// A navigation member backed by a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    name: String,
    declaring_entity_type: EntityTypeId,
    foreign_key: ForeignKeyId,
    points_to_principal: bool,
}

impl Navigation {
    pub(crate) fn new(
        name: String,
        declaring_entity_type: EntityTypeId,
        foreign_key: ForeignKeyId,
        points_to_principal: bool,
    ) -> Self {
        Self {
            name,
            declaring_entity_type,
            foreign_key,
            points_to_principal,
        }
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity type that declares the member.
    pub fn declaring_entity_type(&self) -> EntityTypeId {
        self.declaring_entity_type
    }

    /// Backing foreign key.
    pub fn foreign_key(&self) -> ForeignKeyId {
        self.foreign_key
    }

    /// True for dependent-to-principal navigations.
    pub fn points_to_principal(&self) -> bool {
        self.points_to_principal
    }
}
