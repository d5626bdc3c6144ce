//! Ordered convention lists and the builders that fill them.

use std::fmt;
use std::sync::Arc;

use crate::convention::{
    EntityTypeAddedConvention, ForeignKeyAddedConvention, ForeignKeyRemovedConvention,
    KeyAddedConvention, ModelBuiltConvention, ModelInitializedConvention, PropertyAddedConvention,
};
use crate::conventions::{
    ConcurrencyCheckAttributeConvention, DatabaseGeneratedAttributeConvention,
    ForeignKeyPropertyDiscoveryConvention, KeyAttributeConvention, KeyConvention,
    KeyDiscoveryConvention, PropertyDiscoveryConvention, RelationalTableAttributeConvention,
    RelationshipDiscoveryConvention, RequiredAttributeConvention,
    SqlServerIdentityStrategyConvention,
};

/// Conventions keyed by the event that triggers them, each list in run order.
///
/// The same convention instance may be registered for several events.
#[derive(Clone, Default)]
pub struct ConventionSet {
    /// Run once when the model is created.
    pub model_initialized: Vec<Arc<dyn ModelInitializedConvention>>,
    /// Run for each entity type added to the model.
    pub entity_type_added: Vec<Arc<dyn EntityTypeAddedConvention>>,
    /// Run for each property, including shadow properties.
    pub property_added: Vec<Arc<dyn PropertyAddedConvention>>,
    /// Run for each primary or alternate key.
    pub key_added: Vec<Arc<dyn KeyAddedConvention>>,
    /// Run for each foreign key, including ones created by discovery.
    pub foreign_key_added: Vec<Arc<dyn ForeignKeyAddedConvention>>,
    /// Run after a foreign key is detached from its dependent.
    pub foreign_key_removed: Vec<Arc<dyn ForeignKeyRemovedConvention>>,
    /// Run once from `finish`, before foreign keys are checked.
    pub model_built: Vec<Arc<dyn ModelBuiltConvention>>,
}

impl ConventionSet {
    /// An empty set: building with it runs no conventions at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of registrations across all events.
    pub fn len(&self) -> usize {
        self.model_initialized.len()
            + self.entity_type_added.len()
            + self.property_added.len()
            + self.key_added.len()
            + self.foreign_key_added.len()
            + self.foreign_key_removed.len()
            + self.model_built.len()
    }

    /// True when no convention is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ConventionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn names<'a>(list: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
            list.map(|n| n.rsplit("::").next().unwrap_or(n)).collect()
        }
        f.debug_struct("ConventionSet")
            .field("model_initialized", &names(self.model_initialized.iter().map(|c| c.name())))
            .field("entity_type_added", &names(self.entity_type_added.iter().map(|c| c.name())))
            .field("property_added", &names(self.property_added.iter().map(|c| c.name())))
            .field("key_added", &names(self.key_added.iter().map(|c| c.name())))
            .field("foreign_key_added", &names(self.foreign_key_added.iter().map(|c| c.name())))
            .field(
                "foreign_key_removed",
                &names(self.foreign_key_removed.iter().map(|c| c.name())),
            )
            .field("model_built", &names(self.model_built.iter().map(|c| c.name())))
            .finish()
    }
}

/// Something that registers conventions into a [`ConventionSet`].
///
/// Provider builders wrap the builder below them and append their own
/// conventions after it.
pub trait ConventionSetBuilder {
    /// Append this builder's conventions.
    fn add_conventions(&self, set: &mut ConventionSet);

    /// Build a fresh set.
    fn create_convention_set(&self) -> ConventionSet {
        let mut set = ConventionSet::new();
        self.add_conventions(&mut set);
        set
    }
}

/// Provider-independent conventions.
#[derive(Debug, Clone, Copy)]
pub struct CoreConventionSetBuilder {
    discover_relationships: bool,
}

impl CoreConventionSetBuilder {
    /// Builder with every core convention enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            discover_relationships: true,
        }
    }

    /// Enable or disable relationship discovery.
    pub const fn discover_relationships(mut self, enabled: bool) -> Self {
        self.discover_relationships = enabled;
        self
    }
}

impl Default for CoreConventionSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConventionSetBuilder for CoreConventionSetBuilder {
    fn add_conventions(&self, set: &mut ConventionSet) {
        let key_convention = Arc::new(KeyConvention);
        let key_attribute = Arc::new(KeyAttributeConvention);
        let relationship_discovery = Arc::new(RelationshipDiscoveryConvention);

        set.entity_type_added.push(Arc::new(PropertyDiscoveryConvention));
        set.entity_type_added.push(Arc::new(KeyDiscoveryConvention));
        if self.discover_relationships {
            set.entity_type_added.push(relationship_discovery.clone());
        }

        set.property_added.push(Arc::new(ConcurrencyCheckAttributeConvention));
        set.property_added.push(Arc::new(DatabaseGeneratedAttributeConvention));
        set.property_added.push(Arc::new(RequiredAttributeConvention));
        set.property_added.push(key_attribute.clone());

        set.key_added.push(key_convention.clone());
        if self.discover_relationships {
            set.key_added.push(relationship_discovery);
        }

        set.foreign_key_added
            .push(Arc::new(ForeignKeyPropertyDiscoveryConvention));

        set.foreign_key_removed.push(key_convention);

        set.model_built.push(key_attribute);
    }
}

/// Core conventions plus relational table mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalConventionSetBuilder {
    core: CoreConventionSetBuilder,
}

impl RelationalConventionSetBuilder {
    /// Wrap a core builder.
    #[must_use]
    pub const fn new(core: CoreConventionSetBuilder) -> Self {
        Self { core }
    }
}

impl ConventionSetBuilder for RelationalConventionSetBuilder {
    fn add_conventions(&self, set: &mut ConventionSet) {
        self.core.add_conventions(set);
        set.entity_type_added
            .push(Arc::new(RelationalTableAttributeConvention));
    }
}

/// Relational conventions plus SQL Server value generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerConventionSetBuilder {
    relational: RelationalConventionSetBuilder,
}

impl SqlServerConventionSetBuilder {
    /// Wrap a relational builder.
    #[must_use]
    pub const fn new(relational: RelationalConventionSetBuilder) -> Self {
        Self { relational }
    }
}

impl ConventionSetBuilder for SqlServerConventionSetBuilder {
    fn add_conventions(&self, set: &mut ConventionSet) {
        self.relational.add_conventions(set);
        set.model_initialized
            .push(Arc::new(SqlServerIdentityStrategyConvention));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_registration_order() {
        let set = CoreConventionSetBuilder::new().create_convention_set();
        let entity_added: Vec<_> = set.entity_type_added.iter().map(|c| c.name()).collect();
        assert_eq!(entity_added.len(), 3);
        assert!(entity_added[0].ends_with("PropertyDiscoveryConvention"));
        assert!(entity_added[1].ends_with("KeyDiscoveryConvention"));
        assert!(entity_added[2].ends_with("RelationshipDiscoveryConvention"));

        let property_added: Vec<_> = set.property_added.iter().map(|c| c.name()).collect();
        assert!(property_added[0].ends_with("ConcurrencyCheckAttributeConvention"));
        assert!(property_added[1].ends_with("DatabaseGeneratedAttributeConvention"));
        assert!(property_added[2].ends_with("RequiredAttributeConvention"));
        assert!(property_added[3].ends_with("KeyAttributeConvention"));

        assert!(set.model_initialized.is_empty());
        assert_eq!(set.foreign_key_removed.len(), 1);
        assert_eq!(set.model_built.len(), 1);
    }

    #[test]
    fn test_relationship_discovery_can_be_disabled() {
        let set = CoreConventionSetBuilder::new()
            .discover_relationships(false)
            .create_convention_set();
        assert_eq!(set.entity_type_added.len(), 2);
        assert_eq!(set.key_added.len(), 1);
    }

    #[test]
    fn test_provider_builders_extend_core() {
        let core = CoreConventionSetBuilder::new().create_convention_set();
        let relational = RelationalConventionSetBuilder::default().create_convention_set();
        let sql_server = SqlServerConventionSetBuilder::default().create_convention_set();

        assert_eq!(relational.len(), core.len() + 1);
        assert!(
            relational
                .entity_type_added
                .last()
                .is_some_and(|c| c.name().ends_with("RelationalTableAttributeConvention"))
        );
        assert_eq!(sql_server.len(), relational.len() + 1);
        assert_eq!(sql_server.model_initialized.len(), 1);
        assert!(format!("{:?}", sql_server).contains("SqlServerIdentityStrategyConvention"));
    }
}
