//! Public model builder.
//!
//! Everything configured here is recorded at [`ConfigurationSource::Explicit`]
//! and therefore wins over conventions and declarative markers.

use std::sync::Arc;

use ormkit_conventions::{ConventionSet, InternalModelBuilder};
use ormkit_core::providers::sql_server;
use ormkit_core::{
    ConfigurationSource, EntityShape, EntityType, EntityTypeId, Error, ForeignKeyId, Model,
    PropertyId, Result, Sequence, StoreGeneratedPattern, ValueType,
};

use crate::LOG_TARGET;
use crate::config::ModelBuilderConfig;

const EXPLICIT: ConfigurationSource = ConfigurationSource::Explicit;

/// Builds a [`Model`] from entity shapes, conventions and explicit configuration.
///
/// # Example
///
/// ```ignore
/// let mut builder = ModelBuilder::new()?;
/// builder.entity(blog_shape())?;
/// builder.entity(post_shape())?.property("Title")?.required(true);
/// let model = builder.finish()?;
/// ```
#[derive(Debug)]
pub struct ModelBuilder {
    inner: InternalModelBuilder,
    config: ModelBuilderConfig,
}

impl ModelBuilder {
    /// A builder with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ModelBuilderConfig::default())
    }

    /// A builder running the conventions selected by `config`.
    pub fn with_config(config: ModelBuilderConfig) -> Result<Self> {
        Ok(Self {
            inner: InternalModelBuilder::new(config.convention_set())?,
            config,
        })
    }

    /// A builder running a caller-assembled convention set.
    pub fn with_conventions(conventions: ConventionSet) -> Result<Self> {
        Ok(Self {
            inner: InternalModelBuilder::new(conventions)?,
            config: ModelBuilderConfig::default(),
        })
    }

    pub fn config(&self) -> &ModelBuilderConfig {
        &self.config
    }

    /// The model built so far.
    pub fn model(&self) -> &Model {
        self.inner.model()
    }

    /// The convention-aware builder underneath, for source-specific writes.
    pub fn internal(&mut self) -> &mut InternalModelBuilder {
        &mut self.inner
    }

    /// Add or configure the entity type backed by `shape`.
    pub fn entity(&mut self, shape: impl Into<Arc<EntityShape>>) -> Result<EntityTypeBuilder<'_>> {
        let shape = shape.into();
        let name = shape.name().to_string();
        let id = self
            .inner
            .entity(shape, EXPLICIT)?
            .ok_or(Error::EntityTypeNotFound(name))?;
        Ok(EntityTypeBuilder::new(&mut self.inner, id))
    }

    /// Add or configure an entity type by name.
    ///
    /// An entity type created this way has no members; its properties are
    /// all shadow properties.
    pub fn entity_named(&mut self, name: &str) -> Result<EntityTypeBuilder<'_>> {
        let id = self
            .inner
            .entity_by_name(name, EXPLICIT)?
            .ok_or_else(|| Error::EntityTypeNotFound(name.to_string()))?;
        Ok(EntityTypeBuilder::new(&mut self.inner, id))
    }

    /// Exclude an entity type from the model.
    pub fn ignore(&mut self, name: &str) -> Result<&mut Self> {
        self.inner.ignore(name, EXPLICIT)?;
        Ok(self)
    }

    /// Set a model annotation.
    pub fn annotation(&mut self, name: &str, value: &str) -> &mut Self {
        self.inner.model_annotation(name, value, EXPLICIT);
        self
    }

    /// Generate key values on SQL Server from a hi-lo sequence.
    ///
    /// The sequence is named `DefaultSequence` unless `name` is given.
    pub fn use_sql_server_sequence_hi_lo(
        &mut self,
        name: Option<&str>,
        schema: Option<&str>,
    ) -> Result<&mut Self> {
        if name.is_some_and(str::is_empty) {
            return Err(Error::invalid_argument("name", "sequence name must not be empty"));
        }
        let mut sequence = Sequence::new(name.unwrap_or(Sequence::DEFAULT_NAME));
        if let Some(schema) = schema {
            sequence = sequence.schema(schema);
        }
        let applied = sql_server::use_sequence_hi_lo(
            self.inner.model_mut().annotations_mut(),
            &sequence,
            EXPLICIT,
        )?;
        tracing::debug!(
            target: LOG_TARGET,
            sequence = %sequence.name,
            applied,
            "SQL Server hi-lo value generation configured"
        );
        Ok(self)
    }

    /// Run the model-built conventions, check every foreign key and return
    /// the finished model.
    pub fn finish(self) -> Result<Model> {
        self.inner.finish()
    }
}

/// Configures one entity type.
#[derive(Debug)]
pub struct EntityTypeBuilder<'a> {
    builder: &'a mut InternalModelBuilder,
    id: EntityTypeId,
}

impl<'a> EntityTypeBuilder<'a> {
    fn new(builder: &'a mut InternalModelBuilder, id: EntityTypeId) -> Self {
        Self { builder, id }
    }

    pub fn id(&self) -> EntityTypeId {
        self.id
    }

    /// The entity type as configured so far.
    pub fn metadata(&self) -> Result<&EntityType> {
        self.builder.model().require_entity_type(self.id)
    }

    /// Configure the property backed by member `name`.
    pub fn property(&mut self, name: &str) -> Result<PropertyBuilder<'_>> {
        let id = self
            .builder
            .property(self.id, name, EXPLICIT)?
            .ok_or_else(|| self.property_not_found(name))?;
        Ok(PropertyBuilder {
            builder: self.builder,
            id,
        })
    }

    /// Configure a property with no backing member.
    pub fn shadow_property(
        &mut self,
        name: &str,
        value_type: ValueType,
    ) -> Result<PropertyBuilder<'_>> {
        let id = self
            .builder
            .shadow_property(self.id, name, value_type, true, EXPLICIT)?
            .ok_or_else(|| self.property_not_found(name))?;
        Ok(PropertyBuilder {
            builder: self.builder,
            id,
        })
    }

    fn property_not_found(&self, name: &str) -> Error {
        Error::PropertyNotFound {
            entity_type: self
                .metadata()
                .map(|e| e.display_name().to_string())
                .unwrap_or_default(),
            property: name.to_string(),
        }
    }

    /// Set the primary key; property order is kept.
    pub fn key(&mut self, properties: &[&str]) -> Result<&mut Self> {
        self.builder
            .primary_key_by_names(self.id, properties, EXPLICIT)?;
        Ok(self)
    }

    /// Add an alternate key.
    pub fn alternate_key(&mut self, properties: &[&str]) -> Result<&mut Self> {
        let ids = self.builder.resolve_properties(self.id, properties, EXPLICIT)?;
        self.builder.key(self.id, &ids, EXPLICIT)?;
        Ok(self)
    }

    /// Map to `table`, optionally in `schema`.
    pub fn to_table(&mut self, table: &str, schema: Option<&str>) -> Result<&mut Self> {
        self.builder.to_table(self.id, table, schema, EXPLICIT)?;
        Ok(self)
    }

    /// Set an entity type annotation.
    pub fn annotation(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.builder.entity_annotation(self.id, name, value, EXPLICIT)?;
        Ok(self)
    }

    fn navigation_target(&self, navigation: &str, collection: bool) -> Result<EntityTypeId> {
        let owner = self.metadata()?;
        let member = owner
            .shape()
            .and_then(|s| s.find_member(navigation))
            .filter(|m| m.navigation_target().is_some() && m.is_collection() == collection)
            .ok_or_else(|| {
                Error::invalid_argument(
                    "navigation",
                    format!(
                        "'{}' is not a {} navigation of '{}'",
                        navigation,
                        if collection { "collection" } else { "reference" },
                        owner.display_name()
                    ),
                )
            })?;
        let target = member.navigation_target().unwrap_or_default();
        self.builder
            .model()
            .entity_type_id(target)
            .ok_or_else(|| Error::EntityTypeNotFound(target.to_string()))
    }

    /// Start configuring a relationship through reference navigation `navigation`.
    pub fn reference(&mut self, navigation: &str) -> Result<ReferenceNavigationBuilder<'_>> {
        let target = self.navigation_target(navigation, false)?;
        Ok(ReferenceNavigationBuilder {
            builder: self.builder,
            owner: self.id,
            navigation: navigation.to_string(),
            target,
        })
    }

    /// Start configuring a relationship through collection navigation `navigation`.
    pub fn collection(&mut self, navigation: &str) -> Result<CollectionNavigationBuilder<'_>> {
        let target = self.navigation_target(navigation, true)?;
        Ok(CollectionNavigationBuilder {
            builder: self.builder,
            owner: self.id,
            navigation: navigation.to_string(),
            target,
        })
    }
}

/// Configures one property.
#[derive(Debug)]
pub struct PropertyBuilder<'a> {
    builder: &'a mut InternalModelBuilder,
    id: PropertyId,
}

impl PropertyBuilder<'_> {
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// Whether a value is required.
    pub fn required(self, required: bool) -> Self {
        self.builder.required(self.id, required, EXPLICIT);
        self
    }

    /// Whether the property takes part in optimistic concurrency checks.
    pub fn concurrency_token(self, token: bool) -> Self {
        self.builder.concurrency_token(self.id, token, EXPLICIT);
        self
    }

    /// How the store generates values for the property.
    pub fn store_generated_pattern(self, pattern: StoreGeneratedPattern) -> Self {
        self.builder.store_generated_pattern(self.id, pattern, EXPLICIT);
        self
    }
}

fn check_inverse(
    builder: &InternalModelBuilder,
    target: EntityTypeId,
    inverse: Option<&str>,
    collection: bool,
) -> Result<()> {
    let (Some(inverse), Some(shape)) = (
        inverse,
        builder.model().entity_type(target).and_then(EntityType::shape),
    ) else {
        return Ok(());
    };
    let valid = shape
        .find_member(inverse)
        .is_some_and(|m| m.navigation_target().is_some() && m.is_collection() == collection);
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(
            "inverse_navigation",
            format!(
                "'{}' is not a {} navigation of '{}'",
                inverse,
                if collection { "collection" } else { "reference" },
                shape.name()
            ),
        ))
    }
}

fn rejected() -> Error {
    Error::invalid_argument("relationship", "the relationship was rejected by a convention")
}

/// A reference navigation whose inverse is not chosen yet.
#[derive(Debug)]
pub struct ReferenceNavigationBuilder<'a> {
    builder: &'a mut InternalModelBuilder,
    owner: EntityTypeId,
    navigation: String,
    target: EntityTypeId,
}

impl<'a> ReferenceNavigationBuilder<'a> {
    /// Many-to-one: the navigation owner is the dependent.
    pub fn inverse_collection(self, inverse: Option<&str>) -> Result<ReferenceCollectionBuilder<'a>> {
        check_inverse(self.builder, self.target, inverse, true)?;
        let fk = self
            .builder
            .relationship(
                self.owner,
                self.target,
                Some(self.navigation.as_str()),
                inverse,
                false,
                EXPLICIT,
            )?
            .ok_or_else(rejected)?;
        Ok(ReferenceCollectionBuilder {
            builder: self.builder,
            fk,
        })
    }

    /// One-to-one: the navigation owner is the dependent until
    /// [`ReferenceReferenceBuilder::foreign_key`] or
    /// [`ReferenceReferenceBuilder::principal_key`] says otherwise.
    pub fn inverse_reference(self, inverse: Option<&str>) -> Result<ReferenceReferenceBuilder<'a>> {
        check_inverse(self.builder, self.target, inverse, false)?;
        let fk = self
            .builder
            .relationship(
                self.owner,
                self.target,
                Some(self.navigation.as_str()),
                inverse,
                true,
                EXPLICIT,
            )?
            .ok_or_else(rejected)?;
        Ok(ReferenceReferenceBuilder {
            builder: self.builder,
            fk,
        })
    }
}

/// A collection navigation whose inverse is not chosen yet.
#[derive(Debug)]
pub struct CollectionNavigationBuilder<'a> {
    builder: &'a mut InternalModelBuilder,
    owner: EntityTypeId,
    navigation: String,
    target: EntityTypeId,
}

impl<'a> CollectionNavigationBuilder<'a> {
    /// One-to-many: the navigation owner is the principal.
    pub fn inverse_reference(self, inverse: Option<&str>) -> Result<ReferenceCollectionBuilder<'a>> {
        check_inverse(self.builder, self.target, inverse, false)?;
        let fk = self
            .builder
            .relationship(
                self.target,
                self.owner,
                inverse,
                Some(self.navigation.as_str()),
                false,
                EXPLICIT,
            )?
            .ok_or_else(rejected)?;
        Ok(ReferenceCollectionBuilder {
            builder: self.builder,
            fk,
        })
    }
}

/// A one-to-many relationship.
#[derive(Debug)]
pub struct ReferenceCollectionBuilder<'a> {
    builder: &'a mut InternalModelBuilder,
    fk: ForeignKeyId,
}

impl ReferenceCollectionBuilder<'_> {
    pub fn id(&self) -> ForeignKeyId {
        self.fk
    }

    /// Use these dependent properties, in principal key order.
    pub fn foreign_key(self, properties: &[&str]) -> Result<Self> {
        self.builder
            .foreign_key_properties_by_names(self.fk, properties, EXPLICIT)?;
        Ok(self)
    }

    /// Reference this key of the principal instead of its primary key.
    pub fn principal_key(self, properties: &[&str]) -> Result<Self> {
        self.builder
            .principal_key_by_names(self.fk, properties, EXPLICIT)?;
        Ok(self)
    }
}

/// A one-to-one relationship.
#[derive(Debug)]
pub struct ReferenceReferenceBuilder<'a> {
    builder: &'a mut InternalModelBuilder,
    fk: ForeignKeyId,
}

impl ReferenceReferenceBuilder<'_> {
    pub fn id(&self) -> ForeignKeyId {
        self.fk
    }

    /// Make `dependent` the dependent side and use `properties` as its
    /// foreign key.
    pub fn foreign_key(mut self, dependent: &str, properties: &[&str]) -> Result<Self> {
        let dependent = self.side(dependent)?;
        let current = self.foreign_key_ends()?.0;
        if dependent != current {
            self.invert()?;
        }
        self.builder
            .foreign_key_properties_by_names(self.fk, properties, EXPLICIT)?;
        Ok(self)
    }

    /// Make `principal` the principal side and reference `properties` on it.
    pub fn principal_key(mut self, principal: &str, properties: &[&str]) -> Result<Self> {
        let principal = self.side(principal)?;
        let current = self.foreign_key_ends()?.1;
        if principal != current {
            self.invert()?;
        }
        self.builder
            .principal_key_by_names(self.fk, properties, EXPLICIT)?;
        Ok(self)
    }

    fn foreign_key_ends(&self) -> Result<(EntityTypeId, EntityTypeId)> {
        let fk = self
            .builder
            .model()
            .foreign_key(self.fk)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        Ok((fk.dependent(), fk.principal()))
    }

    fn side(&self, name: &str) -> Result<EntityTypeId> {
        let (dependent, principal) = self.foreign_key_ends()?;
        let id = self
            .builder
            .model()
            .entity_type_id(name)
            .ok_or_else(|| Error::EntityTypeNotFound(name.to_string()))?;
        if id == dependent || id == principal {
            Ok(id)
        } else {
            Err(Error::invalid_argument(
                "entity_type",
                format!("'{}' is not part of this relationship", name),
            ))
        }
    }

    fn invert(&mut self) -> Result<()> {
        let model = self.builder.model();
        let fk = model
            .foreign_key(self.fk)
            .ok_or_else(|| Error::invalid_argument("foreign_key", "unknown foreign key"))?;
        let (dependent, principal) = (fk.dependent(), fk.principal());
        let nav_name = |nav: Option<ormkit_core::NavigationId>| {
            nav.and_then(|n| model.navigation(n))
                .map(|n| n.name().to_string())
        };
        let to_principal = nav_name(fk.dependent_to_principal());
        let to_dependent = nav_name(fk.principal_to_dependent());

        if !self.builder.remove_foreign_key(self.fk, EXPLICIT)? {
            return Err(rejected());
        }
        self.fk = self
            .builder
            .relationship(
                principal,
                dependent,
                to_dependent.as_deref(),
                to_principal.as_deref(),
                true,
                EXPLICIT,
            )?
            .ok_or_else(rejected)?;
        tracing::debug!(target: LOG_TARGET, "One-to-one relationship inverted");
        Ok(())
    }
}
