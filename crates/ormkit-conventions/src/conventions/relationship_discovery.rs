use ormkit_core::{ConfigurationSource, EntityType, EntityTypeId, KeyId, Result};

use crate::LOG_TARGET;
use crate::builder::InternalModelBuilder;
use crate::convention::{EntityTypeAddedConvention, KeyAddedConvention};

/// Pairs navigation members into relationships.
///
/// For two entity types, the navigations each declares towards the other
/// decide the shape:
///
/// | this side  | other side | dependent  |
/// |------------|------------|------------|
/// | reference  | none       | this       |
/// | reference  | collection | this       |
/// | collection | none       | other      |
/// | reference  | reference  | ambiguous  |
/// | collection | collection | unsupported|
///
/// More than one navigation in the same direction is ambiguous. Ambiguous
/// pairs are left for explicit configuration. A pair whose principal has no
/// primary key yet is retried when that key is added.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipDiscoveryConvention;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Navigation {
    name: String,
    collection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    dependent: EntityTypeId,
    principal: EntityTypeId,
    to_principal: Option<String>,
    to_dependent: Option<String>,
}

impl RelationshipDiscoveryConvention {
    fn navigations_to(entity_type: &EntityType, target: &str) -> Vec<Navigation> {
        entity_type
            .shape()
            .map(|shape| {
                shape
                    .navigation_members()
                    .filter(|m| m.navigation_target() == Some(target))
                    .map(|m| Navigation {
                        name: m.name.clone(),
                        collection: m.is_collection(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entity types related to `entity_type` through navigations on either side.
    fn partners(builder: &InternalModelBuilder, entity_type: EntityTypeId) -> Vec<EntityTypeId> {
        let model = builder.model();
        let Some(owner) = model.entity_type(entity_type) else {
            return Vec::new();
        };
        let mut partners = Vec::new();
        if let Some(shape) = owner.shape() {
            for member in shape.navigation_members() {
                let target = member
                    .navigation_target()
                    .and_then(|t| model.entity_type_id(t));
                if let Some(target) = target {
                    if !partners.contains(&target) {
                        partners.push(target);
                    }
                }
            }
        }
        for (id, other) in model.entity_types() {
            if id == entity_type || partners.contains(&id) {
                continue;
            }
            if !Self::navigations_to(other, owner.name()).is_empty() {
                partners.push(id);
            }
        }
        partners
    }

    fn single(owner: EntityTypeId, other: EntityTypeId, navigation: &Navigation) -> Candidate {
        if navigation.collection {
            Candidate {
                dependent: other,
                principal: owner,
                to_principal: None,
                to_dependent: Some(navigation.name.clone()),
            }
        } else {
            Candidate {
                dependent: owner,
                principal: other,
                to_principal: Some(navigation.name.clone()),
                to_dependent: None,
            }
        }
    }

    fn candidate(
        builder: &InternalModelBuilder,
        this: EntityTypeId,
        other: EntityTypeId,
    ) -> Option<Candidate> {
        let model = builder.model();
        let this_type = model.entity_type(this)?;
        let other_type = model.entity_type(other)?;

        let forward = Self::navigations_to(this_type, other_type.name());
        if this == other {
            return match forward.as_slice() {
                [] => None,
                [only] => Some(Self::single(this, this, only)),
                [a, b] if a.collection != b.collection => {
                    let (reference, collection) = if a.collection { (b, a) } else { (a, b) };
                    Some(Candidate {
                        dependent: this,
                        principal: this,
                        to_principal: Some(reference.name.clone()),
                        to_dependent: Some(collection.name.clone()),
                    })
                }
                _ => {
                    Self::defer(this_type.name(), other_type.name(), "ambiguous self reference");
                    None
                }
            };
        }

        let backward = Self::navigations_to(other_type, this_type.name());
        match (forward.as_slice(), backward.as_slice()) {
            ([], []) => None,
            ([a], []) => Some(Self::single(this, other, a)),
            ([], [b]) => Some(Self::single(other, this, b)),
            ([a], [b]) => match (a.collection, b.collection) {
                (false, true) => Some(Candidate {
                    dependent: this,
                    principal: other,
                    to_principal: Some(a.name.clone()),
                    to_dependent: Some(b.name.clone()),
                }),
                (true, false) => Some(Candidate {
                    dependent: other,
                    principal: this,
                    to_principal: Some(b.name.clone()),
                    to_dependent: Some(a.name.clone()),
                }),
                (false, false) => {
                    Self::defer(this_type.name(), other_type.name(), "one-to-one needs a principal");
                    None
                }
                (true, true) => {
                    Self::defer(this_type.name(), other_type.name(), "many-to-many is not supported");
                    None
                }
            },
            _ => {
                Self::defer(this_type.name(), other_type.name(), "several navigations");
                None
            }
        }
    }

    fn defer(this: &str, other: &str, reason: &str) {
        tracing::debug!(
            target: LOG_TARGET,
            entity_type = this,
            related = other,
            reason,
            "Relationship discovery deferred"
        );
    }

    fn create(builder: &mut InternalModelBuilder, candidate: Candidate) -> Result<()> {
        let model = builder.model();
        if model.primary_key(candidate.principal).is_none() {
            tracing::trace!(
                target: LOG_TARGET,
                principal = candidate.principal.index(),
                "Principal has no key yet"
            );
            return Ok(());
        }
        builder.relationship(
            candidate.dependent,
            candidate.principal,
            candidate.to_principal.as_deref(),
            candidate.to_dependent.as_deref(),
            false,
            ConfigurationSource::Convention,
        )?;
        Ok(())
    }

    /// Discover every relationship `entity_type` takes part in.
    pub fn discover(builder: &mut InternalModelBuilder, entity_type: EntityTypeId) -> Result<()> {
        for partner in Self::partners(builder, entity_type) {
            if builder.model().entity_type(entity_type).is_none() {
                break;
            }
            if let Some(candidate) = Self::candidate(builder, entity_type, partner) {
                Self::create(builder, candidate)?;
            }
        }
        Ok(())
    }

    /// Discover relationships in which `entity_type` is the principal of
    /// another entity type.
    pub fn discover_as_principal(
        builder: &mut InternalModelBuilder,
        entity_type: EntityTypeId,
    ) -> Result<()> {
        for partner in Self::partners(builder, entity_type) {
            if partner == entity_type {
                continue;
            }
            let candidate = Self::candidate(builder, entity_type, partner)
                .filter(|c| c.principal == entity_type);
            if let Some(candidate) = candidate {
                Self::create(builder, candidate)?;
            }
        }
        Ok(())
    }
}

impl EntityTypeAddedConvention for RelationshipDiscoveryConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        entity_type: EntityTypeId,
    ) -> Result<Option<EntityTypeId>> {
        Self::discover(builder, entity_type)?;
        Ok(Some(entity_type))
    }
}

impl KeyAddedConvention for RelationshipDiscoveryConvention {
    fn apply(&self, builder: &mut InternalModelBuilder, key: KeyId) -> Result<Option<KeyId>> {
        let Some(k) = builder.model().key(key) else {
            return Ok(None);
        };
        let entity_type = k.entity_type();
        if builder.model().entity_type(entity_type).and_then(|e| e.primary_key()) == Some(key) {
            Self::discover_as_principal(builder, entity_type)?;
        }
        Ok(builder.model().key(key).map(|_| key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention_set::{ConventionSetBuilder, CoreConventionSetBuilder};
    use ormkit_core::{EntityShape, MemberInfo, Model, ValueType};

    fn blog() -> EntityShape {
        EntityShape::new("Blog")
            .member(MemberInfo::scalar("Id", ValueType::Int))
            .member(MemberInfo::collection("Posts", "Post"))
    }

    fn post() -> EntityShape {
        EntityShape::new("Post")
            .member(MemberInfo::scalar("Id", ValueType::Int))
            .member(MemberInfo::optional("BlogId", ValueType::Int))
            .member(MemberInfo::reference("Blog", "Blog"))
    }

    fn build(shapes: Vec<EntityShape>) -> Model {
        let mut builder =
            InternalModelBuilder::new(CoreConventionSetBuilder::new().create_convention_set())
                .unwrap();
        for shape in shapes {
            builder.entity(shape, ConfigurationSource::Explicit).unwrap();
        }
        builder.finish().unwrap()
    }

    fn single_foreign_key(model: &Model, dependent: &str) -> ormkit_core::ForeignKey {
        let id = model.entity_type_id(dependent).unwrap();
        let fks = model.entity_type(id).unwrap().foreign_keys();
        assert_eq!(fks.len(), 1);
        model.foreign_key(fks[0]).unwrap().clone()
    }

    #[test]
    fn test_reference_and_collection_pair() {
        for order in [vec![blog(), post()], vec![post(), blog()]] {
            let model = build(order);
            let fk = single_foreign_key(&model, "Post");
            assert_eq!(model.entity_type(fk.principal()).unwrap().name(), "Blog");
            assert_eq!(model.property_names(fk.properties()), vec!["BlogId"]);
            assert_eq!(
                model.navigation(fk.dependent_to_principal().unwrap()).unwrap().name(),
                "Blog"
            );
            assert_eq!(
                model.navigation(fk.principal_to_dependent().unwrap()).unwrap().name(),
                "Posts"
            );
            assert_eq!(fk.source(), ConfigurationSource::Convention);
        }
    }

    #[test]
    fn test_collection_only_makes_target_dependent() {
        let model = build(vec![
            blog(),
            EntityShape::new("Post").member(MemberInfo::scalar("Id", ValueType::Int)),
        ]);
        let fk = single_foreign_key(&model, "Post");
        assert!(fk.dependent_to_principal().is_none());
        let shadow = model.property(fk.properties()[0]).unwrap();
        assert!(shadow.is_shadow());
        assert_eq!(shadow.name(), "BlogId");
    }

    #[test]
    fn test_reference_pair_is_deferred() {
        let model = build(vec![
            EntityShape::new("Person")
                .member(MemberInfo::scalar("Id", ValueType::Int))
                .member(MemberInfo::reference("Passport", "Passport")),
            EntityShape::new("Passport")
                .member(MemberInfo::scalar("Id", ValueType::Int))
                .member(MemberInfo::reference("Holder", "Person")),
        ]);
        for (_, entity_type) in model.entity_types() {
            assert!(entity_type.foreign_keys().is_empty());
        }
    }

    #[test]
    fn test_self_reference() {
        let model = build(vec![
            EntityShape::new("Employee")
                .member(MemberInfo::scalar("Id", ValueType::Int))
                .member(MemberInfo::optional("ManagerId", ValueType::Int))
                .member(MemberInfo::reference("Manager", "Employee"))
                .member(MemberInfo::collection("Reports", "Employee")),
        ]);
        let fk = single_foreign_key(&model, "Employee");
        assert_eq!(fk.dependent(), fk.principal());
        assert_eq!(model.property_names(fk.properties()), vec!["ManagerId"]);
    }

    #[test]
    fn test_replacing_principal_key_rediscovers_relationship() {
        let mut builder =
            InternalModelBuilder::new(CoreConventionSetBuilder::new().create_convention_set())
                .unwrap();
        let blog_id = builder
            .entity(
                blog().member(MemberInfo::scalar("Code", ValueType::Text)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        let post_id = builder.entity(post(), ConfigurationSource::Explicit).unwrap().unwrap();
        assert_eq!(builder.model().entity_type(post_id).unwrap().foreign_keys().len(), 1);

        builder
            .primary_key_by_names(blog_id, &["Code"], ConfigurationSource::Explicit)
            .unwrap();

        let model = builder.finish().unwrap();
        let fk = single_foreign_key(&model, "Post");
        let principal_key = model.key(fk.principal_key()).unwrap();
        assert_eq!(model.property_names(principal_key.properties()), vec!["Code"]);
        let fk_property = model.property(fk.properties()[0]).unwrap();
        assert_eq!(fk_property.name(), "BlogCode");
        assert_eq!(fk_property.value_type(), ValueType::Text);
        assert!(model.find_property(post_id, "BlogId").is_some());
    }
}
