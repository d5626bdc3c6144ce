use ormkit_core::{ConfigurationSource, ForeignKeyId, Model, PropertyId, Result};

use crate::LOG_TARGET;
use crate::builder::InternalModelBuilder;
use crate::convention::ForeignKeyAddedConvention;
use crate::naming;

/// Finds dependent properties for a new foreign key by name.
///
/// For each principal key property `P`, candidates are tried in this order
/// (case-insensitive):
///
/// 1. `{navigation}{P}` using the dependent-to-principal navigation
/// 2. `{principal}{P}`
/// 3. `P` itself, when `P` already starts with the principal name
///
/// A candidate set is accepted only if every property exists, is not used by
/// another foreign key of the dependent, and has a type compatible with the
/// principal key. Without a match, shadow properties are created.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignKeyPropertyDiscoveryConvention;

impl ForeignKeyPropertyDiscoveryConvention {
    /// The dependent properties discovery would choose for `fk`.
    pub fn find_candidate(model: &Model, fk: ForeignKeyId) -> Option<Vec<PropertyId>> {
        let foreign_key = model.foreign_key(fk)?;
        let principal = model.entity_type(foreign_key.principal())?;
        let principal_key: Vec<_> = model
            .key(foreign_key.principal_key())?
            .properties()
            .iter()
            .filter_map(|p| model.property(*p))
            .collect();
        let navigation = foreign_key
            .dependent_to_principal()
            .and_then(|n| model.navigation(n))
            .map(|n| n.name());

        let mut families: Vec<Vec<String>> = Vec::new();
        if let Some(navigation) = navigation {
            families.push(
                principal_key
                    .iter()
                    .map(|p| format!("{}{}", navigation, p.name()))
                    .collect(),
            );
        }
        families.push(
            principal_key
                .iter()
                .map(|p| format!("{}{}", principal.name(), p.name()))
                .collect(),
        );
        if principal_key
            .iter()
            .all(|p| naming::starts_with_ignore_case(p.name(), principal.name()))
        {
            families.push(principal_key.iter().map(|p| p.name().to_string()).collect());
        }

        families
            .iter()
            .find_map(|names| Self::match_names(model, fk, names))
    }

    fn match_names(model: &Model, fk: ForeignKeyId, names: &[String]) -> Option<Vec<PropertyId>> {
        let foreign_key = model.foreign_key(fk)?;
        let dependent = model.entity_type(foreign_key.dependent())?;
        let principal_key = model.key(foreign_key.principal_key())?;

        let mut matched = Vec::with_capacity(names.len());
        for (name, principal_property) in names.iter().zip(principal_key.properties()) {
            let principal_type = model.property(*principal_property)?.value_type();
            let find = |exact: bool| {
                dependent.properties().iter().copied().find(|p| {
                    model.property(*p).is_some_and(|prop| {
                        if exact {
                            prop.name() == name
                        } else {
                            prop.name().eq_ignore_ascii_case(name)
                        }
                    })
                })
            };
            let candidate = find(true).or_else(|| find(false))?;
            let property = model.property(candidate)?;
            let used_elsewhere = dependent
                .foreign_keys()
                .iter()
                .filter(|other| **other != fk)
                .filter_map(|other| model.foreign_key(*other))
                .any(|other| other.contains_property(candidate));
            if used_elsewhere || !property.value_type().is_compatible_with(principal_type) {
                return None;
            }
            matched.push(candidate);
        }

        let is_dependent_primary_key = dependent
            .primary_key()
            .and_then(|k| model.key(k))
            .is_some_and(|k| k.properties() == matched.as_slice());
        if is_dependent_primary_key && !foreign_key.is_unique() {
            return None;
        }
        Some(matched)
    }
}

impl ForeignKeyAddedConvention for ForeignKeyPropertyDiscoveryConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        fk: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>> {
        let model = builder.model();
        let Some(foreign_key) = model.foreign_key(fk) else {
            return Ok(None);
        };
        if !ConfigurationSource::Convention.overrides(foreign_key.properties_source()) {
            return Ok(Some(fk));
        }
        let current = foreign_key.properties().to_vec();

        match Self::find_candidate(model, fk) {
            Some(properties) if properties == current => {}
            Some(properties) => {
                tracing::trace!(
                    target: LOG_TARGET,
                    properties = ?model.property_names(&properties),
                    "Foreign key properties discovered"
                );
                builder.foreign_key_properties(fk, &properties, ConfigurationSource::Convention)?;
            }
            None if !current.is_empty() && model.validate_foreign_key(fk).is_ok() => {}
            None => {
                builder.shadow_foreign_key_properties(fk, ConfigurationSource::Convention)?;
            }
        }
        Ok(builder.model().foreign_key(fk).map(|_| fk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention_set::ConventionSet;
    use crate::conventions::{KeyDiscoveryConvention, PropertyDiscoveryConvention};
    use ormkit_core::{EntityShape, EntityTypeId, MemberInfo, ValueType};
    use std::sync::Arc;

    fn builder() -> InternalModelBuilder {
        let mut set = ConventionSet::new();
        set.entity_type_added.push(Arc::new(PropertyDiscoveryConvention));
        set.entity_type_added.push(Arc::new(KeyDiscoveryConvention));
        set.foreign_key_added
            .push(Arc::new(ForeignKeyPropertyDiscoveryConvention));
        InternalModelBuilder::new(set).unwrap()
    }

    fn blog(b: &mut InternalModelBuilder) -> EntityTypeId {
        b.entity(
            EntityShape::new("Blog").member(MemberInfo::scalar("Id", ValueType::Int)),
            ConfigurationSource::Explicit,
        )
        .unwrap()
        .unwrap()
    }

    fn fk_names(b: &InternalModelBuilder, fk: ForeignKeyId) -> Vec<String> {
        let model = b.model();
        model
            .property_names(model.foreign_key(fk).unwrap().properties())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_navigation_prefixed_name_wins() {
        let mut b = builder();
        let blog = blog(&mut b);
        let post = b
            .entity(
                EntityShape::new("Post")
                    .member(MemberInfo::scalar("Id", ValueType::Int))
                    .member(MemberInfo::optional("BlogId", ValueType::Int))
                    .member(MemberInfo::optional("OwnerId", ValueType::Int)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        let fk = b
            .relationship(post, blog, Some("Owner"), None, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        assert_eq!(fk_names(&b, fk), vec!["OwnerId"]);
        assert_eq!(
            b.model().foreign_key(fk).unwrap().properties_source(),
            Some(ConfigurationSource::Convention)
        );
    }

    #[test]
    fn test_principal_prefixed_name_case_insensitive() {
        let mut b = builder();
        let blog = blog(&mut b);
        let post = b
            .entity(
                EntityShape::new("Post")
                    .member(MemberInfo::scalar("Id", ValueType::Int))
                    .member(MemberInfo::optional("blogID", ValueType::Int)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        let fk = b
            .relationship(post, blog, None, Some("Posts"), false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        assert_eq!(fk_names(&b, fk), vec!["blogID"]);
    }

    #[test]
    fn test_incompatible_type_falls_back_to_shadow() {
        let mut b = builder();
        let blog = blog(&mut b);
        let post = b
            .entity(
                EntityShape::new("Post")
                    .member(MemberInfo::scalar("Id", ValueType::Int))
                    .member(MemberInfo::scalar("BlogId", ValueType::Text)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        let fk = b
            .relationship(post, blog, Some("Blog"), None, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();

        let model = b.model();
        let properties = model.foreign_key(fk).unwrap().properties();
        let shadow = model.property(properties[0]).unwrap();
        assert!(shadow.is_shadow());
        assert_eq!(shadow.name(), "BlogId1");
        assert_eq!(shadow.value_type(), ValueType::Int);
        assert!(shadow.is_nullable());
    }

    #[test]
    fn test_property_used_by_other_foreign_key_is_skipped() {
        let mut b = builder();
        let blog = blog(&mut b);
        let post = b
            .entity(
                EntityShape::new("Post")
                    .member(MemberInfo::scalar("Id", ValueType::Int))
                    .member(MemberInfo::optional("BlogId", ValueType::Int)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        let first = b
            .relationship(post, blog, Some("Blog"), None, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let second = b
            .relationship(post, blog, Some("Archive"), None, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        assert_eq!(fk_names(&b, first), vec!["BlogId"]);
        assert_eq!(fk_names(&b, second), vec!["ArchiveId"]);
        assert!(b.model().property(b.model().foreign_key(second).unwrap().properties()[0]).unwrap().is_shadow());
    }

    #[test]
    fn test_removing_foreign_key_drops_conventional_shadow_property() {
        let mut b = builder();
        let blog = blog(&mut b);
        let post = b
            .entity(
                EntityShape::new("Post").member(MemberInfo::scalar("Id", ValueType::Int)),
                ConfigurationSource::Explicit,
            )
            .unwrap()
            .unwrap();
        let fk = b
            .relationship(post, blog, Some("Blog"), None, false, ConfigurationSource::Convention)
            .unwrap()
            .unwrap();
        assert!(b.model().find_property(post, "BlogId").is_some());

        assert!(b.remove_foreign_key(fk, ConfigurationSource::Explicit).unwrap());
        assert!(b.model().find_property(post, "BlogId").is_none());
    }
}
