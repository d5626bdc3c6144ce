use ormkit_core::{
    ConfigurationSource, EntityTypeId, ForeignKey, KeyId, Result, StoreGeneratedPattern,
};

use super::KeyDiscoveryConvention;
use crate::builder::InternalModelBuilder;
use crate::convention::{ForeignKeyRemovedConvention, KeyAddedConvention};

/// Key value generation and key re-evaluation.
///
/// A primary key made of a single integer property that is not part of a
/// foreign key gets identity generation at convention source. When a foreign
/// key goes away, an entity type left without a primary key runs key
/// discovery again, so a property the foreign key used becomes a candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyConvention;

impl KeyAddedConvention for KeyConvention {
    fn apply(&self, builder: &mut InternalModelBuilder, key: KeyId) -> Result<Option<KeyId>> {
        let model = builder.model();
        let Some(k) = model.key(key) else {
            return Ok(None);
        };
        if model.entity_type(k.entity_type()).and_then(|e| e.primary_key()) != Some(key) {
            return Ok(Some(key));
        }
        let [property] = k.properties() else {
            return Ok(Some(key));
        };
        let property = *property;
        let eligible = model
            .property(property)
            .is_some_and(|p| p.value_type().is_integer())
            && !model.is_foreign_key_property(property);
        if eligible {
            builder.store_generated_pattern(
                property,
                StoreGeneratedPattern::Identity,
                ConfigurationSource::Convention,
            );
        }
        Ok(Some(key))
    }
}

impl ForeignKeyRemovedConvention for KeyConvention {
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        dependent: EntityTypeId,
        _foreign_key: &ForeignKey,
    ) -> Result<()> {
        KeyDiscoveryConvention::discover(builder, dependent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention_set::ConventionSet;
    use ormkit_core::ValueType;
    use std::sync::Arc;

    fn builder() -> InternalModelBuilder {
        let mut set = ConventionSet::new();
        set.key_added.push(Arc::new(KeyConvention));
        set.foreign_key_removed.push(Arc::new(KeyConvention));
        InternalModelBuilder::new(set).unwrap()
    }

    #[test]
    fn test_single_integer_primary_key_is_identity() {
        let mut b = builder();
        let e = b
            .entity_by_name("Blog", ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let id = b
            .shadow_property(e, "Id", ValueType::BigInt, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        b.primary_key(e, &[id], ConfigurationSource::Explicit).unwrap();

        let property = b.model().property(id).unwrap();
        assert_eq!(property.store_generated_pattern(), StoreGeneratedPattern::Identity);
        assert_eq!(
            property.store_generated_pattern_source(),
            Some(ConfigurationSource::Convention)
        );
    }

    #[test]
    fn test_text_and_composite_keys_are_not_generated() {
        let mut b = builder();
        let e = b
            .entity_by_name("Tag", ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let name = b
            .shadow_property(e, "Name", ValueType::Text, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let n = b
            .shadow_property(e, "N", ValueType::Int, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();

        b.primary_key(e, &[name], ConfigurationSource::Explicit).unwrap();
        assert!(!b.model().property(name).unwrap().store_generated_pattern().is_generated());

        b.primary_key(e, &[n, name], ConfigurationSource::Explicit).unwrap();
        assert!(!b.model().property(n).unwrap().store_generated_pattern().is_generated());
    }

    #[test]
    fn test_replacing_key_resets_conventional_generation() {
        let mut b = builder();
        let e = b
            .entity_by_name("Blog", ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let id = b
            .shadow_property(e, "Id", ValueType::Int, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        let code = b
            .shadow_property(e, "Code", ValueType::Text, false, ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();
        b.primary_key(e, &[id], ConfigurationSource::Convention).unwrap();
        assert!(b.model().property(id).unwrap().store_generated_pattern().is_generated());

        b.primary_key(e, &[code], ConfigurationSource::Explicit).unwrap();
        assert_eq!(
            b.model().property(id).unwrap().store_generated_pattern(),
            StoreGeneratedPattern::None
        );
        assert_eq!(b.model().entity_type(e).unwrap().keys().len(), 1);
    }
}
