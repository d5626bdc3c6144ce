//! Convention traits, one per structural event.
//!
//! A convention returns the element it was handed (or a replacement) to let
//! the next convention in the list run, or `None` to stop propagation for
//! that element. Errors abort the mutation that triggered the event.

use ormkit_core::{EntityTypeId, ForeignKey, ForeignKeyId, KeyId, PropertyId, Result};

use crate::builder::InternalModelBuilder;

/// Runs once when a builder is created, before any entity type exists.
pub trait ModelInitializedConvention: Send + Sync {
    /// Apply the convention.
    fn apply(&self, builder: &mut InternalModelBuilder) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runs after an entity type is added.
pub trait EntityTypeAddedConvention: Send + Sync {
    /// Apply the convention.
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        entity_type: EntityTypeId,
    ) -> Result<Option<EntityTypeId>>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runs after a property is added.
pub trait PropertyAddedConvention: Send + Sync {
    /// Apply the convention.
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        property: PropertyId,
    ) -> Result<Option<PropertyId>>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runs after a key is added or becomes the primary key.
pub trait KeyAddedConvention: Send + Sync {
    /// Apply the convention.
    fn apply(&self, builder: &mut InternalModelBuilder, key: KeyId) -> Result<Option<KeyId>>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runs after a foreign key is added, before its properties are final.
pub trait ForeignKeyAddedConvention: Send + Sync {
    /// Apply the convention.
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> Result<Option<ForeignKeyId>>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runs after a foreign key was removed from `dependent`.
pub trait ForeignKeyRemovedConvention: Send + Sync {
    /// Apply the convention. `foreign_key` is the detached element.
    fn apply(
        &self,
        builder: &mut InternalModelBuilder,
        dependent: EntityTypeId,
        foreign_key: &ForeignKey,
    ) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runs once when the model is finished.
pub trait ModelBuiltConvention: Send + Sync {
    /// Apply the convention.
    fn apply(&self, builder: &mut InternalModelBuilder) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
