//! The built-in conventions.
//!
//! Discovery conventions work at [`ConfigurationSource::Convention`]; the
//! attribute conventions read declarative markers and work at
//! [`ConfigurationSource::DataAnnotation`].
//!
//! [`ConfigurationSource::Convention`]: ormkit_core::ConfigurationSource::Convention
//! [`ConfigurationSource::DataAnnotation`]: ormkit_core::ConfigurationSource::DataAnnotation

mod attributes;
mod foreign_key_property_discovery;
mod key;
mod key_discovery;
mod property_discovery;
mod relationship_discovery;
mod sql_server;
mod table_attribute;

pub use attributes::{
    ConcurrencyCheckAttributeConvention, DatabaseGeneratedAttributeConvention,
    KeyAttributeConvention, RequiredAttributeConvention,
};
pub use foreign_key_property_discovery::ForeignKeyPropertyDiscoveryConvention;
pub use key::KeyConvention;
pub use key_discovery::KeyDiscoveryConvention;
pub use property_discovery::PropertyDiscoveryConvention;
pub use relationship_discovery::RelationshipDiscoveryConvention;
pub use sql_server::SqlServerIdentityStrategyConvention;
pub use table_attribute::RelationalTableAttributeConvention;

use ormkit_core::{Marker, MarkerKind, Model, PropertyId};

/// Marker of `kind` on the member backing `property`, if any.
pub(crate) fn property_marker(model: &Model, property: PropertyId, kind: MarkerKind) -> Option<Marker> {
    let property = model.property(property)?;
    if property.is_shadow() {
        return None;
    }
    model
        .entity_type(property.entity_type())?
        .markers()?
        .find_member_marker(property.name(), kind)
        .cloned()
}
