//! Core metadata types for ormkit.
//!
//! `ormkit-core` is the **foundation layer**: it defines the metadata graph that
//! conventions refine and that query translation reads.
//!
//! # Role In The Architecture
//!
//! - **Precedence**: [`ConfigurationSource`] and [`Configured`] implement the single
//!   guarded-write rule used for every configurable attribute.
//! - **Metadata graph**: [`Model`] owns entity types, properties, keys, foreign keys
//!   and navigations in arenas addressed by typed ids.
//! - **Source shapes**: [`EntityShape`] and [`Marker`] describe the mapped types and
//!   their declarative markers; [`MarkerProvider`] is the lookup conventions use.
//! - **Providers**: relational and SQL Server accessors over the namespaced
//!   annotation store.
//!
//! # Who Uses This Crate
//!
//! - `ormkit-conventions` mutates the graph through its convention-aware builder.
//! - `ormkit-query` binds query members against a built [`Model`].
//! - `ormkit` re-exports everything behind its public model builder.

pub mod annotation;
pub mod error;
pub mod marker;
pub mod metadata;
pub mod providers;
pub mod shape;
pub mod snapshot;
pub mod source;
pub mod types;

pub use annotation::{Annotation, Annotations};
pub use error::{Error, Result};
pub use marker::{DatabaseGeneratedOption, Marker, MarkerKind, MarkerProvider};
pub use metadata::{
    EntityType, EntityTypeId, ForeignKey, ForeignKeyId, Key, KeyId, Model, Navigation,
    NavigationId, Property, PropertyId,
};
pub use providers::{
    RelationalEntityTypeExt, RelationalNames, Sequence, SqlServerModel, SqlServerModelExt,
    SqlServerNames, SqlServerValueGeneration, TableMapping,
};
pub use shape::{EntityShape, Mapped, MemberInfo, MemberKind};
pub use snapshot::{
    EntityTypeSnapshot, ForeignKeySnapshot, KeySnapshot, ModelSnapshot, NavigationSnapshot,
    PropertySnapshot,
};
pub use source::{ConfigurationSource, Configured};
pub use types::{StoreGeneratedPattern, ValueType};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_model_is_shareable() {
        assert_send_sync::<Model>();
        assert_send_sync::<ModelSnapshot>();
    }
}
