//! Convention pipeline for ormkit.
//!
//! `ormkit-conventions` turns a handful of source shapes into a complete
//! metadata [`Model`](ormkit_core::Model) by reacting to structural events.
//!
//! # Role In The Architecture
//!
//! - **Builder**: [`InternalModelBuilder`] is the only way the graph is mutated.
//!   Every write is guarded by [`ConfigurationSource`](ormkit_core::ConfigurationSource)
//!   and every structural change is reported to the [`ConventionDispatcher`].
//! - **Convention set**: [`ConventionSet`] holds one ordered list per event;
//!   [`CoreConventionSetBuilder`], [`RelationalConventionSetBuilder`] and
//!   [`SqlServerConventionSetBuilder`] fill it in layers.
//! - **Conventions**: discovery (properties, keys, relationships, foreign key
//!   properties) and declarative markers (`[Key]`, `[Required]`, `[Table]`...).
//!
//! # Who Uses This Crate
//!
//! - `ormkit` wraps [`InternalModelBuilder`] in its explicit-source public
//!   builder.
//! - Provider crates add their own conventions by implementing
//!   [`ConventionSetBuilder`] on top of the relational one.

pub mod builder;
pub mod convention;
pub mod convention_set;
pub mod conventions;
pub mod dispatcher;

mod naming;

/// `tracing` target for convention and builder events.
pub const LOG_TARGET: &str = "ormkit::conventions";

pub use builder::InternalModelBuilder;
pub use convention::{
    EntityTypeAddedConvention, ForeignKeyAddedConvention, ForeignKeyRemovedConvention,
    KeyAddedConvention, ModelBuiltConvention, ModelInitializedConvention, PropertyAddedConvention,
};
pub use convention_set::{
    ConventionSet, ConventionSetBuilder, CoreConventionSetBuilder, RelationalConventionSetBuilder,
    SqlServerConventionSetBuilder,
};
pub use conventions::{
    ConcurrencyCheckAttributeConvention, DatabaseGeneratedAttributeConvention,
    ForeignKeyPropertyDiscoveryConvention, KeyAttributeConvention, KeyConvention,
    KeyDiscoveryConvention, PropertyDiscoveryConvention, RelationalTableAttributeConvention,
    RelationshipDiscoveryConvention, RequiredAttributeConvention,
    SqlServerIdentityStrategyConvention,
};
pub use dispatcher::ConventionDispatcher;
