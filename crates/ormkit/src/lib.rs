//! ormkit: convention-driven ORM metadata for Rust.
//!
//! `ormkit` is the **primary entry point**. It re-exports the metadata types,
//! the convention pipeline and query translation behind one public
//! [`ModelBuilder`].
//!
//! # Role In The Architecture
//!
//! - **Explicit configuration**: [`ModelBuilder`] and its entity, property and
//!   relationship builders record everything at
//!   [`ConfigurationSource::Explicit`].
//! - **Conventions**: [`ModelBuilderConfig`] picks the convention layers
//!   (core, relational, SQL Server) that fill in what was not configured.
//! - **Queries**: [`query`] translates method calls against a built [`Model`].
//!
//! # Quick Start
//!
//! ```ignore
//! use ormkit::prelude::*;
//!
//! let blog = EntityShape::new("Blog")
//!     .member(MemberInfo::scalar("Id", ValueType::Int))
//!     .member(MemberInfo::collection("Posts", "Post"));
//! let post = EntityShape::new("Post")
//!     .member(MemberInfo::scalar("Id", ValueType::Int))
//!     .member(MemberInfo::optional("BlogId", ValueType::Int))
//!     .member(MemberInfo::reference("Blog", "Blog"));
//!
//! let mut builder = ModelBuilder::new()?;
//! builder.entity(blog)?;
//! builder.entity(post)?.to_table("posts", Some("blogging"))?;
//! let model = builder.finish()?;
//! ```

pub mod builder;
pub mod config;

/// `tracing` target for the public builder.
pub const LOG_TARGET: &str = "ormkit";

pub use builder::{
    CollectionNavigationBuilder, EntityTypeBuilder, ModelBuilder, PropertyBuilder,
    ReferenceCollectionBuilder, ReferenceNavigationBuilder, ReferenceReferenceBuilder,
};
pub use config::{ModelBuilderConfig, Provider};

pub use ormkit_conventions as conventions;
pub use ormkit_query as query;

pub use ormkit_core::{
    ConfigurationSource, DatabaseGeneratedOption, EntityShape, EntityType, EntityTypeId, Error,
    ForeignKey, ForeignKeyId, Key, KeyId, Marker, MarkerKind, MemberInfo, Model, ModelSnapshot,
    Property, PropertyId, RelationalEntityTypeExt, Result, Sequence, SqlServerModelExt,
    SqlServerValueGeneration, StoreGeneratedPattern, ValueType,
};

/// Common imports.
pub mod prelude {
    pub use crate::{
        ConfigurationSource, DatabaseGeneratedOption, EntityShape, Error, Marker, MemberInfo,
        Model, ModelBuilder, ModelBuilderConfig, ModelSnapshot, Provider, RelationalEntityTypeExt,
        Result, SqlServerModelExt, StoreGeneratedPattern, ValueType,
    };
    pub use ormkit_query::{Dialect, Expr, TranslatorRegistry, bind_members};
}
