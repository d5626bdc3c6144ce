//! Provider-specific views over the annotation store.
//!
//! Providers do not add fields to the metadata graph. They read and write
//! namespaced annotations (`Relational:*`, `SqlServer:*`) through the same
//! source guard as every other attribute.

pub mod relational;
pub mod sql_server;

pub use relational::{RelationalEntityTypeExt, RelationalNames, TableMapping};
pub use sql_server::{
    Sequence, SqlServerModel, SqlServerModelExt, SqlServerNames, SqlServerValueGeneration,
};
