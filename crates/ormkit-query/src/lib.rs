//! Query expressions and method-call translation for ormkit.
//!
//! `ormkit-query` takes source-level query expressions (member accesses and
//! method calls) to store-level expressions and renders them as SQL.
//!
//! # Role In The Architecture
//!
//! - **Expressions**: [`Expr`] covers both source nodes and store nodes.
//! - **Translation**: [`TranslatorRegistry`] tries [`MethodCallTranslator`]s in
//!   registration order; the first result wins.
//! - **Binding**: [`bind_members`] maps members to columns through a built
//!   [`Model`](ormkit_core::Model).
//! - **Rendering**: [`Dialect`] chooses quoting, placeholders and string
//!   concatenation.
//!
//! # Example
//!
//! ```ignore
//! let registry = TranslatorRegistry::with_defaults();
//! let filter = Expr::member("Blog", "Url").call(&STRING_ENDS_WITH, vec![Expr::parameter(".com")]);
//! let filter = bind_members(registry.translate_expression(filter)?, &model)?;
//! let (sql, params) = filter.to_sql_with_dialect(Dialect::SqlServer)?;
//! ```

pub mod binding;
pub mod error;
pub mod expr;
pub mod method;
pub mod translator;

/// `tracing` target for translation events.
pub const LOG_TARGET: &str = "ormkit::query";

pub use binding::bind_members;
pub use error::{Result, TranslationError};
pub use expr::{BinaryOp, Dialect, Expr, MethodCall, Value};
pub use method::{
    MethodInfo, STRING_CONTAINS, STRING_ENDS_WITH, STRING_ENDS_WITH_COMPARISON,
    STRING_STARTS_WITH, STRING_TO_LOWER, STRING_TO_UPPER,
};
pub use translator::{
    ContainsTranslator, EndsWithTranslator, MethodCallTranslator, StartsWithTranslator,
    StringFunctionTranslator, TranslatorRegistry,
};
