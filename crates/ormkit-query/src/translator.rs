//! Method-call translators and their registry.
//!
//! Each translator recognizes one method overload by identity and rewrites a
//! matching call into store-level nodes. Matching and rewriting are separate
//! steps; [`MethodCallTranslator::translate`] combines them.

use std::fmt;
use std::sync::Arc;

use crate::LOG_TARGET;
use crate::error::{Result, TranslationError};
use crate::expr::{Expr, MethodCall};
use crate::method::{
    MethodInfo, STRING_CONTAINS, STRING_ENDS_WITH, STRING_STARTS_WITH, STRING_TO_LOWER,
    STRING_TO_UPPER,
};

/// Rewrites calls to one method into a store expression.
pub trait MethodCallTranslator: Send + Sync {
    /// The overload this translator handles.
    fn method(&self) -> &'static MethodInfo;

    /// Whether `call` is a call to [`Self::method`].
    fn matches(&self, call: &MethodCall) -> bool {
        self.method().is(call.method)
    }

    /// Rewrite a matching call. `None` if the call's shape is unsupported.
    fn rewrite(&self, call: &MethodCall) -> Option<Expr>;

    /// Match then rewrite.
    fn translate(&self, call: &MethodCall) -> Option<Expr> {
        if self.matches(call) {
            self.rewrite(call)
        } else {
            None
        }
    }

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

fn receiver_and_argument(call: &MethodCall) -> Option<(Expr, Expr)> {
    match (call.object.as_deref(), call.arguments.as_slice()) {
        (Some(object), [argument]) => Some((object.clone(), argument.clone())),
        _ => None,
    }
}

fn receiver_only(call: &MethodCall) -> Option<Expr> {
    match (call.object.as_deref(), call.arguments.as_slice()) {
        (Some(object), []) => Some(object.clone()),
        _ => None,
    }
}

/// `s.EndsWith(x)` to `s LIKE '%' || x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndsWithTranslator;

impl MethodCallTranslator for EndsWithTranslator {
    fn method(&self) -> &'static MethodInfo {
        &STRING_ENDS_WITH
    }

    fn rewrite(&self, call: &MethodCall) -> Option<Expr> {
        let (object, argument) = receiver_and_argument(call)?;
        Some(Expr::like(object, Expr::concat(Expr::literal("%"), argument)))
    }
}

/// `s.StartsWith(x)` to `s LIKE x || '%'`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartsWithTranslator;

impl MethodCallTranslator for StartsWithTranslator {
    fn method(&self) -> &'static MethodInfo {
        &STRING_STARTS_WITH
    }

    fn rewrite(&self, call: &MethodCall) -> Option<Expr> {
        let (object, argument) = receiver_and_argument(call)?;
        Some(Expr::like(object, Expr::concat(argument, Expr::literal("%"))))
    }
}

/// `s.Contains(x)` to `s LIKE '%' || x || '%'`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsTranslator;

impl MethodCallTranslator for ContainsTranslator {
    fn method(&self) -> &'static MethodInfo {
        &STRING_CONTAINS
    }

    fn rewrite(&self, call: &MethodCall) -> Option<Expr> {
        let (object, argument) = receiver_and_argument(call)?;
        Some(Expr::like(
            object,
            Expr::concat(
                Expr::concat(Expr::literal("%"), argument),
                Expr::literal("%"),
            ),
        ))
    }
}

/// Maps a parameterless string method onto a unary store function.
#[derive(Debug, Clone, Copy)]
pub struct StringFunctionTranslator {
    method: &'static MethodInfo,
    function: &'static str,
}

impl StringFunctionTranslator {
    /// `s.ToUpper()` to `UPPER(s)`.
    pub const fn to_upper() -> Self {
        Self {
            method: &STRING_TO_UPPER,
            function: "UPPER",
        }
    }

    /// `s.ToLower()` to `LOWER(s)`.
    pub const fn to_lower() -> Self {
        Self {
            method: &STRING_TO_LOWER,
            function: "LOWER",
        }
    }
}

impl MethodCallTranslator for StringFunctionTranslator {
    fn method(&self) -> &'static MethodInfo {
        self.method
    }

    fn rewrite(&self, call: &MethodCall) -> Option<Expr> {
        let object = receiver_only(call)?;
        Some(Expr::function(self.function, vec![object]))
    }
}

/// Ordered translator list. The first translator returning a result wins.
///
/// Populate it once, then share it read-only.
#[derive(Clone, Default)]
pub struct TranslatorRegistry {
    translators: Vec<Arc<dyn MethodCallTranslator>>,
}

impl TranslatorRegistry {
    /// A registry with no translators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in string translators.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with(EndsWithTranslator)
            .with(StartsWithTranslator)
            .with(ContainsTranslator)
            .with(StringFunctionTranslator::to_upper())
            .with(StringFunctionTranslator::to_lower())
    }

    /// Append a translator.
    pub fn register(&mut self, translator: impl MethodCallTranslator + 'static) -> &mut Self {
        self.translators.push(Arc::new(translator));
        self
    }

    /// Builder-style [`Self::register`].
    #[must_use]
    pub fn with(mut self, translator: impl MethodCallTranslator + 'static) -> Self {
        self.register(translator);
        self
    }

    /// Number of registered translators.
    pub fn len(&self) -> usize {
        self.translators.len()
    }

    /// True when no translator is registered.
    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// Translate a single call.
    pub fn translate(&self, call: &MethodCall) -> Option<Expr> {
        self.translators.iter().find_map(|translator| {
            let translated = translator.translate(call)?;
            tracing::trace!(
                target: LOG_TARGET,
                translator = translator.name(),
                method = %call.method,
                "Method call translated"
            );
            Some(translated)
        })
    }

    /// Translate every method call in `expr`, innermost first.
    pub fn translate_expression(&self, expr: Expr) -> Result<Expr> {
        expr.try_map(&mut |node| match node {
            Expr::MethodCall(call) => self.translate(&call).ok_or_else(|| {
                tracing::debug!(target: LOG_TARGET, method = %call.method, "No translator matched");
                TranslationError::UntranslatableMethod {
                    method: call.method.to_string(),
                }
            }),
            other => Ok(other),
        })
    }
}

impl fmt::Debug for TranslatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.translators.iter().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Dialect;
    use crate::method::STRING_ENDS_WITH_COMPARISON;

    fn name() -> Expr {
        Expr::column("Name")
    }

    #[test]
    fn test_ends_with_builds_like_pattern() {
        let call = MethodCall::new(&STRING_ENDS_WITH, name(), vec![Expr::parameter("son")]);
        let translated = EndsWithTranslator.translate(&call).unwrap();
        assert_eq!(
            translated,
            Expr::like(
                name(),
                Expr::concat(Expr::literal("%"), Expr::parameter("son"))
            )
        );
    }

    #[test]
    fn test_match_is_by_identity_not_name() {
        let call = MethodCall::new(
            &STRING_ENDS_WITH_COMPARISON,
            name(),
            vec![Expr::parameter("son"), Expr::literal(4_i64)],
        );
        assert!(!EndsWithTranslator.matches(&call));
        assert!(EndsWithTranslator.translate(&call).is_none());
        assert!(TranslatorRegistry::with_defaults().translate(&call).is_none());
    }

    #[test]
    fn test_wrong_shape_is_not_partially_translated() {
        let call = MethodCall::static_call(&STRING_ENDS_WITH, vec![Expr::parameter("son")]);
        assert!(EndsWithTranslator.matches(&call));
        assert!(EndsWithTranslator.translate(&call).is_none());
    }

    struct Fixed(&'static str);

    impl MethodCallTranslator for Fixed {
        fn method(&self) -> &'static MethodInfo {
            &STRING_ENDS_WITH
        }

        fn rewrite(&self, _call: &MethodCall) -> Option<Expr> {
            Some(Expr::literal(self.0))
        }
    }

    #[test]
    fn test_first_match_wins() {
        let registry = TranslatorRegistry::new().with(Fixed("first")).with(Fixed("second"));
        let call = MethodCall::new(&STRING_ENDS_WITH, name(), vec![Expr::parameter("x")]);
        assert_eq!(registry.translate(&call), Some(Expr::literal("first")));
    }

    #[test]
    fn test_later_translator_used_when_earlier_declines() {
        let registry = TranslatorRegistry::new()
            .with(StringFunctionTranslator::to_upper())
            .with(Fixed("fallback"));
        let call = MethodCall::new(&STRING_ENDS_WITH, name(), vec![Expr::parameter("x")]);
        assert_eq!(registry.translate(&call), Some(Expr::literal("fallback")));
    }

    #[test]
    fn test_translate_nested_expression() {
        let registry = TranslatorRegistry::with_defaults();
        let expr = name()
            .call(&STRING_TO_LOWER, vec![])
            .call(&STRING_CONTAINS, vec![Expr::parameter("an")]);
        let translated = registry.translate_expression(expr).unwrap();
        assert!(!translated.contains_method_call());
        let (sql, params) = translated.to_sql_with_dialect(Dialect::Sqlite).unwrap();
        assert_eq!(sql, "LOWER(\"Name\") LIKE ('%' || ?1 || '%')");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_untranslatable_method_fails_whole_tree() {
        let registry = TranslatorRegistry::with_defaults();
        let expr = name()
            .call(&STRING_ENDS_WITH_COMPARISON, vec![Expr::parameter("x"), Expr::literal(4_i64)])
            .and(name().call(&STRING_STARTS_WITH, vec![Expr::parameter("y")]));
        let err = registry.translate_expression(expr).unwrap_err();
        assert_eq!(
            err,
            TranslationError::UntranslatableMethod {
                method: "String.EndsWith(String, StringComparison)".to_string()
            }
        );
    }

    #[test]
    fn test_defaults_registered_in_order() {
        let registry = TranslatorRegistry::with_defaults();
        assert_eq!(registry.len(), 5);
        assert!(format!("{:?}", registry).contains("EndsWithTranslator"));
    }
}
