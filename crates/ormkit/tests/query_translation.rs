use ormkit::prelude::*;
use ormkit::query::{
    EndsWithTranslator, MethodCall, MethodCallTranslator, MethodInfo, STRING_ENDS_WITH,
    STRING_TO_UPPER, TranslationError, Value,
};

static STRING_REVERSE: MethodInfo = MethodInfo::new("String", "Reverse", &[]);

fn model() -> Model {
    let mut builder =
        ModelBuilder::with_config(ModelBuilderConfig::new().provider(Provider::SqlServer)).unwrap();
    builder
        .entity(
            EntityShape::new("Blog")
                .member(MemberInfo::scalar("Id", ValueType::Int))
                .member(MemberInfo::scalar("Url", ValueType::Text)),
        )
        .unwrap()
        .to_table("Blogs", Some("dbo"))
        .unwrap();
    builder.finish().unwrap()
}

fn url_ends_with_and_id(suffix: &str, id: i64) -> Expr {
    Expr::member("Blog", "Url")
        .call(&STRING_ENDS_WITH, vec![Expr::parameter(suffix)])
        .and(Expr::member("Blog", "Id").eq(Expr::parameter(id)))
}

fn translate(registry: &TranslatorRegistry, expr: Expr, model: &Model) -> Expr {
    bind_members(registry.translate_expression(expr).unwrap(), model).unwrap()
}

#[test]
fn ends_with_renders_per_dialect() {
    let model = model();
    let registry = TranslatorRegistry::with_defaults();
    let expr = translate(&registry, url_ends_with_and_id("/rust", 7), &model);

    let (sql, params) = expr.to_sql_with_dialect(Dialect::SqlServer).unwrap();
    assert_eq!(
        sql,
        "([dbo].[Blogs].[Url] LIKE (N'%' + @p1)) AND ([dbo].[Blogs].[Id] = @p2)"
    );
    assert_eq!(params, vec![Value::from("/rust"), Value::Int(7)]);

    let (sql, _) = expr.to_sql().unwrap();
    assert_eq!(
        sql,
        "(\"dbo\".\"Blogs\".\"Url\" LIKE ('%' || $1)) AND (\"dbo\".\"Blogs\".\"Id\" = $2)"
    );
}

#[test]
fn nested_calls_translate_inside_out() {
    let model = model();
    let expr = Expr::member("Blog", "Url")
        .call(&STRING_TO_UPPER, vec![])
        .call(&STRING_ENDS_WITH, vec![Expr::literal("RS")]);
    let expr = translate(&TranslatorRegistry::with_defaults(), expr, &model);

    let (sql, params) = expr.to_sql_with_dialect(Dialect::Mysql).unwrap();
    assert_eq!(sql, "UPPER(`dbo`.`Blogs`.`Url`) LIKE (CONCAT('%', 'RS'))");
    assert!(params.is_empty());
}

struct EndsWithFunction;

impl MethodCallTranslator for EndsWithFunction {
    fn method(&self) -> &'static MethodInfo {
        &STRING_ENDS_WITH
    }

    fn rewrite(&self, call: &MethodCall) -> Option<Expr> {
        let object = call.object.as_deref()?.clone();
        let mut arguments = vec![object];
        arguments.extend(call.arguments.iter().cloned());
        Some(Expr::function("ENDS_WITH", arguments))
    }
}

#[test]
fn first_registered_translator_wins() {
    let model = model();
    let call = || Expr::member("Blog", "Url").call(&STRING_ENDS_WITH, vec![Expr::literal("x")]);

    let custom_first = TranslatorRegistry::new()
        .with(EndsWithFunction)
        .with(EndsWithTranslator);
    let (sql, _) = translate(&custom_first, call(), &model).to_sql().unwrap();
    assert_eq!(sql, "ENDS_WITH(\"dbo\".\"Blogs\".\"Url\", 'x')");

    let defaults_first = TranslatorRegistry::with_defaults().with(EndsWithFunction);
    let (sql, _) = translate(&defaults_first, call(), &model).to_sql().unwrap();
    assert_eq!(sql, "\"dbo\".\"Blogs\".\"Url\" LIKE ('%' || 'x')");
}

#[test]
fn unknown_method_is_reported() {
    let expr = Expr::member("Blog", "Url").call(&STRING_REVERSE, vec![]);
    let err = TranslatorRegistry::with_defaults()
        .translate_expression(expr)
        .unwrap_err();
    assert_eq!(
        err,
        TranslationError::UntranslatableMethod {
            method: "String.Reverse()".to_string()
        }
    );
}

#[test]
fn unknown_member_is_reported() {
    let model = model();
    let err = bind_members(Expr::member("Blog", "Title"), &model).unwrap_err();
    assert_eq!(
        err,
        TranslationError::UnknownMember {
            entity_type: "Blog".to_string(),
            member: "Title".to_string(),
        }
    );

    let err = bind_members(Expr::member("Post", "Id"), &model).unwrap_err();
    assert_eq!(err, TranslationError::UnknownEntityType("Post".to_string()));
}
