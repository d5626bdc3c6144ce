//! Query expression nodes and SQL rendering.

use crate::error::{Result, TranslationError};
use crate::method::MethodInfo;

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    Float(f64),
    /// String literal, quoted by the dialect when rendered.
    Text(String),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Numeric addition.
    Add,
    /// String concatenation.
    Concat,
    /// Equality.
    Eq,
    /// Inequality.
    NotEq,
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
}

/// A method invocation in a source query.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// The overload being called.
    pub method: &'static MethodInfo,
    /// Receiver, absent for static methods.
    pub object: Option<Box<Expr>>,
    /// Arguments in declaration order.
    pub arguments: Vec<Expr>,
}

impl MethodCall {
    /// Instance call `object.method(arguments)`.
    pub fn new(method: &'static MethodInfo, object: Expr, arguments: Vec<Expr>) -> Self {
        Self {
            method,
            object: Some(Box::new(object)),
            arguments,
        }
    }

    /// Static call `method(arguments)`.
    pub fn static_call(method: &'static MethodInfo, arguments: Vec<Expr>) -> Self {
        Self {
            method,
            object: None,
            arguments,
        }
    }
}

/// Query expression tree.
///
/// Source-level nodes ([`Expr::Member`], [`Expr::MethodCall`]) are replaced by
/// store-level nodes during binding and translation before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Resolved column reference.
    Column {
        schema: Option<String>,
        table: Option<String>,
        name: String,
    },
    /// Unresolved member access on an entity type.
    Member { entity_type: String, member: String },
    /// Inline constant.
    Literal(Value),
    /// Bound parameter.
    Parameter(Value),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `match LIKE pattern`.
    Like { value: Box<Expr>, pattern: Box<Expr> },
    /// Store function call.
    Function { name: String, arguments: Vec<Expr> },
    /// Untranslated method call.
    MethodCall(MethodCall),
}

impl Expr {
    /// Unresolved member `entity_type.member`.
    pub fn member(entity_type: impl Into<String>, member: impl Into<String>) -> Self {
        Expr::Member {
            entity_type: entity_type.into(),
            member: member.into(),
        }
    }

    /// Unqualified column.
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column {
            schema: None,
            table: None,
            name: name.into(),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn parameter(value: impl Into<Value>) -> Self {
        Expr::Parameter(value.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// String concatenation.
    pub fn concat(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Concat, left, right)
    }

    pub fn like(value: Expr, pattern: Expr) -> Self {
        Expr::Like {
            value: Box::new(value),
            pattern: Box::new(pattern),
        }
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            arguments,
        }
    }

    /// `self.method(arguments)`.
    pub fn call(self, method: &'static MethodInfo, arguments: Vec<Expr>) -> Self {
        Expr::MethodCall(MethodCall::new(method, self, arguments))
    }

    /// `self = other`.
    pub fn eq(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    /// `self AND other`.
    pub fn and(self, other: Expr) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    /// Whether any method call remains in the tree.
    pub fn contains_method_call(&self) -> bool {
        match self {
            Expr::MethodCall(_) => true,
            Expr::Binary { left, right, .. } => {
                left.contains_method_call() || right.contains_method_call()
            }
            Expr::Like { value, pattern } => {
                value.contains_method_call() || pattern.contains_method_call()
            }
            Expr::Function { arguments, .. } => arguments.iter().any(Expr::contains_method_call),
            Expr::Column { .. } | Expr::Member { .. } | Expr::Literal(_) | Expr::Parameter(_) => {
                false
            }
        }
    }

    /// Rebuild the tree bottom-up, replacing each node with `f(node)`.
    pub fn try_map<F>(self, f: &mut F) -> Result<Expr>
    where
        F: FnMut(Expr) -> Result<Expr>,
    {
        let rebuilt = match self {
            Expr::Binary { op, left, right } => Expr::Binary {
                op,
                left: Box::new(left.try_map(f)?),
                right: Box::new(right.try_map(f)?),
            },
            Expr::Like { value, pattern } => Expr::Like {
                value: Box::new(value.try_map(f)?),
                pattern: Box::new(pattern.try_map(f)?),
            },
            Expr::Function { name, arguments } => Expr::Function {
                name,
                arguments: arguments
                    .into_iter()
                    .map(|a| a.try_map(f))
                    .collect::<Result<_>>()?,
            },
            Expr::MethodCall(call) => Expr::MethodCall(MethodCall {
                method: call.method,
                object: match call.object {
                    Some(object) => Some(Box::new(object.try_map(f)?)),
                    None => None,
                },
                arguments: call
                    .arguments
                    .into_iter()
                    .map(|a| a.try_map(f))
                    .collect::<Result<_>>()?,
            }),
            leaf => leaf,
        };
        f(rebuilt)
    }

    /// Render SQL with the default dialect (Postgres).
    pub fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        self.to_sql_with_dialect(Dialect::default())
    }

    /// Render SQL and collect parameter values in placeholder order.
    pub fn to_sql_with_dialect(&self, dialect: Dialect) -> Result<(String, Vec<Value>)> {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.render(dialect, &mut sql, &mut params)?;
        Ok((sql, params))
    }

    fn render(&self, dialect: Dialect, sql: &mut String, params: &mut Vec<Value>) -> Result<()> {
        match self {
            Expr::Column {
                schema,
                table,
                name,
            } => {
                for part in [schema, table].into_iter().flatten() {
                    sql.push_str(&dialect.quote_identifier(part));
                    sql.push('.');
                }
                sql.push_str(&dialect.quote_identifier(name));
            }
            Expr::Member {
                entity_type,
                member,
            } => {
                return Err(TranslationError::UnboundMember {
                    entity_type: entity_type.clone(),
                    member: member.clone(),
                });
            }
            Expr::Literal(value) => sql.push_str(&dialect.literal(value)),
            Expr::Parameter(value) => {
                params.push(value.clone());
                sql.push_str(&dialect.placeholder(params.len()));
            }
            Expr::Binary {
                op: BinaryOp::Concat,
                ..
            } => {
                let mut operands = Vec::new();
                self.flatten_concat(&mut operands);
                if dialect == Dialect::Mysql {
                    sql.push_str("CONCAT(");
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            sql.push_str(", ");
                        }
                        operand.render(dialect, sql, params)?;
                    }
                    sql.push(')');
                } else {
                    let separator = if dialect == Dialect::SqlServer {
                        " + "
                    } else {
                        " || "
                    };
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            sql.push_str(separator);
                        }
                        operand.render_operand(dialect, sql, params)?;
                    }
                }
            }
            Expr::Binary { op, left, right } => {
                left.render_operand(dialect, sql, params)?;
                sql.push_str(match op {
                    BinaryOp::Add | BinaryOp::Concat => " + ",
                    BinaryOp::Eq => " = ",
                    BinaryOp::NotEq => " <> ",
                    BinaryOp::And => " AND ",
                    BinaryOp::Or => " OR ",
                });
                right.render_operand(dialect, sql, params)?;
            }
            Expr::Like { value, pattern } => {
                value.render_operand(dialect, sql, params)?;
                sql.push_str(" LIKE ");
                pattern.render_operand(dialect, sql, params)?;
            }
            Expr::Function { name, arguments } => {
                sql.push_str(name);
                sql.push('(');
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    argument.render(dialect, sql, params)?;
                }
                sql.push(')');
            }
            Expr::MethodCall(call) => {
                return Err(TranslationError::UntranslatableMethod {
                    method: call.method.to_string(),
                });
            }
        }
        Ok(())
    }

    fn render_operand(
        &self,
        dialect: Dialect,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) -> Result<()> {
        if matches!(self, Expr::Binary { .. } | Expr::Like { .. }) {
            sql.push('(');
            self.render(dialect, sql, params)?;
            sql.push(')');
            Ok(())
        } else {
            self.render(dialect, sql, params)
        }
    }

    fn flatten_concat<'a>(&'a self, operands: &mut Vec<&'a Expr>) {
        match self {
            Expr::Binary {
                op: BinaryOp::Concat,
                left,
                right,
            } => {
                left.flatten_concat(operands);
                right.flatten_concat(operands);
            }
            other => operands.push(other),
        }
    }
}

/// SQL dialect used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `$1` placeholders, `||` concatenation.
    #[default]
    Postgres,
    /// `?1` placeholders, `||` concatenation.
    Sqlite,
    /// `?` placeholders, `CONCAT(...)`.
    Mysql,
    /// `@p1` placeholders, `+` concatenation.
    SqlServer,
}

impl Dialect {
    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => format!("?{}", index),
            Dialect::Mysql => "?".to_string(),
            Dialect::SqlServer => format!("@p{}", index),
        }
    }

    /// Quote an identifier, doubling embedded quote characters.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
            Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
        }
    }

    /// Inline constant.
    pub fn literal(self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => match (self, b) {
                (Dialect::SqlServer, true) => "1".to_string(),
                (Dialect::SqlServer, false) => "0".to_string(),
                (_, true) => "TRUE".to_string(),
                (_, false) => "FALSE".to_string(),
            },
            Value::Int(i) => i.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => {
                let escaped = s.replace('\'', "''");
                if self == Dialect::SqlServer {
                    format!("N'{}'", escaped)
                } else {
                    format!("'{}'", escaped)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::STRING_ENDS_WITH;

    fn contains_pattern() -> Expr {
        Expr::like(
            Expr::column("Name"),
            Expr::concat(
                Expr::concat(Expr::literal("%"), Expr::parameter("an")),
                Expr::literal("%"),
            ),
        )
    }

    #[test]
    fn test_concat_per_dialect() {
        let expr = contains_pattern();
        let (pg, params) = expr.to_sql().unwrap();
        assert_eq!(pg, "\"Name\" LIKE ('%' || $1 || '%')");
        assert_eq!(params, vec![Value::Text("an".to_string())]);

        let (mysql, _) = expr.to_sql_with_dialect(Dialect::Mysql).unwrap();
        assert_eq!(mysql, "`Name` LIKE (CONCAT('%', ?, '%'))");

        let (mssql, _) = expr.to_sql_with_dialect(Dialect::SqlServer).unwrap();
        assert_eq!(mssql, "[Name] LIKE (N'%' + @p1 + N'%')");

        let (sqlite, _) = expr.to_sql_with_dialect(Dialect::Sqlite).unwrap();
        assert_eq!(sqlite, "\"Name\" LIKE ('%' || ?1 || '%')");
    }

    #[test]
    fn test_qualified_column_and_escaping() {
        let expr = Expr::Column {
            schema: Some("dbo".to_string()),
            table: Some("Blogs".to_string()),
            name: "Url".to_string(),
        }
        .eq(Expr::literal("O'Brien"));
        let (sql, params) = expr.to_sql().unwrap();
        assert_eq!(sql, "\"dbo\".\"Blogs\".\"Url\" = 'O''Brien'");
        assert!(params.is_empty());
    }

    #[test]
    fn test_parameters_numbered_in_order() {
        let expr = Expr::column("A")
            .eq(Expr::parameter(1_i64))
            .and(Expr::column("B").eq(Expr::parameter(true)));
        let (sql, params) = expr.to_sql_with_dialect(Dialect::SqlServer).unwrap();
        assert_eq!(sql, "([A] = @p1) AND ([B] = @p2)");
        assert_eq!(params, vec![Value::Int(1), Value::Bool(true)]);
    }

    #[test]
    fn test_unbound_member_and_method_call_fail_to_render() {
        let member = Expr::member("Blog", "Url");
        assert!(matches!(
            member.to_sql(),
            Err(TranslationError::UnboundMember { .. })
        ));

        let call = Expr::column("Url").call(&STRING_ENDS_WITH, vec![Expr::literal(".com")]);
        assert!(call.contains_method_call());
        assert_eq!(
            call.to_sql(),
            Err(TranslationError::UntranslatableMethod {
                method: "String.EndsWith(String)".to_string()
            })
        );
    }

    #[test]
    fn test_function_rendering() {
        let expr = Expr::function("UPPER", vec![Expr::column("Name")]);
        assert_eq!(expr.to_sql().unwrap().0, "UPPER(\"Name\")");
    }
}
