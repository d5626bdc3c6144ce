//! Resolution of entity members to table columns.

use ormkit_core::{Model, RelationalEntityTypeExt};

use crate::error::{Result, TranslationError};
use crate::expr::Expr;

/// Replace every [`Expr::Member`] with the column it maps to in `model`.
///
/// Columns are qualified with the entity type's relational table and schema.
pub fn bind_members(expr: Expr, model: &Model) -> Result<Expr> {
    expr.try_map(&mut |node| match node {
        Expr::Member {
            entity_type,
            member,
        } => {
            let Some(id) = model.entity_type_id(&entity_type) else {
                return Err(TranslationError::UnknownEntityType(entity_type));
            };
            let property = model.find_property(id, &member).and_then(|p| model.property(p));
            let (Some(entity), Some(property)) = (model.entity_type(id), property) else {
                return Err(TranslationError::UnknownMember {
                    entity_type,
                    member,
                });
            };
            let mapping = entity.relational();
            Ok(Expr::Column {
                schema: mapping.schema().map(str::to_string),
                table: Some(mapping.table().to_string()),
                name: property.name().to_string(),
            })
        }
        other => Ok(other),
    })
}
