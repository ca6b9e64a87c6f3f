//! The relational converter: flat rows to single-level nodes and back.
//!
//! Conversion is invoked once per table row and never sees nested
//! structure; composing nodes into trees is the engine's job.

use crate::error::ConvertError;
use crate::mapping::{AssociationKind, PersistentEntity, PropertyKind};
use crate::node::{AggregateNode, NodeValue};
use crate::schema::ScalarType;
use crate::value::{SqlRow, SqlValue};

/// Flatten one node level into a row of the entity's own columns
/// (identity, scalars, arrays). Association entries are ignored; parent
/// references and qualifiers are appended by the data access strategy.
pub fn node_to_row(
    entity: &PersistentEntity,
    node: &AggregateNode,
) -> Result<SqlRow, ConvertError> {
    let mut row = SqlRow::new();
    for prop in entity.properties() {
        let (column, declared) = match prop.kind() {
            PropertyKind::Id => (prop.column().expect("id without column"), ScalarType::Int),
            PropertyKind::Scalar(scalar) => {
                (prop.column().expect("scalar without column"), *scalar)
            }
            PropertyKind::Array { element, .. } => {
                let value = scalar_entry(node, prop.name())?;
                let value = coerce_array(prop.name(), *element, value)?;
                row.put(prop.column().expect("array without column"), value);
                continue;
            }
            PropertyKind::Association(_) => continue,
        };
        let value = scalar_entry(node, prop.name())?;
        let value = coerce(prop.name(), declared, value)?;
        row.put(column, value);
    }
    Ok(row)
}

/// Build one node level from a row: the entity's own columns as scalar
/// entries plus empty association slots for the engine to fill. Extra
/// columns (back-references, qualifiers) are ignored.
pub fn row_to_node(
    entity: &PersistentEntity,
    row: &SqlRow,
) -> Result<AggregateNode, ConvertError> {
    let mut node = AggregateNode::new();
    for prop in entity.properties() {
        match prop.kind() {
            PropertyKind::Id => {
                let value = column_value(entity, row, prop.column())?;
                node = node.value(prop.name(), coerce(prop.name(), ScalarType::Int, value)?);
            }
            PropertyKind::Scalar(scalar) => {
                let value = column_value(entity, row, prop.column())?;
                node = node.value(prop.name(), coerce(prop.name(), *scalar, value)?);
            }
            PropertyKind::Array { element, .. } => {
                let value = column_value(entity, row, prop.column())?;
                node = node.value(prop.name(), coerce_array(prop.name(), *element, value)?);
            }
            PropertyKind::Association(assoc) => {
                node = match assoc.kind {
                    AssociationKind::One => node.one(prop.name(), None),
                    AssociationKind::List | AssociationKind::Set => {
                        node.many(prop.name(), Vec::new())
                    }
                    AssociationKind::Map(_) => node.map(prop.name(), Vec::new()),
                };
            }
        }
    }
    Ok(node)
}

fn scalar_entry(node: &AggregateNode, property: &str) -> Result<SqlValue, ConvertError> {
    match node.get(property) {
        Some(NodeValue::Value(v)) => Ok(v.clone()),
        Some(_) => Err(ConvertError::KindMismatch {
            property: property.to_string(),
            expected: "scalar",
        }),
        None => Err(ConvertError::MissingProperty {
            property: property.to_string(),
        }),
    }
}

fn column_value(
    entity: &PersistentEntity,
    row: &SqlRow,
    column: Option<&str>,
) -> Result<SqlValue, ConvertError> {
    let column = column.expect("column property without column");
    row.get(column)
        .cloned()
        .ok_or_else(|| ConvertError::MissingColumn {
            table: entity.table().qualified(),
            column: column.to_string(),
        })
}

/// Match a value against a declared scalar type. `Null` always passes;
/// integers widen from booleans and reals widen from integers; everything
/// else is strict.
pub(crate) fn coerce(
    context: &str,
    declared: ScalarType,
    value: SqlValue,
) -> Result<SqlValue, ConvertError> {
    let found = value.type_name();
    let coerced = match (declared, value) {
        (_, SqlValue::Null) => Some(SqlValue::Null),
        (ScalarType::Bool, SqlValue::Bool(v)) => Some(SqlValue::Bool(v)),
        (ScalarType::Bool, SqlValue::Int(v)) => Some(SqlValue::Bool(v != 0)),
        (ScalarType::Int, SqlValue::Int(v)) => Some(SqlValue::Int(v)),
        (ScalarType::Int, SqlValue::Bool(v)) => Some(SqlValue::Int(v as i64)),
        (ScalarType::Real, SqlValue::Real(v)) => Some(SqlValue::Real(v)),
        (ScalarType::Real, SqlValue::Int(v)) => Some(SqlValue::Real(v as f64)),
        (ScalarType::Text, SqlValue::Text(v)) => Some(SqlValue::Text(v)),
        (ScalarType::Bytes, SqlValue::Bytes(v)) => Some(SqlValue::Bytes(v)),
        _ => None,
    };
    coerced.ok_or_else(|| ConvertError::TypeMismatch {
        context: context.to_string(),
        expected: scalar_name(declared),
        found,
    })
}

fn coerce_array(
    context: &str,
    element: ScalarType,
    value: SqlValue,
) -> Result<SqlValue, ConvertError> {
    match value {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Array(items) => {
            let items = items
                .into_iter()
                .map(|item| coerce(context, element, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SqlValue::Array(items))
        }
        other => Err(ConvertError::TypeMismatch {
            context: context.to_string(),
            expected: "ARRAY",
            found: other.type_name(),
        }),
    }
}

fn scalar_name(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Bool => "BOOL",
        ScalarType::Int => "INT",
        ScalarType::Real => "REAL",
        ScalarType::Text => "TEXT",
        ScalarType::Bytes => "BYTES",
    }
}
