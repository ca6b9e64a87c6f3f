use crate::value::SqlValue;

/// Errors raised while resolving an entity graph into a persistent model.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingError {
    /// An entity declares more than one identity property.
    DuplicateId { entity: String },
    /// Two properties of one entity resolve to the same column.
    DuplicateColumn { entity: String, column: String },
    /// The entity graph contains a reference cycle; aggregates are trees.
    CyclicReference { entity: String },
    /// The aggregate root does not declare an identity property.
    MissingIdentity { entity: String },
    /// Two sibling references target the same child table with the same
    /// back-reference column; give one of them an explicit column override.
    AmbiguousReference { entity: String, table: String },
    /// An identity-less entity reached through an unordered collection
    /// declares nested entities; no qualifier exists to address them.
    SetNesting { entity: String },
    /// Map keys must be integer or text scalars.
    UnsupportedKeyType { entity: String, property: String },
    /// An identifier produced by the naming strategy is not a valid SQL
    /// identifier.
    InvalidIdentifier { name: String },
}

impl std::fmt::Display for MappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingError::DuplicateId { entity } => {
                write!(f, "entity {entity} declares more than one identity property")
            }
            MappingError::DuplicateColumn { entity, column } => {
                write!(f, "entity {entity} maps column {column} more than once")
            }
            MappingError::CyclicReference { entity } => {
                write!(f, "entity {entity} is part of a reference cycle")
            }
            MappingError::MissingIdentity { entity } => {
                write!(f, "aggregate root {entity} has no identity property")
            }
            MappingError::AmbiguousReference { entity, table } => {
                write!(
                    f,
                    "entity {entity} references table {table} through more than one \
                     property with the same back-reference column"
                )
            }
            MappingError::SetNesting { entity } => {
                write!(
                    f,
                    "identity-less entity {entity} is reached through an unordered \
                     collection and cannot declare nested entities"
                )
            }
            MappingError::UnsupportedKeyType { entity, property } => {
                write!(f, "map property {entity}.{property} must use an integer or text key")
            }
            MappingError::InvalidIdentifier { name } => {
                write!(f, "invalid SQL identifier: {name}")
            }
        }
    }
}

impl std::error::Error for MappingError {}

/// Errors raised while converting between rows, nodes, and typed entities.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// A node entry expected by the schema is missing.
    MissingProperty { property: String },
    /// A node entry exists but holds the wrong kind of value.
    KindMismatch { property: String, expected: &'static str },
    /// A column expected by the schema is missing from a row.
    MissingColumn { table: String, column: String },
    /// A value does not match the property's declared scalar type.
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },
    /// An ordered collection came back with a gap or repetition in its
    /// position column.
    InvalidPosition {
        property: String,
        expected: usize,
        found: SqlValue,
    },
    /// A second row arrived for a single-valued reference.
    DuplicateElement { property: String },
    /// A child row references a parent element that was never loaded.
    OrphanRow { table: String },
}

impl ConvertError {
    pub(crate) fn value_mismatch(expected: &'static str, found: &SqlValue) -> Self {
        ConvertError::TypeMismatch {
            context: String::new(),
            expected,
            found: found.type_name(),
        }
    }
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::MissingProperty { property } => {
                write!(f, "missing property: {property}")
            }
            ConvertError::KindMismatch { property, expected } => {
                write!(f, "property {property} does not hold a {expected} value")
            }
            ConvertError::MissingColumn { table, column } => {
                write!(f, "row from {table} is missing column {column}")
            }
            ConvertError::TypeMismatch {
                context,
                expected,
                found,
            } => {
                if context.is_empty() {
                    write!(f, "expected {expected}, found {found}")
                } else {
                    write!(f, "{context}: expected {expected}, found {found}")
                }
            }
            ConvertError::InvalidPosition {
                property,
                expected,
                found,
            } => {
                write!(
                    f,
                    "ordered collection {property} expected position {expected}, found {found:?}"
                )
            }
            ConvertError::DuplicateElement { property } => {
                write!(f, "more than one row for single-valued reference {property}")
            }
            ConvertError::OrphanRow { table } => {
                write!(f, "row in {table} references a parent element that does not exist")
            }
        }
    }
}

impl std::error::Error for ConvertError {}
