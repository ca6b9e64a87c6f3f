use std::any::TypeId;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// The scalar types a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    Int,
    Real,
    Text,
    Bytes,
}

/// A reference to another entity type, resolvable without global
/// registration: the referenced type supplies its own definition through a
/// plain function pointer.
#[derive(Clone, Copy)]
pub struct EntityRef {
    type_id: TypeId,
    fetch: fn() -> EntityDef,
}

impl EntityRef {
    pub fn of<T: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            fetch: T::definition,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn definition(&self) -> EntityDef {
        (self.fetch)()
    }
}

impl std::fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("type_id", &self.type_id)
            .finish()
    }
}

/// The kind of one declared property.
#[derive(Debug, Clone)]
pub enum PropertyKindDef {
    /// The identity property. At most one per entity, 64-bit integer.
    Id,
    Scalar(ScalarType),
    /// An ordered collection of scalars, stored in one array column.
    ScalarList(ScalarType),
    /// An unordered collection of scalars, stored in one array column.
    ScalarSet(ScalarType),
    /// A single nested entity (its own table, one row per parent).
    One(EntityRef),
    /// An ordered collection of nested entities (position preserved).
    List(EntityRef),
    /// An unordered collection of nested entities.
    Set(EntityRef),
    /// A map of scalar key to nested entity.
    Map(ScalarType, EntityRef),
}

/// One declared property of an entity.
///
/// For scalar properties the explicit column override names the property's
/// own column. For entity-valued properties it names the back-reference
/// column in the child table, which is how two same-typed single references
/// on one parent stay distinguishable.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: &'static str,
    pub column: Option<&'static str>,
    pub key_column: Option<&'static str>,
    pub kind: PropertyKindDef,
}

/// The declarative schema of one entity type.
///
/// Built fluently:
///
/// ```ignore
/// EntityDef::new::<ListParent>("ListParent")
///     .id("id").column("id4")
///     .text("name")
///     .list("content", EntityRef::of::<ElementNoId>())
/// ```
#[derive(Debug, Clone)]
pub struct EntityDef {
    name: &'static str,
    type_id: TypeId,
    table: Option<&'static str>,
    properties: Vec<PropertyDef>,
}

impl EntityDef {
    pub fn new<T: Entity>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            table: None,
            properties: Vec::new(),
        }
    }

    /// Override the table name (the schema still comes from the naming
    /// strategy).
    pub fn table(mut self, table: &'static str) -> Self {
        self.table = table.into();
        self
    }

    fn push(mut self, name: &'static str, kind: PropertyKindDef) -> Self {
        self.properties.push(PropertyDef {
            name,
            column: None,
            key_column: None,
            kind,
        });
        self
    }

    /// Declare the identity property.
    pub fn id(self, name: &'static str) -> Self {
        self.push(name, PropertyKindDef::Id)
    }

    pub fn scalar(self, name: &'static str, scalar: ScalarType) -> Self {
        self.push(name, PropertyKindDef::Scalar(scalar))
    }

    pub fn text(self, name: &'static str) -> Self {
        self.scalar(name, ScalarType::Text)
    }

    pub fn integer(self, name: &'static str) -> Self {
        self.scalar(name, ScalarType::Int)
    }

    pub fn real(self, name: &'static str) -> Self {
        self.scalar(name, ScalarType::Real)
    }

    pub fn boolean(self, name: &'static str) -> Self {
        self.scalar(name, ScalarType::Bool)
    }

    pub fn bytes(self, name: &'static str) -> Self {
        self.scalar(name, ScalarType::Bytes)
    }

    pub fn scalar_list(self, name: &'static str, element: ScalarType) -> Self {
        self.push(name, PropertyKindDef::ScalarList(element))
    }

    pub fn scalar_set(self, name: &'static str, element: ScalarType) -> Self {
        self.push(name, PropertyKindDef::ScalarSet(element))
    }

    pub fn one(self, name: &'static str, entity: EntityRef) -> Self {
        self.push(name, PropertyKindDef::One(entity))
    }

    pub fn list(self, name: &'static str, entity: EntityRef) -> Self {
        self.push(name, PropertyKindDef::List(entity))
    }

    pub fn set(self, name: &'static str, entity: EntityRef) -> Self {
        self.push(name, PropertyKindDef::Set(entity))
    }

    pub fn map(self, name: &'static str, key: ScalarType, entity: EntityRef) -> Self {
        self.push(name, PropertyKindDef::Map(key, entity))
    }

    /// Apply an explicit column override to the most recently declared
    /// property.
    pub fn column(mut self, column: &'static str) -> Self {
        if let Some(last) = self.properties.last_mut() {
            last.column = Some(column);
        }
        self
    }

    /// Apply an explicit qualifier-column override to the most recently
    /// declared collection or map property.
    pub fn key_column(mut self, column: &'static str) -> Self {
        if let Some(last) = self.properties.last_mut() {
            last.key_column = Some(column);
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn table_override(&self) -> Option<&'static str> {
        self.table
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }
}
