//! Core mapping layer for Relata: declarative entity schemas resolved into
//! an immutable persistence model.
//!
//! Types declare their shape once ([`EntityDef`] via the [`Entity`] trait);
//! a [`MappingContext`] resolves the reachable graph into
//! [`PersistentEntity`] models and the ordered [`PersistentPropertyPath`]
//! list that drives every multi-table save, load, and delete.

pub mod entity;
pub mod error;
pub mod mapping;
pub mod naming;
pub mod node;
pub mod path;
pub mod row;
pub mod schema;
pub mod value;

pub use entity::Entity;
pub use error::{ConvertError, MappingError};
pub use mapping::{
    AggregateModel, Association, AssociationKind, MappingContext, PersistentEntity,
    PersistentProperty, PropertyKind, TableId,
};
pub use naming::{DefaultNaming, NamingStrategy};
pub use node::{AggregateNode, NodeValue};
pub use path::{
    AnchorStep, ParentLink, PathSegment, PersistentPropertyPath, QualifierColumn, QualifierKind,
};
pub use schema::{EntityDef, EntityRef, PropertyDef, PropertyKindDef, ScalarType};
pub use value::{SqlRow, SqlValue};

pub mod prelude {
    //! Re-exports of the most commonly used mapping types.
    pub use crate::{
        AggregateNode, Entity, EntityDef, EntityRef, MappingContext, ScalarType, SqlRow, SqlValue,
    };
}
