use std::future::Future;

use relata_core::{PersistentEntity, PersistentPropertyPath, SqlRow, SqlValue};

use crate::error::DataError;

/// How a child row refers to its place in the aggregate: the id of the
/// nearest identity-bearing ancestor plus the qualifier tuple (list
/// positions and map keys) accumulated since that ancestor, in hop order.
///
/// The strategy materializes these into the path's back-reference and
/// qualifier columns; the engine never renders column names itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRef {
    pub anchor: SqlValue,
    pub qualifiers: Vec<SqlValue>,
}

impl ParentRef {
    pub fn new(anchor: SqlValue) -> Self {
        Self {
            anchor,
            qualifiers: Vec::new(),
        }
    }
}

/// The SQL execution gateway the engine composes multi-table operations
/// from. Every operation is scoped to one table, keyed by a path and a
/// parent reference.
///
/// Implementations execute exactly one parameterized statement per call (a
/// nested sub-select still being one statement), never retry, and surface
/// every execution failure as [`DataError::Access`]; atomicity across a
/// multi-statement sequence belongs to the ambient transaction.
pub trait DataAccessStrategy: Send + Sync {
    /// Insert one row of the path's table. `parent` is `None` only for the
    /// root path. Returns the generated key when the path's entity bears
    /// identity and the row did not carry a client-assigned id; `None` for
    /// identity-less tables.
    fn insert(
        &self,
        path: &PersistentPropertyPath,
        row: SqlRow,
        parent: Option<&ParentRef>,
    ) -> impl Future<Output = Result<Option<SqlValue>, DataError>> + Send;

    /// Update one identity-bearing row in place. Returns the number of rows
    /// affected; zero means the row does not exist.
    fn update(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
        row: SqlRow,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    fn select_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<Option<SqlRow>, DataError>> + Send;

    /// All rows of the path's table whose back-reference equals `anchor`,
    /// ordered by the path's qualifier columns ascending. Rows include the
    /// qualifier columns (and the entity's id column where one exists).
    fn select_by_parent(
        &self,
        path: &PersistentPropertyPath,
        anchor: &SqlValue,
    ) -> impl Future<Output = Result<Vec<SqlRow>, DataError>> + Send;

    /// Delete every row of the path's table belonging to the aggregate
    /// rooted at `root_id`, resolving intermediate identity-bearing
    /// ancestors transitively. Idempotent; deleting zero rows is not an
    /// error.
    fn delete_by_parent(
        &self,
        path: &PersistentPropertyPath,
        root_id: &SqlValue,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Delete one identity-bearing row. Idempotent.
    fn delete_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    fn count(
        &self,
        entity: &PersistentEntity,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    fn exists_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<bool, DataError>> + Send;
}
