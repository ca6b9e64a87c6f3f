use std::future::Future;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};
use tokio::sync::Mutex;

use relata_core::{
    PersistentEntity, PersistentPropertyPath, PropertyKind, QualifierKind, ScalarType, SqlRow,
    SqlValue,
};
use relata_data::{DataAccessStrategy, DataError, Dialect, ParentRef, SqlGenerator};

/// What a result column decodes to.
#[derive(Debug, Clone)]
enum ColumnType {
    Scalar(ScalarType),
    Array(ScalarType),
}

/// SQLite-backed data access strategy.
///
/// Holds one logical connection behind an async mutex; every operation
/// executes exactly one parameterized statement on it. Scalar-collection
/// columns are stored as JSON text (SQLite has no array type).
#[derive(Clone)]
pub struct SqliteStrategy {
    conn: Arc<Mutex<SqliteConnection>>,
    generator: SqlGenerator,
}

impl SqliteStrategy {
    /// Open a connection, e.g. `sqlite::memory:` or a file URL.
    pub async fn connect(url: &str) -> Result<Self, DataError> {
        let conn = SqliteConnection::connect(url)
            .await
            .map_err(DataError::access)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            generator: SqlGenerator::new(Dialect::Sqlite),
        })
    }

    /// Run one raw statement on the strategy's connection; intended for
    /// schema setup and transaction demarcation around template calls.
    pub async fn execute(&self, sql: &str) -> Result<u64, DataError> {
        let mut conn = self.conn.lock().await;
        let result = sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(DataError::access)?;
        Ok(result.rows_affected())
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: SqlValue,
) -> Result<sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>, DataError> {
    Ok(match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Bytes(v) => query.bind(v),
        SqlValue::Array(items) => query.bind(array_to_json(items)?),
    })
}

/// Arrays are stored as plain JSON arrays of scalars.
fn array_to_json(items: Vec<SqlValue>) -> Result<String, DataError> {
    let values = items
        .into_iter()
        .map(|item| match item {
            SqlValue::Null => Ok(serde_json::Value::Null),
            SqlValue::Bool(v) => Ok(serde_json::Value::Bool(v)),
            SqlValue::Int(v) => Ok(serde_json::Value::from(v)),
            SqlValue::Real(v) => Ok(serde_json::Value::from(v)),
            SqlValue::Text(v) => Ok(serde_json::Value::String(v)),
            other => Err(DataError::State(format!(
                "array element {} cannot be stored as JSON",
                other.type_name()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    serde_json::to_string(&values).map_err(DataError::access)
}

fn json_to_array(text: &str, element: ScalarType) -> Result<SqlValue, DataError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(text).map_err(DataError::access)?;
    let items = values
        .into_iter()
        .map(|value| match (element, value) {
            (_, serde_json::Value::Null) => Ok(SqlValue::Null),
            (ScalarType::Bool, serde_json::Value::Bool(v)) => Ok(SqlValue::Bool(v)),
            (ScalarType::Int, serde_json::Value::Number(n)) => n
                .as_i64()
                .map(SqlValue::Int)
                .ok_or_else(|| DataError::State("non-integer array element".to_string())),
            (ScalarType::Real, serde_json::Value::Number(n)) => n
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| DataError::State("non-numeric array element".to_string())),
            (ScalarType::Text, serde_json::Value::String(v)) => Ok(SqlValue::Text(v)),
            (_, other) => Err(DataError::State(format!(
                "array element {other} does not match the declared element type"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SqlValue::Array(items))
}

/// Result columns of an entity's own table.
fn entity_columns(entity: &PersistentEntity) -> Vec<(String, ColumnType)> {
    entity
        .column_properties()
        .map(|prop| {
            let column = prop.column().expect("column property without column");
            let column_type = match prop.kind() {
                PropertyKind::Id => ColumnType::Scalar(ScalarType::Int),
                PropertyKind::Scalar(scalar) => ColumnType::Scalar(*scalar),
                PropertyKind::Array { element, .. } => ColumnType::Array(*element),
                PropertyKind::Association(_) => unreachable!("association has no column"),
            };
            (column.to_string(), column_type)
        })
        .collect()
}

/// Result columns of a path's table: the entity's own columns plus the
/// path's qualifier columns.
fn path_columns(path: &PersistentPropertyPath) -> Vec<(String, ColumnType)> {
    let mut columns = entity_columns(path.leaf());
    if let Some(link) = path.link() {
        for qualifier in &link.qualifiers {
            let scalar = match &qualifier.kind {
                QualifierKind::Position => ScalarType::Int,
                QualifierKind::Key(key) => *key,
            };
            columns.push((qualifier.column.clone(), ColumnType::Scalar(scalar)));
        }
    }
    columns
}

fn decode_row(row: &SqliteRow, layout: &[(String, ColumnType)]) -> Result<SqlRow, DataError> {
    let mut out = SqlRow::new();
    for (column, column_type) in layout {
        let value = match column_type {
            ColumnType::Scalar(ScalarType::Int) => row
                .try_get::<Option<i64>, _>(column.as_str())
                .map_err(DataError::access)?
                .map_or(SqlValue::Null, SqlValue::Int),
            ColumnType::Scalar(ScalarType::Bool) => row
                .try_get::<Option<bool>, _>(column.as_str())
                .map_err(DataError::access)?
                .map_or(SqlValue::Null, SqlValue::Bool),
            ColumnType::Scalar(ScalarType::Real) => row
                .try_get::<Option<f64>, _>(column.as_str())
                .map_err(DataError::access)?
                .map_or(SqlValue::Null, SqlValue::Real),
            ColumnType::Scalar(ScalarType::Text) => row
                .try_get::<Option<String>, _>(column.as_str())
                .map_err(DataError::access)?
                .map_or(SqlValue::Null, SqlValue::Text),
            ColumnType::Scalar(ScalarType::Bytes) => row
                .try_get::<Option<Vec<u8>>, _>(column.as_str())
                .map_err(DataError::access)?
                .map_or(SqlValue::Null, SqlValue::Bytes),
            ColumnType::Array(element) => {
                match row
                    .try_get::<Option<String>, _>(column.as_str())
                    .map_err(DataError::access)?
                {
                    Some(text) => json_to_array(&text, *element)?,
                    None => SqlValue::Null,
                }
            }
        };
        out.put(column.clone(), value);
    }
    Ok(out)
}

impl DataAccessStrategy for SqliteStrategy {
    fn insert(
        &self,
        path: &PersistentPropertyPath,
        row: SqlRow,
        parent: Option<&ParentRef>,
    ) -> impl Future<Output = Result<Option<SqlValue>, DataError>> + Send {
        let mut full = row;
        if let (Some(link), Some(parent)) = (path.link(), parent) {
            full.put(link.back_ref_column.clone(), parent.anchor.clone());
            for (qualifier, value) in link.qualifiers.iter().zip(&parent.qualifiers) {
                full.put(qualifier.column.clone(), value.clone());
            }
        }
        let key_generated = path.leaf().id_column().is_some_and(|id_column| {
            full.get(id_column).map_or(true, SqlValue::is_null)
        });
        let columns: Vec<&str> = full.column_names().collect();
        let sql = self.generator.insert(path.table(), &columns);
        async move {
            let mut query = sqlx::query(&sql);
            for (_, value) in full.iter() {
                query = bind_value(query, value.clone())?;
            }
            let mut conn = self.conn.lock().await;
            let result = query
                .execute(&mut *conn)
                .await
                .map_err(DataError::access)?;
            Ok(key_generated.then(|| SqlValue::Int(result.last_insert_rowid())))
        }
    }

    fn update(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
        row: SqlRow,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let id_column = entity.id_column().expect("update on identity-less entity");
        let columns: Vec<&str> = row.column_names().collect();
        let sql = self.generator.update_by_id(entity.table(), &columns, id_column);
        let id = id.clone();
        async move {
            let mut query = sqlx::query(&sql);
            for (_, value) in row.iter() {
                query = bind_value(query, value.clone())?;
            }
            query = bind_value(query, id)?;
            let mut conn = self.conn.lock().await;
            let result = query
                .execute(&mut *conn)
                .await
                .map_err(DataError::access)?;
            Ok(result.rows_affected())
        }
    }

    fn select_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<Option<SqlRow>, DataError>> + Send {
        let id_column = entity
            .id_column()
            .expect("select_by_id on identity-less entity");
        let layout = entity_columns(entity);
        let columns: Vec<&str> = layout.iter().map(|(c, _)| c.as_str()).collect();
        let sql = self
            .generator
            .select_by_column(entity.table(), &columns, id_column);
        let id = id.clone();
        async move {
            let query = bind_value(sqlx::query(&sql), id)?;
            let mut conn = self.conn.lock().await;
            let row = query
                .fetch_optional(&mut *conn)
                .await
                .map_err(DataError::access)?;
            row.map(|row| decode_row(&row, &layout)).transpose()
        }
    }

    fn select_by_parent(
        &self,
        path: &PersistentPropertyPath,
        anchor: &SqlValue,
    ) -> impl Future<Output = Result<Vec<SqlRow>, DataError>> + Send {
        let link = path.link().expect("select_by_parent on the root path");
        let layout = path_columns(path);
        let columns: Vec<&str> = layout.iter().map(|(c, _)| c.as_str()).collect();
        let order: Vec<&str> = link.qualifiers.iter().map(|q| q.column.as_str()).collect();
        let sql = self.generator.select_by_parent(
            path.table(),
            &columns,
            &link.back_ref_column,
            &order,
        );
        let anchor = anchor.clone();
        async move {
            let query = bind_value(sqlx::query(&sql), anchor)?;
            let mut conn = self.conn.lock().await;
            let rows = query
                .fetch_all(&mut *conn)
                .await
                .map_err(DataError::access)?;
            rows.iter().map(|row| decode_row(row, &layout)).collect()
        }
    }

    fn delete_by_parent(
        &self,
        path: &PersistentPropertyPath,
        root_id: &SqlValue,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let sql = self.generator.delete_by_parent(path);
        let root_id = root_id.clone();
        async move {
            let query = bind_value(sqlx::query(&sql), root_id)?;
            let mut conn = self.conn.lock().await;
            let result = query
                .execute(&mut *conn)
                .await
                .map_err(DataError::access)?;
            Ok(result.rows_affected())
        }
    }

    fn delete_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let id_column = entity
            .id_column()
            .expect("delete_by_id on identity-less entity");
        let sql = self.generator.delete_by_id(entity.table(), id_column);
        let id = id.clone();
        async move {
            let query = bind_value(sqlx::query(&sql), id)?;
            let mut conn = self.conn.lock().await;
            let result = query
                .execute(&mut *conn)
                .await
                .map_err(DataError::access)?;
            Ok(result.rows_affected())
        }
    }

    fn count(
        &self,
        entity: &PersistentEntity,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let sql = self.generator.count(entity.table());
        async move {
            let mut conn = self.conn.lock().await;
            let count: i64 = sqlx::query_scalar(&sql)
                .fetch_one(&mut *conn)
                .await
                .map_err(DataError::access)?;
            Ok(count as u64)
        }
    }

    fn exists_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<bool, DataError>> + Send {
        let id_column = entity
            .id_column()
            .expect("exists_by_id on identity-less entity");
        let sql = self.generator.exists_by_id(entity.table(), id_column);
        let id = id.clone();
        async move {
            let query = bind_value(sqlx::query(&sql), id)?;
            let mut conn = self.conn.lock().await;
            let row = query
                .fetch_one(&mut *conn)
                .await
                .map_err(DataError::access)?;
            let count: i64 = row.try_get(0).map_err(DataError::access)?;
            Ok(count > 0)
        }
    }
}
