use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use relata_core::{PersistentEntity, PersistentPropertyPath, SqlRow, SqlValue};
use relata_data::{DataAccessStrategy, DataError, ParentRef};

struct MemTable {
    rows: Vec<SqlRow>,
    next_id: i64,
}

impl Default for MemTable {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

/// In-memory data access strategy.
///
/// Tables are keyed by their qualified name, so a schema-supplying naming
/// strategy is observable through [`MemStrategy::table_names`]. Generated
/// keys are per-table monotonic integers; client-assigned ids bump the
/// counter past themselves.
#[derive(Default)]
pub struct MemStrategy {
    tables: Mutex<HashMap<String, MemTable>>,
}

impl MemStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row count of a table by qualified name; zero for tables never
    /// written.
    pub fn row_count(&self, table: &str) -> u64 {
        self.tables
            .lock()
            .expect("table registry poisoned")
            .get(table)
            .map(|t| t.rows.len() as u64)
            .unwrap_or(0)
    }

    /// Qualified names of every table that has been written, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .lock()
            .expect("table registry poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut HashMap<String, MemTable>) -> R) -> R {
        f(&mut self.tables.lock().expect("table registry poisoned"))
    }
}

fn compare_values(a: Option<&SqlValue>, b: Option<&SqlValue>) -> Ordering {
    match (a, b) {
        (Some(SqlValue::Int(x)), Some(SqlValue::Int(y))) => x.cmp(y),
        (Some(SqlValue::Text(x)), Some(SqlValue::Text(y))) => x.cmp(y),
        (Some(SqlValue::Bool(x)), Some(SqlValue::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

impl DataAccessStrategy for MemStrategy {
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
        let key = path.table().qualified();
        let id_column = path.leaf().id_column().map(str::to_string);
        let generated = self.with_tables(move |tables| {
            let table = tables.entry(key).or_default();
            let generated = match id_column {
                Some(id_column) => match full.get(&id_column) {
                    Some(preset) if !preset.is_null() => {
                        if let SqlValue::Int(v) = preset {
                            table.next_id = table.next_id.max(v + 1);
                        }
                        None
                    }
                    _ => {
                        let id = table.next_id;
                        table.next_id += 1;
                        full.put(id_column, id);
                        Some(SqlValue::Int(id))
                    }
                },
                None => None,
            };
            table.rows.push(full);
            generated
        });
        async move { Ok(generated) }
    }

    fn update(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
        row: SqlRow,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let key = entity.table().qualified();
        let id_column = entity
            .id_column()
            .expect("update on identity-less entity")
            .to_string();
        let id = id.clone();
        let affected = self.with_tables(move |tables| {
            let Some(table) = tables.get_mut(&key) else {
                return 0;
            };
            let mut affected = 0;
            for stored in &mut table.rows {
                if stored.get(&id_column) == Some(&id) {
                    for (column, value) in row.iter() {
                        stored.put(column, value.clone());
                    }
                    affected += 1;
                }
            }
            affected
        });
        async move { Ok(affected) }
    }

    fn select_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<Option<SqlRow>, DataError>> + Send {
        let key = entity.table().qualified();
        let id_column = entity
            .id_column()
            .expect("select_by_id on identity-less entity")
            .to_string();
        let id = id.clone();
        let row = self.with_tables(move |tables| {
            tables.get(&key).and_then(|table| {
                table
                    .rows
                    .iter()
                    .find(|row| row.get(&id_column) == Some(&id))
                    .cloned()
            })
        });
        async move { Ok(row) }
    }

    fn select_by_parent(
        &self,
        path: &PersistentPropertyPath,
        anchor: &SqlValue,
    ) -> impl Future<Output = Result<Vec<SqlRow>, DataError>> + Send {
        let link = path.link().expect("select_by_parent on the root path");
        let key = path.table().qualified();
        let back_ref = link.back_ref_column.clone();
        let qualifiers: Vec<String> = link.qualifiers.iter().map(|q| q.column.clone()).collect();
        let anchor = anchor.clone();
        let rows = self.with_tables(move |tables| {
            let mut rows: Vec<SqlRow> = tables
                .get(&key)
                .map(|table| {
                    table
                        .rows
                        .iter()
                        .filter(|row| row.get(&back_ref) == Some(&anchor))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            rows.sort_by(|a, b| {
                for qualifier in &qualifiers {
                    let ord = compare_values(a.get(qualifier), b.get(qualifier));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
            rows
        });
        async move { Ok(rows) }
    }

    fn delete_by_parent(
        &self,
        path: &PersistentPropertyPath,
        root_id: &SqlValue,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let link = path.link().expect("delete_by_parent on the root path");
        let key = path.table().qualified();
        let back_ref = link.back_ref_column.clone();
        let anchors: Vec<(String, String, String)> = path
            .anchors()
            .iter()
            .map(|a| {
                (
                    a.table.qualified(),
                    a.id_column.clone(),
                    a.back_ref_column.clone(),
                )
            })
            .collect();
        let root_id = root_id.clone();
        let deleted = self.with_tables(move |tables| {
            // Resolve the id set of the nearest identity-bearing ancestor,
            // walking the anchor chain top-down from the root.
            let mut ids = vec![root_id];
            for (table, id_column, back_ref_column) in anchors.iter().rev() {
                let Some(table) = tables.get(table) else {
                    return 0;
                };
                ids = table
                    .rows
                    .iter()
                    .filter(|row| {
                        row.get(back_ref_column)
                            .is_some_and(|v| ids.contains(v))
                    })
                    .filter_map(|row| row.get(id_column).cloned())
                    .collect();
            }
            let Some(table) = tables.get_mut(&key) else {
                return 0;
            };
            let before = table.rows.len();
            table
                .rows
                .retain(|row| !row.get(&back_ref).is_some_and(|v| ids.contains(v)));
            (before - table.rows.len()) as u64
        });
        async move { Ok(deleted) }
    }

    fn delete_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let key = entity.table().qualified();
        let id_column = entity
            .id_column()
            .expect("delete_by_id on identity-less entity")
            .to_string();
        let id = id.clone();
        let deleted = self.with_tables(move |tables| {
            let Some(table) = tables.get_mut(&key) else {
                return 0;
            };
            let before = table.rows.len();
            table.rows.retain(|row| row.get(&id_column) != Some(&id));
            (before - table.rows.len()) as u64
        });
        async move { Ok(deleted) }
    }

    fn count(
        &self,
        entity: &PersistentEntity,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        let count = self.row_count(&entity.table().qualified());
        async move { Ok(count) }
    }

    fn exists_by_id(
        &self,
        entity: &PersistentEntity,
        id: &SqlValue,
    ) -> impl Future<Output = Result<bool, DataError>> + Send {
        let key = entity.table().qualified();
        let id_column = entity
            .id_column()
            .expect("exists_by_id on identity-less entity")
            .to_string();
        let id = id.clone();
        let exists = self.with_tables(move |tables| {
            tables.get(&key).is_some_and(|table| {
                table.rows.iter().any(|row| row.get(&id_column) == Some(&id))
            })
        });
        async move { Ok(exists) }
    }
}
