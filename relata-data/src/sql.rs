use relata_core::{PersistentPropertyPath, TableId};

/// SQL dialect, controlling placeholder style and identifier quoting.
#[derive(Debug, Clone, Copy, Default)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    #[default]
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }
}

/// Renders the parameterized statements the engine issues, one table per
/// statement. Identifiers are validated at mapping time, so rendering only
/// quotes them; tables are schema-qualified whenever the naming strategy
/// supplied a schema.
///
/// Bind order always follows the rendered placeholder order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlGenerator {
    dialect: Dialect,
}

impl SqlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn ident(&self, name: &str) -> String {
        let quote = self.dialect.quote_char();
        format!("{quote}{name}{quote}")
    }

    fn table(&self, table: &TableId) -> String {
        match table.schema() {
            Some(schema) => format!("{}.{}", self.ident(schema), self.ident(table.name())),
            None => self.ident(table.name()),
        }
    }

    fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `INSERT INTO t (c1, ..) VALUES (?, ..)`; binds follow `columns`.
    pub fn insert(&self, table: &TableId, columns: &[&str]) -> String {
        let placeholders = (1..=columns.len())
            .map(|i| self.dialect.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(table),
            self.column_list(columns),
            placeholders
        )
    }

    /// `UPDATE t SET c1 = ?, .. WHERE id = ?`; binds are the set values
    /// followed by the id.
    pub fn update_by_id(&self, table: &TableId, columns: &[&str], id_column: &str) -> String {
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", self.ident(c), self.dialect.placeholder(i + 1)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table(table),
            assignments,
            self.ident(id_column),
            self.dialect.placeholder(columns.len() + 1)
        )
    }

    /// `SELECT c1, .. FROM t WHERE w = ?`; binds one value.
    pub fn select_by_column(&self, table: &TableId, columns: &[&str], where_column: &str) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = {}",
            self.column_list(columns),
            self.table(table),
            self.ident(where_column),
            self.dialect.placeholder(1)
        )
    }

    /// `SELECT c1, .. FROM t WHERE back_ref = ? ORDER BY q1, ..`; binds the
    /// anchor id. Ordering by the qualifier columns makes ordered
    /// collections come back in insertion order.
    pub fn select_by_parent(
        &self,
        table: &TableId,
        columns: &[&str],
        back_ref: &str,
        order: &[&str],
    ) -> String {
        let mut sql = self.select_by_column(table, columns, back_ref);
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.column_list(order));
        }
        sql
    }

    /// `DELETE FROM t WHERE id = ?`; binds one value.
    pub fn delete_by_id(&self, table: &TableId, id_column: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            self.table(table),
            self.ident(id_column),
            self.dialect.placeholder(1)
        )
    }

    /// Delete every row of the path's table belonging to one aggregate,
    /// binding the root id once. Intermediate identity-bearing ancestors
    /// are resolved with nested sub-selects, so a single statement covers
    /// arbitrarily deep paths.
    pub fn delete_by_parent(&self, path: &PersistentPropertyPath) -> String {
        let link = path.link().expect("delete_by_parent on the root path");
        let mut condition = format!("= {}", self.dialect.placeholder(1));
        for anchor in path.anchors().iter().rev() {
            condition = format!(
                "IN (SELECT {} FROM {} WHERE {} {})",
                self.ident(&anchor.id_column),
                self.table(&anchor.table),
                self.ident(&anchor.back_ref_column),
                condition
            );
        }
        format!(
            "DELETE FROM {} WHERE {} {}",
            self.table(path.table()),
            self.ident(&link.back_ref_column),
            condition
        )
    }

    /// `SELECT COUNT(*) FROM t`.
    pub fn count(&self, table: &TableId) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table(table))
    }

    /// `SELECT COUNT(*) FROM t WHERE id = ?`; binds one value.
    pub fn exists_by_id(&self, table: &TableId, id_column: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {} = {}",
            self.table(table),
            self.ident(id_column),
            self.dialect.placeholder(1)
        )
    }
}
