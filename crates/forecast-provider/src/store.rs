//! SQLite-backed weather table.
//!
//! `WeatherStore` owns the connection and exposes table-scoped
//! query/insert/update/delete in the selection-plus-arguments convention:
//! `selection` is a SQL boolean expression with `?` placeholders and
//! `selection_args` binds them in order.

use rusqlite::{params_from_iter, Connection};
use std::path::Path;

use crate::contract::columns;
use crate::cursor::Cursor;
use crate::error::{ProviderError, ProviderResult};
use crate::values::{ContentValues, Value};

/// Exclusive owner of the weather database.
pub struct WeatherStore {
    conn: Connection,
}

impl WeatherStore {
    /// Open (or create) the database at `path`, creating the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> ProviderResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!("Opened weather database at {}", path.display());
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> ProviderResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> ProviderResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                location TEXT,
                condition TEXT,
                min_temp REAL,
                max_temp REAL,
                humidity REAL,
                pressure REAL,
                wind_speed REAL,
                degrees REAL
            );

            CREATE INDEX IF NOT EXISTS idx_weather_date ON weather(date);
            "#,
        )?;
        Ok(())
    }

    /// Release the connection.
    pub fn close(self) -> ProviderResult<()> {
        self.conn.close().map_err(|(_, e)| ProviderError::from(e))?;
        tracing::info!("Closed weather database");
        Ok(())
    }

    /// Select rows. `None` projection means every column.
    pub fn query(
        &self,
        projection: Option<&[&str]>,
        selection: Option<&str>,
        selection_args: &[Value],
        sort_order: Option<&str>,
    ) -> ProviderResult<Cursor> {
        let column_list = match projection {
            Some(cols) if !cols.is_empty() => {
                let quoted = cols
                    .iter()
                    .map(|c| quote_identifier(c))
                    .collect::<ProviderResult<Vec<_>>>()?;
                quoted.join(", ")
            }
            _ => "*".to_string(),
        };

        let mut sql = format!("SELECT {} FROM {}", column_list, columns::TABLE_NAME);
        push_where(&mut sql, selection);
        if let Some(order) = non_blank(sort_order) {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        tracing::debug!("query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = names.len();

        let rows = stmt
            .query_map(params_from_iter(selection_args.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Cursor::new(names, rows))
    }

    /// Insert one row, returning the new row identifier.
    pub fn insert(&self, values: &ContentValues) -> ProviderResult<i64> {
        let sql = insert_sql(values)?;
        self.conn
            .execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;

        let id = self.conn.last_insert_rowid();
        if id <= 0 {
            return Err(ProviderError::storage(format!(
                "Failed to insert row into {}",
                columns::TABLE_NAME
            )));
        }
        tracing::debug!("Inserted weather row {}", id);
        Ok(id)
    }

    /// Insert all rows in one transaction; nothing is written if any fails.
    pub fn insert_all(&self, rows: &[ContentValues]) -> ProviderResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for values in rows {
            let sql = insert_sql(values)?;
            tx.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        }
        tx.commit()?;
        tracing::debug!("Inserted {} weather rows", rows.len());
        Ok(rows.len())
    }

    /// Update matching rows, returning how many changed.
    pub fn update(
        &self,
        values: &ContentValues,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> ProviderResult<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let assignments = values
            .columns()
            .map(|c| quote_identifier(c).map(|q| format!("{} = ?", q)))
            .collect::<ProviderResult<Vec<_>>>()?;

        let mut sql = format!(
            "UPDATE {} SET {}",
            columns::TABLE_NAME,
            assignments.join(", ")
        );
        push_where(&mut sql, selection);
        tracing::debug!("update: {}", sql);

        let params = values.iter().map(|(_, v)| v).chain(selection_args.iter());
        let count = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(count)
    }

    /// Delete matching rows, returning how many were removed.
    pub fn delete(&self, selection: Option<&str>, selection_args: &[Value]) -> ProviderResult<usize> {
        let mut sql = format!("DELETE FROM {}", columns::TABLE_NAME);
        push_where(&mut sql, selection);
        tracing::debug!("delete: {}", sql);

        let count = self
            .conn
            .execute(&sql, params_from_iter(selection_args.iter()))?;
        Ok(count)
    }

    /// Row count, for diagnostics.
    pub fn count(&self) -> ProviderResult<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", columns::TABLE_NAME),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn insert_sql(values: &ContentValues) -> ProviderResult<String> {
    if values.is_empty() {
        return Ok(format!("INSERT INTO {} DEFAULT VALUES", columns::TABLE_NAME));
    }
    let names = values
        .columns()
        .map(quote_identifier)
        .collect::<ProviderResult<Vec<_>>>()?;
    let placeholders = vec!["?"; names.len()].join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        columns::TABLE_NAME,
        names.join(", "),
        placeholders
    ))
}

fn push_where(sql: &mut String, selection: Option<&str>) {
    if let Some(selection) = non_blank(selection) {
        sql.push_str(" WHERE ");
        sql.push_str(selection);
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Quote a column name, rejecting anything that is not a plain identifier.
fn quote_identifier(name: &str) -> ProviderResult<String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ProviderError::invalid(format!("Invalid column name: {:?}", name)));
    }
    Ok(format!("\"{}\"", name))
}
