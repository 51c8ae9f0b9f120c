//! Database registry and schema introspection.
//!
//! Databases are SQLite files registered under a short name (the file stem
//! by default). The schema of a database is read from `sqlite_master` and
//! `pragma_table_info` over a read-only connection and rendered as a
//! compact text block for the model prompt.
//!
//! # Example
//!
//! ```no_run
//! use llm_sql_writer::schema::{Databases, collect_schema};
//!
//! # async fn demo() -> llm_sql_writer::error::AppResult<()> {
//! let databases = Databases::from_paths(["fixtures/items.db"])?;
//! let text = collect_schema(&databases, "items").await;
//! assert!(text.starts_with("Database: items"));
//! # Ok(())
//! # }
//! ```

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf}
};

use sqlx::{
    ConnectOptions, Connection, Row, SqliteConnection, sqlite::SqliteConnectOptions
};

use crate::error::{AppResult, config_error, database_error};

const TABLES_QUERY: &str = "SELECT name FROM sqlite_master \
                            WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                            ORDER BY name";

const COLUMNS_QUERY: &str = "SELECT name, type FROM pragma_table_info(?) ORDER BY cid";

/// Named SQLite databases the service may describe to the model.
#[derive(Debug, Clone, Default)]
pub struct Databases {
    entries: BTreeMap<String, PathBuf>
}

impl Databases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register each file under its file stem.
    pub fn from_paths<I, P>(paths: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>
    {
        let mut databases = Self::new();
        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    config_error(format!("Cannot derive database name from '{}'", path.display()))
                })?;
            databases.insert(name, path);
        }
        Ok(databases)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(name.into(), path.into());
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open a read-only connection to a registered database.
    pub async fn connect(&self, name: &str) -> AppResult<SqliteConnection> {
        let path = self
            .path(name)
            .ok_or_else(|| config_error(format!("Unknown database '{}'", name)))?;
        SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .connect()
            .await
            .map_err(|e| database_error(name, e))
    }
}

/// Column name and declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name:      String,
    /// Declared type, empty when the column has none
    pub data_type: String
}

/// A table and its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name:    String,
    pub columns: Vec<ColumnInfo>
}

/// Introspected layout of one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub database: String,
    pub tables:   Vec<TableInfo>
}

impl Schema {
    /// Read all user tables of `database`.
    ///
    /// Fails only when the database cannot be opened or its tables cannot
    /// be listed; a table whose columns cannot be read is kept with an
    /// empty column list.
    pub async fn introspect(databases: &Databases, database: &str) -> AppResult<Self> {
        let mut conn = databases.connect(database).await?;
        let names: Vec<String> = sqlx::query_scalar(TABLES_QUERY)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| database_error(database, e))?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = match table_columns(&mut conn, &name).await {
                Ok(columns) => columns,
                Err(e) => {
                    log::debug!("Skipping columns of {}.{}: {}", database, name, e);
                    Vec::new()
                }
            };
            tables.push(TableInfo {
                name,
                columns
            });
        }
        if let Err(e) = conn.close().await {
            log::debug!("Closing connection to {} failed: {}", database, e);
        }

        Ok(Self {
            database: database.to_string(),
            tables
        })
    }

    /// Render the schema as prompt context.
    ///
    /// ```text
    /// Database: shop
    /// Tables:
    /// - items: id INTEGER, name TEXT
    /// ```
    pub fn to_summary(&self) -> String {
        let mut lines = vec![format!("Database: {}", self.database), String::from("Tables:")];
        for table in &self.tables {
            let columns = table
                .columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("- {}: {}", table.name, columns));
        }
        lines.join("\n")
    }
}

async fn table_columns(
    conn: &mut SqliteConnection,
    table: &str
) -> Result<Vec<ColumnInfo>, sqlx::Error> {
    let rows = sqlx::query(COLUMNS_QUERY)
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(|row| {
            Ok(ColumnInfo {
                name:      row.try_get("name")?,
                data_type: row.try_get("type")?
            })
        })
        .collect()
}

/// Schema text for `database`, or an empty string when it cannot be read.
///
/// Failures are logged at `warn` and otherwise swallowed.
pub async fn collect_schema(databases: &Databases, database: &str) -> String {
    match Schema::introspect(databases, database).await {
        Ok(schema) => schema.to_summary(),
        Err(e) => {
            log::warn!("Schema for '{}' unavailable: {}", database, e);
            String::new()
        }
    }
}
