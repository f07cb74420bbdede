use std::path::Path;

use rusqlite::Connection;

use crate::errors::{DsnLinksError, Result};

/// The embedded SQL schema applied when initializing a new database.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// SQLite database holding a host application graph.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Creates a new database at `db_path`, creating parent directories if needed.
    pub fn initialize(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DsnLinksError::Database {
                message: format!("failed to create database directory: {e}"),
                operation: "initialize".to_string(),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| DsnLinksError::Database {
            message: format!("failed to open database: {e}"),
            operation: "initialize".to_string(),
        })?;

        Self::setup(conn, "initialize")
    }

    /// Opens an existing database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(DsnLinksError::Database {
                message: format!("no database at '{}'", db_path.display()),
                operation: "open".to_string(),
            });
        }

        let conn = Connection::open(db_path).map_err(|e| DsnLinksError::Database {
            message: format!("failed to open database: {e}"),
            operation: "open".to_string(),
        })?;

        Self::apply_pragmas(&conn)?;
        Ok(Self { conn })
    }

    /// Creates a private in-memory database with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DsnLinksError::Database {
            message: format!("failed to open in-memory database: {e}"),
            operation: "in_memory".to_string(),
        })?;

        Self::setup(conn, "in_memory")
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn setup(conn: Connection, operation: &str) -> Result<Self> {
        Self::apply_pragmas(&conn)?;

        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| DsnLinksError::Database {
                message: format!("failed to apply schema: {e}"),
                operation: operation.to_string(),
            })?;

        Ok(Self { conn })
    }

    fn apply_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 120000;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(|e| DsnLinksError::Database {
            message: format!("failed to apply pragmas: {e}"),
            operation: "apply_pragmas".to_string(),
        })
    }
}
