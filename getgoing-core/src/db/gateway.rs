//! Persistence gateway
//!
//! [`Database`] owns at most one SQLite connection. It is constructed
//! explicitly, opened with [`Gateway::initialize`], and closed with
//! [`Gateway::shutdown`]. All calls serialize on an internal mutex and
//! round-trip to the file; there is no read cache and no retry.

use super::schema;
use crate::error::{Error, Result};
use rusqlite::types::{FromSql, Value};
use rusqlite::{params_from_iter, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One write statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Outcome of a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteResult {
    /// Rows inserted, updated or deleted
    pub changes: usize,
    /// Rowid of the inserted row, for inserts that changed something
    pub last_insert_id: Option<i64>,
}

/// Maps one result row to a value.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Single-column row, for `COUNT(*)` and similar projections.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar<T>(pub T);

impl<T: FromSql> FromRow for Scalar<T> {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        row.get(0).map(Scalar)
    }
}

/// The four-operation storage contract plus lifecycle.
pub trait Gateway {
    /// Open the store if it is not open yet. Idempotent.
    fn initialize(&self) -> Result<()>;

    fn is_initialized(&self) -> bool;

    /// Run a read statement and map every row.
    fn query<T: FromRow>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>>;

    /// Run one write statement.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult>;

    /// Run every statement or none of them.
    fn transact(&self, statements: &[Statement]) -> Result<()>;

    /// Close the store. Later calls fail with [`Error::NotInitialized`].
    fn shutdown(&self) -> Result<()>;
}

/// SQLite-backed gateway.
pub struct Database {
    /// `None` for an in-memory database
    path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// A gateway for the database file at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            conn: Mutex::new(None),
        }
    }

    /// A gateway over a private in-memory database (for testing).
    ///
    /// Shutting it down discards its contents.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            conn: Mutex::new(None),
        }
    }

    /// Construct and initialize in one step.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db = Self::new(path);
        db.initialize()?;
        Ok(db)
    }

    /// Construct and initialize an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::in_memory();
        db.initialize()?;
        Ok(db)
    }

    /// Database file path, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn display_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(":memory:"))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        // A panic while holding the lock leaves the connection itself usable.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open_connection(&self) -> rusqlite::Result<Connection> {
        let conn = match &self.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        schema::apply(&conn)?;
        Ok(conn)
    }

    /// Run `f` inside one transaction on the open connection.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. Used by the
    /// repository for read-modify-write sequences.
    pub fn with_transaction<R>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.lock();
        let conn = guard.as_mut().ok_or(Error::NotInitialized)?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Current `PRAGMA user_version` of the open database.
    pub fn schema_version(&self) -> Result<i32> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(Error::NotInitialized)?;
        schema::schema_version(conn)
    }
}

/// True for `INSERT`/`REPLACE` statements, including ones behind a `WITH` clause.
fn is_insert(sql: &str) -> bool {
    let is_write = |word: &str| {
        word.eq_ignore_ascii_case("insert") || word.eq_ignore_ascii_case("replace")
    };
    let mut words = sql
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|w| !w.is_empty());
    match words.next() {
        Some(first) if first.eq_ignore_ascii_case("with") => words.any(is_write),
        Some(first) => is_write(first),
        None => false,
    }
}

impl Gateway for Database {
    fn initialize(&self) -> Result<()> {
        let mut guard = self.lock();
        if guard.is_some() {
            return Ok(());
        }

        let path = self.display_path();
        if let Some(parent) = self.path.as_deref().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                if let Err(source) = std::fs::create_dir_all(parent) {
                    tracing::error!(
                        path = %path.display(),
                        error = %source,
                        "Failed to create database directory"
                    );
                    return Err(Error::Initialization {
                        path,
                        source: source.into(),
                    });
                }
            }
        }

        match self.open_connection() {
            Ok(conn) => {
                tracing::info!(path = %path.display(), "Database initialized");
                *guard = Some(conn);
                Ok(())
            }
            Err(source) => {
                tracing::error!(
                    path = %path.display(),
                    error = %source,
                    "Database initialization failed"
                );
                Err(Error::Initialization {
                    path,
                    source: source.into(),
                })
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    fn query<T: FromRow>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(Error::NotInitialized)?;

        let run = || -> rusqlite::Result<Vec<T>> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), T::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        };

        run().map_err(|source| {
            tracing::error!(sql, error = %source, "Query execution failed");
            Error::Query {
                sql: sql.to_string(),
                params: params.to_vec(),
                source,
            }
        })
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(Error::NotInitialized)?;

        match conn.execute(sql, params_from_iter(params.iter())) {
            Ok(changes) => Ok(ExecuteResult {
                changes,
                last_insert_id: (changes > 0 && is_insert(sql))
                    .then(|| conn.last_insert_rowid()),
            }),
            Err(source) => {
                tracing::error!(sql, error = %source, "Update execution failed");
                Err(Error::Execution {
                    sql: sql.to_string(),
                    params: params.to_vec(),
                    source,
                })
            }
        }
    }

    fn transact(&self, statements: &[Statement]) -> Result<()> {
        let mut guard = self.lock();
        let conn = guard.as_mut().ok_or(Error::NotInitialized)?;

        // Dropping the transaction without commit rolls it back.
        let tx = conn.transaction()?;
        for (index, statement) in statements.iter().enumerate() {
            let params = params_from_iter(statement.params.iter());
            if let Err(source) = tx.execute(&statement.sql, params) {
                tracing::error!(
                    index,
                    sql = %statement.sql,
                    error = %source,
                    "Transaction execution failed, rolling back"
                );
                return Err(Error::Transaction {
                    index,
                    sql: statement.sql.clone(),
                    source,
                });
            }
        }
        tx.commit()?;

        tracing::debug!(statements = statements.len(), "Transaction committed");
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        let mut guard = self.lock();
        if let Some(conn) = guard.take() {
            if let Err((conn, source)) = conn.close() {
                tracing::error!(error = %source, "Database close failed");
                *guard = Some(conn);
                return Err(Error::Database(source));
            }
            tracing::info!(path = %self.display_path().display(), "Database closed");
        }
        Ok(())
    }
}
