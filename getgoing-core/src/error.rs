//! Error types for getgoing-core

use rusqlite::types::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Why [`Error::Initialization`] happened
#[derive(Error, Debug)]
pub enum InitializationSource {
    /// The database directory could not be created
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// SQLite refused to open the file or apply the schema
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Main error type for the getgoing-core library
#[derive(Error, Debug)]
pub enum Error {
    /// The database file could not be opened or the schema could not be applied
    #[error("failed to initialize database at {}: {source}", path.display())]
    Initialization {
        path: PathBuf,
        source: InitializationSource,
    },

    /// A read statement failed
    #[error("query failed: {source} (sql: {sql}, params: {params:?})")]
    Query {
        sql: String,
        params: Vec<Value>,
        source: rusqlite::Error,
    },

    /// A write statement failed (constraint violation, malformed SQL)
    #[error("statement failed: {source} (sql: {sql}, params: {params:?})")]
    Execution {
        sql: String,
        params: Vec<Value>,
        source: rusqlite::Error,
    },

    /// A transaction was rolled back because one of its statements failed
    #[error("transaction rolled back at statement {index}: {source} (sql: {sql})")]
    Transaction {
        index: usize,
        sql: String,
        source: rusqlite::Error,
    },

    /// Operation attempted before `initialize()` or after `shutdown()`
    #[error("database not initialized")]
    NotInitialized,

    /// A serialized list column did not decode
    #[error("invalid {field} list: {message}")]
    Codec { field: &'static str, message: String },

    /// A stored enum column holds an unknown value
    #[error("invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// User input rejected before reaching the store
    #[error("validation failed: {0}")]
    Validation(String),

    /// Navigation gate asked to move along an edge it does not have
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Entity lookup by id found nothing
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Database error outside the gateway primitives
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for constraint violations (foreign key, unique, not null).
    pub fn is_constraint_violation(&self) -> bool {
        let source = match self {
            Error::Execution { source, .. }
            | Error::Transaction { source, .. }
            | Error::Database(source) => source,
            _ => return false,
        };
        matches!(
            source,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

/// Result type alias for getgoing-core
pub type Result<T> = std::result::Result<T, Error>;
