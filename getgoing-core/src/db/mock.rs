//! No-op gateway for environments without a working SQLite build
//!
//! Same contract as [`Database`](super::Database), no persistence: reads come
//! back empty and writes report one changed row.

use super::gateway::{ExecuteResult, FromRow, Gateway, Statement};
use crate::error::{Error, Result};
use rusqlite::types::Value;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct MockDatabase {
    initialized: AtomicBool,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }
}

impl Gateway for MockDatabase {
    fn initialize(&self) -> Result<()> {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            tracing::info!("Mock database initialized");
        }
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn query<T: FromRow>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        self.ensure_initialized()?;
        tracing::debug!(sql, params = ?params, "Mock query executed");
        Ok(Vec::new())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult> {
        self.ensure_initialized()?;
        tracing::debug!(sql, params = ?params, "Mock update executed");
        Ok(ExecuteResult {
            changes: 1,
            last_insert_id: Some(1),
        })
    }

    fn transact(&self, statements: &[Statement]) -> Result<()> {
        self.ensure_initialized()?;
        tracing::debug!(statements = statements.len(), "Mock transaction executed");
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.initialized.store(false, Ordering::SeqCst);
        Ok(())
    }
}
