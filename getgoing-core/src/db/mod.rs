//! Database layer for getgoing
//!
//! This module provides the local relational store using SQLite with:
//! - A static, idempotent schema with foreign-key policies
//! - The [`Gateway`] contract and its SQLite and mock implementations
//! - Repository methods for every entity

pub mod gateway;
pub mod mock;
pub mod repo;
pub mod schema;

pub use gateway::{Database, ExecuteResult, FromRow, Gateway, Scalar, Statement};
pub use mock::MockDatabase;
pub use repo::{require_goal, require_habit};
