//! Database layer
//!
//! This module provides database abstraction for the TechMatch marketplace.
//! It supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Usage
//!
//! ```ignore
//! use techmatch::config::DatabaseConfig;
//! use techmatch::db::{create_pool, DatabasePool, migrations};
//!
//! // Create pool from configuration
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//!
//! // Run migrations
//! migrations::run_migrations(&pool).await?;
//!
//! // Use the pool
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
