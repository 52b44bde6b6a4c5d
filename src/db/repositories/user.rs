//! User repository
//!
//! Database operations for marketplace accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await
            }
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, name, role, organization, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(&role_str)
    .bind(&user.organization)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    Ok(User {
        id,
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        name: user.name.clone(),
        role: user.role,
        organization: user.organization.clone(),
        created_at: now,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, name, role, organization, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, name, role, organization, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        role,
        organization: row.get("organization"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let role_str = user.role.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, name, role, organization, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(&role_str)
    .bind(&user.organization)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;

    Ok(User {
        id,
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        name: user.name.clone(),
        role: user.role,
        organization: user.organization.clone(),
        created_at: now,
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, name, role, organization, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, name, role, organization, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        role,
        organization: row.get("organization"),
        created_at: row.get("created_at"),
    })
}
