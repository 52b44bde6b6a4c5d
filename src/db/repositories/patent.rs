//! Patent repository
//!
//! Database operations for patent listings.
//!
//! This module provides:
//! - `PatentRepository` trait defining the interface for listing data access
//! - `SqlxPatentRepository` implementing the trait for SQLite and MySQL
//!
//! Listing queries come in three scopes (public, mine, all) plus the admin
//! projection joined with owner account details. Category and status equality
//! filters are applied here; free-text search is applied by the service layer
//! after the fetch.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    ApprovalStatus, CreatePatentInput, ListScope, Patent, PatentFilter, PatentStatus,
    PatentWithOwner,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Patent repository trait
#[async_trait]
pub trait PatentRepository: Send + Sync {
    /// Insert a new listing in pending review state
    async fn create(
        &self,
        input: &CreatePatentInput,
        owner_id: i64,
        owner_name: &str,
    ) -> Result<Patent>;

    /// Get a listing by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Patent>>;

    /// List listings for a scope with optional category/status filters,
    /// newest first
    async fn list(&self, scope: ListScope, filter: &PatentFilter) -> Result<Vec<Patent>>;

    /// List listings strictly owned by the given user, newest first
    async fn list_owned(&self, owner_id: i64) -> Result<Vec<Patent>>;

    /// List listings joined with owner account details, optionally restricted
    /// to one review state, newest first
    async fn list_with_owner(
        &self,
        approval: Option<ApprovalStatus>,
    ) -> Result<Vec<PatentWithOwner>>;

    /// Overwrite the mutable fields of a listing and return the stored row.
    /// approval_status, image and ownership are never touched here.
    async fn update(&self, patent: &Patent) -> Result<Patent>;

    /// Set the review state unconditionally; returns the number of rows
    /// affected (0 when the id does not exist)
    async fn set_approval(&self, id: i64, status: ApprovalStatus) -> Result<u64>;

    /// Delete a listing
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based patent repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxPatentRepository {
    pool: DynDatabasePool,
}

impl SqlxPatentRepository {
    /// Create a new SQLx patent repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PatentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PatentRepository for SqlxPatentRepository {
    async fn create(
        &self,
        input: &CreatePatentInput,
        owner_id: i64,
        owner_name: &str,
    ) -> Result<Patent> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_patent_sqlite(self.pool.as_sqlite().unwrap(), input, owner_id, owner_name)
                    .await
            }
            DatabaseDriver::Mysql => {
                create_patent_mysql(self.pool.as_mysql().unwrap(), input, owner_id, owner_name)
                    .await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Patent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_patent_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_patent_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn list(&self, scope: ListScope, filter: &PatentFilter) -> Result<Vec<Patent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_patents_sqlite(self.pool.as_sqlite().unwrap(), scope, filter).await
            }
            DatabaseDriver::Mysql => {
                list_patents_mysql(self.pool.as_mysql().unwrap(), scope, filter).await
            }
        }
    }

    async fn list_owned(&self, owner_id: i64) -> Result<Vec<Patent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_owned_sqlite(self.pool.as_sqlite().unwrap(), owner_id).await
            }
            DatabaseDriver::Mysql => {
                list_owned_mysql(self.pool.as_mysql().unwrap(), owner_id).await
            }
        }
    }

    async fn list_with_owner(
        &self,
        approval: Option<ApprovalStatus>,
    ) -> Result<Vec<PatentWithOwner>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_with_owner_sqlite(self.pool.as_sqlite().unwrap(), approval).await
            }
            DatabaseDriver::Mysql => {
                list_with_owner_mysql(self.pool.as_mysql().unwrap(), approval).await
            }
        }
    }

    async fn update(&self, patent: &Patent) -> Result<Patent> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_patent_sqlite(self.pool.as_sqlite().unwrap(), patent).await
            }
            DatabaseDriver::Mysql => {
                update_patent_mysql(self.pool.as_mysql().unwrap(), patent).await
            }
        }
    }

    async fn set_approval(&self, id: i64, status: ApprovalStatus) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_approval_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                set_approval_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_patent_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_patent_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const PATENT_COLUMNS_SQLITE: &str = "id, title, description, problem, usage, advantage, category, \
     patent_number, price, status, approval_status, image, owner_id, owner_name, created_at";

// `usage` is a reserved word in MySQL
const PATENT_COLUMNS_MYSQL: &str = "id, title, description, problem, `usage`, advantage, category, \
     patent_number, price, status, approval_status, image, owner_id, owner_name, created_at";

/// Append scope and filter clauses to a listing query.
///
/// Returns the SQL; binds must be applied in the same order by the caller:
/// the caller id for `Mine`, then category, then status.
fn build_list_sql(columns: &str, scope: ListScope, filter: &PatentFilter) -> String {
    let mut sql = format!("SELECT {} FROM patents", columns);
    let mut clauses: Vec<String> = Vec::new();

    match scope {
        ListScope::Public => clauses.push("approval_status = 'approved'".to_string()),
        ListScope::Mine(_) => clauses.push("(owner_id = ? OR owner_id IS NULL)".to_string()),
        ListScope::All => {}
    }
    if filter.category_filter().is_some() {
        clauses.push("category = ?".to_string());
    }
    if filter.status_filter().is_some() {
        clauses.push("status = ?".to_string());
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");
    sql
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_patent_sqlite(
    pool: &SqlitePool,
    input: &CreatePatentInput,
    owner_id: i64,
    owner_name: &str,
) -> Result<Patent> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO patents (title, description, problem, usage, advantage, category,
                             patent_number, price, status, approval_status, image,
                             owner_id, owner_name, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'available', 'pending', ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.problem)
    .bind(&input.usage)
    .bind(&input.advantage)
    .bind(&input.category)
    .bind(&input.patent_number)
    .bind(input.price)
    .bind(&input.image)
    .bind(owner_id)
    .bind(owner_name)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create patent")?;

    let id = result.last_insert_rowid();

    Ok(Patent {
        id,
        title: input.title.clone(),
        description: input.description.clone(),
        problem: input.problem.clone(),
        usage: input.usage.clone(),
        advantage: input.advantage.clone(),
        category: input.category.clone(),
        patent_number: input.patent_number.clone(),
        price: input.price,
        status: PatentStatus::Available,
        approval_status: ApprovalStatus::Pending,
        image: input.image.clone(),
        owner_id: Some(owner_id),
        owner_name: Some(owner_name.to_string()),
        created_at: now,
    })
}

async fn get_patent_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Patent>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM patents WHERE id = ?",
        PATENT_COLUMNS_SQLITE
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get patent by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_patent_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_patents_sqlite(
    pool: &SqlitePool,
    scope: ListScope,
    filter: &PatentFilter,
) -> Result<Vec<Patent>> {
    let sql = build_list_sql(PATENT_COLUMNS_SQLITE, scope, filter);

    let mut query = sqlx::query(&sql);
    if let ListScope::Mine(user_id) = scope {
        query = query.bind(user_id);
    }
    if let Some(category) = filter.category_filter() {
        query = query.bind(category.to_string());
    }
    if let Some(status) = filter.status_filter() {
        query = query.bind(status.to_string());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list patents")?;

    let mut patents = Vec::new();
    for row in rows {
        patents.push(row_to_patent_sqlite(&row)?);
    }

    Ok(patents)
}

async fn list_owned_sqlite(pool: &SqlitePool, owner_id: i64) -> Result<Vec<Patent>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM patents WHERE owner_id = ? ORDER BY created_at DESC",
        PATENT_COLUMNS_SQLITE
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("Failed to list owned patents")?;

    let mut patents = Vec::new();
    for row in rows {
        patents.push(row_to_patent_sqlite(&row)?);
    }

    Ok(patents)
}

async fn list_with_owner_sqlite(
    pool: &SqlitePool,
    approval: Option<ApprovalStatus>,
) -> Result<Vec<PatentWithOwner>> {
    let mut sql = String::from(
        "SELECT p.id, p.title, p.description, p.problem, p.usage, p.advantage, p.category, \
         p.patent_number, p.price, p.status, p.approval_status, p.image, p.owner_id, \
         p.owner_name, p.created_at, \
         u.name AS account_name, u.email AS owner_email, u.organization AS owner_organization \
         FROM patents p LEFT JOIN users u ON p.owner_id = u.id",
    );
    if approval.is_some() {
        sql.push_str(" WHERE p.approval_status = ?");
    }
    sql.push_str(" ORDER BY p.created_at DESC");

    let mut query = sqlx::query(&sql);
    if let Some(status) = approval {
        query = query.bind(status.to_string());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list patents with owner")?;

    let mut patents = Vec::new();
    for row in rows {
        let mut patent = row_to_patent_sqlite(&row)?;
        let account_name: Option<String> = row.get("account_name");
        let owner_email: Option<String> = row.get("owner_email");
        let owner_organization: Option<String> = row.get("owner_organization");

        patent.owner_name = Some(resolve_owner_display(account_name, owner_email.as_deref()));

        patents.push(PatentWithOwner {
            patent,
            owner_email,
            owner_organization,
        });
    }

    Ok(patents)
}

async fn update_patent_sqlite(pool: &SqlitePool, patent: &Patent) -> Result<Patent> {
    let status_str = patent.status.to_string();

    sqlx::query(
        r#"
        UPDATE patents
        SET title = ?, description = ?, problem = ?, usage = ?, advantage = ?,
            category = ?, patent_number = ?, price = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(&patent.title)
    .bind(&patent.description)
    .bind(&patent.problem)
    .bind(&patent.usage)
    .bind(&patent.advantage)
    .bind(&patent.category)
    .bind(&patent.patent_number)
    .bind(patent.price)
    .bind(&status_str)
    .bind(patent.id)
    .execute(pool)
    .await
    .context("Failed to update patent")?;

    get_patent_by_id_sqlite(pool, patent.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Patent not found after update"))
}

async fn set_approval_sqlite(pool: &SqlitePool, id: i64, status: ApprovalStatus) -> Result<u64> {
    let result = sqlx::query("UPDATE patents SET approval_status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set approval status")?;

    Ok(result.rows_affected())
}

async fn delete_patent_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM patents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete patent")?;

    Ok(())
}

fn row_to_patent_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Patent> {
    let status_str: String = row.get("status");
    let status = PatentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid patent status in database: {}", status_str))?;

    let approval_str: String = row.get("approval_status");
    let approval_status = ApprovalStatus::from_str(&approval_str)
        .with_context(|| format!("Invalid approval status in database: {}", approval_str))?;

    Ok(Patent {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        problem: row.get("problem"),
        usage: row.get("usage"),
        advantage: row.get("advantage"),
        category: row.get("category"),
        patent_number: row.get("patent_number"),
        price: row.get("price"),
        status,
        approval_status,
        image: row.get("image"),
        owner_id: row.get("owner_id"),
        owner_name: row.get("owner_name"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_patent_mysql(
    pool: &MySqlPool,
    input: &CreatePatentInput,
    owner_id: i64,
    owner_name: &str,
) -> Result<Patent> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO patents (title, description, problem, `usage`, advantage, category,
                             patent_number, price, status, approval_status, image,
                             owner_id, owner_name, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'available', 'pending', ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.problem)
    .bind(&input.usage)
    .bind(&input.advantage)
    .bind(&input.category)
    .bind(&input.patent_number)
    .bind(input.price)
    .bind(&input.image)
    .bind(owner_id)
    .bind(owner_name)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create patent")?;

    let id = result.last_insert_id() as i64;

    Ok(Patent {
        id,
        title: input.title.clone(),
        description: input.description.clone(),
        problem: input.problem.clone(),
        usage: input.usage.clone(),
        advantage: input.advantage.clone(),
        category: input.category.clone(),
        patent_number: input.patent_number.clone(),
        price: input.price,
        status: PatentStatus::Available,
        approval_status: ApprovalStatus::Pending,
        image: input.image.clone(),
        owner_id: Some(owner_id),
        owner_name: Some(owner_name.to_string()),
        created_at: now,
    })
}

async fn get_patent_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Patent>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM patents WHERE id = ?",
        PATENT_COLUMNS_MYSQL
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get patent by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_patent_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_patents_mysql(
    pool: &MySqlPool,
    scope: ListScope,
    filter: &PatentFilter,
) -> Result<Vec<Patent>> {
    let sql = build_list_sql(PATENT_COLUMNS_MYSQL, scope, filter);

    let mut query = sqlx::query(&sql);
    if let ListScope::Mine(user_id) = scope {
        query = query.bind(user_id);
    }
    if let Some(category) = filter.category_filter() {
        query = query.bind(category.to_string());
    }
    if let Some(status) = filter.status_filter() {
        query = query.bind(status.to_string());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list patents")?;

    let mut patents = Vec::new();
    for row in rows {
        patents.push(row_to_patent_mysql(&row)?);
    }

    Ok(patents)
}

async fn list_owned_mysql(pool: &MySqlPool, owner_id: i64) -> Result<Vec<Patent>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM patents WHERE owner_id = ? ORDER BY created_at DESC",
        PATENT_COLUMNS_MYSQL
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("Failed to list owned patents")?;

    let mut patents = Vec::new();
    for row in rows {
        patents.push(row_to_patent_mysql(&row)?);
    }

    Ok(patents)
}

async fn list_with_owner_mysql(
    pool: &MySqlPool,
    approval: Option<ApprovalStatus>,
) -> Result<Vec<PatentWithOwner>> {
    let mut sql = String::from(
        "SELECT p.id, p.title, p.description, p.problem, p.`usage`, p.advantage, p.category, \
         p.patent_number, p.price, p.status, p.approval_status, p.image, p.owner_id, \
         p.owner_name, p.created_at, \
         u.name AS account_name, u.email AS owner_email, u.organization AS owner_organization \
         FROM patents p LEFT JOIN users u ON p.owner_id = u.id",
    );
    if approval.is_some() {
        sql.push_str(" WHERE p.approval_status = ?");
    }
    sql.push_str(" ORDER BY p.created_at DESC");

    let mut query = sqlx::query(&sql);
    if let Some(status) = approval {
        query = query.bind(status.to_string());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list patents with owner")?;

    let mut patents = Vec::new();
    for row in rows {
        let mut patent = row_to_patent_mysql(&row)?;
        let account_name: Option<String> = row.get("account_name");
        let owner_email: Option<String> = row.get("owner_email");
        let owner_organization: Option<String> = row.get("owner_organization");

        patent.owner_name = Some(resolve_owner_display(account_name, owner_email.as_deref()));

        patents.push(PatentWithOwner {
            patent,
            owner_email,
            owner_organization,
        });
    }

    Ok(patents)
}

async fn update_patent_mysql(pool: &MySqlPool, patent: &Patent) -> Result<Patent> {
    let status_str = patent.status.to_string();

    sqlx::query(
        r#"
        UPDATE patents
        SET title = ?, description = ?, problem = ?, `usage` = ?, advantage = ?,
            category = ?, patent_number = ?, price = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(&patent.title)
    .bind(&patent.description)
    .bind(&patent.problem)
    .bind(&patent.usage)
    .bind(&patent.advantage)
    .bind(&patent.category)
    .bind(&patent.patent_number)
    .bind(patent.price)
    .bind(&status_str)
    .bind(patent.id)
    .execute(pool)
    .await
    .context("Failed to update patent")?;

    get_patent_by_id_mysql(pool, patent.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Patent not found after update"))
}

async fn set_approval_mysql(pool: &MySqlPool, id: i64, status: ApprovalStatus) -> Result<u64> {
    let result = sqlx::query("UPDATE patents SET approval_status = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set approval status")?;

    Ok(result.rows_affected())
}

async fn delete_patent_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM patents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete patent")?;

    Ok(())
}

fn row_to_patent_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Patent> {
    let status_str: String = row.get("status");
    let status = PatentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid patent status in database: {}", status_str))?;

    let approval_str: String = row.get("approval_status");
    let approval_status = ApprovalStatus::from_str(&approval_str)
        .with_context(|| format!("Invalid approval status in database: {}", approval_str))?;

    Ok(Patent {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        problem: row.get("problem"),
        usage: row.get("usage"),
        advantage: row.get("advantage"),
        category: row.get("category"),
        patent_number: row.get("patent_number"),
        price: row.get("price"),
        status,
        approval_status,
        image: row.get("image"),
        owner_id: row.get("owner_id"),
        owner_name: row.get("owner_name"),
        created_at: row.get("created_at"),
    })
}

/// Owner display name for admin views: account name, falling back to the
/// account email, then a fixed label when the owning account is gone.
fn resolve_owner_display(account_name: Option<String>, account_email: Option<&str>) -> String {
    match account_email {
        Some(email) => account_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.to_string()),
        None => "不明".to_string(),
    }
}
