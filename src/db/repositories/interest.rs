//! Interest repository
//!
//! Database operations for expressions of interest.
//!
//! This module provides:
//! - `InterestRepository` trait defining the interface for interest data access
//! - `SqlxInterestRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Interest, InterestStatus, InterestWithPatent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Interest repository trait
#[async_trait]
pub trait InterestRepository: Send + Sync {
    /// Insert a new interest
    async fn create(&self, interest: &Interest) -> Result<Interest>;

    /// Interests filed by a buyer, newest first
    async fn list_by_buyer(&self, buyer_id: i64) -> Result<Vec<Interest>>;

    /// Interests filed by a buyer joined with listing title/category/price,
    /// newest first
    async fn list_by_buyer_with_patents(&self, buyer_id: i64) -> Result<Vec<InterestWithPatent>>;

    /// Interests against one listing, newest first
    async fn list_by_patent(&self, patent_id: i64) -> Result<Vec<Interest>>;

    /// Interests against any of the given listings, newest first.
    /// An empty id set yields an empty result without touching the store.
    async fn list_by_patents(&self, patent_ids: &[i64]) -> Result<Vec<Interest>>;
}

/// SQLx-based interest repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxInterestRepository {
    pool: DynDatabasePool,
}

impl SqlxInterestRepository {
    /// Create a new SQLx interest repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InterestRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InterestRepository for SqlxInterestRepository {
    async fn create(&self, interest: &Interest) -> Result<Interest> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_interest_sqlite(self.pool.as_sqlite().unwrap(), interest).await
            }
            DatabaseDriver::Mysql => {
                create_interest_mysql(self.pool.as_mysql().unwrap(), interest).await
            }
        }
    }

    async fn list_by_buyer(&self, buyer_id: i64) -> Result<Vec<Interest>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_buyer_sqlite(self.pool.as_sqlite().unwrap(), buyer_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_buyer_mysql(self.pool.as_mysql().unwrap(), buyer_id).await
            }
        }
    }

    async fn list_by_buyer_with_patents(&self, buyer_id: i64) -> Result<Vec<InterestWithPatent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_buyer_with_patents_sqlite(self.pool.as_sqlite().unwrap(), buyer_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_buyer_with_patents_mysql(self.pool.as_mysql().unwrap(), buyer_id).await
            }
        }
    }

    async fn list_by_patent(&self, patent_id: i64) -> Result<Vec<Interest>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_patent_sqlite(self.pool.as_sqlite().unwrap(), patent_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_patent_mysql(self.pool.as_mysql().unwrap(), patent_id).await
            }
        }
    }

    async fn list_by_patents(&self, patent_ids: &[i64]) -> Result<Vec<Interest>> {
        if patent_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_patents_sqlite(self.pool.as_sqlite().unwrap(), patent_ids).await
            }
            DatabaseDriver::Mysql => {
                list_by_patents_mysql(self.pool.as_mysql().unwrap(), patent_ids).await
            }
        }
    }
}

const INTEREST_COLUMNS: &str =
    "id, patent_id, buyer_id, buyer_name, buyer_email, message, status, created_at";

fn in_clause_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_interest_sqlite(pool: &SqlitePool, interest: &Interest) -> Result<Interest> {
    let now = Utc::now();
    let status_str = interest.status.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO interests (patent_id, buyer_id, buyer_name, buyer_email, message, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(interest.patent_id)
    .bind(interest.buyer_id)
    .bind(&interest.buyer_name)
    .bind(&interest.buyer_email)
    .bind(&interest.message)
    .bind(&status_str)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create interest")?;

    let id = result.last_insert_rowid();

    Ok(Interest {
        id,
        patent_id: interest.patent_id,
        buyer_id: interest.buyer_id,
        buyer_name: interest.buyer_name.clone(),
        buyer_email: interest.buyer_email.clone(),
        message: interest.message.clone(),
        status: interest.status,
        created_at: now,
    })
}

async fn list_by_buyer_sqlite(pool: &SqlitePool, buyer_id: i64) -> Result<Vec<Interest>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM interests WHERE buyer_id = ? ORDER BY created_at DESC",
        INTEREST_COLUMNS
    ))
    .bind(buyer_id)
    .fetch_all(pool)
    .await
    .context("Failed to list interests by buyer")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(row_to_interest_sqlite(&row)?);
    }

    Ok(interests)
}

async fn list_by_buyer_with_patents_sqlite(
    pool: &SqlitePool,
    buyer_id: i64,
) -> Result<Vec<InterestWithPatent>> {
    let rows = sqlx::query(
        r#"
        SELECT i.id, i.patent_id, i.buyer_id, i.buyer_name, i.buyer_email, i.message,
               i.status, i.created_at,
               p.title AS patent_title, p.category AS patent_category, p.price AS patent_price
        FROM interests i
        LEFT JOIN patents p ON i.patent_id = p.id
        WHERE i.buyer_id = ?
        ORDER BY i.created_at DESC
        "#,
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await
    .context("Failed to list interests with patents")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(InterestWithPatent {
            interest: row_to_interest_sqlite(&row)?,
            patent_title: row.get("patent_title"),
            patent_category: row.get("patent_category"),
            patent_price: row.get("patent_price"),
        });
    }

    Ok(interests)
}

async fn list_by_patent_sqlite(pool: &SqlitePool, patent_id: i64) -> Result<Vec<Interest>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM interests WHERE patent_id = ? ORDER BY created_at DESC",
        INTEREST_COLUMNS
    ))
    .bind(patent_id)
    .fetch_all(pool)
    .await
    .context("Failed to list interests by patent")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(row_to_interest_sqlite(&row)?);
    }

    Ok(interests)
}

async fn list_by_patents_sqlite(pool: &SqlitePool, patent_ids: &[i64]) -> Result<Vec<Interest>> {
    let sql = format!(
        "SELECT {} FROM interests WHERE patent_id IN ({}) ORDER BY created_at DESC",
        INTEREST_COLUMNS,
        in_clause_placeholders(patent_ids.len())
    );

    let mut query = sqlx::query(&sql);
    for id in patent_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list interests by patent set")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(row_to_interest_sqlite(&row)?);
    }

    Ok(interests)
}

fn row_to_interest_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Interest> {
    let status_str: String = row.get("status");
    let status = InterestStatus::from_str(&status_str)
        .with_context(|| format!("Invalid interest status in database: {}", status_str))?;

    Ok(Interest {
        id: row.get("id"),
        patent_id: row.get("patent_id"),
        buyer_id: row.get("buyer_id"),
        buyer_name: row.get("buyer_name"),
        buyer_email: row.get("buyer_email"),
        message: row.get("message"),
        status,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_interest_mysql(pool: &MySqlPool, interest: &Interest) -> Result<Interest> {
    let now = Utc::now();
    let status_str = interest.status.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO interests (patent_id, buyer_id, buyer_name, buyer_email, message, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(interest.patent_id)
    .bind(interest.buyer_id)
    .bind(&interest.buyer_name)
    .bind(&interest.buyer_email)
    .bind(&interest.message)
    .bind(&status_str)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create interest")?;

    let id = result.last_insert_id() as i64;

    Ok(Interest {
        id,
        patent_id: interest.patent_id,
        buyer_id: interest.buyer_id,
        buyer_name: interest.buyer_name.clone(),
        buyer_email: interest.buyer_email.clone(),
        message: interest.message.clone(),
        status: interest.status,
        created_at: now,
    })
}

async fn list_by_buyer_mysql(pool: &MySqlPool, buyer_id: i64) -> Result<Vec<Interest>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM interests WHERE buyer_id = ? ORDER BY created_at DESC",
        INTEREST_COLUMNS
    ))
    .bind(buyer_id)
    .fetch_all(pool)
    .await
    .context("Failed to list interests by buyer")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(row_to_interest_mysql(&row)?);
    }

    Ok(interests)
}

async fn list_by_buyer_with_patents_mysql(
    pool: &MySqlPool,
    buyer_id: i64,
) -> Result<Vec<InterestWithPatent>> {
    let rows = sqlx::query(
        r#"
        SELECT i.id, i.patent_id, i.buyer_id, i.buyer_name, i.buyer_email, i.message,
               i.status, i.created_at,
               p.title AS patent_title, p.category AS patent_category, p.price AS patent_price
        FROM interests i
        LEFT JOIN patents p ON i.patent_id = p.id
        WHERE i.buyer_id = ?
        ORDER BY i.created_at DESC
        "#,
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await
    .context("Failed to list interests with patents")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(InterestWithPatent {
            interest: row_to_interest_mysql(&row)?,
            patent_title: row.get("patent_title"),
            patent_category: row.get("patent_category"),
            patent_price: row.get("patent_price"),
        });
    }

    Ok(interests)
}

async fn list_by_patent_mysql(pool: &MySqlPool, patent_id: i64) -> Result<Vec<Interest>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM interests WHERE patent_id = ? ORDER BY created_at DESC",
        INTEREST_COLUMNS
    ))
    .bind(patent_id)
    .fetch_all(pool)
    .await
    .context("Failed to list interests by patent")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(row_to_interest_mysql(&row)?);
    }

    Ok(interests)
}

async fn list_by_patents_mysql(pool: &MySqlPool, patent_ids: &[i64]) -> Result<Vec<Interest>> {
    let sql = format!(
        "SELECT {} FROM interests WHERE patent_id IN ({}) ORDER BY created_at DESC",
        INTEREST_COLUMNS,
        in_clause_placeholders(patent_ids.len())
    );

    let mut query = sqlx::query(&sql);
    for id in patent_ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list interests by patent set")?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(row_to_interest_mysql(&row)?);
    }

    Ok(interests)
}

fn row_to_interest_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Interest> {
    let status_str: String = row.get("status");
    let status = InterestStatus::from_str(&status_str)
        .with_context(|| format!("Invalid interest status in database: {}", status_str))?;

    Ok(Interest {
        id: row.get("id"),
        patent_id: row.get("patent_id"),
        buyer_id: row.get("buyer_id"),
        buyer_name: row.get("buyer_name"),
        buyer_email: row.get("buyer_email"),
        message: row.get("message"),
        status,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::patent::{PatentRepository, SqlxPatentRepository};
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreatePatentInput, User, UserRole};
    use crate::services::credential::hash_password;

    struct TestContext {
        interests: SqlxInterestRepository,
        patents: SqlxPatentRepository,
        users: SqlxUserRepository,
    }

    async fn setup() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        TestContext {
            interests: SqlxInterestRepository::new(pool.clone()),
            patents: SqlxPatentRepository::new(pool.clone()),
            users: SqlxUserRepository::new(pool),
        }
    }

    async fn create_user(ctx: &TestContext, email: &str, name: &str) -> User {
        ctx.users
            .create(&User::new(
                email.to_string(),
                hash_password("test_password").expect("Failed to hash password"),
                name.to_string(),
                UserRole::Buyer,
                None,
            ))
            .await
            .expect("Failed to create user")
    }

    async fn create_patent(ctx: &TestContext, owner: &User, title: &str) -> i64 {
        let input = CreatePatentInput {
            title: title.to_string(),
            description: None,
            problem: None,
            usage: None,
            advantage: None,
            category: Some("材料".to_string()),
            patent_number: None,
            price: 100000.0,
            image: None,
        };
        ctx.patents
            .create(&input, owner.id, &owner.name)
            .await
            .expect("Failed to create patent")
            .id
    }

    fn new_interest(patent_id: i64, buyer: &User, message: &str) -> Interest {
        Interest {
            id: 0,
            patent_id,
            buyer_id: buyer.id,
            buyer_name: Some(buyer.name.clone()),
            buyer_email: Some(buyer.email.clone()),
            message: Some(message.to_string()),
            status: InterestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_interest() {
        let ctx = setup().await;
        let seller = create_user(&ctx, "seller@example.com", "売り手").await;
        let buyer = create_user(&ctx, "buyer@example.com", "買い手").await;
        let patent_id = create_patent(&ctx, &seller, "耐熱コーティング").await;

        let created = ctx
            .interests
            .create(&new_interest(patent_id, &buyer, "詳細を教えてください"))
            .await
            .expect("Failed to create interest");

        assert!(created.id > 0);
        assert_eq!(created.patent_id, patent_id);
        assert_eq!(created.buyer_id, buyer.id);
        assert_eq!(created.buyer_name.as_deref(), Some("買い手"));
        assert_eq!(created.status, InterestStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_by_buyer() {
        let ctx = setup().await;
        let seller = create_user(&ctx, "seller@example.com", "売り手").await;
        let buyer = create_user(&ctx, "buyer@example.com", "買い手").await;
        let other = create_user(&ctx, "other@example.com", "別の買い手").await;
        let patent_id = create_patent(&ctx, &seller, "耐熱コーティング").await;

        ctx.interests
            .create(&new_interest(patent_id, &buyer, "一件目"))
            .await
            .expect("Failed to create interest");
        ctx.interests
            .create(&new_interest(patent_id, &other, "他人の興味"))
            .await
            .expect("Failed to create interest");

        let mine = ctx
            .interests
            .list_by_buyer(buyer.id)
            .await
            .expect("Failed to list");

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].message.as_deref(), Some("一件目"));
    }

    #[tokio::test]
    async fn test_list_by_buyer_with_patents() {
        let ctx = setup().await;
        let seller = create_user(&ctx, "seller@example.com", "売り手").await;
        let buyer = create_user(&ctx, "buyer@example.com", "買い手").await;
        let patent_id = create_patent(&ctx, &seller, "耐熱コーティング").await;

        ctx.interests
            .create(&new_interest(patent_id, &buyer, "興味があります"))
            .await
            .expect("Failed to create interest");

        let joined = ctx
            .interests
            .list_by_buyer_with_patents(buyer.id)
            .await
            .expect("Failed to list");

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].patent_title.as_deref(), Some("耐熱コーティング"));
        assert_eq!(joined[0].patent_category.as_deref(), Some("材料"));
        assert_eq!(joined[0].patent_price, Some(100000.0));
    }

    #[tokio::test]
    async fn test_list_by_patent() {
        let ctx = setup().await;
        let seller = create_user(&ctx, "seller@example.com", "売り手").await;
        let buyer = create_user(&ctx, "buyer@example.com", "買い手").await;
        let first = create_patent(&ctx, &seller, "特許A").await;
        let second = create_patent(&ctx, &seller, "特許B").await;

        ctx.interests
            .create(&new_interest(first, &buyer, "Aへの興味"))
            .await
            .expect("Failed to create interest");
        ctx.interests
            .create(&new_interest(second, &buyer, "Bへの興味"))
            .await
            .expect("Failed to create interest");

        let for_first = ctx
            .interests
            .list_by_patent(first)
            .await
            .expect("Failed to list");

        assert_eq!(for_first.len(), 1);
        assert_eq!(for_first[0].message.as_deref(), Some("Aへの興味"));
    }

    #[tokio::test]
    async fn test_list_by_patents_set() {
        let ctx = setup().await;
        let seller = create_user(&ctx, "seller@example.com", "売り手").await;
        let buyer = create_user(&ctx, "buyer@example.com", "買い手").await;
        let first = create_patent(&ctx, &seller, "特許A").await;
        let second = create_patent(&ctx, &seller, "特許B").await;
        let third = create_patent(&ctx, &seller, "特許C").await;

        for (patent_id, message) in [(first, "A"), (second, "B"), (third, "C")] {
            ctx.interests
                .create(&new_interest(patent_id, &buyer, message))
                .await
                .expect("Failed to create interest");
        }

        let subset = ctx
            .interests
            .list_by_patents(&[first, third])
            .await
            .expect("Failed to list");

        assert_eq!(subset.len(), 2);
        let messages: Vec<&str> = subset
            .iter()
            .filter_map(|i| i.message.as_deref())
            .collect();
        assert!(messages.contains(&"A"));
        assert!(messages.contains(&"C"));
    }

    #[tokio::test]
    async fn test_list_by_patents_empty_set() {
        let ctx = setup().await;

        let interests = ctx
            .interests
            .list_by_patents(&[])
            .await
            .expect("Failed to list");

        assert!(interests.is_empty());
    }

    #[tokio::test]
    async fn test_interest_requires_existing_patent() {
        let ctx = setup().await;
        let buyer = create_user(&ctx, "buyer@example.com", "買い手").await;

        let result = ctx
            .interests
            .create(&new_interest(999, &buyer, "存在しない特許へ"))
            .await;

        assert!(result.is_err(), "FK constraint should reject missing patent");
    }
}
