//! Article repository
//!
//! Database operations for editorial articles (columns and researcher
//! interviews).
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleStatus, ArticleType, CreateArticleInput, UpdateArticleInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article
    async fn create(&self, input: &CreateArticleInput) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// List articles of any status, optionally restricted to one kind,
    /// newest first
    async fn list(&self, article_type: Option<ArticleType>) -> Result<Vec<Article>>;

    /// List published articles of one kind, newest first
    async fn list_published(&self, article_type: ArticleType) -> Result<Vec<Article>>;

    /// Update an article
    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article>;

    /// Delete an article
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based article repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, input: &CreateArticleInput) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_article_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_article_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_article_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_article_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn list(&self, article_type: Option<ArticleType>) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_articles_sqlite(self.pool.as_sqlite().unwrap(), article_type).await
            }
            DatabaseDriver::Mysql => {
                list_articles_mysql(self.pool.as_mysql().unwrap(), article_type).await
            }
        }
    }

    async fn list_published(&self, article_type: ArticleType) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_published_sqlite(self.pool.as_sqlite().unwrap(), article_type).await
            }
            DatabaseDriver::Mysql => {
                list_published_mysql(self.pool.as_mysql().unwrap(), article_type).await
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_article_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_article_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_article_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_article_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, article_type, title, category, author, researcher, affiliation, excerpt, content, image, status, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, input: &CreateArticleInput) -> Result<Article> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO articles (article_type, title, category, author, researcher, affiliation, excerpt, content, image, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.article_type.to_string())
    .bind(&input.title)
    .bind(&input.category)
    .bind(&input.author)
    .bind(&input.researcher)
    .bind(&input.affiliation)
    .bind(&input.excerpt)
    .bind(&input.content)
    .bind(&input.image)
    .bind(status.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    let id = result.last_insert_rowid();

    Ok(Article {
        id,
        article_type: input.article_type,
        title: input.title.clone(),
        category: input.category.clone(),
        author: input.author.clone(),
        researcher: input.researcher.clone(),
        affiliation: input.affiliation.clone(),
        excerpt: input.excerpt.clone(),
        content: input.content.clone(),
        image: input.image.clone(),
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by id")?;

    row.map(|r| row_to_article_sqlite(&r)).transpose()
}

async fn list_articles_sqlite(
    pool: &SqlitePool,
    article_type: Option<ArticleType>,
) -> Result<Vec<Article>> {
    let rows = match article_type {
        Some(kind) => {
            sqlx::query(&format!(
                "SELECT {} FROM articles WHERE article_type = ? ORDER BY created_at DESC",
                ARTICLE_COLUMNS
            ))
            .bind(kind.to_string())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM articles ORDER BY created_at DESC",
                ARTICLE_COLUMNS
            ))
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_sqlite(&row)?);
    }

    Ok(articles)
}

async fn list_published_sqlite(
    pool: &SqlitePool,
    article_type: ArticleType,
) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE article_type = ? AND status = 'published' ORDER BY created_at DESC",
        ARTICLE_COLUMNS
    ))
    .bind(article_type.to_string())
    .fetch_all(pool)
    .await
    .context("Failed to list published articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_sqlite(&row)?);
    }

    Ok(articles)
}

async fn update_article_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<Article> {
    let existing = get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_category = input.category.as_ref().unwrap_or(&existing.category);
    let new_author = input.author.clone().or(existing.author.clone());
    let new_researcher = input.researcher.clone().or(existing.researcher.clone());
    let new_affiliation = input.affiliation.clone().or(existing.affiliation.clone());
    let new_excerpt = input.excerpt.clone().or(existing.excerpt.clone());
    let new_content = input.content.clone().or(existing.content.clone());
    let new_image = input.image.clone().or(existing.image.clone());
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, category = ?, author = ?, researcher = ?, affiliation = ?, excerpt = ?, content = ?, image = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_title)
    .bind(new_category)
    .bind(&new_author)
    .bind(&new_researcher)
    .bind(&new_affiliation)
    .bind(&new_excerpt)
    .bind(&new_content)
    .bind(&new_image)
    .bind(new_status.to_string())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update"))
}

async fn delete_article_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let type_str: String = row.get("article_type");
    let article_type = ArticleType::from_str(&type_str)
        .with_context(|| format!("Invalid article type in database: {}", type_str))?;

    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .with_context(|| format!("Invalid article status in database: {}", status_str))?;

    Ok(Article {
        id: row.get("id"),
        article_type,
        title: row.get("title"),
        category: row.get("category"),
        author: row.get("author"),
        researcher: row.get("researcher"),
        affiliation: row.get("affiliation"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        image: row.get("image"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, input: &CreateArticleInput) -> Result<Article> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO articles (article_type, title, category, author, researcher, affiliation, excerpt, content, image, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.article_type.to_string())
    .bind(&input.title)
    .bind(&input.category)
    .bind(&input.author)
    .bind(&input.researcher)
    .bind(&input.affiliation)
    .bind(&input.excerpt)
    .bind(&input.content)
    .bind(&input.image)
    .bind(status.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    let id = result.last_insert_id() as i64;

    Ok(Article {
        id,
        article_type: input.article_type,
        title: input.title.clone(),
        category: input.category.clone(),
        author: input.author.clone(),
        researcher: input.researcher.clone(),
        affiliation: input.affiliation.clone(),
        excerpt: input.excerpt.clone(),
        content: input.content.clone(),
        image: input.image.clone(),
        status,
        created_at: now,
        updated_at: now,
    })
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE id = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get article by id")?;

    row.map(|r| row_to_article_mysql(&r)).transpose()
}

async fn list_articles_mysql(
    pool: &MySqlPool,
    article_type: Option<ArticleType>,
) -> Result<Vec<Article>> {
    let rows = match article_type {
        Some(kind) => {
            sqlx::query(&format!(
                "SELECT {} FROM articles WHERE article_type = ? ORDER BY created_at DESC",
                ARTICLE_COLUMNS
            ))
            .bind(kind.to_string())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM articles ORDER BY created_at DESC",
                ARTICLE_COLUMNS
            ))
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_mysql(&row)?);
    }

    Ok(articles)
}

async fn list_published_mysql(pool: &MySqlPool, article_type: ArticleType) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE article_type = ? AND status = 'published' ORDER BY created_at DESC",
        ARTICLE_COLUMNS
    ))
    .bind(article_type.to_string())
    .fetch_all(pool)
    .await
    .context("Failed to list published articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_mysql(&row)?);
    }

    Ok(articles)
}

async fn update_article_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<Article> {
    let existing = get_article_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_category = input.category.as_ref().unwrap_or(&existing.category);
    let new_author = input.author.clone().or(existing.author.clone());
    let new_researcher = input.researcher.clone().or(existing.researcher.clone());
    let new_affiliation = input.affiliation.clone().or(existing.affiliation.clone());
    let new_excerpt = input.excerpt.clone().or(existing.excerpt.clone());
    let new_content = input.content.clone().or(existing.content.clone());
    let new_image = input.image.clone().or(existing.image.clone());
    let new_status = input.status.unwrap_or(existing.status);

    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, category = ?, author = ?, researcher = ?, affiliation = ?, excerpt = ?, content = ?, image = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_title)
    .bind(new_category)
    .bind(&new_author)
    .bind(&new_researcher)
    .bind(&new_affiliation)
    .bind(&new_excerpt)
    .bind(&new_content)
    .bind(&new_image)
    .bind(new_status.to_string())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update"))
}

async fn delete_article_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;

    Ok(())
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let type_str: String = row.get("article_type");
    let article_type = ArticleType::from_str(&type_str)
        .with_context(|| format!("Invalid article type in database: {}", type_str))?;

    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .with_context(|| format!("Invalid article status in database: {}", status_str))?;

    Ok(Article {
        id: row.get("id"),
        article_type,
        title: row.get("title"),
        category: row.get("category"),
        author: row.get("author"),
        researcher: row.get("researcher"),
        affiliation: row.get("affiliation"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        image: row.get("image"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
