//! Database migrations module
//!
//! Code-based migrations for the TechMatch marketplace. All migrations are
//! embedded in the binary as SQL strings, with a SQLite and a MySQL variant
//! per step, so a single binary can provision either backend.
//!
//! # Usage
//!
//! ```ignore
//! use techmatch::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the TechMatch marketplace.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create users table
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                name VARCHAR(100) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'buyer',
                organization VARCHAR(255),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                name VARCHAR(100) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'buyer',
                organization VARCHAR(255),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_email ON users(email);
        "#,
    },
    // Migration 2: Create patents table
    // owner_id is nullable: seed listings have no owning account, and
    // deleting a seller keeps the listing visible as ownerless.
    Migration {
        version: 2,
        name: "create_patents",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS patents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                problem TEXT,
                usage TEXT,
                advantage TEXT,
                category VARCHAR(100),
                patent_number VARCHAR(100),
                price REAL NOT NULL DEFAULT 0,
                status VARCHAR(20) NOT NULL DEFAULT 'available',
                approval_status VARCHAR(20) NOT NULL DEFAULT 'pending',
                image VARCHAR(500),
                owner_id INTEGER,
                owner_name VARCHAR(100),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_patents_owner_id ON patents(owner_id);
            CREATE INDEX IF NOT EXISTS idx_patents_approval_status ON patents(approval_status);
            CREATE INDEX IF NOT EXISTS idx_patents_category ON patents(category);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS patents (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                problem TEXT,
                `usage` TEXT,
                advantage TEXT,
                category VARCHAR(100),
                patent_number VARCHAR(100),
                price DOUBLE NOT NULL DEFAULT 0,
                status VARCHAR(20) NOT NULL DEFAULT 'available',
                approval_status VARCHAR(20) NOT NULL DEFAULT 'pending',
                image VARCHAR(500),
                owner_id BIGINT,
                owner_name VARCHAR(100),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_patents_owner_id ON patents(owner_id);
            CREATE INDEX idx_patents_approval_status ON patents(approval_status);
            CREATE INDEX idx_patents_category ON patents(category);
        "#,
    },
    // Migration 3: Create interests table
    // buyer_name and buyer_email are snapshots taken at creation time so the
    // seller view survives later account changes.
    Migration {
        version: 3,
        name: "create_interests",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS interests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                patent_id INTEGER NOT NULL,
                buyer_id INTEGER NOT NULL,
                buyer_name VARCHAR(100),
                buyer_email VARCHAR(255),
                message TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (patent_id) REFERENCES patents(id) ON DELETE CASCADE,
                FOREIGN KEY (buyer_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_interests_patent_id ON interests(patent_id);
            CREATE INDEX IF NOT EXISTS idx_interests_buyer_id ON interests(buyer_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS interests (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                patent_id BIGINT NOT NULL,
                buyer_id BIGINT NOT NULL,
                buyer_name VARCHAR(100),
                buyer_email VARCHAR(255),
                message TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (patent_id) REFERENCES patents(id) ON DELETE CASCADE,
                FOREIGN KEY (buyer_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_interests_patent_id ON interests(patent_id);
            CREATE INDEX idx_interests_buyer_id ON interests(buyer_id);
        "#,
    },
    // Migration 4: Create messages table
    Migration {
        version: 4,
        name: "create_messages",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id INTEGER NOT NULL,
                receiver_id INTEGER NOT NULL,
                patent_id INTEGER,
                subject VARCHAR(255),
                content TEXT,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (receiver_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (patent_id) REFERENCES patents(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_sender_id ON messages(sender_id);
            CREATE INDEX IF NOT EXISTS idx_messages_receiver_id ON messages(receiver_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS messages (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                sender_id BIGINT NOT NULL,
                receiver_id BIGINT NOT NULL,
                patent_id BIGINT,
                subject VARCHAR(255),
                content TEXT,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (receiver_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (patent_id) REFERENCES patents(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_messages_sender_id ON messages(sender_id);
            CREATE INDEX idx_messages_receiver_id ON messages(receiver_id);
        "#,
    },
    // Migration 5: Create articles table
    Migration {
        version: 5,
        name: "create_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_type VARCHAR(20) NOT NULL,
                title VARCHAR(255) NOT NULL,
                category VARCHAR(100) NOT NULL,
                author VARCHAR(100),
                researcher VARCHAR(100),
                affiliation VARCHAR(255),
                excerpt TEXT,
                content TEXT,
                image VARCHAR(500),
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_articles_article_type ON articles(article_type);
            CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                article_type VARCHAR(20) NOT NULL,
                title VARCHAR(255) NOT NULL,
                category VARCHAR(100) NOT NULL,
                author VARCHAR(100),
                researcher VARCHAR(100),
                affiliation VARCHAR(255),
                excerpt TEXT,
                content TEXT,
                image VARCHAR(500),
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_articles_article_type ON articles(article_type);
            CREATE INDEX idx_articles_status ON articles(status);
        "#,
    },
];

/// Run all pending migrations
///
/// Creates the tracking table if needed, then applies any migration whose
/// version is not yet recorded, in order. Returns the number applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.as_sqlite().unwrap()).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.as_mysql().unwrap()).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await
        }
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // Migration SQL may contain multiple statements
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    // Migration SQL may contain multiple statements
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Last statement may lack a trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_users_table_created() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, name, role) VALUES (?, ?, ?, ?)",
        )
        .bind("seller@example.com")
        .bind("hash123")
        .bind("Test Seller")
        .bind("seller")
        .execute(sqlite_pool)
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_patents_table_created() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (email, password_hash, name, role) VALUES (?, ?, ?, ?)")
            .bind("seller@example.com")
            .bind("hash123")
            .bind("Test Seller")
            .bind("seller")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create user");

        let result = sqlx::query(
            "INSERT INTO patents (title, category, price, owner_id) VALUES (?, ?, ?, ?)",
        )
        .bind("冷却装置")
        .bind("機械")
        .bind(500000.0_f64)
        .bind(1i64)
        .execute(sqlite_pool)
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_patents_allow_null_owner() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        let result = sqlx::query("INSERT INTO patents (title, price) VALUES (?, ?)")
            .bind("出所不明の特許")
            .bind(0.0_f64)
            .execute(sqlite_pool)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_interests_table_created() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (email, password_hash, name, role) VALUES (?, ?, ?, ?)")
            .bind("buyer@example.com")
            .bind("hash123")
            .bind("Test Buyer")
            .bind("buyer")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create user");

        sqlx::query("INSERT INTO patents (title, price, owner_id) VALUES (?, ?, ?)")
            .bind("冷却装置")
            .bind(500000.0_f64)
            .bind(1i64)
            .execute(sqlite_pool)
            .await
            .expect("Failed to create patent");

        let result = sqlx::query(
            "INSERT INTO interests (patent_id, buyer_id, buyer_name, buyer_email, message) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(1i64)
        .bind(1i64)
        .bind("Test Buyer")
        .bind("buyer@example.com")
        .bind("詳細を教えてください")
        .execute(sqlite_pool)
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_messages_table_created() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        for email in ["a@example.com", "b@example.com"] {
            sqlx::query("INSERT INTO users (email, password_hash, name) VALUES (?, ?, ?)")
                .bind(email)
                .bind("hash123")
                .bind("User")
                .execute(sqlite_pool)
                .await
                .expect("Failed to create user");
        }

        let result = sqlx::query(
            "INSERT INTO messages (sender_id, receiver_id, subject, content) VALUES (?, ?, ?, ?)",
        )
        .bind(1i64)
        .bind(2i64)
        .bind("ご連絡")
        .bind("よろしくお願いします")
        .execute(sqlite_pool)
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_articles_table_created() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        let result = sqlx::query(
            "INSERT INTO articles (article_type, title, category, status) VALUES (?, ?, ?, ?)",
        )
        .bind("column")
        .bind("特許の基礎")
        .bind("patent-basics")
        .bind("published")
        .execute(sqlite_pool)
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_key_constraints() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        // Interest pointing at a non-existent patent must be rejected
        let result = sqlx::query(
            "INSERT INTO interests (patent_id, buyer_id) VALUES (?, ?)",
        )
        .bind(999i64)
        .bind(999i64)
        .execute(sqlite_pool)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (email, password_hash, name) VALUES (?, ?, ?)")
            .bind("dup@example.com")
            .bind("hash123")
            .bind("First")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create first user");

        let result = sqlx::query("INSERT INTO users (email, password_hash, name) VALUES (?, ?, ?)")
            .bind("dup@example.com")
            .bind("hash456")
            .bind("Second")
            .execute(sqlite_pool)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_user_keeps_patent() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        let sqlite_pool = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (email, password_hash, name) VALUES (?, ?, ?)")
            .bind("seller@example.com")
            .bind("hash123")
            .bind("Seller")
            .execute(sqlite_pool)
            .await
            .expect("Failed to create user");

        sqlx::query("INSERT INTO patents (title, price, owner_id) VALUES (?, ?, ?)")
            .bind("冷却装置")
            .bind(500000.0_f64)
            .bind(1i64)
            .execute(sqlite_pool)
            .await
            .expect("Failed to create patent");

        sqlx::query("DELETE FROM users WHERE id = 1")
            .execute(sqlite_pool)
            .await
            .expect("Failed to delete user");

        let row = sqlx::query("SELECT owner_id FROM patents WHERE id = 1")
            .fetch_one(sqlite_pool)
            .await
            .expect("Patent should survive owner deletion");

        let owner_id: Option<i64> = row.get("owner_id");
        assert!(owner_id.is_none());
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);";
        let statements = split_sql_statements(sql_with_comments);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }
}
