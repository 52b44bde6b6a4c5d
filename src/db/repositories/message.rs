//! Message repository
//!
//! Database operations for direct messages between users.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Message repository trait
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert a new message
    async fn create(&self, message: &Message) -> Result<Message>;

    /// Fetch a message by its id
    async fn get_by_id(&self, id: i64) -> Result<Option<Message>>;

    /// Messages sent or received by a user, newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>>;

    /// Flag a message as read
    async fn mark_read(&self, id: i64) -> Result<()>;
}

/// SQLx-based message repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxMessageRepository {
    /// Create a new SQLx message repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_message_sqlite(self.pool.as_sqlite().unwrap(), message).await
            }
            DatabaseDriver::Mysql => {
                create_message_mysql(self.pool.as_mysql().unwrap(), message).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Message>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_message_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_message_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                list_for_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => mark_read_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => mark_read_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const MESSAGE_COLUMNS: &str =
    "id, sender_id, receiver_id, patent_id, subject, content, is_read, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_message_sqlite(pool: &SqlitePool, message: &Message) -> Result<Message> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO messages (sender_id, receiver_id, patent_id, subject, content, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.sender_id)
    .bind(message.receiver_id)
    .bind(message.patent_id)
    .bind(&message.subject)
    .bind(&message.content)
    .bind(message.is_read)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create message")?;

    let id = result.last_insert_rowid();

    Ok(Message {
        id,
        sender_id: message.sender_id,
        receiver_id: message.receiver_id,
        patent_id: message.patent_id,
        subject: message.subject.clone(),
        content: message.content.clone(),
        is_read: message.is_read,
        created_at: now,
    })
}

async fn get_message_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Message>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM messages WHERE id = ?",
        MESSAGE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get message by id")?;

    row.map(|r| row_to_message_sqlite(&r)).transpose()
}

async fn list_for_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<Message>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM messages WHERE sender_id = ? OR receiver_id = ? ORDER BY created_at DESC",
        MESSAGE_COLUMNS
    ))
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list messages for user")?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row_to_message_sqlite(&row)?);
    }

    Ok(messages)
}

async fn mark_read_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE messages SET is_read = ? WHERE id = ?")
        .bind(true)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark message as read")?;

    Ok(())
}

fn row_to_message_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Message> {
    Ok(Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        patent_id: row.get("patent_id"),
        subject: row.get("subject"),
        content: row.get("content"),
        is_read: row.try_get("is_read").unwrap_or(false),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_message_mysql(pool: &MySqlPool, message: &Message) -> Result<Message> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO messages (sender_id, receiver_id, patent_id, subject, content, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.sender_id)
    .bind(message.receiver_id)
    .bind(message.patent_id)
    .bind(&message.subject)
    .bind(&message.content)
    .bind(message.is_read)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create message")?;

    let id = result.last_insert_id() as i64;

    Ok(Message {
        id,
        sender_id: message.sender_id,
        receiver_id: message.receiver_id,
        patent_id: message.patent_id,
        subject: message.subject.clone(),
        content: message.content.clone(),
        is_read: message.is_read,
        created_at: now,
    })
}

async fn get_message_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Message>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM messages WHERE id = ?",
        MESSAGE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get message by id")?;

    row.map(|r| row_to_message_mysql(&r)).transpose()
}

async fn list_for_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<Message>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM messages WHERE sender_id = ? OR receiver_id = ? ORDER BY created_at DESC",
        MESSAGE_COLUMNS
    ))
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list messages for user")?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row_to_message_mysql(&row)?);
    }

    Ok(messages)
}

async fn mark_read_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE messages SET is_read = ? WHERE id = ?")
        .bind(true)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark message as read")?;

    Ok(())
}

fn row_to_message_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Message> {
    Ok(Message {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        patent_id: row.get("patent_id"),
        subject: row.get("subject"),
        content: row.get("content"),
        is_read: row.try_get("is_read").unwrap_or(false),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use crate::services::credential::hash_password;

    async fn setup() -> (SqlxMessageRepository, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxMessageRepository::new(pool.clone()),
            SqlxUserRepository::new(pool),
        )
    }

    async fn create_user(users: &SqlxUserRepository, email: &str, name: &str) -> User {
        users
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

    fn new_message(sender: &User, receiver: &User, content: &str) -> Message {
        Message {
            id: 0,
            sender_id: sender.id,
            receiver_id: receiver.id,
            patent_id: None,
            subject: Some("お問い合わせ".to_string()),
            content: Some(content.to_string()),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_message() {
        let (messages, users) = setup().await;
        let sender = create_user(&users, "sender@example.com", "送信者").await;
        let receiver = create_user(&users, "receiver@example.com", "受信者").await;

        let created = messages
            .create(&new_message(&sender, &receiver, "はじめまして"))
            .await
            .expect("Failed to create message");

        assert!(created.id > 0);
        assert_eq!(created.sender_id, sender.id);
        assert_eq!(created.receiver_id, receiver.id);
        assert!(!created.is_read);
        assert_eq!(created.content.as_deref(), Some("はじめまして"));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (messages, users) = setup().await;
        let sender = create_user(&users, "sender@example.com", "送信者").await;
        let receiver = create_user(&users, "receiver@example.com", "受信者").await;

        let created = messages
            .create(&new_message(&sender, &receiver, "本文"))
            .await
            .expect("Failed to create message");

        let found = messages
            .get_by_id(created.id)
            .await
            .expect("Failed to get message")
            .expect("Message not found");
        assert_eq!(found.subject.as_deref(), Some("お問い合わせ"));

        let missing = messages.get_by_id(999).await.expect("Query failed");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_for_user_covers_both_directions() {
        let (messages, users) = setup().await;
        let alice = create_user(&users, "alice@example.com", "アリス").await;
        let bob = create_user(&users, "bob@example.com", "ボブ").await;
        let carol = create_user(&users, "carol@example.com", "キャロル").await;

        messages
            .create(&new_message(&alice, &bob, "アリスからボブへ"))
            .await
            .expect("Failed to create message");
        messages
            .create(&new_message(&bob, &alice, "ボブからアリスへ"))
            .await
            .expect("Failed to create message");
        messages
            .create(&new_message(&bob, &carol, "ボブからキャロルへ"))
            .await
            .expect("Failed to create message");

        let inbox = messages
            .list_for_user(alice.id)
            .await
            .expect("Failed to list messages");

        assert_eq!(inbox.len(), 2);
        assert!(inbox
            .iter()
            .all(|m| m.sender_id == alice.id || m.receiver_id == alice.id));
    }

    #[tokio::test]
    async fn test_mark_read() {
        let (messages, users) = setup().await;
        let sender = create_user(&users, "sender@example.com", "送信者").await;
        let receiver = create_user(&users, "receiver@example.com", "受信者").await;

        let created = messages
            .create(&new_message(&sender, &receiver, "未読の本文"))
            .await
            .expect("Failed to create message");
        assert!(!created.is_read);

        messages
            .mark_read(created.id)
            .await
            .expect("Failed to mark read");

        let reloaded = messages
            .get_by_id(created.id)
            .await
            .expect("Failed to get message")
            .expect("Message not found");
        assert!(reloaded.is_read);
    }
}
