//! Message service
//!
//! Direct messages between accounts, optionally tied to a listing. Sending
//! never validates the receiver id; only the read-flag mutation is gated,
//! and only to the receiver.

use crate::db::repositories::MessageRepository;
use crate::models::{CreateMessageInput, Message};
use crate::services::identity::Identity;
use anyhow::Context;
use std::sync::Arc;

/// Error types for message operations
#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
    /// Message does not exist
    #[error("Message not found")]
    NotFound,

    /// Caller is not the receiver
    #[error("Not allowed to modify this message")]
    Forbidden,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Message service
pub struct MessageService {
    message_repo: Arc<dyn MessageRepository>,
}

impl MessageService {
    /// Create a new message service
    pub fn new(message_repo: Arc<dyn MessageRepository>) -> Self {
        Self { message_repo }
    }

    /// Send a message. The receiver id is stored as given.
    pub async fn create(
        &self,
        input: &CreateMessageInput,
        sender: &Identity,
    ) -> Result<Message, MessageServiceError> {
        let message = Message {
            id: 0,
            sender_id: sender.id,
            receiver_id: input.receiver_id,
            patent_id: input.patent_id,
            subject: input.subject.clone(),
            content: input.content.clone(),
            is_read: false,
            created_at: chrono::Utc::now(),
        };

        let created = self
            .message_repo
            .create(&message)
            .await
            .context("Failed to create message")?;

        Ok(created)
    }

    /// Messages the caller sent or received, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>, MessageServiceError> {
        let messages = self
            .message_repo
            .list_for_user(user_id)
            .await
            .context("Failed to list messages")?;

        Ok(messages)
    }

    /// Flag a message as read. Only its receiver may do this.
    pub async fn mark_read(&self, id: i64, caller_id: i64) -> Result<(), MessageServiceError> {
        let message = self
            .message_repo
            .get_by_id(id)
            .await
            .context("Failed to get message")?
            .ok_or(MessageServiceError::NotFound)?;

        if message.receiver_id != caller_id {
            return Err(MessageServiceError::Forbidden);
        }

        self.message_repo
            .mark_read(id)
            .await
            .context("Failed to mark message as read")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxMessageRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::UserRole;
    use chrono::Utc;

    async fn setup() -> (DynDatabasePool, MessageService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = MessageService::new(SqlxMessageRepository::boxed(pool.clone()));
        (pool, service)
    }

    fn identity(id: i64, email: &str, name: &str) -> Identity {
        Identity {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role: UserRole::Buyer,
        }
    }

    async fn seed_user(pool: &DynDatabasePool, id: i64, email: &str) {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, role, created_at) VALUES (?, ?, 'x', 'user', 'buyer', ?)",
        )
        .bind(id)
        .bind(email)
        .bind(Utc::now())
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to seed user");
    }

    fn message_input(receiver_id: i64) -> CreateMessageInput {
        CreateMessageInput {
            receiver_id,
            patent_id: None,
            subject: Some("お問い合わせ".to_string()),
            content: Some("本文".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_message_unread() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "a@example.com").await;
        seed_user(&pool, 2, "b@example.com").await;

        let created = service
            .create(&message_input(2), &identity(1, "a@example.com", "A"))
            .await
            .expect("Failed to create");

        assert_eq!(created.sender_id, 1);
        assert_eq!(created.receiver_id, 2);
        assert!(!created.is_read);
    }

    #[tokio::test]
    async fn test_list_for_user_both_directions() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "a@example.com").await;
        seed_user(&pool, 2, "b@example.com").await;
        seed_user(&pool, 3, "c@example.com").await;

        service
            .create(&message_input(2), &identity(1, "a@example.com", "A"))
            .await
            .expect("Failed to create");
        service
            .create(&message_input(1), &identity(2, "b@example.com", "B"))
            .await
            .expect("Failed to create");
        service
            .create(&message_input(3), &identity(2, "b@example.com", "B"))
            .await
            .expect("Failed to create");

        let inbox = service.list_for_user(1).await.expect("Failed to list");
        assert_eq!(inbox.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_read_receiver_only() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "a@example.com").await;
        seed_user(&pool, 2, "b@example.com").await;

        let created = service
            .create(&message_input(2), &identity(1, "a@example.com", "A"))
            .await
            .expect("Failed to create");

        assert!(matches!(
            service.mark_read(999, 2).await,
            Err(MessageServiceError::NotFound)
        ));
        assert!(matches!(
            service.mark_read(created.id, 1).await,
            Err(MessageServiceError::Forbidden)
        ));

        service
            .mark_read(created.id, 2)
            .await
            .expect("Failed to mark read");

        let inbox = service.list_for_user(2).await.expect("Failed to list");
        assert!(inbox.iter().all(|m| m.is_read));
    }
}
