//! Message model
//!
//! Direct messages between two users, optionally attached to a listing.
//! Only the receiver may flip the read flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direct message between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: i64,
    /// Sending user id
    pub sender_id: i64,
    /// Receiving user id; not validated against the users table
    pub receiver_id: i64,
    /// Listing the conversation refers to, if any
    pub patent_id: Option<i64>,
    /// Subject line
    pub subject: Option<String>,
    /// Message body
    pub content: Option<String>,
    /// Read flag, mutable only by the receiver
    pub is_read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Check whether the given user is a party to this message
    pub fn involves(&self, user_id: i64) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// Check whether the given user may mark this message read
    pub fn is_receiver(&self, user_id: i64) -> bool {
        self.receiver_id == user_id
    }
}

/// Input for sending a message
#[derive(Debug, Clone)]
pub struct CreateMessageInput {
    pub receiver_id: i64,
    pub patent_id: Option<i64>,
    pub subject: Option<String>,
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Message {
        Message {
            id: 1,
            sender_id: 3,
            receiver_id: 7,
            patent_id: Some(10),
            subject: Some("License terms".to_string()),
            content: Some("Can we discuss exclusivity?".to_string()),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_involves_both_parties() {
        let message = sample_message();
        assert!(message.involves(3));
        assert!(message.involves(7));
        assert!(!message.involves(42));
    }

    #[test]
    fn test_only_receiver_may_mark_read() {
        let message = sample_message();
        assert!(message.is_receiver(7));
        assert!(!message.is_receiver(3));
    }
}
