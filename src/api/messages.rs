//! Message API endpoints
//!
//! Handles HTTP requests for user-to-user messages:
//! - POST /api/messages - Send a message
//! - GET  /api/messages - Messages the caller sent or received
//! - PUT  /api/messages/{id}/read - Flag a message as read (receiver only)

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, CurrentIdentity};
use crate::models::{CreateMessageInput, Message};
use crate::services::MessageServiceError;

/// Request body for sending a message
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub receiver_id: i64,
    pub patent_id: Option<i64>,
    pub subject: Option<String>,
    pub content: Option<String>,
}

/// Response for a single message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub patent_id: Option<i64>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            patent_id: message.patent_id,
            subject: message.subject,
            content: message.content,
            is_read: message.is_read,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// POST /api/messages - Send a message
///
/// The receiver id is stored as given; it is not checked against the
/// accounts table.
pub async fn create_message(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(body): Json<CreateMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let input = CreateMessageInput {
        receiver_id: body.receiver_id,
        patent_id: body.patent_id,
        subject: body.subject,
        content: body.content,
    };

    let message = state
        .message_service
        .create(&input, &identity.0)
        .await
        .map_err(map_message_error)?;

    Ok(Json(message.into()))
}

/// GET /api/messages - Messages the caller sent or received, newest first
pub async fn list_messages(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let messages = state
        .message_service
        .list_for_user(identity.0.id)
        .await
        .map_err(map_message_error)?;

    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// PUT /api/messages/{id}/read - Flag a message as read
///
/// Only the receiver may do this; the sender gets Forbidden.
pub async fn mark_message_read(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .message_service
        .mark_read(id, identity.0.id)
        .await
        .map_err(map_message_error)?;

    Ok(Json(serde_json::json!({ "message": "既読にしました" })))
}

fn map_message_error(e: MessageServiceError) -> ApiError {
    match e {
        MessageServiceError::NotFound => ApiError::not_found("メッセージが見つかりません"),
        MessageServiceError::Forbidden => {
            ApiError::forbidden("このメッセージを操作する権限がありません")
        }
        MessageServiceError::InternalError(err) => {
            tracing::error!("Message operation failed: {:#}", err);
            ApiError::store_failure("メッセージの処理に失敗しました")
        }
    }
}
