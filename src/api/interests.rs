//! Interest API endpoints
//!
//! Handles HTTP requests for purchase interests:
//! - POST /api/interests - File an interest in a listing
//! - GET  /api/my-interests - Interests the caller filed
//! - GET  /api/patent-interests - Interests received against the caller's listings
//! - GET  /api/user/interests - The caller's interests joined with listing details
//! - GET  /api/patents/{id}/interests - Interests for one listing (owner only)

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, CurrentIdentity};
use crate::models::{CreateInterestInput, Interest, InterestWithPatent, ReceivedInterest};
use crate::services::InterestServiceError;

/// Request body for filing an interest
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterestRequest {
    pub patent_id: i64,
    pub message: Option<String>,
}

/// Response for a single interest
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestResponse {
    pub id: i64,
    pub patent_id: i64,
    pub buyer_id: i64,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<Interest> for InterestResponse {
    fn from(interest: Interest) -> Self {
        Self {
            id: interest.id,
            patent_id: interest.patent_id,
            buyer_id: interest.buyer_id,
            buyer_name: interest.buyer_name,
            buyer_email: interest.buyer_email,
            message: interest.message,
            status: interest.status.to_string(),
            created_at: interest.created_at.to_rfc3339(),
        }
    }
}

/// Interest joined with listing details, for the buyer dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestWithPatentResponse {
    #[serde(flatten)]
    pub interest: InterestResponse,
    pub patent_title: Option<String>,
    pub patent_category: Option<String>,
    pub patent_price: Option<f64>,
}

impl From<InterestWithPatent> for InterestWithPatentResponse {
    fn from(row: InterestWithPatent) -> Self {
        Self {
            interest: row.interest.into(),
            patent_title: row.patent_title,
            patent_category: row.patent_category,
            patent_price: row.patent_price,
        }
    }
}

/// POST /api/interests - File an interest in a listing
///
/// The buyer's name and email are snapshotted onto the row. Filing interest
/// in one's own listing is allowed.
pub async fn create_interest(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(body): Json<CreateInterestRequest>,
) -> Result<Json<InterestResponse>, ApiError> {
    let input = CreateInterestInput {
        patent_id: body.patent_id,
        message: body.message,
    };

    let interest = state
        .interest_service
        .create(&input, &identity.0)
        .await
        .map_err(map_interest_error)?;

    Ok(Json(interest.into()))
}

/// GET /api/my-interests - Interests the caller filed, newest first
pub async fn list_my_interests(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> Result<Json<Vec<InterestResponse>>, ApiError> {
    let interests = state
        .interest_service
        .list_mine(identity.0.id)
        .await
        .map_err(map_interest_error)?;

    Ok(Json(interests.into_iter().map(Into::into).collect()))
}

/// GET /api/patent-interests - Interests received against the caller's listings
///
/// Rows are enriched with the listing title and the buyer's display name.
/// A caller who owns no listings gets an empty list.
pub async fn list_received_interests(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> Result<Json<Vec<ReceivedInterest>>, ApiError> {
    let received = state
        .interest_service
        .list_received(identity.0.id)
        .await
        .map_err(map_interest_error)?;

    Ok(Json(received))
}

/// GET /api/user/interests - The caller's interests with listing details
pub async fn list_my_interests_with_patents(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> Result<Json<Vec<InterestWithPatentResponse>>, ApiError> {
    let interests = state
        .interest_service
        .list_mine_with_patents(identity.0.id)
        .await
        .map_err(map_interest_error)?;

    Ok(Json(interests.into_iter().map(Into::into).collect()))
}

/// GET /api/patents/{id}/interests - Interests for one listing
///
/// Restricted to the listing's owner.
pub async fn list_patent_interests(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<i64>,
) -> Result<Json<Vec<InterestResponse>>, ApiError> {
    let interests = state
        .interest_service
        .list_for_patent(id, identity.0.id)
        .await
        .map_err(map_interest_error)?;

    Ok(Json(interests.into_iter().map(Into::into).collect()))
}

fn map_interest_error(e: InterestServiceError) -> ApiError {
    match e {
        InterestServiceError::NotFound => ApiError::not_found("特許が見つかりません"),
        InterestServiceError::Forbidden => {
            ApiError::forbidden("この特許の関心一覧を閲覧する権限がありません")
        }
        InterestServiceError::InternalError(err) => {
            tracing::error!("Interest operation failed: {:#}", err);
            ApiError::store_failure("関心の処理に失敗しました")
        }
    }
}
