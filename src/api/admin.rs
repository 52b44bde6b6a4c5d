//! Admin API endpoints
//!
//! Handles HTTP requests for listing moderation:
//! - GET /api/admin/patents - List every patent with owner contact details
//! - GET /api/admin/patents/pending - List patents awaiting review
//! - PUT /api/admin/patents/{id}/approve - Approve a pending patent
//! - PUT /api/admin/patents/{id}/reject - Reject a pending patent
//!
//! All routes are mounted behind the admin guard; handlers assume the
//! caller has already been vetted.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::patents::{map_patent_error, PatentResponse};
use crate::models::PatentWithOwner;

/// Response for a patent in the moderation queue, including the owner's
/// contact details so admins can follow up outside the platform. Legacy
/// rows without an owning account carry no email.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPatentResponse {
    #[serde(flatten)]
    pub patent: PatentResponse,
    pub owner_email: Option<String>,
    pub owner_organization: Option<String>,
}

impl From<PatentWithOwner> for AdminPatentResponse {
    fn from(row: PatentWithOwner) -> Self {
        Self {
            patent: row.patent.into(),
            owner_email: row.owner_email,
            owner_organization: row.owner_organization,
        }
    }
}

/// Build the admin patents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patents", get(list_all_patents))
        .route("/patents/pending", get(list_pending_patents))
        .route("/patents/{id}/approve", put(approve_patent))
        .route("/patents/{id}/reject", put(reject_patent))
}

/// GET /api/admin/patents - List every patent regardless of review state
async fn list_all_patents(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminPatentResponse>>, ApiError> {
    let patents = state
        .patent_service
        .list_all_for_admin()
        .await
        .map_err(map_patent_error)?;

    Ok(Json(patents.into_iter().map(Into::into).collect()))
}

/// GET /api/admin/patents/pending - List patents awaiting review
async fn list_pending_patents(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminPatentResponse>>, ApiError> {
    let patents = state
        .patent_service
        .list_pending_for_admin()
        .await
        .map_err(map_patent_error)?;

    Ok(Json(patents.into_iter().map(Into::into).collect()))
}

/// PUT /api/admin/patents/{id}/approve - Make a patent publicly visible
async fn approve_patent(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .patent_service
        .approve(id)
        .await
        .map_err(map_patent_error)?;

    Ok(Json(serde_json::json!({ "message": "承認しました" })))
}

/// PUT /api/admin/patents/{id}/reject - Reject a patent listing
async fn reject_patent(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .patent_service
        .reject(id)
        .await
        .map_err(map_patent_error)?;

    Ok(Json(serde_json::json!({ "message": "却下しました" })))
}
