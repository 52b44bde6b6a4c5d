//! Public editorial content endpoints
//!
//! Columns and interviews read through the content gateway:
//! - GET /api/columns?category - List columns
//! - GET /api/columns/{id} - Get one column
//! - GET /api/interviews - List interviews
//! - GET /api/interviews/{id} - Get one interview
//!
//! Listings never fail: the gateway falls back from the WordPress source to
//! locally stored published articles to built-in samples. Single-entry
//! lookups return 404 only when no stage has the id.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::services::{ColumnEntry, ContentServiceError, InterviewEntry};

/// Query parameters for listing columns
#[derive(Debug, Deserialize)]
pub struct ListColumnsQuery {
    /// Category slug; absent or `all` means every column
    pub category: Option<String>,
}

/// Build the public content router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/columns", get(list_columns))
        .route("/columns/{id}", get(get_column))
        .route("/interviews", get(list_interviews))
        .route("/interviews/{id}", get(get_interview))
}

/// GET /api/columns - List columns
async fn list_columns(
    State(state): State<AppState>,
    Query(query): Query<ListColumnsQuery>,
) -> Json<Vec<ColumnEntry>> {
    Json(
        state
            .content_service
            .list_columns(query.category.as_deref())
            .await,
    )
}

/// GET /api/columns/{id} - Get one column
async fn get_column(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ColumnEntry>, ApiError> {
    let column = state
        .content_service
        .get_column(&id)
        .await
        .map_err(map_content_error)?;

    Ok(Json(column))
}

/// GET /api/interviews - List interviews
async fn list_interviews(State(state): State<AppState>) -> Json<Vec<InterviewEntry>> {
    Json(state.content_service.list_interviews().await)
}

/// GET /api/interviews/{id} - Get one interview
async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InterviewEntry>, ApiError> {
    let interview = state
        .content_service
        .get_interview(&id)
        .await
        .map_err(map_content_error)?;

    Ok(Json(interview))
}

fn map_content_error(e: ContentServiceError) -> ApiError {
    match e {
        ContentServiceError::NotFound => ApiError::not_found("記事が見つかりません"),
    }
}
